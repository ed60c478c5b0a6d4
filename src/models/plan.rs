use std::ops::RangeInclusive;

use crate::config::GenerationPolicy;
use crate::models::BookSpec;

/// Sizing decisions computed once from a [`BookSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedConfig {
    pub chapters: u32,
    pub subchapters_per_chapter: u32,
    pub words_per_subchapter: u32,
    /// Inflated chapter target embedded in prompts.
    pub chapter_prompt_words: u32,
    /// Inflated sub-chapter target embedded in prompts, 0 without sub-chapters.
    pub subchapter_prompt_words: u32,
    pub total_outline_items: u32,
    outline_chunk_threshold: u32,
    chapters_per_chunk: u32,
    prompt_min_ratio: f64,
    regen_min_ratio: f64,
}

impl DerivedConfig {
    pub fn derive(book: &BookSpec, policy: &GenerationPolicy) -> Self {
        let words = book.words_per_chapter;
        let (subchapters, words_per_subchapter) = if words > policy.subchapter_threshold {
            let count = words
                .div_ceil(policy.target_subchapter_words.max(1))
                .max(policy.min_subchapters)
                .max(1);
            (count, words.div_ceil(count))
        } else {
            (0, 0)
        };
        let total_outline_items = if subchapters > 0 {
            book.chapters * subchapters
        } else {
            book.chapters
        };

        Self {
            chapters: book.chapters,
            subchapters_per_chapter: subchapters,
            words_per_subchapter,
            chapter_prompt_words: inflate(words, policy.word_inflation),
            subchapter_prompt_words: inflate(words_per_subchapter, policy.word_inflation),
            total_outline_items,
            outline_chunk_threshold: policy.outline_chunk_threshold,
            chapters_per_chunk: policy.chapters_per_outline_chunk.max(1),
            prompt_min_ratio: policy.prompt_min_ratio,
            regen_min_ratio: policy.regen_min_ratio,
        }
    }

    pub fn uses_subchapters(&self) -> bool {
        self.subchapters_per_chapter > 0
    }

    pub fn is_chunked(&self) -> bool {
        self.total_outline_items > self.outline_chunk_threshold
    }

    /// Inclusive chapter ranges requested per outline call in chunked mode.
    pub fn outline_chunks(&self) -> Vec<RangeInclusive<u32>> {
        (0..self.chapters.div_ceil(self.chapters_per_chunk))
            .map(|index| {
                let start = index * self.chapters_per_chunk + 1;
                let end = ((index + 1) * self.chapters_per_chunk).min(self.chapters);
                start..=end
            })
            .collect()
    }

    /// Minimum word count stated to the model for a given target.
    pub fn prompt_minimum(&self, target: u32) -> u32 {
        (f64::from(target) * self.prompt_min_ratio) as u32
    }

    /// Word count below which a unit is regenerated when the gate is on.
    pub fn regen_floor(&self, target: u32) -> usize {
        (f64::from(target) * self.regen_min_ratio) as usize
    }
}

fn inflate(words: u32, multiplier: f64) -> u32 {
    (f64::from(words) * multiplier) as u32
}
