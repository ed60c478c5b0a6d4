use serde::{Deserialize, Serialize};

use crate::error::BookSpecError;

pub const MAX_CHAPTERS: u32 = 200;
pub const MIN_WORDS_PER_CHAPTER: u32 = 100;
pub const MAX_WORDS_PER_CHAPTER: u32 = 15000;

/// User-supplied description of the book to generate.
///
/// Immutable once a session has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSpec {
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub chapters: u32,
    pub words_per_chapter: u32,
    /// One outline hint per chapter, in chapter order.
    pub chapter_details: Vec<String>,
    pub brief: String,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub world: Option<String>,
}

impl BookSpec {
    pub fn validate(&self) -> Result<(), BookSpecError> {
        if self.title.trim().is_empty() {
            return Err(BookSpecError::EmptyTitle);
        }
        if !(1..=MAX_CHAPTERS).contains(&self.chapters) {
            return Err(BookSpecError::ChapterCount(self.chapters));
        }
        if !(MIN_WORDS_PER_CHAPTER..=MAX_WORDS_PER_CHAPTER).contains(&self.words_per_chapter) {
            return Err(BookSpecError::WordsPerChapter(self.words_per_chapter));
        }
        if self.chapter_details.len() != self.chapters as usize {
            return Err(BookSpecError::DetailsMismatch {
                expected: self.chapters as usize,
                actual: self.chapter_details.len(),
            });
        }
        Ok(())
    }

    pub fn genre_list(&self) -> String {
        self.genres.join(", ")
    }

    /// All chapter hints joined into a single line for prompts.
    pub fn combined_details(&self) -> String {
        self.chapter_details
            .iter()
            .enumerate()
            .map(|(i, detail)| format!("Chapter {} Outline: \"{}\"", i + 1, detail))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn character_notes(&self) -> Option<&str> {
        non_blank(self.characters.as_deref())
    }

    pub fn world_notes(&self) -> Option<&str> {
        non_blank(self.world.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// API pricing tier, which decides how long to pause between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApiTier {
    #[default]
    Free,
    Paid,
}

/// A text generation API credential.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Rough shape check for Google AI keys.
    pub fn looks_valid(&self) -> bool {
        self.0.len() > 30 && self.0.contains("AI")
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&"<redacted>").finish()
    }
}
