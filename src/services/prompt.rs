//! Prompt text for every kind of generation request.
//!
//! Everything here is a pure function of its inputs: the same book, plan and
//! context always produce the same prompt.

use std::ops::RangeInclusive;

use crate::models::{BookSpec, DerivedConfig, Outline, UnitId};
use crate::utils::tail_chars;

/// What a prompt asks the model to produce.
#[derive(Debug, Clone)]
pub enum PromptKind<'a> {
    /// Outline for every chapter in one call.
    OutlineFull,
    /// Outline for a contiguous chapter range, continuing from `previous`.
    OutlineChunk {
        chapters: RangeInclusive<u32>,
        previous: &'a str,
    },
    Chapter {
        chapter: u32,
        outline: &'a Outline,
        previous: &'a str,
    },
    /// `previous` is the tail of the prior sub-chapter in this chapter;
    /// `previous_chapter` the tail of the whole prior chapter.
    SubChapter {
        chapter: u32,
        sub: u32,
        outline: &'a Outline,
        previous: &'a str,
        previous_chapter: &'a str,
    },
}

pub struct PromptBuilder<'a> {
    book: &'a BookSpec,
    plan: &'a DerivedConfig,
    outline_context_chars: usize,
}

const WRITING_GUIDELINES: &str = "\
WRITING STYLE & QUALITY GUIDELINES:
*   Show, don't tell: reveal emotions and facts through action, dialogue, sensation and thought.
*   Use concrete sensory detail (sight, sound, smell, touch, taste) that fits the scene.
*   Give characters motivations, inner life and consistent voices.
*   Control pacing: short sentences for action, longer ones for reflection.
*   Keep the mood and tone consistent with the genre ({genre}).
*   Prefer strong verbs and avoid cliches.
*   Write natural dialogue that reveals character and moves the plot; avoid exposition dumps.
*   Keep transitions between paragraphs and scenes smooth.
*   Treat the outline section as a framework: bring its events to life rather than listing them.";

impl<'a> PromptBuilder<'a> {
    pub fn new(book: &'a BookSpec, plan: &'a DerivedConfig, outline_context_chars: usize) -> Self {
        Self {
            book,
            plan,
            outline_context_chars,
        }
    }

    pub fn build(&self, kind: &PromptKind<'_>) -> String {
        match kind {
            PromptKind::OutlineFull => self.outline(None),
            PromptKind::OutlineChunk { chapters, previous } => {
                self.outline(Some((chapters, previous)))
            }
            PromptKind::Chapter {
                chapter,
                outline,
                previous,
            } => {
                let unit = UnitId::Chapter(*chapter);
                let section = outline.section_for_chapter(*chapter);
                let previous = if previous.is_empty() {
                    "N/A - This is the first chapter.".to_string()
                } else {
                    format!("... {previous}")
                };
                self.content(unit, section, self.plan.chapter_prompt_words, &previous, "")
            }
            PromptKind::SubChapter {
                chapter,
                sub,
                outline,
                previous,
                previous_chapter,
            } => {
                let unit = UnitId::SubChapter {
                    chapter: *chapter,
                    sub: *sub,
                };
                let section = outline.section_for_subchapter(*chapter, *sub);
                let previous = if previous.is_empty() {
                    "N/A - This is the first sub-chapter of the chapter or book.".to_string()
                } else {
                    format!("... {previous}")
                };
                let chapter_context = if *sub == 1 && !previous_chapter.is_empty() {
                    format!(
                        "\n- Previous Chapter End Snippet (for flow): \"... {previous_chapter}\""
                    )
                } else {
                    String::new()
                };
                self.content(
                    unit,
                    section,
                    self.plan.subchapter_prompt_words,
                    &previous,
                    &chapter_context,
                )
            }
        }
    }

    fn notes(&self) -> String {
        let mut notes = String::new();
        if let Some(characters) = self.book.character_notes() {
            notes.push_str(&format!("\n- Character Notes: {characters}"));
        }
        if let Some(world) = self.book.world_notes() {
            notes.push_str(&format!("\n- World/Setting Notes: {world}"));
        }
        notes
    }

    fn outline(&self, chunk: Option<(&RangeInclusive<u32>, &&str)>) -> String {
        let book = self.book;
        let subchapters = self.plan.subchapters_per_chapter;
        let sub_instruction = if subchapters > 0 {
            format!("Generate EXACTLY {subchapters} sub-chapters per chapter.")
        } else {
            "DO NOT generate sub-chapters.".to_string()
        };
        let sub_needed = if subchapters > 0 { "Yes" } else { "No" };

        let (task, range_instruction, context_instruction, scope) = match chunk {
            Some((chapters, previous)) => {
                let (start, end) = (chapters.start(), chapters.end());
                let context = if previous.is_empty() {
                    "This is the first chunk of the outline.".to_string()
                } else {
                    format!(
                        "Make the summaries for these chapters follow on from the previous part of the outline and serve the overall plot arc. The previous part ends with:\n\"... {}\"",
                        tail_chars(previous, self.outline_context_chars)
                    )
                };
                (
                    format!(
                        "You are writing PART of a book outline, covering chapters {start} through {end}."
                    ),
                    format!("ONLY write the outline for chapters {start} to {end} inclusive."),
                    context,
                    format!("for chapters {start}-{end}"),
                )
            }
            None => (
                "You write complete book outlines from a short description of a book.".to_string(),
                format!("Write the outline for ALL {} chapters.", book.chapters),
                "The outline must form one coherent narrative: every chapter summary advances the plot, develops characters or builds the world.".to_string(),
                "for the entire book".to_string(),
            ),
        };

        format!(
            r#"
{task}
Write a detailed 100-150 word summary for each chapter (and each sub-chapter when sub-chapters are needed).
Sub-chapters split a chapter's events into smaller narrative segments.
{sub_instruction} Only use sub-chapters if they are needed as stated below.
Work chapter by chapter and, where needed, sub-chapter by sub-chapter inside each chapter.
{range_instruction}

Summaries must name key events, character actions and reactions, important dialogue, setting changes and reveals.
Summaries must state the purpose of the chapter or sub-chapter in the larger story.
Chapters and sub-chapters must follow logically from earlier events and set up later ones.
{context_instruction}
The outline must match the plot summary, genre and chapter details given below.

ONLY output in the format below. DO NOT OUTPUT THE ARROW BRACKETS.
<
Chapter: [chapter_number]: [chapter_name]
[chapter_summary]
>

For sub-chapters inside a chapter, ONLY IF NEEDED. DO NOT OUTPUT THE ARROW BRACKETS.
<
- Sub-Chapter: [sub-chapter_number]: [sub-chapter_name]
[sub-chapter_summary]
>

Output plain text only, without markdown.
Output nothing except the outline itself.
Never repeat a chapter or sub-chapter.

Book information:
- Book Name: "{title}"
- Book Genre: "{genre}"
- Total Number of Chapters in Book: "{chapters}"
- Chapter Details Provided: "{details}"
- Plot Summary: "{brief}"
- Number of sub-chapters per chapter: "{subchapters}"
- Are sub-chapters Needed?: "{sub_needed}"{notes}

Follow every instruction above and write the most coherent and compelling outline {scope}. DO NOT OUTPUT THE ARROW BRACKETS.
"#,
            title = book.title,
            genre = book.genre_list(),
            chapters = book.chapters,
            details = book.combined_details(),
            brief = book.brief,
            notes = self.notes(),
        )
    }

    fn content(
        &self,
        unit: UnitId,
        section: Option<String>,
        target: u32,
        previous: &str,
        chapter_context: &str,
    ) -> String {
        let book = self.book;
        let kind = unit.kind_name();
        let number = unit.number();
        let minimum = self.plan.prompt_minimum(target);
        let genre = book.genre_list();
        let section = section.unwrap_or_else(|| {
            tracing::warn!("Could not find the outline section for {}", unit);
            format!("[ERROR: Could not extract outline for {kind} {number}]")
        });
        let guidelines = WRITING_GUIDELINES.replace("{genre}", &genre);

        format!(
            r#"
You are writing the text of {kind} {number} of the book "{title}".
The writing should be engaging, descriptive and true to the {genre} genre.

{guidelines}

CONTENT REQUIREMENTS:
*   Write APPROXIMATELY {target} words (+-15% is acceptable). The minimum is around {minimum} words.
*   Expand the outline section for {kind} {number}: include every key event and develop it naturally.
*   ONLY write {kind} {number}.
*   Continue smoothly from the previous content given below.
*   Stay on the events and themes of this {kind}.

STRICT OUTPUT FORMAT:
*   ONLY output the prose of {kind} {number}.
*   DO NOT include headers such as "Chapter: ..." or "Sub-Chapter: ...".
*   DO NOT use markdown.
*   Write in coherent paragraphs.

CONTEXT:
- Book Name: "{title}"
- Book Genre: "{genre}"
- Total Number of Chapters: "{chapters}"
- Plot Summary: "{brief}"
- Specific Chapter Details (User Input): "{details}"
- Book Outline (Relevant Section for {kind} {number}): "{section}"
- Target Words for this {kind}: "{target}"{notes}
- Previous Content End Snippet (for flow): "{previous}"{chapter_context}

Write {kind} {number} now, following every instruction and focusing on immersive storytelling.
"#,
            title = book.title,
            chapters = book.chapters,
            brief = book.brief,
            details = book.combined_details(),
            notes = self.notes(),
        )
    }
}
