//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::LazyLock;
use std::sync::Mutex;

use async_trait::async_trait;
use regex::Regex;

use bookforge::error::SinkError;
use bookforge::models::{AttemptResult, UnitId};
use bookforge::output::{EmitKind, OutputSink};
use bookforge::{ApiKey, BookSpec, Interaction, Interrupt, TextGenerator};

pub const VALID_KEY: &str = "AIzaSyTESTKEY0000000000000000000000000";
pub const REPLACEMENT_KEY: &str = "AIzaSyREPLACEMENT11111111111111111111";

static CHUNK_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ONLY write the outline for chapters (\d+) to (\d+) inclusive").unwrap()
});
static FULL_OUTLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Write the outline for ALL (\d+) chapters").unwrap());
static CONTENT_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"You are writing the text of (chapter|sub-chapter) (\d+)(?:-(\d+))? of").unwrap()
});

pub fn book(chapters: u32, words_per_chapter: u32) -> BookSpec {
    BookSpec {
        title: "The Salt Road".to_string(),
        genres: vec!["Fantasy".to_string()],
        chapters,
        words_per_chapter,
        chapter_details: (1..=chapters).map(|i| format!("events of chapter {i}")).collect(),
        brief: "A caravan crosses a dead sea.".to_string(),
        characters: None,
        world: None,
    }
}

/// One recorded call to [`FakeClient`].
#[derive(Debug, Clone)]
pub struct Call {
    pub key: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Which unit a prompt asks for, recovered from the prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requested {
    FullOutline(u32),
    OutlineChunk(u32, u32),
    Unit(UnitId),
    Unknown,
}

pub fn requested(prompt: &str) -> Requested {
    if let Some(caps) = CHUNK_RANGE.captures(prompt) {
        return Requested::OutlineChunk(caps[1].parse().unwrap(), caps[2].parse().unwrap());
    }
    if let Some(caps) = FULL_OUTLINE.captures(prompt) {
        return Requested::FullOutline(caps[1].parse().unwrap());
    }
    if let Some(caps) = CONTENT_UNIT.captures(prompt) {
        let chapter = caps[2].parse().unwrap();
        return match caps.get(3) {
            Some(sub) => Requested::Unit(UnitId::SubChapter {
                chapter,
                sub: sub.as_str().parse().unwrap(),
            }),
            None => Requested::Unit(UnitId::Chapter(chapter)),
        };
    }
    Requested::Unknown
}

/// Outline text with a marker for every chapter in `range`, wrapped in the
/// arrow brackets models tend to echo back.
pub fn outline_for(range: std::ops::RangeInclusive<u32>, subchapters: u32) -> String {
    let mut out = String::new();
    for chapter in range {
        out.push_str(&format!("<\nChapter: {chapter}: Leg {chapter}\nThe caravan moves on.\n"));
        for sub in 1..=subchapters {
            out.push_str(&format!("- Sub-Chapter: {sub}: Stop {sub}\nThey rest.\n"));
        }
        out.push_str(">\n\n");
    }
    out
}

/// Prose for `unit`, `words` words long, ending in a recognisable tag.
pub fn prose_for(unit: &UnitId, words: usize) -> String {
    let tag = format!("[end of {unit}]");
    let filler = words.saturating_sub(4);
    let mut text = vec!["sand"; filler].join(" ");
    text.push(' ');
    text.push_str(&tag);
    text
}

/// Answers every prompt from a script first, then from a default responder
/// that recognises the requested unit.
pub struct FakeClient {
    script: Mutex<VecDeque<AttemptResult>>,
    calls: Mutex<Vec<Call>>,
    subchapters: u32,
    words: usize,
    interrupt_after: Option<(usize, Interrupt)>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            subchapters: 0,
            words: 900,
            interrupt_after: None,
        }
    }

    pub fn with_script(script: impl IntoIterator<Item = AttemptResult>) -> Self {
        let client = Self::new();
        client.script.lock().unwrap().extend(script);
        client
    }

    pub fn subchapters(mut self, subchapters: u32) -> Self {
        self.subchapters = subchapters;
        self
    }

    pub fn words(mut self, words: usize) -> Self {
        self.words = words;
        self
    }

    /// Fire `interrupt` once `calls` calls have been answered.
    pub fn interrupt_after(mut self, calls: usize, interrupt: Interrupt) -> Self {
        self.interrupt_after = Some((calls, interrupt));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn respond(&self, prompt: &str) -> AttemptResult {
        match requested(prompt) {
            Requested::FullOutline(chapters) => {
                AttemptResult::success(outline_for(1..=chapters, self.subchapters))
            }
            Requested::OutlineChunk(start, end) => {
                AttemptResult::success(outline_for(start..=end, self.subchapters))
            }
            Requested::Unit(unit) => AttemptResult::success(prose_for(&unit, self.words)),
            Requested::Unknown => AttemptResult::ParseFailure("unrecognised prompt".to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeClient {
    async fn generate(&self, key: &ApiKey, prompt: &str, max_tokens: u32) -> AttemptResult {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                key: key.expose().to_string(),
                prompt: prompt.to_string(),
                max_tokens,
            });
            calls.len()
        };
        let scripted = self.script.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| self.respond(prompt));
        if let Some((after, interrupt)) = &self.interrupt_after {
            if count >= *after {
                interrupt.trigger();
            }
        }
        result
    }
}

/// Confirmation and credential answers given in order; once exhausted every
/// confirmation is "no" and every credential request is cancelled.
#[derive(Default)]
pub struct FakeInteraction {
    pub confirms: VecDeque<bool>,
    pub credentials: VecDeque<Option<String>>,
    pub asked: Vec<String>,
}

impl FakeInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirming(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            confirms: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_credentials(answers: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        Self {
            credentials: answers.into_iter().map(|a| a.map(str::to_string)).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Interaction for FakeInteraction {
    async fn confirm(&mut self, title: &str, _question: &str) -> bool {
        self.asked.push(title.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    async fn request_credential(&mut self, title: &str, _prompt: &str) -> Option<String> {
        self.asked.push(title.to_string());
        self.credentials.pop_front().flatten()
    }
}

/// Keeps every emitted event in memory.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<(EmitKind, UnitId, String)>,
    pub finished: bool,
    /// Fail the n-th emit (0-based).
    pub fail_at: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<EmitKind> {
        self.events.iter().map(|(kind, _, _)| *kind).collect()
    }

    pub fn units(&self) -> Vec<UnitId> {
        self.events.iter().map(|(_, unit, _)| *unit).collect()
    }
}

impl OutputSink for RecordingSink {
    fn emit(&mut self, kind: EmitKind, unit: &UnitId, text: &str) -> Result<(), SinkError> {
        if self.fail_at == Some(self.events.len()) {
            return Err(SinkError::Io {
                path: "recording".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.events.push((kind, *unit, text.to_string()));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
