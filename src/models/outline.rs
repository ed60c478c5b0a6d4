use std::sync::LazyLock;

use regex::Regex;

static CHAPTER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Chapter:\s*(\d+)\s*:").expect("valid chapter marker pattern"));
static SUBCHAPTER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*Sub-Chapter:\s*(\d+)\s*:").expect("valid sub-chapter marker pattern")
});

/// The book outline as produced by the model.
///
/// Sections are found by marker lines:
///
/// ```text
/// Chapter: 3: The Crossing
/// summary...
/// - Sub-Chapter: 1: Dawn
/// summary...
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline(String);

impl Outline {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The marker line and summary lines for `chapter`, up to the next
    /// chapter marker or blank line.
    pub fn section_for_chapter(&self, chapter: u32) -> Option<String> {
        let lines: Vec<&str> = self.0.lines().collect();
        let start = lines
            .iter()
            .position(|line| marker_number(&CHAPTER_MARKER, line) == Some(chapter))?;
        let section = collect_section(&lines[start..], |line| is_chapter_marker(line));
        Some(section.join("\n"))
    }

    /// The marker line and summary lines for sub-chapter `sub` of `chapter`.
    ///
    /// The sub-chapter marker is only searched for between the chapter's own
    /// marker and the next chapter marker.
    pub fn section_for_subchapter(&self, chapter: u32, sub: u32) -> Option<String> {
        let lines: Vec<&str> = self.0.lines().collect();
        let chapter_start = lines
            .iter()
            .position(|line| marker_number(&CHAPTER_MARKER, line) == Some(chapter))?;
        let chapter_block = &lines[chapter_start + 1..];
        let chapter_end = chapter_block
            .iter()
            .position(|line| is_chapter_marker(line))
            .unwrap_or(chapter_block.len());
        let chapter_block = &chapter_block[..chapter_end];

        let start = chapter_block
            .iter()
            .position(|line| marker_number(&SUBCHAPTER_MARKER, line) == Some(sub))?;
        let section = collect_section(&chapter_block[start..], |line| {
            is_chapter_marker(line) || SUBCHAPTER_MARKER.is_match(line.trim())
        });
        Some(section.join("\n"))
    }
}

fn marker_number(marker: &Regex, line: &str) -> Option<u32> {
    marker
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn is_chapter_marker(line: &str) -> bool {
    line.trim().starts_with("Chapter:")
}

/// Keep the marker line, then every following line until `ends` matches or a
/// blank line is reached.
fn collect_section<'a>(lines: &[&'a str], ends: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let mut section = vec![lines[0]];
    for line in &lines[1..] {
        if line.trim().is_empty() || ends(line) {
            break;
        }
        section.push(line);
    }
    section
}
