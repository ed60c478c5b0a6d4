use std::fmt;

/// Addressable piece of generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitId {
    /// Session header describing the book.
    Book,
    Outline,
    Chapter(u32),
    SubChapter { chapter: u32, sub: u32 },
}

impl UnitId {
    /// Chapter the unit belongs to, if any.
    pub fn chapter(&self) -> Option<u32> {
        match self {
            UnitId::Chapter(chapter) | UnitId::SubChapter { chapter, .. } => Some(*chapter),
            UnitId::Book | UnitId::Outline => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            UnitId::Book => "book",
            UnitId::Outline => "outline",
            UnitId::Chapter(_) => "chapter",
            UnitId::SubChapter { .. } => "sub-chapter",
        }
    }

    /// Numeric part of the label: `3` or `3-2`.
    pub fn number(&self) -> String {
        match self {
            UnitId::Book | UnitId::Outline => String::new(),
            UnitId::Chapter(chapter) => chapter.to_string(),
            UnitId::SubChapter { chapter, sub } => format!("{chapter}-{sub}"),
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Book | UnitId::Outline => f.write_str(self.kind_name()),
            _ => write!(f, "{} {}", self.kind_name(), self.number()),
        }
    }
}

/// Outcome of a single text generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Success { text: String, word_count: usize },
    QuotaExceeded,
    TransientError(String),
    ContentBlocked(String),
    ParseFailure(String),
}

impl AttemptResult {
    pub fn success(text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = crate::utils::word_count(&text);
        AttemptResult::Success { text, word_count }
    }
}

impl fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptResult::Success { word_count, .. } => write!(f, "Success: ~{word_count} words"),
            AttemptResult::QuotaExceeded => {
                f.write_str("Quota exceeded: API key rate or quota limit reached")
            }
            AttemptResult::TransientError(message) => write!(f, "API Error: {message}"),
            AttemptResult::ContentBlocked(message) => write!(f, "Content blocked: {message}"),
            AttemptResult::ParseFailure(message) => write!(f, "Parse failure: {message}"),
        }
    }
}
