mod book;
mod continuity;
mod outline;
mod plan;
mod unit;

pub use book::{
    ApiKey, ApiTier, BookSpec, MAX_CHAPTERS, MAX_WORDS_PER_CHAPTER, MIN_WORDS_PER_CHAPTER,
};
pub use continuity::Continuity;
pub use outline::Outline;
pub use plan::DerivedConfig;
pub use unit::{AttemptResult, UnitId};

use serde::Serialize;

/// Totals reported when a session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub total_words: usize,
    pub units_accepted: u32,
    pub units_failed: u32,
    pub interrupted: bool,
}
