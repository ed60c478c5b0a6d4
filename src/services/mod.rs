pub mod attempt;
pub mod content;
pub mod llm;
pub mod outline;
pub mod prompt;
pub mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::models::{ApiKey, AttemptResult};

/// One call to a text generation backend.
///
/// Implementations classify every outcome into an [`AttemptResult`] and never
/// retry on their own.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, key: &ApiKey, prompt: &str, max_tokens: u32) -> AttemptResult;
}

/// Questions the engine asks whoever is driving it. Calls block the session
/// until answered.
#[async_trait]
pub trait Interaction: Send {
    async fn confirm(&mut self, title: &str, question: &str) -> bool;

    /// `None` means the user gave up.
    async fn request_credential(&mut self, title: &str, prompt: &str) -> Option<String>;
}

/// Coarse cancellation flag, checked before each unit starts.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
