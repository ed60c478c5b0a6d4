//! Destinations for generated text.

mod epub;
mod text;

pub use epub::EpubSink;
pub use text::TextFileSink;

use std::path::PathBuf;

use crate::error::SinkError;
use crate::models::UnitId;
use crate::services::Interaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    Header,
    Outline,
    Content,
    /// Placeholder recorded where a unit could not be generated.
    ErrorMarker,
}

/// Receives every accepted piece of output, in order.
pub trait OutputSink: Send {
    fn emit(&mut self, kind: EmitKind, unit: &UnitId, text: &str) -> Result<(), SinkError>;

    /// Called once when the session stops producing output.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Fans events out to several sinks.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn OutputSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn OutputSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutputSink for MultiSink {
    fn emit(&mut self, kind: EmitKind, unit: &UnitId, text: &str) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.emit(kind, unit, text)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.finish()?;
        }
        Ok(())
    }
}

/// Whether a run may write to `paths`.
///
/// When any of them already exists the user is asked first, unless `force`
/// is set.
pub async fn overwrite_allowed(
    paths: &[PathBuf],
    force: bool,
    interaction: &mut dyn Interaction,
) -> bool {
    let existing: Vec<String> = paths
        .iter()
        .filter(|path| path.exists())
        .map(|path| path.display().to_string())
        .collect();
    if existing.is_empty() {
        return true;
    }
    if force {
        tracing::warn!("Overwriting existing output: {}", existing.join(", "));
        return true;
    }
    interaction
        .confirm(
            "Output Exists",
            &format!(
                "Output already exists:\n{}\nOverwrite it?",
                existing.join("\n")
            ),
        )
        .await
}
