use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::error::SinkError;
use crate::models::UnitId;
use crate::output::{EmitKind, OutputSink};
use crate::utils::wrap_words;

const LINE_WIDTH: usize = 150;

/// Plain-text book written incrementally, so partial output survives an
/// interrupted session.
pub struct TextFileSink {
    path: PathBuf,
    current_chapter: Option<u32>,
}

impl TextFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current_chapter: None,
        }
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn create(&self, contents: &str) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(contents.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn append(&self, contents: &str) -> Result<(), SinkError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(contents.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn enter_chapter(&mut self, unit: &UnitId) -> Result<(), SinkError> {
        let Some(chapter) = unit.chapter() else {
            return Ok(());
        };
        if self.current_chapter != Some(chapter) {
            self.current_chapter = Some(chapter);
            self.append(&format!("\n\n---------- Chapter: {chapter} ----------\n\n"))?;
        }
        Ok(())
    }
}

impl OutputSink for TextFileSink {
    fn emit(&mut self, kind: EmitKind, unit: &UnitId, text: &str) -> Result<(), SinkError> {
        match kind {
            EmitKind::Header => {
                tracing::info!("Writing header to {}", self.path.display());
                self.current_chapter = None;
                self.create(text)
            }
            EmitKind::Outline => self.append(&format!(
                "\n\n----- BOOK OUTLINE -----\n{text}\n\n----- BOOK CONTENT -----\n"
            )),
            EmitKind::Content => {
                self.enter_chapter(unit)?;
                self.append(&format!("{}\n", wrap_words(text, LINE_WIDTH)))
            }
            EmitKind::ErrorMarker => {
                self.enter_chapter(unit)?;
                self.append(&format!("\n\n{text}\n"))
            }
        }
    }
}
