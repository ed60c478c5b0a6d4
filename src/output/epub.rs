use std::fs::File;
use std::path::PathBuf;

use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use html_escape::encode_text;

use crate::error::SinkError;
use crate::models::UnitId;
use crate::output::{EmitKind, OutputSink};

#[derive(Debug, Default)]
struct ChapterBody {
    number: u32,
    blocks: Vec<String>,
}

/// Collects the book in memory and writes an EPUB when the session finishes.
pub struct EpubSink {
    path: PathBuf,
    title: String,
    header: String,
    outline: String,
    chapters: Vec<ChapterBody>,
}

impl EpubSink {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            header: String::new(),
            outline: String::new(),
            chapters: Vec::new(),
        }
    }

    fn chapter_mut(&mut self, number: u32) -> &mut ChapterBody {
        if self.chapters.last().map(|c| c.number) != Some(number) {
            self.chapters.push(ChapterBody {
                number,
                blocks: Vec::new(),
            });
        }
        let last = self.chapters.len() - 1;
        &mut self.chapters[last]
    }

    fn write(&self) -> Result<(), SinkError> {
        let library = ZipLibrary::new().map_err(epub_error)?;
        let mut builder = EpubBuilder::new(library).map_err(epub_error)?;
        builder
            .metadata("title", self.title.as_str())
            .map_err(epub_error)?;

        let title_page = xhtml(
            &self.title,
            &format!("<h1>{}</h1>\n{}", encode_text(&self.title), paragraphs(&self.header)),
        );
        builder
            .add_content(
                EpubContent::new("title.xhtml", title_page.as_bytes())
                    .title(self.title.as_str())
                    .reftype(ReferenceType::TitlePage),
            )
            .map_err(epub_error)?;

        if !self.outline.is_empty() {
            let outline_page = xhtml(
                "Book Outline",
                &format!("<h2>Book Outline</h2>\n{}", paragraphs(&self.outline)),
            );
            builder
                .add_content(
                    EpubContent::new("outline.xhtml", outline_page.as_bytes())
                        .title("Book Outline")
                        .reftype(ReferenceType::Preface),
                )
                .map_err(epub_error)?;
        }

        for chapter in &self.chapters {
            let heading = format!("Chapter {}", chapter.number);
            let body = chapter
                .blocks
                .iter()
                .map(|block| paragraphs(block))
                .collect::<Vec<_>>()
                .join("\n");
            let page = xhtml(&heading, &format!("<h2>{}</h2>\n{}", heading, body));
            builder
                .add_content(
                    EpubContent::new(format!("chapter_{}.xhtml", chapter.number), page.as_bytes())
                        .title(heading.as_str())
                        .reftype(ReferenceType::Text),
                )
                .map_err(epub_error)?;
        }
        builder.inline_toc();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let mut file = File::create(&self.path).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;
        builder.generate(&mut file).map_err(epub_error)?;
        tracing::info!("EPUB output saved to {}", self.path.display());
        Ok(())
    }
}

impl OutputSink for EpubSink {
    fn emit(&mut self, kind: EmitKind, unit: &UnitId, text: &str) -> Result<(), SinkError> {
        match kind {
            EmitKind::Header => {
                self.header = text.to_string();
                self.outline.clear();
                self.chapters.clear();
            }
            EmitKind::Outline => self.outline = text.to_string(),
            EmitKind::Content | EmitKind::ErrorMarker => {
                if let Some(number) = unit.chapter() {
                    self.chapter_mut(number).blocks.push(text.to_string());
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.write()
    }
}

fn epub_error(e: impl std::fmt::Display) -> SinkError {
    SinkError::Epub(e.to_string())
}

fn xhtml(title: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head><title>{}</title></head>\n\
         <body>\n{}\n</body>\n</html>\n",
        encode_text(title),
        body
    )
}

/// One `<p>` per non-empty line.
fn paragraphs(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", encode_text(line)))
        .collect::<Vec<_>>()
        .join("\n")
}
