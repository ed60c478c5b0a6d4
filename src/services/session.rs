use uuid::Uuid;

use crate::config::GenerationPolicy;
use crate::error::SessionError;
use crate::models::{ApiKey, ApiTier, BookSpec, Continuity, DerivedConfig, SessionReport, UnitId};
use crate::output::{EmitKind, OutputSink};
use crate::services::attempt::AttemptController;
use crate::services::content::ContentOrchestrator;
use crate::services::outline::OutlineOrchestrator;
use crate::services::prompt::PromptBuilder;
use crate::services::{Interaction, Interrupt, TextGenerator};

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub tier: ApiTier,
    pub regen_on_low_words: bool,
}

/// Mutable state threaded through the orchestrators.
#[derive(Debug)]
pub struct SessionState {
    pub key: ApiKey,
    pub continuity: Continuity,
    pub report: SessionReport,
}

/// One book generation run: outline first, then content.
pub struct GenerationSession {
    id: Uuid,
    book: BookSpec,
    plan: DerivedConfig,
    policy: GenerationPolicy,
    options: SessionOptions,
    state: SessionState,
}

impl GenerationSession {
    pub fn new(
        book: BookSpec,
        policy: GenerationPolicy,
        options: SessionOptions,
        key: ApiKey,
    ) -> Result<Self, SessionError> {
        book.validate()?;
        let plan = DerivedConfig::derive(&book, &policy);
        let state = SessionState {
            key,
            continuity: Continuity::new(policy.context_chars),
            report: SessionReport::default(),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            book,
            plan,
            policy,
            options,
            state,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn plan(&self) -> &DerivedConfig {
        &self.plan
    }

    /// Book description written ahead of the outline.
    pub fn header(&self) -> String {
        let book = &self.book;
        let plan = &self.plan;
        let mut lines = vec![
            format!("Book Title: {}", book.title),
            format!("Genre: {}", book.genre_list()),
            format!("Target Chapters: {}", book.chapters),
            format!("Target Words/Chapter (Prompt): ~{}", plan.chapter_prompt_words),
            format!("Sub-Chapters/Chapter: {}", plan.subchapters_per_chapter),
        ];
        if plan.uses_subchapters() {
            lines.push(format!(
                "Target Words/Sub-Chapter (Prompt): ~{}",
                plan.subchapter_prompt_words
            ));
        }
        if let Some(characters) = book.character_notes() {
            lines.push("\n----- CHARACTER NOTES -----".to_string());
            lines.push(characters.to_string());
        }
        if let Some(world) = book.world_notes() {
            lines.push("\n----- WORLD NOTES -----".to_string());
            lines.push(world.to_string());
        }
        lines.join("\n")
    }

    fn log_plan(&self) {
        let plan = &self.plan;
        if plan.uses_subchapters() {
            tracing::info!(
                "Chapters > {} words, split into {} sub-chapters (~{} words each)",
                self.policy.subchapter_threshold,
                plan.subchapters_per_chapter,
                plan.words_per_subchapter
            );
        }
        tracing::info!("Total outline items to generate: {}", plan.total_outline_items);
        tracing::info!("Adjusted prompt target words/chapter: ~{}", plan.chapter_prompt_words);
        if plan.uses_subchapters() {
            tracing::info!(
                "Adjusted prompt target words/sub-chapter: ~{}",
                plan.subchapter_prompt_words
            );
        }
    }

    /// Run the whole pipeline against the given collaborators.
    ///
    /// Output already handed to `sink` is kept when the session stops early.
    #[tracing::instrument(skip_all, fields(session_id = %self.id, title = %self.book.title))]
    pub async fn run(
        &mut self,
        client: &dyn TextGenerator,
        interaction: &mut dyn Interaction,
        sink: &mut dyn OutputSink,
        interrupt: &Interrupt,
    ) -> Result<SessionReport, SessionError> {
        tracing::info!("Generation session started");
        self.log_plan();

        let wait = self.policy.wait_for(self.options.tier);
        let controller = AttemptController::new(client, &self.policy, wait);
        let prompts = PromptBuilder::new(&self.book, &self.plan, self.policy.outline_context_chars);

        let outline = OutlineOrchestrator::new(controller, &prompts, &self.plan, &self.policy)
            .generate(&mut self.state.key, interaction, interrupt)
            .await?;
        let Some(outline) = outline else {
            tracing::warn!("Generation interrupted during outline generation");
            self.state.report.interrupted = true;
            return Ok(self.state.report.clone());
        };

        sink.emit(EmitKind::Header, &UnitId::Book, &self.header())?;
        sink.emit(EmitKind::Outline, &UnitId::Outline, outline.as_str())?;

        let content = ContentOrchestrator::new(
            controller,
            &prompts,
            &self.plan,
            &self.policy,
            self.options.regen_on_low_words,
        )
        .generate(&mut self.state, interaction, sink, &outline, interrupt)
        .await;

        // Sinks that buffer still flush what they have unless writing itself failed.
        match content {
            Err(err @ SessionError::Write(_)) => return Err(err),
            content => {
                sink.finish()?;
                content?;
            }
        }

        let report = self.state.report.clone();
        if report.interrupted {
            tracing::warn!("Generation interrupted, partial output retained");
        } else {
            tracing::info!("Generation complete for '{}'", self.book.title);
        }
        tracing::info!(
            "Total approximate words generated: {} ({} units accepted, {} failed)",
            report.total_words,
            report.units_accepted,
            report.units_failed
        );
        Ok(report)
    }
}
