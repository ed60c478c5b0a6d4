use crate::config::GenerationPolicy;
use crate::error::SessionError;
use crate::models::{DerivedConfig, Outline, UnitId};
use crate::output::{EmitKind, OutputSink};
use crate::services::attempt::{AttemptController, UnitOutcome, UnitRequest};
use crate::services::prompt::{PromptBuilder, PromptKind};
use crate::services::session::SessionState;
use crate::services::{Interaction, Interrupt};

/// Writes the chapters, or the sub-chapters of each chapter, in order.
pub struct ContentOrchestrator<'a> {
    controller: AttemptController<'a>,
    prompts: &'a PromptBuilder<'a>,
    plan: &'a DerivedConfig,
    policy: &'a GenerationPolicy,
    regen_on_low_words: bool,
}

impl<'a> ContentOrchestrator<'a> {
    pub fn new(
        controller: AttemptController<'a>,
        prompts: &'a PromptBuilder<'a>,
        plan: &'a DerivedConfig,
        policy: &'a GenerationPolicy,
        regen_on_low_words: bool,
    ) -> Self {
        Self {
            controller,
            prompts,
            plan,
            policy,
            regen_on_low_words,
        }
    }

    /// Generate every chapter, emitting each accepted unit to `sink`.
    ///
    /// Units that exhaust their attempts leave an error marker in the output
    /// and generation carries on. Stops early, with `interrupted` set on the
    /// report, when `interrupt` fires.
    pub async fn generate(
        &self,
        state: &mut SessionState,
        interaction: &mut dyn Interaction,
        sink: &mut dyn OutputSink,
        outline: &Outline,
        interrupt: &Interrupt,
    ) -> Result<(), SessionError> {
        tracing::info!("Starting chapter/sub-chapter generation");
        for chapter in 1..=self.plan.chapters {
            if interrupt.is_triggered() {
                state.report.interrupted = true;
                return Ok(());
            }
            tracing::info!("Generating chapter {}/{}", chapter, self.plan.chapters);
            state.continuity.begin_chapter();

            if self.plan.uses_subchapters() {
                self.subchapters(state, interaction, sink, outline, interrupt, chapter)
                    .await?;
                if state.report.interrupted {
                    return Ok(());
                }
            } else {
                let unit = UnitId::Chapter(chapter);
                let prompt = self.prompts.build(&PromptKind::Chapter {
                    chapter,
                    outline,
                    previous: state.continuity.chapter_tail(),
                });
                let request = self.request(unit, prompt, self.plan.chapter_prompt_words);
                if let Some(text) = self.run_unit(state, interaction, sink, &request).await? {
                    state.continuity.accept_chapter(&text);
                }
            }
            tracing::info!("Chapter {} finished", chapter);
        }
        Ok(())
    }

    async fn subchapters(
        &self,
        state: &mut SessionState,
        interaction: &mut dyn Interaction,
        sink: &mut dyn OutputSink,
        outline: &Outline,
        interrupt: &Interrupt,
        chapter: u32,
    ) -> Result<(), SessionError> {
        let count = self.plan.subchapters_per_chapter;
        let mut parts = Vec::with_capacity(count as usize);
        for sub in 1..=count {
            if interrupt.is_triggered() {
                state.report.interrupted = true;
                return Ok(());
            }
            tracing::info!("Generating sub-chapter {}-{} ({}/{})", chapter, sub, sub, count);
            let unit = UnitId::SubChapter { chapter, sub };
            let prompt = self.prompts.build(&PromptKind::SubChapter {
                chapter,
                sub,
                outline,
                previous: state.continuity.subchapter_tail(),
                previous_chapter: state.continuity.chapter_tail(),
            });
            let request = self.request(unit, prompt, self.plan.subchapter_prompt_words);
            if let Some(text) = self.run_unit(state, interaction, sink, &request).await? {
                state.continuity.accept_subchapter(&text);
                parts.push(text);
            }
        }
        if !parts.is_empty() {
            state.continuity.accept_chapter(&parts.join("\n\n"));
        }
        Ok(())
    }

    fn request(&self, unit: UnitId, prompt: String, target: u32) -> UnitRequest {
        UnitRequest {
            unit,
            prompt,
            max_tokens: self.policy.content_max_tokens,
            min_words: self
                .regen_on_low_words
                .then(|| self.plan.regen_floor(target)),
        }
    }

    /// Run one unit and record its output. Returns the accepted text.
    async fn run_unit(
        &self,
        state: &mut SessionState,
        interaction: &mut dyn Interaction,
        sink: &mut dyn OutputSink,
        request: &UnitRequest,
    ) -> Result<Option<String>, SessionError> {
        match self.controller.run(&mut state.key, interaction, request).await? {
            UnitOutcome::Accepted {
                text, word_count, ..
            } => {
                sink.emit(EmitKind::Content, &request.unit, &text)?;
                state.report.total_words += word_count;
                state.report.units_accepted += 1;
                tracing::info!("{} finished (~{} words)", request.unit, word_count);
                Ok(Some(text))
            }
            UnitOutcome::Exhausted {
                last_error,
                attempts,
            } => {
                tracing::error!(
                    "Failed to generate {} after {} attempts, skipping",
                    request.unit,
                    attempts
                );
                sink.emit(
                    EmitKind::ErrorMarker,
                    &request.unit,
                    &error_marker(&request.unit, &last_error),
                )?;
                state.report.units_failed += 1;
                Ok(None)
            }
        }
    }
}

/// Inline placeholder recorded where a unit could not be generated.
pub fn error_marker(unit: &UnitId, message: &str) -> String {
    format!(
        "!! ERROR: {} {} !!\n{}",
        unit.kind_name().to_uppercase(),
        unit.number(),
        message
    )
}
