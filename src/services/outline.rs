use crate::config::GenerationPolicy;
use crate::error::SessionError;
use crate::models::{ApiKey, DerivedConfig, Outline, UnitId};
use crate::services::attempt::{AttemptController, UnitOutcome, UnitRequest};
use crate::services::prompt::{PromptBuilder, PromptKind};
use crate::services::{Interaction, Interrupt};
use crate::utils::strip_brackets;

enum PassOutcome {
    Complete(Outline),
    Failed,
    Interrupted,
}

/// Produces the book outline, in one call or in chapter chunks.
pub struct OutlineOrchestrator<'a> {
    controller: AttemptController<'a>,
    prompts: &'a PromptBuilder<'a>,
    plan: &'a DerivedConfig,
    policy: &'a GenerationPolicy,
}

impl<'a> OutlineOrchestrator<'a> {
    pub fn new(
        controller: AttemptController<'a>,
        prompts: &'a PromptBuilder<'a>,
        plan: &'a DerivedConfig,
        policy: &'a GenerationPolicy,
    ) -> Self {
        Self {
            controller,
            prompts,
            plan,
            policy,
        }
    }

    /// Generate outlines until the user keeps one.
    ///
    /// Returns `Ok(None)` if the interrupt fired before the outline was done.
    pub async fn generate(
        &self,
        key: &mut ApiKey,
        interaction: &mut dyn Interaction,
        interrupt: &Interrupt,
    ) -> Result<Option<Outline>, SessionError> {
        tracing::info!("Generating book outline");
        loop {
            match self.pass(key, interaction, interrupt).await? {
                PassOutcome::Interrupted => return Ok(None),
                PassOutcome::Failed => {
                    let retry = interaction
                        .confirm(
                            "Outline Failed",
                            "Outline generation failed. Retry the entire outline generation?",
                        )
                        .await;
                    if !retry {
                        return Err(SessionError::OutlineDeclined);
                    }
                    tracing::info!("Retrying outline generation");
                }
                PassOutcome::Complete(outline) => {
                    let preview: String = outline
                        .as_str()
                        .chars()
                        .take(self.policy.outline_preview_chars)
                        .collect();
                    tracing::info!("Generated outline (preview):\n{}...", preview);
                    let regenerate = interaction
                        .confirm("Review Outline", "Regenerate outline if not satisfactory?")
                        .await;
                    if !regenerate {
                        tracing::info!("Keeping the generated outline");
                        return Ok(Some(outline));
                    }
                    tracing::info!("Regenerating book outline");
                }
            }
        }
    }

    async fn pass(
        &self,
        key: &mut ApiKey,
        interaction: &mut dyn Interaction,
        interrupt: &Interrupt,
    ) -> Result<PassOutcome, SessionError> {
        if !self.plan.is_chunked() {
            if interrupt.is_triggered() {
                return Ok(PassOutcome::Interrupted);
            }
            tracing::info!("Generating outline in a single call");
            let request = UnitRequest {
                unit: UnitId::Outline,
                prompt: self.prompts.build(&PromptKind::OutlineFull),
                max_tokens: self.policy.outline_max_tokens,
                min_words: None,
            };
            return Ok(match self.controller.run(key, interaction, &request).await? {
                UnitOutcome::Accepted { text, .. } => {
                    tracing::info!("Book outline generation complete");
                    PassOutcome::Complete(Outline::new(strip_brackets(&text)))
                }
                UnitOutcome::Exhausted { .. } => PassOutcome::Failed,
            });
        }

        let chunks = self.plan.outline_chunks();
        tracing::info!(
            "Outline has {} items, > {}; generating in {} chunks",
            self.plan.total_outline_items,
            self.policy.outline_chunk_threshold,
            chunks.len()
        );
        let mut parts: Vec<String> = Vec::with_capacity(chunks.len());
        for (index, chapters) in chunks.iter().enumerate() {
            if interrupt.is_triggered() {
                return Ok(PassOutcome::Interrupted);
            }
            tracing::info!(
                "Generating outline chunk {}/{} (chapters {}-{})",
                index + 1,
                chunks.len(),
                chapters.start(),
                chapters.end()
            );
            let previous = parts.last().map(String::as_str).unwrap_or("");
            let request = UnitRequest {
                unit: UnitId::Outline,
                prompt: self.prompts.build(&PromptKind::OutlineChunk {
                    chapters: chapters.clone(),
                    previous,
                }),
                max_tokens: self.policy.outline_chunk_max_tokens,
                min_words: None,
            };
            match self.controller.run(key, interaction, &request).await? {
                UnitOutcome::Accepted { text, .. } => {
                    tracing::info!("Outline chunk {} generated", index + 1);
                    parts.push(strip_brackets(&text));
                }
                UnitOutcome::Exhausted { .. } => {
                    tracing::error!("Outline chunk {} failed", index + 1);
                    return Ok(PassOutcome::Failed);
                }
            }
        }
        tracing::info!("Full outline assembled");
        Ok(PassOutcome::Complete(Outline::new(parts.join("\n\n"))))
    }
}
