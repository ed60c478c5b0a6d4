use std::time::Duration;

use tokio::time::sleep;

use crate::config::GenerationPolicy;
use crate::error::SessionError;
use crate::models::{ApiKey, AttemptResult, UnitId};
use crate::services::{Interaction, TextGenerator};

/// One unit of work for the [`AttemptController`].
#[derive(Debug, Clone)]
pub struct UnitRequest {
    pub unit: UnitId,
    pub prompt: String,
    pub max_tokens: u32,
    /// Regenerate while the output is shorter than this, attempts permitting.
    pub min_words: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Accepted {
        text: String,
        word_count: usize,
        attempts: u32,
    },
    /// Every attempt failed; `last_error` is the classified final failure.
    Exhausted { last_error: String, attempts: u32 },
}

#[derive(Debug)]
enum AttemptState {
    Building,
    Calling,
    Validating(AttemptResult),
    Succeeded { text: String, word_count: usize },
    Failed(String),
}

/// Bounded retry loop around a [`TextGenerator`].
#[derive(Clone, Copy)]
pub struct AttemptController<'a> {
    client: &'a dyn TextGenerator,
    policy: &'a GenerationPolicy,
    wait: Duration,
}

impl<'a> AttemptController<'a> {
    pub fn new(
        client: &'a dyn TextGenerator,
        policy: &'a GenerationPolicy,
        wait: Duration,
    ) -> Self {
        Self {
            client,
            policy,
            wait,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts.max(1)
    }

    /// Drive `request` to acceptance or exhaustion.
    ///
    /// The prompt is sent unchanged on every attempt. A quota failure asks
    /// `interaction` for a new key and re-sends without using up an attempt;
    /// declining is returned as [`SessionError::QuotaAbandoned`].
    #[tracing::instrument(skip_all, fields(unit = %request.unit))]
    pub async fn run(
        &self,
        key: &mut ApiKey,
        interaction: &mut dyn Interaction,
        request: &UnitRequest,
    ) -> Result<UnitOutcome, SessionError> {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;
        let mut state = AttemptState::Building;

        loop {
            state = match state {
                AttemptState::Building => {
                    attempt += 1;
                    tracing::info!("Attempt {}/{} for {}", attempt, max_attempts, request.unit);
                    AttemptState::Calling
                }
                AttemptState::Calling => {
                    let result = self
                        .client
                        .generate(key, &request.prompt, request.max_tokens)
                        .await;
                    if result == AttemptResult::QuotaExceeded {
                        self.recover_quota(key, interaction, request.unit).await?;
                        AttemptState::Calling
                    } else {
                        AttemptState::Validating(result)
                    }
                }
                AttemptState::Validating(AttemptResult::Success { text, word_count }) => {
                    tracing::info!(
                        "{} (attempt {}) generated: ~{} words",
                        request.unit,
                        attempt,
                        word_count
                    );
                    match request.min_words {
                        Some(min) if word_count < min && attempt < max_attempts => {
                            tracing::warn!(
                                "Word count ({}) < min ({}), regenerating",
                                word_count,
                                min
                            );
                            sleep(self.wait).await;
                            AttemptState::Building
                        }
                        Some(min) if word_count < min => {
                            tracing::warn!(
                                "Word count still low after {} attempts, keeping",
                                max_attempts
                            );
                            AttemptState::Succeeded { text, word_count }
                        }
                        _ => AttemptState::Succeeded { text, word_count },
                    }
                }
                AttemptState::Validating(failure) => {
                    tracing::warn!(
                        "Error generating {} (attempt {}): {}",
                        request.unit,
                        attempt,
                        failure
                    );
                    if attempt >= max_attempts {
                        tracing::error!("Max attempts reached for {}", request.unit);
                        AttemptState::Failed(failure.to_string())
                    } else {
                        let backoff = self.wait * self.policy.error_backoff_multiplier;
                        tracing::info!("Waiting {:?} before retry", backoff);
                        sleep(backoff).await;
                        AttemptState::Building
                    }
                }
                AttemptState::Succeeded { text, word_count } => {
                    sleep(self.wait).await;
                    return Ok(UnitOutcome::Accepted {
                        text,
                        word_count,
                        attempts: attempt,
                    });
                }
                AttemptState::Failed(last_error) => {
                    return Ok(UnitOutcome::Exhausted {
                        last_error,
                        attempts: attempt,
                    });
                }
            };
        }
    }

    async fn recover_quota(
        &self,
        key: &mut ApiKey,
        interaction: &mut dyn Interaction,
        unit: UnitId,
    ) -> Result<(), SessionError> {
        tracing::warn!("API quota limit reached, the current key has likely hit its usage limit");
        loop {
            let answer = interaction
                .request_credential(
                    "Quota Limit Reached",
                    "Please enter a new Google AI API key (or cancel):",
                )
                .await
                .map(ApiKey::new);
            match answer {
                Some(candidate) if candidate.looks_valid() => {
                    *key = candidate;
                    tracing::info!("API key updated, retrying the last request");
                    sleep(Duration::from_millis(self.policy.quota_resume_ms)).await;
                    return Ok(());
                }
                Some(candidate) if !candidate.expose().is_empty() => {
                    tracing::warn!("Invalid API key format, asking again");
                }
                _ => {
                    tracing::error!("No new key provided, aborting generation");
                    return Err(SessionError::QuotaAbandoned {
                        unit: unit.to_string(),
                    });
                }
            }
        }
    }
}
