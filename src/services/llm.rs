use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::models::{ApiKey, AttemptResult};
use crate::services::TextGenerator;

/// Finish reasons that mean the output was withheld by a content filter.
const FILTER_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "RECITATION",
];

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api: ApiConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    category: String,
    probability: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(api: ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;
        Ok(GeminiClient { client, api })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api.base_url.trim_end_matches('/'),
            self.api.model
        )
    }

    fn payload(&self, prompt: &str, max_tokens: u32) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.api.temperature,
                "maxOutputTokens": max_tokens,
                "topP": self.api.top_p,
                "topK": self.api.top_k,
            },
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" },
            ],
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, key: &ApiKey, prompt: &str, max_tokens: u32) -> AttemptResult {
        tracing::debug!(max_tokens, model = %self.api.model, "Making API call");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key.expose())])
            .header("Content-Type", "application/json")
            .json(&self.payload(prompt, max_tokens))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::warn!("Request timed out after {} seconds", self.api.timeout_secs);
                return AttemptResult::TransientError("Request Timeout".to_string());
            }
            Err(e) => {
                tracing::warn!("Request failed: {}", e);
                return AttemptResult::TransientError(format!("Request failed: {e}"));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read response body: {}", e);
                return AttemptResult::TransientError(format!("Request failed: {e}"));
            }
        };

        classify(status, &body)
    }
}

/// Map an HTTP status and body onto an [`AttemptResult`].
fn classify(status: StatusCode, body: &str) -> AttemptResult {
    let data: GenerateResponse = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(_) => {
            let preview: String = body.chars().take(500).collect();
            tracing::warn!(status = status.as_u16(), "Non-JSON response: {}", preview);
            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Quota limit likely reached (status 429)");
                return AttemptResult::QuotaExceeded;
            }
            return AttemptResult::TransientError(format!(
                "{} - Non-JSON Response",
                status.as_u16()
            ));
        }
    };

    if let Some(error) = data.error {
        let code = error.code.unwrap_or(status.as_u16());
        let message = error.message.unwrap_or_else(|| "Unknown error structure".to_string());
        tracing::warn!(code, "API error: {}", message);
        let lowered = message.to_lowercase();
        if code == 429 || lowered.contains("quota") || lowered.contains("rate limit") {
            tracing::warn!("Quota limit likely reached");
            return AttemptResult::QuotaExceeded;
        }
        return AttemptResult::TransientError(format!("{code} - {message}"));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("Quota limit likely reached (status 429)");
        return AttemptResult::QuotaExceeded;
    }
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "API error without error payload");
        return AttemptResult::TransientError(format!("Status Code {}", status.as_u16()));
    }

    let candidate = data.candidates.into_iter().next().unwrap_or_default();
    let text = candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text);
    let finish_reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());

    if let Some(reason) = data.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        if text.is_none() {
            tracing::warn!("Prompt blocked: {}", reason);
            return AttemptResult::ContentBlocked(format!("Prompt blocked ({reason})"));
        }
    }

    if finish_reason != "STOP" && finish_reason != "MAX_TOKENS" {
        tracing::warn!("Generation finished with reason: {}", finish_reason);
        if text.is_some() {
            tracing::warn!("Content might be partial or incomplete");
            return AttemptResult::TransientError(format!(
                "API Warning: Generation finished unexpectedly ({finish_reason}), content may be incomplete"
            ));
        }
        log_safety_ratings(&candidate.safety_ratings);
        if FILTER_REASONS.contains(&finish_reason.as_str()) {
            return AttemptResult::ContentBlocked(format!(
                "Generation stopped ({finish_reason}) with no content"
            ));
        }
        return AttemptResult::TransientError(format!(
            "Generation stopped ({finish_reason}) with no content"
        ));
    }

    match text {
        Some(text) => {
            if finish_reason == "MAX_TOKENS" {
                tracing::warn!("Max output tokens reached, content might be truncated");
            }
            tracing::debug!("API call successful");
            AttemptResult::success(text)
        }
        None => {
            tracing::warn!("Response successful, but no text content found");
            tracing::debug!("Response body: {}", body);
            log_safety_ratings(&candidate.safety_ratings);
            AttemptResult::ParseFailure("No text content found in response".to_string())
        }
    }
}

fn log_safety_ratings(ratings: &[SafetyRating]) {
    for rating in ratings {
        tracing::warn!("Safety rating {}: {}", rating.category, rating.probability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> AttemptResult {
        classify(StatusCode::OK, body)
    }

    #[test]
    fn stop_with_text_is_success() {
        let result = ok(
            r#"{"candidates":[{"content":{"parts":[{"text":"It began at dusk."}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(result, AttemptResult::success("It began at dusk."));
    }

    #[test]
    fn max_tokens_with_text_is_still_success() {
        let result =
            ok(r#"{"candidates":[{"content":{"parts":[{"text":"cut"}]},"finishReason":"MAX_TOKENS"}]}"#);
        assert!(matches!(result, AttemptResult::Success { .. }));
    }

    #[test]
    fn unexpected_finish_with_text_is_a_warning_failure() {
        let result =
            ok(r#"{"candidates":[{"content":{"parts":[{"text":"half"}]},"finishReason":"OTHER"}]}"#);
        match result {
            AttemptResult::TransientError(message) => assert!(message.starts_with("API Warning:")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn safety_stop_without_text_is_blocked() {
        let result = ok(
            r#"{"candidates":[{"finishReason":"SAFETY","safetyRatings":[{"category":"HARM_CATEGORY_HARASSMENT","probability":"HIGH"}]}]}"#,
        );
        assert!(matches!(result, AttemptResult::ContentBlocked(_)));
    }

    #[test]
    fn prompt_feedback_block_is_blocked() {
        let result = ok(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#);
        assert!(matches!(result, AttemptResult::ContentBlocked(_)));
    }

    #[test]
    fn stop_without_text_is_parse_failure() {
        let result = ok(r#"{"candidates":[{"content":{"parts":[]},"finishReason":"STOP"}]}"#);
        assert!(matches!(result, AttemptResult::ParseFailure(_)));
    }

    #[test]
    fn error_payload_mentioning_quota_is_quota() {
        let body = r#"{"error":{"code":403,"message":"Quota exceeded for project"}}"#;
        assert_eq!(classify(StatusCode::FORBIDDEN, body), AttemptResult::QuotaExceeded);
        let body = r#"{"error":{"code":429,"message":"Resource exhausted"}}"#;
        assert_eq!(classify(StatusCode::TOO_MANY_REQUESTS, body), AttemptResult::QuotaExceeded);
    }

    #[test]
    fn other_error_payload_is_transient() {
        let body = r#"{"error":{"code":500,"message":"Internal error"}}"#;
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, body),
            AttemptResult::TransientError("500 - Internal error".to_string())
        );
    }

    #[test]
    fn non_json_bodies() {
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            AttemptResult::QuotaExceeded
        );
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, "<html>"),
            AttemptResult::TransientError("502 - Non-JSON Response".to_string())
        );
    }
}
