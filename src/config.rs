use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::ApiTier;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub generation: GenerationPolicy,
    pub output: OutputConfig,
}

/// Text generation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL up to and including the API version segment.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub timeout_secs: u64,
}

/// Retry, sizing and pacing constants for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationPolicy {
    pub max_attempts: u32,
    /// Applied to the tier wait before retrying a failed call.
    pub error_backoff_multiplier: u32,
    /// Pause after a replacement API key is accepted.
    pub quota_resume_ms: u64,
    pub free_wait_ms: u64,
    pub paid_wait_ms: u64,
    /// Scales requested word counts before they are put in prompts.
    pub word_inflation: f64,
    pub subchapter_threshold: u32,
    pub target_subchapter_words: u32,
    pub min_subchapters: u32,
    pub outline_chunk_threshold: u32,
    pub chapters_per_outline_chunk: u32,
    pub context_chars: usize,
    pub outline_context_chars: usize,
    pub outline_preview_chars: usize,
    pub prompt_min_ratio: f64,
    pub regen_min_ratio: f64,
    pub outline_max_tokens: u32,
    pub outline_chunk_max_tokens: u32,
    pub content_max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Txt,
    Epub,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash-001".to_string(),
            temperature: 0.8,
            top_p: 0.95,
            top_k: 40,
            timeout_secs: 300,
        }
    }
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            error_backoff_multiplier: 2,
            quota_resume_ms: 1000,
            free_wait_ms: 5000,
            paid_wait_ms: 500,
            word_inflation: 1.8,
            subchapter_threshold: 1500,
            target_subchapter_words: 500,
            min_subchapters: 3,
            outline_chunk_threshold: 15,
            chapters_per_outline_chunk: 3,
            context_chars: 2000,
            outline_context_chars: 1000,
            outline_preview_chars: 1000,
            prompt_min_ratio: 0.85,
            regen_min_ratio: 0.80,
            outline_max_tokens: 8192,
            outline_chunk_max_tokens: 6144,
            content_max_tokens: 8192,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("books"),
            formats: vec![OutputFormat::Txt],
        }
    }
}

impl GenerationPolicy {
    /// Pause between accepted calls for the given tier.
    pub fn wait_for(&self, tier: ApiTier) -> Duration {
        match tier {
            ApiTier::Free => Duration::from_millis(self.free_wait_ms),
            ApiTier::Paid => Duration::from_millis(self.paid_wait_ms),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    ///
    /// A path that does not exist also yields defaults; a file that exists but
    /// does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.generation, GenerationPolicy::default());
        assert_eq!(config.api.timeout_secs, 300);
        assert_eq!(config.output.formats, vec![OutputFormat::Txt]);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [generation]
            max_attempts = 6
            free_wait_ms = 100

            [output]
            formats = ["txt", "epub"]
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.max_attempts, 6);
        assert_eq!(config.generation.word_inflation, 1.8);
        assert_eq!(config.generation.wait_for(ApiTier::Free), Duration::from_millis(100));
        assert_eq!(config.output.formats, vec![OutputFormat::Txt, OutputFormat::Epub]);
    }

    #[test]
    fn tier_waits_default_to_five_seconds_and_half_a_second() {
        let policy = GenerationPolicy::default();
        assert_eq!(policy.wait_for(ApiTier::Free), Duration::from_secs(5));
        assert_eq!(policy.wait_for(ApiTier::Paid), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap();
        assert_eq!(config.api.model, "gemini-2.0-flash-001");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookforge.toml");
        std::fs::write(&path, "[generation\nmax_attempts = ").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
