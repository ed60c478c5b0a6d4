//! Long-form book generation driven by a text generation API.
//!
//! A [`GenerationSession`] asks the model for an outline, then writes every
//! chapter (or sub-chapter) against that outline, feeding the tail of the
//! previous unit forward so the prose stays continuous.

pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod output;
pub mod services;
pub mod utils;

pub use config::{AppConfig, GenerationPolicy, OutputFormat};
pub use error::{BookSpecError, ConfigError, SessionError, SinkError};
pub use models::{ApiKey, ApiTier, BookSpec, DerivedConfig, Outline, SessionReport};
pub use services::session::{GenerationSession, SessionOptions};
pub use services::{Interaction, Interrupt, TextGenerator};
