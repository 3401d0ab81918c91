//! Text generation
//!
//! The layout service only needs "a service that turns a prompt into text";
//! [`TextGenerator`] is that seam. [`GeminiGenerator`] is the production
//! implementation.

mod gemini;

pub use gemini::{GeminiConfig, GeminiGenerator, GenerationConfig};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("undecodable generation stream: {0}")]
    Decode(String),
}

/// Turns a prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the complete generated text; empty if the model produced none
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}
