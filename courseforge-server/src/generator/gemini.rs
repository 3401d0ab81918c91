//! Gemini text generator
//!
//! Calls `streamGenerateContent` with server-sent events and concatenates the
//! text of every event into one string. Nothing is validated until the stream
//! has been read to the end.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use super::{GeneratorError, TextGenerator};

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// API root (e.g., "https://generativelanguage.googleapis.com")
    pub base_url: String,
    pub generation: GenerationConfig,
}

pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: GeminiConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": self.config.generation,
        });

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut collector = SseTextCollector::default();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            collector.push(&chunk?)?;
        }

        let text = collector.finish()?;
        debug!("Generated {} characters", text.len());
        Ok(text)
    }
}

/// Accumulates the text of a `text/event-stream` body fed in arbitrary chunks
#[derive(Debug, Default)]
struct SseTextCollector {
    pending: Vec<u8>,
    text: String,
}

impl SseTextCollector {
    fn push(&mut self, chunk: &[u8]) -> Result<(), GeneratorError> {
        self.pending.extend_from_slice(chunk);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.process_line(&line)?;
        }

        Ok(())
    }

    fn finish(mut self) -> Result<String, GeneratorError> {
        let rest = std::mem::take(&mut self.pending);
        self.process_line(&rest)?;
        Ok(self.text)
    }

    fn process_line(&mut self, line: &[u8]) -> Result<(), GeneratorError> {
        let line = std::str::from_utf8(line).map_err(|e| GeneratorError::Decode(e.to_string()))?;
        let line = line.trim_end_matches(['\r', '\n']);

        let Some(data) = line.strip_prefix("data:") else {
            return Ok(());
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(());
        }

        let event: JsonValue =
            serde_json::from_str(data).map_err(|e| GeneratorError::Decode(e.to_string()))?;

        if let Some(error) = event.get("error") {
            return Err(GeneratorError::Api {
                status: error
                    .get("code")
                    .and_then(JsonValue::as_u64)
                    .and_then(|code| u16::try_from(code).ok())
                    .unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("stream error")
                    .to_string(),
            });
        }

        let parts = event
            .pointer("/candidates/0/content/parts")
            .and_then(JsonValue::as_array);
        for part in parts.into_iter().flatten() {
            if let Some(text) = part.get("text").and_then(JsonValue::as_str) {
                self.text.push_str(text);
            }
        }

        Ok(())
    }
}
