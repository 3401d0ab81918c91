//! Courseforge HTTP Client
//!
//! A small, type-safe HTTP client for the layout-generation endpoint.
//!
//! The poller uses it to dispatch claimed courses; operators can use it to
//! inspect courses currently being processed.
//!
//! # Example
//!
//! ```no_run
//! use courseforge_client::LayoutClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LayoutClient::new("http://localhost:3000");
//!
//!     let response = client.generate_layout("c1").await?;
//!     println!("success: {}", response.success);
//!     Ok(())
//! }
//! ```

pub mod error;
mod layout;

// Re-export commonly used types
pub use error::{ClientError, Result, TransportFailure, classify_transport};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the courseforge layout API
#[derive(Debug, Clone)]
pub struct LayoutClient {
    /// Base URL of the server (e.g., "http://localhost:3000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl LayoutClient {
    /// Create a new layout client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:3000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new layout client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-2xx responses become [`ClientError::ApiError`], carrying the
    /// `error` field of the body when there is one.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Extracts the `error` field of a JSON error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
