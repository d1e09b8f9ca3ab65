//! Ollama embedding provider.
//!
//! Calls a local Ollama server (`/api/embeddings`) with a sentence embedding
//! model such as `all-minilm` or `nomic-embed-text`. The model is checked once
//! at construction; a server that is down or a model that is missing makes
//! construction fail with `ModelUnavailable`.

use crate::embeddings::{normalize, EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use tutor_core::{AppError, AppResult};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Model check attempts at construction time.
const CHECK_ATTEMPTS: u32 = 3;

const CHECK_BACKOFF_MS: u64 = 200;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    normalize: bool,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create the provider and verify the model answers with the configured
    /// dimension.
    ///
    /// The server URL comes from `provider_config.endpoint`, then
    /// `OLLAMA_URL`, then `http://localhost:11434`.
    pub async fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::ModelUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .provider_config
            .get("endpoint")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let provider = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model,
            dimensions: config.dimensions,
            normalize: config.normalize,
        };

        provider.check_model().await?;
        Ok(provider)
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn check_model(&self) -> AppResult<()> {
        let mut last_error = None;

        for attempt in 1..=CHECK_ATTEMPTS {
            match self.embed_single("connection check").await {
                Ok(_) => {
                    debug!("Ollama model '{}' ready at {}", self.model, self.base_url);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Ollama model check failed (attempt {}/{}): {}", attempt, CHECK_ATTEMPTS, e);
                    last_error = Some(e);
                    if attempt < CHECK_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(CHECK_BACKOFF_MS * attempt as u64))
                            .await;
                    }
                }
            }
        }

        Err(AppError::ModelUnavailable(format!(
            "Ollama not available at {} for model '{}' ({}). Run: ollama pull {}",
            self.base_url,
            self.model,
            last_error.map(|e| e.to_string()).unwrap_or_default(),
            self.model
        )))
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("Request to Ollama failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(AppError::ModelUnavailable(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::ModelUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        if body.embedding.len() != self.dimensions {
            return Err(AppError::ModelUnavailable(format!(
                "Ollama model '{}' returned {} dimensions, expected {}",
                self.model,
                body.embedding.len(),
                self.dimensions
            )));
        }

        let mut embedding = body.embedding;
        if self.normalize {
            normalize(&mut embedding);
        }
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // The endpoint takes one prompt per request.
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                embeddings.push(vec![0.0; self.dimensions]);
                continue;
            }
            embeddings.push(self.embed_single(text).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_is_model_unavailable() {
        let config = EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            // Port 9 (discard) is not an Ollama server.
            provider_config: serde_json::json!({"endpoint": "http://127.0.0.1:9"}),
            ..Default::default()
        };

        let err = OllamaProvider::new(config).await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(err.to_string().contains("ollama pull all-minilm"));
    }
}
