//! Embedding configuration types.

use crate::types::KnowledgeBaseConfig;
use serde::{Deserialize, Serialize};
use tutor_core::{AppError, AppResult};

/// Embedding configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to normalize embeddings to unit length
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// Provider-specific configuration (JSON object)
    #[serde(default)]
    pub provider_config: serde_json::Value,
}

fn default_normalize() -> bool {
    true
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            normalize: true,
            provider_config: serde_json::json!({}),
        }
    }
}

impl From<&KnowledgeBaseConfig> for EmbeddingConfig {
    fn from(base: &KnowledgeBaseConfig) -> Self {
        Self {
            provider: base.provider.clone(),
            model: base.model.clone(),
            dimensions: base.embedding_dim as usize,
            provider_config: match &base.endpoint {
                Some(endpoint) => serde_json::json!({ "endpoint": endpoint }),
                None => serde_json::json!({}),
            },
            ..Default::default()
        }
    }
}

impl EmbeddingConfig {
    /// Validate that another config describes the same vector space.
    ///
    /// Vectors from different providers, models or dimensions must never be
    /// compared against each other.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::IndexUnavailable(format!(
                "Provider mismatch: index built with '{}', configured '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::IndexUnavailable(format!(
                "Model mismatch: index built with '{}', configured '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::IndexUnavailable(format!(
                "Dimension mismatch: index built with {}, configured {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert!(config.normalize);
    }

    #[test]
    fn test_from_base_config() {
        let base = KnowledgeBaseConfig {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            embedding_dim: 384,
            ..Default::default()
        };

        let config = EmbeddingConfig::from(&base);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "all-minilm");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.provider_config, serde_json::json!({}));
    }

    #[test]
    fn test_endpoint_flows_into_provider_config() {
        let base: KnowledgeBaseConfig = serde_yaml::from_str(
            "name: exam_knowledge\nprovider: ollama\nmodel: all-minilm\nendpoint: http://gpu-box:11434\n",
        )
        .unwrap();

        let config = EmbeddingConfig::from(&base);
        assert_eq!(
            config.provider_config["endpoint"],
            serde_json::json!("http://gpu-box:11434")
        );
    }

    #[test]
    fn test_validate_consistency_success() {
        let config = EmbeddingConfig::default();
        assert!(config.validate_consistency(&config.clone()).is_ok());
    }

    #[test]
    fn test_validate_consistency_model_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            model: "trigram-v2".to_string(),
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(result.unwrap_err().to_string().contains("Model mismatch"));
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            dimensions: 768,
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }
}
