//! Index manifest: which embedding model built the persisted index.

use crate::embeddings::EmbeddingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tutor_core::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub documents: u32,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn new(embedding: &EmbeddingConfig, documents: u32) -> Self {
        Self {
            provider: embedding.provider.clone(),
            model: embedding.model.clone(),
            dimensions: embedding.dimensions,
            documents,
            built_at: Utc::now(),
        }
    }

    /// Load the manifest, `None` when the index was never built.
    pub fn load(path: &Path) -> AppResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to read manifest {:?}: {}", path, e))
        })?;
        let manifest = serde_json::from_str(&content).map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to parse manifest {:?}: {}", path, e))
        })?;
        Ok(Some(manifest))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Saved index manifest to {:?}", path);
        Ok(())
    }

    /// Fail unless `configured` embeds into the same vector space.
    pub fn ensure_compatible(&self, configured: &EmbeddingConfig) -> AppResult<()> {
        let built = EmbeddingConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            dimensions: self.dimensions,
            ..configured.clone()
        };
        built.validate_consistency(configured)
    }
}
