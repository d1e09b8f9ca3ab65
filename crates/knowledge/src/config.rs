//! Knowledge base configuration and on-disk layout.
//!
//! ```text
//! .tutor/knowledge/<base>/
//!   config.yaml     KnowledgeBaseConfig
//!   manifest.json   IndexManifest of the last build
//!   index/          LanceDB database
//! ```

use crate::types::KnowledgeBaseConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tutor_core::{AppError, AppResult};

/// Load knowledge base configuration, falling back to defaults when the
/// base has no config file yet.
pub fn load_config(workspace: &Path, base_name: &str) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, base_name);

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        tracing::debug!("Loaded knowledge base config for '{}'", base_name);
        config
    } else {
        tracing::debug!(
            "Using default knowledge base config for '{}' (no config file found)",
            base_name
        );
        KnowledgeBaseConfig::default()
    };

    config.name = base_name.to_string();
    validate_config(&config)?;
    Ok(config)
}

/// Save knowledge base configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    validate_config(config)?;

    let config_path = get_config_path(workspace, &config.name);
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge base config for '{}'", config.name);
    Ok(())
}

pub fn validate_config(config: &KnowledgeBaseConfig) -> AppResult<()> {
    if config.batch_size == 0 {
        return Err(AppError::Config("batch_size must be at least 1".to_string()));
    }
    if config.top_k == 0 {
        return Err(AppError::Config("top_k must be at least 1".to_string()));
    }
    if config.embedding_dim == 0 {
        return Err(AppError::Config("embedding_dim must be at least 1".to_string()));
    }
    Ok(())
}

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    workspace.join(".tutor").join("knowledge").join(base_name)
}

pub fn get_config_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("config.yaml")
}

/// Get the LanceDB directory for a base.
pub fn get_index_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("index")
}

pub fn get_manifest_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("manifest.json")
}

/// Resolve the corpus path of a base against the workspace.
pub fn get_corpus_path(workspace: &Path, config: &KnowledgeBaseConfig) -> PathBuf {
    let path = PathBuf::from(&config.corpus_path);
    if path.is_absolute() {
        path
    } else {
        workspace.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "exam_knowledge").unwrap();

        assert_eq!(config.name, "exam_knowledge");
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.top_k, 2);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            name: "biology".to_string(),
            batch_size: 100,
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path(), "biology").unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "physics");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "name: physics\nprovider: trigram\nmodel: trigram-v1\ntop_k: 3\n").unwrap();

        let loaded = load_config(temp.path(), "physics").unwrap();
        assert_eq!(loaded.top_k, 3);
        assert_eq!(loaded.batch_size, 500);
        assert_eq!(loaded.embedding_dim, 384);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = KnowledgeBaseConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_corpus_path_resolution() {
        let workspace = Path::new("/work");
        let config = KnowledgeBaseConfig::default();
        assert_eq!(
            get_corpus_path(workspace, &config),
            PathBuf::from("/work/data/cleaned_exam.json")
        );
    }
}
