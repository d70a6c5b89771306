//! # Runtime Configuration
//!
//! File layout of the `.scribe` runtime directory and the persisted
//! provider/model selection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::{LlmProvider, ModelConfig};

/// Persisted provider/model selection
pub const CONFIG_FILE: &str = "config.json";

/// Persisted API key (dotenv syntax)
pub const CREDENTIAL_FILE: &str = ".env";

/// Get the runtime directory path (.scribe)
pub fn get_runtime_path() -> PathBuf {
    if let Ok(path) = std::env::var("SCRIBE_RUNTIME_PATH") {
        return PathBuf::from(path);
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".scribe")
}

/// Create the runtime directory and the `.gitignore` that keeps keys out of git.
pub fn ensure_runtime_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let gitignore = dir.join(".gitignore");
    if !gitignore.exists() {
        std::fs::write(&gitignore, "# Never commit API keys\n.env\n*.env\n")?;
    }
    Ok(())
}

/// On-disk configuration. Every field is optional so PATCH-style updates merge.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PersistedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<LlmProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Ask on stdin for a key when none is configured (CLI only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_for_key: Option<bool>,
}

impl PersistedConfig {
    /// Load from `dir/config.json`; a missing or unreadable file yields defaults.
    pub async fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Ignoring malformed config: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create runtime directory: {:?}", dir))?;
        let path = dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write config: {:?}", path))
    }

    pub fn merge(&mut self, other: PersistedConfig) {
        if other.provider.is_some() {
            self.provider = other.provider;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.prompt_for_key.is_some() {
            self.prompt_for_key = other.prompt_for_key;
        }
    }

    /// Resolve into a full model config; an absent model falls back to the
    /// provider's default.
    pub fn model_config(&self) -> ModelConfig {
        let provider = self.provider.unwrap_or_default();
        let mut config = match &self.model {
            Some(model) => ModelConfig::with_provider(provider, model.clone()),
            None => ModelConfig::for_provider(provider),
        };
        if provider.supports_base_url() {
            config.base_url = self.base_url.clone();
        }
        config
    }
}
