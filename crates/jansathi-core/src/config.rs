use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{JanSathiError, Result};

/// Environment variable holding the model API credential (required for
/// sessions; its absence makes session initialization fail).
pub const API_KEY_ENV: &str = "JANSATHI_API_KEY";

/// Environment variable holding the vector-index credential (optional;
/// absence silently disables retrieval).
pub const INDEX_API_KEY_ENV: &str = "JANSATHI_INDEX_API_KEY";

/// Environment variable holding the vector-index host URL (optional;
/// overrides the config file value).
pub const INDEX_HOST_ENV: &str = "JANSATHI_INDEX_HOST";

/// Top-level configuration for the JanSathi assistant.
///
/// Loaded from `~/.jansathi/config.toml` by default. Credentials are never
/// stored here; they are resolved from the environment so the file can be
/// shared freely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JanSathiConfig {
    pub general: GeneralConfig,
    pub model: ModelConfig,
    pub retrieval: RetrievalConfig,
    pub chat: ChatConfig,
}

impl JanSathiConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: JanSathiConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| JanSathiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Generation-model settings for conversation sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the generative-language API.
    pub endpoint: String,
    /// Model identifier used for every session.
    pub model: String,
    /// Sampling temperature. Kept low so scheme guidance stays factual.
    pub temperature: f32,
    /// Whether the hosted web-search tool is enabled for sessions.
    pub search_tool_enabled: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            temperature: 0.3,
            search_tool_enabled: true,
        }
    }
}

/// Knowledge-base retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Embedding dimensionality produced by `embedding_model`.
    pub embedding_dimensions: usize,
    /// Number of nearest neighbors to request from the index.
    pub top_k: usize,
    /// Whether to ask the index to return stored metadata.
    pub include_metadata: bool,
    /// Vector-index host URL. `JANSATHI_INDEX_HOST` overrides this;
    /// retrieval is disabled when neither is set.
    pub index_host: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-004".to_string(),
            embedding_dimensions: 768,
            top_k: 5,
            include_metadata: true,
            index_host: None,
        }
    }
}

/// Conversation-pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Domain suffixes citations must match to be kept.
    pub allowed_source_domains: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            allowed_source_domains: vec![".gov.in".to_string(), ".nic.in".to_string()],
        }
    }
}

/// Read the model API credential from the environment.
pub fn model_api_key() -> Option<String> {
    non_empty_env(API_KEY_ENV)
}

/// Read the vector-index credential from the environment.
pub fn index_api_key() -> Option<String> {
    non_empty_env(INDEX_API_KEY_ENV)
}

/// Resolve the vector-index host: environment first, then config file.
pub fn index_host(config: &RetrievalConfig) -> Option<String> {
    non_empty_env(INDEX_HOST_ENV).or_else(|| {
        config
            .index_host
            .as_ref()
            .filter(|h| !h.trim().is_empty())
            .cloned()
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
