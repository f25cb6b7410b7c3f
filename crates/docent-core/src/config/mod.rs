mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use docent_memory::{ChunkerConfig, SplitterError};

use crate::vault::{Secret, VaultProvider};

pub const API_KEY_VAR: &str = "DOCENT_API_KEY";
pub const EMBEDDING_API_KEY_VAR: &str = "DOCENT_EMBEDDING_API_KEY";

const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("required setting {key} is not set")]
    Missing { key: &'static str },

    #[error(transparent)]
    Vault(#[from] anyhow::Error),
}

impl From<SplitterError> for ConfigError {
    fn from(e: SplitterError) -> Self {
        Self::Invalid(format!("chunking: {e}"))
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Self>(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve credentials through the vault. The generation key is mandatory; the
    /// embedding key falls back to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no generation key is available, or the
    /// vault backend's error.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> Result<(), ConfigError> {
        let api_key = vault
            .get_secret(API_KEY_VAR)
            .await?
            .ok_or(ConfigError::Missing { key: API_KEY_VAR })?;
        self.secrets.api_key = Some(Secret::new(api_key));

        if let Some(val) = vault.get_secret(EMBEDDING_API_KEY_VAR).await? {
            self.secrets.embedding_api_key = Some(Secret::new(val));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if secrets were not resolved.
    pub fn api_key(&self) -> Result<&Secret, ConfigError> {
        self.secrets
            .api_key
            .as_ref()
            .ok_or(ConfigError::Missing { key: API_KEY_VAR })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if neither key was resolved.
    pub fn embedding_api_key(&self) -> Result<&Secret, ConfigError> {
        match self.secrets.embedding_api_key.as_ref() {
            Some(key) => Ok(key),
            None => self.api_key(),
        }
    }

    /// Chunker geometry from `[chunking]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the values violate `0 <= overlap < chunk_size`.
    pub fn chunker_config(&self) -> Result<ChunkerConfig, ConfigError> {
        Ok(ChunkerConfig::new(
            self.chunking.chunk_size,
            self.chunking.overlap,
        )?)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunker_config()?;
        if self.assistant.top_k == 0 {
            return Err(ConfigError::Invalid(
                "assistant.top_k must be at least 1".into(),
            ));
        }
        if !TIMEOUT_RANGE.contains(&self.assistant.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "assistant.timeout_secs must be between {} and {}, got {}",
                TIMEOUT_RANGE.start(),
                TIMEOUT_RANGE.end(),
                self.assistant.timeout_secs
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be at least 1".into(),
            ));
        }
        if self.llm.base_url.trim().is_empty() || self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.base_url and llm.model must not be empty".into(),
            ));
        }
        if self.scope.mode == ScopeMode::Keywords
            && self.scope.preset.is_none()
            && self.scope.keywords.is_empty()
        {
            return Err(ConfigError::Invalid(
                "scope.mode = \"keywords\" needs a preset or a keyword list".into(),
            ));
        }
        if self.gateway.max_body_size == 0 {
            return Err(ConfigError::Invalid(
                "gateway.max_body_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
