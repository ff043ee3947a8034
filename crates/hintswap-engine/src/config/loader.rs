use super::schema::HintswapConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./hintswap.yaml
    /// 2. ~/.hintswap/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<HintswapConfig, ConfigError> {
        // Check current directory
        let local_config = PathBuf::from("./hintswap.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".hintswap").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(HintswapConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<HintswapConfig, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Explicit path when given, default locations otherwise.
    pub async fn load(path: Option<&Path>) -> Result<HintswapConfig, ConfigError> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => Self::load_default().await,
        }
    }

    pub fn parse(content: &str) -> Result<HintswapConfig, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        let config: HintswapConfig = if content.trim().is_empty() {
            HintswapConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }
}
