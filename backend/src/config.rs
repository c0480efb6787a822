use serde::{Deserialize, Serialize};
use shared::SkinType;
use std::path::Path;

use crate::classifier::brightness::BrightnessThresholds;
use crate::classifier::network::ChannelOrder;
use crate::classifier::quiz::QuizThresholds;

pub const DEFAULT_CONFIG_PATH: &str = "config/skinmatch.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid threshold configuration: {0}")]
    Thresholds(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub brightness: BrightnessThresholds,
    pub quiz: QuizThresholds,
    pub recommendations: RecommendationConfig,
    pub network: NetworkConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Label for each output unit, in class-index order.
    pub labels: Vec<SkinType>,
    /// Colour plane order the weights were trained on.
    pub channel_order: ChannelOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            limit: crate::recommender::DEFAULT_LIMIT,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            labels: vec![
                SkinType::Dry,
                SkinType::Normal,
                SkinType::Oily,
                SkinType::Combination,
            ],
            channel_order: ChannelOrder::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl AppConfig {
    /// Reads the YAML config at `SKINMATCH_CONFIG`, falling back to
    /// `config/skinmatch.yaml`. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("SKINMATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);
        if !path.exists() {
            log::warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path)?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.brightness.oily_below > self.brightness.dry_above {
            return Err(ConfigError::Thresholds(format!(
                "oily_below ({}) must not exceed dry_above ({})",
                self.brightness.oily_below, self.brightness.dry_above
            )));
        }
        if self.quiz.dry_max > self.quiz.normal_max {
            return Err(ConfigError::Thresholds(format!(
                "quiz dry_max ({}) must not exceed normal_max ({})",
                self.quiz.dry_max, self.quiz.normal_max
            )));
        }
        if self.network.labels.is_empty() {
            return Err(ConfigError::Thresholds(
                "network.labels must name at least one skin type".to_string(),
            ));
        }
        Ok(())
    }
}
