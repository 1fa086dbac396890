// Widget configuration, loaded from TOML
//
// [backend]
// base_url = "http://localhost:5000"
// timeout_ms = 10000
//
// [pricing]
// default_price_per_night = 150.0
//
// [locale]
// default = "it"

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::Locale;
use crate::quote::{NightlyRate, DEFAULT_PRICE_PER_NIGHT, MAX_PRICE_PER_NIGHT};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub backend: BackendConfig,
    pub pricing: PricingConfig,
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    pub default_price_per_night: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_price_per_night: DEFAULT_PRICE_PER_NIGHT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub default: Locale,
}

impl WidgetConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: WidgetConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading widget config");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.base_url is empty".to_string()));
        }
        if self.backend.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if NightlyRate::new(self.pricing.default_price_per_night).is_none() {
            return Err(ConfigError::Invalid(format!(
                "pricing.default_price_per_night must be in (0, {}], got {}",
                MAX_PRICE_PER_NIGHT, self.pricing.default_price_per_night
            )));
        }
        Ok(())
    }

    /// The fallback rate. Invalid values were rejected by `validate`.
    pub fn default_rate(&self) -> NightlyRate {
        NightlyRate::new(self.pricing.default_price_per_night).unwrap_or_default()
    }
}
