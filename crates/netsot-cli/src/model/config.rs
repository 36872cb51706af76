//! Configuration management for the netsot command line
//!
//! Sources, lowest precedence first: `conf/application.yml` (or `--config`),
//! environment variables such as `NETSOT__LOGS__LEVEL`, then command line
//! overrides.

use std::path::Path;

use config::{Config, Environment, File};

use netsot_common::{ContentType, Feature, FeatureRegistry, NetsotError};

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";

pub const SNAPSHOT_PATH_PROPERTY: &str = "netsot.snapshot.path";
pub const LOGS_PATH_PROPERTY: &str = "netsot.logs.path";
pub const LOGS_LEVEL_PROPERTY: &str = "netsot.logs.level";
pub const LOGS_FILE_PROPERTY: &str = "netsot.logs.file";
pub const FEATURES_PROPERTY_PREFIX: &str = "netsot.features";

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Build the layered configuration
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>, overrides: &[(&str, String)]) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut config_builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("NETSOT")
                .prefix_separator("__")
                .separator("__")
                .keep_prefix(true)
                .try_parsing(true),
        );

        for (key, value) in overrides {
            config_builder = config_builder
                .set_override(*key, value.as_str())
                .map_err(|e| {
                    NetsotError::ConfigError(format!("invalid override {}: {}", key, e))
                })?;
        }

        let config = config_builder
            .build()
            .map_err(|e| NetsotError::ConfigError(e.to_string()))?;

        Ok(Configuration { config })
    }

    // ========================================================================
    // Snapshot Configuration
    // ========================================================================

    pub fn snapshot_path(&self) -> Option<String> {
        self.config.get_string(SNAPSHOT_PATH_PROPERTY).ok()
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logs_path(&self) -> Option<String> {
        self.config.get_string(LOGS_PATH_PROPERTY).ok()
    }

    pub fn logs_level(&self) -> Option<String> {
        self.config.get_string(LOGS_LEVEL_PROPERTY).ok()
    }

    pub fn logs_file(&self) -> Option<bool> {
        self.config.get_bool(LOGS_FILE_PROPERTY).ok()
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(self.logs_path(), self.logs_file(), self.logs_level())
    }

    // ========================================================================
    // Feature Configuration
    // ========================================================================

    /// Content types configured for one feature, if the key is present
    ///
    /// Accepts a YAML list or a comma-separated string.
    fn feature_content_types(
        &self,
        feature: Feature,
    ) -> anyhow::Result<Option<Vec<ContentType>>> {
        let key = format!("{}.{}", FEATURES_PROPERTY_PREFIX, feature.as_str());

        let names: Vec<String> = match self.config.get_array(&key) {
            Ok(values) => values
                .into_iter()
                .map(|v| v.into_string())
                .collect::<Result<_, _>>()
                .map_err(|e| NetsotError::ConfigError(format!("{}: {}", key, e)))?,
            Err(_) => match self.config.get_string(&key) {
                Ok(value) => value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                Err(_) => return Ok(None),
            },
        };

        let content_types = names
            .iter()
            .map(|name| {
                name.parse::<ContentType>()
                    .map_err(|e| NetsotError::ConfigError(format!("{}: {}", key, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(content_types))
    }

    /// Default registry with any configured features replaced wholesale
    pub fn feature_registry(&self) -> anyhow::Result<FeatureRegistry> {
        let mut registry = FeatureRegistry::default();
        for feature in Feature::ALL {
            if let Some(content_types) = self.feature_content_types(feature)? {
                registry.set(feature, content_types);
            }
        }
        Ok(registry)
    }
}
