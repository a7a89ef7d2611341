use super::{genotype::GenotypeConfig, traits::ConfigSection};
use crate::error::GenomusError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub genotype: GenotypeConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), GenomusError> {
        self.genotype.validate()
    }

    /// Defaults, then the optional file at `path`, then `GENOMUS__*`
    /// environment variables (`GENOMUS__GENOTYPE__MAX_LIST_SIZE=4`).
    pub fn load_layered(path: Option<&str>) -> Result<Self, GenomusError> {
        let mut builder = ::config::Config::builder().add_source(
            ::config::Config::try_from(&AppConfig::default()).map_err(configuration_error)?,
        );

        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("GENOMUS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(configuration_error)?;
        config.validate()?;
        Ok(config)
    }
}

fn configuration_error(e: ::config::ConfigError) -> GenomusError {
    GenomusError::Configuration(format!("Failed to load config: {}", e))
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GenomusError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GenomusError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| GenomusError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.write()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GenomusError> {
        let toml_str = toml::to_string_pretty(&self.get())
            .map_err(|e| GenomusError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| GenomusError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, GenomusError> {
        self.config
            .write()
            .map_err(|_| GenomusError::Configuration("Config lock poisoned".to_string()))
    }
}
