use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::validation::ConfigValidator;

/// Separator between nested keys in environment variable names
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// A single configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// TOML file; a missing file contributes nothing
    Toml(PathBuf),
    /// YAML file; a missing file contributes nothing
    Yaml(PathBuf),
    /// Environment variables starting with the prefix
    Env { prefix: String },
}

impl ConfigSource {
    pub fn toml(path: impl Into<PathBuf>) -> Self {
        ConfigSource::Toml(path.into())
    }

    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        ConfigSource::Yaml(path.into())
    }

    pub fn env(prefix: &str) -> Self {
        ConfigSource::Env {
            prefix: prefix.to_string(),
        }
    }
}

/// Ordered list of sources; later sources override earlier ones
#[derive(Debug, Clone, Default)]
pub struct ConfigEngine {
    sources: Vec<ConfigSource>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    fn figment<T: Serialize + Default>(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(T::default()));
        for source in &self.sources {
            debug!(?source, "Merging configuration source");
            figment = match source {
                ConfigSource::Toml(path) => figment.merge(Toml::file(path)),
                ConfigSource::Yaml(path) => figment.merge(Yaml::file(path)),
                ConfigSource::Env { prefix } => {
                    figment.merge(Env::prefixed(prefix).split(ENV_NESTING_SEPARATOR))
                }
            };
        }
        figment
    }

    /// Merge every source over `T::default()` and deserialize the result
    pub fn extract<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        self.figment::<T>()
            .extract()
            .map_err(|e| ConfigError::ExtractionFailed(e.to_string()))
    }

    /// Like [`ConfigEngine::extract`], then run the type's validation
    pub fn extract_validated<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default + ConfigValidator,
    {
        let config: T = self.extract()?;
        config.validate()?;
        Ok(config)
    }
}
