mod loader;
pub mod section;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

pub use section::{AccessConfig, ConfigSection, DataSourceConfig};
pub use value::{ConfigValue, FromConfigValue};

/// Environment variable selecting the active profile.
pub const PROFILE_ENV: &str = "DATADEF_PROFILE";

/// Only environment variables with this prefix are overlaid on the config.
const ENV_PREFIX: &str = "DATADEF_";

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config key not found: {0}")]
    NotFound(String),

    #[error("config type mismatch for '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("config load error: {0}")]
    Load(String),
}

/// Layered configuration for the data layer.
///
/// Resolution order (lowest to highest priority):
/// 1. `datadef.yaml`
/// 2. `datadef-{profile}.yaml`
/// 3. `.env` then `.env.{profile}` (never overwrite variables already set)
/// 4. `DATADEF_*` environment variables
///
/// Environment keys map to config keys by lowercasing and turning `_` into
/// `.`; a doubled `__` stands for a literal underscore, so
/// `DATADEF_DATASOURCE_MAX__CONNECTIONS` sets `datadef.datasource.max_connections`.
#[derive(Debug, Clone)]
pub struct DatadefConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl DatadefConfig {
    /// Load configuration from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile)
    }

    /// Load configuration files from `dir`.
    ///
    /// The profile is taken from `DATADEF_PROFILE` when set, otherwise from
    /// the argument.
    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("datadef.yaml"), &mut values)?;
        loader::load_yaml_file(&dir.join(format!("datadef-{active_profile}.yaml")), &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        overlay_env(&mut values, std::env::vars());

        tracing::debug!(profile = %active_profile, keys = values.len(), "loaded datadef configuration");
        Ok(Self {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(Self {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Typed lookup of a dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Typed lookup falling back to `default` when the key is absent.
    ///
    /// A present value of the wrong type is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Build a typed section from this config.
    pub fn section<S: ConfigSection>(&self) -> Result<S, ConfigError> {
        S::from_config(self)
    }
}

fn overlay_env(values: &mut HashMap<String, ConfigValue>, vars: impl Iterator<Item = (String, String)>) {
    for (env_key, env_val) in vars {
        if !env_key.starts_with(ENV_PREFIX) || env_key == PROFILE_ENV {
            continue;
        }
        values.insert(env_key_to_config_key(&env_key), ConfigValue::String(env_val));
    }
}

fn env_key_to_config_key(env_key: &str) -> String {
    env_key
        .to_lowercase()
        .split("__")
        .map(|part| part.replace('_', "."))
        .collect::<Vec<_>>()
        .join("_")
}
