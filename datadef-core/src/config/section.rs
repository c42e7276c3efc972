use super::{ConfigError, DatadefConfig};

/// A strongly typed group of keys sharing a common prefix.
pub trait ConfigSection: Sized {
    /// Key prefix, e.g. `"datadef.datasource"`.
    const PREFIX: &'static str;

    fn from_config(config: &DatadefConfig) -> Result<Self, ConfigError>;

    /// Absolute key for a property of this section.
    fn key(property: &str) -> String {
        format!("{}.{property}", Self::PREFIX)
    }
}

/// Connection settings for the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceConfig {
    /// Connection URL, e.g. `sqlite://data.db` or `sqlite::memory:`.
    pub url: String,
    pub max_connections: u32,
    /// Create the database file when it does not exist yet.
    pub create_if_missing: bool,
}

impl DataSourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

impl ConfigSection for DataSourceConfig {
    const PREFIX: &'static str = "datadef.datasource";

    fn from_config(config: &DatadefConfig) -> Result<Self, ConfigError> {
        let defaults = DataSourceConfig::new(String::new());
        Ok(Self {
            url: config.get(&Self::key("url"))?,
            max_connections: config.get_or(&Self::key("max_connections"), defaults.max_connections)?,
            create_if_missing: config
                .get_or(&Self::key("create_if_missing"), defaults.create_if_missing)?,
        })
    }
}

/// Limits applied by the data access service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    /// Largest `max_results` a search may ask for.
    pub max_page_size: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
        }
    }
}

impl ConfigSection for AccessConfig {
    const PREFIX: &'static str = "datadef.access";

    fn from_config(config: &DatadefConfig) -> Result<Self, ConfigError> {
        let max_page_size = config.get_or(&Self::key("max_page_size"), Self::default().max_page_size)?;
        if max_page_size == 0 {
            return Err(ConfigError::TypeMismatch {
                key: Self::key("max_page_size"),
                expected: "positive integer",
            });
        }
        Ok(Self { max_page_size })
    }
}
