use crate::core::{MapperError, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

/// Document store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,

    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,

    /// Schema qualifier applied to collection tables
    pub schema: Option<String>,

    /// Order by `_id` when a query has no sort keys
    pub default_sort_by_id: bool,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: Duration::from_secs(5),
            schema: None,
            default_sort_by_id: true,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::in_memory()
        }
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn default_sort_by_id(mut self, enabled: bool) -> Self {
        self.default_sort_by_id = enabled;
        self
    }

    /// Parse a store URL
    ///
    /// Format: `sqlite::memory:` or `sqlite://<path>`
    ///
    /// # Examples
    ///
    /// ```
    /// # use docmapper::storage::{StoreConfig, StoreLocation};
    /// let config = StoreConfig::from_url("sqlite://data/posts.db").unwrap();
    /// assert_eq!(config.location, StoreLocation::File("data/posts.db".into()));
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "sqlite::memory:" || url == "sqlite://:memory:" {
            return Ok(Self::in_memory());
        }

        match url.strip_prefix("sqlite://") {
            Some(path) if !path.is_empty() => Ok(Self::file(path)),
            Some(_) => Err(MapperError::InvalidArgument(format!(
                "Store URL '{}' has no database path",
                url
            ))),
            None => Err(MapperError::InvalidArgument(format!(
                "Store URL must start with 'sqlite://' or be 'sqlite::memory:', got '{}'",
                url
            ))),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(
            StoreConfig::from_url("sqlite::memory:").unwrap().location,
            StoreLocation::Memory
        );
        assert_eq!(
            StoreConfig::from_url("sqlite:///tmp/docs.db").unwrap().location,
            StoreLocation::File("/tmp/docs.db".into())
        );
        assert!(StoreConfig::from_url("sqlite://").is_err());
        assert!(StoreConfig::from_url("postgres://localhost/db").is_err());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::in_memory()
            .busy_timeout(Duration::from_millis(250))
            .schema("main")
            .default_sort_by_id(false);

        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.schema.as_deref(), Some("main"));
        assert!(!config.default_sort_by_id);
    }
}
