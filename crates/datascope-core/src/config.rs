//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default upper bound on a requested page size.
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 1000;

/// Default sort applied to privacy-module listings.
pub const DEFAULT_MODULE_SORT: &str = "moduleID";

/// Paths to all DataScope data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Database directory (`data/db/`).
    pub db: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            root,
        };
        std::fs::create_dir_all(&paths.db)?;
        Ok(paths)
    }
}

/// Top-level DataScope configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataScopeConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Sort expression the catalog applies when a request names none.
    pub default_sort: String,
    /// Largest page size a caller may request.
    pub max_page_limit: u32,
}

impl DataScopeConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", p)))?,
            Err(_) => 3010,
        };

        let max_page_limit = match std::env::var("DATASCOPE_MAX_PAGE_LIMIT") {
            Ok(v) => v.parse().map_err(|_| {
                Error::Config(format!("DATASCOPE_MAX_PAGE_LIMIT is not a number: {}", v))
            })?,
            Err(_) => DEFAULT_MAX_PAGE_LIMIT,
        };

        let default_sort = std::env::var("DATASCOPE_DEFAULT_SORT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODULE_SORT.to_string());

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            default_sort,
            max_page_limit,
        })
    }

    /// Configuration rooted at `data_dir` with every other setting at its default.
    pub fn with_defaults(data_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            port: 3010,
            data_paths: DataPaths::new(data_dir)?,
            default_sort: DEFAULT_MODULE_SORT.to_string(),
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_creates_db_dir() {
        let dir = std::env::temp_dir().join(format!("datascope-paths-{}", std::process::id()));
        let paths = DataPaths::new(&dir).unwrap();
        assert!(paths.db.is_dir());
        assert_eq!(paths.db, dir.join("db"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_defaults() {
        let dir = std::env::temp_dir().join(format!("datascope-cfg-{}", std::process::id()));
        let config = DataScopeConfig::with_defaults(&dir).unwrap();
        assert_eq!(config.default_sort, "moduleID");
        assert_eq!(config.max_page_limit, 1000);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
