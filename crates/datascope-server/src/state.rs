//! Shared application state.

use std::sync::Arc;

use datascope_core::{DataScopeConfig, Result};
use datascope_privacy::DataPrivacy;
use datascope_store::{PrivacyCatalog, SqliteStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DataScopeConfig,
    pub store: Arc<SqliteStore>,
    pub privacy: DataPrivacy,
}

impl AppState {
    /// Wire the privacy pipelines to the store.
    pub fn new(config: DataScopeConfig, store: Arc<SqliteStore>) -> Result<Self> {
        let catalog = PrivacyCatalog::new(store.clone(), &config.default_sort)?;
        let privacy = DataPrivacy::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(catalog),
            config.max_page_limit,
        );

        Ok(Self {
            config,
            store,
            privacy,
        })
    }
}
