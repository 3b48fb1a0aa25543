//! DataScope Core — domain types, collaborator capabilities, filters, configuration.

pub mod config;
pub mod error;
pub mod filter;
pub mod finders;
pub mod payload;
pub mod types;

pub use config::{DataPaths, DataScopeConfig};
pub use error::{Error, Result};
pub use filter::{Paging, PagingCursor, SortExpr, Sorting};
pub use finders::{ModuleFinder, NamespaceFinder, PrivacyModuleCatalog, SensitiveDataFinder};
pub use types::*;
