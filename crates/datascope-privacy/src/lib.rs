//! Data privacy pipelines — sensitive-data discovery and privacy-module listing.
//!
//! Sensitive-data discovery walks every namespace and module, scans each
//! in-scope module through a [`SensitiveDataFinder`](datascope_core::SensitiveDataFinder)
//! and returns only the nodes that actually carry sensitive values. The
//! privacy-module listing validates paging and sorting input and delegates to
//! the catalog. All collaborators are injected; nothing here writes data.

pub mod modules;
pub mod normalize;
pub mod scope;
pub mod sensitive;
pub mod service;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

pub use modules::{ModuleListRequest, PrivacyModuleFilterBuilder, PrivacyModuleQuery, PrivacyModuleSetPayload};
pub use scope::ConnectionScope;
pub use sensitive::{SensitiveData, SensitiveDataAggregator, SensitiveDataPayload, SensitiveDataSetPayload};
pub use service::DataPrivacy;
pub use walker::NamespaceModuleWalker;
