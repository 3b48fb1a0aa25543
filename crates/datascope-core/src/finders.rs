//! Capabilities the privacy pipelines consume from their collaborators.
//!
//! Implementations own the data and the query execution; the pipelines only
//! read and reshape what they return.

use crate::error::Result;
use crate::types::{
    Module, ModuleFilter, Namespace, NamespaceFilter, PrivacyModule, PrivacyModuleFilter,
    PrivateDataSet, RecordFilter,
};

/// Namespace listing.
pub trait NamespaceFinder: Send + Sync {
    fn find_namespaces(&self, filter: &NamespaceFilter) -> Result<Vec<Namespace>>;
}

/// Module listing for one namespace.
pub trait ModuleFinder: Send + Sync {
    fn find_modules(&self, filter: &ModuleFilter) -> Result<Vec<Module>>;
}

/// Sensitive-value scan over the records of one module.
pub trait SensitiveDataFinder: Send + Sync {
    fn find_sensitive(&self, filter: &RecordFilter) -> Result<Vec<PrivateDataSet>>;
}

/// Privacy-module catalog query.
///
/// Returns the page of modules (which may be absent when nothing matched)
/// together with the filter as actually applied.
pub trait PrivacyModuleCatalog: Send + Sync {
    fn find_privacy_modules(
        &self,
        filter: PrivacyModuleFilter,
    ) -> Result<(Option<Vec<PrivacyModule>>, PrivacyModuleFilter)>;
}
