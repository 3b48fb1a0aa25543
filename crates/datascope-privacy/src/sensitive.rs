//! Sensitive-data discovery across all namespaces and modules.

use std::sync::Arc;

use datascope_core::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::scope::ConnectionScope;
use crate::walker::NamespaceModuleWalker;

/// Sensitive values of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitiveData {
    #[serde(rename = "recordID", with = "id_string")]
    pub record_id: u64,
    pub values: Vec<ValueMap>,
}

/// One module with its records that carry sensitive values. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitiveDataPayload {
    #[serde(rename = "namespaceID", with = "id_string")]
    pub namespace_id: u64,
    pub namespace: String,
    #[serde(rename = "moduleID", with = "id_string")]
    pub module_id: u64,
    pub module: String,
    pub records: Vec<SensitiveData>,
}

impl SensitiveDataPayload {
    /// Build the node for a module, dropping records without values.
    ///
    /// Returns `None` when nothing is left to report.
    pub fn from_findings(
        namespace: &Namespace,
        module: &Module,
        findings: Vec<PrivateDataSet>,
    ) -> Option<Self> {
        if findings.is_empty() {
            return None;
        }

        let records: Vec<SensitiveData> = findings
            .into_iter()
            .filter(|f| !f.values.is_empty())
            .map(|f| SensitiveData {
                record_id: f.id,
                values: f.values,
            })
            .collect();

        if records.is_empty() {
            return None;
        }

        Some(Self {
            namespace_id: namespace.id,
            namespace: namespace.name.clone(),
            module_id: module.id,
            module: module.name.clone(),
            records,
        })
    }
}

/// Response of the sensitive-data listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensitiveDataSetPayload {
    pub set: Vec<SensitiveDataPayload>,
}

/// Scans every in-scope module and assembles the non-empty findings.
pub struct SensitiveDataAggregator {
    walker: NamespaceModuleWalker,
    finder: Arc<dyn SensitiveDataFinder>,
}

impl SensitiveDataAggregator {
    pub fn new(
        namespaces: Arc<dyn NamespaceFinder>,
        modules: Arc<dyn ModuleFinder>,
        finder: Arc<dyn SensitiveDataFinder>,
    ) -> Self {
        Self {
            walker: NamespaceModuleWalker::new(namespaces, modules),
            finder,
        }
    }

    /// Collect sensitive data for the requested connection IDs (all when empty).
    ///
    /// Output follows walk order. The first error from any store or scan
    /// aborts the run; no partial set is returned.
    pub fn aggregate<S: AsRef<str>>(&self, connection_ids: &[S]) -> Result<SensitiveDataSetPayload> {
        let scope = ConnectionScope::build(connection_ids);

        let set = self
            .walker
            .walk(&scope)?
            .try_fold(Vec::new(), |mut out, pair| -> Result<_> {
                let (namespace, module) = pair?;
                let findings = self.finder.find_sensitive(&RecordFilter {
                    module_id: module.id,
                    namespace_id: module.namespace_id,
                })?;
                debug!(
                    "Module {}/{}: {} records with findings",
                    namespace.slug,
                    module.handle,
                    findings.len()
                );
                if let Some(node) = SensitiveDataPayload::from_findings(&namespace, &module, findings) {
                    out.push(node);
                }
                Ok(out)
            })?;

        info!(
            "Sensitive data scan complete: {} modules with findings (scoped={})",
            set.len(),
            scope.is_scoped()
        );
        Ok(SensitiveDataSetPayload { set })
    }
}
