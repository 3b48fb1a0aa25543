//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};

use datascope_core::*;
use parking_lot::Mutex;

/// Namespaces, modules and canned sensitive findings, recording every call.
#[derive(Default)]
pub struct FakeDirectory {
    pub namespaces: Vec<Namespace>,
    pub modules: Vec<Module>,
    pub findings: HashMap<u64, Vec<PrivateDataSet>>,
    pub failing_namespace_listing: bool,
    pub failing_module_listing: HashSet<u64>,
    pub failing_scans: HashSet<u64>,
    pub module_queries: Mutex<Vec<u64>>,
    pub scans: Mutex<Vec<RecordFilter>>,
}

impl FakeDirectory {
    pub fn namespace(mut self, id: u64, name: &str) -> Self {
        self.namespaces.push(Namespace {
            id,
            slug: name.to_lowercase(),
            name: name.to_string(),
        });
        self
    }

    pub fn module(mut self, id: u64, namespace_id: u64, name: &str, connection_id: u64) -> Self {
        self.modules.push(Module {
            id,
            namespace_id,
            handle: name.to_lowercase(),
            name: name.to_string(),
            model_config: ModelConfig { connection_id },
            fields: vec![],
        });
        self
    }

    pub fn finding(mut self, module_id: u64, sets: Vec<PrivateDataSet>) -> Self {
        self.findings.insert(module_id, sets);
        self
    }

    pub fn scanned_modules(&self) -> Vec<u64> {
        self.scans.lock().iter().map(|f| f.module_id).collect()
    }
}

impl NamespaceFinder for FakeDirectory {
    fn find_namespaces(&self, _filter: &NamespaceFilter) -> Result<Vec<Namespace>> {
        if self.failing_namespace_listing {
            return Err(Error::UpstreamQuery("namespace store unavailable".into()));
        }
        Ok(self.namespaces.clone())
    }
}

impl ModuleFinder for FakeDirectory {
    fn find_modules(&self, filter: &ModuleFilter) -> Result<Vec<Module>> {
        self.module_queries.lock().push(filter.namespace_id);
        if self.failing_module_listing.contains(&filter.namespace_id) {
            return Err(Error::UpstreamQuery(format!(
                "modules of namespace {} unavailable",
                filter.namespace_id
            )));
        }
        Ok(self
            .modules
            .iter()
            .filter(|m| m.namespace_id == filter.namespace_id)
            .cloned()
            .collect())
    }
}

impl SensitiveDataFinder for FakeDirectory {
    fn find_sensitive(&self, filter: &RecordFilter) -> Result<Vec<PrivateDataSet>> {
        self.scans.lock().push(*filter);
        if self.failing_scans.contains(&filter.module_id) {
            return Err(Error::SensitiveScan(format!("scan of module {} failed", filter.module_id)));
        }
        Ok(self.findings.get(&filter.module_id).cloned().unwrap_or_default())
    }
}

/// Build a record finding from `(field, value)` pairs, one value map per pair.
pub fn record(id: u64, values: &[(&str, &str)]) -> PrivateDataSet {
    PrivateDataSet {
        id,
        values: values
            .iter()
            .map(|(name, value)| {
                let mut map = ValueMap::new();
                map.insert("name".into(), (*name).into());
                map.insert("value".into(), (*value).into());
                map
            })
            .collect(),
    }
}

/// Catalog returning a fixed result and remembering the filters it received.
pub struct FakeCatalog {
    pub result: Mutex<Option<Result<Option<Vec<PrivacyModule>>>>>,
    pub calls: Mutex<Vec<PrivacyModuleFilter>>,
}

impl FakeCatalog {
    pub fn returning(result: Result<Option<Vec<PrivacyModule>>>) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl PrivacyModuleCatalog for FakeCatalog {
    fn find_privacy_modules(
        &self,
        mut filter: PrivacyModuleFilter,
    ) -> Result<(Option<Vec<PrivacyModule>>, PrivacyModuleFilter)> {
        self.calls.lock().push(filter.clone());
        let set = self.result.lock().take().unwrap_or(Ok(None))?;
        if filter.sorting.is_empty() {
            filter.sorting = Sorting::new(Some("moduleID"), PrivacyModule::SORTABLE_FIELDS)?;
        }
        Ok((set, filter))
    }
}

pub fn privacy_module(id: u64, name: &str, connection: Option<u64>) -> PrivacyModule {
    PrivacyModule {
        module: PrivacyModuleMeta {
            id,
            name: name.to_string(),
            handle: name.to_lowercase(),
            fields: vec![PrivacyField {
                name: "email".into(),
                kind: "Email".into(),
                sensitivity_level: 1,
            }],
        },
        namespace: PrivacyNamespaceMeta {
            id: 1,
            slug: "crm".into(),
            name: "CRM".into(),
        },
        connection: connection.map(|id| ConnectionMeta {
            id,
            handle: format!("conn_{}", id),
            name: format!("Connection {}", id),
        }),
    }
}
