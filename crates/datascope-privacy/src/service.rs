//! Entry point for both data privacy listings, wired with explicit collaborators.

use std::sync::Arc;

use datascope_core::{
    ModuleFinder, NamespaceFinder, PrivacyModuleCatalog, Result, SensitiveDataFinder,
};

use crate::modules::{list_modules, ModuleListRequest, PrivacyModuleFilterBuilder, PrivacyModuleQuery};
use crate::sensitive::{SensitiveDataAggregator, SensitiveDataSetPayload};

pub struct DataPrivacy {
    aggregator: SensitiveDataAggregator,
    filter_builder: PrivacyModuleFilterBuilder,
    module_query: PrivacyModuleQuery,
}

impl DataPrivacy {
    pub fn new(
        namespaces: Arc<dyn NamespaceFinder>,
        modules: Arc<dyn ModuleFinder>,
        finder: Arc<dyn SensitiveDataFinder>,
        catalog: Arc<dyn PrivacyModuleCatalog>,
        max_page_limit: u32,
    ) -> Self {
        Self {
            aggregator: SensitiveDataAggregator::new(namespaces, modules, finder),
            filter_builder: PrivacyModuleFilterBuilder::new(max_page_limit),
            module_query: PrivacyModuleQuery::new(catalog),
        }
    }

    /// List sensitive data, optionally scoped to connection IDs.
    pub fn sensitive_data_list<S: AsRef<str>>(
        &self,
        connection_ids: &[S],
    ) -> Result<SensitiveDataSetPayload> {
        self.aggregator.aggregate(connection_ids)
    }

    /// List privacy-relevant modules with paging and sorting.
    pub fn module_list(&self, req: &ModuleListRequest) -> Result<crate::PrivacyModuleSetPayload> {
        list_modules(&self.filter_builder, &self.module_query, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{privacy_module, record, FakeCatalog, FakeDirectory};

    #[test]
    fn test_both_listings() {
        let dir = Arc::new(
            FakeDirectory::default()
                .namespace(1, "CRM")
                .module(10, 1, "Contacts", 0)
                .finding(10, vec![record(1, &[("email", "a@b.c")])]),
        );
        let catalog = Arc::new(FakeCatalog::returning(Ok(Some(vec![privacy_module(
            10, "Contacts", None,
        )]))));
        let svc = DataPrivacy::new(dir.clone(), dir.clone(), dir, catalog, 50);

        let all: [&str; 0] = [];
        let sensitive = svc.sensitive_data_list(&all).unwrap();
        assert_eq!(sensitive.set.len(), 1);

        let modules = svc.module_list(&ModuleListRequest::default()).unwrap();
        assert_eq!(modules.set.len(), 1);
        assert_eq!(modules.set[0].module.id, 10);
    }

    #[test]
    fn test_limit_above_max_rejected() {
        let dir = Arc::new(FakeDirectory::default());
        let catalog = Arc::new(FakeCatalog::returning(Ok(None)));
        let svc = DataPrivacy::new(dir.clone(), dir.clone(), dir, catalog.clone(), 50);
        let err = svc
            .module_list(&ModuleListRequest {
                limit: Some("51".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(catalog.calls.lock().is_empty());
    }
}
