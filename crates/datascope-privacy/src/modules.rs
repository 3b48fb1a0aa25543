//! Privacy-module listing: filter construction and catalog query.

use std::sync::Arc;

use datascope_core::payload::parse_u64s;
use datascope_core::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::normalize::normalize_set;

/// Raw privacy-module listing input as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct ModuleListRequest {
    pub connection_id: Vec<String>,
    pub limit: Option<String>,
    pub page_cursor: Option<String>,
    pub sort: Option<String>,
}

/// Validates listing input and turns it into a [`PrivacyModuleFilter`].
#[derive(Debug, Clone)]
pub struct PrivacyModuleFilterBuilder {
    max_page_limit: u32,
}

impl PrivacyModuleFilterBuilder {
    pub fn new(max_page_limit: u32) -> Self {
        Self { max_page_limit }
    }

    /// Connection IDs are parsed leniently (bad tokens dropped); paging and
    /// sorting problems are reported as errors.
    pub fn build<S: AsRef<str>>(
        &self,
        connection_ids: &[S],
        limit: Option<&str>,
        page_cursor: Option<&str>,
        sort: Option<&str>,
    ) -> Result<PrivacyModuleFilter> {
        let paging = Paging::new(limit, page_cursor, self.max_page_limit)?;
        let sorting = Sorting::new(sort, PrivacyModule::SORTABLE_FIELDS)?;

        Ok(PrivacyModuleFilter {
            connection_id: parse_u64s(connection_ids),
            paging,
            sorting,
        })
    }

    pub fn from_request(&self, req: &ModuleListRequest) -> Result<PrivacyModuleFilter> {
        self.build(
            req.connection_id.as_slice(),
            req.limit.as_deref(),
            req.page_cursor.as_deref(),
            req.sort.as_deref(),
        )
    }
}

/// Response of the privacy-module listing.
#[derive(Debug, Clone, Serialize)]
pub struct PrivacyModuleSetPayload {
    pub filter: PrivacyModuleFilter,
    pub set: Vec<PrivacyModule>,
}

/// Runs a filter against the privacy-module catalog.
pub struct PrivacyModuleQuery {
    catalog: Arc<dyn PrivacyModuleCatalog>,
}

impl PrivacyModuleQuery {
    pub fn new(catalog: Arc<dyn PrivacyModuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn query(&self, filter: PrivacyModuleFilter) -> Result<PrivacyModuleSetPayload> {
        let (set, applied) = self.catalog.find_privacy_modules(filter)?;
        let set = normalize_set(set);
        info!(
            "Privacy modules listed: {} (sort={}, more={})",
            set.len(),
            applied.sorting,
            applied.paging.next_page.is_some()
        );
        Ok(PrivacyModuleSetPayload {
            filter: applied,
            set,
        })
    }
}

/// Validate the request and, if valid, query the catalog.
pub fn list_modules(
    builder: &PrivacyModuleFilterBuilder,
    query: &PrivacyModuleQuery,
    req: &ModuleListRequest,
) -> Result<PrivacyModuleSetPayload> {
    let filter = builder.from_request(req).map_err(|e| {
        warn!("Rejected privacy module listing: {}", e);
        e
    })?;
    query.query(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{privacy_module, FakeCatalog};

    fn builder() -> PrivacyModuleFilterBuilder {
        PrivacyModuleFilterBuilder::new(100)
    }

    #[test]
    fn test_build_filter() {
        let cursor = PagingCursor::new(vec!["moduleID".into()], vec![5.into()]).unwrap();
        let token = cursor.encode().unwrap();
        let f = builder()
            .build(&["1", "junk", "3"], Some("25"), Some(token.as_str()), Some("name DESC"))
            .unwrap();
        assert_eq!(f.connection_id, vec![1, 3]);
        assert_eq!(f.paging.limit, 25);
        assert_eq!(f.paging.page_cursor, Some(cursor));
        assert_eq!(f.sorting.to_string(), "name DESC");
    }

    #[test]
    fn test_invalid_sort_skips_catalog() {
        let catalog = Arc::new(FakeCatalog::returning(Ok(Some(vec![]))));
        let query = PrivacyModuleQuery::new(catalog.clone());
        let req = ModuleListRequest {
            sort: Some("createdAt DESC".into()),
            ..Default::default()
        };
        let err = list_modules(&builder(), &query, &req).unwrap_err();
        assert!(matches!(err, Error::InvalidSortSpec(_)));
        assert!(catalog.calls.lock().is_empty());
    }

    #[test]
    fn test_invalid_cursor_skips_catalog() {
        let catalog = Arc::new(FakeCatalog::returning(Ok(Some(vec![]))));
        let query = PrivacyModuleQuery::new(catalog.clone());
        let req = ModuleListRequest {
            page_cursor: Some("not-a-cursor".into()),
            ..Default::default()
        };
        let err = list_modules(&builder(), &query, &req).unwrap_err();
        assert!(matches!(err, Error::InvalidPagingParameter(_)));
        assert!(catalog.calls.lock().is_empty());
    }

    #[test]
    fn test_filter_forwarded_unmodified() {
        let catalog = Arc::new(FakeCatalog::returning(Ok(None)));
        let query = PrivacyModuleQuery::new(catalog.clone());
        let req = ModuleListRequest {
            connection_id: vec!["7".into()],
            limit: Some("2".into()),
            sort: Some("handle".into()),
            ..Default::default()
        };
        list_modules(&builder(), &query, &req).unwrap();

        let calls = catalog.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].connection_id, vec![7]);
        assert_eq!(calls[0].paging.limit, 2);
        assert_eq!(calls[0].sorting.to_string(), "handle");
    }

    #[test]
    fn test_absent_set_normalized() {
        let catalog = Arc::new(FakeCatalog::returning(Ok(None)));
        let payload = PrivacyModuleQuery::new(catalog)
            .query(PrivacyModuleFilter::default())
            .unwrap();
        assert!(payload.set.is_empty());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["set"], serde_json::json!([]));
    }

    #[test]
    fn test_applied_filter_is_echoed() {
        let catalog = Arc::new(FakeCatalog::returning(Ok(Some(vec![
            privacy_module(1, "Contacts", None),
            privacy_module(2, "Leads", Some(4)),
        ]))));
        let payload = PrivacyModuleQuery::new(catalog)
            .query(PrivacyModuleFilter::default())
            .unwrap();
        assert_eq!(payload.set.len(), 2);
        assert_eq!(payload.filter.sorting.to_string(), "moduleID");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["filter"]["sort"], "moduleID");
        assert_eq!(json["filter"]["connectionID"], serde_json::json!([]));
        assert_eq!(json["set"][1]["connection"]["connectionID"], "4");
        assert!(json["set"][0]["connection"].is_null());
    }

    #[test]
    fn test_catalog_error_propagates() {
        let catalog = Arc::new(FakeCatalog::returning(Err(Error::UpstreamQuery("catalog down".into()))));
        let err = PrivacyModuleQuery::new(catalog)
            .query(PrivacyModuleFilter::default())
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamQuery(ref m) if m == "catalog down"));
    }
}
