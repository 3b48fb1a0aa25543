//! Privacy-module catalog with keyset paging over the SQLite store.

use std::cmp::Ordering;
use std::sync::Arc;

use datascope_core::*;
use serde_json::Value;
use tracing::debug;

use crate::sqlite::SqliteStore;

/// Lists modules carrying sensitive fields, sorted and paged per filter.
pub struct PrivacyCatalog {
    store: Arc<SqliteStore>,
    default_sort: Sorting,
}

impl PrivacyCatalog {
    /// `default_sort` applies to requests that name no sort.
    pub fn new(store: Arc<SqliteStore>, default_sort: &str) -> Result<Self> {
        let default_sort = Sorting::new(Some(default_sort), PrivacyModule::SORTABLE_FIELDS)
            .map_err(|e| Error::Config(format!("default sort: {}", e)))?;
        Ok(Self {
            store,
            default_sort,
        })
    }
}

/// The requested sort (or the default) with the tiebreaker appended.
fn applied_sorting(requested: &Sorting, default_sort: &Sorting) -> Sorting {
    let mut sorting = if requested.is_empty() {
        default_sort.clone()
    } else {
        requested.clone()
    };
    if !sorting.contains(PrivacyModule::TIEBREAKER) {
        sorting.sort.push(SortExpr {
            column: PrivacyModule::TIEBREAKER.to_string(),
            descending: false,
        });
    }
    sorting
}

/// Total order over JSON scalars: nulls, then numbers, then strings.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_u64(), y.as_u64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .partial_cmp(&y.as_f64().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_key(module: &PrivacyModule, sorting: &Sorting) -> Vec<Value> {
    sorting
        .sort
        .iter()
        .map(|s| module.sort_value(&s.column).unwrap_or(Value::Null))
        .collect()
}

fn compare_keys(a: &[Value], b: &[Value], sorting: &Sorting) -> Ordering {
    for ((x, y), expr) in a.iter().zip(b).zip(&sorting.sort) {
        let ord = compare_values(x, y);
        let ord = if expr.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl PrivacyModuleCatalog for PrivacyCatalog {
    fn find_privacy_modules(
        &self,
        mut filter: PrivacyModuleFilter,
    ) -> Result<(Option<Vec<PrivacyModule>>, PrivacyModuleFilter)> {
        let sorting = applied_sorting(&filter.sorting, &self.default_sort);

        let modules = self
            .store
            .list_privacy_modules(&filter.connection_id)
            .map_err(|e| match e {
                Error::Database(msg) => Error::UpstreamQuery(msg),
                other => other,
            })?;

        let mut keyed: Vec<(Vec<Value>, PrivacyModule)> = modules
            .into_iter()
            .map(|m| (sort_key(&m, &sorting), m))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &sorting));

        if let Some(cursor) = &filter.paging.page_cursor {
            if cursor.keys() != sorting.cursor_keys().as_slice() {
                return Err(Error::InvalidPagingParameter(format!(
                    "page cursor was issued for sort [{}], not [{}]",
                    cursor.keys().join(", "),
                    sorting
                )));
            }
            keyed.retain(|(key, _)| compare_keys(key, cursor.values(), &sorting) == Ordering::Greater);
        }

        let limit = filter.paging.limit as usize;
        filter.paging.next_page = None;
        if limit > 0 && keyed.len() > limit {
            keyed.truncate(limit);
            if let Some((last_key, _)) = keyed.last() {
                filter.paging.next_page = Some(PagingCursor::new(sorting.cursor_keys(), last_key.clone())?);
            }
        }

        debug!(
            "Privacy catalog: {} modules on page (sort={}, limit={})",
            keyed.len(),
            sorting,
            limit
        );

        filter.sorting = sorting;
        let set: Vec<PrivacyModule> = keyed.into_iter().map(|(_, m)| m).collect();
        let set = if set.is_empty() { None } else { Some(set) };
        Ok((set, filter))
    }
}
