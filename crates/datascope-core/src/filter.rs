//! Paging and sorting parameters for listing queries.
//!
//! Both are built from raw caller input and validated up front, so a bad
//! limit, cursor or sort expression is rejected before any store is queried.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------
// Paging
// ---------------------------------------------------------------

/// Opaque keyset position: the sort-column values of the last item seen.
///
/// Keys are the sort items including direction (`name DESC`), so a cursor
/// only matches the sort it was issued for. Travels as hex-encoded JSON
/// `{"k": [..], "v": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingCursor {
    #[serde(rename = "k")]
    keys: Vec<String>,
    #[serde(rename = "v")]
    values: Vec<serde_json::Value>,
}

impl PagingCursor {
    pub fn new(keys: Vec<String>, values: Vec<serde_json::Value>) -> Result<Self> {
        if keys.is_empty() || keys.len() != values.len() {
            return Err(Error::InvalidPagingParameter(format!(
                "cursor needs matching keys and values (got {} keys, {} values)",
                keys.len(),
                values.len()
            )));
        }
        Ok(Self { keys, values })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[serde_json::Value] {
        &self.values
    }

    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(hex::encode(json))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let bytes = hex::decode(token.trim())
            .map_err(|_| Error::InvalidPagingParameter("malformed page cursor".into()))?;
        let cursor: PagingCursor = serde_json::from_slice(&bytes)
            .map_err(|_| Error::InvalidPagingParameter("malformed page cursor".into()))?;
        Self::new(cursor.keys, cursor.values)
    }
}

fn serialize_cursor<S: Serializer>(
    cursor: &Option<PagingCursor>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match cursor {
        Some(c) => {
            let token = c.encode().map_err(<S::Error as serde::ser::Error>::custom)?;
            serializer.serialize_str(&token)
        }
        None => serializer.serialize_none(),
    }
}

/// Page size and position. A limit of 0 means "no limit".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paging {
    pub limit: u32,
    #[serde(
        rename = "pageCursor",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_cursor"
    )]
    pub page_cursor: Option<PagingCursor>,
    /// Set by the query when more items follow the returned page.
    #[serde(
        rename = "nextPage",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_cursor"
    )]
    pub next_page: Option<PagingCursor>,
}

impl Paging {
    /// Build paging from the raw `limit` and `pageCursor` request values.
    pub fn new(limit: Option<&str>, page_cursor: Option<&str>, max_limit: u32) -> Result<Self> {
        let limit = match limit.map(str::trim).filter(|l| !l.is_empty()) {
            None => 0,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                Error::InvalidPagingParameter(format!("limit must be a non-negative integer: {}", raw))
            })?,
        };
        if max_limit > 0 && limit > max_limit {
            return Err(Error::InvalidPagingParameter(format!(
                "limit {} exceeds maximum of {}",
                limit, max_limit
            )));
        }

        let page_cursor = match page_cursor.map(str::trim).filter(|c| !c.is_empty()) {
            None => None,
            Some(token) => Some(PagingCursor::decode(token)?),
        };

        Ok(Self {
            limit,
            page_cursor,
            next_page: None,
        })
    }
}

// ---------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------

static SORT_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)(?:\s+([A-Za-z]+))?\s*$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpr {
    pub column: String,
    pub descending: bool,
}

impl fmt::Display for SortExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{} DESC", self.column)
        } else {
            f.write_str(&self.column)
        }
    }
}

/// Ordered sort columns, e.g. `name DESC, moduleID`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sorting {
    pub sort: Vec<SortExpr>,
}

impl Sorting {
    /// Parse a sort expression, accepting only the `allowed` columns.
    pub fn new(spec: Option<&str>, allowed: &[&str]) -> Result<Self> {
        let spec = match spec.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s,
            None => return Ok(Self::default()),
        };

        let mut sort: Vec<SortExpr> = Vec::new();
        for item in spec.split(',') {
            let caps = SORT_ITEM_RE
                .captures(item)
                .ok_or_else(|| Error::InvalidSortSpec(format!("malformed sort item: {:?}", item)))?;
            let column = &caps[1];
            if !allowed.contains(&column) {
                return Err(Error::InvalidSortSpec(format!("unsupported sort field: {}", column)));
            }
            let descending = match caps.get(2).map(|d| d.as_str().to_ascii_uppercase()) {
                None => false,
                Some(d) if d == "ASC" => false,
                Some(d) if d == "DESC" => true,
                Some(d) => {
                    return Err(Error::InvalidSortSpec(format!("unknown sort direction: {}", d)))
                }
            };
            if sort.iter().any(|s| s.column == column) {
                return Err(Error::InvalidSortSpec(format!("duplicate sort field: {}", column)));
            }
            sort.push(SortExpr {
                column: column.to_string(),
                descending,
            });
        }

        Ok(Self { sort })
    }

    pub fn is_empty(&self) -> bool {
        self.sort.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.sort.iter().any(|s| s.column == column)
    }

    /// One key per sort item, direction included: `["name DESC", "moduleID"]`.
    pub fn cursor_keys(&self) -> Vec<String> {
        self.sort.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.sort.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", expr)?;
        }
        Ok(())
    }
}

impl Serialize for Sorting {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Sorting", 1)?;
        state.serialize_field("sort", &self.to_string())?;
        state.end()
    }
}
