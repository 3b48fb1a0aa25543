//! Domain types shared between the store, the privacy pipelines and the server.

use serde::{Deserialize, Serialize};

use crate::filter::{Paging, Sorting};

/// Field-name → value mapping for one sensitive value found in a record.
pub type ValueMap = serde_json::Map<String, serde_json::Value>;

/// Identifiers are 64-bit and travel as strings in JSON so that clients
/// without 64-bit integers keep full precision.
pub mod id_string {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an unsigned 64-bit identifier as string or number")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                v.parse().map_err(|_| E::custom(format!("invalid identifier: {}", v)))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Same as [`id_string`] for identifier lists.
pub mod id_string_vec {
    use serde::ser::{SerializeSeq, Serializer};

    pub fn serialize<S: Serializer>(ids: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(ids.len()))?;
        for id in ids {
            seq.serialize_element(&id.to_string())?;
        }
        seq.end()
    }
}

// ---------------------------------------------------------------
// Namespaces & modules
// ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "namespaceID", with = "id_string")]
    pub id: u64,
    pub slug: String,
    pub name: String,
}

/// Data model settings of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Connection backing the module's records; 0 is the primary connection.
    #[serde(rename = "connectionID", with = "id_string")]
    pub connection_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleField {
    pub name: String,
    pub kind: String,
    /// 0 = not sensitive; higher levels are privacy-relevant.
    #[serde(rename = "sensitivityLevel")]
    pub sensitivity_level: u8,
}

impl ModuleField {
    pub fn is_sensitive(&self) -> bool {
        self.sensitivity_level > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(rename = "moduleID", with = "id_string")]
    pub id: u64,
    #[serde(rename = "namespaceID", with = "id_string")]
    pub namespace_id: u64,
    pub handle: String,
    pub name: String,
    #[serde(rename = "modelConfig")]
    pub model_config: ModelConfig,
    #[serde(default)]
    pub fields: Vec<ModuleField>,
}

/// Namespace listing filter. The default lists every namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceFilter {
    /// Case-insensitive substring match on name or slug.
    pub query: Option<String>,
}

/// Module listing filter scoped to one namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleFilter {
    pub namespace_id: u64,
}

/// Record scope for a sensitive-value scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub module_id: u64,
    pub namespace_id: u64,
}

// ---------------------------------------------------------------
// Sensitive data findings
// ---------------------------------------------------------------

/// Sensitive values found in a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateDataSet {
    #[serde(rename = "recordID", with = "id_string")]
    pub id: u64,
    pub values: Vec<ValueMap>,
}

// ---------------------------------------------------------------
// Privacy module catalog
// ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyField {
    pub name: String,
    pub kind: String,
    #[serde(rename = "sensitivityLevel")]
    pub sensitivity_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyModuleMeta {
    #[serde(rename = "moduleID", with = "id_string")]
    pub id: u64,
    pub name: String,
    pub handle: String,
    pub fields: Vec<PrivacyField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyNamespaceMeta {
    #[serde(rename = "namespaceID", with = "id_string")]
    pub id: u64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMeta {
    #[serde(rename = "connectionID", with = "id_string")]
    pub id: u64,
    pub handle: String,
    pub name: String,
}

/// A module carrying at least one privacy-relevant field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyModule {
    pub module: PrivacyModuleMeta,
    pub namespace: PrivacyNamespaceMeta,
    /// Absent when the module lives on the primary connection.
    pub connection: Option<ConnectionMeta>,
}

impl PrivacyModule {
    /// Columns a privacy-module listing can be sorted by.
    pub const SORTABLE_FIELDS: &'static [&'static str] =
        &["moduleID", "name", "handle", "namespace", "connectionID"];

    /// Unique column appended to every sort so that paging is deterministic.
    pub const TIEBREAKER: &'static str = "moduleID";

    pub fn connection_id(&self) -> u64 {
        self.connection.as_ref().map(|c| c.id).unwrap_or(0)
    }

    /// Value of a sortable column, `None` for unknown columns.
    pub fn sort_value(&self, column: &str) -> Option<serde_json::Value> {
        let value = match column {
            "moduleID" => serde_json::Value::from(self.module.id),
            "name" => serde_json::Value::from(self.module.name.as_str()),
            "handle" => serde_json::Value::from(self.module.handle.as_str()),
            "namespace" => serde_json::Value::from(self.namespace.name.as_str()),
            "connectionID" => serde_json::Value::from(self.connection_id()),
            _ => return None,
        };
        Some(value)
    }
}

/// Filter for the privacy-module catalog query. The catalog echoes it back
/// with the paging and sorting it actually applied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrivacyModuleFilter {
    #[serde(rename = "connectionID", with = "id_string_vec")]
    pub connection_id: Vec<u64>,
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(flatten)]
    pub sorting: Sorting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_strings() {
        let set = PrivateDataSet {
            id: 18_446_744_073_709_551_000,
            values: vec![],
        };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["recordID"], "18446744073709551000");
    }

    #[test]
    fn test_ids_deserialize_from_string_or_number() {
        let a: ModelConfig = serde_json::from_str(r#"{"connectionID": "12"}"#).unwrap();
        let b: ModelConfig = serde_json::from_str(r#"{"connectionID": 12}"#).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<ModelConfig>(r#"{"connectionID": "x"}"#).is_err());
    }

    #[test]
    fn test_sort_value_unknown_column() {
        let m = PrivacyModule {
            module: PrivacyModuleMeta {
                id: 3,
                name: "Leads".into(),
                handle: "leads".into(),
                fields: vec![],
            },
            namespace: PrivacyNamespaceMeta {
                id: 1,
                slug: "crm".into(),
                name: "CRM".into(),
            },
            connection: None,
        };
        assert_eq!(m.sort_value("handle"), Some(serde_json::json!("leads")));
        assert_eq!(m.sort_value("connectionID"), Some(serde_json::json!(0)));
        assert_eq!(m.sort_value("createdAt"), None);
    }
}
