//! Seed data import from a JSON document.
//!
//! ```json
//! {
//!   "connections": [{"connectionID": "5", "handle": "warehouse", "name": "Warehouse"}],
//!   "namespaces": [{
//!     "slug": "crm", "name": "CRM",
//!     "modules": [{
//!       "handle": "contacts", "name": "Contacts", "connectionID": "5",
//!       "fields": [{"name": "email", "kind": "Email", "sensitivityLevel": 2}],
//!       "records": [{"values": {"email": "ann@example.com"}}]
//!     }]
//!   }]
//! }
//! ```

use std::path::Path;

use datascope_core::*;
use serde::Deserialize;
use tracing::info;

use crate::sqlite::{insert_connection, insert_module, insert_namespace, insert_record, SqliteStore};

#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub connections: Vec<ConnectionMeta>,
    #[serde(default)]
    pub namespaces: Vec<FixtureNamespace>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureNamespace {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub modules: Vec<FixtureModule>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureModule {
    pub handle: String,
    pub name: String,
    #[serde(rename = "connectionID", default, with = "id_string")]
    pub connection_id: u64,
    #[serde(default)]
    pub fields: Vec<ModuleField>,
    #[serde(default)]
    pub records: Vec<FixtureRecord>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureRecord {
    pub values: ValueMap,
}

/// Counts of imported rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub connections: usize,
    pub namespaces: usize,
    pub modules: usize,
    pub records: usize,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Insert everything in one transaction; any failure rolls the whole import back.
    pub fn import(&self, store: &SqliteStore) -> Result<ImportSummary> {
        let summary = store.with_transaction(|conn| {
            let mut summary = ImportSummary::default();
            for c in &self.connections {
                insert_connection(conn, c)?;
                summary.connections += 1;
            }
            for ns in &self.namespaces {
                let ns_id = insert_namespace(conn, &ns.slug, &ns.name)?;
                summary.namespaces += 1;
                for m in &ns.modules {
                    let module_id =
                        insert_module(conn, ns_id, &m.handle, &m.name, m.connection_id, &m.fields)?;
                    summary.modules += 1;
                    for r in &m.records {
                        insert_record(conn, module_id, &r.values)?;
                        summary.records += 1;
                    }
                }
            }
            Ok(summary)
        })?;

        info!(
            "Fixture imported: {} connections, {} namespaces, {} modules, {} records",
            summary.connections, summary.namespaces, summary.modules, summary.records
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FIXTURE: &str = r#"{
        "connections": [{"connectionID": "5", "handle": "warehouse", "name": "Warehouse"}],
        "namespaces": [
            {
                "slug": "crm",
                "name": "CRM",
                "modules": [
                    {
                        "handle": "contacts",
                        "name": "Contacts",
                        "fields": [
                            {"name": "name", "kind": "String", "sensitivityLevel": 0},
                            {"name": "email", "kind": "Email", "sensitivityLevel": 2}
                        ],
                        "records": [
                            {"values": {"name": "Ann", "email": "ann@example.com"}},
                            {"values": {"name": "Bob"}}
                        ]
                    },
                    {
                        "handle": "orders",
                        "name": "Orders",
                        "connectionID": "5",
                        "fields": [{"name": "card", "kind": "String", "sensitivityLevel": 3}]
                    }
                ]
            },
            {"slug": "empty", "name": "Empty"}
        ]
    }"#;

    #[test]
    fn test_import_fixture() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        let fixture: Fixture = serde_json::from_str(FIXTURE).unwrap();
        let summary = fixture.import(&store).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                connections: 1,
                namespaces: 2,
                modules: 2,
                records: 2,
            }
        );

        let namespaces = store.find_namespaces(&NamespaceFilter::default()).unwrap();
        let modules = store
            .find_modules(&ModuleFilter {
                namespace_id: namespaces[0].id,
            })
            .unwrap();
        assert_eq!(modules[1].model_config.connection_id, 5);
        let privacy = store.list_privacy_modules(&[]).unwrap();
        assert_eq!(privacy.len(), 2);
    }

    #[test]
    fn test_failed_import_rolls_back() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        let fixture: Fixture = serde_json::from_str(
            r#"{"namespaces": [{"slug": "a", "name": "A"}, {"slug": "a", "name": "Duplicate"}]}"#,
        )
        .unwrap();
        assert!(fixture.import(&store).is_err());
        assert_eq!(store.counts().unwrap(), (0, 0, 0));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, FIXTURE).unwrap();
        let fixture = Fixture::load(&path).unwrap();
        assert_eq!(fixture.namespaces.len(), 2);
        assert!(matches!(
            Fixture::load(&dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
