//! SQLite store for namespaces, modules, field sensitivity and records.
//!
//! Implements the namespace, module and sensitive-data finders. Read
//! failures surface as `UpstreamQuery` (listings) or `SensitiveScan`
//! (record scans) so the privacy pipelines can pass them through as-is.

use std::path::{Path, PathBuf};

use datascope_core::*;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;

/// SQLite-backed module store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/datascope.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("datascope.db");

        let conn = Self::open_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let (namespaces, modules, records) = store.counts()?;
        info!(
            "SqliteStore initialized: {} namespaces, {} modules, {} records, path={}",
            namespaces,
            modules,
            records,
            store.db_path.display()
        );

        Ok(store)
    }

    fn open_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` inside a single transaction.
    pub(crate) fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let out = f(&*tx)?;
        tx.commit().map_err(db_err)?;
        Ok(out)
    }

    /// Number of namespaces, modules and records.
    pub fn counts(&self) -> Result<(i64, i64, i64)> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .map_err(db_err)
        };
        Ok((count("namespaces")?, count("modules")?, count("records")?))
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    pub fn create_namespace(&self, slug: &str, name: &str) -> Result<u64> {
        let conn = self.conn.lock();
        insert_namespace(&conn, slug, name)
    }

    pub fn create_connection(&self, conn_meta: &ConnectionMeta) -> Result<()> {
        let conn = self.conn.lock();
        insert_connection(&conn, conn_meta)
    }

    /// Insert a module with its fields. Returns the new module ID.
    pub fn create_module(
        &self,
        namespace_id: u64,
        handle: &str,
        name: &str,
        connection_id: u64,
        fields: &[ModuleField],
    ) -> Result<u64> {
        self.with_transaction(|conn| {
            insert_module(conn, namespace_id, handle, name, connection_id, fields)
        })
    }

    /// Insert a record of a module. Returns the new record ID.
    pub fn create_record(&self, module_id: u64, values: &ValueMap) -> Result<u64> {
        let conn = self.conn.lock();
        insert_record(&conn, module_id, values)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// All namespaces in ID order, optionally narrowed by a name/slug query.
    pub fn list_namespaces(&self, filter: &NamespaceFilter) -> Result<Vec<Namespace>> {
        let conn = self.conn.lock();
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.to_lowercase()));

        let mut stmt = conn
            .prepare_cached(
                "SELECT id, slug, name FROM namespaces
                 WHERE ?1 IS NULL OR lower(name) LIKE ?1 OR lower(slug) LIKE ?1
                 ORDER BY id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![pattern], |row| {
                Ok(Namespace {
                    id: row.get::<_, i64>(0)? as u64,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Modules of one namespace in ID order, with their fields.
    pub fn list_modules(&self, namespace_id: u64) -> Result<Vec<Module>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, namespace_id, handle, name, connection_id FROM modules
                 WHERE namespace_id = ?1 ORDER BY id",
            )
            .map_err(db_err)?;
        let mut modules = stmt
            .query_map(params![namespace_id as i64], row_to_module)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        for module in &mut modules {
            module.fields = module_fields(&conn, module.id)?;
        }
        Ok(modules)
    }

    /// Sensitive values of every record in a module.
    ///
    /// A module without sensitive fields yields nothing. Otherwise every
    /// record is returned in ID order with one `{name, value}` map per
    /// sensitive field it carries; records carrying none come back with an
    /// empty value list.
    pub fn scan_sensitive(&self, filter: &RecordFilter) -> Result<Vec<PrivateDataSet>> {
        let conn = self.conn.lock();
        let sensitive: Vec<String> = module_fields(&conn, filter.module_id)?
            .into_iter()
            .filter(ModuleField::is_sensitive)
            .map(|f| f.name)
            .collect();
        if sensitive.is_empty() {
            debug!("Module {} has no sensitive fields", filter.module_id);
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare_cached(
                "SELECT id, values_json FROM records
                 WHERE module_id = ?1 AND namespace_id = ?2 ORDER BY id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![filter.module_id as i64, filter.namespace_id as i64],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, values_json) in rows {
            let values: ValueMap = serde_json::from_str(&values_json)?;
            let found = sensitive
                .iter()
                .filter_map(|field| match values.get(field) {
                    None | Some(serde_json::Value::Null) => None,
                    Some(value) => {
                        let mut map = ValueMap::new();
                        map.insert("name".into(), field.as_str().into());
                        map.insert("value".into(), value.clone());
                        Some(map)
                    }
                })
                .collect();
            out.push(PrivateDataSet { id, values: found });
        }
        Ok(out)
    }

    /// Every module with at least one sensitive field, in module ID order,
    /// restricted to `connection_ids` when non-empty.
    pub fn list_privacy_modules(&self, connection_ids: &[u64]) -> Result<Vec<PrivacyModule>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT m.id, m.handle, m.name, m.connection_id,
                        n.id, n.slug, n.name,
                        c.handle, c.name
                 FROM modules m
                 JOIN namespaces n ON n.id = m.namespace_id
                 LEFT JOIN connections c ON c.id = m.connection_id
                 WHERE EXISTS (
                     SELECT 1 FROM module_fields f
                     WHERE f.module_id = m.id AND f.sensitivity_level > 0
                 )
                 ORDER BY m.id",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                let connection_id = row.get::<_, i64>(3)? as u64;
                let handle: Option<String> = row.get(7)?;
                let name: Option<String> = row.get(8)?;
                let connection = match (connection_id, handle) {
                    (0, _) => None,
                    (id, handle) => Some(ConnectionMeta {
                        id,
                        handle: handle.unwrap_or_default(),
                        name: name.unwrap_or_default(),
                    }),
                };
                Ok(PrivacyModule {
                    module: PrivacyModuleMeta {
                        id: row.get::<_, i64>(0)? as u64,
                        handle: row.get(1)?,
                        name: row.get(2)?,
                        fields: Vec::new(),
                    },
                    namespace: PrivacyNamespaceMeta {
                        id: row.get::<_, i64>(4)? as u64,
                        slug: row.get(5)?,
                        name: row.get(6)?,
                    },
                    connection,
                })
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for mut pm in rows {
            if !connection_ids.is_empty() && !connection_ids.contains(&pm.connection_id()) {
                continue;
            }
            pm.module.fields = module_fields(&conn, pm.module.id)?
                .into_iter()
                .filter(ModuleField::is_sensitive)
                .map(|f| PrivacyField {
                    name: f.name,
                    kind: f.kind,
                    sensitivity_level: f.sensitivity_level,
                })
                .collect();
            out.push(pm);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------

fn row_to_module(row: &rusqlite::Row<'_>) -> rusqlite::Result<Module> {
    Ok(Module {
        id: row.get::<_, i64>(0)? as u64,
        namespace_id: row.get::<_, i64>(1)? as u64,
        handle: row.get(2)?,
        name: row.get(3)?,
        model_config: ModelConfig {
            connection_id: row.get::<_, i64>(4)? as u64,
        },
        fields: Vec::new(),
    })
}

fn module_fields(conn: &Connection, module_id: u64) -> Result<Vec<ModuleField>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT name, kind, sensitivity_level FROM module_fields
             WHERE module_id = ?1 ORDER BY position, id",
        )
        .map_err(db_err)?;
    let fields = stmt
        .query_map(params![module_id as i64], |row| {
            Ok(ModuleField {
                name: row.get(0)?,
                kind: row.get(1)?,
                sensitivity_level: row.get::<_, i64>(2)?.clamp(0, u8::MAX as i64) as u8,
            })
        })
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;
    Ok(fields)
}

pub(crate) fn insert_namespace(conn: &Connection, slug: &str, name: &str) -> Result<u64> {
    conn.prepare_cached("INSERT INTO namespaces (slug, name, created_at) VALUES (?1, ?2, ?3)")
        .map_err(db_err)?
        .insert(params![slug, name, now_millis()])
        .map(|id| id as u64)
        .map_err(db_err)
}

pub(crate) fn insert_connection(conn: &Connection, meta: &ConnectionMeta) -> Result<()> {
    if meta.id == 0 {
        return Err(Error::Config("connection ID 0 is reserved for the primary connection".into()));
    }
    conn.execute(
        "INSERT INTO connections (id, handle, name) VALUES (?1, ?2, ?3)",
        params![meta.id as i64, meta.handle, meta.name],
    )
    .map_err(db_err)?;
    Ok(())
}

pub(crate) fn insert_module(
    conn: &Connection,
    namespace_id: u64,
    handle: &str,
    name: &str,
    connection_id: u64,
    fields: &[ModuleField],
) -> Result<u64> {
    let module_id = conn
        .prepare_cached(
            "INSERT INTO modules (namespace_id, handle, name, connection_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(db_err)?
        .insert(params![
            namespace_id as i64,
            handle,
            name,
            connection_id as i64,
            now_millis()
        ])
        .map_err(db_err)?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO module_fields (module_id, name, kind, sensitivity_level, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(db_err)?;
    for (position, field) in fields.iter().enumerate() {
        stmt.execute(params![
            module_id,
            field.name,
            field.kind,
            field.sensitivity_level as i64,
            position as i64
        ])
        .map_err(db_err)?;
    }
    Ok(module_id as u64)
}

pub(crate) fn insert_record(conn: &Connection, module_id: u64, values: &ValueMap) -> Result<u64> {
    let namespace_id: i64 = conn
        .prepare_cached("SELECT namespace_id FROM modules WHERE id = ?1")
        .map_err(db_err)?
        .query_row(params![module_id as i64], |row| row.get(0))
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| Error::NotFound(format!("module {}", module_id)))?;

    let values_json = serde_json::to_string(values)?;
    conn.prepare_cached(
        "INSERT INTO records (module_id, namespace_id, values_json, created_at)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .map_err(db_err)?
    .insert(params![module_id as i64, namespace_id, values_json, now_millis()])
    .map(|id| id as u64)
    .map_err(db_err)
}

// ---------------------------------------------------------------
// Finder capabilities
// ---------------------------------------------------------------

fn as_upstream(e: Error) -> Error {
    match e {
        Error::Database(msg) => Error::UpstreamQuery(msg),
        other => other,
    }
}

impl NamespaceFinder for SqliteStore {
    fn find_namespaces(&self, filter: &NamespaceFilter) -> Result<Vec<Namespace>> {
        self.list_namespaces(filter).map_err(as_upstream)
    }
}

impl ModuleFinder for SqliteStore {
    fn find_modules(&self, filter: &ModuleFilter) -> Result<Vec<Module>> {
        self.list_modules(filter.namespace_id).map_err(as_upstream)
    }
}

impl SensitiveDataFinder for SqliteStore {
    fn find_sensitive(&self, filter: &RecordFilter) -> Result<Vec<PrivateDataSet>> {
        self.scan_sensitive(filter).map_err(|e| match e {
            Error::Database(msg) => Error::SensitiveScan(msg),
            Error::Json(e) => Error::SensitiveScan(format!(
                "module {}: corrupt record values: {}",
                filter.module_id, e
            )),
            other => other,
        })
    }
}
