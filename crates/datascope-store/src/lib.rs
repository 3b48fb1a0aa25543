//! DataScope Store — SQLite-backed namespaces, modules, records and privacy catalog.

pub mod catalog;
pub mod fixture;
pub mod schema;
pub mod sqlite;

pub use catalog::PrivacyCatalog;
pub use fixture::{Fixture, ImportSummary};
pub use sqlite::SqliteStore;
