//! Persistence layer: libSQL-backed settings slots and profile records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{ProfileStore, SettingsStore};
