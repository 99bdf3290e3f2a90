//! SQLite-backed store for the researcher directory and research projects.

mod projects;
mod researchers;
mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{RegistryError, Result};

pub use schema::SCHEMA_VERSION;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the registry database.
///
/// Cloning is cheap; every clone talks to the same connection. The connection
/// is closed when the last clone is dropped.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RegistryError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::debug!("Opened database at {}", path.display());

        Ok(Self::from_connection(conn))
    }

    /// Opens `research.db` in the per-user data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("org", "research-registry", "research-registry")
            .ok_or_else(|| RegistryError::Unavailable("no home directory found".into()))?;
        Self::open(dirs.data_dir().join("research.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Creates tables and indexes if absent. Idempotent; run once before
    /// serving traffic.
    pub fn migrate(&self) -> Result<()> {
        self.with_connection(|conn| {
            let before: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            conn.execute_batch(schema::SCHEMA)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

            if before != SCHEMA_VERSION {
                tracing::info!(
                    "Migrated database schema from version {} to {}",
                    before,
                    SCHEMA_VERSION
                );
            }
            Ok(())
        })
    }

    pub fn schema_version(&self) -> Result<i32> {
        self.with_connection(|conn| {
            Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| RegistryError::Unavailable("connection lock poisoned".into()))?;
        f(&mut conn)
    }
}
