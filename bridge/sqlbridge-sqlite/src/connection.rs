///
/// Connection lifecycle for the single bridge database.
///
/// `Database` owns at most one `rusqlite::Connection` behind a mutex:
/// - `open` installs a new connection, replacing (and thereby dropping)
///   any previous one
/// - `close` takes the connection out and closes it; closing an absent
///   connection succeeds
/// - `dispose` closes unconditionally and only logs failures; it also
///   runs when the `Database` is dropped
///
/// Every other operation goes through `with_connection`, which fails with
/// `BridgeError::NoConnection` while nothing is open.
///

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use sqlbridge_core::{BridgeError, DataFs};
use tracing::{error, info};

pub const MEMORY_PATH: &str = ":memory:";

pub(crate) fn engine_error(e: rusqlite::Error) -> BridgeError {
    BridgeError::Engine(e.to_string())
}

/// Where `open` should point the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Memory,
    File(PathBuf),
}

impl OpenTarget {
    pub fn resolve(path: &str, fs: &dyn DataFs) -> Result<Self, BridgeError> {
        if path.is_empty() {
            return Err(BridgeError::EmptyPath);
        }
        if path.eq_ignore_ascii_case(MEMORY_PATH) {
            return Ok(OpenTarget::Memory);
        }
        Ok(OpenTarget::File(fs.full_path(path)))
    }
}

/// Creates the parent directory and an empty file if they are missing.
/// An existing file is left untouched.
fn ensure_db_file(path: &Path) -> Result<(), BridgeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

#[derive(Default)]
pub struct Database {
    conn: Mutex<Option<Connection>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn open(&self, target: &OpenTarget) -> Result<(), BridgeError> {
        let conn = match target {
            OpenTarget::Memory => Connection::open_in_memory().map_err(engine_error)?,
            OpenTarget::File(path) => {
                ensure_db_file(path)?;
                Connection::open(path).map_err(engine_error)?
            }
        };
        let previous = self.lock().replace(conn);
        if previous.is_some() {
            info!("SQLite connection replaced by re-open");
        }
        Ok(())
    }

    pub fn close(&self) -> Result<(), BridgeError> {
        let Some(conn) = self.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_conn, e)| engine_error(e))
    }

    pub fn dispose(&self) {
        if let Err(e) = self.close() {
            error!("SQLite dispose failed to close database: {}", e);
        }
    }

    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or(BridgeError::NoConnection)?;
        f(conn)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbridge_core::DataRoot;

    #[test]
    fn test_resolve_targets() {
        let fs = DataRoot::new("/data");
        assert!(matches!(
            OpenTarget::resolve("", &fs),
            Err(BridgeError::EmptyPath)
        ));
        assert_eq!(OpenTarget::resolve(":memory:", &fs).unwrap(), OpenTarget::Memory);
        assert_eq!(OpenTarget::resolve(":MEMORY:", &fs).unwrap(), OpenTarget::Memory);
        assert_eq!(
            OpenTarget::resolve("app.db", &fs).unwrap(),
            OpenTarget::File(PathBuf::from("/data/app.db"))
        );
    }

    #[test]
    fn test_no_connection_before_open() {
        let db = Database::new();
        assert!(!db.is_open());
        let result = db.with_connection(|_| Ok(()));
        assert!(matches!(result, Err(BridgeError::NoConnection)));
    }

    #[test]
    fn test_open_close_memory() {
        let db = Database::new();
        db.open(&OpenTarget::Memory).unwrap();
        assert!(db.is_open());
        db.close().unwrap();
        assert!(!db.is_open());
        db.close().unwrap();
    }

    #[test]
    fn test_reopen_replaces_connection() {
        let db = Database::new();
        db.open(&OpenTarget::Memory).unwrap();
        db.with_connection(|conn| {
            conn.execute_batch("create table t (id integer)")
                .map_err(engine_error)
        })
        .unwrap();

        db.open(&OpenTarget::Memory).unwrap();
        let tables: i64 = db
            .with_connection(|conn| {
                conn.query_row(
                    "select count(*) from sqlite_master where name = 't'",
                    [],
                    |row| row.get(0),
                )
                .map_err(engine_error)
            })
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("app.db");
        let db = Database::new();
        db.open(&OpenTarget::File(path.clone())).unwrap();
        assert!(path.exists());
        db.dispose();
        assert!(!db.is_open());
    }
}
