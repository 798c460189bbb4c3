use rusqlite::Connection;
use std::cell::RefCell;
use std::time::Duration;
use tracing::info;

use crate::errors::ServerError;

pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Thread-local connection slot, keyed by path so two handles on one thread
// never share a connection.
thread_local! {
    static DB_CONN: RefCell<Option<(String, Connection)>> = const { RefCell::new(None) };
}

#[derive(Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ServerError>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let stale = match slot.as_ref() {
                    Some((path, _)) => *path != self.path,
                    None => true,
                };
                if stale {
                    *slot = Some((self.path.clone(), open_connection(&self.path)?));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(ServerError::InternalError),
                }
            })
            .map_err(|_| ServerError::InternalError)?
    }
}

fn open_connection(path: &str) -> Result<Connection, ServerError> {
    let conn = Connection::open(path)
        .map_err(|e| ServerError::DbError(format!("Open DB failed: {e}")))?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<(), ServerError> {
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| ServerError::DbError(format!("set busy timeout failed: {e}")))?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .map_err(|e| ServerError::DbError(format!("set pragmas failed: {e}")))?;
    Ok(())
}

/// Apply the schema to a single connection (idempotent).
pub fn apply_schema(conn: &Connection) -> Result<(), ServerError> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| ServerError::DbError(format!("Failed to apply schema: {e}")))
}

/// Initialize the database behind `db` from the bundled schema.
pub fn init_db(db: &Database) -> Result<(), ServerError> {
    db.with_conn(|conn| apply_schema(conn))?;
    info!(path = db.path(), "database initialized");
    Ok(())
}

/// Fresh in-memory connection with the production schema.
#[cfg(test)]
pub fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    apply_schema(&conn).unwrap();
    conn
}
