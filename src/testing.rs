//! Test utilities for database setup.
//!
//! Reuses the real migrations so tests never carry their own copy of the schema.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::db::{DbPool, SqliteStore};

/// A migrated study database in a temporary directory, removed on drop.
pub struct TestEnv {
    /// Kept alive so the database file persists for the test
    pub temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("study.db"))?;
        crate::db::schema::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// A second connection to the same file, wrapped as a store
    pub fn store(&self) -> SqliteStore {
        SqliteStore::new(self.pool())
    }

    pub fn pool(&self) -> DbPool {
        let conn = Connection::open(self.path().join("study.db")).expect("reopen test db");
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .expect("enable foreign keys");
        Arc::new(Mutex::new(conn))
    }
}
