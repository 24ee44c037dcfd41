pub mod cards;
pub mod reviews;
pub mod schema;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{Card, ReviewRecord};
use crate::error::SrsError;
use crate::store::ReviewStore;

pub use cards::*;
pub use reviews::*;
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Try to acquire the database lock, failing if a holder panicked
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, SrsError> {
    pool.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("database mutex poisoned: a thread panicked while holding the lock");
        SrsError::PersistenceUnavailable("database lock poisoned".into())
    })
}

/// Open (creating if needed) the study database and bring it up to date
pub fn init_db(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .log_warn(&format!("Could not create {}", parent.display()));
    }

    let conn = Connection::open(path)?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// SQLite-backed [`ReviewStore`] sharing one connection behind a mutex
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> std::result::Result<MutexGuard<'_, Connection>, SrsError> {
        try_lock(&self.pool)
    }
}

impl ReviewStore for SqliteStore {
    fn list_cards(&self, deck_id: i64) -> crate::error::Result<Vec<Card>> {
        Ok(cards::list_cards(&*self.conn()?, deck_id)?)
    }

    fn get_card(&self, card_id: i64) -> crate::error::Result<Option<Card>> {
        Ok(cards::get_card_by_id(&*self.conn()?, card_id)?)
    }

    fn list_review_records(
        &self,
        learner_id: i64,
        deck_id: i64,
    ) -> crate::error::Result<Vec<ReviewRecord>> {
        reviews::list_review_records(&*self.conn()?, learner_id, deck_id)
    }

    fn get_review_record(
        &self,
        learner_id: i64,
        card_id: i64,
    ) -> crate::error::Result<Option<ReviewRecord>> {
        reviews::get_review_record(&*self.conn()?, learner_id, card_id)
    }

    fn save_review_record(
        &self,
        record: &ReviewRecord,
        expected_version: i64,
    ) -> crate::error::Result<i64> {
        reviews::save_review_record(&*self.conn()?, record, expected_version)
    }
}
