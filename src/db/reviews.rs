//! Review record persistence with optimistic concurrency

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{PersistedReviewRecord, ReviewRecord};
use crate::error::{Result, SrsError};

const RECORD_COLUMNS: &str = "r.learner_id, r.card_id, r.status, r.queue_type, r.next_review_at, \
     r.last_reviewed_at, r.repetitions, r.ease_factor, r.interval, r.learning_step, r.version";

/// Row as stored, before validation
struct RecordRow {
    learner_id: i64,
    card_id: i64,
    status: String,
    queue_type: String,
    next_review_at: String,
    last_reviewed_at: String,
    repetitions: i64,
    ease_factor: f64,
    interval: i64,
    learning_step: i64,
    version: i64,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            learner_id: row.get(0)?,
            card_id: row.get(1)?,
            status: row.get(2)?,
            queue_type: row.get(3)?,
            next_review_at: row.get(4)?,
            last_reviewed_at: row.get(5)?,
            repetitions: row.get(6)?,
            ease_factor: row.get(7)?,
            interval: row.get(8)?,
            learning_step: row.get(9)?,
            version: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<ReviewRecord> {
        let persisted = PersistedReviewRecord {
            learner_id: self.learner_id,
            card_id: self.card_id,
            next_review_at: parse_timestamp(self.card_id, "next_review_at", &self.next_review_at)?,
            last_reviewed_at: parse_timestamp(self.card_id, "last_reviewed_at", &self.last_reviewed_at)?,
            status: self.status,
            queue_type: self.queue_type,
            repetitions: self.repetitions,
            ease_factor: self.ease_factor,
            interval: self.interval,
            learning_step: self.learning_step,
            version: self.version,
        };
        ReviewRecord::try_from(persisted)
    }
}

fn parse_timestamp(card_id: i64, column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            SrsError::invariant(format!("card {}: bad {} '{}': {}", card_id, column, value, e))
        })
}

/// Every record a learner holds for cards of the deck
pub fn list_review_records(
    conn: &Connection,
    learner_id: i64,
    deck_id: i64,
) -> Result<Vec<ReviewRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
    SELECT {}
    FROM review_records r
    JOIN cards c ON c.id = r.card_id
    WHERE r.learner_id = ?1 AND c.deck_id = ?2
    ORDER BY r.card_id
    "#,
        RECORD_COLUMNS
    ))?;

    let rows = stmt
        .query_map(params![learner_id, deck_id], RecordRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(RecordRow::into_record).collect()
}

pub fn get_review_record(
    conn: &Connection,
    learner_id: i64,
    card_id: i64,
) -> Result<Option<ReviewRecord>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM review_records r WHERE r.learner_id = ?1 AND r.card_id = ?2",
                RECORD_COLUMNS
            ),
            params![learner_id, card_id],
            RecordRow::from_row,
        )
        .optional()?;

    row.map(RecordRow::into_record).transpose()
}

fn stored_version(conn: &Connection, learner_id: i64, card_id: i64) -> Result<i64> {
    let version = conn
        .query_row(
            "SELECT version FROM review_records WHERE learner_id = ?1 AND card_id = ?2",
            params![learner_id, card_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn card_exists(conn: &Connection, card_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM cards WHERE id = ?1", params![card_id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Conditional write. Inserts when `expected_version` is 0, otherwise updates
/// only if the stored version still matches. Returns the new version.
pub fn save_review_record(
    conn: &Connection,
    record: &ReviewRecord,
    expected_version: i64,
) -> Result<i64> {
    let p = PersistedReviewRecord::from(record.clone());
    let new_version = expected_version + 1;
    let next_review_at = p.next_review_at.to_rfc3339();
    let last_reviewed_at = p.last_reviewed_at.to_rfc3339();

    if !card_exists(conn, p.card_id)? {
        return Err(SrsError::NotFound(format!("card {}", p.card_id)));
    }

    let changed = if expected_version == 0 {
        conn.execute(
            r#"
    INSERT INTO review_records (learner_id, card_id, status, queue_type, next_review_at,
                                last_reviewed_at, repetitions, ease_factor, interval,
                                learning_step, version)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT (learner_id, card_id) DO NOTHING
    "#,
            params![
                p.learner_id,
                p.card_id,
                p.status,
                p.queue_type,
                next_review_at,
                last_reviewed_at,
                p.repetitions,
                p.ease_factor,
                p.interval,
                p.learning_step,
                new_version,
            ],
        )?
    } else {
        conn.execute(
            r#"
    UPDATE review_records
    SET status = ?1, queue_type = ?2, next_review_at = ?3, last_reviewed_at = ?4,
        repetitions = ?5, ease_factor = ?6, interval = ?7, learning_step = ?8, version = ?9
    WHERE learner_id = ?10 AND card_id = ?11 AND version = ?12
    "#,
            params![
                p.status,
                p.queue_type,
                next_review_at,
                last_reviewed_at,
                p.repetitions,
                p.ease_factor,
                p.interval,
                p.learning_step,
                new_version,
                p.learner_id,
                p.card_id,
                expected_version,
            ],
        )?
    };

    if changed == 0 {
        let actual = stored_version(conn, p.learner_id, p.card_id)?;
        return Err(SrsError::VersionConflict {
            expected: expected_version,
            actual,
        });
    }

    Ok(new_version)
}
