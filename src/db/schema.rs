use chrono::Utc;
use rusqlite::{params, Connection, Result};

/// Bring the study database up to the current schema version.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Review records cascade away with their card
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Bootstrap: ensure db_version table exists (needed to check version)
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS db_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL,
            description TEXT
        );
        "#,
    )?;

    let current_version = get_schema_version(conn)?;
    tracing::debug!("study db schema version: {}", current_version);

    if current_version < 1 {
        migrate_v0_to_v1(conn)?;
    }

    Ok(())
}

/// v0→v1: cards and per-learner review records
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v0→v1: cards and review records");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            example TEXT,
            audio_ref TEXT,
            position INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS review_records (
            learner_id INTEGER NOT NULL,
            card_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            queue_type TEXT NOT NULL,
            next_review_at TEXT NOT NULL,
            last_reviewed_at TEXT NOT NULL,
            repetitions INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval INTEGER NOT NULL DEFAULT 0,
            learning_step INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (learner_id, card_id),
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id, position);
        "#,
    )?;

    record_version(conn, 1, "cards and review records")?;
    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        params![version, now, description],
    )?;
    tracing::info!("Recorded schema version {} - {}", version, description);
    Ok(())
}

/// Get current schema version (0 if no versions recorded)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM db_version",
        [],
        |row| row.get(0),
    )
}
