//! Card reads and the minimal writes needed to seed a deck

use rusqlite::{params, Connection, Result};

use crate::domain::Card;

const CARD_COLUMNS: &str = "id, deck_id, front, back, example, audio_ref, position";

pub fn insert_card(conn: &Connection, card: &Card) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO cards (deck_id, front, back, example, audio_ref, position)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
        params![
            card.deck_id,
            card.front,
            card.back,
            card.example,
            card.audio_ref,
            card.position,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS))?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_card(row)?))
    } else {
        Ok(None)
    }
}

/// All cards of a deck in deck order
pub fn list_cards(conn: &Connection, deck_id: i64) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards WHERE deck_id = ?1 ORDER BY position ASC, id ASC",
        CARD_COLUMNS
    ))?;

    let cards = stmt
        .query_map(params![deck_id], |row| row_to_card(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Delete a card; its review records go with it. Returns false if it did not exist.
pub fn delete_card(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

fn row_to_card(row: &rusqlite::Row) -> Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        example: row.get(4)?,
        audio_ref: row.get(5)?,
        position: row.get(6)?,
    })
}
