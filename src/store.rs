//! Read and write contracts the study core needs from its surroundings.
//!
//! The card source is read-only. The only write is the conditional save of a
//! review record, guarded by the version the caller read.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::{Card, ReviewRecord};
use crate::error::{Result, SrsError};

pub trait ReviewStore {
    /// Cards of a deck, in no particular order
    fn list_cards(&self, deck_id: i64) -> Result<Vec<Card>>;

    fn get_card(&self, card_id: i64) -> Result<Option<Card>>;

    /// All records a learner holds for cards of the deck
    fn list_review_records(&self, learner_id: i64, deck_id: i64) -> Result<Vec<ReviewRecord>>;

    fn get_review_record(&self, learner_id: i64, card_id: i64) -> Result<Option<ReviewRecord>>;

    /// Store `record` if the stored version still equals `expected_version`
    /// (0 when no record exists yet). Returns the new version.
    fn save_review_record(&self, record: &ReviewRecord, expected_version: i64) -> Result<i64>;
}

/// In-memory store. Handy for tests and for embedding without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_writes: AtomicBool,
    raced_writes: AtomicUsize,
}

#[derive(Default)]
struct MemoryInner {
    cards: BTreeMap<i64, Card>,
    records: HashMap<(i64, i64), ReviewRecord>,
    last_card_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| SrsError::PersistenceUnavailable("memory store lock poisoned".into()))
    }

    /// Insert a card, assigning an id when it has none. Returns the id.
    pub fn insert_card(&self, mut card: Card) -> Result<i64> {
        let mut inner = self.lock()?;
        if card.id == 0 {
            inner.last_card_id += 1;
            card.id = inner.last_card_id;
        } else {
            inner.last_card_id = inner.last_card_id.max(card.id);
        }
        let id = card.id;
        inner.cards.insert(id, card);
        Ok(id)
    }

    /// Delete a card and every learner's record for it
    pub fn delete_card(&self, card_id: i64) -> Result<bool> {
        let mut inner = self.lock()?;
        inner.records.retain(|(_, c), _| *c != card_id);
        Ok(inner.cards.remove(&card_id).is_some())
    }

    /// Make every following write fail as if storage were down
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject the next `n` writes as if another writer got there first
    pub fn race_next_writes(&self, n: usize) {
        self.raced_writes.store(n, Ordering::SeqCst);
    }
}

impl ReviewStore for MemoryStore {
    fn list_cards(&self, deck_id: i64) -> Result<Vec<Card>> {
        let inner = self.lock()?;
        Ok(inner
            .cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect())
    }

    fn get_card(&self, card_id: i64) -> Result<Option<Card>> {
        Ok(self.lock()?.cards.get(&card_id).cloned())
    }

    fn list_review_records(&self, learner_id: i64, deck_id: i64) -> Result<Vec<ReviewRecord>> {
        let inner = self.lock()?;
        let mut records: Vec<ReviewRecord> = inner
            .records
            .values()
            .filter(|r| r.learner_id == learner_id)
            .filter(|r| inner.cards.get(&r.card_id).is_some_and(|c| c.deck_id == deck_id))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.card_id);
        Ok(records)
    }

    fn get_review_record(&self, learner_id: i64, card_id: i64) -> Result<Option<ReviewRecord>> {
        Ok(self.lock()?.records.get(&(learner_id, card_id)).cloned())
    }

    fn save_review_record(&self, record: &ReviewRecord, expected_version: i64) -> Result<i64> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SrsError::PersistenceUnavailable("writes disabled".into()));
        }

        let mut inner = self.lock()?;
        if !inner.cards.contains_key(&record.card_id) {
            return Err(SrsError::NotFound(format!("card {}", record.card_id)));
        }

        let key = (record.learner_id, record.card_id);
        let actual = inner.records.get(&key).map_or(0, |r| r.version);

        let raced = self
            .raced_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if raced {
            return Err(SrsError::VersionConflict {
                expected: expected_version,
                actual: actual + 1,
            });
        }

        if actual != expected_version {
            return Err(SrsError::VersionConflict {
                expected: expected_version,
                actual,
            });
        }

        let new_version = expected_version + 1;
        let mut stored = record.clone();
        stored.version = new_version;
        inner.records.insert(key, stored);
        Ok(new_version)
    }
}
