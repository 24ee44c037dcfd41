//! Study session controller.
//!
//! Sequences one learner's pass over a deck: builds the queue, grades the
//! current item, persists the result, and either drops the item or puts it
//! back a few places later when it was graded AGAIN.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use crate::config::SrsConfig;
use crate::domain::{Grade, ReviewRecord};
use crate::error::{Result, SrsError};
use crate::store::ReviewStore;

use super::queue::{
  build_queue, sort_for_presentation, split_by_record, QueueKind, QueueLimits, StudyItem,
};
use super::scheduler::schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
  Idle,
  Running,
  Empty,
  Stopped,
}

impl SessionState {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Idle => "IDLE",
      Self::Running => "RUNNING",
      Self::Empty => "EMPTY",
      Self::Stopped => "STOPPED",
    }
  }
}

/// What happened to the graded item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GradeOutcome {
  /// The grade was persisted; `requeued` items will come back this session
  Graded { record: ReviewRecord, requeued: bool },
  /// The card was deleted mid-session and was dropped from the queue
  Skipped { card_id: i64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
  pub graded: usize,
  pub again: usize,
  pub skipped: usize,
  /// Distinct new cards brought into this session
  pub admitted_new: usize,
  /// Distinct due learning/review cards brought into this session
  pub admitted_due: usize,
  pub remaining: usize,
}

pub struct StudySessionController {
  learner_id: i64,
  deck_id: i64,
  config: SrsConfig,
  state: SessionState,
  queue: VecDeque<StudyItem>,
  admitted_new: HashSet<i64>,
  admitted_due: HashSet<i64>,
  /// Cards put back after AGAIN; they keep their distance from the head on refill
  requeued: HashSet<i64>,
  graded: usize,
  again: usize,
  skipped: usize,
}

impl StudySessionController {
  pub fn new(learner_id: i64, deck_id: i64, config: SrsConfig) -> Self {
    Self {
      learner_id,
      deck_id,
      config,
      state: SessionState::Idle,
      queue: VecDeque::new(),
      admitted_new: HashSet::new(),
      admitted_due: HashSet::new(),
      requeued: HashSet::new(),
      graded: 0,
      again: 0,
      skipped: 0,
    }
  }

  pub fn learner_id(&self) -> i64 {
    self.learner_id
  }

  pub fn deck_id(&self) -> i64 {
    self.deck_id
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  /// Item the learner should be looking at, only while running
  pub fn current(&self) -> Option<&StudyItem> {
    match self.state {
      SessionState::Running => self.queue.front(),
      _ => None,
    }
  }

  /// Pending items in presentation order
  pub fn pending(&self) -> impl Iterator<Item = &StudyItem> {
    self.queue.iter()
  }

  pub fn stats(&self) -> SessionStats {
    SessionStats {
      graded: self.graded,
      again: self.again,
      skipped: self.skipped,
      admitted_new: self.admitted_new.len(),
      admitted_due: self.admitted_due.len(),
      remaining: self.queue.len(),
    }
  }

  /// Build the first queue. Valid only once, from `Idle`.
  pub fn start(&mut self, store: &impl ReviewStore, now: DateTime<Utc>) -> Result<SessionState> {
    if self.state != SessionState::Idle {
      return Err(SrsError::InvalidSessionState(format!(
        "cannot start a session that is {}",
        self.state.as_str()
      )));
    }

    self.load_snapshot(store, now)?;
    tracing::info!(
      learner_id = self.learner_id,
      deck_id = self.deck_id,
      items = self.queue.len(),
      "study session started"
    );
    Ok(self.state)
  }

  /// Rebuild the snapshot from the store, keeping items still pending.
  pub fn refill(&mut self, store: &impl ReviewStore, now: DateTime<Utc>) -> Result<SessionState> {
    if !matches!(self.state, SessionState::Running | SessionState::Empty) {
      return Err(SrsError::InvalidSessionState(format!(
        "cannot refill a session that is {}",
        self.state.as_str()
      )));
    }

    let before = self.queue.len();
    self.load_snapshot(store, now)?;
    tracing::debug!(added = self.queue.len() - before, "refilled study queue");
    Ok(self.state)
  }

  /// Grade the current item and persist the result.
  ///
  /// On any error the item stays current and the session keeps running, so a
  /// grade is never silently lost.
  pub fn grade(
    &mut self,
    store: &impl ReviewStore,
    card_id: i64,
    grade: Grade,
    now: DateTime<Utc>,
  ) -> Result<GradeOutcome> {
    if self.state != SessionState::Running {
      return Err(SrsError::InvalidSessionState(format!(
        "cannot grade in a session that is {}",
        self.state.as_str()
      )));
    }

    let item = match self.queue.front() {
      Some(item) if item.card_id() == card_id => item.clone(),
      Some(item) => {
        return Err(SrsError::InvalidSessionState(format!(
          "card {} is not the current item (current is {})",
          card_id,
          item.card_id()
        )));
      }
      None => {
        return Err(SrsError::InvalidSessionState("session queue is empty".into()));
      }
    };

    if store.get_card(card_id)?.is_none() {
      return Ok(self.skip_current(card_id));
    }

    let saved = match self.schedule_and_save(store, &item, grade, now) {
      Ok(record) => record,
      Err(SrsError::NotFound(_)) => return Ok(self.skip_current(card_id)),
      Err(e) => {
        tracing::warn!(card_id, "grade not persisted, keeping card current: {}", e);
        return Err(e);
      }
    };

    self.queue.pop_front();
    self.requeued.remove(&card_id);
    self.graded += 1;

    let requeued = grade == Grade::Again;
    if requeued {
      self.again += 1;
      self.requeued.insert(card_id);
      let position = self.config.requeue_gap.min(self.queue.len());
      self.queue.insert(
        position,
        StudyItem {
          kind: QueueKind::DueLearning,
          card: item.card,
          record: Some(saved.clone()),
        },
      );
    }

    self.mark_empty_if_drained();
    Ok(GradeOutcome::Graded {
      record: saved,
      requeued,
    })
  }

  /// End the session. Already persisted grades stay.
  pub fn stop(&mut self) {
    if self.state != SessionState::Stopped {
      tracing::info!(
        learner_id = self.learner_id,
        deck_id = self.deck_id,
        graded = self.graded,
        discarded = self.queue.len(),
        "study session stopped"
      );
    }
    self.queue.clear();
    self.requeued.clear();
    self.state = SessionState::Stopped;
  }

  /// Schedule from the record the item was selected with. If somebody else
  /// wrote in between, recompute from the fresh record and try once more.
  fn schedule_and_save(
    &self,
    store: &impl ReviewStore,
    item: &StudyItem,
    grade: Grade,
    now: DateTime<Utc>,
  ) -> Result<ReviewRecord> {
    let card_id = item.card_id();
    let next = schedule(item.record.as_ref(), self.learner_id, card_id, grade, now, &self.config)?;

    match store.save_review_record(&next, item.expected_version()) {
      Ok(version) => Ok(ReviewRecord { version, ..next }),
      Err(SrsError::VersionConflict { expected, actual }) => {
        tracing::warn!(
          card_id,
          expected,
          actual,
          "review record changed since it was read, retrying from fresh copy"
        );
        let fresh = store.get_review_record(self.learner_id, card_id)?;
        let expected = fresh.as_ref().map_or(0, |r| r.version);
        let next = schedule(fresh.as_ref(), self.learner_id, card_id, grade, now, &self.config)?;
        let version = store.save_review_record(&next, expected)?;
        Ok(ReviewRecord { version, ..next })
      }
      Err(e) => Err(e),
    }
  }

  fn skip_current(&mut self, card_id: i64) -> GradeOutcome {
    tracing::warn!(card_id, "card no longer exists, dropping it from the session");
    self.queue.pop_front();
    self.requeued.remove(&card_id);
    self.skipped += 1;
    self.mark_empty_if_drained();
    GradeOutcome::Skipped { card_id }
  }

  fn mark_empty_if_drained(&mut self) {
    if self.queue.is_empty() {
      self.state = SessionState::Empty;
      tracing::info!(
        learner_id = self.learner_id,
        deck_id = self.deck_id,
        graded = self.graded,
        "study session has no cards left"
      );
    }
  }

  /// Merge a fresh snapshot with the pending items, charging new and due
  /// cards against what is left of this session's allowances.
  fn load_snapshot(&mut self, store: &impl ReviewStore, now: DateTime<Utc>) -> Result<()> {
    let cards = store.list_cards(self.deck_id)?;
    let records = store.list_review_records(self.learner_id, self.deck_id)?;

    let pending: HashSet<i64> = self.queue.iter().map(|i| i.card_id()).collect();
    let (reviewed, new_cards) = split_by_record(cards, records);
    let reviewed = reviewed
      .into_iter()
      .filter(|(card, _)| !pending.contains(&card.id))
      .collect();
    let new_cards = new_cards
      .into_iter()
      .filter(|card| !pending.contains(&card.id) && !self.admitted_new.contains(&card.id))
      .collect();

    let limits = QueueLimits {
      new_per_session: self
        .config
        .new_per_session
        .saturating_sub(self.admitted_new.len()),
      review_per_session: usize::MAX,
    };

    let mut fresh = Vec::new();
    for item in build_queue(reviewed, new_cards, now, limits) {
      let card_id = item.card_id();
      match item.kind {
        QueueKind::New => {
          self.admitted_new.insert(card_id);
        }
        QueueKind::DueLearning | QueueKind::DueReview => {
          let seen = self.admitted_due.contains(&card_id) || self.admitted_new.contains(&card_id);
          if !seen {
            if self.admitted_due.len() >= self.config.review_per_session {
              continue;
            }
            self.admitted_due.insert(card_id);
          }
        }
      }
      fresh.push(item);
    }
    self.merge_into_queue(fresh);

    self.state = if self.queue.is_empty() {
      SessionState::Empty
    } else {
      SessionState::Running
    };
    Ok(())
  }

  /// Re-rank pending and fresh items together. Requeued items go back to the
  /// offset from the head they had before.
  fn merge_into_queue(&mut self, fresh: Vec<StudyItem>) {
    let mut held = Vec::new();
    let mut ordered = Vec::new();
    for (offset, item) in self.queue.drain(..).enumerate() {
      if self.requeued.contains(&item.card_id()) {
        held.push((offset, item));
      } else {
        ordered.push(item);
      }
    }
    ordered.extend(fresh);
    sort_for_presentation(&mut ordered);

    let mut queue = VecDeque::from(ordered);
    for (offset, item) in held {
      queue.insert(offset.min(queue.len()), item);
    }
    self.queue = queue;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Card, ReviewState, Status};
  use crate::store::MemoryStore;
  use chrono::{Duration, TimeZone};

  const LEARNER: i64 = 1;
  const DECK: i64 = 1;

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 18, 0, 0).unwrap()
  }

  fn deck(n: usize) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 0..n {
      store
        .insert_card(Card::new(DECK, format!("q{}", i), format!("a{}", i)).at_position(i as i64))
        .unwrap();
    }
    store
  }

  fn session() -> StudySessionController {
    StudySessionController::new(LEARNER, DECK, SrsConfig::default())
  }

  fn current_id(s: &StudySessionController) -> i64 {
    s.current().unwrap().card_id()
  }

  fn order(s: &StudySessionController) -> Vec<i64> {
    s.pending().map(|i| i.card_id()).collect()
  }

  #[test]
  fn test_start_empty_deck() {
    let store = deck(0);
    let mut s = session();
    assert_eq!(s.start(&store, t0()).unwrap(), SessionState::Empty);
    assert!(s.current().is_none());
  }

  #[test]
  fn test_start_exposes_first_item() {
    let store = deck(3);
    let mut s = session();
    assert_eq!(s.start(&store, t0()).unwrap(), SessionState::Running);
    assert_eq!(current_id(&s), 1);
    assert_eq!(s.current().unwrap().kind, QueueKind::New);
    assert_eq!(s.stats().admitted_new, 3);
  }

  #[test]
  fn test_start_twice_rejected() {
    let store = deck(1);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    assert!(matches!(
      s.start(&store, t0()),
      Err(SrsError::InvalidSessionState(_))
    ));
  }

  #[test]
  fn test_grade_before_start_rejected() {
    let store = deck(1);
    let mut s = session();
    assert!(matches!(
      s.grade(&store, 1, Grade::Good, t0()),
      Err(SrsError::InvalidSessionState(_))
    ));
  }

  #[test]
  fn test_grade_wrong_card_rejected() {
    let store = deck(2);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    assert!(matches!(
      s.grade(&store, 2, Grade::Good, t0()),
      Err(SrsError::InvalidSessionState(_))
    ));
    assert_eq!(current_id(&s), 1);
    assert!(store.get_review_record(LEARNER, 2).unwrap().is_none());
  }

  #[test]
  fn test_good_persists_and_removes() {
    let store = deck(2);
    let mut s = session();
    s.start(&store, t0()).unwrap();

    let outcome = s.grade(&store, 1, Grade::Good, t0()).unwrap();
    match outcome {
      GradeOutcome::Graded { record, requeued } => {
        assert!(!requeued);
        assert_eq!(record.version, 1);
        assert_eq!(record.state, ReviewState::Learning { step: 1 });
      }
      other => panic!("unexpected outcome {:?}", other),
    }

    let stored = store.get_review_record(LEARNER, 1).unwrap().unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.next_review_at, t0() + Duration::minutes(10));
    assert_eq!(order(&s), vec![2]);
  }

  #[test]
  fn test_again_requeued_behind_gap() {
    let store = deck(6);
    let mut s = session();
    s.start(&store, t0()).unwrap();

    let outcome = s.grade(&store, 1, Grade::Again, t0()).unwrap();
    assert!(matches!(outcome, GradeOutcome::Graded { requeued: true, .. }));
    // Three other cards come first
    assert_eq!(order(&s), vec![2, 3, 4, 1, 5, 6]);

    let requeued = s.pending().nth(3).unwrap();
    assert_eq!(requeued.kind, QueueKind::DueLearning);
    assert_eq!(requeued.expected_version(), 1);
  }

  #[test]
  fn test_again_with_short_queue_goes_to_back() {
    let store = deck(2);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Again, t0()).unwrap();
    assert_eq!(order(&s), vec![2, 1]);
  }

  #[test]
  fn test_again_on_last_card_keeps_running() {
    let store = deck(1);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Again, t0()).unwrap();
    assert_eq!(s.state(), SessionState::Running);
    assert_eq!(current_id(&s), 1);

    // Second pass uses the persisted version
    let later = t0() + Duration::minutes(1);
    s.grade(&store, 1, Grade::Good, later).unwrap();
    assert_eq!(store.get_review_record(LEARNER, 1).unwrap().unwrap().version, 2);
    assert_eq!(s.state(), SessionState::Empty);
  }

  #[test]
  fn test_drains_to_empty() {
    let store = deck(2);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    s.grade(&store, 2, Grade::Easy, t0()).unwrap();
    assert_eq!(s.state(), SessionState::Empty);
    assert!(s.current().is_none());
    assert!(matches!(
      s.grade(&store, 2, Grade::Good, t0()),
      Err(SrsError::InvalidSessionState(_))
    ));
  }

  #[test]
  fn test_persistence_failure_keeps_item_current() {
    let store = deck(2);
    let mut s = session();
    s.start(&store, t0()).unwrap();

    store.set_fail_writes(true);
    let err = s.grade(&store, 1, Grade::Good, t0()).unwrap_err();
    assert!(matches!(err, SrsError::PersistenceUnavailable(_)));
    assert_eq!(s.state(), SessionState::Running);
    assert_eq!(current_id(&s), 1);
    assert_eq!(s.stats().graded, 0);

    store.set_fail_writes(false);
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    assert_eq!(current_id(&s), 2);
  }

  #[test]
  fn test_conflict_retried_once() {
    let store = deck(1);
    let mut s = session();
    s.start(&store, t0()).unwrap();

    store.race_next_writes(1);
    let outcome = s.grade(&store, 1, Grade::Good, t0()).unwrap();
    assert!(matches!(outcome, GradeOutcome::Graded { .. }));
    assert_eq!(store.get_review_record(LEARNER, 1).unwrap().unwrap().version, 1);
  }

  #[test]
  fn test_second_conflict_surfaces() {
    let store = deck(1);
    let mut s = session();
    s.start(&store, t0()).unwrap();

    store.race_next_writes(2);
    let err = s.grade(&store, 1, Grade::Good, t0()).unwrap_err();
    assert!(matches!(err, SrsError::VersionConflict { .. }));
    assert!(err.is_transient());
    assert_eq!(current_id(&s), 1);
    assert!(store.get_review_record(LEARNER, 1).unwrap().is_none());
  }

  #[test]
  fn test_concurrent_sessions_never_double_schedule() {
    let store = deck(1);
    let mut tab_a = session();
    let mut tab_b = session();
    tab_a.start(&store, t0()).unwrap();
    tab_b.start(&store, t0()).unwrap();

    tab_a.grade(&store, 1, Grade::Good, t0()).unwrap();
    // Tab B still holds the stale "new card" snapshot
    let later = t0() + Duration::minutes(10);
    let outcome = tab_b.grade(&store, 1, Grade::Good, later).unwrap();

    let stored = store.get_review_record(LEARNER, 1).unwrap().unwrap();
    assert_eq!(stored.version, 2);
    // Recomputed from tab A's write: step 1 + GOOD graduates
    assert_eq!(stored.status(), Status::Review);
    match outcome {
      GradeOutcome::Graded { record, .. } => assert_eq!(record, stored),
      other => panic!("unexpected outcome {:?}", other),
    }
  }

  #[test]
  fn test_deleted_card_skipped() {
    let store = deck(2);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    store.delete_card(1).unwrap();

    let outcome = s.grade(&store, 1, Grade::Good, t0()).unwrap();
    assert_eq!(outcome, GradeOutcome::Skipped { card_id: 1 });
    assert_eq!(current_id(&s), 2);
    assert_eq!(s.stats().skipped, 1);
  }

  #[test]
  fn test_deleted_last_card_empties_session() {
    let store = deck(1);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    store.delete_card(1).unwrap();
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    assert_eq!(s.state(), SessionState::Empty);
  }

  #[test]
  fn test_corrupt_record_surfaces_invariant_violation() {
    let store = deck(1);
    let mut corrupt = ReviewRecord::fresh(LEARNER, 1, 2.5, t0() - Duration::days(1));
    corrupt.state = ReviewState::Review {
      interval_days: 3,
      repetitions: 2,
    };
    corrupt.ease_factor = 1.1;
    store.save_review_record(&corrupt, 0).unwrap();

    let mut s = session();
    s.start(&store, t0()).unwrap();
    let err = s.grade(&store, 1, Grade::Good, t0()).unwrap_err();
    assert!(matches!(err, SrsError::InvariantViolation(_)));
    assert_eq!(current_id(&s), 1);
    // Nothing was written over the corrupt record
    assert_eq!(store.get_review_record(LEARNER, 1).unwrap().unwrap().version, 1);
  }

  #[test]
  fn test_stop_discards_queue() {
    let store = deck(3);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    s.stop();

    assert_eq!(s.state(), SessionState::Stopped);
    assert_eq!(s.stats().remaining, 0);
    assert!(s.current().is_none());
    // Persisted grade survives
    assert!(store.get_review_record(LEARNER, 1).unwrap().is_some());
    assert!(s.grade(&store, 2, Grade::Good, t0()).is_err());
    assert!(s.refill(&store, t0()).is_err());
  }

  #[test]
  fn test_stop_from_idle() {
    let mut s = session();
    s.stop();
    assert_eq!(s.state(), SessionState::Stopped);
  }

  #[test]
  fn test_refill_picks_up_newly_due_learning_card() {
    let store = deck(1);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    assert_eq!(s.state(), SessionState::Empty);

    // Second step is ten minutes out
    assert_eq!(s.refill(&store, t0() + Duration::minutes(5)).unwrap(), SessionState::Empty);
    assert_eq!(s.refill(&store, t0() + Duration::minutes(10)).unwrap(), SessionState::Running);
    let item = s.current().unwrap();
    assert_eq!(item.kind, QueueKind::DueLearning);
    assert_eq!(item.expected_version(), 1);
  }

  #[test]
  fn test_refill_respects_new_allowance() {
    let store = deck(3);
    let mut config = SrsConfig::default();
    config.new_per_session = 2;
    let mut s = StudySessionController::new(LEARNER, DECK, config);
    s.start(&store, t0()).unwrap();
    assert_eq!(order(&s), vec![1, 2]);

    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    s.grade(&store, 2, Grade::Good, t0()).unwrap();
    let later = t0() + Duration::minutes(10);
    s.refill(&store, later).unwrap();
    // Card 3 stays out, the two learning cards come back
    assert_eq!(order(&s), vec![1, 2]);
    assert_eq!(s.stats().admitted_new, 2);
    assert_eq!(s.stats().admitted_due, 0);
  }

  #[test]
  fn test_refill_keeps_pending_items_without_duplicates() {
    let store = deck(3);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Again, t0()).unwrap();
    let before = order(&s);
    s.refill(&store, t0() + Duration::minutes(1)).unwrap();
    assert_eq!(order(&s), before);
  }

  #[test]
  fn test_refill_puts_due_learning_ahead_of_pending_new() {
    let store = deck(5);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    assert_eq!(order(&s), vec![2, 3, 4, 5]);

    s.refill(&store, t0() + Duration::minutes(11)).unwrap();
    assert_eq!(order(&s), vec![1, 2, 3, 4, 5]);
    assert_eq!(s.current().unwrap().kind, QueueKind::DueLearning);
  }

  #[test]
  fn test_refill_keeps_requeued_gap() {
    let store = deck(6);
    let mut s = session();
    s.start(&store, t0()).unwrap();
    s.grade(&store, 1, Grade::Good, t0()).unwrap();
    s.grade(&store, 2, Grade::Again, t0()).unwrap();
    assert_eq!(order(&s), vec![3, 4, 5, 2, 6]);

    // Card 1 is due again; card 2 stays three items behind the head
    s.refill(&store, t0() + Duration::minutes(11)).unwrap();
    assert_eq!(order(&s), vec![1, 3, 4, 2, 5, 6]);

    // Once graded, a formerly requeued card sorts like any other
    s.grade(&store, 1, Grade::Good, t0() + Duration::minutes(11)).unwrap();
    s.grade(&store, 3, Grade::Good, t0() + Duration::minutes(11)).unwrap();
    s.grade(&store, 4, Grade::Good, t0() + Duration::minutes(11)).unwrap();
    s.grade(&store, 2, Grade::Good, t0() + Duration::minutes(11)).unwrap();
    assert_eq!(order(&s), vec![5, 6]);
  }

  #[test]
  fn test_review_allowance_limits_due_cards() {
    let store = deck(3);
    for id in 1..=3 {
      let mut r = ReviewRecord::fresh(LEARNER, id, 2.5, t0() - Duration::days(10));
      r.state = ReviewState::Review {
        interval_days: 2,
        repetitions: 1,
      };
      r.next_review_at = t0() - Duration::days(id);
      store.save_review_record(&r, 0).unwrap();
    }
    let mut config = SrsConfig::default();
    config.review_per_session = 2;
    let mut s = StudySessionController::new(LEARNER, DECK, config);
    s.start(&store, t0()).unwrap();
    // Most overdue first
    assert_eq!(order(&s), vec![3, 2]);
  }
}
