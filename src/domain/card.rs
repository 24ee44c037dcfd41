use serde::{Deserialize, Serialize};

/// Immutable flashcard content owned by a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id: i64,
  pub deck_id: i64,
  pub front: String,
  pub back: String,
  pub example: Option<String>,
  /// Reference to an audio clip (path or URL), resolved by the UI
  pub audio_ref: Option<String>,
  /// Explicit deck ordering; ties fall back to id (creation order)
  pub position: i64,
}

impl Card {
  pub fn new(deck_id: i64, front: String, back: String) -> Self {
    Self {
      id: 0,
      deck_id,
      front,
      back,
      example: None,
      audio_ref: None,
      position: 0,
    }
  }

  pub fn with_example(mut self, example: impl Into<String>) -> Self {
    self.example = Some(example.into());
    self
  }

  pub fn with_audio(mut self, audio_ref: impl Into<String>) -> Self {
    self.audio_ref = Some(audio_ref.into());
    self
  }

  pub fn at_position(mut self, position: i64) -> Self {
    self.position = position;
    self
  }

  /// Sort key for deck-defined order
  pub fn deck_order(&self) -> (i64, i64) {
    (self.position, self.id)
  }
}
