pub mod card;
pub mod review;

pub use card::Card;
pub use review::{
  Grade, PersistedReviewRecord, QueueType, ReviewRecord, ReviewState, Status, MIN_EASE_FACTOR,
};
