pub mod queue;
pub mod scheduler;
pub mod session;

pub use queue::{
  build_queue, due_counts, next_due_at, split_by_record, DueCounts, QueueKind, QueueLimits,
  StudyItem,
};
pub use scheduler::{preview, schedule};
pub use session::{GradeOutcome, SessionState, SessionStats, StudySessionController};
