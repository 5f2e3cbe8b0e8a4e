//! Overdue detection over a fetched chore list.

pub mod overdue;

pub use self::overdue::{evaluate, parse_due_time, Evaluation, DUE_TIME_FORMAT};

use thiserror::Error;

/// Malformed per-chore due times. These never abort an evaluation; the chore
/// is logged and left out.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid due time {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
