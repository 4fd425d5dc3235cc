//! Fatal, developer-facing errors.
//!
//! Everything a *user's* malformed input can trigger is a [`Diagnostic`]
//! (`crate::stage`), never an `Err`. The two conditions below indicate
//! a bug in a language implementation (an unbalanced event stream, or a
//! misused tombstone), not in the input being parsed, so they fail
//! loudly rather than being swallowed.
//!
//! [`Diagnostic`]: crate::stage::Diagnostic

use thiserror::Error;

/// Fatal construction-time errors from the event-stream builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// A `StartNode` was never matched by a `FinishNode`, or vice versa.
    #[error("unbalanced event stream: {0}")]
    Unbalanced(String),

    /// `start_at` was called with an index that is not a reserved
    /// tombstone slot.
    #[error("mark {index} is not a pending tombstone")]
    InvalidMark { index: usize },

    /// `start_at` or tombstone reservation was given an out-of-range
    /// index.
    #[error("mark index {index} is out of range (event buffer has {len} events)")]
    MarkOutOfRange { index: usize, len: usize },
}
