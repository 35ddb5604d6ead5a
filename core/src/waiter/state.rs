use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a polling session.
///
/// `Waiting` is the only non-terminal state; once a session leaves it
/// no further transition occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum State {
    Waiting,
    /// Predicate held and the ready callback was invoked
    Fired,
    /// Timeout elapsed before the predicate held
    TimedOut,
    /// Cancelled through the session handle
    Cancelled,
    /// Predicate failed or panicked
    Failed,
}

impl State {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, State::Waiting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Waiting => "waiting",
            State::Fired => "fired",
            State::TimedOut => "timedOut",
            State::Cancelled => "cancelled",
            State::Failed => "failed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
