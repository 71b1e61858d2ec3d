//! Bootstrap state machine.
//!
//! # State Transitions
//! ```text
//! Unvalidated → Validated → AwaitingReady → Acquiring → Ready
//!                   │              │             │
//!                   └──────────────┴─────────────┴──→ Failed
//! ```
//!
//! `Ready` and `Failed` are terminal; there is no way back out of `Failed`.

use std::fmt;

/// Where a coordinator is in its single bootstrap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Unvalidated,
    Validated,
    AwaitingReady,
    Acquiring,
    Ready,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Unvalidated, Validated)
                | (Unvalidated, Failed)
                | (Validated, AwaitingReady)
                | (Validated, Failed)
                | (AwaitingReady, Acquiring)
                | (AwaitingReady, Failed)
                | (Acquiring, Ready)
                | (Acquiring, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Unvalidated => "unvalidated",
            Phase::Validated => "validated",
            Phase::AwaitingReady => "awaiting_ready",
            Phase::Acquiring => "acquiring",
            Phase::Ready => "ready",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
