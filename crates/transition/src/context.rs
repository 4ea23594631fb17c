//! Transition context owned by the navigation host for one transition.

use crate::{TransitionError, TransitionSource, ViewId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How a transition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The destination screen is now the current screen.
    Completed,
    /// The transition was abandoned; the host stays on the source screen.
    Cancelled,
}

impl TransitionOutcome {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Cancelled
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Everything the animator needs for one push transition.
///
/// Created fresh for each transition. A context that has reported
/// completion cannot be reused.
pub struct TransitionContext<'a, S: TransitionSource + ?Sized> {
    source: &'a S,
    destination: ViewId,
    container: ViewId,
    is_interactive: bool,
    duration: Duration,
    cancelled: bool,
    outcome: Option<TransitionOutcome>,
}

impl<'a, S: TransitionSource + ?Sized> TransitionContext<'a, S> {
    pub fn new(source: &'a S, destination: ViewId, container: ViewId, duration: Duration) -> Self {
        Self {
            source,
            destination,
            container,
            is_interactive: false,
            duration,
            cancelled: false,
            outcome: None,
        }
    }

    /// Mark the transition as driven by an interactive gesture that may be
    /// abandoned.
    pub fn interactive(mut self, is_interactive: bool) -> Self {
        self.is_interactive = is_interactive;
        self
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Root view of the incoming screen.
    pub fn destination(&self) -> ViewId {
        self.destination
    }

    /// Shared surface the animator mounts views into.
    pub fn container(&self) -> ViewId {
        self.container
    }

    pub fn is_interactive(&self) -> bool {
        self.is_interactive
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Abandon an interactive transition. The animation still runs to its
    /// end; only the reported outcome changes. Returns false (and does
    /// nothing) for non-interactive transitions or once finished.
    pub fn cancel(&mut self) -> bool {
        if !self.is_interactive || self.outcome.is_some() {
            debug!(
                interactive = self.is_interactive,
                finished = self.outcome.is_some(),
                "Ignoring transition cancel"
            );
            return false;
        }
        self.cancelled = true;
        true
    }

    pub fn transition_was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Report the end of the transition. May be called exactly once.
    pub fn complete_transition(&mut self, did_complete: bool) -> Result<(), TransitionError> {
        if self.outcome.is_some() {
            return Err(TransitionError::AlreadyCompleted);
        }
        self.outcome = Some(TransitionOutcome::from_completed(did_complete));
        Ok(())
    }

    /// The reported outcome, once the animator has finished.
    pub fn outcome(&self) -> Option<TransitionOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}
