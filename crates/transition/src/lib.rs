//! Cardflow Transition
//!
//! Animated handoff from the card carousel to a full-screen detail screen.
//!
//! This crate handles:
//! - An owned tree of lightweight view nodes with mount/unmount into a container
//! - A spring timing curve (duration, damping ratio, initial velocity)
//! - The card-to-detail animator state machine
//! - The transition context shared with the navigation host

pub mod animator;
pub mod context;
pub mod spring;
pub mod view;

pub use animator::{AnimatorState, CardToDetailAnimator};
pub use context::{TransitionContext, TransitionOutcome};
pub use spring::{SpringCurve, DEFAULT_DAMPING_RATIO, DEFAULT_DURATION, DEFAULT_INITIAL_VELOCITY};
pub use view::{ViewId, ViewKind, ViewNode, ViewTree};

use cardflow_core_layout::{LayoutError, Rect};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while preparing or running a transition.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("View {0} not found")]
    ViewNotFound(ViewId),

    #[error("View {0} is not part of the visible hierarchy")]
    NotInHierarchy(ViewId),

    #[error("Cannot mount view {child} into {parent}")]
    InvalidMount { parent: ViewId, child: ViewId },

    #[error("A transition is already running on this animator")]
    AlreadyRunning,

    #[error("Transition has already reported completion")]
    AlreadyCompleted,
}

/// Capabilities a screen must offer to be the source of a card transition.
pub trait TransitionSource {
    /// The live view (card) that will be snapshotted for the animation.
    /// It must be part of the visible hierarchy.
    fn view_for_transition(&self) -> Result<ViewId, TransitionError>;

    /// The initial frame of the transitioning view in transition space,
    /// reflecting the scroll state at call time.
    fn begin_frame_for_transition(&self) -> Result<Rect, TransitionError>;
}

/// A transition provider registered with the navigation host for a push.
pub trait AnimatedTransitioning<S: TransitionSource + ?Sized> {
    /// Fixed length of the transition.
    fn transition_duration(&self, ctx: Option<&TransitionContext<'_, S>>) -> Duration;

    /// Start the transition. Returns immediately; completion is reported to
    /// the context exactly once from a later [`tick`](Self::tick).
    fn animate_transition(&mut self, ctx: &mut TransitionContext<'_, S>, tree: &mut ViewTree);

    /// Advance the running transition by one frame. Returns the outcome on
    /// the frame that finishes it.
    fn tick(
        &mut self,
        dt: Duration,
        ctx: &mut TransitionContext<'_, S>,
        tree: &mut ViewTree,
    ) -> Option<TransitionOutcome>;

    /// Whether a transition is currently in flight.
    fn is_animating(&self) -> bool;
}
