//! Card-to-detail transition animator.
//!
//! Snapshots the centered card, mounts the (transparent) detail screen and
//! the snapshot into the transition container, then springs the snapshot
//! from its begin frame to the detail screen's bounds while fading the
//! detail screen in.
//!
//! State machine: `Idle -> Preparing -> Animating -> {Completed, Cancelled}`.
//! A finished animator may start a new transition with a fresh context; it
//! keeps nothing from the previous run.

use crate::{
    AnimatedTransitioning, SpringCurve, TransitionContext, TransitionError, TransitionOutcome,
    TransitionSource, ViewId, ViewTree, DEFAULT_DAMPING_RATIO, DEFAULT_DURATION,
    DEFAULT_INITIAL_VELOCITY,
};
use cardflow_core_layout::Rect;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Lifecycle of the animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimatorState {
    #[default]
    Idle,
    /// Collecting the source view, begin frame and snapshot.
    Preparing,
    /// Spring running; completion pending.
    Animating,
    /// Last run finished and was reported as completed.
    Completed,
    /// Last run finished and was reported as cancelled.
    Cancelled,
}

/// Per-run state, dropped when the run ends.
#[derive(Debug, Clone, Copy)]
struct ActiveTransition {
    snapshot: ViewId,
    destination: ViewId,
    begin: Rect,
    end: Rect,
    curve: SpringCurve,
    elapsed: Duration,
}

/// Animator for the push from the card carousel to the detail screen.
#[derive(Debug, Clone)]
pub struct CardToDetailAnimator {
    duration: Duration,
    damping_ratio: f64,
    initial_velocity: f64,
    state: AnimatorState,
    active: Option<ActiveTransition>,
}

impl Default for CardToDetailAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION, DEFAULT_DAMPING_RATIO, DEFAULT_INITIAL_VELOCITY)
    }
}

impl CardToDetailAnimator {
    pub fn new(duration: Duration, damping_ratio: f64, initial_velocity: f64) -> Self {
        Self {
            duration,
            damping_ratio,
            initial_velocity,
            state: AnimatorState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    /// Whether a transition is currently in flight.
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// The snapshot view of the running transition, if any.
    pub fn snapshot_view(&self) -> Option<ViewId> {
        self.active.map(|a| a.snapshot)
    }

    /// Start a transition, returning a typed error if the source cannot
    /// provide what the animation needs.
    ///
    /// All fallible queries happen before the tree is touched, so on error
    /// the container's children and the destination's opacity are unchanged.
    pub fn try_animate_transition<S: TransitionSource + ?Sized>(
        &mut self,
        ctx: &mut TransitionContext<'_, S>,
        tree: &mut ViewTree,
    ) -> Result<(), TransitionError> {
        if self.active.is_some() {
            return Err(TransitionError::AlreadyRunning);
        }
        let previous = self.state;
        self.state = AnimatorState::Preparing;

        let prepared = Self::prepare(ctx, tree);
        let (card_view, begin) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.state = previous;
                return Err(e);
            }
        };

        // Everything below mutates the tree.
        let snapshot = match tree.snapshot(card_view) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.state = previous;
                return Err(e);
            }
        };
        let end = match Self::mount_views(ctx, tree, snapshot, begin) {
            Ok(end) => end,
            Err(e) => {
                if let Err(discard_err) = tree.discard(snapshot) {
                    warn!("Failed to discard snapshot {}: {}", snapshot, discard_err);
                }
                self.state = previous;
                return Err(e);
            }
        };

        let curve = SpringCurve::new(ctx.duration(), self.damping_ratio, self.initial_velocity);
        info!(
            "Card transition started: snapshot {} from ({}, {}) {}x{} to {}x{}, {:?}",
            snapshot,
            begin.x,
            begin.y,
            begin.width,
            begin.height,
            end.width,
            end.height,
            curve.duration()
        );

        self.active = Some(ActiveTransition {
            snapshot,
            destination: ctx.destination(),
            begin,
            end,
            curve,
            elapsed: Duration::ZERO,
        });
        self.state = AnimatorState::Animating;
        Ok(())
    }

    /// Read-only checks: source view, begin frame, and that every view the
    /// run will touch exists.
    fn prepare<S: TransitionSource + ?Sized>(
        ctx: &TransitionContext<'_, S>,
        tree: &ViewTree,
    ) -> Result<(ViewId, Rect), TransitionError> {
        let source = ctx.source();
        let card_view = source.view_for_transition()?;
        let begin = source.begin_frame_for_transition()?;

        tree.node(ctx.container())?;
        tree.node(ctx.destination())?;
        if !tree.is_in_hierarchy(card_view) {
            return Err(if tree.contains(card_view) {
                TransitionError::NotInHierarchy(card_view)
            } else {
                TransitionError::ViewNotFound(card_view)
            });
        }
        debug!("Transition prepared: card view {}, begin frame {:?}", card_view, begin);
        Ok((card_view, begin))
    }

    /// Mount the transparent destination, then the snapshot above it at the
    /// begin frame. Returns the destination bounds the snapshot animates to.
    fn mount_views<S: TransitionSource + ?Sized>(
        ctx: &TransitionContext<'_, S>,
        tree: &mut ViewTree,
        snapshot: ViewId,
        begin: Rect,
    ) -> Result<Rect, TransitionError> {
        tree.set_frame(snapshot, begin)?;
        tree.mount(ctx.container(), ctx.destination())?;
        tree.mount(ctx.container(), snapshot)?;
        tree.set_alpha(ctx.destination(), 0.0)?;
        tree.bounds(ctx.destination())
    }

    /// Resolve the terminal state: destination opaque, snapshot at the
    /// destination bounds then removed. Identical for both outcomes.
    fn finish<S: TransitionSource + ?Sized>(
        &mut self,
        active: ActiveTransition,
        ctx: &mut TransitionContext<'_, S>,
        tree: &mut ViewTree,
    ) -> TransitionOutcome {
        if let Err(e) = tree.set_frame(active.snapshot, active.end) {
            warn!("Failed to place snapshot at final frame: {}", e);
        }
        if let Err(e) = tree.set_alpha(active.destination, 1.0) {
            warn!("Failed to make destination opaque: {}", e);
        }
        if let Err(e) = tree.discard(active.snapshot) {
            warn!("Failed to discard snapshot {}: {}", active.snapshot, e);
        }

        let outcome = TransitionOutcome::from_completed(!ctx.transition_was_cancelled());
        if let Err(e) = ctx.complete_transition(outcome.is_completed()) {
            warn!("Transition context rejected completion: {}", e);
        }

        self.state = match outcome {
            TransitionOutcome::Completed => AnimatorState::Completed,
            TransitionOutcome::Cancelled => AnimatorState::Cancelled,
        };
        info!("Card transition finished: {:?} after {:?}", outcome, active.elapsed);
        outcome
    }
}

/// Frame of the snapshot `elapsed` into a run. Exactly `end` once the curve
/// has finished.
pub fn snapshot_frame_at(begin: &Rect, end: &Rect, curve: &SpringCurve, elapsed: Duration) -> Rect {
    if curve.is_finished(elapsed) {
        return *end;
    }
    begin.lerp(end, curve.progress(elapsed))
}

impl<S: TransitionSource + ?Sized> AnimatedTransitioning<S> for CardToDetailAnimator {
    fn transition_duration(&self, _ctx: Option<&TransitionContext<'_, S>>) -> Duration {
        self.duration
    }

    /// Start the transition. A source that cannot provide its view or begin
    /// frame means the animator was wired to the wrong screen; that is a
    /// programming error and aborts.
    fn animate_transition(&mut self, ctx: &mut TransitionContext<'_, S>, tree: &mut ViewTree) {
        if let Err(e) = self.try_animate_transition(ctx, tree) {
            error!("Card transition cannot start: {}", e);
            panic!("card-to-detail transition requires a centered card source: {e}");
        }
    }

    fn tick(
        &mut self,
        dt: Duration,
        ctx: &mut TransitionContext<'_, S>,
        tree: &mut ViewTree,
    ) -> Option<TransitionOutcome> {
        let active = self.active.as_mut()?;
        active.elapsed += dt;

        if active.curve.is_finished(active.elapsed) {
            let active = *active;
            self.active = None;
            return Some(self.finish(active, ctx, tree));
        }

        let progress = active.curve.progress(active.elapsed);
        let frame = snapshot_frame_at(&active.begin, &active.end, &active.curve, active.elapsed);
        if let Err(e) = tree.set_frame(active.snapshot, frame) {
            warn!("Failed to move snapshot: {}", e);
        }
        if let Err(e) = tree.set_alpha(active.destination, progress) {
            warn!("Failed to fade destination: {}", e);
        }
        None
    }

    fn is_animating(&self) -> bool {
        CardToDetailAnimator::is_animating(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewKind;
    use cardflow_core_layout::LayoutError;

    const FRAME: Duration = Duration::from_millis(16);

    struct CardSource {
        view: ViewId,
        begin: Option<Rect>,
    }

    impl TransitionSource for CardSource {
        fn view_for_transition(&self) -> Result<ViewId, TransitionError> {
            Ok(self.view)
        }

        fn begin_frame_for_transition(&self) -> Result<Rect, TransitionError> {
            self.begin.ok_or(TransitionError::Layout(LayoutError::NoCenteredItem))
        }
    }

    struct Scene {
        tree: ViewTree,
        card: ViewId,
        detail: ViewId,
    }

    fn scene() -> Scene {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 600.0));
        let root = tree.root();
        let screen = tree.insert(
            ViewKind::Screen { name: "cards".into() },
            Rect::new(0.0, 0.0, 300.0, 600.0),
        );
        let card = tree.insert(ViewKind::Card { index: 3 }, Rect::new(25.0, 0.0, 250.0, 500.0));
        tree.mount(root, screen).unwrap();
        tree.mount(screen, card).unwrap();
        let detail = tree.insert(
            ViewKind::Screen { name: "detail".into() },
            Rect::new(0.0, 0.0, 300.0, 600.0),
        );
        Scene { tree, card, detail }
    }

    fn run_to_end<S: TransitionSource>(
        animator: &mut CardToDetailAnimator,
        ctx: &mut TransitionContext<'_, S>,
        tree: &mut ViewTree,
    ) -> TransitionOutcome {
        for _ in 0..1000 {
            if let Some(outcome) = animator.tick(FRAME, ctx, tree) {
                return outcome;
            }
        }
        panic!("transition never finished");
    }

    #[test]
    fn test_setup_mounts_destination_then_snapshot() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource {
            view: card,
            begin: Some(Rect::new(25.0, 44.0, 250.0, 500.0)),
        };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();

        animator.try_animate_transition(&mut ctx, &mut tree).unwrap();
        assert_eq!(animator.state(), AnimatorState::Animating);

        let snapshot = animator.snapshot_view().unwrap();
        let children = tree.children(root);
        assert_eq!(&children[children.len() - 2..], &[detail, snapshot]);
        assert_eq!(tree.alpha(detail).unwrap(), 0.0);
        assert_eq!(tree.frame(snapshot).unwrap(), Rect::new(25.0, 44.0, 250.0, 500.0));
        assert!(!ctx.is_finished());
    }

    #[test]
    fn test_completed_terminal_state() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource {
            view: card,
            begin: Some(Rect::new(25.0, 44.0, 250.0, 500.0)),
        };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();
        animator.try_animate_transition(&mut ctx, &mut tree).unwrap();
        let snapshot = animator.snapshot_view().unwrap();

        // Mid-flight: destination partially faded in.
        animator.tick(Duration::from_millis(100), &mut ctx, &mut tree);
        let alpha = tree.alpha(detail).unwrap();
        assert!(alpha > 0.0 && alpha <= 1.0);

        let outcome = run_to_end(&mut animator, &mut ctx, &mut tree);
        assert_eq!(outcome, TransitionOutcome::Completed);
        assert_eq!(ctx.outcome(), Some(TransitionOutcome::Completed));
        assert_eq!(animator.state(), AnimatorState::Completed);
        assert_eq!(tree.alpha(detail).unwrap(), 1.0);
        assert!(!tree.contains(snapshot));
        assert_eq!(tree.children(root).last(), Some(&detail));
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_cancelled_terminal_state_matches_completed() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource {
            view: card,
            begin: Some(Rect::new(25.0, 44.0, 250.0, 500.0)),
        };
        let root = tree.root();
        let mut ctx =
            TransitionContext::new(&source, detail, root, DEFAULT_DURATION).interactive(true);
        let mut animator = CardToDetailAnimator::default();
        animator.try_animate_transition(&mut ctx, &mut tree).unwrap();
        let snapshot = animator.snapshot_view().unwrap();

        animator.tick(FRAME, &mut ctx, &mut tree);
        assert!(ctx.cancel());

        let outcome = run_to_end(&mut animator, &mut ctx, &mut tree);
        assert_eq!(outcome, TransitionOutcome::Cancelled);
        assert_eq!(ctx.outcome(), Some(TransitionOutcome::Cancelled));
        assert_eq!(animator.state(), AnimatorState::Cancelled);
        assert_eq!(tree.alpha(detail).unwrap(), 1.0);
        assert!(!tree.contains(snapshot));
    }

    #[test]
    fn test_snapshot_frame_ends_at_destination_bounds() {
        let begin = Rect::new(25.0, 44.0, 250.0, 500.0);
        let end = Rect::new(0.0, 0.0, 300.0, 600.0);
        let curve = SpringCurve::default();

        assert_eq!(snapshot_frame_at(&begin, &end, &curve, Duration::ZERO), begin);
        assert_eq!(snapshot_frame_at(&begin, &end, &curve, DEFAULT_DURATION), end);
        assert_eq!(snapshot_frame_at(&begin, &end, &curve, Duration::from_secs(1)), end);

        let near_end = snapshot_frame_at(&begin, &end, &curve, Duration::from_millis(349));
        assert!((near_end.width - end.width).abs() < 1.0);
        assert!((near_end.y - end.y).abs() < 1.0);
    }

    #[test]
    fn test_snapshot_tracks_spring_mid_flight() {
        let Scene { mut tree, card, detail } = scene();
        let begin = Rect::new(25.0, 44.0, 250.0, 500.0);
        let source = CardSource {
            view: card,
            begin: Some(begin),
        };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();
        animator.try_animate_transition(&mut ctx, &mut tree).unwrap();
        let snapshot = animator.snapshot_view().unwrap();

        let elapsed = Duration::from_millis(48);
        for _ in 0..3 {
            animator.tick(FRAME, &mut ctx, &mut tree);
        }
        let expected = snapshot_frame_at(
            &begin,
            &Rect::new(0.0, 0.0, 300.0, 600.0),
            &SpringCurve::default(),
            elapsed,
        );
        assert_eq!(tree.frame(snapshot).unwrap(), expected);
        assert_eq!(tree.parent(snapshot), Some(root));
    }

    #[test]
    fn test_missing_begin_frame_fails_before_mutation() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource { view: card, begin: None };
        let root = tree.root();
        let children_before = tree.children(root).to_vec();
        let views_before = tree.len();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();

        let err = animator.try_animate_transition(&mut ctx, &mut tree).unwrap_err();
        assert_eq!(err, TransitionError::Layout(LayoutError::NoCenteredItem));
        assert_eq!(tree.children(root), children_before.as_slice());
        assert_eq!(tree.len(), views_before);
        assert_eq!(tree.alpha(detail).unwrap(), 1.0);
        assert_eq!(animator.state(), AnimatorState::Idle);
        assert!(!ctx.is_finished());
    }

    #[test]
    #[should_panic(expected = "requires a centered card source")]
    fn test_missing_begin_frame_is_fatal() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource { view: card, begin: None };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();
        animator.animate_transition(&mut ctx, &mut tree);
    }

    #[test]
    fn test_source_view_must_be_on_screen() {
        let Scene { mut tree, detail, .. } = scene();
        let loose = tree.insert(ViewKind::Card { index: 0 }, Rect::default());
        let source = CardSource {
            view: loose,
            begin: Some(Rect::default()),
        };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();
        assert_eq!(
            animator.try_animate_transition(&mut ctx, &mut tree),
            Err(TransitionError::NotInHierarchy(loose))
        );
    }

    #[test]
    fn test_reentry_rejected_while_animating() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource {
            view: card,
            begin: Some(Rect::new(25.0, 44.0, 250.0, 500.0)),
        };
        let root = tree.root();
        let mut animator = CardToDetailAnimator::default();
        let mut first = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        animator.try_animate_transition(&mut first, &mut tree).unwrap();

        let mut second = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        assert_eq!(
            animator.try_animate_transition(&mut second, &mut tree),
            Err(TransitionError::AlreadyRunning)
        );
        assert_eq!(animator.state(), AnimatorState::Animating);

        run_to_end(&mut animator, &mut first, &mut tree);

        // A fresh context can start a new run once the first has finished.
        let mut third = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        animator.try_animate_transition(&mut third, &mut tree).unwrap();
        assert!(animator.is_animating());
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource { view: card, begin: None };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, DEFAULT_DURATION);
        let mut animator = CardToDetailAnimator::default();
        assert_eq!(animator.tick(FRAME, &mut ctx, &mut tree), None);
        assert!(!ctx.is_finished());
    }

    #[test]
    fn test_context_duration_drives_spring() {
        let Scene { mut tree, card, detail } = scene();
        let source = CardSource {
            view: card,
            begin: Some(Rect::new(25.0, 44.0, 250.0, 500.0)),
        };
        let root = tree.root();
        let mut ctx = TransitionContext::new(&source, detail, root, Duration::from_millis(100));
        let mut animator = CardToDetailAnimator::default();
        animator.try_animate_transition(&mut ctx, &mut tree).unwrap();

        // 6 frames is 96ms, the 7th crosses 100ms.
        for _ in 0..6 {
            assert_eq!(animator.tick(FRAME, &mut ctx, &mut tree), None);
        }
        assert_eq!(
            animator.tick(FRAME, &mut ctx, &mut tree),
            Some(TransitionOutcome::Completed)
        );
        assert_eq!(tree.alpha(detail).unwrap(), 1.0);
    }

    #[test]
    fn test_transition_duration() {
        let animator = CardToDetailAnimator::default();
        let duration =
            AnimatedTransitioning::<CardSource>::transition_duration(&animator, None);
        assert_eq!(duration, Duration::from_millis(350));
    }
}
