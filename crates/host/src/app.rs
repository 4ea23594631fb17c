//! Host application state and the event loop.
//!
//! Input and frame ticks arrive as [`HostEvent`]s on one channel and are
//! handled in order on the loop task. A push runs a nested loop on the same
//! channel until the animator reports its outcome, so the transition
//! context can borrow the card screen for the whole run.

use crate::config::Config;
use crate::navigation::NavigationStack;
use crate::screen::{CardCollectionScreen, DetailScreen};
use cardflow_core_layout::{Rect, Size};
use cardflow_transition::{
    AnimatedTransitioning, AnimatorState, CardToDetailAnimator, TransitionContext,
    TransitionError, TransitionOutcome, TransitionSource, ViewTree,
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events that the host event loop processes.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Drag movement on the paging surface.
    Drag { dx: f64 },
    /// Drag released with a horizontal velocity (points per second).
    EndDrag { velocity: f64 },
    /// Drag by whole pages and release.
    Swipe { pages: i64 },
    /// The window changed size.
    Resize { size: Size },
    /// The card size changed (e.g. a text size change).
    ResizeCards { size: Size },
    /// Open the centered card.
    Select,
    /// Abandon the running interactive transition.
    Cancel,
    /// Go back one screen.
    Pop,
    /// Animation frame.
    FrameTick,
    /// Shutdown signal.
    Shutdown,
}

/// Summary of a run, printed with `--report`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub page: usize,
    pub grid_offset_x: f64,
    pub centered_index: Option<usize>,
    pub begin_frame: Option<Rect>,
    pub outcome: Option<TransitionOutcome>,
    pub frames: u32,
    pub animator_state: AnimatorState,
    pub navigation_depth: usize,
}

/// Everything the host owns.
pub struct App {
    config: Config,
    tree: ViewTree,
    cards: CardCollectionScreen,
    detail: DetailScreen,
    nav: NavigationStack,
    animator: CardToDetailAnimator,
    report: RunReport,
}

/// Result of one push run.
struct PushRun {
    outcome: TransitionOutcome,
    shutdown_requested: bool,
}

impl App {
    /// Build the view tree, screens and navigation stack from a validated
    /// configuration.
    pub fn new(config: Config) -> Result<Self, TransitionError> {
        let window = config.layout.window_size();
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, window.width, window.height));
        let cards = CardCollectionScreen::new(
            &mut tree,
            window,
            config.layout.card_layout(),
            config.layout.page_count,
            config.chrome.geometry(),
        )?;
        let detail = DetailScreen::new(&mut tree, window);
        let nav = NavigationStack::new(&mut tree, cards.root())?;
        let animator = config.transition.animator();

        Ok(Self {
            config,
            tree,
            cards,
            detail,
            nav,
            animator,
            report: RunReport::default(),
        })
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn cards(&self) -> &CardCollectionScreen {
        &self.cards
    }

    pub fn detail(&self) -> &DetailScreen {
        &self.detail
    }

    pub fn navigation(&self) -> &NavigationStack {
        &self.nav
    }

    pub fn animator(&self) -> &CardToDetailAnimator {
        &self.animator
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.config.behavior.frame_interval_ms)
    }

    /// Process events until `Shutdown` or until every sender is gone.
    /// `frame_tx` feeds the frame timer.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<HostEvent>,
        frame_tx: mpsc::Sender<HostEvent>,
    ) -> RunReport {
        while let Some(event) = events.recv().await {
            match event {
                HostEvent::Select => {
                    if self.nav.top() != Some(self.cards.root()) {
                        debug!("Ignoring select: card screen is not on top");
                        continue;
                    }
                    if self.cards.centered_item().is_none() {
                        warn!("Ignoring select: no card is centered");
                        continue;
                    }
                    match self.run_push(&mut events, &frame_tx).await {
                        Ok(run) => {
                            debug!("Push settled: {:?}", run.outcome);
                            if run.shutdown_requested {
                                info!("Shutdown requested during transition");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to settle transition: {}", e),
                    }
                }
                HostEvent::Shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                HostEvent::FrameTick => {
                    debug!("Stray frame tick outside a transition");
                }
                HostEvent::Cancel => {
                    debug!("Ignoring cancel: no transition in flight");
                }
                other => {
                    if let Err(e) = self.handle_input(other) {
                        warn!("Failed to handle input: {}", e);
                    }
                }
            }
        }

        self.finish_report()
    }

    /// Gesture and navigation input outside a transition.
    fn handle_input(&mut self, event: HostEvent) -> Result<(), TransitionError> {
        match event {
            HostEvent::Drag { dx } => self.cards.drag_by(&mut self.tree, dx)?,
            HostEvent::EndDrag { velocity } => {
                let page = self.cards.end_drag(&mut self.tree, velocity)?;
                debug!("Drag ended on page {}", page);
            }
            HostEvent::Swipe { pages } => {
                let page = self.cards.swipe(&mut self.tree, pages)?;
                info!("Swiped {} page(s), now on page {}", pages, page);
            }
            HostEvent::Resize { size } => {
                self.cards.resize(&mut self.tree, size)?;
                let bounds = Rect::new(0.0, 0.0, size.width, size.height);
                self.tree.set_frame(self.tree.root(), bounds)?;
                self.tree.set_frame(self.detail.root(), bounds)?;
                info!("Resized to {}x{}", size.width, size.height);
            }
            HostEvent::ResizeCards { size } => {
                self.cards.set_card_size(&mut self.tree, size)?;
                info!("Cards resized to {}x{}", size.width, size.height);
            }
            HostEvent::Pop => {
                self.nav.pop(&mut self.tree)?;
            }
            HostEvent::Select | HostEvent::Cancel | HostEvent::FrameTick | HostEvent::Shutdown => {}
        }
        Ok(())
    }

    /// Push the detail screen with the card transition and drive it to its
    /// end on this task.
    async fn run_push(
        &mut self,
        events: &mut mpsc::Receiver<HostEvent>,
        frame_tx: &mpsc::Sender<HostEvent>,
    ) -> Result<PushRun, TransitionError> {
        let interval = self.frame_interval();
        let Self {
            tree,
            cards,
            detail,
            nav,
            animator,
            report,
            ..
        } = self;
        let source: &CardCollectionScreen = cards;

        report.centered_index = source.centered_item().map(|c| c.index);
        report.begin_frame = source.begin_frame_for_transition().ok();

        let duration = AnimatedTransitioning::<CardCollectionScreen>::transition_duration(
            &*animator, None,
        );
        let mut ctx = TransitionContext::new(source, detail.root(), nav.container(), duration)
            .interactive(true);
        animator.animate_transition(&mut ctx, tree);

        let timer = start_frame_timer(frame_tx.clone(), interval);
        let mut shutdown_requested = false;
        let mut outcome = None;

        while outcome.is_none() {
            let Some(event) = events.recv().await else {
                break;
            };
            match event {
                HostEvent::FrameTick => {
                    report.frames += 1;
                    outcome = animator.tick(interval, &mut ctx, tree);
                }
                HostEvent::Cancel => {
                    if ctx.cancel() {
                        info!("Transition cancelled by user");
                    }
                }
                HostEvent::Shutdown => {
                    debug!("Deferring shutdown until the transition settles");
                    shutdown_requested = true;
                }
                other => {
                    debug!("Ignoring {:?} while transition is in flight", other);
                }
            }
        }
        timer.abort();

        // Channel closed mid-flight: finish the spring without waiting.
        while outcome.is_none() && animator.is_animating() {
            outcome = animator.tick(interval, &mut ctx, tree);
        }
        let outcome = outcome
            .or_else(|| ctx.outcome())
            .unwrap_or(TransitionOutcome::Cancelled);
        drop(ctx);

        nav.commit(outcome, detail.root(), tree)?;
        report.outcome = Some(outcome);
        Ok(PushRun {
            outcome,
            shutdown_requested,
        })
    }

    fn finish_report(mut self) -> RunReport {
        self.report.page = self.cards.paging().current_page();
        self.report.grid_offset_x = self.cards.grid().content_offset().x;
        if self.report.centered_index.is_none() {
            self.report.centered_index = self.cards.centered_item().map(|c| c.index);
        }
        self.report.animator_state = self.animator.state();
        self.report.navigation_depth = self.nav.depth();
        self.report
    }
}

/// Spawn the frame timer for one transition. Aborted by the caller once
/// the transition settles.
fn start_frame_timer(tx: mpsc::Sender<HostEvent>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            if tx.send(HostEvent::FrameTick).await.is_err() {
                break; // Channel closed
            }
        }
    })
}

/// Scripted input: page swipes, then opening the centered card, optionally
/// abandoning the transition after a delay.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub swipes: Vec<i64>,
    pub cancel_after: Option<Duration>,
}

impl Scenario {
    pub async fn play(self, tx: mpsc::Sender<HostEvent>) {
        for pages in self.swipes {
            if tx.send(HostEvent::Swipe { pages }).await.is_err() {
                return;
            }
        }
        if tx.send(HostEvent::Select).await.is_err() {
            return;
        }
        if let Some(delay) = self.cancel_after {
            tokio::time::sleep(delay).await;
            if tx.send(HostEvent::Cancel).await.is_err() {
                return;
            }
        }
        let _ = tx.send(HostEvent::Shutdown).await;
    }
}
