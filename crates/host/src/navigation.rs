//! Navigation stack: which screen is mounted in the window.

use cardflow_transition::{TransitionError, TransitionOutcome, ViewId, ViewTree};
use tracing::{debug, info};

/// Stack of screen root views. Only the top screen is mounted in the
/// container outside of a running transition.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    container: ViewId,
    screens: Vec<ViewId>,
}

impl NavigationStack {
    /// Mount `root_screen` into the tree's root window and make it the only
    /// screen on the stack.
    pub fn new(tree: &mut ViewTree, root_screen: ViewId) -> Result<Self, TransitionError> {
        let container = tree.root();
        tree.mount(container, root_screen)?;
        Ok(Self {
            container,
            screens: vec![root_screen],
        })
    }

    /// The transition container shared by every push.
    pub fn container(&self) -> ViewId {
        self.container
    }

    pub fn top(&self) -> Option<ViewId> {
        self.screens.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    pub fn screens(&self) -> &[ViewId] {
        &self.screens
    }

    /// Settle a push once the animator reported its outcome.
    ///
    /// Completed: the destination becomes the top screen and the previous
    /// one leaves the container. Cancelled: the destination is taken out
    /// again and the stack is unchanged.
    pub fn commit(
        &mut self,
        outcome: TransitionOutcome,
        destination: ViewId,
        tree: &mut ViewTree,
    ) -> Result<(), TransitionError> {
        match outcome {
            TransitionOutcome::Completed => {
                if let Some(previous) = self.top() {
                    tree.unmount(previous)?;
                }
                self.screens.push(destination);
                info!("Pushed screen {} (depth {})", destination, self.depth());
            }
            TransitionOutcome::Cancelled => {
                tree.unmount(destination)?;
                info!("Push of screen {} cancelled", destination);
            }
        }
        Ok(())
    }

    /// Pop the top screen without animation. The root screen is never
    /// popped; returns the removed screen otherwise.
    pub fn pop(&mut self, tree: &mut ViewTree) -> Result<Option<ViewId>, TransitionError> {
        if self.screens.len() <= 1 {
            debug!("Ignoring pop on root screen");
            return Ok(None);
        }
        let Some(popped) = self.screens.pop() else {
            return Ok(None);
        };
        tree.unmount(popped)?;
        if let Some(top) = self.top() {
            tree.mount(self.container, top)?;
        }
        info!("Popped screen {} (depth {})", popped, self.depth());
        Ok(Some(popped))
    }
}
