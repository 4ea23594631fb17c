//! Owned view tree.
//!
//! Views live in an arena keyed by [`ViewId`]. Parent/child links are ids,
//! so there are no reference cycles; mounting a view into a container and
//! unmounting it again are plain id-list edits.

use crate::TransitionError;
use cardflow_core_layout::{ItemIndex, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a view in a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a view represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewKind {
    /// The root window; also the transition container.
    Window,
    /// The root view of a screen.
    Screen { name: String },
    /// A card cell in the grid.
    Card { index: ItemIndex },
    /// A static, non-interactive copy of another view.
    Snapshot { of: ViewId },
    /// Any other container view.
    Plain,
}

/// A single view description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub kind: ViewKind,
    /// Frame in the parent's coordinates.
    pub frame: Rect,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    pub hidden: bool,
    pub user_interaction_enabled: bool,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
}

impl ViewNode {
    fn new(kind: ViewKind, frame: Rect) -> Self {
        Self {
            kind,
            frame,
            alpha: 1.0,
            hidden: false,
            user_interaction_enabled: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    /// Children in back-to-front order.
    pub fn children(&self) -> &[ViewId] {
        &self.children
    }
}

/// Arena of views rooted at a window.
#[derive(Debug, Clone)]
pub struct ViewTree {
    nodes: HashMap<ViewId, ViewNode>,
    root: ViewId,
    next_id: u64,
}

impl ViewTree {
    /// Create a tree whose root window has the given frame.
    pub fn new(window_frame: Rect) -> Self {
        let root = ViewId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, ViewNode::new(ViewKind::Window, window_frame));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// The root window.
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Number of views in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a detached view.
    pub fn insert(&mut self, kind: ViewKind, frame: Rect) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, ViewNode::new(kind, frame));
        id
    }

    pub fn get(&self, id: ViewId) -> Option<&ViewNode> {
        self.nodes.get(&id)
    }

    /// Look up a view, failing if it does not exist.
    pub fn node(&self, id: ViewId) -> Result<&ViewNode, TransitionError> {
        self.nodes.get(&id).ok_or(TransitionError::ViewNotFound(id))
    }

    fn node_mut(&mut self, id: ViewId) -> Result<&mut ViewNode, TransitionError> {
        self.nodes.get_mut(&id).ok_or(TransitionError::ViewNotFound(id))
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Children of a view in back-to-front order (empty if unknown).
    pub fn children(&self, id: ViewId) -> &[ViewId] {
        match self.nodes.get(&id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = Some(id);
        while let Some(view) = current {
            if view == ancestor {
                return true;
            }
            current = self.parent(view);
        }
        false
    }

    /// Whether the view is attached, directly or through its ancestors,
    /// to the root window.
    pub fn is_in_hierarchy(&self, id: ViewId) -> bool {
        self.contains(id) && self.is_ancestor_or_self(self.root, id)
    }

    /// Add `child` as the frontmost subview of `parent`, detaching it from
    /// any previous parent first.
    pub fn mount(&mut self, parent: ViewId, child: ViewId) -> Result<(), TransitionError> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TransitionError::InvalidMount { parent, child });
        }
        self.unmount(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove a view from its parent. The view stays in the arena.
    pub fn unmount(&mut self, child: ViewId) -> Result<(), TransitionError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != child);
        }
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Unmount a view and drop it and its subtree from the arena.
    pub fn discard(&mut self, id: ViewId) -> Result<(), TransitionError> {
        if id == self.root {
            return Err(TransitionError::InvalidMount {
                parent: self.root,
                child: id,
            });
        }
        self.unmount(id)?;
        let mut pending = vec![id];
        while let Some(view) = pending.pop() {
            if let Some(node) = self.nodes.remove(&view) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    /// Take a static copy of a view currently on screen.
    ///
    /// The snapshot is detached, non-interactive, and has the source's frame
    /// and opacity. The source is left untouched.
    pub fn snapshot(&mut self, source: ViewId) -> Result<ViewId, TransitionError> {
        if !self.is_in_hierarchy(source) {
            return Err(if self.contains(source) {
                TransitionError::NotInHierarchy(source)
            } else {
                TransitionError::ViewNotFound(source)
            });
        }
        let (frame, alpha) = {
            let node = self.node(source)?;
            (node.frame, node.alpha)
        };
        let id = self.insert(ViewKind::Snapshot { of: source }, frame);
        let snapshot = self.node_mut(id)?;
        snapshot.alpha = alpha;
        snapshot.user_interaction_enabled = false;
        Ok(id)
    }

    pub fn frame(&self, id: ViewId) -> Result<Rect, TransitionError> {
        Ok(self.node(id)?.frame)
    }

    pub fn set_frame(&mut self, id: ViewId, frame: Rect) -> Result<(), TransitionError> {
        self.node_mut(id)?.frame = frame;
        Ok(())
    }

    /// The view's own coordinate space: origin zero, frame size.
    pub fn bounds(&self, id: ViewId) -> Result<Rect, TransitionError> {
        Ok(self.node(id)?.frame.bounds())
    }

    pub fn alpha(&self, id: ViewId) -> Result<f64, TransitionError> {
        Ok(self.node(id)?.alpha)
    }

    pub fn set_alpha(&mut self, id: ViewId, alpha: f64) -> Result<(), TransitionError> {
        self.node_mut(id)?.alpha = alpha.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_hidden(&mut self, id: ViewId, hidden: bool) -> Result<(), TransitionError> {
        self.node_mut(id)?.hidden = hidden;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ViewTree {
        ViewTree::new(Rect::new(0.0, 0.0, 300.0, 600.0))
    }

    #[test]
    fn test_mount_and_unmount() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.insert(ViewKind::Plain, Rect::default());
        let b = tree.insert(ViewKind::Plain, Rect::default());

        tree.mount(root, a).unwrap();
        tree.mount(root, b).unwrap();
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(a), Some(root));

        tree.unmount(a).unwrap();
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.parent(a), None);
        assert!(tree.contains(a));
    }

    #[test]
    fn test_remount_moves_to_front() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.insert(ViewKind::Plain, Rect::default());
        let b = tree.insert(ViewKind::Plain, Rect::default());
        tree.mount(root, a).unwrap();
        tree.mount(root, b).unwrap();

        tree.mount(root, a).unwrap();
        assert_eq!(tree.children(root), &[b, a]);
    }

    #[test]
    fn test_mount_rejects_cycles() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.insert(ViewKind::Plain, Rect::default());
        let b = tree.insert(ViewKind::Plain, Rect::default());
        tree.mount(root, a).unwrap();
        tree.mount(a, b).unwrap();

        assert_eq!(
            tree.mount(b, a),
            Err(TransitionError::InvalidMount { parent: b, child: a })
        );
        assert_eq!(
            tree.mount(a, a),
            Err(TransitionError::InvalidMount { parent: a, child: a })
        );
    }

    #[test]
    fn test_hierarchy_membership() {
        let mut tree = tree();
        let root = tree.root();
        let screen = tree.insert(ViewKind::Screen { name: "cards".into() }, Rect::default());
        let card = tree.insert(ViewKind::Card { index: 0 }, Rect::default());
        tree.mount(screen, card).unwrap();
        assert!(!tree.is_in_hierarchy(card));

        tree.mount(root, screen).unwrap();
        assert!(tree.is_in_hierarchy(card));
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut tree = tree();
        let root = tree.root();
        let card = tree.insert(ViewKind::Card { index: 2 }, Rect::new(25.0, 0.0, 250.0, 500.0));
        tree.mount(root, card).unwrap();

        let snap = tree.snapshot(card).unwrap();
        let node = tree.node(snap).unwrap();
        assert_eq!(node.kind, ViewKind::Snapshot { of: card });
        assert_eq!(node.frame, Rect::new(25.0, 0.0, 250.0, 500.0));
        assert!(!node.user_interaction_enabled);
        assert_eq!(node.parent(), None);
        assert_eq!(tree.children(root), &[card]);
    }

    #[test]
    fn test_snapshot_requires_hierarchy() {
        let mut tree = tree();
        let loose = tree.insert(ViewKind::Card { index: 0 }, Rect::default());
        assert_eq!(tree.snapshot(loose), Err(TransitionError::NotInHierarchy(loose)));

        let before = tree.len();
        tree.discard(loose).unwrap();
        assert_eq!(tree.len(), before - 1);
        assert_eq!(tree.snapshot(loose), Err(TransitionError::ViewNotFound(loose)));
    }

    #[test]
    fn test_discard_removes_subtree() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.insert(ViewKind::Plain, Rect::default());
        let b = tree.insert(ViewKind::Plain, Rect::default());
        tree.mount(root, a).unwrap();
        tree.mount(a, b).unwrap();

        tree.discard(a).unwrap();
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert!(tree.children(root).is_empty());
        assert!(tree.discard(root).is_err());
    }

    #[test]
    fn test_alpha_is_clamped() {
        let mut tree = tree();
        let a = tree.insert(ViewKind::Plain, Rect::default());
        tree.set_alpha(a, 1.4).unwrap();
        assert_eq!(tree.alpha(a).unwrap(), 1.0);
        tree.set_alpha(a, -0.2).unwrap();
        assert_eq!(tree.alpha(a).unwrap(), 0.0);
    }
}
