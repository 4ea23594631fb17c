//! Screens shown by the host: the card carousel and the detail screen.

use cardflow_core_layout::{
    CardGrid, CardLayout, CenteredItem, GestureOwner, LayoutError, PagingSurface, Rect,
    ScrollSyncBridge, Size, TransitionGeometry, Visibility,
};
use cardflow_transition::{TransitionError, TransitionSource, ViewId, ViewKind, ViewTree};
use tracing::{debug, trace};

/// The card carousel.
///
/// Owns the scroll-disabled grid, the hidden paging surface that receives
/// the drag gesture, and the bridge between them. Every change to the paging
/// offset goes through [`paging_did_scroll`](Self::paging_did_scroll).
#[derive(Debug)]
pub struct CardCollectionScreen {
    root: ViewId,
    grid_view: ViewId,
    cells: Vec<ViewId>,
    grid: CardGrid,
    paging: PagingSurface,
    bridge: ScrollSyncBridge,
    geometry: TransitionGeometry,
}

impl CardCollectionScreen {
    /// Build the screen's views in `tree` (detached) for a window of
    /// `window` size. The grid sits below the top chrome.
    pub fn new(
        tree: &mut ViewTree,
        window: Size,
        layout: CardLayout,
        page_count: usize,
        geometry: TransitionGeometry,
    ) -> Result<Self, TransitionError> {
        let grid_viewport = Size::new(window.width, window.height - geometry.top_chrome_height);
        let mut grid = CardGrid::new(grid_viewport, layout)?;
        let paging = PagingSurface::beside(&grid, page_count)?;
        let bridge = ScrollSyncBridge::install(&mut grid, &paging);

        let root = tree.insert(
            ViewKind::Screen {
                name: "cards".to_string(),
            },
            Rect::new(0.0, 0.0, window.width, window.height),
        );
        let grid_view = tree.insert(ViewKind::Plain, grid_frame(window, &geometry));
        tree.mount(root, grid_view)?;

        let mut cells = Vec::with_capacity(layout.item_count);
        for index in 0..layout.item_count {
            let cell = tree.insert(ViewKind::Card { index }, Rect::default());
            tree.mount(grid_view, cell)?;
            cells.push(cell);
        }

        let screen = Self {
            root,
            grid_view,
            cells,
            grid,
            paging,
            bridge,
            geometry,
        };
        screen.layout_cells(tree)?;
        debug!(
            "Card screen built: {} cards, {} pages, grid offset {}",
            screen.cells.len(),
            screen.paging.page_count(),
            screen.grid.content_offset().x
        );
        Ok(screen)
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    pub fn grid(&self) -> &CardGrid {
        &self.grid
    }

    pub fn paging(&self) -> &PagingSurface {
        &self.paging
    }

    pub fn cells(&self) -> &[ViewId] {
        &self.cells
    }

    pub fn geometry(&self) -> TransitionGeometry {
        self.geometry
    }

    /// The card under the grid's center at the current scroll position.
    pub fn centered_item(&self) -> Option<CenteredItem> {
        self.grid.centered_item()
    }

    /// Track an in-progress drag. The drag goes to whichever surface owns
    /// the gesture; once the bridge is installed that is the paging surface.
    pub fn drag_by(&mut self, tree: &mut ViewTree, dx: f64) -> Result<(), TransitionError> {
        match self.grid.gesture_owner() {
            GestureOwner::PagingSurface => {
                if self.paging.drag_by(dx) {
                    self.paging_did_scroll(tree)?;
                }
            }
            GestureOwner::Grid => {
                self.grid.scroll_by(dx)?;
                self.layout_cells(tree)?;
            }
        }
        Ok(())
    }

    /// Release the drag and let the paging surface snap. Returns the page.
    pub fn end_drag(&mut self, tree: &mut ViewTree, velocity_x: f64) -> Result<usize, TransitionError> {
        let page = self.paging.end_drag(velocity_x);
        self.paging_did_scroll(tree)?;
        Ok(page)
    }

    /// Drag by whole pages and release without velocity. Negative values
    /// move back. Returns the landing page.
    pub fn swipe(&mut self, tree: &mut ViewTree, pages: i64) -> Result<usize, TransitionError> {
        let dx = self.paging.page_width() * pages as f64;
        self.drag_by(tree, dx)?;
        self.end_drag(tree, 0.0)
    }

    pub fn scroll_to_page(&mut self, tree: &mut ViewTree, page: usize) -> Result<(), TransitionError> {
        if self.paging.scroll_to_page(page) {
            self.paging_did_scroll(tree)?;
        }
        Ok(())
    }

    /// Scroll callback of the paging surface: mirror the offset onto the
    /// grid and reposition the cells.
    pub fn paging_did_scroll(&mut self, tree: &mut ViewTree) -> Result<(), TransitionError> {
        self.bridge.sync(&self.paging, &mut self.grid);
        trace!(
            "Paging offset {} -> grid offset {}",
            self.paging.content_offset().x,
            self.grid.content_offset().x
        );
        self.layout_cells(tree)
    }

    /// Apply a new window size to the grid, the paging surface and the views.
    ///
    /// Both surfaces are resized on copies first; on error neither changes.
    pub fn resize(&mut self, tree: &mut ViewTree, window: Size) -> Result<(), TransitionError> {
        let grid_viewport = Size::new(window.width, window.height - self.geometry.top_chrome_height);
        let mut grid = self.grid.clone();
        grid.resize(grid_viewport)?;
        let mut paging = self.paging.clone();
        paging.resize_pages(grid.layout.stride(), grid_viewport.height)?;
        tree.node(self.root)?;
        tree.node(self.grid_view)?;

        self.grid = grid;
        self.paging = paging;
        tree.set_frame(self.root, Rect::new(0.0, 0.0, window.width, window.height))?;
        tree.set_frame(self.grid_view, grid_frame(window, &self.geometry))?;
        debug!("Card screen resized to {}x{}", window.width, window.height);
        self.paging_did_scroll(tree)
    }

    /// Change the card size, keeping the current page. Fails without
    /// changes if the card no longer fits the viewport.
    pub fn set_card_size(&mut self, tree: &mut ViewTree, size: Size) -> Result<(), TransitionError> {
        let mut grid = self.grid.clone();
        grid.set_item_size(size)?;
        let mut paging = self.paging.clone();
        paging.resize_pages(grid.layout.stride(), grid.viewport().height)?;

        self.grid = grid;
        self.paging = paging;
        debug!("Card size changed to {}x{}", size.width, size.height);
        self.paging_did_scroll(tree)
    }

    /// Place each cell at its on-screen frame, shifted down by the source
    /// offset, and hide the ones outside the viewport.
    fn layout_cells(&self, tree: &mut ViewTree) -> Result<(), TransitionError> {
        for placement in self.grid.compute_placements() {
            let cell = self.cell(placement.index)?;
            tree.set_frame(cell, placement.frame.offset_by(0.0, self.geometry.source_y_offset))?;
            tree.set_hidden(cell, placement.visibility != Visibility::Visible)?;
        }
        Ok(())
    }

    fn cell(&self, index: usize) -> Result<ViewId, TransitionError> {
        self.cells
            .get(index)
            .copied()
            .ok_or(TransitionError::Layout(LayoutError::ItemOutOfBounds(
                index,
                self.cells.len(),
            )))
    }
}

fn grid_frame(window: Size, geometry: &TransitionGeometry) -> Rect {
    Rect::new(
        0.0,
        geometry.top_chrome_height,
        window.width,
        window.height - geometry.top_chrome_height,
    )
}

impl TransitionSource for CardCollectionScreen {
    fn view_for_transition(&self) -> Result<ViewId, TransitionError> {
        let centered = self.centered_item().ok_or(LayoutError::NoCenteredItem)?;
        self.cell(centered.index)
    }

    fn begin_frame_for_transition(&self) -> Result<Rect, TransitionError> {
        Ok(self
            .geometry
            .resolve_begin_frame(self.centered_item(), &self.grid)?)
    }
}

/// Full-screen detail presentation. Its content is out of scope; only the
/// root view takes part in the transition.
#[derive(Debug, Clone, Copy)]
pub struct DetailScreen {
    root: ViewId,
}

impl DetailScreen {
    pub fn new(tree: &mut ViewTree, window: Size) -> Self {
        let root = tree.insert(
            ViewKind::Screen {
                name: "detail".to_string(),
            },
            Rect::new(0.0, 0.0, window.width, window.height),
        );
        Self { root }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Size {
        Size::new(300.0, 520.0)
    }

    fn screen(tree: &mut ViewTree) -> CardCollectionScreen {
        let screen = CardCollectionScreen::new(
            tree,
            window(),
            CardLayout::new(Size::new(250.0, 500.0), 8),
            8,
            TransitionGeometry::new(20.0, 24.0),
        )
        .unwrap();
        let root = tree.root();
        tree.mount(root, screen.root()).unwrap();
        screen
    }

    #[test]
    fn test_new_screen_centers_first_card() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let screen = screen(&mut tree);

        assert_eq!(screen.grid().content_offset().x, -25.0);
        assert!(!screen.grid().is_scroll_enabled());
        assert_eq!(screen.centered_item().map(|c| c.index), Some(0));
        assert_eq!(screen.cells().len(), 8);

        let first = screen.cells()[0];
        assert_eq!(tree.frame(first).unwrap(), Rect::new(25.0, 24.0, 250.0, 500.0));
        assert!(!tree.get(first).unwrap().hidden);
        assert!(tree.get(screen.cells()[2]).unwrap().hidden);
    }

    #[test]
    fn test_drag_moves_grid_through_bridge() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);

        screen.drag_by(&mut tree, 250.0).unwrap();
        assert_eq!(screen.paging().content_offset().x, 250.0);
        assert_eq!(screen.grid().content_offset().x, 225.0);
        assert_eq!(screen.centered_item().map(|c| c.index), Some(1));

        assert_eq!(screen.end_drag(&mut tree, 0.0).unwrap(), 1);
        assert_eq!(
            tree.frame(screen.cells()[1]).unwrap(),
            Rect::new(25.0, 24.0, 250.0, 500.0)
        );
    }

    #[test]
    fn test_swipe_lands_on_page() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);

        assert_eq!(screen.swipe(&mut tree, 3).unwrap(), 3);
        assert_eq!(screen.grid().content_offset().x, 725.0);
        assert_eq!(screen.swipe(&mut tree, -10).unwrap(), 0);
        assert_eq!(screen.grid().content_offset().x, -25.0);
    }

    #[test]
    fn test_transition_source_uses_centered_card() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);
        screen.scroll_to_page(&mut tree, 3).unwrap();

        assert_eq!(screen.view_for_transition().unwrap(), screen.cells()[3]);
        let begin = screen.begin_frame_for_transition().unwrap();
        assert_eq!(begin, Rect::new(25.0, 44.0, 250.0, 500.0));
    }

    #[test]
    fn test_resize_keeps_page() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);
        screen.scroll_to_page(&mut tree, 2).unwrap();

        screen.resize(&mut tree, Size::new(400.0, 620.0)).unwrap();
        assert_eq!(screen.grid().content_inset().left, 75.0);
        assert_eq!(screen.paging().current_page(), 2);
        assert_eq!(screen.grid().content_offset().x, 500.0 - 75.0);
        assert_eq!(screen.centered_item().map(|c| c.index), Some(2));
    }

    #[test]
    fn test_failed_resize_leaves_surfaces_in_sync() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);
        screen.scroll_to_page(&mut tree, 1).unwrap();

        // 15pt window under 20pt chrome: the grid would be -5pt tall.
        let err = screen.resize(&mut tree, Size::new(400.0, 15.0)).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Layout(LayoutError::InvalidViewport { .. })
        ));
        assert_eq!(screen.grid().viewport(), Size::new(300.0, 500.0));
        assert_eq!(screen.grid().content_inset().left, 25.0);
        assert_eq!(screen.paging().content_offset().x, 250.0);
        assert_eq!(
            screen.grid().content_offset().x,
            screen.paging().content_offset().x - screen.grid().content_inset().left
        );
    }

    #[test]
    fn test_set_card_size_keeps_page() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);
        screen.scroll_to_page(&mut tree, 2).unwrap();

        screen.set_card_size(&mut tree, Size::new(200.0, 480.0)).unwrap();
        assert_eq!(screen.paging().page_width(), 200.0);
        assert_eq!(screen.paging().content_offset().x, 400.0);
        assert_eq!(screen.grid().content_offset().x, 400.0 - 50.0);
        assert_eq!(screen.centered_item().map(|c| c.index), Some(2));
        assert_eq!(
            tree.frame(screen.cells()[2]).unwrap(),
            Rect::new(50.0, 24.0, 200.0, 480.0)
        );

        assert!(screen.set_card_size(&mut tree, Size::new(320.0, 480.0)).is_err());
        assert_eq!(screen.grid().layout.item_size, Size::new(200.0, 480.0));
        assert_eq!(screen.paging().page_width(), 200.0);
    }

    #[test]
    fn test_drag_goes_to_paging_surface() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);
        assert_eq!(screen.grid().gesture_owner(), GestureOwner::PagingSurface);

        screen.drag_by(&mut tree, 30.0).unwrap();
        assert!(screen.paging().is_dragging());
        assert_eq!(screen.grid().content_offset().x, 5.0);
    }

    #[test]
    fn test_resize_narrower_than_card_fails() {
        let mut tree = ViewTree::new(Rect::new(0.0, 0.0, 300.0, 520.0));
        let mut screen = screen(&mut tree);
        let err = screen.resize(&mut tree, Size::new(200.0, 520.0)).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Layout(LayoutError::ItemWiderThanViewport { .. })
        ));
    }
}
