//! Paging surface and the scroll synchronization bridge.
//!
//! The grid pages one card at a time even though each card is narrower than
//! the viewport. A hidden paging surface, one card stride wide, owns the drag
//! gesture. Every change of its offset is mirrored onto the grid with the
//! edge inset subtracted.

use crate::{CardGrid, LayoutError, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Number of card-width pages on the paging surface.
pub const DEFAULT_PAGE_COUNT: usize = 8;

/// Release velocity (points per second) above which a drag counts as a flick
/// and advances one page regardless of how far it travelled.
pub const FLICK_VELOCITY_THRESHOLD: f64 = 300.0;

/// Which surface receives the user's drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GestureOwner {
    /// The grid scrolls itself (no bridge installed).
    #[default]
    Grid,
    /// The paging surface owns the drag; the grid only mirrors it.
    PagingSurface,
}

/// A hidden scroll surface with paging enabled.
///
/// Its content is `page_count` card widths wide, so paging snaps land exactly
/// on card boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingSurface {
    /// Frame in the parent's coordinates.
    frame: Rect,
    /// Size of the scrollable content.
    content_size: Size,
    /// Current scroll position.
    content_offset: Point,
    /// Number of pages in the content.
    page_count: usize,
    /// Page the active drag started on, if a drag is in progress.
    drag_start_page: Option<usize>,
}

impl PagingSurface {
    /// Create a paging surface. The frame's width is the page width.
    pub fn new(frame: Rect, page_count: usize) -> Result<Self, LayoutError> {
        if page_count == 0 {
            return Err(LayoutError::InvalidPageCount);
        }
        if !frame.size().is_positive() {
            return Err(LayoutError::InvalidItemSize {
                width: frame.width,
                height: frame.height,
            });
        }
        Ok(Self {
            frame,
            content_size: Size::new(frame.width * page_count as f64, frame.height),
            content_offset: Point::ZERO,
            page_count,
            drag_start_page: None,
        })
    }

    /// Create a surface placed just past the right edge of a grid's viewport,
    /// one card stride wide (card plus spacing) and as tall as the viewport.
    pub fn beside(grid: &CardGrid, page_count: usize) -> Result<Self, LayoutError> {
        let viewport = grid.viewport();
        let frame = Rect::new(
            viewport.width,
            0.0,
            grid.layout.stride(),
            viewport.height,
        );
        Self::new(frame, page_count)
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn content_offset(&self) -> Point {
        self.content_offset
    }

    pub fn page_width(&self) -> f64 {
        self.frame.width
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Largest resting horizontal offset (last page).
    pub fn max_offset_x(&self) -> f64 {
        self.page_width() * (self.page_count - 1) as f64
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start_page.is_some()
    }

    /// Page nearest to the current offset, clamped to the valid range.
    pub fn current_page(&self) -> usize {
        let page = (self.content_offset.x / self.page_width()).round();
        if page <= 0.0 {
            0
        } else {
            (page as usize).min(self.page_count - 1)
        }
    }

    /// Move the content to an absolute horizontal offset while dragging.
    ///
    /// Rubber-band overscroll past either end is allowed until the drag ends.
    /// Returns whether the offset changed.
    pub fn drag_to(&mut self, x: f64) -> bool {
        if self.drag_start_page.is_none() {
            self.drag_start_page = Some(self.current_page());
        }
        if self.content_offset.x == x {
            return false;
        }
        self.content_offset.x = x;
        true
    }

    /// Move the content by a horizontal delta while dragging.
    pub fn drag_by(&mut self, dx: f64) -> bool {
        self.drag_to(self.content_offset.x + dx)
    }

    /// Release the drag and snap to a page.
    ///
    /// The nearest page wins unless the release velocity is a flick, which
    /// moves one page from where the drag started. Returns the landing page.
    pub fn end_drag(&mut self, velocity_x: f64) -> usize {
        let start = self.drag_start_page.take().unwrap_or_else(|| self.current_page());
        let target = if velocity_x >= FLICK_VELOCITY_THRESHOLD {
            (start + 1).min(self.page_count - 1)
        } else if velocity_x <= -FLICK_VELOCITY_THRESHOLD {
            start.saturating_sub(1)
        } else {
            self.current_page()
        };
        self.content_offset.x = self.page_width() * target as f64;
        target
    }

    /// Jump to a page without a drag. Out-of-range pages clamp to the last
    /// page. Returns whether the offset changed.
    pub fn scroll_to_page(&mut self, page: usize) -> bool {
        let x = self.page_width() * page.min(self.page_count - 1) as f64;
        self.drag_start_page = None;
        if self.content_offset.x == x {
            return false;
        }
        self.content_offset.x = x;
        true
    }

    /// Re-derive the content extent after the page width or height changed.
    /// Keeps the current page.
    pub fn resize_pages(&mut self, page_width: f64, height: f64) -> Result<(), LayoutError> {
        if page_width <= 0.0 || height <= 0.0 {
            return Err(LayoutError::InvalidItemSize {
                width: page_width,
                height,
            });
        }
        let page = self.current_page();
        self.frame.width = page_width;
        self.frame.height = height;
        self.content_size = Size::new(page_width * self.page_count as f64, height);
        self.content_offset.x = page_width * page as f64;
        Ok(())
    }
}

/// Mirrors the paging surface's offset onto the grid.
///
/// Only obtainable through [`ScrollSyncBridge::install`], which establishes
/// the single-gesture-owner precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSyncBridge {
    _installed: (),
}

impl ScrollSyncBridge {
    /// Disable the grid's own scrolling, hand the drag gesture to the paging
    /// surface, and align the grid with the surface's current offset.
    pub fn install(grid: &mut CardGrid, paging: &PagingSurface) -> Self {
        grid.set_scroll_enabled(false);
        grid.set_gesture_owner(GestureOwner::PagingSurface);
        let bridge = Self { _installed: () };
        bridge.sync(paging, grid);
        bridge
    }

    /// Mirror the paging offset: `grid.x = paging.x - inset.left`, grid y
    /// unchanged. Runs on every scroll event; O(1), no allocation.
    #[inline]
    pub fn sync(&self, paging: &PagingSurface, grid: &mut CardGrid) {
        debug_assert!(!grid.is_scroll_enabled());
        let offset = Point::new(
            paging.content_offset().x - grid.content_inset().left,
            grid.content_offset().y,
        );
        grid.set_content_offset(offset);
    }
}
