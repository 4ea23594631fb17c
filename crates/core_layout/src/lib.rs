//! Cardflow Core Layout Engine
//!
//! Platform-agnostic geometry for a horizontally paging card carousel.
//!
//! This crate implements the "single row of cards" paradigm where:
//! - Cards are laid out left to right on a horizontal strip
//! - The grid's viewport slides over the strip but never scrolls on its own
//! - A hidden paging surface owns the drag gesture and drives the grid offset
//! - The card under the viewport's center is the one that transitions to detail

pub mod geometry;
pub mod paging;

pub use geometry::{TransitionGeometry, DEFAULT_SOURCE_Y_OFFSET, DEFAULT_TOP_CHROME_HEIGHT};
pub use paging::{
    GestureOwner, PagingSurface, ScrollSyncBridge, DEFAULT_PAGE_COUNT, FLICK_VELOCITY_THRESHOLD,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical index of a card in the grid (single section).
pub type ItemIndex = usize;

/// Errors that can occur during layout operations.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Item index {0} is out of bounds (count: {1})")]
    ItemOutOfBounds(ItemIndex, usize),

    #[error("Item width {item_width} exceeds viewport width {viewport_width}")]
    ItemWiderThanViewport { item_width: f64, viewport_width: f64 },

    #[error("Item size must be positive, got {width}x{height}")]
    InvalidItemSize { width: f64, height: f64 },

    #[error("Viewport size must be positive, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },

    #[error("Paging surface needs at least one page")]
    InvalidPageCount,

    #[error("Grid scrolling is disabled; the paging surface owns the drag gesture")]
    ScrollDisabled,

    #[error("No item is centered in the viewport")]
    NoCenteredItem,

    #[error("Layout is not returning attributes for item {0}")]
    MissingLayoutAttributes(ItemIndex),
}

/// A point in points (logical pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// A rectangle in point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle from an origin and a size.
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Closed containment test: points on the edges are inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Same size, origin at zero (a view's own bounds).
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Translate the origin by `(dx, dy)`.
    pub fn offset_by(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Component-wise linear interpolation. `t` is not clamped so spring
    /// overshoot carries through to the frame.
    pub fn lerp(&self, to: &Rect, t: f64) -> Rect {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Rect::new(
            mix(self.x, to.x),
            mix(self.y, to.y),
            mix(self.width, to.width),
            mix(self.height, to.height),
        )
    }
}

/// Padding around the grid's content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self { top, left, bottom, right }
    }

    /// Left/right padding that lets the first and last item sit in the
    /// middle of the viewport: `(viewport_width - item_width) / 2`.
    pub fn horizontal_centering(viewport_width: f64, item_width: f64) -> Result<Self, LayoutError> {
        if item_width > viewport_width {
            return Err(LayoutError::ItemWiderThanViewport {
                item_width,
                viewport_width,
            });
        }
        let padding = (viewport_width - item_width) / 2.0;
        Ok(Self::new(0.0, padding, 0.0, padding))
    }
}

/// Layout attributes for a single card in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutAttributes {
    pub index: ItemIndex,
    pub frame: Rect,
}

/// The card whose bounds contain the viewport's center point.
///
/// Derived on demand. It goes stale as soon as the grid offset moves again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenteredItem {
    pub index: ItemIndex,
    /// Frame in viewport (screen) coordinates.
    pub frame: Rect,
}

/// Visibility state for a laid-out card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Card intersects the viewport and should be rendered.
    Visible,
    /// Card is entirely to the left of the viewport.
    OffScreenLeft,
    /// Card is entirely to the right of the viewport.
    OffScreenRight,
}

/// Computed placement for a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub index: ItemIndex,
    /// Frame in viewport (screen) coordinates.
    pub frame: Rect,
    pub visibility: Visibility,
}

/// Single-row horizontal flow layout of equally sized cards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardLayout {
    /// Size of every card.
    pub item_size: Size,
    /// Horizontal gap between neighbouring cards.
    pub item_spacing: f64,
    /// Number of cards in the single section.
    pub item_count: usize,
}

impl CardLayout {
    /// Create a layout with no spacing between cards.
    pub fn new(item_size: Size, item_count: usize) -> Self {
        Self {
            item_size,
            item_spacing: 0.0,
            item_count,
        }
    }

    /// Builder-style spacing setter.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.item_spacing = spacing.max(0.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Distance between the left edges of neighbouring cards.
    pub fn stride(&self) -> f64 {
        self.item_size.width + self.item_spacing
    }

    /// Total size of the laid-out strip.
    pub fn content_size(&self) -> Size {
        if self.item_count == 0 {
            return Size::new(0.0, self.item_size.height);
        }
        let count = self.item_count as f64;
        Size::new(
            self.item_size.width * count + self.item_spacing * (count - 1.0),
            self.item_size.height,
        )
    }

    /// Attributes for one card, or `None` if the index is out of range.
    pub fn layout_attributes_for_item(&self, index: ItemIndex) -> Option<LayoutAttributes> {
        if index >= self.item_count {
            return None;
        }
        Some(LayoutAttributes {
            index,
            frame: Rect::new(
                self.stride() * index as f64,
                0.0,
                self.item_size.width,
                self.item_size.height,
            ),
        })
    }

    /// Hit-test a content-space point against the card frames.
    ///
    /// Frames are closed, so a point on the shared edge of two abutting
    /// cards hits both; the lower index wins.
    pub fn index_at(&self, point: Point) -> Option<ItemIndex> {
        if self.item_count == 0 || self.stride() <= 0.0 || point.x < 0.0 {
            return None;
        }
        let candidate = ((point.x / self.stride()).floor() as usize).min(self.item_count - 1);
        let contains = |index: ItemIndex| {
            self.layout_attributes_for_item(index)
                .is_some_and(|attrs| attrs.frame.contains(point))
        };

        candidate
            .checked_sub(1)
            .filter(|&previous| contains(previous))
            .or_else(|| Some(candidate).filter(|&c| contains(c)))
    }
}

/// Compute the card under the viewport's center point.
///
/// The center is taken in content space: horizontal middle of the viewport
/// plus the scroll offset, vertical middle of the scrolled bounds. Returns
/// `None` for an empty layout, for a spacing gap, or when overscroll moves
/// the center past the first or last card.
pub fn locate_centered_item(
    layout: &CardLayout,
    viewport: Size,
    scroll_offset: Point,
) -> Option<CenteredItem> {
    let center = Point::new(
        scroll_offset.x + viewport.width / 2.0,
        scroll_offset.y + viewport.height / 2.0,
    );
    let index = layout.index_at(center)?;
    let attrs = layout.layout_attributes_for_item(index)?;
    Some(CenteredItem {
        index,
        frame: attrs.frame.offset_by(-scroll_offset.x, -scroll_offset.y),
    })
}

fn check_viewport(viewport: Size) -> Result<(), LayoutError> {
    if viewport.is_positive() {
        Ok(())
    } else {
        Err(LayoutError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

/// The primary card grid.
///
/// Its native scrolling is disabled once a [`ScrollSyncBridge`] is installed;
/// from then on the content offset is written only by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardGrid {
    /// Layout of the cards.
    pub layout: CardLayout,
    /// Size of the visible area.
    viewport: Size,
    /// Padding that lets edge cards be centered.
    content_inset: EdgeInsets,
    /// Current scroll position (x position of viewport's left edge on the strip).
    content_offset: Point,
    /// Whether the grid responds to scrolling on its own.
    scroll_enabled: bool,
    /// Which surface owns the drag gesture.
    gesture_owner: GestureOwner,
}

impl CardGrid {
    /// Create a grid centered on the first card.
    pub fn new(viewport: Size, layout: CardLayout) -> Result<Self, LayoutError> {
        check_viewport(viewport)?;
        if !layout.item_size.is_positive() {
            return Err(LayoutError::InvalidItemSize {
                width: layout.item_size.width,
                height: layout.item_size.height,
            });
        }
        let content_inset = EdgeInsets::horizontal_centering(viewport.width, layout.item_size.width)?;
        Ok(Self {
            layout,
            viewport,
            content_inset,
            content_offset: Point::new(-content_inset.left, 0.0),
            scroll_enabled: true,
            gesture_owner: GestureOwner::Grid,
        })
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn content_inset(&self) -> EdgeInsets {
        self.content_inset
    }

    pub fn content_offset(&self) -> Point {
        self.content_offset
    }

    /// Set the scroll position directly. This is the programmatic path used
    /// by the sync bridge and is allowed while native scrolling is disabled.
    pub fn set_content_offset(&mut self, offset: Point) {
        self.content_offset = offset;
    }

    /// The visible rectangle in content coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.content_offset, self.viewport)
    }

    pub fn is_scroll_enabled(&self) -> bool {
        self.scroll_enabled
    }

    pub fn set_scroll_enabled(&mut self, enabled: bool) {
        self.scroll_enabled = enabled;
    }

    pub fn gesture_owner(&self) -> GestureOwner {
        self.gesture_owner
    }

    pub(crate) fn set_gesture_owner(&mut self, owner: GestureOwner) {
        self.gesture_owner = owner;
    }

    /// Lowest valid horizontal offset (first card centered).
    pub fn min_offset_x(&self) -> f64 {
        -self.content_inset.left
    }

    /// Highest valid horizontal offset (last card centered).
    pub fn max_offset_x(&self) -> f64 {
        let max = self.layout.content_size().width + self.content_inset.right - self.viewport.width;
        max.max(self.min_offset_x())
    }

    /// Scroll the viewport by a delta, as native user scrolling would.
    ///
    /// Fails once the drag gesture has been handed to the paging surface.
    pub fn scroll_by(&mut self, delta: f64) -> Result<(), LayoutError> {
        if !self.scroll_enabled {
            return Err(LayoutError::ScrollDisabled);
        }
        let x = (self.content_offset.x + delta).clamp(self.min_offset_x(), self.max_offset_x());
        self.content_offset.x = x;
        Ok(())
    }

    /// Apply a new viewport size and re-derive the edge inset.
    pub fn resize(&mut self, viewport: Size) -> Result<(), LayoutError> {
        check_viewport(viewport)?;
        let inset = EdgeInsets::horizontal_centering(viewport.width, self.layout.item_size.width)?;
        self.viewport = viewport;
        self.content_inset = inset;
        Ok(())
    }

    /// Apply a new card size and re-derive the edge inset.
    pub fn set_item_size(&mut self, item_size: Size) -> Result<(), LayoutError> {
        if !item_size.is_positive() {
            return Err(LayoutError::InvalidItemSize {
                width: item_size.width,
                height: item_size.height,
            });
        }
        let inset = EdgeInsets::horizontal_centering(self.viewport.width, item_size.width)?;
        self.layout.item_size = item_size;
        self.content_inset = inset;
        Ok(())
    }

    /// Layout attributes for a card in content coordinates.
    pub fn layout_attributes_for_item(&self, index: ItemIndex) -> Option<LayoutAttributes> {
        self.layout.layout_attributes_for_item(index)
    }

    /// The card under the viewport's center, if any.
    pub fn centered_item(&self) -> Option<CenteredItem> {
        locate_centered_item(&self.layout, self.viewport, self.content_offset)
    }

    /// Compute screen placements for all cards.
    ///
    /// Returns one placement per card with its frame relative to the
    /// viewport and whether it is on screen.
    pub fn compute_placements(&self) -> Vec<ItemPlacement> {
        let viewport_left = self.content_offset.x;
        let viewport_right = viewport_left + self.viewport.width;

        (0..self.layout.item_count)
            .filter_map(|index| self.layout.layout_attributes_for_item(index))
            .map(|attrs| {
                let visibility = if attrs.frame.right() <= viewport_left {
                    Visibility::OffScreenLeft
                } else if attrs.frame.x >= viewport_right {
                    Visibility::OffScreenRight
                } else {
                    Visibility::Visible
                };
                ItemPlacement {
                    index: attrs.index,
                    frame: attrs
                        .frame
                        .offset_by(-self.content_offset.x, -self.content_offset.y),
                    visibility,
                }
            })
            .collect()
    }
}
