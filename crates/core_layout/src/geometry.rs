//! Begin-frame resolution for the card-to-detail transition.

use crate::{CardGrid, CenteredItem, LayoutError, Rect};
use serde::{Deserialize, Serialize};

/// Height of the status bar overlaying the card screen.
pub const DEFAULT_TOP_CHROME_HEIGHT: f64 = 20.0;

/// Vertical breathing offset applied to the card as it leaves the grid.
pub const DEFAULT_SOURCE_Y_OFFSET: f64 = 24.0;

/// Layout constants that map grid frames into transition space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionGeometry {
    /// Height of any chrome (status bar, navigation bar) above the grid.
    pub top_chrome_height: f64,
    /// Fixed vertical offset of the outgoing card.
    pub source_y_offset: f64,
}

impl Default for TransitionGeometry {
    fn default() -> Self {
        Self {
            top_chrome_height: DEFAULT_TOP_CHROME_HEIGHT,
            source_y_offset: DEFAULT_SOURCE_Y_OFFSET,
        }
    }
}

impl TransitionGeometry {
    pub fn new(top_chrome_height: f64, source_y_offset: f64) -> Self {
        Self {
            top_chrome_height,
            source_y_offset,
        }
    }

    /// Resolve the frame the transition snapshot starts from.
    ///
    /// Uses the layout attributes for the centered index rather than the
    /// live cell frame, moves it from content space into viewport space and
    /// shifts it below the chrome.
    pub fn resolve_begin_frame(
        &self,
        centered: Option<CenteredItem>,
        grid: &CardGrid,
    ) -> Result<Rect, LayoutError> {
        let centered = centered.ok_or(LayoutError::NoCenteredItem)?;
        let attrs = grid
            .layout_attributes_for_item(centered.index)
            .ok_or(LayoutError::MissingLayoutAttributes(centered.index))?;

        Ok(attrs.frame.offset_by(
            -grid.content_offset().x,
            self.top_chrome_height + self.source_y_offset,
        ))
    }
}
