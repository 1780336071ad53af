// Search popup placement near the pointer, kept inside the primary screen

use serde::{Deserialize, Serialize};

/// Size of the search popup and its distance from the screen edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopupGeometry {
    pub width: i32,
    pub height: i32,
    pub margin: i32,
}

impl Default for PopupGeometry {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            margin: 10,
        }
    }
}

/// Offset below the pointer used when the popup does not fit above it
pub const BELOW_CURSOR_OFFSET: i32 = 20;

/// Source of the pointer location and primary screen size
pub trait CursorSource: Send + Sync {
    fn cursor_position(&self) -> Option<(i32, i32)>;

    fn screen_size(&self) -> Option<(i32, i32)>;
}

/// Top-left corner for the popup given the pointer position.
///
/// The popup sits above the pointer, flipping below it when there is no
/// room above, and is pulled left so its right edge stays `margin` inside
/// the screen.
pub fn place_popup(cursor: (i32, i32), screen: Option<(i32, i32)>, geometry: PopupGeometry) -> (i32, i32) {
    let (cx, cy) = cursor;

    let mut x = cx;
    if let Some((screen_width, _)) = screen {
        x = x.min(screen_width - geometry.width - geometry.margin);
    }
    let x = x.max(0);

    let above = cy - geometry.height - geometry.margin;
    let y = if above < 0 { cy + BELOW_CURSOR_OFFSET } else { above };

    (x, y)
}

#[cfg(test)]
#[path = "placement_test.rs"]
mod tests;
