//! Frame contents and the surface they are drawn on.

use std::io;

use crate::view::{Column, Lines, ViewKind};

/// Rows not available to view data: title, status, headings and totals.
pub const FIXED_ROWS: usize = 4;

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    /// Local wall-clock time of the frame.
    pub clock: String,
    pub title: String,
    pub status: String,
    pub view: ViewKind,
    pub relative: bool,
    pub headings: Vec<Column>,
    pub lines: Lines,
    /// Show the key binding overlay instead of the data.
    pub help: bool,
    /// Raw counters, present only when the surface asked for them.
    pub records: Option<serde_json::Value>,
}

/// Where frames go.
pub trait Surface {
    /// Current (width, height) in character cells.
    fn size(&self) -> (u16, u16);

    fn clear(&mut self) -> io::Result<()>;

    fn draw(&mut self, screen: &Screen) -> io::Result<()>;

    /// Whether frames should carry [`Screen::records`].
    fn wants_records(&self) -> bool {
        false
    }

    /// Releases the surface; called once at shutdown.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Body rows that fit in `height`.
pub fn row_budget(height: u16) -> usize {
    usize::from(height).saturating_sub(FIXED_ROWS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_leaves_room_for_fixed_rows() {
        assert_eq!(row_budget(24), 20);
        assert_eq!(row_budget(3), 0);
    }
}
