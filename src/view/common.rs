//! UI-agnostic view model types.
//!
//! Views produce these; the terminal maps them to ratatui styles and the
//! stdout surface to padded text.

use serde::Serialize;

use crate::delta::Results;
use crate::model::MetricRow;

/// Row-level style classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowStyleClass {
    #[default]
    Normal,
    /// Row holds at least a fifth of the total (TUI: yellow).
    Warning,
    /// Row holds at least half of the total (TUI: red).
    Critical,
    /// Synthesized totals row (TUI: bold).
    Totals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One column heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    /// Minimum width; the last, left-aligned name column takes the rest.
    pub width: u16,
    pub align: Align,
}

impl Column {
    pub const fn right(header: &'static str, width: u16) -> Self {
        Self {
            header,
            width,
            align: Align::Right,
        }
    }

    pub const fn left(header: &'static str, width: u16) -> Self {
        Self {
            header,
            width,
            align: Align::Left,
        }
    }
}

/// One formatted row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewRow {
    pub cells: Vec<String>,
    pub style: RowStyleClass,
}

/// Formatted body rows plus the totals line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines {
    pub rows: Vec<ViewRow>,
    pub totals: ViewRow,
}

fn share_style(part: u64, whole: u64) -> RowStyleClass {
    if whole == 0 {
        return RowStyleClass::Normal;
    }
    let share = part as f64 / whole as f64;
    if share >= 0.5 {
        RowStyleClass::Critical
    } else if share >= 0.2 {
        RowStyleClass::Warning
    } else {
        RowStyleClass::Normal
    }
}

/// Formats at most `budget` rows whose `key` is non-zero.
///
/// `cells` receives each row and the totals row, so percentage columns can
/// be computed against the whole.
pub fn build_lines<R: MetricRow>(
    results: &Results<R>,
    budget: usize,
    key: impl Fn(&R) -> u64,
    cells: impl Fn(&R, &R) -> Vec<String>,
) -> Lines {
    let whole = key(&results.totals);
    let rows = results
        .rows
        .iter()
        .filter(|row| key(row) > 0)
        .take(budget)
        .map(|row| ViewRow {
            cells: cells(row, &results.totals),
            style: share_style(key(row), whole),
        })
        .collect();
    Lines {
        rows,
        totals: ViewRow {
            cells: cells(&results.totals, &results.totals),
            style: RowStyleClass::Totals,
        },
    }
}

/// Raw counters of the same rows [`build_lines`] would show.
pub fn build_records<R: MetricRow + Serialize>(
    results: &Results<R>,
    budget: usize,
    key: impl Fn(&R) -> u64,
) -> serde_json::Value {
    let rows: Vec<&R> = results
        .rows
        .iter()
        .filter(|row| key(row) > 0)
        .take(budget)
        .collect();
    serde_json::json!({
        "rows": rows,
        "totals": &results.totals,
    })
}
