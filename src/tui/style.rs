//! Color scheme and styles.

use ratatui::style::{Color, Modifier, Style};

use crate::view::RowStyleClass;

/// Color palette.
pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    pub const HEADER_BG: Color = Color::Blue;
    pub const HEADER_FG: Color = Color::White;

    pub const HIGHLIGHT_WARNING: Color = Color::Yellow;
    pub const HIGHLIGHT_CRITICAL: Color = Color::Red;

    pub const VIEW_ACTIVE: Color = Color::Cyan;
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Theme::FG).bg(Theme::BG)
    }

    /// Title bar style.
    pub fn header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Table header style.
    pub fn table_header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Active view name.
    pub fn view_active() -> Style {
        Style::default()
            .fg(Theme::VIEW_ACTIVE)
            .add_modifier(Modifier::BOLD)
    }

    /// Dimmed text style.
    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    pub fn warning() -> Style {
        Style::default().fg(Theme::HIGHLIGHT_WARNING)
    }

    pub fn critical() -> Style {
        Style::default()
            .fg(Theme::HIGHLIGHT_CRITICAL)
            .add_modifier(Modifier::BOLD)
    }

    pub fn totals() -> Style {
        Styles::default().add_modifier(Modifier::BOLD)
    }

    /// Maps a view row classification to a style.
    pub fn row(class: RowStyleClass) -> Style {
        match class {
            RowStyleClass::Normal => Styles::default(),
            RowStyleClass::Warning => Styles::warning(),
            RowStyleClass::Critical => Styles::critical(),
            RowStyleClass::Totals => Styles::totals(),
        }
    }
}
