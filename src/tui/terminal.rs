//! Full-screen terminal surface.

use std::io::{self, Stdout};

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use crate::view::{Align, Column, ViewRow};

use super::input::HELP;
use super::screen::{Screen, Surface};
use super::style::Styles;

/// Draws frames with ratatui on the alternate screen.
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl TerminalSurface {
    /// Switches the terminal to raw mode and the alternate screen.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (u16, u16) {
        self.terminal
            .size()
            .map(|s| (s.width, s.height))
            .unwrap_or((80, 24))
    }

    fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, screen))?;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

fn render(frame: &mut Frame, screen: &Screen) {
    let [title, status, body, totals] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(screen.title.as_str()).style(Styles::header()),
        title,
    );

    if screen.help {
        render_help(frame, frame.area());
        return;
    }

    let mode = if screen.relative { "rel" } else { "abs" };
    let line = Line::from(vec![
        Span::styled(format!("[{}]", screen.view.name()), Styles::view_active()),
        Span::styled(format!(" {} ", mode), Styles::dim()),
        Span::raw(screen.status.as_str()),
    ]);
    frame.render_widget(Paragraph::new(line).style(Styles::default()), status);

    let widths = widths(&screen.headings);
    let header = Row::new(
        screen
            .headings
            .iter()
            .map(|c| cell(c.header, c.align)),
    )
    .style(Styles::table_header());
    let rows = screen
        .lines
        .rows
        .iter()
        .map(|r| table_row(r, &screen.headings));
    frame.render_widget(
        Table::new(rows, widths.clone()).header(header).column_spacing(1),
        body,
    );

    let totals_row = table_row(&screen.lines.totals, &screen.headings);
    frame.render_widget(
        Table::new([totals_row], widths).column_spacing(1),
        totals,
    );
}

fn widths(columns: &[Column]) -> Vec<Constraint> {
    let last = columns.len().saturating_sub(1);
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == last {
                Constraint::Min(c.width)
            } else {
                Constraint::Length(c.width)
            }
        })
        .collect()
}

fn cell(text: &str, align: Align) -> Cell<'static> {
    let line = Line::from(text.to_string());
    let line = match align {
        Align::Left => line.alignment(Alignment::Left),
        Align::Right => line.alignment(Alignment::Right),
    };
    Cell::from(line)
}

fn table_row(row: &ViewRow, columns: &[Column]) -> Row<'static> {
    Row::new(
        row.cells
            .iter()
            .zip(columns)
            .map(|(text, c)| cell(text, c.align)),
    )
    .style(Styles::row(row.style))
}

fn render_help(frame: &mut Frame, area: Rect) {
    let popup_width = (area.width * 60 / 100).clamp(40, 70).min(area.width);
    let popup_height = (HELP.len() as u16 + 2).min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", keys), Styles::warning()),
                Span::raw(*what),
            ])
        })
        .collect();
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Styles::view_active());
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
