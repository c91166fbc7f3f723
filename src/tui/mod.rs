//! Interactive front end: the polling scheduler, keyboard handling and the
//! two surfaces frames are drawn on (full-screen terminal or plain stdout).

mod app;
mod event;
mod input;
mod screen;
mod stdout;
mod style;
mod terminal;

pub use app::{App, MIN_INTERVAL, Settings};
pub use event::{Event, EventHandler};
pub use input::{Action, HELP, handle_key};
pub use screen::{FIXED_ROWS, Screen, Surface, row_budget};
pub use stdout::{OutputFormat, StdoutSurface};
pub use style::Styles;
pub use terminal::TerminalSurface;
