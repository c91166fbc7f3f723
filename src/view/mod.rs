//! Monitored views.
//!
//! Each view binds a row type, a collection call on [`MetricsSource`], an
//! ordering and a column layout, and exclusively owns its [`DeltaEngine`]
//! state. The latency and ops views share the table I/O engine and differ
//! only in ordering and columns.
//!
//! [`DeltaEngine`]: crate::delta::DeltaEngine

pub mod common;
mod file_io;
mod locks;
mod mutex;
mod stages;
mod table_io;
mod users;

pub use common::{Align, Column, Lines, RowStyleClass, ViewRow};
pub use file_io::FileIoView;
pub use locks::LocksView;
pub use mutex::MutexView;
pub use stages::StagesView;
pub use table_io::{TableIoMode, TableIoView};
pub use users::UsersView;

use crate::collector::{CollectError, MetricsSource};
use crate::delta::ViewMeta;
use crate::normalize::NormalizerConfig;

/// Display order of the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewKind {
    #[default]
    Latency,
    Ops,
    Io,
    Locks,
    Users,
    Mutex,
    Stages,
}

impl ViewKind {
    pub fn all() -> &'static [ViewKind] {
        &[
            ViewKind::Latency,
            ViewKind::Ops,
            ViewKind::Io,
            ViewKind::Locks,
            ViewKind::Users,
            ViewKind::Mutex,
            ViewKind::Stages,
        ]
    }

    /// Returns the display name of the view.
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Latency => "latency",
            ViewKind::Ops => "ops",
            ViewKind::Io => "io",
            ViewKind::Locks => "locks",
            ViewKind::Users => "users",
            ViewKind::Mutex => "mutex",
            ViewKind::Stages => "stages",
        }
    }

    /// Returns the next view, wrapping around.
    pub fn next(&self) -> ViewKind {
        let all = Self::all();
        let pos = all.iter().position(|k| k == self).unwrap_or(0);
        all[(pos + 1) % all.len()]
    }

    /// Returns the previous view, wrapping around.
    pub fn prev(&self) -> ViewKind {
        let all = Self::all();
        let pos = all.iter().position(|k| k == self).unwrap_or(0);
        all[(pos + all.len() - 1) % all.len()]
    }
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::all().iter().map(|k| k.name()).collect();
                format!("unknown view {:?}, expected one of: {}", s, names.join(", "))
            })
    }
}

/// Common interface of every view.
pub trait View {
    /// Fetches fresh rows into the engine's `latest` snapshot.
    ///
    /// On error the previous snapshot is kept.
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError>;

    /// Starts measuring relative values from now.
    fn reset_baseline(&mut self);

    fn set_want_relative(&mut self, want_relative: bool);

    fn meta(&self) -> &ViewMeta;

    /// One-line description shown above the headings.
    fn description(&self) -> &'static str;

    fn headings(&self) -> Vec<Column>;

    /// Current results formatted for display, at most `budget` body rows.
    fn lines(&self, budget: usize) -> Lines;

    /// Current results as raw counters, at most `budget` body rows.
    fn records(&self, budget: usize) -> serde_json::Value;

    fn has_data(&self) -> bool {
        self.meta().last_collected().is_some()
    }
}

/// The full set of views, one engine each.
pub struct Views {
    table_io: TableIoView,
    file_io: FileIoView,
    locks: LocksView,
    users: UsersView,
    mutex: MutexView,
    stages: StagesView,
}

impl Views {
    pub fn new(normalizer: &NormalizerConfig, want_relative: bool) -> Self {
        Self {
            table_io: TableIoView::new(want_relative),
            file_io: FileIoView::new(normalizer, want_relative),
            locks: LocksView::new(want_relative),
            users: UsersView::new(),
            mutex: MutexView::new(want_relative),
            stages: StagesView::new(want_relative),
        }
    }

    /// Prepares the view for display; only affects the shared table I/O
    /// engine's display mode.
    pub fn select(&mut self, kind: ViewKind) {
        match kind {
            ViewKind::Latency => self.table_io.set_mode(TableIoMode::Latency),
            ViewKind::Ops => self.table_io.set_mode(TableIoMode::Ops),
            _ => {}
        }
    }

    pub fn get(&self, kind: ViewKind) -> &dyn View {
        match kind {
            ViewKind::Latency | ViewKind::Ops => &self.table_io,
            ViewKind::Io => &self.file_io,
            ViewKind::Locks => &self.locks,
            ViewKind::Users => &self.users,
            ViewKind::Mutex => &self.mutex,
            ViewKind::Stages => &self.stages,
        }
    }

    pub fn get_mut(&mut self, kind: ViewKind) -> &mut dyn View {
        match kind {
            ViewKind::Latency | ViewKind::Ops => &mut self.table_io,
            ViewKind::Io => &mut self.file_io,
            ViewKind::Locks => &mut self.locks,
            ViewKind::Users => &mut self.users,
            ViewKind::Mutex => &mut self.mutex,
            ViewKind::Stages => &mut self.stages,
        }
    }

    /// Every distinct engine once.
    pub fn all_mut(&mut self) -> [&mut dyn View; 6] {
        [
            &mut self.table_io,
            &mut self.file_io,
            &mut self.locks,
            &mut self.users,
            &mut self.mutex,
            &mut self.stages,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_both_ways() {
        assert_eq!(ViewKind::Latency.next(), ViewKind::Ops);
        assert_eq!(ViewKind::Stages.next(), ViewKind::Latency);
        assert_eq!(ViewKind::Latency.prev(), ViewKind::Stages);

        let mut kind = ViewKind::Io;
        for _ in 0..ViewKind::all().len() {
            kind = kind.next();
        }
        assert_eq!(kind, ViewKind::Io);
    }

    #[test]
    fn parses_names() {
        assert_eq!("Locks".parse::<ViewKind>(), Ok(ViewKind::Locks));
        assert!("nope".parse::<ViewKind>().unwrap_err().contains("latency"));
    }
}
