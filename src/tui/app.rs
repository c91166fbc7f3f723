//! Polling and view scheduler.
//!
//! A single loop waits for the first of: the polling deadline, a key press,
//! a resize or a shutdown request. Only the active view is collected on each
//! tick; switching to a view that has never been collected collects it once
//! immediately.

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::collector::{Instruments, MetricsSource, ServerInfo};
use crate::fmt::format_duration;
use crate::normalize::NormalizerConfig;
use crate::view::{ViewKind, Views};

use super::event::{Event, EventHandler};
use super::input::{Action, handle_key};
use super::screen::{Screen, Surface, row_budget};

/// Shortest polling interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

const INTERVAL_STEP: Duration = Duration::from_secs(1);

/// Startup options for [`App`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub interval: Duration,
    /// Stop after this many collection cycles.
    pub count: Option<u64>,
    pub view: ViewKind,
    pub want_relative: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: MIN_INTERVAL,
            count: None,
            view: ViewKind::default(),
            want_relative: true,
        }
    }
}

/// Owns the source, the surface and every view.
pub struct App<S: MetricsSource, U: Surface> {
    source: S,
    surface: U,
    server: ServerInfo,
    views: Views,
    current: ViewKind,
    interval: Duration,
    want_relative: bool,
    help: bool,
    width: u16,
    height: u16,
    uptime: Option<u64>,
    last_error: Option<String>,
    cycles: u64,
    max_cycles: Option<u64>,
    finished: bool,
    torn_down: bool,
    instruments: Instruments,
}

impl<S: MetricsSource, U: Surface> App<S, U> {
    pub fn new(source: S, surface: U, server: ServerInfo, settings: Settings) -> Self {
        let normalizer = NormalizerConfig {
            datadir: server.datadir.clone(),
            relay_log: server.relay_log.clone(),
        };
        let mut views = Views::new(&normalizer, settings.want_relative);
        views.select(settings.view);
        let (width, height) = surface.size();
        Self {
            source,
            surface,
            server,
            views,
            current: settings.view,
            interval: settings.interval.max(MIN_INTERVAL),
            want_relative: settings.want_relative,
            help: false,
            width,
            height,
            uptime: None,
            last_error: None,
            cycles: 0,
            max_cycles: settings.count,
            finished: false,
            torn_down: false,
            instruments: Instruments::default(),
        }
    }

    /// Runs until quit, shutdown or the cycle limit, then tears down.
    pub fn run(&mut self, events: &EventHandler) -> io::Result<()> {
        let result = self.start().and_then(|()| self.event_loop(events));
        let teardown = self.teardown();
        result.and(teardown)
    }

    /// Enables instruments, collects the initial view and draws it.
    fn start(&mut self) -> io::Result<()> {
        self.instruments = Instruments::enable(&mut self.source);
        self.cycle()
    }

    fn event_loop(&mut self, events: &EventHandler) -> io::Result<()> {
        let mut last_tick = Instant::now();
        while !self.finished {
            let timeout = (last_tick + self.interval).saturating_duration_since(Instant::now());
            match events.next_timeout(timeout) {
                Ok(Some(event)) => self.handle_event(event)?,
                Ok(None) => {
                    last_tick = Instant::now();
                    self.cycle()?;
                }
                Err(_) => {
                    debug!("event channel closed");
                    self.finished = true;
                }
            }
        }
        Ok(())
    }

    /// Restores instruments and releases the surface; runs once.
    fn teardown(&mut self) -> io::Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.instruments.restore(&mut self.source);
        self.surface.finish()
    }

    /// One polling cycle: collect the active view, then redraw.
    fn cycle(&mut self) -> io::Result<()> {
        self.uptime = self.source.uptime().ok().flatten();
        self.collect_active();
        self.redraw()?;
        self.cycles += 1;
        if self.max_cycles.is_some_and(|max| self.cycles >= max) {
            info!(cycles = self.cycles, "cycle limit reached");
            self.finished = true;
        }
        Ok(())
    }

    fn collect_active(&mut self) {
        let view = self.views.get_mut(self.current);
        match view.collect(&mut self.source) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!(view = self.current.name(), error = %e, "collection failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(key) => self.apply(handle_key(key)),
            Event::Resize(width, height) => {
                self.width = width;
                self.height = height;
                self.redraw()
            }
            Event::Shutdown => {
                info!("shutdown requested");
                self.finished = true;
                Ok(())
            }
        }
    }

    fn apply(&mut self, action: Action) -> io::Result<()> {
        match action {
            Action::None => Ok(()),
            Action::Quit => {
                self.finished = true;
                Ok(())
            }
            Action::NextView => self.switch_to(self.current.next()),
            Action::PrevView => self.switch_to(self.current.prev()),
            Action::IncreaseInterval => {
                self.interval += INTERVAL_STEP;
                debug!(interval = ?self.interval, "interval changed");
                self.redraw()
            }
            Action::DecreaseInterval => {
                self.interval = self
                    .interval
                    .saturating_sub(INTERVAL_STEP)
                    .max(MIN_INTERVAL);
                debug!(interval = ?self.interval, "interval changed");
                self.redraw()
            }
            Action::ToggleRelative => {
                self.want_relative = !self.want_relative;
                for view in self.views.all_mut() {
                    view.set_want_relative(self.want_relative);
                }
                self.redraw()
            }
            Action::ResetBaseline => {
                for view in self.views.all_mut() {
                    view.reset_baseline();
                }
                self.redraw()
            }
            Action::ToggleHelp => {
                self.help = !self.help;
                self.surface.clear()?;
                self.redraw()
            }
        }
    }

    fn switch_to(&mut self, kind: ViewKind) -> io::Result<()> {
        debug!(from = self.current.name(), to = kind.name(), "switching view");
        self.current = kind;
        self.views.select(kind);
        if !self.views.get(kind).has_data() {
            self.collect_active();
        }
        self.surface.clear()?;
        self.redraw()
    }

    fn redraw(&mut self) -> io::Result<()> {
        let screen = self.screen();
        self.surface.draw(&screen)
    }

    fn screen(&self) -> Screen {
        let view = self.views.get(self.current);
        let budget = row_budget(self.height);
        let clock = chrono::Local::now().format("%H:%M:%S").to_string();

        let uptime = self
            .uptime
            .map(format_duration)
            .unwrap_or_else(|| "?".to_string());
        let title = format!(
            "myglot {} - {} {} / {}, up {}  [{}s]",
            crate::VERSION,
            clock,
            self.server.hostname,
            self.server.version,
            uptime,
            self.interval.as_secs()
        );

        let mut status = view.description().to_string();
        if view.meta().want_relative() {
            status.push_str(&format!(" ({})", format_duration(view.meta().elapsed().as_secs())));
        }
        if let Some(error) = &self.last_error {
            status.push_str(&format!("  ! {}", error));
        }

        Screen {
            clock,
            title,
            status,
            view: self.current,
            relative: view.meta().want_relative(),
            headings: view.headings(),
            lines: view.lines(budget),
            help: self.help,
            records: self
                .surface
                .wants_records()
                .then(|| view.records(budget)),
        }
    }

    pub fn current_view(&self) -> ViewKind {
        self.current
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn surface(&self) -> &U {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockSource;
    use crate::collector::{InstrumentSetting, Table};
    use crate::model::{MutexRow, TableIoRow};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    #[derive(Default)]
    struct RecordingSurface {
        frames: Vec<Screen>,
        clears: usize,
        finished: usize,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u16, u16) {
            (120, 30)
        }

        fn clear(&mut self) -> io::Result<()> {
            self.clears += 1;
            Ok(())
        }

        fn draw(&mut self, screen: &Screen) -> io::Result<()> {
            self.frames.push(screen.clone());
            Ok(())
        }

        fn finish(&mut self) -> io::Result<()> {
            self.finished += 1;
            Ok(())
        }
    }

    impl RecordingSurface {
        fn last(&self) -> &Screen {
            self.frames.last().unwrap()
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn table(name: &str, wait: u64, count: u64) -> TableIoRow {
        TableIoRow {
            name: name.to_string(),
            count_star: count,
            sum_timer_wait: wait,
            ..TableIoRow::default()
        }
    }

    fn server() -> ServerInfo {
        ServerInfo {
            hostname: "db1".to_string(),
            version: "8.0.36".to_string(),
            datadir: "/var/lib/mysql/".to_string(),
            relay_log: String::new(),
        }
    }

    fn app(source: MockSource, settings: Settings) -> App<MockSource, RecordingSurface> {
        App::new(source, RecordingSurface::default(), server(), settings)
    }

    fn absolute() -> Settings {
        Settings {
            want_relative: false,
            ..Settings::default()
        }
    }

    #[test]
    fn ops_toggle_resorts_without_new_query() {
        let mut source = MockSource::new();
        source.push_table_io(vec![table("db.slow", 900, 10), table("db.busy", 100, 500)]);
        let mut app = app(source, absolute());
        app.start().unwrap();
        assert_eq!(app.surface().last().lines.rows[0].cells[6], "db.slow");

        app.handle_event(key(KeyCode::Char('>'))).unwrap();
        assert_eq!(app.current_view(), ViewKind::Ops);
        let screen = app.surface().last();
        assert_eq!(screen.headings[0].header, "Ops");
        assert_eq!(screen.lines.rows[0].cells[6], "db.busy");
        assert_eq!(app.source().calls(Table::TableIoWaits), 1);

        app.cycle().unwrap();
        assert_eq!(app.source().calls(Table::TableIoWaits), 2);
    }

    #[test]
    fn interval_never_drops_below_one_second() {
        let settings = Settings {
            interval: Duration::from_secs(3),
            ..Settings::default()
        };
        let mut app = app(MockSource::new(), settings);
        for _ in 0..10 {
            app.handle_event(key(KeyCode::Char('-'))).unwrap();
        }
        assert_eq!(app.interval(), MIN_INTERVAL);

        app.handle_event(key(KeyCode::Char('+'))).unwrap();
        assert_eq!(app.interval(), Duration::from_secs(2));
    }

    #[test]
    fn zero_interval_is_raised_to_floor() {
        let settings = Settings {
            interval: Duration::ZERO,
            ..Settings::default()
        };
        let app = app(MockSource::new(), settings);
        assert_eq!(app.interval(), MIN_INTERVAL);
    }

    #[test]
    fn ticks_collect_only_the_active_view() {
        let mut app = app(MockSource::new(), Settings::default());
        app.start().unwrap();
        app.cycle().unwrap();
        app.cycle().unwrap();

        let source = app.source();
        assert_eq!(source.calls(Table::TableIoWaits), 3);
        assert_eq!(source.calls(Table::FileSummary), 0);
        assert_eq!(source.calls(Table::MutexWaits), 0);
        assert_eq!(source.calls(Table::Processlist), 0);
    }

    #[test]
    fn switching_collects_unseen_view_once() {
        let mut app = app(MockSource::new(), Settings::default());
        app.start().unwrap();

        app.handle_event(key(KeyCode::Char('<'))).unwrap();
        assert_eq!(app.current_view(), ViewKind::Stages);
        assert_eq!(app.source().calls(Table::Stages), 1);
        assert_eq!(app.surface().clears, 1);

        app.handle_event(key(KeyCode::Char('>'))).unwrap();
        app.handle_event(key(KeyCode::Char('<'))).unwrap();
        assert_eq!(app.source().calls(Table::Stages), 1);
    }

    #[test]
    fn toggle_relative_applies_to_all_views() {
        let mut source = MockSource::new();
        source.push_mutexes(vec![MutexRow {
            name: "wait/synch/mutex/sql/LOCK_open".to_string(),
            count_star: 1,
            sum_timer_wait: 100,
        }]);
        let settings = Settings {
            view: ViewKind::Mutex,
            ..Settings::default()
        };
        let mut app = app(source, settings);
        app.start().unwrap();
        assert!(app.surface().last().relative);
        assert!(app.surface().last().lines.rows.is_empty());

        app.handle_event(key(KeyCode::Char('t'))).unwrap();
        assert!(!app.surface().last().relative);
        assert_eq!(app.surface().last().lines.rows.len(), 1);

        app.handle_event(key(KeyCode::Char('>'))).unwrap();
        assert!(!app.surface().last().relative);
    }

    #[test]
    fn reset_zeroes_relative_values() {
        let mut source = MockSource::new();
        source.push_table_io(vec![table("db.t", 100, 1)]);
        source.push_table_io(vec![table("db.t", 300, 2)]);
        let mut app = app(source, Settings::default());
        app.start().unwrap();
        app.cycle().unwrap();
        assert_eq!(app.surface().last().lines.rows.len(), 1);

        app.handle_event(key(KeyCode::Char('z'))).unwrap();
        assert!(app.surface().last().lines.rows.is_empty());
    }

    #[test]
    fn help_overlay_toggles() {
        let mut app = app(MockSource::new(), Settings::default());
        app.start().unwrap();
        app.handle_event(key(KeyCode::Char('h'))).unwrap();
        assert!(app.surface().last().help);
        app.handle_event(key(KeyCode::Char('?'))).unwrap();
        assert!(!app.surface().last().help);
    }

    #[test]
    fn resize_changes_row_budget() {
        let mut source = MockSource::new();
        source.push_table_io((0..20).map(|i| table(&format!("db.t{}", i), 100 + i, 1)).collect());
        let mut app = app(source, absolute());
        app.start().unwrap();
        assert_eq!(app.surface().last().lines.rows.len(), 20);

        app.handle_event(Event::Resize(120, 10)).unwrap();
        assert_eq!(app.surface().last().lines.rows.len(), 6);
    }

    #[test]
    fn collection_error_keeps_running() {
        let mut source = MockSource::new();
        source.set_disconnected(true);
        let mut app = app(source, Settings::default());
        app.start().unwrap();
        assert!(app.surface().last().status.contains("connection refused"));
        assert!(!app.is_finished());
    }

    #[test]
    fn quit_and_shutdown_are_equivalent_and_idempotent() {
        let mut app = app(MockSource::new(), Settings::default());
        app.handle_event(key(KeyCode::Char('q'))).unwrap();
        assert!(app.is_finished());
        app.handle_event(Event::Shutdown).unwrap();
        assert!(app.is_finished());

        app.teardown().unwrap();
        app.teardown().unwrap();
        assert_eq!(app.surface().finished, 1);
    }

    #[test]
    fn run_stops_after_count_and_restores_instruments() {
        let mut source = MockSource::new();
        source.set_instruments(vec![InstrumentSetting {
            name: "stage/sql/init".to_string(),
            enabled: false,
            timed: false,
        }]);
        let settings = Settings {
            count: Some(1),
            ..Settings::default()
        };
        let mut app = app(source, settings);
        app.run(&EventHandler::new()).unwrap();

        assert!(app.is_finished());
        assert_eq!(app.surface().frames.len(), 1);
        assert_eq!(app.surface().finished, 1);
        let restored = app.source().instrument("stage/sql/init").unwrap();
        assert!(!restored.enabled);
        assert_eq!(app.source().instrument_writes(), 2);
    }

    #[test]
    fn run_exits_on_queued_shutdown() {
        let events = EventHandler::new();
        events.sender().send(Event::Shutdown).unwrap();
        let mut app = app(MockSource::new(), Settings::default());
        app.run(&events).unwrap();
        assert_eq!(app.surface().frames.len(), 1);
        assert_eq!(app.surface().finished, 1);
    }
}
