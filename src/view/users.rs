//! Per-user connection activity.
//!
//! Processlist values are a present-moment picture rather than lifetime
//! counters, so this view always shows them as collected.

use crate::collector::{CollectError, MetricsSource, Table, absent_as_empty};
use crate::delta::{DeltaEngine, Results, ViewMeta, descending_by};
use crate::fmt::{format_duration, format_pct};
use crate::model::{UserRow, aggregate_processlist};

use super::common::{Column, Lines, build_lines, build_records};
use super::View;

pub struct UsersView {
    engine: DeltaEngine<UserRow>,
}

impl UsersView {
    pub fn new() -> Self {
        Self {
            engine: DeltaEngine::point_in_time("users"),
        }
    }

    fn results(&self) -> Results<UserRow> {
        self.engine
            .results(false, descending_by(|r: &UserRow| r.runtime))
    }
}

impl Default for UsersView {
    fn default() -> Self {
        Self::new()
    }
}

fn count(n: u64) -> String {
    if n == 0 { String::new() } else { n.to_string() }
}

fn seconds(secs: u64) -> String {
    if secs == 0 {
        String::new()
    } else {
        format_duration(secs)
    }
}

impl View for UsersView {
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError> {
        let processes = absent_as_empty(Table::Processlist, source.processlist())?;
        self.engine.collect(aggregate_processlist(&processes));
        Ok(())
    }

    fn reset_baseline(&mut self) {
        self.engine.reset_baseline();
    }

    fn set_want_relative(&mut self, _want_relative: bool) {}

    fn meta(&self) -> &ViewMeta {
        self.engine.meta()
    }

    fn description(&self) -> &'static str {
        "Activity by user"
    }

    fn headings(&self) -> Vec<Column> {
        vec![
            Column::right("Run Time", 9),
            Column::right("%", 7),
            Column::right("Sleep", 9),
            Column::right("Conn", 5),
            Column::right("Active", 6),
            Column::right("Hosts", 5),
            Column::right("DBs", 4),
            Column::right("Select", 6),
            Column::right("Insert", 6),
            Column::right("Update", 6),
            Column::right("Delete", 6),
            Column::right("Other", 6),
            Column::left("User", 20),
        ]
    }

    fn lines(&self, budget: usize) -> Lines {
        build_lines(
            &self.results(),
            budget,
            |r| r.connections,
            |r, total| {
                vec![
                    seconds(r.runtime),
                    format_pct(r.runtime, total.runtime),
                    seconds(r.sleeptime),
                    count(r.connections),
                    count(r.active),
                    count(r.hosts),
                    count(r.dbs),
                    count(r.selects),
                    count(r.inserts),
                    count(r.updates),
                    count(r.deletes),
                    count(r.other),
                    r.name.clone(),
                ]
            },
        )
    }

    fn records(&self, budget: usize) -> serde_json::Value {
        build_records(&self.results(), budget, |r| r.connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockSource;
    use crate::model::ProcessRow;

    fn process(user: &str, command: &str, time: u64) -> ProcessRow {
        ProcessRow {
            id: 1,
            user: user.to_string(),
            host: "10.0.0.1:4000".to_string(),
            db: Some("shop".to_string()),
            command: command.to_string(),
            time,
            state: None,
            info: Some("SELECT 1".to_string()),
        }
    }

    #[test]
    fn shows_present_values_even_in_relative_mode() {
        let mut source = MockSource::new();
        source.push_processes(vec![process("app", "Query", 5)]);
        source.push_processes(vec![process("app", "Query", 7), process("idle", "Sleep", 30)]);

        let mut view = UsersView::new();
        view.set_want_relative(true);
        view.collect(&mut source).unwrap();
        view.collect(&mut source).unwrap();

        let lines = view.lines(10);
        assert_eq!(lines.rows.len(), 2);
        assert_eq!(lines.rows[0].cells[0], "7s");
        assert_eq!(lines.rows[0].cells[12], "app");
        assert_eq!(lines.rows[1].cells[2], "30s");
        assert_eq!(lines.rows[1].cells[12], "idle");
        assert!(!view.meta().want_relative());
    }

    #[test]
    fn finished_queries_do_not_reset_the_baseline() {
        let mut source = MockSource::new();
        source.push_processes(vec![process("app", "Query", 60)]);
        source.push_processes(vec![process("app", "Query", 2)]);

        let mut view = UsersView::new();
        view.collect(&mut source).unwrap();
        let anchored = view.meta().first_collected();
        view.collect(&mut source).unwrap();

        assert_eq!(view.meta().first_collected(), anchored);
        assert_eq!(view.lines(10).rows[0].cells[0], "2s");
    }
}
