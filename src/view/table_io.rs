//! Table I/O latency and operation counts.

use crate::collector::{CollectError, MetricsSource, Table, absent_as_empty};
use crate::delta::{DeltaEngine, Results, ViewMeta, descending_by};
use crate::fmt::{format_amount, format_pct, format_time};
use crate::model::TableIoRow;

use super::common::{Column, Lines, build_lines, build_records};
use super::View;

/// Which counter drives ordering and the leading columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableIoMode {
    #[default]
    Latency,
    Ops,
}

pub struct TableIoView {
    engine: DeltaEngine<TableIoRow>,
    mode: TableIoMode,
}

impl TableIoView {
    pub fn new(want_relative: bool) -> Self {
        Self {
            engine: DeltaEngine::new("table_io", want_relative),
            mode: TableIoMode::Latency,
        }
    }

    pub fn mode(&self) -> TableIoMode {
        self.mode
    }

    /// Changes ordering and columns; takes effect on the next render
    /// without a new query.
    pub fn set_mode(&mut self, mode: TableIoMode) {
        self.mode = mode;
    }

    fn key(&self) -> fn(&TableIoRow) -> u64 {
        match self.mode {
            TableIoMode::Latency => |r: &TableIoRow| r.sum_timer_wait,
            TableIoMode::Ops => |r: &TableIoRow| r.count_star,
        }
    }

    fn results(&self) -> Results<TableIoRow> {
        self.engine
            .results(self.engine.meta().want_relative(), descending_by(self.key()))
    }
}

impl View for TableIoView {
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError> {
        let rows = absent_as_empty(Table::TableIoWaits, source.table_io_waits())?;
        self.engine.collect(rows);
        Ok(())
    }

    fn reset_baseline(&mut self) {
        self.engine.reset_baseline();
    }

    fn set_want_relative(&mut self, want_relative: bool) {
        self.engine.meta_mut().set_want_relative(want_relative);
    }

    fn meta(&self) -> &ViewMeta {
        self.engine.meta()
    }

    fn description(&self) -> &'static str {
        match self.mode {
            TableIoMode::Latency => "Table I/O latency by table",
            TableIoMode::Ops => "Table I/O operations by table",
        }
    }

    fn headings(&self) -> Vec<Column> {
        let lead = match self.mode {
            TableIoMode::Latency => Column::right("Latency", 10),
            TableIoMode::Ops => Column::right("Ops", 10),
        };
        vec![
            lead,
            Column::right("%", 7),
            Column::right("Fetch", 7),
            Column::right("Insert", 7),
            Column::right("Update", 7),
            Column::right("Delete", 7),
            Column::left("Table Name", 30),
        ]
    }

    fn lines(&self, budget: usize) -> Lines {
        let results = self.results();
        match self.mode {
            TableIoMode::Latency => build_lines(&results, budget, self.key(), |r, total| {
                vec![
                    format_time(r.sum_timer_wait),
                    format_pct(r.sum_timer_wait, total.sum_timer_wait),
                    format_pct(r.sum_timer_fetch, r.sum_timer_wait),
                    format_pct(r.sum_timer_insert, r.sum_timer_wait),
                    format_pct(r.sum_timer_update, r.sum_timer_wait),
                    format_pct(r.sum_timer_delete, r.sum_timer_wait),
                    r.name.clone(),
                ]
            }),
            TableIoMode::Ops => build_lines(&results, budget, self.key(), |r, total| {
                vec![
                    format_amount(r.count_star),
                    format_pct(r.count_star, total.count_star),
                    format_pct(r.count_fetch, r.count_star),
                    format_pct(r.count_insert, r.count_star),
                    format_pct(r.count_update, r.count_star),
                    format_pct(r.count_delete, r.count_star),
                    r.name.clone(),
                ]
            }),
        }
    }

    fn records(&self, budget: usize) -> serde_json::Value {
        build_records(&self.results(), budget, self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockSource;

    fn table(name: &str, wait: u64, count: u64) -> TableIoRow {
        TableIoRow {
            name: name.to_string(),
            count_star: count,
            sum_timer_wait: wait,
            count_read: count,
            sum_timer_read: wait,
            count_fetch: count,
            sum_timer_fetch: wait,
            ..TableIoRow::default()
        }
    }

    #[test]
    fn mode_switch_reorders_without_querying() {
        let mut source = MockSource::new();
        source.push_table_io(vec![table("db.slow", 900, 10), table("db.busy", 100, 500)]);

        let mut view = TableIoView::new(false);
        view.collect(&mut source).unwrap();
        assert_eq!(view.lines(10).rows[0].cells[6], "db.slow");

        view.set_mode(TableIoMode::Ops);
        let lines = view.lines(10);
        assert_eq!(lines.rows[0].cells[6], "db.busy");
        assert_eq!(lines.rows[0].cells[0], "500");
        assert_eq!(view.headings()[0].header, "Ops");
        assert_eq!(source.calls(Table::TableIoWaits), 1);
    }

    #[test]
    fn relative_values_since_baseline() {
        let mut source = MockSource::new();
        source.push_table_io(vec![table("db.t", 1_000_000, 50)]);
        source.push_table_io(vec![table("db.t", 3_000_000, 80)]);

        let mut view = TableIoView::new(true);
        view.set_mode(TableIoMode::Ops);
        view.collect(&mut source).unwrap();
        assert!(view.lines(10).rows.is_empty());

        view.collect(&mut source).unwrap();
        let lines = view.lines(10);
        assert_eq!(lines.rows[0].cells[0], "30");
        assert_eq!(lines.totals.cells[0], "30");
        assert_eq!(lines.totals.cells[6], "Totals");

        let records = view.records(10);
        assert_eq!(records["rows"][0]["count_star"], 30);
    }

    #[test]
    fn missing_table_yields_empty_rows() {
        let mut source = MockSource::new();
        source.set_missing(Table::TableIoWaits);
        let mut view = TableIoView::new(true);
        view.collect(&mut source).unwrap();
        assert!(view.has_data());
        assert!(view.lines(10).rows.is_empty());
    }
}
