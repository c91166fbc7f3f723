//! Table lock wait latency.

use crate::collector::{CollectError, MetricsSource, Table, absent_as_empty};
use crate::delta::{DeltaEngine, Results, ViewMeta, descending_by};
use crate::fmt::{format_pct, format_time};
use crate::model::TableLockRow;

use super::common::{Column, Lines, build_lines, build_records};
use super::View;

pub struct LocksView {
    engine: DeltaEngine<TableLockRow>,
}

impl LocksView {
    pub fn new(want_relative: bool) -> Self {
        Self {
            engine: DeltaEngine::new("table_locks", want_relative),
        }
    }

    fn results(&self) -> Results<TableLockRow> {
        self.engine.results(
            self.engine.meta().want_relative(),
            descending_by(|r: &TableLockRow| r.sum_timer_wait),
        )
    }
}

impl View for LocksView {
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError> {
        let rows = absent_as_empty(Table::TableLockWaits, source.table_lock_waits())?;
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
        "Table lock wait latency by table"
    }

    fn headings(&self) -> Vec<Column> {
        vec![
            Column::right("Latency", 10),
            Column::right("%", 7),
            Column::right("Read", 7),
            Column::right("Write", 7),
            Column::right("S.Lock", 7),
            Column::right("High", 7),
            Column::right("NoIns", 7),
            Column::right("Normal", 7),
            Column::right("Extrnl", 7),
            Column::right("AlloWr", 7),
            Column::right("CncIns", 7),
            Column::right("Low", 7),
            Column::right("Normal", 7),
            Column::right("Extrnl", 7),
            Column::left("Table Name", 30),
        ]
    }

    fn lines(&self, budget: usize) -> Lines {
        build_lines(
            &self.results(),
            budget,
            |r| r.sum_timer_wait,
            |r, total| {
                let of_row = |part| format_pct(part, r.sum_timer_wait);
                vec![
                    format_time(r.sum_timer_wait),
                    format_pct(r.sum_timer_wait, total.sum_timer_wait),
                    of_row(r.sum_timer_read),
                    of_row(r.sum_timer_write),
                    of_row(r.sum_timer_read_with_shared_locks),
                    of_row(r.sum_timer_read_high_priority),
                    of_row(r.sum_timer_read_no_insert),
                    of_row(r.sum_timer_read_normal),
                    of_row(r.sum_timer_read_external),
                    of_row(r.sum_timer_write_allow_write),
                    of_row(r.sum_timer_write_concurrent_insert),
                    of_row(r.sum_timer_write_low_priority),
                    of_row(r.sum_timer_write_normal),
                    of_row(r.sum_timer_write_external),
                    r.name.clone(),
                ]
            },
        )
    }

    fn records(&self, budget: usize) -> serde_json::Value {
        build_records(&self.results(), budget, |r| r.sum_timer_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockSource;

    #[test]
    fn splits_wait_by_lock_type() {
        let mut source = MockSource::new();
        source.push_table_locks(vec![TableLockRow {
            name: "shop.orders".to_string(),
            count_star: 4,
            sum_timer_wait: 1000,
            sum_timer_read: 250,
            sum_timer_write: 750,
            sum_timer_read_normal: 250,
            sum_timer_write_normal: 750,
            ..TableLockRow::default()
        }]);

        let mut view = LocksView::new(false);
        view.collect(&mut source).unwrap();
        let lines = view.lines(10);
        let cells = &lines.rows[0].cells;
        assert_eq!(cells.len(), view.headings().len());
        assert_eq!(cells[2], "25.0%");
        assert_eq!(cells[3], "75.0%");
        assert_eq!(cells[7], "25.0%");
        assert_eq!(cells[12], "75.0%");
        assert_eq!(cells[14], "shop.orders");
    }
}
