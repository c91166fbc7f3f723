//! Mutex wait latency.

use crate::collector::{CollectError, MetricsSource, Table, absent_as_empty};
use crate::delta::{DeltaEngine, Results, ViewMeta, descending_by};
use crate::fmt::{format_amount, format_pct, format_time};
use crate::model::MutexRow;

use super::common::{Column, Lines, build_lines, build_records};
use super::View;

const MUTEX_PREFIX: &str = "wait/synch/mutex/";

pub struct MutexView {
    engine: DeltaEngine<MutexRow>,
}

impl MutexView {
    pub fn new(want_relative: bool) -> Self {
        Self {
            engine: DeltaEngine::new("mutex", want_relative),
        }
    }

    fn results(&self) -> Results<MutexRow> {
        self.engine.results(
            self.engine.meta().want_relative(),
            descending_by(|r: &MutexRow| r.sum_timer_wait),
        )
    }
}

impl View for MutexView {
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError> {
        let rows = absent_as_empty(Table::MutexWaits, source.mutex_waits())?;
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
        "Mutex wait latency by instrument"
    }

    fn headings(&self) -> Vec<Column> {
        vec![
            Column::right("Latency", 10),
            Column::right("%", 7),
            Column::right("Count", 9),
            Column::left("Mutex Name", 30),
        ]
    }

    fn lines(&self, budget: usize) -> Lines {
        build_lines(
            &self.results(),
            budget,
            |r| r.sum_timer_wait,
            |r, total| {
                vec![
                    format_time(r.sum_timer_wait),
                    format_pct(r.sum_timer_wait, total.sum_timer_wait),
                    format_amount(r.count_star),
                    r.name.strip_prefix(MUTEX_PREFIX).unwrap_or(&r.name).to_string(),
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
    fn strips_instrument_prefix_for_display() {
        let mut source = MockSource::new();
        source.push_mutexes(vec![MutexRow {
            name: "wait/synch/mutex/innodb/trx_sys_mutex".to_string(),
            count_star: 12,
            sum_timer_wait: 5_000,
        }]);

        let mut view = MutexView::new(false);
        view.collect(&mut source).unwrap();
        let lines = view.lines(10);
        assert_eq!(lines.rows[0].cells[3], "innodb/trx_sys_mutex");
        assert_eq!(lines.rows[0].cells[2], "12");

        let records = view.records(10);
        assert_eq!(records["rows"][0]["name"], "wait/synch/mutex/innodb/trx_sys_mutex");
    }
}
