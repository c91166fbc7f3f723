//! Statement stage latency.

use crate::collector::{CollectError, MetricsSource, Table, absent_as_empty};
use crate::delta::{DeltaEngine, Results, ViewMeta, descending_by};
use crate::fmt::{format_amount, format_pct, format_time};
use crate::model::StageRow;

use super::common::{Column, Lines, build_lines, build_records};
use super::View;

const STAGE_PREFIX: &str = "stage/sql/";

pub struct StagesView {
    engine: DeltaEngine<StageRow>,
}

impl StagesView {
    pub fn new(want_relative: bool) -> Self {
        Self {
            engine: DeltaEngine::new("stages", want_relative),
        }
    }

    fn results(&self) -> Results<StageRow> {
        self.engine.results(
            self.engine.meta().want_relative(),
            descending_by(|r: &StageRow| r.sum_timer_wait),
        )
    }
}

impl View for StagesView {
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError> {
        let rows = absent_as_empty(Table::Stages, source.stages())?;
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
        "Stage latency by stage name"
    }

    fn headings(&self) -> Vec<Column> {
        vec![
            Column::right("Latency", 10),
            Column::right("%", 7),
            Column::right("Count", 9),
            Column::left("Stage Name", 30),
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
                    r.name.strip_prefix(STAGE_PREFIX).unwrap_or(&r.name).to_string(),
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

    fn stage(name: &str, wait: u64) -> StageRow {
        StageRow {
            name: name.to_string(),
            count_star: 1,
            sum_timer_wait: wait,
        }
    }

    #[test]
    fn counter_reset_reanchors_baseline() {
        let mut source = MockSource::new();
        source.push_stages(vec![stage("stage/sql/Sending data", 100)]);
        source.push_stages(vec![stage("stage/sql/Sending data", 80)]);
        source.push_stages(vec![stage("stage/sql/Sending data", 95)]);

        let mut view = StagesView::new(true);
        view.collect(&mut source).unwrap();
        view.collect(&mut source).unwrap();
        assert!(view.lines(10).rows.is_empty());

        view.collect(&mut source).unwrap();
        let lines = view.lines(10);
        assert_eq!(lines.rows[0].cells[3], "Sending data");
        assert_eq!(lines.rows[0].cells[0], format_time(15));
    }

    #[test]
    fn other_stage_families_keep_their_prefix() {
        let mut source = MockSource::new();
        source.push_stages(vec![stage("stage/innodb/alter table (read PK)", 7)]);
        let mut view = StagesView::new(false);
        view.collect(&mut source).unwrap();
        assert_eq!(
            view.lines(10).rows[0].cells[3],
            "stage/innodb/alter table (read PK)"
        );
    }
}
