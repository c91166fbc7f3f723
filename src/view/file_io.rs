//! File I/O grouped into logical objects.

use crate::collector::{CollectError, MetricsSource, Table, absent_as_empty};
use crate::delta::{DeltaEngine, Results, ViewMeta, descending_by, merge_by_name};
use crate::fmt::{format_amount, format_bytes, format_pct, format_time};
use crate::model::FileIoRow;
use crate::normalize::{NormalizerConfig, ObjectNormalizer};

use super::common::{Column, Lines, build_lines, build_records};
use super::View;

pub struct FileIoView {
    engine: DeltaEngine<FileIoRow>,
    normalizer: ObjectNormalizer,
}

impl FileIoView {
    pub fn new(config: &NormalizerConfig, want_relative: bool) -> Self {
        Self {
            engine: DeltaEngine::new("file_io", want_relative),
            normalizer: ObjectNormalizer::new(config),
        }
    }

    fn results(&self) -> Results<FileIoRow> {
        self.engine.results(
            self.engine.meta().want_relative(),
            descending_by(|r: &FileIoRow| r.sum_timer_wait),
        )
    }
}

impl View for FileIoView {
    fn collect(&mut self, source: &mut dyn MetricsSource) -> Result<(), CollectError> {
        let raw = absent_as_empty(Table::FileSummary, source.file_io())?;
        let normalizer = &mut self.normalizer;
        let rows = merge_by_name(raw, |name| normalizer.normalize(name));
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
        "File I/O latency by object"
    }

    fn headings(&self) -> Vec<Column> {
        vec![
            Column::right("Latency", 10),
            Column::right("%", 7),
            Column::right("Read", 7),
            Column::right("Write", 7),
            Column::right("Misc", 7),
            Column::right("Rd bytes", 10),
            Column::right("Wr bytes", 10),
            Column::right("Ops", 9),
            Column::left("File Name", 30),
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
                    format_pct(r.sum_timer_read, r.sum_timer_wait),
                    format_pct(r.sum_timer_write, r.sum_timer_wait),
                    format_pct(r.sum_timer_misc, r.sum_timer_wait),
                    format_bytes(r.bytes_read),
                    format_bytes(r.bytes_write),
                    format_amount(r.count_star),
                    r.name.clone(),
                ]
            },
        )
    }

    fn records(&self, budget: usize) -> serde_json::Value {
        build_records(&self.results(), budget, |r| r.sum_timer_wait)
    }
}
