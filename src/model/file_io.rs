use serde::Serialize;

use super::{MetricRow, check_components, counter_fields};

/// File I/O for one file handle, or for a logical object after merging.
///
/// Source: `performance_schema.file_summary_by_instance`
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct FileIoRow {
    /// Raw file path as reported by the server, replaced by the canonical
    /// name once normalized.
    /// Source: `FILE_NAME`
    pub name: String,

    pub count_star: u64,
    pub sum_timer_wait: u64,

    pub count_read: u64,
    pub sum_timer_read: u64,
    /// Source: `SUM_NUMBER_OF_BYTES_READ`
    pub bytes_read: u64,

    pub count_write: u64,
    pub sum_timer_write: u64,
    /// Source: `SUM_NUMBER_OF_BYTES_WRITE`
    pub bytes_write: u64,

    /// Open, close, sync and friends.
    pub count_misc: u64,
    pub sum_timer_misc: u64,
}

impl MetricRow for FileIoRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn primary(&self) -> u64 {
        self.sum_timer_wait
    }

    counter_fields!(
        count_star,
        sum_timer_wait,
        count_read,
        sum_timer_read,
        bytes_read,
        count_write,
        sum_timer_write,
        bytes_write,
        count_misc,
        sum_timer_misc,
    );

    fn invariant_violation(&self) -> Option<String> {
        check_components(
            "count_star",
            self.count_star,
            &[self.count_read, self.count_write, self.count_misc],
        )
        .or_else(|| {
            check_components(
                "sum_timer_wait",
                self.sum_timer_wait,
                &[self.sum_timer_read, self.sum_timer_write, self.sum_timer_misc],
            )
        })
    }
}
