use serde::Serialize;

use super::{MetricRow, check_components, counter_fields};

/// Table lock waits for one table.
///
/// Source: `performance_schema.table_lock_waits_summary_by_table`
///
/// Only the timers are kept; the per-lock-type counts are not displayed.
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct TableLockRow {
    /// `schema.table`.
    pub name: String,

    pub count_star: u64,
    pub sum_timer_wait: u64,
    pub sum_timer_read: u64,
    pub sum_timer_write: u64,

    pub sum_timer_read_with_shared_locks: u64,
    pub sum_timer_read_high_priority: u64,
    pub sum_timer_read_no_insert: u64,
    pub sum_timer_read_normal: u64,
    pub sum_timer_read_external: u64,

    pub sum_timer_write_allow_write: u64,
    pub sum_timer_write_concurrent_insert: u64,
    pub sum_timer_write_low_priority: u64,
    pub sum_timer_write_normal: u64,
    pub sum_timer_write_external: u64,
}

impl MetricRow for TableLockRow {
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
        sum_timer_read,
        sum_timer_write,
        sum_timer_read_with_shared_locks,
        sum_timer_read_high_priority,
        sum_timer_read_no_insert,
        sum_timer_read_normal,
        sum_timer_read_external,
        sum_timer_write_allow_write,
        sum_timer_write_concurrent_insert,
        sum_timer_write_low_priority,
        sum_timer_write_normal,
        sum_timer_write_external,
    );

    fn invariant_violation(&self) -> Option<String> {
        check_components(
            "sum_timer_wait",
            self.sum_timer_wait,
            &[self.sum_timer_read, self.sum_timer_write],
        )
    }
}
