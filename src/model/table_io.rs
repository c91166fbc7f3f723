use serde::Serialize;

use super::{MetricRow, check_components, counter_fields};

/// Table I/O waits for one table.
///
/// Source: `performance_schema.table_io_waits_summary_by_table`
///
/// Timers are in picoseconds.
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct TableIoRow {
    /// `schema.table`.
    /// Source: `OBJECT_SCHEMA`, `OBJECT_NAME`
    pub name: String,

    pub count_star: u64,
    pub sum_timer_wait: u64,

    pub count_read: u64,
    pub sum_timer_read: u64,
    pub count_write: u64,
    pub sum_timer_write: u64,

    /// Read breakdown. Fetch is the only read operation.
    pub count_fetch: u64,
    pub sum_timer_fetch: u64,

    /// Write breakdown.
    pub count_insert: u64,
    pub sum_timer_insert: u64,
    pub count_update: u64,
    pub sum_timer_update: u64,
    pub count_delete: u64,
    pub sum_timer_delete: u64,
}

impl MetricRow for TableIoRow {
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
        count_write,
        sum_timer_write,
        count_fetch,
        sum_timer_fetch,
        count_insert,
        sum_timer_insert,
        count_update,
        sum_timer_update,
        count_delete,
        sum_timer_delete,
    );

    fn invariant_violation(&self) -> Option<String> {
        check_components(
            "count_star",
            self.count_star,
            &[self.count_read, self.count_write],
        )
        .or_else(|| {
            check_components(
                "sum_timer_wait",
                self.sum_timer_wait,
                &[self.sum_timer_read, self.sum_timer_write],
            )
        })
        .or_else(|| {
            check_components(
                "count_write",
                self.count_write,
                &[self.count_insert, self.count_update, self.count_delete],
            )
        })
        .or_else(|| {
            check_components(
                "sum_timer_write",
                self.sum_timer_write,
                &[
                    self.sum_timer_insert,
                    self.sum_timer_update,
                    self.sum_timer_delete,
                ],
            )
        })
    }
}
