use serde::Serialize;

use super::{MetricRow, counter_fields};

/// Mutex waits aggregated by instrument.
///
/// Source: `performance_schema.events_waits_summary_global_by_event_name`
/// restricted to `wait/synch/mutex/%`.
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct MutexRow {
    /// Instrument name without the `wait/synch/mutex/` prefix.
    pub name: String,
    pub count_star: u64,
    pub sum_timer_wait: u64,
}

impl MetricRow for MutexRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn primary(&self) -> u64 {
        self.sum_timer_wait
    }

    counter_fields!(count_star, sum_timer_wait);
}
