use serde::Serialize;

use super::{MetricRow, counter_fields};

/// Statement stage latency aggregated by stage.
///
/// Source: `performance_schema.events_stages_summary_global_by_event_name`
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct StageRow {
    /// Stage name without the `stage/sql/` prefix.
    pub name: String,
    pub count_star: u64,
    pub sum_timer_wait: u64,
}

impl MetricRow for StageRow {
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
