//! Counter rows read from performance_schema.
//!
//! Every row type is keyed by a `name` that is unique within one snapshot and
//! carries cumulative-since-server-start counters. Rows know how to add
//! themselves together (merging, totals) and how to subtract a baseline row
//! with per-field clamping (relative display).

mod file_io;
mod mutex;
mod stage;
mod table_io;
mod table_lock;
mod user;

pub use file_io::FileIoRow;
pub use mutex::MutexRow;
pub use stage::StageRow;
pub use table_io::TableIoRow;
pub use table_lock::TableLockRow;
pub use user::{ProcessRow, UserRow, aggregate_processlist};

use std::fmt::Debug;

/// Name of the synthesized row that sums all other result rows.
pub const TOTALS_NAME: &str = "Totals";

/// One entity's counters at a point in time.
pub trait MetricRow: Clone + Default + Debug {
    /// Unique key within a snapshot.
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// Aggregate counter used for ordering, zero-row filtering and
    /// counter-reset detection.
    fn primary(&self) -> u64;

    /// Adds every counter of `other` to `self`.
    fn add(&mut self, other: &Self);

    /// Subtracts every counter of `other` from `self`, clamping at zero.
    ///
    /// Returns the names of the counters that would have gone negative.
    fn subtract(&mut self, other: &Self) -> Vec<&'static str>;

    /// Describes a component counter exceeding its parent aggregate, if any.
    fn invariant_violation(&self) -> Option<String> {
        None
    }
}

/// Implements `add` and `subtract` over the listed `u64` counter fields.
macro_rules! counter_fields {
    ($($field:ident),+ $(,)?) => {
        fn add(&mut self, other: &Self) {
            $( self.$field = self.$field.saturating_add(other.$field); )+
        }

        fn subtract(&mut self, other: &Self) -> Vec<&'static str> {
            let mut underflow = Vec::new();
            $(
                if self.$field < other.$field {
                    underflow.push(stringify!($field));
                }
                self.$field = $crate::delta::delta(self.$field, other.$field);
            )+
            underflow
        }
    };
}

pub(crate) use counter_fields;

/// Returns a description when `sum(parts) > whole`.
pub(crate) fn check_components(label: &str, whole: u64, parts: &[u64]) -> Option<String> {
    let sum = parts.iter().fold(0u64, |acc, p| acc.saturating_add(*p));
    (sum > whole).then(|| format!("{label}: components {sum} exceed aggregate {whole}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_components_flags_only_excess() {
        assert_eq!(check_components("count", 10, &[3, 3, 4]), None);
        assert_eq!(
            check_components("count", 10, &[3, 3, 5]).as_deref(),
            Some("count: components 11 exceed aggregate 10")
        );
    }

    #[test]
    fn subtract_reports_underflowing_fields() {
        let mut latest = StageRow {
            name: "stage/sql/init".to_string(),
            count_star: 5,
            sum_timer_wait: 100,
        };
        let baseline = StageRow {
            name: "stage/sql/init".to_string(),
            count_star: 7,
            sum_timer_wait: 40,
        };

        let underflow = latest.subtract(&baseline);
        assert_eq!(underflow, vec!["count_star"]);
        assert_eq!(latest.count_star, 0);
        assert_eq!(latest.sum_timer_wait, 60);
    }
}
