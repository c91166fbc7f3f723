//! Snapshot delta engine.
//!
//! performance_schema counters grow monotonically from server start (or from
//! the last `TRUNCATE` of a summary table). Each view keeps two snapshots of
//! them: a `baseline` taken when measuring started and the `latest` one.
//! Results are either `latest` as-is (absolute) or `latest - baseline`
//! (relative), with every field clamped at zero.
//!
//! When the latest snapshot looks "behind" the baseline the counters were
//! reset on the server, and the baseline is re-anchored to the latest data.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::model::{MetricRow, TOTALS_NAME};

/// Counter difference clamped at zero: `current - reference` when
/// `current >= reference`, otherwise 0.
pub fn delta(current: u64, reference: u64) -> u64 {
    current.saturating_sub(reference)
}

/// Rows keyed by name plus the time they were collected.
#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    rows: Vec<R>,
    index: HashMap<String, usize>,
    collected_at: Option<Instant>,
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            collected_at: None,
        }
    }
}

impl<R: MetricRow> Snapshot<R> {
    /// Builds a snapshot. Rows repeating an earlier name are added into the
    /// first row with that name so names stay unique.
    pub fn new(rows: Vec<R>, collected_at: Instant) -> Self {
        let mut out: Vec<R> = Vec::with_capacity(rows.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        for row in rows {
            match index.get(row.name()).copied() {
                Some(i) => {
                    debug!(name = row.name(), "duplicate row name in snapshot, summing");
                    let existing: &mut R = &mut out[i];
                    existing.add(&row);
                }
                None => {
                    index.insert(row.name().to_string(), out.len());
                    out.push(row);
                }
            }
        }
        Self {
            rows: out,
            index,
            collected_at: Some(collected_at),
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn get(&self, name: &str) -> Option<&R> {
        self.index.get(name).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn collected_at(&self) -> Option<Instant> {
        self.collected_at
    }

    /// Field-wise sum of all rows, named [`TOTALS_NAME`].
    pub fn totals(&self) -> R {
        sum_rows(&self.rows)
    }

    /// Sum of every row's primary counter.
    pub fn total_primary(&self) -> u64 {
        self.rows
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.primary()))
    }
}

/// True when `reference` is ahead of `later`, which only happens after the
/// server-side counters were reset.
pub fn needs_refresh<R: MetricRow>(reference: &Snapshot<R>, later: &Snapshot<R>) -> bool {
    reference.total_primary() > later.total_primary()
}

/// Collection timestamps and display mode of one view.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewMeta {
    first_collected: Option<Instant>,
    last_collected: Option<Instant>,
    want_relative: bool,
}

impl ViewMeta {
    pub fn new(want_relative: bool) -> Self {
        Self {
            want_relative,
            ..Self::default()
        }
    }

    /// When the current baseline was taken.
    pub fn first_collected(&self) -> Option<Instant> {
        self.first_collected
    }

    /// When the latest snapshot was taken.
    pub fn last_collected(&self) -> Option<Instant> {
        self.last_collected
    }

    pub fn want_relative(&self) -> bool {
        self.want_relative
    }

    pub fn set_want_relative(&mut self, want_relative: bool) {
        self.want_relative = want_relative;
    }

    /// Time covered by relative results.
    pub fn elapsed(&self) -> Duration {
        match (self.first_collected, self.last_collected) {
            (Some(first), Some(last)) => last.saturating_duration_since(first),
            _ => Duration::ZERO,
        }
    }
}

/// Sorted rows plus their field-wise total.
#[derive(Debug, Clone)]
pub struct Results<R> {
    pub rows: Vec<R>,
    pub totals: R,
}

/// Baseline/latest state of one view.
#[derive(Debug)]
pub struct DeltaEngine<R> {
    label: &'static str,
    baseline: Snapshot<R>,
    latest: Snapshot<R>,
    meta: ViewMeta,
    /// Re-anchor when counters go backwards. Off for point-in-time rows.
    refresh_on_reset: bool,
}

impl<R: MetricRow> DeltaEngine<R> {
    /// `label` identifies the view in log messages.
    pub fn new(label: &'static str, want_relative: bool) -> Self {
        Self {
            label,
            baseline: Snapshot::default(),
            latest: Snapshot::default(),
            meta: ViewMeta::new(want_relative),
            refresh_on_reset: true,
        }
    }

    /// Engine for rows that are present-moment values rather than
    /// monotonic counters; a drop between samples is normal.
    pub fn point_in_time(label: &'static str) -> Self {
        Self {
            refresh_on_reset: false,
            ..Self::new(label, false)
        }
    }

    pub fn collect(&mut self, rows: Vec<R>) {
        self.collect_at(rows, Instant::now());
    }

    /// Replaces `latest` with `rows` and re-anchors the baseline on the first
    /// collection or after a counter reset.
    pub fn collect_at(&mut self, rows: Vec<R>, now: Instant) {
        for row in &rows {
            if let Some(violation) = row.invariant_violation() {
                warn!(view = self.label, name = row.name(), %violation, "inconsistent counters");
            }
        }

        self.latest = Snapshot::new(rows, now);
        self.meta.last_collected = Some(now);

        if self.baseline.is_empty() {
            self.anchor(now);
        } else if self.refresh_on_reset && needs_refresh(&self.baseline, &self.latest) {
            warn!(
                view = self.label,
                baseline = self.baseline.total_primary(),
                latest = self.latest.total_primary(),
                "counters went backwards, resetting baseline"
            );
            self.anchor(now);
        }
    }

    /// Starts measuring from the latest snapshot.
    pub fn reset_baseline(&mut self) {
        let now = self.latest.collected_at().unwrap_or_else(Instant::now);
        self.anchor(now);
    }

    fn anchor(&mut self, now: Instant) {
        self.baseline = self.latest.clone();
        self.meta.first_collected = Some(now);
    }

    /// Builds results from scratch: `latest`, or `latest - baseline` per name
    /// when `want_relative`. Rows without a baseline counterpart pass through.
    pub fn results(&self, want_relative: bool, order: impl Fn(&R, &R) -> Ordering) -> Results<R> {
        let mut rows: Vec<R> = if want_relative {
            self.latest
                .rows()
                .iter()
                .map(|row| {
                    let mut out = row.clone();
                    if let Some(base) = self.baseline.get(row.name()) {
                        let underflow = out.subtract(base);
                        if !underflow.is_empty() {
                            warn!(
                                view = self.label,
                                name = row.name(),
                                fields = ?underflow,
                                "latest counter below baseline, clamped to zero"
                            );
                        }
                    }
                    out
                })
                .collect()
        } else {
            self.latest.rows().to_vec()
        };

        rows.sort_by(|a, b| order(a, b));
        let totals = sum_rows(&rows);
        Results { rows, totals }
    }

    pub fn baseline(&self) -> &Snapshot<R> {
        &self.baseline
    }

    pub fn latest(&self) -> &Snapshot<R> {
        &self.latest
    }

    pub fn meta(&self) -> &ViewMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut ViewMeta {
        &mut self.meta
    }
}

fn sum_rows<R: MetricRow>(rows: &[R]) -> R {
    let mut totals = R::default();
    totals.set_name(TOTALS_NAME.to_string());
    for row in rows {
        totals.add(row);
    }
    totals
}

/// Groups rows by a derived name and sums rows that share it.
///
/// Rows whose primary counter is zero are dropped before renaming. Output
/// keeps first-seen order.
pub fn merge_by_name<R: MetricRow>(rows: Vec<R>, mut rename: impl FnMut(&str) -> String) -> Vec<R> {
    let mut merged: Vec<R> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut row in rows {
        if row.primary() == 0 {
            continue;
        }
        let name = rename(row.name());
        match index.get(&name).copied() {
            Some(i) => merged[i].add(&row),
            None => {
                index.insert(name.clone(), merged.len());
                row.set_name(name);
                merged.push(row);
            }
        }
    }
    merged
}

/// Orders by `key` descending, then by name ascending.
pub fn descending_by<R: MetricRow>(key: impl Fn(&R) -> u64) -> impl Fn(&R, &R) -> Ordering {
    move |a, b| key(b).cmp(&key(a)).then_with(|| a.name().cmp(b.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileIoRow, MutexRow};
    use crate::normalize::{NormalizerConfig, ObjectNormalizer};

    fn mutex(name: &str, count: u64, wait: u64) -> MutexRow {
        MutexRow {
            name: name.to_string(),
            count_star: count,
            sum_timer_wait: wait,
        }
    }

    fn by_wait() -> impl Fn(&MutexRow, &MutexRow) -> Ordering {
        descending_by(|r: &MutexRow| r.sum_timer_wait)
    }

    #[test]
    fn delta_clamps_instead_of_wrapping() {
        let values = [0, 1, 2, 1000, u64::MAX - 1, u64::MAX];
        for &a in &values {
            for &b in &values {
                let expected = if a >= b { a - b } else { 0 };
                assert_eq!(delta(a, b), expected, "delta({a}, {b})");
            }
        }
    }

    #[test]
    fn first_collect_anchors_baseline() {
        let mut engine = DeltaEngine::new("test", true);
        engine.collect(vec![mutex("a", 1, 10)]);

        assert_eq!(engine.baseline().rows(), engine.latest().rows());
        let results = engine.results(true, by_wait());
        assert_eq!(results.rows[0].sum_timer_wait, 0);
        assert!(engine.meta().first_collected().is_some());
    }

    #[test]
    fn point_in_time_engine_keeps_baseline_on_drop() {
        let mut engine = DeltaEngine::point_in_time("test");
        let t0 = Instant::now();
        engine.collect_at(vec![mutex("a", 5, 100)], t0);
        engine.collect_at(vec![mutex("a", 4, 80)], t0 + Duration::from_secs(1));

        assert_eq!(engine.baseline().rows(), &[mutex("a", 5, 100)]);
        assert_eq!(engine.meta().first_collected(), Some(t0));
        assert_eq!(engine.results(false, by_wait()).rows, vec![mutex("a", 4, 80)]);
    }

    #[test]
    fn counter_reset_reanchors_baseline() {
        let mut engine = DeltaEngine::new("test", true);
        let t0 = Instant::now();
        engine.collect_at(vec![mutex("a", 5, 100)], t0);
        engine.collect_at(vec![mutex("a", 4, 80)], t0 + Duration::from_secs(1));

        assert_eq!(engine.baseline().rows(), &[mutex("a", 4, 80)]);
        let results = engine.results(true, by_wait());
        assert_eq!(results.rows, vec![mutex("a", 0, 0)]);
        assert_eq!(
            engine.meta().first_collected(),
            Some(t0 + Duration::from_secs(1))
        );

        // a later snapshot replaces latest without touching the stored baseline
        engine.collect_at(vec![mutex("a", 9, 90)], t0 + Duration::from_secs(2));
        assert_eq!(engine.baseline().rows(), &[mutex("a", 4, 80)]);
        assert_eq!(engine.results(true, by_wait()).rows, vec![mutex("a", 5, 10)]);
    }

    #[test]
    fn relative_results_follow_fixed_baseline() {
        let mut engine = DeltaEngine::new("test", true);
        engine.collect(vec![mutex("a", 50, 50)]);
        engine.collect(vec![mutex("a", 80, 80)]);

        let results = engine.results(true, by_wait());
        assert_eq!(results.rows, vec![mutex("a", 30, 30)]);

        let absolute = engine.results(false, by_wait());
        assert_eq!(absolute.rows, vec![mutex("a", 80, 80)]);
    }

    #[test]
    fn single_field_underflow_is_clamped() {
        let mut engine = DeltaEngine::new("test", true);
        engine.collect(vec![mutex("a", 10, 100), mutex("b", 0, 0)]);
        // "a" lost a few counts while the aggregate still grew
        engine.collect(vec![mutex("a", 7, 150), mutex("b", 1, 1)]);

        let results = engine.results(true, by_wait());
        assert_eq!(results.rows[0], mutex("a", 0, 50));
    }

    #[test]
    fn new_rows_pass_through_relative_mode() {
        let mut engine = DeltaEngine::new("test", true);
        engine.collect(vec![mutex("a", 1, 10)]);
        engine.collect(vec![mutex("a", 2, 20), mutex("b", 3, 30)]);

        let results = engine.results(true, by_wait());
        assert_eq!(results.rows, vec![mutex("b", 3, 30), mutex("a", 1, 10)]);
    }

    #[test]
    fn reset_baseline_starts_from_latest() {
        let mut engine = DeltaEngine::new("test", true);
        engine.collect(vec![mutex("a", 1, 10)]);
        engine.collect(vec![mutex("a", 5, 50)]);
        engine.reset_baseline();

        assert_eq!(engine.results(true, by_wait()).rows, vec![mutex("a", 0, 0)]);
        engine.collect(vec![mutex("a", 6, 70)]);
        assert_eq!(engine.results(true, by_wait()).rows, vec![mutex("a", 1, 20)]);
    }

    #[test]
    fn totals_are_field_wise_sums_in_both_modes() {
        let mut engine = DeltaEngine::new("test", true);
        engine.collect(vec![mutex("a", 1, 10), mutex("b", 2, 20)]);
        engine.collect(vec![
            mutex("a", 4, 15),
            mutex("b", 9, 70),
            mutex("c", 1, 5),
        ]);

        for relative in [true, false] {
            let results = engine.results(relative, by_wait());
            let count: u64 = results.rows.iter().map(|r| r.count_star).sum();
            let wait: u64 = results.rows.iter().map(|r| r.sum_timer_wait).sum();
            assert_eq!(results.totals.name, TOTALS_NAME);
            assert_eq!(results.totals.count_star, count);
            assert_eq!(results.totals.sum_timer_wait, wait);
        }
    }

    #[test]
    fn ordering_uses_key_then_name() {
        let mut engine = DeltaEngine::new("test", false);
        engine.collect(vec![
            mutex("c", 1, 10),
            mutex("b", 5, 30),
            mutex("a", 9, 10),
        ]);

        let names = |r: Results<MutexRow>| r.rows.into_iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(names(engine.results(false, by_wait())), vec!["b", "a", "c"]);
        assert_eq!(
            names(engine.results(false, descending_by(|r: &MutexRow| r.count_star))),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn merge_sums_rows_with_the_same_canonical_name() {
        let mut normalizer = ObjectNormalizer::new(&NormalizerConfig {
            datadir: "/data/".to_string(),
            relay_log: String::new(),
        });
        let rows = vec![
            FileIoRow {
                name: "/data/db1/orders.ibd".to_string(),
                count_star: 3,
                sum_timer_wait: 300,
                count_read: 3,
                sum_timer_read: 300,
                ..FileIoRow::default()
            },
            FileIoRow {
                name: "/data/db1/orders#P#p1.ibd".to_string(),
                count_star: 2,
                sum_timer_wait: 200,
                count_write: 2,
                sum_timer_write: 200,
                ..FileIoRow::default()
            },
            FileIoRow {
                name: "/data/db1/idle.ibd".to_string(),
                ..FileIoRow::default()
            },
        ];

        let merged = merge_by_name(rows, |n| normalizer.normalize(n));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "db1.orders");
        assert_eq!(merged[0].count_star, 5);
        assert_eq!(merged[0].sum_timer_wait, 500);
        assert_eq!(merged[0].count_read, 3);
        assert_eq!(merged[0].count_write, 2);
    }

    #[test]
    fn merging_twice_keeps_totals() {
        let mut normalizer = ObjectNormalizer::new(&NormalizerConfig::default());
        let rows = vec![
            mutex("/x/db/t1.ibd", 1, 10),
            mutex("/x/db/t1#P#p0.ibd", 2, 20),
            mutex("/x/db/#sql-1.ibd", 3, 30),
            mutex("/x/db/#sql-2.ibd", 4, 40),
            mutex("/x/ibdata1", 5, 50),
        ];

        let once = merge_by_name(rows, |n| normalizer.normalize(n));
        let twice = merge_by_name(once.clone(), |n| normalizer.normalize(n));

        assert_eq!(once, twice);
        assert_eq!(sum_rows(&once), sum_rows(&twice));
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn duplicate_names_in_a_snapshot_are_summed() {
        let snapshot = Snapshot::new(vec![mutex("a", 1, 10), mutex("a", 2, 20)], Instant::now());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("a"), Some(&mutex("a", 3, 30)));
    }

    #[test]
    fn meta_elapsed_spans_baseline_to_latest() {
        let mut engine = DeltaEngine::new("test", true);
        let t0 = Instant::now();
        engine.collect_at(vec![mutex("a", 1, 1)], t0);
        engine.collect_at(vec![mutex("a", 2, 2)], t0 + Duration::from_secs(7));
        assert_eq!(engine.meta().elapsed(), Duration::from_secs(7));
        assert!(engine.meta().want_relative());
    }
}
