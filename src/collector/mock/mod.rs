//! In-memory [`MetricsSource`] for tests.
//!
//! Each table replays a queue of row sets: every call pops the front one
//! until a single set is left, which then repeats forever. Calls are counted
//! per table so tests can assert which views actually queried.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::collector::{CollectError, InstrumentSetting, MetricsSource, Table};
use crate::model::{FileIoRow, MutexRow, ProcessRow, StageRow, TableIoRow, TableLockRow};

#[derive(Debug)]
struct Script<T> {
    steps: VecDeque<Vec<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Vec<T> {
        if self.steps.len() > 1 {
            self.steps.pop_front().unwrap_or_default()
        } else {
            self.steps.front().cloned().unwrap_or_default()
        }
    }
}

/// Scripted source with call counters.
#[derive(Debug, Default)]
pub struct MockSource {
    table_io: Script<TableIoRow>,
    file_io: Script<FileIoRow>,
    table_locks: Script<TableLockRow>,
    mutexes: Script<MutexRow>,
    stages: Script<StageRow>,
    processes: Script<ProcessRow>,
    missing: HashSet<Table>,
    disconnected: bool,
    calls: HashMap<Table, usize>,
    variables: HashMap<String, String>,
    uptime: u64,
    instruments: Vec<InstrumentSetting>,
    instrument_writes: usize,
    deny_instrument_updates: bool,
}

impl MockSource {
    /// A healthy 8.0 server with performance_schema on and no rows.
    pub fn new() -> Self {
        let mut source = Self {
            uptime: 3600,
            ..Self::default()
        };
        source.set_variable("version", "8.0.36");
        source.set_variable("performance_schema", "ON");
        source
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_string(), value.to_string());
    }

    pub fn push_table_io(&mut self, rows: Vec<TableIoRow>) {
        self.table_io.steps.push_back(rows);
    }

    pub fn push_file_io(&mut self, rows: Vec<FileIoRow>) {
        self.file_io.steps.push_back(rows);
    }

    pub fn push_table_locks(&mut self, rows: Vec<TableLockRow>) {
        self.table_locks.steps.push_back(rows);
    }

    pub fn push_mutexes(&mut self, rows: Vec<MutexRow>) {
        self.mutexes.steps.push_back(rows);
    }

    pub fn push_stages(&mut self, rows: Vec<StageRow>) {
        self.stages.steps.push_back(rows);
    }

    pub fn push_processes(&mut self, rows: Vec<ProcessRow>) {
        self.processes.steps.push_back(rows);
    }

    /// Makes `table` answer with [`CollectError::MissingTable`].
    pub fn set_missing(&mut self, table: Table) {
        self.missing.insert(table);
    }

    /// Makes every call fail with [`CollectError::Connection`].
    pub fn set_disconnected(&mut self, disconnected: bool) {
        self.disconnected = disconnected;
    }

    pub fn set_instruments(&mut self, instruments: Vec<InstrumentSetting>) {
        self.instruments = instruments;
    }

    /// Makes instrument updates fail like a read-only server.
    pub fn deny_instrument_updates(&mut self) {
        self.deny_instrument_updates = true;
    }

    pub fn instrument(&self, name: &str) -> Option<InstrumentSetting> {
        self.instruments.iter().find(|i| i.name == name).cloned()
    }

    /// Successful `set_instrument` calls so far.
    pub fn instrument_writes(&self) -> usize {
        self.instrument_writes
    }

    /// Number of queries issued against `table`.
    pub fn calls(&self, table: Table) -> usize {
        self.calls.get(&table).copied().unwrap_or(0)
    }

    /// Total queries across all tables.
    pub fn total_calls(&self) -> usize {
        self.calls.values().sum()
    }

    fn check(&mut self, table: Table) -> Result<(), CollectError> {
        *self.calls.entry(table).or_insert(0) += 1;
        if self.disconnected {
            return Err(CollectError::Connection("connection refused".to_string()));
        }
        if self.missing.contains(&table) {
            return Err(CollectError::MissingTable(format!(
                "Table '{}' doesn't exist",
                table.name()
            )));
        }
        Ok(())
    }
}

fn like(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('%') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}

impl MetricsSource for MockSource {
    fn table_io_waits(&mut self) -> Result<Vec<TableIoRow>, CollectError> {
        self.check(Table::TableIoWaits)?;
        Ok(self.table_io.next())
    }

    fn file_io(&mut self) -> Result<Vec<FileIoRow>, CollectError> {
        self.check(Table::FileSummary)?;
        Ok(self.file_io.next())
    }

    fn table_lock_waits(&mut self) -> Result<Vec<TableLockRow>, CollectError> {
        self.check(Table::TableLockWaits)?;
        Ok(self.table_locks.next())
    }

    fn mutex_waits(&mut self) -> Result<Vec<MutexRow>, CollectError> {
        self.check(Table::MutexWaits)?;
        Ok(self.mutexes.next())
    }

    fn stages(&mut self) -> Result<Vec<StageRow>, CollectError> {
        self.check(Table::Stages)?;
        Ok(self.stages.next())
    }

    fn processlist(&mut self) -> Result<Vec<ProcessRow>, CollectError> {
        self.check(Table::Processlist)?;
        Ok(self.processes.next())
    }

    fn variable(&mut self, name: &str) -> Result<Option<String>, CollectError> {
        if self.disconnected {
            return Err(CollectError::Connection("connection refused".to_string()));
        }
        Ok(self.variables.get(name).cloned())
    }

    fn uptime(&mut self) -> Result<Option<u64>, CollectError> {
        if self.disconnected {
            return Err(CollectError::Connection("connection refused".to_string()));
        }
        Ok(Some(self.uptime))
    }

    fn disabled_instruments(
        &mut self,
        patterns: &[&str],
    ) -> Result<Vec<InstrumentSetting>, CollectError> {
        Ok(self
            .instruments
            .iter()
            .filter(|i| !(i.enabled && i.timed))
            .filter(|i| patterns.iter().any(|p| like(p, &i.name)))
            .cloned()
            .collect())
    }

    fn set_instrument(&mut self, setting: &InstrumentSetting) -> Result<(), CollectError> {
        if self.deny_instrument_updates {
            return Err(CollectError::AccessDenied(
                "The MySQL server is running with the --read-only option".to_string(),
            ));
        }
        if let Some(existing) = self.instruments.iter_mut().find(|i| i.name == setting.name) {
            *existing = setting.clone();
            self.instrument_writes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, wait: u64) -> StageRow {
        StageRow {
            name: name.to_string(),
            count_star: 1,
            sum_timer_wait: wait,
        }
    }

    #[test]
    fn replays_steps_then_repeats_last() {
        let mut source = MockSource::new();
        source.push_stages(vec![stage("a", 1)]);
        source.push_stages(vec![stage("a", 2)]);

        assert_eq!(source.stages().unwrap()[0].sum_timer_wait, 1);
        assert_eq!(source.stages().unwrap()[0].sum_timer_wait, 2);
        assert_eq!(source.stages().unwrap()[0].sum_timer_wait, 2);
        assert_eq!(source.calls(Table::Stages), 3);
        assert_eq!(source.calls(Table::MutexWaits), 0);
    }

    #[test]
    fn like_matches_prefix_patterns() {
        assert!(like("stage/%", "stage/sql/init"));
        assert!(!like("stage/%", "statement/sql/select"));
        assert!(like("exact", "exact"));
    }
}
