//! Abstraction over the database connection.

use crate::model::{FileIoRow, MutexRow, ProcessRow, StageRow, TableIoRow, TableLockRow};

use super::{CollectError, InstrumentSetting};

/// Source of rows and server settings.
///
/// Implementations issue one query per call and never retry; a failed call
/// leaves the view's previous data in place until the next tick.
pub trait MetricsSource {
    fn table_io_waits(&mut self) -> Result<Vec<TableIoRow>, CollectError>;

    /// Raw per-file rows; names are unnormalized file paths.
    fn file_io(&mut self) -> Result<Vec<FileIoRow>, CollectError>;

    fn table_lock_waits(&mut self) -> Result<Vec<TableLockRow>, CollectError>;

    fn mutex_waits(&mut self) -> Result<Vec<MutexRow>, CollectError>;

    fn stages(&mut self) -> Result<Vec<StageRow>, CollectError>;

    /// Current connections, excluding the monitor's own.
    fn processlist(&mut self) -> Result<Vec<ProcessRow>, CollectError>;

    /// Global server variable, `None` when unset or unknown.
    fn variable(&mut self, name: &str) -> Result<Option<String>, CollectError>;

    /// Server uptime in seconds.
    fn uptime(&mut self) -> Result<Option<u64>, CollectError>;

    /// Instruments matching any of the `LIKE` patterns that are not both
    /// enabled and timed.
    fn disabled_instruments(
        &mut self,
        patterns: &[&str],
    ) -> Result<Vec<InstrumentSetting>, CollectError>;

    fn set_instrument(&mut self, setting: &InstrumentSetting) -> Result<(), CollectError>;
}
