//! Row sources for the metric views.
//!
//! Views never talk to the server directly; they go through the
//! [`MetricsSource`] trait so the scheduler can own a single connection and
//! tests can substitute [`mock::MockSource`].
//!
//! Tables read:
//! - `table_io_waits_summary_by_table` - latency/ops views
//! - `file_summary_by_instance` - file I/O view
//! - `table_lock_waits_summary_by_table` - locks view
//! - `events_waits_summary_global_by_event_name` - mutex view
//! - `events_stages_summary_global_by_event_name` - stages view
//! - `information_schema.processlist` - users view

mod instruments;
pub mod mock;
mod mysql_source;
mod queries;
mod server;
mod traits;

pub use instruments::{INSTRUMENT_PATTERNS, InstrumentSetting, Instruments};
pub use mysql_source::MySqlSource;
pub use server::{MIN_VERSION, ServerInfo, StartupError, Version, check_server};
pub use traits::MetricsSource;

use tracing::debug;

/// Tables the views read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    TableIoWaits,
    FileSummary,
    TableLockWaits,
    MutexWaits,
    Stages,
    Processlist,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::TableIoWaits => "performance_schema.table_io_waits_summary_by_table",
            Table::FileSummary => "performance_schema.file_summary_by_instance",
            Table::TableLockWaits => "performance_schema.table_lock_waits_summary_by_table",
            Table::MutexWaits => "performance_schema.events_waits_summary_global_by_event_name",
            Table::Stages => "performance_schema.events_stages_summary_global_by_event_name",
            Table::Processlist => "information_schema.processlist",
        }
    }
}

/// Error type for metric collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    /// Connection could not be established or was lost.
    Connection(String),
    /// Table does not exist on this server version or edition.
    MissingTable(String),
    /// Insufficient privileges or read-only server.
    AccessDenied(String),
    /// Any other query failure.
    Query(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Connection(msg) => write!(f, "MySQL connection: {}", msg),
            CollectError::MissingTable(msg) => write!(f, "MySQL missing table: {}", msg),
            CollectError::AccessDenied(msg) => write!(f, "MySQL access denied: {}", msg),
            CollectError::Query(msg) => write!(f, "MySQL query error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

/// Treats a missing optional table as "no data this cycle".
pub fn absent_as_empty<T>(
    table: Table,
    result: Result<Vec<T>, CollectError>,
) -> Result<Vec<T>, CollectError> {
    match result {
        Err(CollectError::MissingTable(msg)) => {
            debug!(table = table.name(), error = %msg, "table not available");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_as_empty_only_swallows_missing_tables() {
        let missing: Result<Vec<u8>, _> = Err(CollectError::MissingTable("x".into()));
        assert_eq!(absent_as_empty(Table::Stages, missing), Ok(Vec::new()));

        let denied: Result<Vec<u8>, _> = Err(CollectError::AccessDenied("x".into()));
        assert!(absent_as_empty(Table::Stages, denied).is_err());

        assert_eq!(absent_as_empty(Table::Stages, Ok(vec![1u8])), Ok(vec![1]));
    }
}
