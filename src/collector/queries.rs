//! SQL text for each table read.

pub(super) const TABLE_IO_WAITS: &str = "SELECT OBJECT_SCHEMA, OBJECT_NAME, \
    COUNT_STAR, SUM_TIMER_WAIT, \
    COUNT_READ, SUM_TIMER_READ, COUNT_WRITE, SUM_TIMER_WRITE, \
    COUNT_FETCH, SUM_TIMER_FETCH, COUNT_INSERT, SUM_TIMER_INSERT, \
    COUNT_UPDATE, SUM_TIMER_UPDATE, COUNT_DELETE, SUM_TIMER_DELETE \
    FROM performance_schema.table_io_waits_summary_by_table \
    WHERE SUM_TIMER_WAIT > 0";

pub(super) const FILE_SUMMARY: &str = "SELECT FILE_NAME, \
    COUNT_STAR, SUM_TIMER_WAIT, \
    COUNT_READ, SUM_TIMER_READ, SUM_NUMBER_OF_BYTES_READ, \
    COUNT_WRITE, SUM_TIMER_WRITE, SUM_NUMBER_OF_BYTES_WRITE, \
    COUNT_MISC, SUM_TIMER_MISC \
    FROM performance_schema.file_summary_by_instance";

pub(super) const TABLE_LOCK_WAITS: &str = "SELECT OBJECT_SCHEMA, OBJECT_NAME, \
    COUNT_STAR, SUM_TIMER_WAIT, SUM_TIMER_READ, SUM_TIMER_WRITE, \
    SUM_TIMER_READ_WITH_SHARED_LOCKS, SUM_TIMER_READ_HIGH_PRIORITY, \
    SUM_TIMER_READ_NO_INSERT, SUM_TIMER_READ_NORMAL, SUM_TIMER_READ_EXTERNAL, \
    SUM_TIMER_WRITE_ALLOW_WRITE, SUM_TIMER_WRITE_CONCURRENT_INSERT, \
    SUM_TIMER_WRITE_LOW_PRIORITY, SUM_TIMER_WRITE_NORMAL, SUM_TIMER_WRITE_EXTERNAL \
    FROM performance_schema.table_lock_waits_summary_by_table \
    WHERE COUNT_STAR > 0";

pub(super) const MUTEX_WAITS: &str = "SELECT EVENT_NAME, COUNT_STAR, SUM_TIMER_WAIT \
    FROM performance_schema.events_waits_summary_global_by_event_name \
    WHERE EVENT_NAME LIKE 'wait/synch/mutex/%' AND SUM_TIMER_WAIT > 0";

pub(super) const STAGES: &str = "SELECT EVENT_NAME, COUNT_STAR, SUM_TIMER_WAIT \
    FROM performance_schema.events_stages_summary_global_by_event_name \
    WHERE SUM_TIMER_WAIT > 0";

pub(super) const PROCESSLIST: &str = "SELECT ID, USER, HOST, DB, COMMAND, TIME, STATE, INFO \
    FROM information_schema.processlist \
    WHERE ID != CONNECTION_ID()";

pub(super) const UPTIME: &str = "SHOW GLOBAL STATUS LIKE 'Uptime'";

pub(super) const DISABLED_INSTRUMENTS: &str = "SELECT NAME, ENABLED, TIMED \
    FROM performance_schema.setup_instruments \
    WHERE NAME LIKE ? AND (ENABLED = 'NO' OR TIMED = 'NO')";

pub(super) const SET_INSTRUMENT: &str = "UPDATE performance_schema.setup_instruments \
    SET ENABLED = ?, TIMED = ? WHERE NAME = ?";

/// `SELECT @@global.<name>` for a plain identifier, `None` otherwise.
pub(super) fn global_variable(name: &str) -> Option<String> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| format!("SELECT @@global.{name}"))
}
