//! MySQL implementation of [`MetricsSource`].

use mysql::prelude::Queryable;
use mysql::{Conn, Opts, Row};
use tracing::{debug, info, warn};

use crate::model::{FileIoRow, MutexRow, ProcessRow, StageRow, TableIoRow, TableLockRow};

use super::queries;
use super::{CollectError, InstrumentSetting, MetricsSource};

const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;
const ER_UNKNOWN_TABLE: u16 = 1109;
const ER_TABLEACCESS_DENIED: u16 = 1142;
const ER_NO_SUCH_TABLE: u16 = 1146;
const ER_UNKNOWN_SYSTEM_VARIABLE: u16 = 1193;
const ER_SPECIFIC_ACCESS_DENIED: u16 = 1227;
const ER_OPTION_PREVENTS_STATEMENT: u16 = 1290;

/// Reads performance_schema over a single blocking connection.
///
/// The connection is opened lazily and dropped on I/O failure; the next call
/// reconnects.
pub struct MySqlSource {
    opts: Opts,
    conn: Option<Conn>,
    last_error: Option<String>,
}

impl MySqlSource {
    pub fn new(opts: Opts) -> Self {
        Self {
            opts,
            conn: None,
            last_error: None,
        }
    }

    /// Opens the connection now instead of on first query.
    pub fn connect(&mut self) -> Result<(), CollectError> {
        self.ensure_connected().map(|_| ())
    }

    /// Returns the last error message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn ensure_connected(&mut self) -> Result<&mut Conn, CollectError> {
        if self.conn.is_none() {
            match Conn::new(self.opts.clone()) {
                Ok(conn) => {
                    info!(
                        host = %self.opts.get_ip_or_hostname(),
                        port = self.opts.get_tcp_port(),
                        "connected to MySQL"
                    );
                    self.conn = Some(conn);
                    self.last_error = None;
                }
                Err(e) => {
                    let msg = e.to_string();
                    self.last_error = Some(msg.clone());
                    return Err(CollectError::Connection(msg));
                }
            }
        }
        self.conn
            .as_mut()
            .ok_or_else(|| CollectError::Connection("not connected".to_string()))
    }

    fn run<T>(
        &mut self,
        f: impl FnOnce(&mut Conn) -> mysql::Result<T>,
    ) -> Result<T, CollectError> {
        let conn = self.ensure_connected()?;
        match f(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = classify(&e);
                if matches!(err, CollectError::Connection(_)) {
                    warn!(error = %e, "dropping MySQL connection");
                    self.conn = None;
                }
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn query_rows(&mut self, sql: &'static str) -> Result<Vec<Row>, CollectError> {
        let rows = self.run(|conn| conn.query::<Row, _>(sql))?;
        debug!(rows = rows.len(), "query done");
        Ok(rows)
    }
}

fn classify(e: &mysql::Error) -> CollectError {
    match e {
        mysql::Error::MySqlError(server) => match server.code {
            ER_NO_SUCH_TABLE | ER_UNKNOWN_TABLE => CollectError::MissingTable(server.message.clone()),
            ER_DBACCESS_DENIED
            | ER_ACCESS_DENIED
            | ER_TABLEACCESS_DENIED
            | ER_SPECIFIC_ACCESS_DENIED
            | ER_OPTION_PREVENTS_STATEMENT => CollectError::AccessDenied(server.message.clone()),
            code => CollectError::Query(format!("{} ({})", server.message, code)),
        },
        mysql::Error::IoError(_) | mysql::Error::DriverError(_) => {
            CollectError::Connection(e.to_string())
        }
        _ => CollectError::Query(e.to_string()),
    }
}

fn counter(row: &Row, column: &str) -> u64 {
    row.get_opt::<u64, _>(column)
        .and_then(Result::ok)
        .unwrap_or(0)
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get_opt::<Option<String>, _>(column)
        .and_then(Result::ok)
        .flatten()
}

fn qualified_name(row: &Row) -> String {
    format!(
        "{}.{}",
        text(row, "OBJECT_SCHEMA").unwrap_or_default(),
        text(row, "OBJECT_NAME").unwrap_or_default()
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "YES" } else { "NO" }
}

impl MetricsSource for MySqlSource {
    fn table_io_waits(&mut self) -> Result<Vec<TableIoRow>, CollectError> {
        let rows = self.query_rows(queries::TABLE_IO_WAITS)?;
        Ok(rows
            .iter()
            .map(|row| TableIoRow {
                name: qualified_name(row),
                count_star: counter(row, "COUNT_STAR"),
                sum_timer_wait: counter(row, "SUM_TIMER_WAIT"),
                count_read: counter(row, "COUNT_READ"),
                sum_timer_read: counter(row, "SUM_TIMER_READ"),
                count_write: counter(row, "COUNT_WRITE"),
                sum_timer_write: counter(row, "SUM_TIMER_WRITE"),
                count_fetch: counter(row, "COUNT_FETCH"),
                sum_timer_fetch: counter(row, "SUM_TIMER_FETCH"),
                count_insert: counter(row, "COUNT_INSERT"),
                sum_timer_insert: counter(row, "SUM_TIMER_INSERT"),
                count_update: counter(row, "COUNT_UPDATE"),
                sum_timer_update: counter(row, "SUM_TIMER_UPDATE"),
                count_delete: counter(row, "COUNT_DELETE"),
                sum_timer_delete: counter(row, "SUM_TIMER_DELETE"),
            })
            .collect())
    }

    fn file_io(&mut self) -> Result<Vec<FileIoRow>, CollectError> {
        let rows = self.query_rows(queries::FILE_SUMMARY)?;
        Ok(rows
            .iter()
            .map(|row| FileIoRow {
                name: text(row, "FILE_NAME").unwrap_or_default(),
                count_star: counter(row, "COUNT_STAR"),
                sum_timer_wait: counter(row, "SUM_TIMER_WAIT"),
                count_read: counter(row, "COUNT_READ"),
                sum_timer_read: counter(row, "SUM_TIMER_READ"),
                bytes_read: counter(row, "SUM_NUMBER_OF_BYTES_READ"),
                count_write: counter(row, "COUNT_WRITE"),
                sum_timer_write: counter(row, "SUM_TIMER_WRITE"),
                bytes_write: counter(row, "SUM_NUMBER_OF_BYTES_WRITE"),
                count_misc: counter(row, "COUNT_MISC"),
                sum_timer_misc: counter(row, "SUM_TIMER_MISC"),
            })
            .collect())
    }

    fn table_lock_waits(&mut self) -> Result<Vec<TableLockRow>, CollectError> {
        let rows = self.query_rows(queries::TABLE_LOCK_WAITS)?;
        Ok(rows
            .iter()
            .map(|row| TableLockRow {
                name: qualified_name(row),
                count_star: counter(row, "COUNT_STAR"),
                sum_timer_wait: counter(row, "SUM_TIMER_WAIT"),
                sum_timer_read: counter(row, "SUM_TIMER_READ"),
                sum_timer_write: counter(row, "SUM_TIMER_WRITE"),
                sum_timer_read_with_shared_locks: counter(row, "SUM_TIMER_READ_WITH_SHARED_LOCKS"),
                sum_timer_read_high_priority: counter(row, "SUM_TIMER_READ_HIGH_PRIORITY"),
                sum_timer_read_no_insert: counter(row, "SUM_TIMER_READ_NO_INSERT"),
                sum_timer_read_normal: counter(row, "SUM_TIMER_READ_NORMAL"),
                sum_timer_read_external: counter(row, "SUM_TIMER_READ_EXTERNAL"),
                sum_timer_write_allow_write: counter(row, "SUM_TIMER_WRITE_ALLOW_WRITE"),
                sum_timer_write_concurrent_insert: counter(
                    row,
                    "SUM_TIMER_WRITE_CONCURRENT_INSERT",
                ),
                sum_timer_write_low_priority: counter(row, "SUM_TIMER_WRITE_LOW_PRIORITY"),
                sum_timer_write_normal: counter(row, "SUM_TIMER_WRITE_NORMAL"),
                sum_timer_write_external: counter(row, "SUM_TIMER_WRITE_EXTERNAL"),
            })
            .collect())
    }

    fn mutex_waits(&mut self) -> Result<Vec<MutexRow>, CollectError> {
        let rows = self.query_rows(queries::MUTEX_WAITS)?;
        Ok(rows
            .iter()
            .map(|row| MutexRow {
                name: text(row, "EVENT_NAME").unwrap_or_default(),
                count_star: counter(row, "COUNT_STAR"),
                sum_timer_wait: counter(row, "SUM_TIMER_WAIT"),
            })
            .collect())
    }

    fn stages(&mut self) -> Result<Vec<StageRow>, CollectError> {
        let rows = self.query_rows(queries::STAGES)?;
        Ok(rows
            .iter()
            .map(|row| StageRow {
                name: text(row, "EVENT_NAME").unwrap_or_default(),
                count_star: counter(row, "COUNT_STAR"),
                sum_timer_wait: counter(row, "SUM_TIMER_WAIT"),
            })
            .collect())
    }

    fn processlist(&mut self) -> Result<Vec<ProcessRow>, CollectError> {
        let rows = self.query_rows(queries::PROCESSLIST)?;
        Ok(rows
            .iter()
            .map(|row| ProcessRow {
                id: counter(row, "ID"),
                user: text(row, "USER").unwrap_or_default(),
                host: text(row, "HOST").unwrap_or_default(),
                db: text(row, "DB"),
                command: text(row, "COMMAND").unwrap_or_default(),
                time: counter(row, "TIME"),
                state: text(row, "STATE"),
                info: text(row, "INFO"),
            })
            .collect())
    }

    fn variable(&mut self, name: &str) -> Result<Option<String>, CollectError> {
        let Some(sql) = queries::global_variable(name) else {
            return Ok(None);
        };
        self.run(|conn| match conn.query_first::<Option<String>, _>(sql) {
            Err(mysql::Error::MySqlError(e)) if e.code == ER_UNKNOWN_SYSTEM_VARIABLE => Ok(None),
            other => other.map(Option::flatten),
        })
    }

    fn uptime(&mut self) -> Result<Option<u64>, CollectError> {
        let status = self.run(|conn| conn.query_first::<(String, String), _>(queries::UPTIME))?;
        Ok(status.and_then(|(_, value)| value.parse().ok()))
    }

    fn disabled_instruments(
        &mut self,
        patterns: &[&str],
    ) -> Result<Vec<InstrumentSetting>, CollectError> {
        self.run(|conn| {
            let mut settings = Vec::new();
            for pattern in patterns {
                let rows: Vec<(String, String, String)> =
                    conn.exec(queries::DISABLED_INSTRUMENTS, (*pattern,))?;
                settings.extend(rows.into_iter().map(|(name, enabled, timed)| {
                    InstrumentSetting {
                        name,
                        enabled: enabled == "YES",
                        timed: timed == "YES",
                    }
                }));
            }
            Ok(settings)
        })
    }

    fn set_instrument(&mut self, setting: &InstrumentSetting) -> Result<(), CollectError> {
        self.run(|conn| {
            conn.exec_drop(
                queries::SET_INSTRUMENT,
                (
                    yes_no(setting.enabled),
                    yes_no(setting.timed),
                    setting.name.as_str(),
                ),
            )
        })
    }
}
