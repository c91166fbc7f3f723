//! Startup checks and server identity.

use tracing::{debug, info};

use super::{CollectError, MetricsSource};

/// Oldest server with the summary tables the views need.
pub const MIN_VERSION: Version = Version {
    major: 5,
    minor: 6,
    patch: 0,
};

/// Numeric part of `@@version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Parses strings like `8.0.36`, `5.7.44-48-log` or `10.6.12-MariaDB`.
    pub fn parse(s: &str) -> Option<Self> {
        let numeric = s.split(|c: char| c != '.' && !c.is_ascii_digit()).next()?;
        let mut parts = numeric.split('.').map(|p| p.parse::<u32>().ok());
        let major = parts.next()??;
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Errors that prevent monitoring from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Could not talk to the server at all.
    Connect(String),
    /// `@@version` missing, unparsable or too old.
    UnsupportedVersion(String),
    /// `@@performance_schema` is OFF.
    PerformanceSchemaDisabled,
    /// A table every session needs is absent or unreadable.
    RequiredTable { table: &'static str, reason: String },
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Connect(msg) => write!(f, "cannot connect: {}", msg),
            StartupError::UnsupportedVersion(v) => write!(
                f,
                "unsupported server version {} (need {}.{} or later)",
                v, MIN_VERSION.major, MIN_VERSION.minor
            ),
            StartupError::PerformanceSchemaDisabled => {
                write!(f, "performance_schema is disabled on this server")
            }
            StartupError::RequiredTable { table, reason } => {
                write!(f, "cannot read {}: {}", table, reason)
            }
        }
    }
}

impl std::error::Error for StartupError {}

impl From<CollectError> for StartupError {
    fn from(e: CollectError) -> Self {
        StartupError::Connect(e.to_string())
    }
}

/// Server identity shown in the header and used to configure the
/// file-name normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub hostname: String,
    pub version: String,
    pub datadir: String,
    pub relay_log: String,
}

/// Verifies the server can be monitored and reads its identity.
pub fn check_server(source: &mut dyn MetricsSource) -> Result<ServerInfo, StartupError> {
    let version = source.variable("version")?.unwrap_or_default();
    match Version::parse(&version) {
        Some(v) if v >= MIN_VERSION => debug!(version = %v, "server version"),
        _ => return Err(StartupError::UnsupportedVersion(version)),
    }

    let ps = source.variable("performance_schema")?.unwrap_or_default();
    if !(ps == "1" || ps.eq_ignore_ascii_case("ON")) {
        return Err(StartupError::PerformanceSchemaDisabled);
    }

    require(super::Table::TableIoWaits, source.table_io_waits().map(|_| ()))?;
    require(super::Table::FileSummary, source.file_io().map(|_| ()))?;

    let info = ServerInfo {
        hostname: source.variable("hostname")?.unwrap_or_default(),
        version,
        datadir: source.variable("datadir")?.unwrap_or_default(),
        relay_log: source.variable("relay_log")?.unwrap_or_default(),
    };
    info!(
        hostname = %info.hostname,
        version = %info.version,
        datadir = %info.datadir,
        "server checks passed"
    );
    Ok(info)
}

fn require(table: super::Table, probe: Result<(), CollectError>) -> Result<(), StartupError> {
    match probe {
        Ok(()) => Ok(()),
        Err(CollectError::MissingTable(reason)) | Err(CollectError::AccessDenied(reason)) => {
            Err(StartupError::RequiredTable {
                table: table.name(),
                reason,
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Table;
    use crate::collector::mock::MockSource;

    #[test]
    fn parses_vendor_version_strings() {
        assert_eq!(
            Version::parse("8.0.36"),
            Some(Version {
                major: 8,
                minor: 0,
                patch: 36
            })
        );
        assert_eq!(
            Version::parse("5.7.44-48-log").map(|v| v.to_string()),
            Some("5.7.44".to_string())
        );
        assert_eq!(Version::parse("10.6.12-MariaDB").map(|v| v.major), Some(10));
        assert_eq!(Version::parse("garbage"), None);
    }

    #[test]
    fn accepts_supported_server() {
        let mut source = MockSource::new();
        source.set_variable("hostname", "db1");
        source.set_variable("datadir", "/var/lib/mysql/");

        let info = check_server(&mut source).unwrap();
        assert_eq!(info.hostname, "db1");
        assert_eq!(info.version, "8.0.36");
        assert_eq!(info.datadir, "/var/lib/mysql/");
        assert_eq!(info.relay_log, "");
    }

    #[test]
    fn rejects_old_server() {
        let mut source = MockSource::new();
        source.set_variable("version", "5.5.62-log");
        assert!(matches!(
            check_server(&mut source),
            Err(StartupError::UnsupportedVersion(v)) if v == "5.5.62-log"
        ));
    }

    #[test]
    fn rejects_disabled_performance_schema() {
        let mut source = MockSource::new();
        source.set_variable("performance_schema", "0");
        assert!(matches!(
            check_server(&mut source),
            Err(StartupError::PerformanceSchemaDisabled)
        ));
    }

    #[test]
    fn rejects_missing_required_table() {
        let mut source = MockSource::new();
        source.set_missing(Table::FileSummary);
        match check_server(&mut source) {
            Err(StartupError::RequiredTable { table, .. }) => {
                assert_eq!(table, Table::FileSummary.name())
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_optional_table_is_not_checked() {
        let mut source = MockSource::new();
        source.set_missing(Table::Stages);
        assert!(check_server(&mut source).is_ok());
    }
}
