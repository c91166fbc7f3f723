//! Connection settings.
//!
//! Values are layered: command-line flag (or its environment variable, which
//! clap resolves) > `[myglot]` then `[client]` section of a MySQL option file
//! > built-in defaults.
//!
//! Option files are INI-like but allow bare flag keys (`skip-ssl`) and
//! `!include` directives, which the INI reader rejects. Only the sections we
//! read are passed on, with those lines dropped.

use std::path::{Path, PathBuf};

use ::config::{Config, File, FileFormat};
use mysql::{Opts, OptsBuilder};
use tracing::debug;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;

/// Option file sections read, later ones overriding earlier ones.
const SECTIONS: &[&str] = &["client", "myglot"];

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Option file could not be read.
    Io { path: PathBuf, message: String },
    /// Option file line could not be understood.
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    /// Option file was rejected by the INI reader or holds an invalid value.
    Format { path: PathBuf, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            ConfigError::Parse {
                path,
                line,
                message,
            } => write!(f, "{}:{}: {}", path.display(), line, message),
            ConfigError::Format { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One layer of partially specified connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ConnectionOptions {
    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: ConnectionOptions) -> Self {
        Self {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            socket: self.socket.or(fallback.socket),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
        }
    }

    /// Reads the `[client]` and `[myglot]` sections of an option file.
    pub fn from_option_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let sections = client_sections(&content).map_err(|(line, message)| ConfigError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        })?;
        let format_error = |message: String| ConfigError::Format {
            path: path.to_path_buf(),
            message,
        };

        let config = Config::builder()
            .add_source(File::from_str(&sections, FileFormat::Ini))
            .build()
            .map_err(|e| format_error(e.to_string()))?;

        let port = match section_value(&config, "port") {
            Some(value) => Some(
                value
                    .parse::<u16>()
                    .map_err(|_| format_error(format!("invalid port {:?}", value)))?,
            ),
            None => None,
        };
        Ok(Self {
            host: section_value(&config, "host"),
            port,
            socket: section_value(&config, "socket"),
            user: section_value(&config, "user"),
            password: section_value(&config, "password"),
        })
    }

    /// Applies built-in defaults.
    pub fn resolve(self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            socket: self.socket,
            user: self
                .user
                .or_else(|| std::env::var("USER").ok())
                .unwrap_or_else(|| "root".to_string()),
            password: self.password,
        }
    }
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub socket: Option<String>,
    pub user: String,
    pub password: Option<String>,
}

impl ConnectionConfig {
    pub fn to_opts(&self) -> Opts {
        let mut builder = OptsBuilder::new()
            .ip_or_hostname(Some(self.host.clone()))
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(self.password.clone());
        if let Some(socket) = &self.socket {
            builder = builder.socket(Some(socket.clone()));
        }
        Opts::from(builder)
    }
}

/// `~/.my.cnf` when it exists.
pub fn default_option_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    let path = PathBuf::from(home).join(".my.cnf");
    path.is_file().then_some(path)
}

/// Layers `cli` over the option file and defaults.
///
/// An explicitly named `defaults_file` must be readable; the implicit
/// `~/.my.cnf` is skipped when absent.
pub fn load(
    cli: ConnectionOptions,
    defaults_file: Option<&Path>,
) -> Result<ConnectionConfig, ConfigError> {
    let file = match defaults_file {
        Some(path) => Some(path.to_path_buf()),
        None => default_option_file(),
    };
    let from_file = match file {
        Some(path) => {
            debug!(path = %path.display(), "reading option file");
            ConnectionOptions::from_option_file(&path)?
        }
        None => ConnectionOptions::default(),
    };
    Ok(cli.or(from_file).resolve())
}

/// Last section in [`SECTIONS`] that sets `key`.
fn section_value(config: &Config, key: &str) -> Option<String> {
    SECTIONS
        .iter()
        .rev()
        .find_map(|section| config.get_string(&format!("{}.{}", section, key)).ok())
}

/// Keeps the `[client]`/`[myglot]` sections as plain INI: keys lowercased
/// with `-` folded to `_`, unquoted trailing comments removed, bare flags,
/// comments and `!` directives dropped.
fn client_sections(content: &str) -> Result<String, (usize, String)> {
    let mut out = String::new();
    let mut in_section = false;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(['#', ';', '!']) {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let Some(name) = rest.strip_suffix(']') else {
                return Err((idx + 1, format!("unterminated section header {:?}", line)));
            };
            let name = name.trim().to_ascii_lowercase();
            in_section = SECTIONS.contains(&name.as_str());
            if in_section {
                out.push_str(&format!("[{}]\n", name));
            }
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        out.push_str(&format!("{} = {}\n", key, strip_comment(value.trim())));
    }
    Ok(out)
}

fn strip_comment(value: &str) -> &str {
    if value.starts_with(['"', '\'']) {
        return value;
    }
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}
