//! myglot - top-like monitor for MySQL performance_schema counters.
//!
//! Usage:
//!   myglot                      # full-screen, 1 second interval
//!   myglot 5                    # 5 second interval
//!   myglot --view mutex         # start on the mutex view
//!   myglot --stdout --count 3   # three text frames to stdout
//!   myglot --stdout --format json --absolute

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use myglot::VERSION;
use myglot::collector::{MySqlSource, ServerInfo, StartupError, check_server};
use myglot::config::{self, ConnectionOptions};
use myglot::tui::{
    App, EventHandler, OutputFormat, Settings, StdoutSurface, Surface, TerminalSurface,
};
use myglot::view::ViewKind;

/// Top-like monitor for MySQL performance_schema counters.
#[derive(Parser, Debug)]
#[command(name = "myglot", version = VERSION)]
struct Args {
    /// Polling interval in seconds.
    #[arg(value_name = "INTERVAL", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Stop after N collection cycles.
    #[arg(short = 'c', long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    count: Option<u64>,

    /// Write frames to stdout instead of drawing a full-screen UI.
    #[arg(long)]
    stdout: bool,

    /// Frame format in --stdout mode: text or json.
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Initial view: latency, ops, io, locks, users, mutex or stages.
    #[arg(long, default_value = "latency")]
    view: ViewKind,

    /// Start with absolute counters instead of values since start.
    #[arg(long)]
    absolute: bool,

    /// MySQL server host.
    #[arg(long, env = "MYSQL_HOST")]
    host: Option<String>,

    /// MySQL server TCP port.
    #[arg(short = 'P', long, env = "MYSQL_TCP_PORT")]
    port: Option<u16>,

    /// Unix socket path.
    #[arg(short = 'S', long, env = "MYSQL_UNIX_PORT")]
    socket: Option<String>,

    /// MySQL user.
    #[arg(short = 'u', long, env = "MYSQL_USER")]
    user: Option<String>,

    /// MySQL password.
    #[arg(short = 'p', long, env = "MYSQL_PWD", hide_env_values = true)]
    password: Option<String>,

    /// Option file to read instead of ~/.my.cnf.
    #[arg(long, value_name = "PATH")]
    defaults_file: Option<PathBuf>,

    /// Write logs to this file (full-screen mode logs nothing otherwise).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long)]
    quiet: bool,
}

/// Logs go to `--log-file`, else to stderr in stdout mode; the full-screen
/// UI owns the terminal so it gets no logger without a file.
fn init_logging(args: &Args) -> Result<(), String> {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let directive: Directive = format!("myglot={}", level)
        .parse()
        .map_err(|e| format!("invalid log directive: {}", e))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    if let Some(path) = &args.log_file {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.stdout {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn run<U: Surface>(
    source: MySqlSource,
    surface: U,
    server: ServerInfo,
    settings: Settings,
    events: &EventHandler,
) -> std::io::Result<()> {
    let mut app = App::new(source, surface, server, settings);
    app.run(events)
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!(version = VERSION, "myglot starting");

    let cli = ConnectionOptions {
        host: args.host.clone(),
        port: args.port,
        socket: args.socket.clone(),
        user: args.user.clone(),
        password: args.password.clone(),
    };
    let connection = match config::load(cli, args.defaults_file.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut source = MySqlSource::new(connection.to_opts());
    let server = match source
        .connect()
        .map_err(|e| StartupError::Connect(e.to_string()))
        .and_then(|()| check_server(&mut source))
    {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        host = %server.hostname,
        version = %server.version,
        datadir = %server.datadir,
        "monitoring server"
    );

    let settings = Settings {
        interval: Duration::from_secs(args.interval),
        count: args.count,
        view: args.view,
        want_relative: !args.absolute,
    };

    let events = if args.stdout {
        EventHandler::new()
    } else {
        EventHandler::with_terminal_input()
    };
    if let Err(e) = events.forward_signals() {
        warn!("Failed to set signal handler: {}", e);
    }

    let result = if args.stdout {
        run(
            source,
            StdoutSurface::stdout(args.format),
            server,
            settings,
            &events,
        )
    } else {
        TerminalSurface::new()
            .and_then(|surface| run(source, surface, server, settings, &events))
    };

    if let Err(e) = result {
        error!(error = %e, "terminated");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    info!("clean shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_must_be_positive() {
        assert!(Args::try_parse_from(["myglot", "--count", "0"]).is_err());
        let args = Args::try_parse_from(["myglot", "--count", "2", "5"]).unwrap();
        assert_eq!(args.count, Some(2));
        assert_eq!(args.interval, 5);
    }

    #[test]
    fn interval_must_be_positive() {
        assert!(Args::try_parse_from(["myglot", "0"]).is_err());
        assert_eq!(Args::try_parse_from(["myglot"]).unwrap().interval, 1);
    }
}
