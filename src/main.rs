//! fswatch - run a command and restart it whenever watched files change.
//!
//! Entry point for the fswatch binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use fswatch::config::parse_delay;
use fswatch::observability::{init_tracing, TracingConfig};
use fswatch::supervisor::KillPolicy;
use fswatch::{App, Config, Result};

/// Run a command, and restart it whenever files change
#[derive(Parser, Debug)]
#[command(name = "fswatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show verbose debug information
    #[arg(short, long)]
    verbose: bool,

    /// Quiet period after the last change before restarting (e.g. 500ms, 2s, 0.5)
    #[arg(long, env = "FSWATCH_DELAY", default_value = "500ms")]
    delay: String,

    /// Subdirectory depth to watch below each directory (0 = directory only)
    #[arg(short, long, env = "FSWATCH_DEPTH", default_value = "1")]
    depth: usize,

    /// Directories to watch
    #[arg(
        short,
        long,
        env = "FSWATCH_WATCH_DIRS",
        value_delimiter = ',',
        default_value = "."
    )]
    watch: Vec<std::path::PathBuf>,

    /// Wait this long for a stopped instance to exit before starting the next one
    #[arg(long, env = "FSWATCH_KILL_TIMEOUT")]
    kill_timeout: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FSWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "FSWATCH_LOG_JSON")]
    log_json: bool,

    /// Command to run, followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig::from_flags(
        &cli.log_level,
        cli.verbose,
        cli.log_json,
    ));

    if cli.command.is_empty() {
        println!("Use {} --help for more details", env!("CARGO_PKG_NAME"));
        return Ok(());
    }

    let config = Config {
        command: cli.command,
        watch_dirs: cli.watch,
        depth: cli.depth,
        delay: parse_delay(&cli.delay),
        kill_policy: cli
            .kill_timeout
            .as_deref()
            .map_or(KillPolicy::Signal, |raw| {
                KillPolicy::WaitForExit(parse_delay(raw))
            }),
        log_level: cli.log_level,
    };

    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    App::new(config).run().await
}
