///
/// sqlbridge - Main Entry Point
///
/// Loads configuration, installs logging on stderr, and replays an
/// invocation script (file argument, or stdin when absent or `-`) against
/// one SQLite bridge model. Results go to stdout as JSON lines.
///

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sqlbridge_core::DataRoot;
use sqlbridge_sqlite::SqliteModel;
use sqlbridge_tool::{BridgeConfig, ToolError, replay};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlbridge", version, about = "Replay SQL bridge invocations against an embedded SQLite database")]
struct Cli {
    /// Path to a sqlbridge.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory relative database paths resolve against
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Invocation script, one JSON object per line (`-` for stdin)
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ToolError> {
    let mut config = BridgeConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    init_logging(&config.log.filter);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;

    let model = SqliteModel::new(Arc::new(DataRoot::new(&config.storage.data_dir)));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let stats = match cli.script.as_deref() {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)?;
            runtime.block_on(replay(&model, BufReader::new(file), &mut out))
        }
        _ => runtime.block_on(replay(&model, io::stdin().lock(), &mut out)),
    };
    model.dispose();

    let stats = stats?;
    info!(
        "Replayed {} invocations ({} callbacks, {} raised)",
        stats.invocations, stats.callbacks, stats.raised
    );
    Ok(())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}
