use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use steam_presence::{logging, run, RunOptions};

/// Mirror the game a Steam profile is playing as Discord rich presence.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to settings.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Print activity updates as JSON lines instead of sending them to Discord
    #[arg(long)]
    dry_run: bool,

    /// Only run the local profile proxy
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    serve_proxy: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init_logging();

    let options = RunOptions {
        config_path: cli.config,
        once: cli.once,
        dry_run: cli.dry_run,
        serve_proxy: cli.serve_proxy,
    };

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
