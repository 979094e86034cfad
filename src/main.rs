//! outcome-sessions binary entry point.
//!
//! Opens the session store, runs the reclaimer until Ctrl-C, then shuts
//! the reclaimer down and exits.

use std::process::ExitCode;
use std::sync::Arc;

use outcome_sessions::cli::{self, Args};
use outcome_sessions::config::Config;
use outcome_sessions::{logging, SessionStore};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "outcome-sessions failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> outcome_sessions::Result<()> {
    let config = Config::load(args)?;
    logging::init_with_filter(config.log_filter()).ok();

    info!("outcome-sessions v{}", env!("CARGO_PKG_VERSION"));

    let store_config = config.to_store_config()?;
    let store = Arc::new(SessionStore::open(store_config));
    info!(
        path = %store.log_path().display(),
        entries = store.len(),
        live = store.live_count(),
        "session store ready"
    );

    let reclaimer = store.spawn_reclaimer();

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    reclaimer.shutdown().await;
    info!(entries = store.len(), "session store closed");

    Ok(())
}
