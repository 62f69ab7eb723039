//! session-keeper binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use session_keeper::api::{serve_with_state, AppState};
use session_keeper::cli::{parse_args, print_help, print_version};
use session_keeper::config::Config;
use session_keeper::session::flush_all;
use session_keeper::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("warning: logging already initialized: {}", e);
    }

    info!("session-keeper v{}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server_config = config.to_server_config()?;
    let registry = Arc::new(config.build_registry()?);

    for container in registry.containers() {
        let policy = container.policy()?;
        info!(
            container = %container.name(),
            timeout = policy.timeout(),
            resolution = policy.resolution(),
            store = container.store_kind(),
            "Container ready"
        );
    }

    if config.sweep.enabled {
        info!(
            interval_secs = config.sweep.interval_secs,
            flush_interval_secs = config.sweep.flush_interval_secs,
            "Background sweeper started"
        );
    } else {
        info!(
            flush_interval_secs = config.sweep.flush_interval_secs,
            "Background sweep disabled, flushing only"
        );
    }
    let sweeper = config.sweep.spawn(Arc::clone(&registry));

    let state = AppState::with_registry(Arc::clone(&registry));
    let served = serve_with_state(server_config, state).await;

    sweeper.shutdown().await;

    // Persist whatever durable stores still hold, even if serving failed.
    let flushed = flush_all(&registry);
    info!("session-keeper stopped");

    served?;
    flushed?;
    Ok(())
}
