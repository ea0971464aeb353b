//! Bootstrap entry point for a single scan-dispatch worker process (spec
//! §4.7).
//!
//! Parses one argument, loads config, initializes logging, dials the
//! coordinator, and runs the worker loop to retirement. A supervisor is
//! expected to restart this process when it exits.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use warder_config::{log_worker_error, log_worker_info, Config};
use warder_coordinator::CoordinatorClient;
use warder_core::{Classifier, ScannerRegistry};

#[derive(Parser)]
#[command(name = "warder-worker", version, about = "Scan-dispatch worker process")]
struct Cli {
    /// Path to the worker's YAML config document.
    #[arg(long = "worker-config", default_value = warder_config::DEFAULT_CONFIG_PATH)]
    worker_config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_from(&cli.worker_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config from {}: {e}", cli.worker_config.display());
            return ExitCode::FAILURE;
        }
    };

    warder_config::logging::init_logging(config.logging_cfg.as_deref());

    let coordinator = match CoordinatorClient::connect(&config.coordinator.addr, config.coordinator.db).await {
        Ok(client) => client,
        Err(e) => {
            log_worker_error!("failed to connect to coordinator", error = %e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = coordinator.ping().await {
        log_worker_error!("coordinator ping failed", error = %e);
        return ExitCode::FAILURE;
    }

    let classifier = match Classifier::load(config.tasting.yara_rules.as_deref()) {
        Ok(classifier) => classifier,
        Err(e) => {
            log_worker_error!("failed to load classifier", error = %e);
            return ExitCode::FAILURE;
        }
    };

    let mut registry = ScannerRegistry::new();
    warder_scanners::register_builtins(&mut registry, &coordinator);

    log_worker_info!(
        "worker starting",
        config_path = %cli.worker_config.display(),
        max_files = config.limits.max_files,
        time_to_live = config.limits.time_to_live
    );

    warder_core::worker::run(&config, &coordinator, &classifier, &mut registry).await;

    log_worker_info!("worker retired");
    ExitCode::SUCCESS
}
