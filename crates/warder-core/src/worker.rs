//! Steady-state worker loop (spec §4.6).
//!
//! Leases one request at a time from the coordinator, runs the distributor
//! under a per-request wall-clock timeout, and emits `FIN` on normal
//! completion. Retires when either lifetime budget (`max_files`,
//! `time_to_live`) is exhausted; a supervisor is expected to restart it.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::time::Instant;
use warder_config::{log_worker_debug, log_worker_error, log_worker_info, Config};
use warder_coordinator::CoordinatorClient;

use crate::assignment::AssignmentEngine;
use crate::classifier::Classifier;
use crate::distributor::Distributor;
use crate::error::WorkerError;
use crate::registry::ScannerRegistry;
use crate::types::File;

const EMPTY_QUEUE_SLEEP: Duration = Duration::from_millis(250);

/// Runs the bounded-lifetime worker loop to retirement.
pub async fn run(
    config: &Config,
    coordinator: &CoordinatorClient,
    classifier: &Classifier,
    registry: &mut ScannerRegistry,
) {
    let assignment_engine = AssignmentEngine::new();
    let started = Instant::now();
    let ttl = Duration::from_secs(config.limits.time_to_live);
    let mut files_done: u64 = 0;

    loop {
        if files_done >= config.limits.max_files || started.elapsed() >= ttl {
            log_worker_info!(
                "retiring, lifetime budget exhausted",
                files_done = files_done,
                elapsed_secs = started.elapsed().as_secs()
            );
            break;
        }

        let (root_id, expire_at_unix) = match coordinator.pop_task().await {
            Ok(Some(task)) => task,
            Ok(None) => {
                tokio::time::sleep(EMPTY_QUEUE_SLEEP).await;
                continue;
            }
            Err(e) => {
                log_worker_error!("failed to pop task from coordinator", error = %e);
                tokio::time::sleep(EMPTY_QUEUE_SLEEP).await;
                continue;
            }
        };

        let expire_at = match Utc.timestamp_opt(expire_at_unix as i64, 0).single() {
            Some(dt) => dt,
            None => {
                log_worker_error!("task has an unrepresentable expiry, skipping", root_id = root_id.as_str());
                continue;
            }
        };

        let now = Utc::now();
        let remaining_millis = expire_at.signed_duration_since(now).num_milliseconds();
        if remaining_millis <= 0 {
            log_worker_debug!(
                "task already expired on pop, skipping",
                root_id = root_id.as_str()
            );
            continue;
        }
        // ceil(expire_at - now) in whole seconds, per spec §4.6 step 3.
        let remaining_secs = (remaining_millis as u64).div_ceil(1000);
        let request_timeout = Duration::from_secs(remaining_secs);

        let outcome = run_one_request(
            config,
            coordinator,
            classifier,
            &assignment_engine,
            registry,
            &root_id,
            expire_at,
            request_timeout,
        )
        .await;

        match outcome {
            Ok(()) => {
                if let Err(e) = coordinator.emit_fin(&root_id, expire_at_unix as i64).await {
                    log_worker_error!(
                        "failed to emit FIN",
                        root_id = root_id.as_str(),
                        error = %e
                    );
                }
            }
            Err(WorkerError::RequestTimeout { .. }) => {
                log_worker_debug!(
                    "request timed out, abandoning without FIN",
                    root_id = root_id.as_str()
                );
            }
            Err(e) => {
                log_worker_error!(
                    "request failed, abandoning",
                    root_id = root_id.as_str(),
                    error = %e
                );
            }
        }

        // Counted per request, matching the upstream source's accounting
        // (see DESIGN.md): a request with a thousand-node tree still only
        // counts once against max_files.
        files_done += 1;
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_one_request(
    config: &Config,
    coordinator: &CoordinatorClient,
    classifier: &Classifier,
    assignment_engine: &AssignmentEngine,
    registry: &mut ScannerRegistry,
    root_id: &str,
    expire_at: chrono::DateTime<Utc>,
    request_timeout: Duration,
) -> Result<(), WorkerError> {
    let root = File::root(root_id);
    let distribution_timeout = Duration::from_secs(config.limits.distribution);

    let mut distributor = Distributor::new(
        coordinator,
        classifier,
        assignment_engine,
        registry,
        &config.scanners,
        config.limits.max_depth,
        distribution_timeout,
    );

    match tokio::time::timeout(request_timeout, distributor.run(root_id, root, expire_at)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(WorkerError::RequestTimeout {
            root_id: root_id.to_string(),
        }),
    }
}
