//! Error taxonomy for the scan-dispatch engine (spec §7).
//!
//! Only [`WorkerError::RequestTimeout`] and [`WorkerError::DistributionTimeout`]
//! are allowed to propagate out of the distributor; every other kind is
//! recovered locally (logged, the offending scanner/file skipped) by the
//! caller that encounters it.

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The request's wall-clock budget (`expire_at`) expired. The request is
    /// abandoned silently — no `FIN` is emitted; the front-end notices via
    /// its own timeout on the event key.
    #[error("request {root_id} timed out")]
    RequestTimeout { root_id: String },

    /// A single file node's distribution budget (`limits.distribution`)
    /// expired. This node's event may be missing; already-collected children
    /// still recurse under the still-live request timer.
    #[error("distribution of file {uid} (depth {depth}) timed out")]
    DistributionTimeout { uid: String, depth: u32 },

    /// A scanner name in config could not be resolved in the registry.
    /// Soft failure: the scanner is skipped, the request continues.
    #[error("scanner {name} is not registered")]
    MissingScanner { name: String },

    /// A scanner ran but returned an error (or panicked). Soft failure: the
    /// scanner is skipped, other scanners and children continue.
    #[error("scanner {name} faulted: {source}")]
    ScannerFault {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The coordinator could not be reached at runtime (after startup).
    /// The current request is abandoned; the worker continues.
    #[error("coordinator fault: {0}")]
    CoordinatorFault(#[from] warder_coordinator::CoordinatorError),
}
