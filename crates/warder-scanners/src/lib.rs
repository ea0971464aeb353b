//! Built-in scanner plugins (spec §4.9).
//!
//! Illustrative, not exhaustive: the scanner *set* a worker runs is
//! config-driven, and [`register_builtins`] wires only the handful shipped
//! here. Production deployments are expected to register additional
//! plugins the same way.

mod hash;
mod noop;
mod zip;

mod bzip2_scanner;
mod gzip;

pub use bzip2_scanner::ScanBzip2;
pub use gzip::ScanGzip;
pub use hash::ScanHash;
pub use noop::ScanNoop;
pub use zip::ScanZip;

use warder_coordinator::CoordinatorClient;
use warder_core::ScannerRegistry;

/// Register every built-in plugin's constructor under its canonical name.
/// Constructors capture `coordinator` by clone so each instantiated plugin
/// can push extracted child bytes back to the shared store.
pub fn register_builtins(registry: &mut ScannerRegistry, coordinator: &CoordinatorClient) {
    let c = coordinator.clone();
    registry.register("ScanZip", move || Box::new(ScanZip::new(c.clone())));

    let c = coordinator.clone();
    registry.register("ScanGzip", move || Box::new(ScanGzip::new(c.clone())));

    let c = coordinator.clone();
    registry.register("ScanBzip2", move || Box::new(ScanBzip2::new(c.clone())));

    registry.register("ScanHash", || Box::new(ScanHash));
    registry.register("ScanNoop", || Box::new(ScanNoop));
}
