use std::sync::Arc;

use crate::models::device::DeviceDescriptor;
use crate::models::error::BioError;
use crate::models::sample::BackendKind;

/// Out-of-band interrupter for a blocking `capture_frame`.
///
/// Obtained before the capture worker starts, so the orchestrator can fire
/// it on deadline expiry without contending for the backend lock the
/// worker is holding.
pub trait CaptureInterrupt: Send + Sync {
    fn interrupt(&self);
}

/// Capability contract for a concrete capture path.
///
/// The orchestrator knows nothing about vendor protocol details — only
/// these operations. Two families implement it: a native vendor SDK
/// adapter holding a direct hardware handle, and a platform-framework
/// adapter wrapping an OS-managed biometric session.
pub trait ScannerBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Whether this backend can drive the given device. The native SDK
    /// adapter only accepts its own hardware family; the platform
    /// framework accepts any classified reader.
    fn supports(&self, device: &DeviceDescriptor) -> bool;

    /// Acquire the hardware handle or open the OS session.
    fn initialize(&mut self) -> Result<(), BioError>;

    fn is_ready(&self) -> bool;

    /// One non-blocking presence check. The orchestrator calls this on a
    /// fixed short interval from its capture worker.
    fn poll_presence(&mut self) -> Result<bool, BioError>;

    /// Capture one frame after presence was detected.
    fn capture_frame(&mut self) -> Result<Vec<u8>, BioError>;

    /// Release the hardware handle. Idempotent: safe on an already
    /// torn-down adapter.
    fn teardown(&mut self);

    /// Interrupter for backends whose `capture_frame` blocks on the device
    /// or OS session rather than returning between presence polls. The
    /// orchestrator fires it on deadline expiry so the capture worker can
    /// be joined promptly. Backends that only block in `poll_presence`
    /// slices need no interrupter.
    fn interrupt_handle(&self) -> Option<Arc<dyn CaptureInterrupt>> {
        None
    }

    /// Backend-reported quality score for captured samples
    /// (backend-defined scale).
    fn quality_hint(&self) -> u8;
}
