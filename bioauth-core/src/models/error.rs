use thiserror::Error;

/// Errors produced by the biometric core.
///
/// Match rejections (`NoMatch`, `EmptyStore`) are ordinary outcomes and are
/// returned to the immediate caller, never escalated. Hardware and backend
/// failures are confined to the capture orchestrator and surfaced only as
/// one of the capture-specific variants below.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BioError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("feature extraction failed: {0}")]
    Extraction(String),

    #[error("identity {0} is not enrolled")]
    NotEnrolled(u64),

    /// Candidates exist but none fell within the threshold.
    /// Carries the best (smallest) distance seen for diagnostics.
    #[error("no match: best distance {best_distance} above threshold")]
    NoMatch { best_distance: f32 },

    /// No candidates at all — distinct from `NoMatch`.
    #[error("no identities enrolled")]
    EmptyStore,

    #[error("no biometric reader connected")]
    DeviceNotConnected,

    #[error("capture timed out")]
    CaptureTimeout,

    #[error("device i/o error: {0}")]
    CaptureIo(String),

    /// A capture is already in flight against the active device.
    #[error("capture already in progress")]
    CaptureBusy,

    #[error("no capture backend available")]
    BackendUnavailable,

    #[error("snapshot persistence failed: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}
