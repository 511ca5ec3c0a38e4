use serde::{Deserialize, Serialize};

/// Which concrete capture path produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Vendor SDK talking to the reader directly.
    NativeSdk,
    /// OS-managed biometric session.
    PlatformFramework,
}

/// A raw sample produced by a capture backend.
///
/// Ephemeral: the orchestrator never persists samples. Callers feed them
/// into feature extraction and enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSample {
    pub data: Vec<u8>,
    /// Backend-defined quality scale, not comparable across backends.
    pub quality: u8,
    pub backend: BackendKind,
}
