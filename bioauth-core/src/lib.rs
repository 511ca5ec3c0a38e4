//! # bioauth-core
//!
//! Platform-agnostic biometric authentication core.
//!
//! Enrolls feature representations (face embeddings or fingerprint
//! templates) against subject identities and decides whether a fresh
//! sample belongs to an enrolled identity. Platform-specific capture
//! backends (native vendor SDKs, OS biometric frameworks) implement the
//! `ScannerBackend` trait and plug into the generic `CaptureOrchestrator`.
//!
//! ## Architecture
//!
//! ```text
//! bioauth-core (this crate)
//! ├── models/      ← BioError, EnrolledIdentity, DeviceDescriptor, CaptureSample, configs
//! ├── store/       ← TemplateStore (in-memory + JSON snapshot mirror)
//! ├── matching/    ← distance metrics, threshold/confidence policy
//! ├── device/      ← vendor table, DeviceRegistry, UsbDeviceProvider seam
//! ├── capture/     ← ScannerBackend trait, CaptureOrchestrator state machine
//! └── service.rs   ← BioAuthService facade consumed by the request layer
//! ```

pub mod capture;
pub mod device;
pub mod extractor;
pub mod matching;
pub mod models;
pub mod service;
pub mod store;

// Re-export key types at crate root for convenience.
pub use capture::backend::{CaptureInterrupt, ScannerBackend};
pub use capture::orchestrator::CaptureOrchestrator;
pub use capture::state::CaptureState;
pub use device::registry::{DeviceRegistry, UsbDeviceProvider};
pub use extractor::FeatureExtractor;
pub use matching::matcher::match_query;
pub use models::config::{CaptureConfig, MatchConfig};
pub use models::device::{DeviceDescriptor, DeviceStatus, RawUsbDevice};
pub use models::error::BioError;
pub use models::identity::{EnrolledIdentity, FeatureData, IdentitySummary};
pub use models::match_result::{DistanceMetric, MatchResult};
pub use models::sample::{BackendKind, CaptureSample};
pub use service::BioAuthService;
pub use store::template_store::TemplateStore;
