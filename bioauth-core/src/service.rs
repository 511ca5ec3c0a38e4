use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use chrono::Utc;

use crate::capture::orchestrator::CaptureOrchestrator;
use crate::device::registry::DeviceRegistry;
use crate::extractor::FeatureExtractor;
use crate::matching::matcher;
use crate::models::config::{CaptureConfig, MatchConfig};
use crate::models::device::DeviceDescriptor;
use crate::models::error::BioError;
use crate::models::identity::{EnrolledIdentity, FeatureData, IdentitySummary};
use crate::models::match_result::MatchResult;
use crate::models::sample::CaptureSample;
use crate::store::template_store::TemplateStore;

/// The biometric authentication service.
///
/// An explicit, constructed object owning all process-wide mutable state:
/// the template store, the device registry, and the capture orchestrator.
/// This is the surface consumed by the request layer; errors cross it only
/// as `BioError`, and an unanticipated panic inside matching or capture is
/// converted to `BioError::Internal` so a single bad request or hardware
/// fault cannot take the service down.
pub struct BioAuthService {
    store: TemplateStore,
    registry: DeviceRegistry,
    orchestrator: CaptureOrchestrator,
    extractor: Box<dyn FeatureExtractor>,
    match_config: MatchConfig,
}

impl BioAuthService {
    pub fn new(
        store: TemplateStore,
        registry: DeviceRegistry,
        orchestrator: CaptureOrchestrator,
        extractor: Box<dyn FeatureExtractor>,
        match_config: MatchConfig,
    ) -> Result<Self, BioError> {
        match_config.validate().map_err(BioError::Validation)?;
        Ok(Self {
            store,
            registry,
            orchestrator,
            extractor,
            match_config,
        })
    }

    /// Enroll (or re-enroll, last-write-wins) an identity with an already
    /// extracted feature.
    ///
    /// A snapshot persist failure degrades the store to in-memory-only but
    /// never fails an enrollment that succeeded in memory.
    pub fn enroll(
        &self,
        id: u64,
        display_name: &str,
        external_ref: &str,
        feature: FeatureData,
    ) -> Result<(), BioError> {
        if display_name.trim().is_empty() {
            return Err(BioError::Validation("display name must not be empty".into()));
        }
        if feature.is_empty() {
            return Err(BioError::Validation("feature data must not be empty".into()));
        }
        if let Some(vector) = feature.as_embedding() {
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(BioError::Validation(
                    "embedding components must be finite".into(),
                ));
            }
        }

        log::info!("enrolling identity {} ({})", id, display_name);
        self.store.put(EnrolledIdentity {
            id,
            display_name: display_name.to_string(),
            external_ref: external_ref.to_string(),
            feature,
            enrolled_at: Utc::now(),
        })
    }

    /// Extract a feature from a raw sample, then enroll it.
    pub fn enroll_sample(
        &self,
        id: u64,
        display_name: &str,
        external_ref: &str,
        sample: &[u8],
    ) -> Result<(), BioError> {
        let vector = self.extractor.extract(sample)?;
        self.enroll(id, display_name, external_ref, FeatureData::Embedding(vector))
    }

    /// Identify a query vector against every enrolled identity.
    pub fn identify(&self, query: &[f32]) -> Result<MatchResult, BioError> {
        let config = self.match_config;
        catch_internal(|| {
            self.store
                .with_records(|records| matcher::match_query(records, query, &config))
        })
    }

    /// Extract a feature from a raw sample, then identify it.
    pub fn identify_sample(&self, sample: &[u8]) -> Result<MatchResult, BioError> {
        let query = self.extractor.extract(sample)?;
        self.identify(&query)
    }

    pub fn remove(&self, id: u64) -> Result<(), BioError> {
        self.store.remove(id)
    }

    pub fn get(&self, id: u64) -> Result<EnrolledIdentity, BioError> {
        self.store.get(id).ok_or(BioError::NotEnrolled(id))
    }

    pub fn list(&self) -> Vec<IdentitySummary> {
        self.store.list()
    }

    /// Re-read the durable snapshot, picking up out-of-band changes.
    pub fn reload(&self) {
        self.store.reload()
    }

    pub fn discover_devices(&self) -> Result<Vec<DeviceDescriptor>, BioError> {
        self.registry.discover()
    }

    pub fn reconnect_device(&self) -> Result<Option<DeviceDescriptor>, BioError> {
        self.registry.reconnect()
    }

    pub fn active_device(&self) -> Option<DeviceDescriptor> {
        self.registry.active_device()
    }

    /// Capture one raw sample from the active reader, waiting up to
    /// `timeout` for presence.
    pub fn capture(&self, timeout: Duration) -> Result<CaptureSample, BioError> {
        let config = CaptureConfig::with_timeout(timeout);
        let device = self.registry.active_device();
        catch_internal(|| self.orchestrator.capture(device.as_ref(), &config))
    }

    /// Whether the store has lost its durable mirror and is serving from
    /// memory only.
    pub fn is_degraded(&self) -> bool {
        self.store.is_degraded()
    }
}

/// Convert an escaped panic into `BioError::Internal` at the service
/// boundary.
fn catch_internal<T>(f: impl FnOnce() -> Result<T, BioError>) -> Result<T, BioError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".into());
        log::error!("internal fault contained at service boundary: {}", message);
        Err(BioError::Internal(message))
    })
}
