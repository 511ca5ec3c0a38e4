use crate::models::error::BioError;
use crate::models::sample::BackendKind;

/// Capture call state machine.
///
/// State transitions:
/// ```text
/// idle → selecting backend → awaiting sample → captured / timed out / failed
///              ↑ (i/o failover, once)  ↓                    ↓
///              └───────────────────────┘                   idle
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    SelectingBackend,
    AwaitingSample { backend: BackendKind },
    Captured { backend: BackendKind },
    TimedOut,
    Failed(BioError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::SelectingBackend | Self::AwaitingSample { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Captured { .. } | Self::TimedOut | Self::Failed(_))
    }
}
