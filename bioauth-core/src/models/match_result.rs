use serde::{Deserialize, Serialize};

/// Distance metric for embedding comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
}

/// A positive identification outcome.
///
/// Computed fresh per identification call and never cached. Rejections are
/// reported as `BioError::NoMatch` (best distance above threshold) or
/// `BioError::EmptyStore` (no candidates at all).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub identity_id: u64,
    pub display_name: String,
    pub external_ref: String,
    pub distance: f32,
    /// Linear normalization against the threshold boundary,
    /// `clamp(1 - distance/threshold, 0, 1)`. Not a calibrated
    /// probability — do not over-interpret it.
    pub confidence: f32,
}
