use crate::models::error::BioError;

/// Feature extraction collaborator contract.
///
/// Turns a raw capture (a face image, a fingerprint frame) into an
/// embedding vector. The model behind it is out of scope for this crate;
/// implementations wrap whatever pipeline the deployment uses. Returns
/// `BioError::Extraction` when no feature is detected in the sample.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, sample: &[u8]) -> Result<Vec<f32>, BioError>;
}
