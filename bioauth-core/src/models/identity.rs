use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature representation of a biometric sample.
///
/// Face pipelines produce a fixed-dimension embedding vector; fingerprint
/// hardware with an on-device matcher produces an opaque byte template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureData {
    Embedding(Vec<f32>),
    Template(Vec<u8>),
}

impl FeatureData {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Embedding(v) => v.is_empty(),
            Self::Template(b) => b.is_empty(),
        }
    }

    /// The embedding vector, if this feature is vector-based.
    pub fn as_embedding(&self) -> Option<&[f32]> {
        match self {
            Self::Embedding(v) => Some(v),
            Self::Template(_) => None,
        }
    }
}

/// An enrolled subject identity and its feature data.
///
/// At most one live record exists per `id`; re-enrollment with the same id
/// overwrites the previous record (last-write-wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledIdentity {
    /// Externally assigned primary key.
    pub id: u64,
    pub display_name: String,
    /// Secondary human identifier, e.g. a national worker id.
    pub external_ref: String,
    pub feature: FeatureData,
    pub enrolled_at: DateTime<Utc>,
}

/// Public metadata for an enrolled identity, excluding raw feature data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: u64,
    pub display_name: String,
    pub external_ref: String,
}

impl From<&EnrolledIdentity> for IdentitySummary {
    fn from(identity: &EnrolledIdentity) -> Self {
        Self {
            id: identity.id,
            display_name: identity.display_name.clone(),
            external_ref: identity.external_ref.clone(),
        }
    }
}
