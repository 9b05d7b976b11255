use serde::{Deserialize, Serialize};

use crate::mood::{DescriptorBundle, ParameterSet};

/// A generation about to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGenerationRecord {
    pub params: ParameterSet,
    pub descriptors: DescriptorBundle,
    /// Where the dashboard plays the track from (relative when served locally).
    pub audio_url: String,
    /// Shareable URL of the uploaded track.
    pub public_url: String,
    /// Unix seconds.
    pub created_at: i64,
}

/// A persisted generation. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: i64,
    pub params: ParameterSet,
    pub descriptors: DescriptorBundle,
    pub audio_url: String,
    pub public_url: String,
    pub created_at: i64,
}

impl GenerationRecord {
    pub fn from_new(id: i64, record: NewGenerationRecord) -> Self {
        Self {
            id,
            params: record.params,
            descriptors: record.descriptors,
            audio_url: record.audio_url,
            public_url: record.public_url,
            created_at: record.created_at,
        }
    }
}
