//! Trait seams for the external collaborators: emotion inference, the
//! recommendation lookup, and password hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct UpstreamError(pub String);

/// The inference payload, one variant per modality. Speech and image carry
/// the path of an already-persisted upload.
#[derive(Debug, Clone)]
pub enum EmotionInput {
    Text(String),
    Speech(PathBuf),
    Image(PathBuf),
}

impl EmotionInput {
    pub fn modality(&self) -> &'static str {
        match self {
            EmotionInput::Text(_) => "text",
            EmotionInput::Speech(_) => "speech",
            EmotionInput::Image(_) => "image",
        }
    }
}

/// Emotion inference routine: modality payload in, free-form label out.
pub trait EmotionInference: Send + Sync {
    fn infer(&self, input: &EmotionInput) -> Result<String, UpstreamError>;
}

/// One entry of the ranked track list returned by the recommendation lookup.
/// The lookup does not always carry a first-class identifier; see
/// [`EventOrchestrator::derive_track_id`](crate::orchestrator::EventOrchestrator::derive_track_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    pub name: String,
    pub artist: String,
    pub external_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Recommendation lookup: (label, optional market) to ranked tracks.
pub trait TrackRecommender: Send + Sync {
    fn recommend(
        &self,
        emotion: &str,
        market: Option<&str>,
    ) -> Result<Vec<RecommendedTrack>, UpstreamError>;
}

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, hash: &str) -> bool {
        self.hash(password) == hash
    }
}

/// Plain SHA-256 hex digest of the password.
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let digest = Sha256::digest(password.as_bytes());
        digest.iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        })
    }
}
