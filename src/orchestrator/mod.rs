//! The per-request pipeline: inference and recommendation collaborators,
//! scoped upload handling, best-effort dual-store recording, and account
//! management.

mod accounts;
mod collaborators;
mod pipeline;
mod upload;

pub use accounts::{AccountService, AuthenticatedUser, RegisteredUser};
pub use collaborators::{
    CredentialHasher, EmotionInference, EmotionInput, RecommendedTrack, Sha256Hasher,
    TrackRecommender, UpstreamError,
};
pub use pipeline::{DetectionOutcome, EmotionEvent, EventOrchestrator, UploadModality};
pub use upload::ScopedUpload;
