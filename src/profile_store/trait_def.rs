//! ProfileStore trait definition.

use super::models::{RecommendationEntry, UserProfile};
use crate::error::StoreError;

/// Per-user aggregate document storage, addressed by unique username.
///
/// Every mutation is a whole-document read-modify-write and refreshes the
/// profile's `last_login`. There is no optimistic-concurrency token: two
/// writers racing on the same username can lose the earlier write
/// (last-writer-wins on the full document). Accepted limitation, not
/// silently patched.
pub trait ProfileStore: Send + Sync {
    /// Insert-only creation: fails with `DuplicateUser` when a document for
    /// this username already exists.
    fn create_profile(&self, username: &str) -> Result<UserProfile, StoreError>;

    fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Replace the whole document. Missing profile is `NotFound`.
    fn put_profile(&self, profile: UserProfile) -> Result<(), StoreError>;

    fn delete_profile(&self, username: &str) -> Result<(), StoreError>;

    /// Append a timestamped mood entry.
    fn add_mood(&self, username: &str, emotion: &str) -> Result<(), StoreError>;

    /// Append a timestamped listening entry.
    fn add_listening(
        &self,
        username: &str,
        track_id: &str,
        track_name: &str,
        artist: &str,
    ) -> Result<(), StoreError>;

    fn add_recommendation(
        &self,
        username: &str,
        recommendation: RecommendationEntry,
    ) -> Result<(), StoreError>;

    /// Bulk-append recommendations.
    fn extend_recommendations(
        &self,
        username: &str,
        recommendations: Vec<RecommendationEntry>,
    ) -> Result<(), StoreError>;

    /// Explicit "delete all" for the recommendation list.
    fn clear_recommendations(&self, username: &str) -> Result<(), StoreError>;

    /// Refresh `last_login` without touching the histories.
    fn touch_last_login(&self, username: &str) -> Result<(), StoreError>;
}
