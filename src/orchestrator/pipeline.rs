//! The request-level pipeline behind every inference endpoint.

use super::collaborators::{EmotionInference, EmotionInput, RecommendedTrack, TrackRecommender};
use super::upload::ScopedUpload;
use crate::dal::{ListeningHistoryDao, MoodHistoryDao, UserDao};
use crate::error::StoreError;
use crate::profile_store::{ProfileStore, RecommendationEntry};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Response payload of a detection or recommendation request.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionOutcome {
    pub emotion: String,
    pub recommendations: Vec<RecommendedTrack>,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub enum UploadModality {
    Speech,
    Image,
}

/// A relational history event for one detection: always a mood row, plus a
/// listening row when the song details are present.
#[derive(Debug, Clone, Default)]
pub struct EmotionEvent {
    pub username: String,
    pub emotion: String,
    pub song_id: Option<String>,
    pub song_title: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<i64>,
}

/// Runs each inference request: validate, infer, recommend, then record to
/// both stores best-effort and assemble the response.
///
/// The two stores share no transaction. A failed history write is logged
/// and swallowed so the user-facing result never fails on bookkeeping; the
/// stores can therefore diverge and no reconciliation pass exists.
pub struct EventOrchestrator {
    inference: Arc<dyn EmotionInference>,
    recommender: Arc<dyn TrackRecommender>,
    profiles: Arc<dyn ProfileStore>,
    users: UserDao,
    moods: MoodHistoryDao,
    listening: ListeningHistoryDao,
    uploads_dir: PathBuf,
}

impl EventOrchestrator {
    pub fn new(
        inference: Arc<dyn EmotionInference>,
        recommender: Arc<dyn TrackRecommender>,
        profiles: Arc<dyn ProfileStore>,
        users: UserDao,
        moods: MoodHistoryDao,
        listening: ListeningHistoryDao,
        uploads_dir: PathBuf,
    ) -> Self {
        EventOrchestrator {
            inference,
            recommender,
            profiles,
            users,
            moods,
            listening,
            uploads_dir,
        }
    }

    /// Detect an emotion from the given input and return it with a ranked
    /// track list. Inference failure aborts; recommendation failure degrades
    /// to an empty list; history recording never fails the request.
    pub fn detect_and_recommend(
        &self,
        username: &str,
        input: &EmotionInput,
        market: Option<&str>,
    ) -> Result<DetectionOutcome, StoreError> {
        validate_input(input)?;

        let label = self
            .inference
            .infer(input)
            .map_err(|e| StoreError::Upstream(format!("{} inference: {}", input.modality(), e)))?;
        let label = match (label.trim().is_empty(), input) {
            // The facial model can come back empty on an unreadable frame.
            (true, EmotionInput::Image(_)) => {
                warn!("Image inference returned no label, defaulting to neutral");
                "neutral".to_string()
            }
            (true, _) => {
                return Err(StoreError::Upstream(format!(
                    "{} inference returned no label",
                    input.modality()
                )))
            }
            (false, _) => label,
        };
        debug!("Detected emotion {} for {}", label, username);

        let recommendations = match self.recommender.recommend(&label, market) {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(
                    "Recommendation lookup failed for {} ({}), returning none: {}",
                    username, label, e
                );
                Vec::new()
            }
        };

        self.record_profile_history(username, &label, &recommendations);

        Ok(DetectionOutcome {
            emotion: label,
            recommendations,
            message: "Emotion detected and saved to history".to_string(),
        })
    }

    /// Speech/image variant: persists the payload to a scoped temp file
    /// first. The file is removed on every exit path, including inference
    /// failure.
    pub fn detect_from_upload(
        &self,
        username: &str,
        modality: UploadModality,
        original_name: &str,
        payload: &[u8],
        market: Option<&str>,
    ) -> Result<DetectionOutcome, StoreError> {
        let upload = ScopedUpload::persist(&self.uploads_dir, original_name, payload)?;
        let input = match modality {
            UploadModality::Speech => EmotionInput::Speech(upload.path().to_path_buf()),
            UploadModality::Image => EmotionInput::Image(upload.path().to_path_buf()),
        };
        self.detect_and_recommend(username, &input, market)
    }

    /// Explicit recommendation request for an already-known label. Here the
    /// track list is the primary result, so a lookup failure aborts instead
    /// of degrading.
    pub fn recommend_for_label(
        &self,
        username: &str,
        emotion: &str,
        market: Option<&str>,
    ) -> Result<DetectionOutcome, StoreError> {
        if emotion.trim().is_empty() {
            return Err(StoreError::InvalidInput("emotion is required".to_string()));
        }

        let recommendations = self
            .recommender
            .recommend(emotion, market)
            .map_err(|e| StoreError::Upstream(format!("recommendation lookup: {}", e)))?;

        self.record_profile_history(username, emotion, &recommendations);

        Ok(DetectionOutcome {
            emotion: emotion.to_string(),
            recommendations,
            message: "Recommendations generated and saved to history".to_string(),
        })
    }

    /// Relational history path: resolve the user and insert mood and
    /// listening rows through the typed DAOs. Each insert is its own unit of
    /// work; a listening-row failure leaves the committed mood row in place.
    pub fn record_emotion_event(&self, event: &EmotionEvent) -> Result<(), StoreError> {
        if event.emotion.trim().is_empty() {
            return Err(StoreError::InvalidInput("emotion is required".to_string()));
        }
        let user = self
            .users
            .get_by_username(&event.username)?
            .ok_or_else(|| StoreError::NotFound(format!("user: {}", event.username)))?;

        self.moods
            .insert_event(user.id, &event.emotion, event.song_id.as_deref())?;

        if let (Some(song_id), Some(title), Some(artist)) =
            (&event.song_id, &event.song_title, &event.artist)
        {
            self.listening.insert_event(
                user.id,
                song_id,
                title,
                artist,
                &event.emotion,
                event.duration,
            )?;
        }
        Ok(())
    }

    /// When the lookup carries no identifier, fall back to the last path
    /// segment of the external URL. A convention, not a unique key: two
    /// tracks sharing a trailing segment collide.
    pub fn derive_track_id(track: &RecommendedTrack) -> String {
        if let Some(id) = &track.track_id {
            return id.clone();
        }
        let trimmed = track.external_url.trim_end_matches('/');
        trimmed
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(trimmed)
            .to_string()
    }

    // Step 4 of the pipeline: every write independently guarded, logged on
    // failure, never propagated.
    fn record_profile_history(
        &self,
        username: &str,
        emotion: &str,
        recommendations: &[RecommendedTrack],
    ) {
        if let Err(e) = self.profiles.add_mood(username, emotion) {
            warn!("Failed to record mood for {}: {}", username, e);
        }
        for track in recommendations {
            let entry = RecommendationEntry {
                track_id: Self::derive_track_id(track),
                track_name: track.name.clone(),
                artist: track.artist.clone(),
                emotion: emotion.to_string(),
                external_url: Some(track.external_url.clone()),
                preview_url: track.preview_url.clone(),
            };
            if let Err(e) = self.profiles.add_recommendation(username, entry) {
                warn!(
                    "Failed to record recommendation {} for {}: {}",
                    track.name, username, e
                );
            }
        }
    }
}

fn validate_input(input: &EmotionInput) -> Result<(), StoreError> {
    match input {
        EmotionInput::Text(text) if text.trim().is_empty() => {
            Err(StoreError::InvalidInput("no text provided".to_string()))
        }
        EmotionInput::Speech(path) | EmotionInput::Image(path) if !path.exists() => Err(
            StoreError::InvalidInput(format!("upload not found: {}", path.display())),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(external_url: &str) -> RecommendedTrack {
        RecommendedTrack {
            track_id: None,
            name: "name".to_string(),
            artist: "artist".to_string(),
            external_url: external_url.to_string(),
            preview_url: None,
        }
    }

    #[test]
    fn track_id_is_last_path_segment_of_external_url() {
        let t = track("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(
            EventOrchestrator::derive_track_id(&t),
            "4uLU6hMCjMI75M1A2tKUQC"
        );

        let trailing_slash = track("https://example.com/track/abc/");
        assert_eq!(EventOrchestrator::derive_track_id(&trailing_slash), "abc");
    }

    #[test]
    fn explicit_track_id_wins_over_url_derivation() {
        let mut t = track("https://example.com/track/abc");
        t.track_id = Some("explicit".to_string());
        assert_eq!(EventOrchestrator::derive_track_id(&t), "explicit");
    }

    #[test]
    fn empty_text_is_invalid_input() {
        let result = validate_input(&EmotionInput::Text("   ".to_string()));
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn missing_upload_path_is_invalid_input() {
        let result = validate_input(&EmotionInput::Speech(PathBuf::from(
            "/definitely/not/here.wav",
        )));
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }
}
