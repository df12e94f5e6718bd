//! Per-user aggregate document models.
//!
//! One document embeds the user's whole denormalized history. The embedded
//! lists grow without bound and are sorted on read; acceptable for the
//! per-user history sizes this serves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub emotion: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningEntry {
    pub track_id: String,
    pub track_name: String,
    pub artist: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub track_id: String,
    pub track_name: String,
    pub artist: String,
    pub emotion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub mood_history: Vec<MoodEntry>,
    #[serde(default)]
    pub listening_history: Vec<ListeningEntry>,
    #[serde(default)]
    pub recommendations: Vec<RecommendationEntry>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(username: &str) -> Self {
        let now = Utc::now();
        UserProfile {
            username: username.to_string(),
            mood_history: Vec::new(),
            listening_history: Vec::new(),
            recommendations: Vec::new(),
            is_active: true,
            created_at: now,
            last_login: now,
        }
    }

    /// The `limit` most recent moods, newest first, by entry timestamp
    /// rather than append order.
    pub fn get_recent_moods(&self, limit: usize) -> Vec<MoodEntry> {
        let mut moods = self.mood_history.clone();
        moods.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        moods.truncate(limit);
        moods
    }

    pub fn get_recent_tracks(&self, limit: usize) -> Vec<ListeningEntry> {
        let mut tracks = self.listening_history.clone();
        tracks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        tracks.truncate(limit);
        tracks
    }

    pub fn get_recommendations_by_emotion(&self, emotion: &str) -> Vec<RecommendationEntry> {
        self.recommendations
            .iter()
            .filter(|rec| rec.emotion == emotion)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mood_at(emotion: &str, minute: u32) -> MoodEntry {
        MoodEntry {
            emotion: emotion.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn recent_moods_sorted_by_timestamp_not_append_order() {
        let mut profile = UserProfile::new("alice");
        // Appended out of chronological order on purpose.
        for minute in [3, 9, 1, 7, 5, 0, 8, 2, 6, 4] {
            profile
                .mood_history
                .push(mood_at(&format!("mood-{}", minute), minute));
        }

        let recent = profile.get_recent_moods(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].emotion, "mood-9");
        assert_eq!(recent[1].emotion, "mood-8");
        assert_eq!(recent[2].emotion, "mood-7");
    }

    #[test]
    fn recent_moods_with_limit_beyond_size_returns_all() {
        let mut profile = UserProfile::new("alice");
        profile.mood_history.push(mood_at("happy", 1));
        assert_eq!(profile.get_recent_moods(10).len(), 1);
    }

    #[test]
    fn recommendations_filter_by_emotion() {
        let mut profile = UserProfile::new("alice");
        for (track, emotion) in [("t1", "happy"), ("t2", "sad"), ("t3", "happy")] {
            profile.recommendations.push(RecommendationEntry {
                track_id: track.to_string(),
                track_name: track.to_string(),
                artist: "artist".to_string(),
                emotion: emotion.to_string(),
                external_url: None,
                preview_url: None,
            });
        }

        let happy = profile.get_recommendations_by_emotion("happy");
        assert_eq!(happy.len(), 2);
        assert!(happy.iter().all(|r| r.emotion == "happy"));
    }
}
