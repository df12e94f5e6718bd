//! JSON-file-backed profile store: one pretty-printed document per username.

use super::models::{ListeningEntry, MoodEntry, RecommendationEntry, UserProfile};
use super::trait_def::ProfileStore;
use crate::error::StoreError;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Stores each profile as `<profiles_dir>/<username>.json` and mutates by
/// loading, modifying and atomically rewriting the whole file.
///
/// The internal mutex serializes writers within this process only; across
/// processes the last full-document write wins.
pub struct FileProfileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

fn validate_username(username: &str) -> Result<(), StoreError> {
    if username.is_empty() {
        return Err(StoreError::InvalidInput("empty username".to_string()));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        || username.starts_with('.')
    {
        return Err(StoreError::InvalidInput(format!(
            "username contains unsupported characters: {}",
            username
        )));
    }
    Ok(())
}

impl FileProfileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        Ok(FileProfileStore {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn profile_count(&self) -> Result<usize, StoreError> {
        let count = fs::read_dir(&self.dir)?
            .flatten()
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .count();
        Ok(count)
    }

    fn profile_path(&self, username: &str) -> Result<PathBuf, StoreError> {
        validate_username(username)?;
        Ok(self.dir.join(format!("{}.json", username)))
    }

    fn load(&self, username: &str) -> Result<Option<UserProfile>, StoreError> {
        let path = self.profile_path(username)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the whole document through a temp file + rename, refreshing
    /// `last_login` as every save does.
    fn save(&self, mut profile: UserProfile, new: bool) -> Result<UserProfile, StoreError> {
        profile.last_login = Utc::now();
        let path = self.profile_path(&profile.username)?;
        let json = serde_json::to_string_pretty(&profile)?;

        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        let result = if new {
            file.persist_noclobber(&path)
        } else {
            file.persist(&path)
        };
        match result {
            Ok(_) => {
                debug!("Saved profile document for {}", profile.username);
                Ok(profile)
            }
            Err(err) if new && err.error.kind() == std::io::ErrorKind::AlreadyExists => Err(
                StoreError::DuplicateUser(format!("profile already exists: {}", profile.username)),
            ),
            Err(err) => Err(StoreError::Persistence(err.to_string())),
        }
    }

    fn mutate(
        &self,
        username: &str,
        f: impl FnOnce(&mut UserProfile),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut profile = self
            .load(username)?
            .ok_or_else(|| StoreError::NotFound(format!("profile: {}", username)))?;
        f(&mut profile);
        self.save(profile, false)?;
        Ok(())
    }
}

impl ProfileStore for FileProfileStore {
    fn create_profile(&self, username: &str) -> Result<UserProfile, StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        if self.profile_path(username)?.exists() {
            return Err(StoreError::DuplicateUser(format!(
                "profile already exists: {}",
                username
            )));
        }
        self.save(UserProfile::new(username), true)
    }

    fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, StoreError> {
        self.load(username)
    }

    fn put_profile(&self, profile: UserProfile) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        if self.load(&profile.username)?.is_none() {
            return Err(StoreError::NotFound(format!(
                "profile: {}",
                profile.username
            )));
        }
        self.save(profile, false)?;
        Ok(())
    }

    fn delete_profile(&self, username: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let path = self.profile_path(username)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(
                format!("profile: {}", username),
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn add_mood(&self, username: &str, emotion: &str) -> Result<(), StoreError> {
        if emotion.trim().is_empty() {
            return Err(StoreError::InvalidInput("empty mood label".to_string()));
        }
        self.mutate(username, |profile| {
            profile.mood_history.push(MoodEntry {
                emotion: emotion.to_string(),
                timestamp: Utc::now(),
            });
        })
    }

    fn add_listening(
        &self,
        username: &str,
        track_id: &str,
        track_name: &str,
        artist: &str,
    ) -> Result<(), StoreError> {
        self.mutate(username, |profile| {
            profile.listening_history.push(ListeningEntry {
                track_id: track_id.to_string(),
                track_name: track_name.to_string(),
                artist: artist.to_string(),
                timestamp: Utc::now(),
            });
        })
    }

    fn add_recommendation(
        &self,
        username: &str,
        recommendation: RecommendationEntry,
    ) -> Result<(), StoreError> {
        self.mutate(username, |profile| {
            profile.recommendations.push(recommendation);
        })
    }

    fn extend_recommendations(
        &self,
        username: &str,
        recommendations: Vec<RecommendationEntry>,
    ) -> Result<(), StoreError> {
        self.mutate(username, |profile| {
            profile.recommendations.extend(recommendations);
        })
    }

    fn clear_recommendations(&self, username: &str) -> Result<(), StoreError> {
        self.mutate(username, |profile| {
            profile.recommendations.clear();
        })
    }

    fn touch_last_login(&self, username: &str) -> Result<(), StoreError> {
        // save() refreshes last_login on every write.
        self.mutate(username, |_profile| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (FileProfileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProfileStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn create_then_duplicate_fails() {
        let (store, _temp_dir) = create_tmp_store();
        store.create_profile("alice").unwrap();

        let result = store.create_profile("alice");
        assert!(matches!(result, Err(StoreError::DuplicateUser(_))));
        assert_eq!(store.profile_count().unwrap(), 1);
    }

    #[test]
    fn moods_and_listening_round_through_the_document() {
        let (store, _temp_dir) = create_tmp_store();
        store.create_profile("bob").unwrap();
        store.add_mood("bob", "happy").unwrap();
        store.add_mood("bob", "sad").unwrap();
        store.add_listening("bob", "t1", "Track One", "Artist").unwrap();

        let profile = store.get_profile("bob").unwrap().unwrap();
        assert_eq!(profile.mood_history.len(), 2);
        assert_eq!(profile.listening_history.len(), 1);
        assert_eq!(profile.get_recent_moods(1)[0].emotion, "sad");
    }

    #[test]
    fn recommendations_extend_and_clear() {
        let (store, _temp_dir) = create_tmp_store();
        store.create_profile("bob").unwrap();
        let recs: Vec<RecommendationEntry> = (0..3)
            .map(|i| RecommendationEntry {
                track_id: format!("t{}", i),
                track_name: format!("Track {}", i),
                artist: "Artist".to_string(),
                emotion: "happy".to_string(),
                external_url: None,
                preview_url: None,
            })
            .collect();

        store.extend_recommendations("bob", recs).unwrap();
        assert_eq!(store.get_profile("bob").unwrap().unwrap().recommendations.len(), 3);

        store.clear_recommendations("bob").unwrap();
        assert!(store.get_profile("bob").unwrap().unwrap().recommendations.is_empty());
    }

    #[test]
    fn mutating_missing_profile_is_not_found() {
        let (store, _temp_dir) = create_tmp_store();
        let result = store.add_mood("ghost", "happy");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn usernames_that_escape_the_directory_are_rejected() {
        let (store, _temp_dir) = create_tmp_store();
        assert!(matches!(
            store.create_profile("../evil"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.create_profile(""),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn every_save_refreshes_last_login() {
        let (store, _temp_dir) = create_tmp_store();
        let created = store.create_profile("bob").unwrap();
        store.add_mood("bob", "calm").unwrap();

        let profile = store.get_profile("bob").unwrap().unwrap();
        assert!(profile.last_login >= created.last_login);
    }

    // Two snapshots written back in sequence model the unsynchronized
    // concurrent-append case: the second whole-document write replaces the
    // first, dropping its entry. Accepted behavior, asserted as such.
    #[test]
    fn concurrent_style_writes_are_last_writer_wins() {
        let (store, _temp_dir) = create_tmp_store();
        store.create_profile("carol").unwrap();

        let mut snapshot_a = store.get_profile("carol").unwrap().unwrap();
        let mut snapshot_b = store.get_profile("carol").unwrap().unwrap();

        snapshot_a.mood_history.push(MoodEntry {
            emotion: "sad".to_string(),
            timestamp: Utc::now(),
        });
        store.put_profile(snapshot_a).unwrap();

        snapshot_b.mood_history.push(MoodEntry {
            emotion: "calm".to_string(),
            timestamp: Utc::now(),
        });
        store.put_profile(snapshot_b).unwrap();

        let profile = store.get_profile("carol").unwrap().unwrap();
        assert_eq!(profile.mood_history.len(), 1);
        assert_eq!(profile.mood_history[0].emotion, "calm");
    }
}
