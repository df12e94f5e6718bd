use super::now_millis;
use crate::error::StoreError;
use crate::sqlite_persistence::{schema, RecordStore, SqlValue};
use rusqlite::params;
use serde::Serialize;

/// A recorded playback. Append-only.
#[derive(Debug, Clone, Serialize)]
pub struct ListeningEventRow {
    pub id: i64,
    pub user_id: i64,
    pub song_id: String,
    pub song_title: String,
    pub artist: String,
    pub mood: String,
    pub timestamp: i64,
    pub duration: Option<i64>,
}

impl ListeningEventRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(ListeningEventRow {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            song_id: row.get("song_id")?,
            song_title: row.get("song_title")?,
            artist: row.get("artist")?,
            mood: row.get("mood")?,
            timestamp: row.get("timestamp")?,
            duration: row.get("duration")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistPlayCount {
    pub artist: String,
    pub play_count: i64,
}

#[derive(Clone)]
pub struct ListeningHistoryDao {
    store: RecordStore,
}

impl ListeningHistoryDao {
    pub fn new(store: RecordStore) -> Self {
        ListeningHistoryDao { store }
    }

    pub fn insert_event(
        &self,
        user_id: i64,
        song_id: &str,
        song_title: &str,
        artist: &str,
        mood: &str,
        duration: Option<i64>,
    ) -> Result<i64, StoreError> {
        self.store.insert(
            &schema::LISTENING_HISTORY,
            &[
                ("user_id", SqlValue::from(user_id)),
                ("song_id", SqlValue::from(song_id.to_string())),
                ("song_title", SqlValue::from(song_title.to_string())),
                ("artist", SqlValue::from(artist.to_string())),
                ("mood", SqlValue::from(mood.to_string())),
                ("timestamp", SqlValue::from(now_millis())),
                ("duration", SqlValue::from(duration)),
            ],
        )
    }

    pub fn get_user_history(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<ListeningEventRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM listening_history WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
            params![user_id, limit as i64],
            ListeningEventRow::from_row,
        )
    }

    /// Top-N artists by play count for one user.
    pub fn get_favorite_artists(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<ArtistPlayCount>, StoreError> {
        self.store.query_rows(
            "SELECT artist, COUNT(*) AS play_count FROM listening_history WHERE user_id = ?1 GROUP BY artist ORDER BY play_count DESC LIMIT ?2",
            params![user_id, limit as i64],
            |row| {
                Ok(ArtistPlayCount {
                    artist: row.get("artist")?,
                    play_count: row.get("play_count")?,
                })
            },
        )
    }

    pub fn get_history_by_mood(
        &self,
        user_id: i64,
        mood: &str,
        limit: usize,
    ) -> Result<Vec<ListeningEventRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM listening_history WHERE user_id = ?1 AND mood = ?2 ORDER BY timestamp DESC, id DESC LIMIT ?3",
            params![user_id, mood, limit as i64],
            ListeningEventRow::from_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dal::test_support::migrated_store;
    use crate::dal::UserDao;

    fn dao_with_user() -> (ListeningHistoryDao, i64) {
        let store = migrated_store();
        let user_id = UserDao::new(store.clone())
            .insert_user("bob", "b@x.com", "hash")
            .unwrap();
        (ListeningHistoryDao::new(store), user_id)
    }

    #[test]
    fn favorite_artists_ranked_by_play_count() {
        let (dao, user_id) = dao_with_user();
        for (song, artist) in [
            ("t1", "Radiohead"),
            ("t2", "Radiohead"),
            ("t3", "Radiohead"),
            ("t4", "Portishead"),
            ("t5", "Portishead"),
            ("t6", "Massive Attack"),
        ] {
            dao.insert_event(user_id, song, song, artist, "calm", None)
                .unwrap();
        }

        let favorites = dao.get_favorite_artists(user_id, 2).unwrap();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].artist, "Radiohead");
        assert_eq!(favorites[0].play_count, 3);
        assert_eq!(favorites[1].artist, "Portishead");
    }

    #[test]
    fn history_filters_by_mood() {
        let (dao, user_id) = dao_with_user();
        dao.insert_event(user_id, "t1", "Track 1", "A", "happy", Some(180))
            .unwrap();
        dao.insert_event(user_id, "t2", "Track 2", "B", "sad", None)
            .unwrap();
        dao.insert_event(user_id, "t3", "Track 3", "C", "happy", None)
            .unwrap();

        let happy = dao.get_history_by_mood(user_id, "happy", 10).unwrap();
        assert_eq!(happy.len(), 2);
        assert!(happy.iter().all(|e| e.mood == "happy"));

        assert!(dao.get_history_by_mood(user_id, "angry", 10).unwrap().is_empty());
    }

    #[test]
    fn user_history_is_limited_and_newest_first() {
        let (dao, user_id) = dao_with_user();
        for i in 0..4 {
            dao.insert_event(user_id, &format!("t{}", i), "title", "artist", "calm", None)
                .unwrap();
        }

        let history = dao.get_user_history(user_id, 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].song_id, "t3");
        assert_eq!(history[1].song_id, "t2");
    }
}
