use super::now_millis;
use crate::error::StoreError;
use crate::sqlite_persistence::{schema, RecordStore, SqlValue};
use rusqlite::params;
use serde::Serialize;

/// A recorded mood detection. Append-only; rows are never updated.
#[derive(Debug, Clone, Serialize)]
pub struct MoodEventRow {
    pub id: i64,
    pub user_id: i64,
    pub mood: String,
    pub timestamp: i64,
    pub song_id: Option<String>,
}

impl MoodEventRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(MoodEventRow {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            mood: row.get("mood")?,
            timestamp: row.get("timestamp")?,
            song_id: row.get("song_id")?,
        })
    }
}

/// Per-label aggregate count for one user.
#[derive(Debug, Clone, Serialize)]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}

#[derive(Clone)]
pub struct MoodHistoryDao {
    store: RecordStore,
}

impl MoodHistoryDao {
    pub fn new(store: RecordStore) -> Self {
        MoodHistoryDao { store }
    }

    pub fn insert_event(
        &self,
        user_id: i64,
        mood: &str,
        song_id: Option<&str>,
    ) -> Result<i64, StoreError> {
        self.store.insert(
            &schema::MOOD_HISTORY,
            &[
                ("user_id", SqlValue::from(user_id)),
                ("mood", SqlValue::from(mood.to_string())),
                ("timestamp", SqlValue::from(now_millis())),
                ("song_id", SqlValue::from(song_id.map(|s| s.to_string()))),
            ],
        )
    }

    /// A user's most recent mood events, newest first.
    pub fn get_user_mood_history(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<MoodEventRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM mood_history WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
            params![user_id, limit as i64],
            MoodEventRow::from_row,
        )
    }

    pub fn get_mood_stats(&self, user_id: i64) -> Result<Vec<MoodCount>, StoreError> {
        self.store.query_rows(
            "SELECT mood, COUNT(*) AS count FROM mood_history WHERE user_id = ?1 GROUP BY mood",
            params![user_id],
            |row| {
                Ok(MoodCount {
                    mood: row.get("mood")?,
                    count: row.get("count")?,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dal::test_support::migrated_store;
    use crate::dal::UserDao;

    fn dao_with_user() -> (MoodHistoryDao, i64) {
        let store = migrated_store();
        let user_id = UserDao::new(store.clone())
            .insert_user("alice", "a@x.com", "hash")
            .unwrap();
        (MoodHistoryDao::new(store), user_id)
    }

    #[test]
    fn history_returns_exactly_n_rows_newest_first() {
        let (dao, user_id) = dao_with_user();
        let moods = ["happy", "sad", "calm", "angry", "happy"];
        for mood in moods {
            dao.insert_event(user_id, mood, None).unwrap();
        }

        let history = dao.get_user_mood_history(user_id, moods.len()).unwrap();
        assert_eq!(history.len(), moods.len());
        for pair in history.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        // Ties on timestamp fall back to insertion order, newest first.
        assert_eq!(history[0].mood, "happy");
        assert_eq!(history.last().unwrap().mood, "happy");
    }

    #[test]
    fn history_respects_limit_and_empty_reads_are_ok() {
        let (dao, user_id) = dao_with_user();
        assert!(dao.get_user_mood_history(user_id, 10).unwrap().is_empty());

        for _ in 0..5 {
            dao.insert_event(user_id, "calm", Some("track-1")).unwrap();
        }
        assert_eq!(dao.get_user_mood_history(user_id, 3).unwrap().len(), 3);
    }

    #[test]
    fn mood_stats_group_by_label() {
        let (dao, user_id) = dao_with_user();
        for mood in ["happy", "happy", "sad"] {
            dao.insert_event(user_id, mood, None).unwrap();
        }

        let mut stats = dao.get_mood_stats(user_id).unwrap();
        stats.sort_by(|a, b| a.mood.cmp(&b.mood));
        assert_eq!(stats.len(), 2);
        assert_eq!((stats[0].mood.as_str(), stats[0].count), ("happy", 2));
        assert_eq!((stats[1].mood.as_str(), stats[1].count), ("sad", 1));
    }
}
