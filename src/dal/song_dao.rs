use super::now_millis;
use crate::error::StoreError;
use crate::sqlite_persistence::{schema, RecordStore, SqlValue};
use rusqlite::params;
use serde::Serialize;

/// Catalog entry. `song_id` is the external business key, distinct from the
/// surrogate `id`.
#[derive(Debug, Clone, Serialize)]
pub struct SongRow {
    pub id: i64,
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<i64>,
    pub mood_category: Option<String>,
    pub external_url: Option<String>,
    pub created_at: i64,
}

impl SongRow {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(SongRow {
            id: row.get("id")?,
            song_id: row.get("song_id")?,
            title: row.get("title")?,
            artist: row.get("artist")?,
            album: row.get("album")?,
            genre: row.get("genre")?,
            duration: row.get("duration")?,
            mood_category: row.get("mood_category")?,
            external_url: row.get("external_url")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSong {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<i64>,
    pub mood_category: Option<String>,
    pub external_url: Option<String>,
}

#[derive(Clone)]
pub struct SongDao {
    store: RecordStore,
}

impl SongDao {
    pub fn new(store: RecordStore) -> Self {
        SongDao { store }
    }

    pub fn insert_song(&self, song: &NewSong) -> Result<i64, StoreError> {
        self.store.insert(
            &schema::SONGS,
            &[
                ("song_id", SqlValue::from(song.song_id.clone())),
                ("title", SqlValue::from(song.title.clone())),
                ("artist", SqlValue::from(song.artist.clone())),
                ("album", SqlValue::from(song.album.clone())),
                ("genre", SqlValue::from(song.genre.clone())),
                ("duration", SqlValue::from(song.duration)),
                ("mood_category", SqlValue::from(song.mood_category.clone())),
                ("external_url", SqlValue::from(song.external_url.clone())),
                ("created_at", SqlValue::from(now_millis())),
            ],
        )
    }

    pub fn get_songs_by_mood(&self, mood: &str) -> Result<Vec<SongRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM songs WHERE mood_category = ?1",
            params![mood],
            SongRow::from_row,
        )
    }

    pub fn get_songs_by_artist(&self, artist: &str) -> Result<Vec<SongRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM songs WHERE artist = ?1",
            params![artist],
            SongRow::from_row,
        )
    }

    pub fn get_songs_by_genre(&self, genre: &str) -> Result<Vec<SongRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM songs WHERE genre = ?1",
            params![genre],
            SongRow::from_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dal::test_support::migrated_store;

    fn song(song_id: &str, artist: &str, mood: &str, genre: &str) -> NewSong {
        NewSong {
            song_id: song_id.to_string(),
            title: format!("title of {}", song_id),
            artist: artist.to_string(),
            genre: Some(genre.to_string()),
            mood_category: Some(mood.to_string()),
            ..NewSong::default()
        }
    }

    #[test]
    fn catalog_lookups_by_mood_artist_and_genre() {
        let dao = SongDao::new(migrated_store());
        dao.insert_song(&song("s1", "Moby", "calm", "electronic")).unwrap();
        dao.insert_song(&song("s2", "Moby", "happy", "electronic")).unwrap();
        dao.insert_song(&song("s3", "Nina Simone", "calm", "jazz")).unwrap();

        assert_eq!(dao.get_songs_by_mood("calm").unwrap().len(), 2);
        assert_eq!(dao.get_songs_by_artist("Moby").unwrap().len(), 2);
        assert_eq!(dao.get_songs_by_genre("jazz").unwrap().len(), 1);
        assert!(dao.get_songs_by_genre("polka").unwrap().is_empty());
    }

    #[test]
    fn song_business_key_is_unique() {
        let dao = SongDao::new(migrated_store());
        dao.insert_song(&song("s1", "Moby", "calm", "electronic")).unwrap();
        let result = dao.insert_song(&song("s1", "Other", "sad", "rock"));
        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }
}
