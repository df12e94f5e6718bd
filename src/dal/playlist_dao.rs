use super::now_millis;
use super::song_dao::SongRow;
use crate::error::StoreError;
use crate::sqlite_persistence::{schema, RecordStore, SqlValue};
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub mood_category: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PlaylistRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(PlaylistRow {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            mood_category: row.get("mood_category")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Clone)]
pub struct PlaylistDao {
    store: RecordStore,
}

impl PlaylistDao {
    pub fn new(store: RecordStore) -> Self {
        PlaylistDao { store }
    }

    pub fn create_playlist(
        &self,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        mood_category: Option<&str>,
    ) -> Result<i64, StoreError> {
        let now = now_millis();
        self.store.insert(
            &schema::PLAYLISTS,
            &[
                ("user_id", SqlValue::from(user_id)),
                ("name", SqlValue::from(name.to_string())),
                (
                    "description",
                    SqlValue::from(description.map(|s| s.to_string())),
                ),
                (
                    "mood_category",
                    SqlValue::from(mood_category.map(|s| s.to_string())),
                ),
                ("created_at", SqlValue::from(now)),
                ("updated_at", SqlValue::from(now)),
            ],
        )
    }

    pub fn get_user_playlists(&self, user_id: i64) -> Result<Vec<PlaylistRow>, StoreError> {
        self.store.query_rows(
            "SELECT * FROM playlists WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            params![user_id],
            PlaylistRow::from_row,
        )
    }

    /// Songs of a playlist in their explicit position order.
    pub fn get_playlist_songs(&self, playlist_id: i64) -> Result<Vec<SongRow>, StoreError> {
        self.store.query_rows(
            "SELECT s.* FROM songs s JOIN playlist_songs ps ON s.song_id = ps.song_id WHERE ps.playlist_id = ?1 ORDER BY ps.position",
            params![playlist_id],
            SongRow::from_row,
        )
    }

    /// Append a song to a playlist. Without an explicit position the song
    /// lands at `max(position) + 1` within that playlist (1 when empty).
    /// Positions are scoped per playlist, not globally unique. Adding the
    /// same song twice fails with `ConstraintViolation`.
    pub fn add_song_to_playlist(
        &self,
        playlist_id: i64,
        song_id: &str,
        position: Option<i64>,
    ) -> Result<i64, StoreError> {
        let position = match position {
            Some(p) => p,
            None => {
                let max: Option<i64> = self
                    .store
                    .query_opt(
                        "SELECT MAX(position) FROM playlist_songs WHERE playlist_id = ?1",
                        params![playlist_id],
                        |row| row.get(0),
                    )?
                    .flatten();
                max.unwrap_or(0) + 1
            }
        };
        self.store.insert(
            &schema::PLAYLIST_SONGS,
            &[
                ("playlist_id", SqlValue::from(playlist_id)),
                ("song_id", SqlValue::from(song_id.to_string())),
                ("added_at", SqlValue::from(now_millis())),
                ("position", SqlValue::from(position)),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dal::test_support::migrated_store;
    use crate::dal::{NewSong, SongDao, UserDao};

    fn setup() -> (PlaylistDao, SongDao, i64) {
        let store = migrated_store();
        let user_id = UserDao::new(store.clone())
            .insert_user("carol", "c@x.com", "hash")
            .unwrap();
        (PlaylistDao::new(store.clone()), SongDao::new(store), user_id)
    }

    fn add_song(songs: &SongDao, song_id: &str) {
        songs
            .insert_song(&NewSong {
                song_id: song_id.to_string(),
                title: song_id.to_string(),
                artist: "artist".to_string(),
                ..NewSong::default()
            })
            .unwrap();
    }

    #[test]
    fn positions_auto_increment_per_playlist_starting_at_one() {
        let (playlists, songs, user_id) = setup();
        let p1 = playlists.create_playlist(user_id, "calm mix", None, Some("calm")).unwrap();
        let p2 = playlists.create_playlist(user_id, "gym", None, None).unwrap();
        for id in ["s1", "s2", "s3"] {
            add_song(&songs, id);
        }

        playlists.add_song_to_playlist(p1, "s1", None).unwrap();
        playlists.add_song_to_playlist(p1, "s2", None).unwrap();
        // Positions restart per playlist.
        playlists.add_song_to_playlist(p2, "s3", None).unwrap();

        let ordered = playlists.get_playlist_songs(p1).unwrap();
        assert_eq!(
            ordered.iter().map(|s| s.song_id.as_str()).collect::<Vec<_>>(),
            vec!["s1", "s2"]
        );
        assert_eq!(playlists.get_playlist_songs(p2).unwrap().len(), 1);
    }

    #[test]
    fn explicit_position_overrides_ordering() {
        let (playlists, songs, user_id) = setup();
        let playlist = playlists.create_playlist(user_id, "mix", None, None).unwrap();
        add_song(&songs, "s1");
        add_song(&songs, "s2");

        playlists.add_song_to_playlist(playlist, "s1", Some(10)).unwrap();
        playlists.add_song_to_playlist(playlist, "s2", Some(5)).unwrap();

        let ordered = playlists.get_playlist_songs(playlist).unwrap();
        assert_eq!(ordered[0].song_id, "s2");
        assert_eq!(ordered[1].song_id, "s1");
    }

    #[test]
    fn duplicate_playlist_song_pair_is_rejected() {
        let (playlists, songs, user_id) = setup();
        let playlist = playlists.create_playlist(user_id, "mix", None, None).unwrap();
        add_song(&songs, "s1");

        playlists.add_song_to_playlist(playlist, "s1", None).unwrap();
        let result = playlists.add_song_to_playlist(playlist, "s1", None);
        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }

    #[test]
    fn user_playlists_newest_first() {
        let (playlists, _songs, user_id) = setup();
        playlists.create_playlist(user_id, "first", Some("older"), None).unwrap();
        playlists.create_playlist(user_id, "second", None, None).unwrap();

        let all = playlists.get_user_playlists(user_id).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "second");
    }
}
