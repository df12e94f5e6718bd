//! Typed query/insert facades over [`RecordStore`](crate::sqlite_persistence::RecordStore).
//!
//! Each DAO owns one table's schema and its indexed lookups. DAOs are plain
//! structs constructed once and passed by reference (or cheap clone); there
//! are no ambient module-level instances. Reads that match nothing return
//! empty vectors, never errors.

mod listening_history_dao;
mod mood_history_dao;
mod playlist_dao;
mod song_dao;
mod user_dao;

pub use listening_history_dao::{ArtistPlayCount, ListeningEventRow, ListeningHistoryDao};
pub use mood_history_dao::{MoodCount, MoodEventRow, MoodHistoryDao};
pub use playlist_dao::{PlaylistDao, PlaylistRow};
pub use song_dao::{NewSong, SongDao, SongRow};
pub use user_dao::{UserDao, UserRow};

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::sqlite_persistence::{schema, RecordStore};

    pub fn migrated_store() -> RecordStore {
        let store = RecordStore::open_in_memory().unwrap();
        schema::migrate(&store).unwrap();
        store
    }
}
