//! Static table descriptors and the startup migration entry point.
//!
//! Migration is an explicit step run once from `main`, not a side effect of
//! DAO construction. All DDL is `IF NOT EXISTS` so re-running it is a no-op.

use super::RecordStore;
use crate::error::StoreError;
use tracing::info;

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub const USERS: Table = Table {
    name: "users",
    columns: &[
        "id",
        "username",
        "email",
        "password_hash",
        "created_at",
        "last_login",
    ],
    schema: "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY AUTOINCREMENT, username TEXT NOT NULL UNIQUE, email TEXT NOT NULL UNIQUE, password_hash TEXT NOT NULL, created_at INTEGER NOT NULL, last_login INTEGER);",
    indices: &["CREATE INDEX IF NOT EXISTS users_username_index ON users (username);"],
};

pub const MOOD_HISTORY: Table = Table {
    name: "mood_history",
    columns: &["id", "user_id", "mood", "timestamp", "song_id"],
    schema: "CREATE TABLE IF NOT EXISTS mood_history (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER NOT NULL, mood TEXT NOT NULL, timestamp INTEGER NOT NULL, song_id TEXT, CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES users (id));",
    indices: &[
        "CREATE INDEX IF NOT EXISTS mood_history_user_timestamp_index ON mood_history (user_id, timestamp);",
    ],
};

pub const LISTENING_HISTORY: Table = Table {
    name: "listening_history",
    columns: &[
        "id",
        "user_id",
        "song_id",
        "song_title",
        "artist",
        "mood",
        "timestamp",
        "duration",
    ],
    schema: "CREATE TABLE IF NOT EXISTS listening_history (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER NOT NULL, song_id TEXT NOT NULL, song_title TEXT NOT NULL, artist TEXT NOT NULL, mood TEXT NOT NULL, timestamp INTEGER NOT NULL, duration INTEGER, CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES users (id));",
    indices: &[
        "CREATE INDEX IF NOT EXISTS listening_history_user_timestamp_index ON listening_history (user_id, timestamp);",
    ],
};

pub const SONGS: Table = Table {
    name: "songs",
    columns: &[
        "id",
        "song_id",
        "title",
        "artist",
        "album",
        "genre",
        "duration",
        "mood_category",
        "external_url",
        "created_at",
    ],
    schema: "CREATE TABLE IF NOT EXISTS songs (id INTEGER PRIMARY KEY AUTOINCREMENT, song_id TEXT NOT NULL UNIQUE, title TEXT NOT NULL, artist TEXT NOT NULL, album TEXT, genre TEXT, duration INTEGER, mood_category TEXT, external_url TEXT, created_at INTEGER NOT NULL);",
    indices: &["CREATE INDEX IF NOT EXISTS songs_mood_category_index ON songs (mood_category);"],
};

pub const PLAYLISTS: Table = Table {
    name: "playlists",
    columns: &[
        "id",
        "user_id",
        "name",
        "description",
        "mood_category",
        "created_at",
        "updated_at",
    ],
    schema: "CREATE TABLE IF NOT EXISTS playlists (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER NOT NULL, name TEXT NOT NULL, description TEXT, mood_category TEXT, created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL, CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES users (id));",
    indices: &[],
};

// No cascading deletes anywhere: removing a user row out of band can orphan
// history rows. Known gap, kept as-is.
pub const PLAYLIST_SONGS: Table = Table {
    name: "playlist_songs",
    columns: &["playlist_id", "song_id", "added_at", "position"],
    schema: "CREATE TABLE IF NOT EXISTS playlist_songs (playlist_id INTEGER NOT NULL, song_id TEXT NOT NULL, added_at INTEGER NOT NULL, position INTEGER NOT NULL, PRIMARY KEY (playlist_id, song_id), CONSTRAINT playlist_id FOREIGN KEY (playlist_id) REFERENCES playlists (id), CONSTRAINT song_id FOREIGN KEY (song_id) REFERENCES songs (song_id));",
    indices: &[],
};

pub const ALL_TABLES: &[&Table] = &[
    &USERS,
    &MOOD_HISTORY,
    &LISTENING_HISTORY,
    &SONGS,
    &PLAYLISTS,
    &PLAYLIST_SONGS,
];

/// Create all tables and indices. Idempotent; run once at startup.
pub fn migrate(store: &RecordStore) -> Result<(), StoreError> {
    store.with_connection(|conn| {
        for table in ALL_TABLES {
            conn.execute(table.schema, [])?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        Ok(())
    })?;
    info!("History db schema ready ({} tables)", ALL_TABLES.len());
    Ok(())
}
