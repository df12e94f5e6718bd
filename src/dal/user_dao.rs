use super::now_millis;
use crate::error::StoreError;
use crate::sqlite_persistence::{schema, RecordStore, SqlValue};
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

impl UserRow {
    // Columns are always resolved by name, never by position.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserRow {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
            last_login: row.get("last_login")?,
        })
    }
}

#[derive(Clone)]
pub struct UserDao {
    store: RecordStore,
}

impl UserDao {
    pub fn new(store: RecordStore) -> Self {
        UserDao { store }
    }

    /// Create a user row and return its generated id. Duplicate username or
    /// email surfaces as `ConstraintViolation`.
    pub fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, StoreError> {
        self.store.insert(
            &schema::USERS,
            &[
                ("username", SqlValue::from(username.to_string())),
                ("email", SqlValue::from(email.to_string())),
                ("password_hash", SqlValue::from(password_hash.to_string())),
                ("created_at", SqlValue::from(now_millis())),
            ],
        )
    }

    pub fn get_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.store.query_opt(
            "SELECT * FROM users WHERE username = ?1",
            params![username],
            UserRow::from_row,
        )
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.store.query_opt(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            UserRow::from_row,
        )
    }

    pub fn update_last_login(&self, user_id: i64) -> Result<usize, StoreError> {
        self.store.update(
            &schema::USERS,
            user_id,
            &[("last_login", SqlValue::from(now_millis()))],
        )
    }

    pub fn delete_user(&self, user_id: i64) -> Result<usize, StoreError> {
        self.store.delete(&schema::USERS, user_id)
    }
}
