//! Generic CRUD engine over the relational history database.
//!
//! One call is one unit of work: every write runs in its own transaction,
//! committed on success and rolled back before the error propagates, so a
//! single failed call never leaves a partial write behind. There is no
//! multi-call transaction span; callers needing multi-row writes must treat
//! each call as independently durable-or-failed.

use super::schema::Table;
use crate::error::StoreError;
use rusqlite::{Connection, OptionalExtension, ToSql};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use rusqlite::types::Value as SqlValue;

/// A result row keyed by column name. Rows are shaped from statement column
/// metadata, never by positional offsets.
pub type Row = HashMap<String, SqlValue>;

#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(RecordStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(RecordStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a record and return the generated row id.
    pub fn insert(&self, table: &Table, fields: &[(&str, SqlValue)]) -> Result<i64, StoreError> {
        let columns = Self::checked_columns(table, fields)?;
        let placeholders = (1..=fields.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders
        );
        self.with_txn(|conn| {
            let params: Vec<&dyn ToSql> = fields.iter().map(|(_, v)| v as &dyn ToSql).collect();
            conn.execute(&sql, params.as_slice())?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_by_id(&self, table: &Table, id: i64) -> Result<Option<Row>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!("SELECT * FROM {} WHERE id = ?1", table.name))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let row = stmt
            .query_row([id], |row| Self::shape_row(&names, row))
            .optional()?;
        Ok(row)
    }

    pub fn get_all(&self, table: &Table) -> Result<Vec<Row>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!("SELECT * FROM {}", table.name))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let rows = stmt
            .query_map([], |row| Self::shape_row(&names, row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Update a record by id, returning the affected-row count.
    pub fn update(
        &self,
        table: &Table,
        id: i64,
        fields: &[(&str, SqlValue)],
    ) -> Result<usize, StoreError> {
        let columns = Self::checked_columns(table, fields)?;
        let set_clause = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", c, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table.name,
            set_clause,
            fields.len() + 1
        );
        self.with_txn(|conn| {
            let mut params: Vec<&dyn ToSql> =
                fields.iter().map(|(_, v)| v as &dyn ToSql).collect();
            params.push(&id);
            conn.execute(&sql, params.as_slice())
        })
    }

    /// Delete a record by id, returning the affected-row count.
    pub fn delete(&self, table: &Table, id: i64) -> Result<usize, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name);
        self.with_txn(|conn| conn.execute(&sql, [id]))
    }

    pub fn count(&self, table: &Table) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Run a typed read query. Zero matching rows yield an empty vector.
    pub fn query_rows<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        mut map: F,
    ) -> Result<Vec<T>, StoreError>
    where
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, |row| map(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Run a typed read query expected to match at most one row.
    pub fn query_opt<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        map: F,
    ) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        let row = stmt.query_row(params, map).optional()?;
        Ok(row)
    }

    /// Run a write statement inside its own transaction.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize, StoreError> {
        self.with_txn(|conn| conn.execute(sql, params))
    }

    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(f(&conn)?)
    }

    fn with_txn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback();
                Err(err.into())
            }
        }
    }

    fn checked_columns<'a>(
        table: &Table,
        fields: &[(&'a str, SqlValue)],
    ) -> Result<Vec<&'a str>, StoreError> {
        if fields.is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "no fields provided for table {}",
                table.name
            )));
        }
        let mut columns = Vec::with_capacity(fields.len());
        for (name, _) in fields {
            if !table.columns.contains(name) {
                return Err(StoreError::InvalidInput(format!(
                    "unknown column {} for table {}",
                    name, table.name
                )));
            }
            columns.push(*name);
        }
        Ok(columns)
    }

    fn shape_row(names: &[String], row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
        let mut shaped = Row::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            shaped.insert(name.clone(), row.get::<usize, SqlValue>(i)?);
        }
        Ok(shaped)
    }
}
