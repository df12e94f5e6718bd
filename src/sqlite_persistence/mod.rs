mod record_store;
pub mod schema;

pub use record_store::{RecordStore, Row, SqlValue};
