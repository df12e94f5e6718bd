use thiserror::Error;

/// Error taxonomy shared by both stores and the request pipeline.
///
/// `InvalidInput`, `NotFound`, `ConstraintViolation` and `DuplicateUser`
/// abort the operation that raised them. `Upstream` distinguishes
/// collaborator failures (inference, recommendation lookup) from
/// `Persistence`, which covers failed store writes and is swallowed on the
/// best-effort history paths.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("duplicate user: {0}")]
    DuplicateUser(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| "unique constraint".to_string()),
                )
            }
            _ => StoreError::Persistence(err.to_string()),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}
