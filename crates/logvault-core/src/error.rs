use thiserror::Error;

/// Failures surfaced by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt stored value: {0}")]
    Decode(String),

    /// Uniqueness or referential constraint violated.
    #[error("constraint violation: {0}")]
    Conflict(String),
}
