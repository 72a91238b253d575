use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Database connection error: {0}")]
    ConnectionError(String),
}

impl StorageError {
    /// Connectivity-class failures make the dispatch loop restart from
    /// scratch; everything else is reported and left to the supervisor.
    pub fn is_connectivity(&self) -> bool {
        match self {
            StorageError::ConnectionError(_) => true,
            StorageError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::Tls(_)
            ),
            _ => false,
        }
    }
}
