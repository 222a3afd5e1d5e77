//! Error types for repository operations.

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Connection pool or database connection errors.
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQL query execution errors.
    #[error("Query error: {0}")]
    Query(String),

    /// Requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data validation failed before or after a database operation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness constraint violated (e.g. duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration or initialization error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal/unexpected errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(feature = "sqlite-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => RepositoryError::not_found("Record not found"),
            diesel::result::Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                match kind {
                    diesel::result::DatabaseErrorKind::UniqueViolation => {
                        RepositoryError::conflict(message)
                    }
                    _ => RepositoryError::query(message),
                }
            }
            diesel::result::Error::QueryBuilderError(e) => {
                RepositoryError::query(format!("Query builder error: {}", e))
            }
            diesel::result::Error::DeserializationError(e) => {
                RepositoryError::internal(format!("Deserialization error: {}", e))
            }
            diesel::result::Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "sqlite-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection(err.to_string())
    }
}
