use std::time::Duration;

use crate::utils::IsTransient;

// ============================================================================
// Store Errors
// ============================================================================
//
// Raw sqlx errors are folded into a small taxonomy the pipeline can reason
// about: duplicates and schema rejections are permanent, connectivity loss
// and deadline expiry are transient.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error("order already exists: {0}")]
    Duplicate(String),

    #[error("order rejected by schema: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                let message = db_err.message().to_string();

                if code == UNIQUE_VIOLATION {
                    StoreError::Duplicate(message)
                } else if code.starts_with("22") || code.starts_with("23") {
                    // data exception / integrity constraint violation
                    StoreError::Rejected(message)
                } else {
                    StoreError::Database(sqlx::Error::Database(db_err))
                }
            }
            sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
            sqlx::Error::Tls(e) => StoreError::Unavailable(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Unavailable("timed out acquiring a connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                StoreError::Unavailable("connection pool is closed".to_string())
            }
            sqlx::Error::WorkerCrashed => {
                StoreError::Unavailable("connection worker crashed".to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_unavailable_and_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::from(sqlx::Error::Io(io));

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
        assert!(err.to_string().contains("store unavailable"));
    }

    #[test]
    fn test_row_not_found_is_permanent_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_duplicate_and_timeout_classification() {
        assert!(!StoreError::Duplicate("X1".to_string()).is_transient());
        assert!(!StoreError::Rejected("bad".to_string()).is_transient());
        assert!(StoreError::Timeout(Duration::from_millis(5)).is_transient());
        assert!(StoreError::NotFound("X1".to_string()).is_not_found());
    }
}
