use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Store-local failure taxonomy. `NotAuthorized` is produced by the local
/// precheck and never reaches the network; the remaining variants forward
/// gateway rejections, which the stores treat uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not authorized")]
    NotAuthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation rejected: {0}")]
    Validation(String),
    #[error("server failure: {0}")]
    Server(String),
}

impl From<ApiError> for StoreError {
    fn from(err: ApiError) -> Self {
        match err.code {
            ErrorCode::NotFound => StoreError::NotFound(err.message),
            ErrorCode::Validation => StoreError::Validation(err.message),
            // Network-side auth rejections are opaque to the store, unlike
            // the local precheck.
            ErrorCode::Unauthorized | ErrorCode::Forbidden | ErrorCode::Internal => {
                StoreError::Server(err.message)
            }
        }
    }
}
