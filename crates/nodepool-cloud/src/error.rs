//! Cloud gateway error types.

use thiserror::Error;

/// Result type alias for gateway calls.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors returned by a cloud resize gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("provider request failed: {0}")]
    ProviderRequest(String),

    #[error("resize to {requested} rejected: provider maximum is {max_size}")]
    ResizeRejected { requested: usize, max_size: usize },
}
