//! Errors surfaced by space synchronization.

use crate::domain::foundation::{DomainError, ErrorCode, SpaceId};

/// Failure of a synchronized operation or state query.
///
/// A failed call never advanced the space version.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Every attempt hit a transient conflict.
    #[error("operation on space {space_id} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        space_id: SpaceId,
        attempts: u32,
        last_error: DomainError,
    },

    /// Conflict under the `Reject` policy.
    #[error("conflicting write on space {space_id} rejected: {source}")]
    ConflictRejected {
        space_id: SpaceId,
        #[source]
        source: DomainError,
    },

    /// The merge function could not reconcile a conflict.
    #[error("merge on space {space_id} failed: {source}")]
    MergeFailed {
        space_id: SpaceId,
        #[source]
        source: DomainError,
    },

    /// Permanent failure raised by the operation itself.
    #[error(transparent)]
    Operation(DomainError),

    #[error("no full-state provider configured")]
    FullStateUnavailable,

    #[error("space {0} not found")]
    UnknownSpace(SpaceId),

    /// Failure inside the full-state provider.
    #[error("full-state provider failed: {0}")]
    Provider(DomainError),
}

impl SyncError {
    /// Error code for API responses and metrics labels.
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::RetriesExhausted { .. } => ErrorCode::RetriesExhausted,
            SyncError::ConflictRejected { .. } => ErrorCode::ConflictRejected,
            SyncError::MergeFailed { .. } => ErrorCode::MergeFailed,
            SyncError::Operation(err) => err.code,
            SyncError::FullStateUnavailable => ErrorCode::InternalError,
            SyncError::UnknownSpace(_) => ErrorCode::SpaceNotFound,
            SyncError::Provider(err) => err.code,
        }
    }

    /// Number of attempts made, when the failure came from the retry loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            SyncError::RetriesExhausted { attempts, .. } => Some(*attempts),
            SyncError::ConflictRejected { .. } => Some(1),
            _ => None,
        }
    }
}

impl From<SyncError> for DomainError {
    fn from(err: SyncError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
