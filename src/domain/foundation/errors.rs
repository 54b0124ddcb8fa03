//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Not found errors
    SpaceNotFound,
    ConversationNotFound,

    // Authorization errors
    Unauthorized,
    Forbidden,

    // Write contention (transient)
    StorageBusy,
    LockContention,
    ConstraintViolation,

    // Synchronization outcomes
    ConflictRejected,
    RetriesExhausted,
    MergeFailed,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// Codes that signal storage contention and are safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCode::StorageBusy | ErrorCode::LockContention | ErrorCode::ConstraintViolation
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::SpaceNotFound => "SPACE_NOT_FOUND",
            ErrorCode::ConversationNotFound => "CONVERSATION_NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::StorageBusy => "STORAGE_BUSY",
            ErrorCode::LockContention => "LOCK_CONTENTION",
            ErrorCode::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ErrorCode::ConflictRejected => "CONFLICT_REJECTED",
            ErrorCode::RetriesExhausted => "RETRIES_EXHAUSTED",
            ErrorCode::MergeFailed => "MERGE_FAILED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Message fragments storage engines use for busy/lock/constraint failures.
const TRANSIENT_SIGNATURES: &[&str] = &["busy", "locked", "lock", "constraint", "deadlock"];

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Creates a storage-busy error (retryable).
    pub fn storage_busy(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageBusy, message)
    }

    /// Creates a database error with a driver-supplied message.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns true if this error is a transient write conflict.
    ///
    /// Explicit contention codes always qualify. A generic `DatabaseError`
    /// qualifies when its message carries a busy/lock/constraint signature,
    /// since drivers often surface those only as text.
    pub fn is_transient_conflict(&self) -> bool {
        if self.code.is_transient() {
            return true;
        }
        if self.code != ErrorCode::DatabaseError {
            return false;
        }
        let message = self.message.to_ascii_lowercase();
        TRANSIENT_SIGNATURES
            .iter()
            .any(|signature| message.contains(signature))
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}
