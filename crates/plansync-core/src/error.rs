//! Error types for plansync clients.

use thiserror::Error;

/// A normalized remote-store failure.
///
/// Every transport, auth, or not-found failure from the backing store is
/// flattened into this single shape at the repository boundary, so callers
/// never see a storage-implementation error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store operation failed: {message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Main error type for engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The intent was rejected before any local or remote state changed.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// A remote operation failed after the optimistic local change was
    /// already applied; the caller decides whether to retry or reconcile.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlanError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PlanError::Validation {
            message: message.into(),
        }
    }

    /// True when the intent was rejected client-side and local state is
    /// untouched.
    pub fn is_validation(&self) -> bool {
        matches!(self, PlanError::Validation { .. })
    }
}

/// Convenience Result type for engine operations.
pub type Result<T, E = PlanError> = std::result::Result<T, E>;
