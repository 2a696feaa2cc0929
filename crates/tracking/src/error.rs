use shotver_core::error::CoreError;

use crate::store::StoreError;

/// Error returned by the repositories.
///
/// Wraps [`CoreError`] for domain failures (lookup misses, conflicts,
/// validation) and [`StoreError`] for transport and decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackingError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Core(CoreError::Conflict(_)))
    }
}

/// Convenience alias for repository return values.
pub type TrackingResult<T> = Result<T, TrackingError>;
