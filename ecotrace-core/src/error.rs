//! Error types for the storage layer.

use thiserror::Error;

/// Errors a storage backend can surface.
///
/// None of these cross the engine's public boundary: the guarded storage
/// wrapper logs them and degrades to defaults or no-ops.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend is not reachable in this execution context.
    #[error("storage backend unavailable")]
    Unavailable,

    /// Reading or writing the underlying medium failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value did not round-trip through JSON.
    #[error("stored value could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}
