//! # Attribute Error Types
//!
//! Errors that can occur when writing to an attribute store.
//! Reads never fail: a stale or unknown handle is a miss, not an error.

use thiserror::Error;

/// Errors that can occur in the attribute stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// Attempted to write through a handle with the reserved zero generation.
    #[error("null handle: index {index} has generation 0")]
    NullHandle {
        /// Index of the rejected handle.
        index: u32,
    },

    /// A write or resize would grow the index range past the configured limit.
    #[error("capacity exceeded: requested {requested}, limit {limit}")]
    CapacityExceeded {
        /// Capacity the operation needed.
        requested: usize,
        /// Configured maximum capacity.
        limit: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for attribute store operations.
pub type AttributeResult<T> = Result<T, AttributeError>;
