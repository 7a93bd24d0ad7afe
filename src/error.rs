//! Error handling for the shardtrie library
//!
//! One crate-wide error type with enough structure that callers can tell
//! storage exhaustion apart from bad input or a failed worker.

use thiserror::Error;

/// Main error type for the shardtrie library
#[derive(Error, Debug)]
pub enum ShardtrieError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data format or corruption
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message describing the issue
        message: String,
    },

    /// Arena storage exhaustion
    #[error("Memory allocation failed: requested {size} cells")]
    OutOfMemory {
        /// Number of arena cells requested
        size: usize,
    },

    /// Trie structure errors
    #[error("Trie error: {message}")]
    Trie {
        /// Error message describing the trie issue
        message: String,
    },

    /// Snapshot encode/decode errors
    #[error("Snapshot error: {message}")]
    Snapshot {
        /// Error message from the snapshot codec
        message: String,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// A shard worker thread failed
    #[error("Worker failure: {message}")]
    Worker {
        /// Description of the worker failure
        message: String,
    },
}

impl ShardtrieError {
    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData { message: message.into() }
    }

    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create a trie error
    pub fn trie<S: Into<String>>(message: S) -> Self {
        Self::Trie { message: message.into() }
    }

    /// Create a snapshot error
    pub fn snapshot<S: Into<String>>(message: S) -> Self {
        Self::Snapshot { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a worker failure error
    pub fn worker<S: Into<String>>(message: S) -> Self {
        Self::Worker { message: message.into() }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Worker { .. } => true,
            Self::OutOfMemory { .. } => false,
            Self::InvalidData { .. } => false,
            Self::Trie { .. } => false,
            Self::Snapshot { .. } => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidData { .. } => "data",
            Self::OutOfMemory { .. } => "memory",
            Self::Trie { .. } => "trie",
            Self::Snapshot { .. } => "snapshot",
            Self::Configuration { .. } => "config",
            Self::Worker { .. } => "worker",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ShardtrieError>;
