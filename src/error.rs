//! Error types for toolkit operations

/// Result type for toolkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Toolkit operation errors
///
/// Only genuine failures surface here. Saturation and closed-state
/// conditions (a closed channel, an empty freelist, a fully leased
/// table) are ordinary return values on the operations themselves.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pool reached its configured object cap with nothing idle
    #[error("pool '{name}' exhausted (max {max} objects outstanding)")]
    PoolExhausted {
        /// Pool name from its configuration
        name: String,
        /// Configured `max_objects`
        max: usize,
    },

    /// Malformed configuration input
    #[error("config parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the input
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// Configuration file could not be read
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a pool exhausted error
    pub fn pool_exhausted(name: impl Into<String>, max: usize) -> Self {
        Self::PoolExhausted { name: name.into(), max }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }
}
