//! Error handling for the pradsort library
//!
//! Every fallible operation returns [`Result`], whose error side is
//! [`PradsortError`]. Affinity and NUMA binding problems are deliberately absent
//! from this enum: they degrade to unbound execution instead of failing a sort.

use thiserror::Error;

/// Main error type for the pradsort library
#[derive(Error, Debug)]
pub enum PradsortError {
    /// I/O related errors (configuration files, sysfs topology reads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arguments rejected before any work begins
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the issue
        message: String,
    },

    /// Scratch buffer or worker structure allocation failures
    #[error("Memory allocation failed: requested {size} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        size: usize,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// The worker team could not be started
    #[error("Thread pool error: {message}")]
    ThreadPool {
        /// Error message from the pool builder
        message: String,
    },

    /// Feature not supported on this platform
    #[error("Not supported: {feature}")]
    NotSupported {
        /// Description of the unsupported feature
        feature: String,
    },
}

impl PradsortError {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a thread pool error
    pub fn thread_pool<S: Into<String>>(message: S) -> Self {
        Self::ThreadPool {
            message: message.into(),
        }
    }

    /// Create a not supported error
    pub fn not_supported<S: Into<String>>(feature: S) -> Self {
        Self::NotSupported {
            feature: feature.into(),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidInput { .. } => "input",
            Self::OutOfMemory { .. } => "memory",
            Self::Configuration { .. } => "config",
            Self::ThreadPool { .. } => "threads",
            Self::NotSupported { .. } => "unsupported",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PradsortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(PradsortError::invalid_input("n").category(), "input");
        assert_eq!(PradsortError::out_of_memory(64).category(), "memory");
        assert_eq!(PradsortError::configuration("bits").category(), "config");
        assert_eq!(PradsortError::thread_pool("spawn").category(), "threads");
        assert_eq!(PradsortError::not_supported("numa").category(), "unsupported");

        let io_err = PradsortError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(io_err.category(), "io");
    }

    #[test]
    fn test_error_display() {
        let err = PradsortError::invalid_input("digit bits 17 out of range");
        let display = format!("{}", err);
        assert!(display.contains("Invalid input"));
        assert!(display.contains("17"));

        let oom = PradsortError::out_of_memory(4096);
        assert!(format!("{}", oom).contains("4096"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PradsortError = io_error.into();
        assert_eq!(err.category(), "io");
        assert!(format!("{}", err).contains("I/O error"));
    }
}
