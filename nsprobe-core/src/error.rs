//! Error types for nsprobe

use std::path::PathBuf;
use thiserror::Error;

/// nsprobe error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed process identifier or other user input
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message
        message: String,
    },

    /// A namespace could not be opened (process gone, permission denied)
    #[error("Namespace unavailable for {target}: {source}")]
    NamespaceUnavailable {
        /// What was being opened (e.g. `pid 42`, `current thread`)
        target: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// `setns(2)` rejected the switch into the target namespace
    #[error("Namespace switch failed for {target}: {source}")]
    NamespaceSwitchFailed {
        /// Namespace that could not be entered
        target: String,
        /// Errno reported by the kernel
        source: nix::Error,
    },

    /// `setns(2)` rejected the switch back to the original namespace
    #[error("Namespace restore failed: {source}")]
    NamespaceRestoreFailed {
        /// Errno reported by the kernel
        source: nix::Error,
    },

    /// A session is already active on the calling execution unit
    #[error("A namespace session is already active on this thread")]
    SessionAlreadyActive,

    /// A socket table could not be opened or read
    #[error("Resource unavailable at {}: {source}", path.display())]
    ResourceUnavailable {
        /// Path of the kernel resource
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The pinned execution unit could not be started or did not report back
    #[error("Execution unit lost: {message}")]
    ExecutionUnitLost {
        /// Error message
        message: String,
    },

    /// A task outside the session observed a foreign namespace
    #[error("Exclusivity violated: observed {observed}, expected {expected}")]
    ExclusivityViolated {
        /// Namespace seen by the probing task
        observed: String,
        /// Namespace the probing task should have seen
        expected: String,
    },
}

impl Error {
    /// Build an [`Error::InvalidInput`] from any message
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type alias for nsprobe operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::invalid_input("pid must be positive");
        assert_eq!(err.to_string(), "Invalid input: pid must be positive");

        let err = Error::NamespaceSwitchFailed {
            target: "pid 42".to_string(),
            source: nix::errno::Errno::EPERM,
        };
        assert!(err.to_string().contains("pid 42"));
        assert!(err.to_string().contains("switch"));
    }

    #[test]
    fn test_resource_unavailable_names_path() {
        let err = Error::ResourceUnavailable {
            path: PathBuf::from("/proc/thread-self/net/tcp"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };

        assert!(err.to_string().contains("/proc/thread-self/net/tcp"));
    }
}
