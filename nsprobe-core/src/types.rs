//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Process identifier of an inspection target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "i32", into = "i32")]
pub struct ProcessId(i32);

impl ProcessId {
    /// Create a new `ProcessId` with validation
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if the PID is not strictly positive
    pub fn new(pid: i32) -> Result<Self> {
        if pid <= 0 {
            return Err(Error::invalid_input(format!(
                "Process ID must be positive, got: {pid}"
            )));
        }

        Ok(Self(pid))
    }

    /// Get the current process ID
    #[must_use]
    pub fn current() -> Self {
        Self(nix::unistd::getpid().as_raw())
    }

    /// Parse a comma-separated list of process IDs (`"1,42,977"`)
    ///
    /// Surrounding whitespace around each entry is ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if the list is empty or any entry is
    /// not a positive integer
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        if list.trim().is_empty() {
            return Err(Error::invalid_input("No PIDs provided"));
        }

        list.split(',').map(str::parse).collect()
    }

    /// Get raw PID value
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let raw = trimmed.parse::<i32>().map_err(|e| {
            Error::invalid_input(format!("Conversion of PID '{trimmed}' failed: {e}"))
        })?;
        Self::new(raw)
    }
}

impl TryFrom<i32> for ProcessId {
    type Error = Error;

    fn try_from(pid: i32) -> Result<Self> {
        Self::new(pid)
    }
}

impl From<ProcessId> for i32 {
    fn from(pid: ProcessId) -> Self {
        pid.0
    }
}

/// Kernel thread identifier of an execution unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ThreadId(i32);

impl ThreadId {
    /// Thread ID of the calling OS thread
    #[must_use]
    pub fn current() -> Self {
        Self(nix::unistd::gettid().as_raw())
    }

    /// Get raw TID value
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Whether this is the main thread of the current process
    #[must_use]
    pub fn is_main_thread(self) -> bool {
        self.0 == ProcessId::current().as_raw()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a kernel namespace object
///
/// Two handles refer to the same namespace when both the device and the
/// inode of the nsfs file match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceId {
    /// Device of the nsfs mount
    pub dev: u64,
    /// Inode number, the value shown as `net:[<ino>]`
    pub ino: u64,
}

impl NamespaceId {
    /// Create from device and inode numbers
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net:[{}]", self.ino)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_validation() {
        assert!(ProcessId::new(1).is_ok());
        assert!(ProcessId::new(0).is_err());
        assert!(ProcessId::new(-5).is_err());
    }

    #[test]
    fn test_process_id_from_str() {
        assert_eq!("42".parse::<ProcessId>().unwrap().as_raw(), 42);
        assert_eq!(" 7 ".parse::<ProcessId>().unwrap().as_raw(), 7);
        assert!(matches!(
            "abc".parse::<ProcessId>(),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_process_id_serde() {
        let pid = ProcessId::new(123).unwrap();
        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, "123");

        let deserialized: ProcessId = serde_json::from_str(&json).unwrap();
        assert_eq!(pid, deserialized);
        assert!(serde_json::from_str::<ProcessId>("0").is_err());
    }

    #[test]
    fn test_current_thread_in_process() {
        let tid = ThreadId::current();
        assert!(tid.as_raw() > 0);
    }

    #[test]
    fn test_namespace_id_display() {
        let id = NamespaceId::new(4, 4_026_531_840);
        assert_eq!(id.to_string(), "net:[4026531840]");
        assert_ne!(id, NamespaceId::new(5, 4_026_531_840));
    }
}
