//! Owned handles to kernel network namespaces

use std::fs::File;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;

use nix::sys::stat::{FileStat, fstat, stat};
use nsprobe_core::{Error, NamespaceId, ProcessId, Result};

/// Network namespace of the calling thread
///
/// `/proc/self` resolves to the thread-group leader, so the per-thread view
/// is required once a non-leader thread has switched.
pub const CURRENT_THREAD_NET: &str = "/proc/thread-self/ns/net";

/// An open nsfs file identifying one network namespace
///
/// The descriptor is closed exactly once, when the handle is dropped.
#[derive(Debug)]
pub struct NamespaceHandle {
    fd: OwnedFd,
    id: NamespaceId,
}

impl NamespaceHandle {
    /// Open the network namespace of the calling thread
    pub fn current_thread() -> Result<Self> {
        Self::open(CURRENT_THREAD_NET, "current thread")
    }

    /// Open the network namespace of process `pid`
    ///
    /// Fails with [`Error::NamespaceUnavailable`] if the process does not
    /// exist, exits while being opened, or is not accessible.
    pub fn for_pid(pid: ProcessId) -> Result<Self> {
        Self::open(format!("/proc/{pid}/ns/net"), format!("pid {pid}"))
    }

    /// Open a namespace file by path
    pub fn open(path: impl AsRef<Path>, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let unavailable = |source| Error::NamespaceUnavailable {
            target: origin.clone(),
            source,
        };

        let file = File::open(path.as_ref()).map_err(unavailable)?;
        let id = fstat(&file)
            .map(|st| identity(&st))
            .map_err(|errno| unavailable(errno.into()))?;

        tracing::trace!(origin = %origin, namespace = %id, "Opened namespace handle");

        Ok(Self {
            fd: file.into(),
            id,
        })
    }

    /// Identity of the namespace
    #[must_use]
    pub const fn id(&self) -> NamespaceId {
        self.id
    }
}

impl AsFd for NamespaceHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Identity of the namespace the calling thread is in right now
pub fn active_namespace() -> Result<NamespaceId> {
    stat(CURRENT_THREAD_NET)
        .map(|st| identity(&st))
        .map_err(|errno| Error::NamespaceUnavailable {
            target: "current thread".to_string(),
            source: errno.into(),
        })
}

// dev_t and ino_t are narrower than u64 on some targets
#[allow(clippy::useless_conversion)]
fn identity(st: &FileStat) -> NamespaceId {
    NamespaceId::new(u64::from(st.st_dev), u64::from(st.st_ino))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_thread_handle() {
        let handle = NamespaceHandle::current_thread().unwrap();
        assert_eq!(handle.id(), active_namespace().unwrap());
        assert!(handle.id().ino > 0);
    }

    #[test]
    fn test_own_pid_matches_current() {
        let handle = NamespaceHandle::for_pid(ProcessId::current()).unwrap();
        assert_eq!(handle.id(), active_namespace().unwrap());
    }

    #[test]
    fn test_missing_namespace_file() {
        let err = NamespaceHandle::open("/nonexistent/ns/net", "nowhere").unwrap_err();
        assert!(matches!(err, Error::NamespaceUnavailable { .. }));
    }

    #[test]
    fn test_identity_matches_std_metadata() {
        use std::os::unix::fs::MetadataExt;

        let handle = NamespaceHandle::current_thread().unwrap();
        let meta = std::fs::metadata(CURRENT_THREAD_NET).unwrap();
        assert_eq!(handle.id(), NamespaceId::new(meta.dev(), meta.ino()));
    }
}
