//! Namespace switch primitives

use nix::sched::{CloneFlags, setns};
use nsprobe_core::{NamespaceId, ProcessId, Result};

use crate::handle::{NamespaceHandle, active_namespace};

/// Primitives a [`NamespaceSession`](crate::NamespaceSession) is built from
///
/// This allows for different implementations:
/// - [`Netns`] - the real kernel, via `setns(2)`
/// - [`MockNamespaces`](crate::MockNamespaces) - deterministic double for
///   tests, no privileges required
///
/// # Thread Safety
/// Every method acts on the *calling OS thread*. Implementations must be
/// `Send + Sync` so one instance can be shared with pinned units.
pub trait NamespaceOps: Send + Sync {
    /// Owned handle to one namespace, released on drop
    type Handle: Send;

    /// Open the namespace the calling thread is in
    fn open_current(&self) -> Result<Self::Handle>;

    /// Open the network namespace of process `pid`
    fn open_target(&self, pid: ProcessId) -> Result<Self::Handle>;

    /// Make `handle` the calling thread's active network namespace
    ///
    /// Returns the raw errno so callers can tell a failed switch from a
    /// failed restore.
    fn enter(&self, handle: &Self::Handle) -> nix::Result<()>;

    /// Identity of the namespace behind `handle`
    fn identify(&self, handle: &Self::Handle) -> NamespaceId;

    /// Identity of the calling thread's active namespace
    fn active(&self) -> Result<NamespaceId>;
}

/// Kernel-backed namespace operations
#[derive(Debug, Clone, Copy, Default)]
pub struct Netns;

impl NamespaceOps for Netns {
    type Handle = NamespaceHandle;

    fn open_current(&self) -> Result<NamespaceHandle> {
        NamespaceHandle::current_thread()
    }

    fn open_target(&self, pid: ProcessId) -> Result<NamespaceHandle> {
        NamespaceHandle::for_pid(pid)
    }

    fn enter(&self, handle: &NamespaceHandle) -> nix::Result<()> {
        setns(handle, CloneFlags::CLONE_NEWNET)
    }

    fn identify(&self, handle: &NamespaceHandle) -> NamespaceId {
        handle.id()
    }

    fn active(&self) -> Result<NamespaceId> {
        active_namespace()
    }
}
