//! Namespace session lifecycle
//!
//! A session switches the calling thread into a target network namespace and
//! guarantees the original namespace is restored, whether the session ends
//! through [`NamespaceSession::end`], an early return or a panic.

use std::cell::Cell;
use std::marker::PhantomData;

use nsprobe_core::{Error, NamespaceId, ProcessId, Result, ThreadId};
use tracing::{debug, error, warn};

use crate::ops::NamespaceOps;
use crate::unit::PinnedUnit;

thread_local! {
    static SESSION_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Whether the calling thread currently holds a namespace session
#[must_use]
pub fn session_active() -> bool {
    SESSION_ACTIVE.with(Cell::get)
}

/// Claim on the calling thread's session slot, released on drop
///
/// The raw pointer marker keeps the claim (and the session owning it) on the
/// thread that made it.
struct ActiveMarker(PhantomData<*const ()>);

impl ActiveMarker {
    fn claim() -> Result<Self> {
        if SESSION_ACTIVE.with(|active| active.replace(true)) {
            return Err(Error::SessionAlreadyActive);
        }
        Ok(Self(PhantomData))
    }
}

impl Drop for ActiveMarker {
    fn drop(&mut self) {
        SESSION_ACTIVE.with(|active| active.set(false));
    }
}

/// The calling thread, switched into a target network namespace
///
/// # Invariants
/// - While the session exists, the thread's active namespace is `target`.
/// - Before [`begin`](Self::begin) and after the session ends, it is
///   `original`.
/// - At most one session exists per thread.
///
/// A session can only be begun on a [`PinnedUnit`], a thread handed out by
/// [`ExecutionUnit::pin`](crate::ExecutionUnit::pin) that runs nothing else
/// while the process-wide foreign-mode gate is held. The session is `!Send`:
/// it cannot leave the thread whose namespace it changed.
pub struct NamespaceSession<'a, O: NamespaceOps> {
    ops: &'a O,
    original: O::Handle,
    // Held open until the session ends
    _target: O::Handle,
    pid: ProcessId,
    original_id: NamespaceId,
    target_id: NamespaceId,
    restored: bool,
    _marker: ActiveMarker,
}

impl<'a, O: NamespaceOps> NamespaceSession<'a, O> {
    /// Switch the pinned thread `unit` into the network namespace of `pid`
    ///
    /// ```compile_fail
    /// use nsprobe_core::ProcessId;
    /// use nsprobe_namespace::{MockNamespaces, NamespaceSession};
    ///
    /// // Not on a pinned unit: there is no `PinnedUnit` to pass
    /// let ops = MockNamespaces::new();
    /// let session = NamespaceSession::begin(&ops, ProcessId::current());
    /// ```
    ///
    /// # Errors
    /// - [`Error::SessionAlreadyActive`] if this thread already has a session
    /// - [`Error::NamespaceUnavailable`] if either namespace cannot be opened
    /// - [`Error::NamespaceSwitchFailed`] if `setns(2)` refuses the switch
    ///
    /// On every error the thread is left in its original namespace.
    pub fn begin(ops: &'a O, pid: ProcessId, unit: &PinnedUnit) -> Result<Self> {
        let marker = ActiveMarker::claim()?;

        let original = ops.open_current()?;
        let target = ops.open_target(pid)?;
        let original_id = ops.identify(&original);
        let target_id = ops.identify(&target);

        ops.enter(&target).map_err(|source| {
            error!(
                pid = %pid,
                target = %target_id,
                error = %source,
                "Failed to enter target network namespace"
            );
            Error::NamespaceSwitchFailed {
                target: format!("pid {pid}"),
                source,
            }
        })?;

        debug!(
            pid = %pid,
            tid = %unit.tid(),
            original = %original_id,
            target = %target_id,
            "Entered target network namespace"
        );

        Ok(Self {
            ops,
            original,
            _target: target,
            pid,
            original_id,
            target_id,
            restored: false,
            _marker: marker,
        })
    }

    /// Restore the original namespace and release both handles
    ///
    /// Dropping the session does the same, but only `end` reports a failed
    /// restore to the caller.
    pub fn end(mut self) -> Result<()> {
        self.restore()
    }

    /// Target process of this session
    #[must_use]
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Namespace the thread was in before the session
    #[must_use]
    pub const fn original_id(&self) -> NamespaceId {
        self.original_id
    }

    /// Namespace the thread is in during the session
    #[must_use]
    pub const fn target_id(&self) -> NamespaceId {
        self.target_id
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        // One attempt only: a second setns after a refusal would not succeed
        self.restored = true;

        self.ops.enter(&self.original).map_err(|source| {
            error!(
                pid = %self.pid,
                original = %self.original_id,
                error = %source,
                "Failed to restore original network namespace"
            );
            Error::NamespaceRestoreFailed { source }
        })?;

        debug!(
            pid = %self.pid,
            tid = %ThreadId::current(),
            original = %self.original_id,
            "Restored original network namespace"
        );

        Ok(())
    }
}

impl<O: NamespaceOps> Drop for NamespaceSession<'_, O> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }

        warn!(pid = %self.pid, "Namespace session dropped without end(), restoring");

        if let Err(e) = self.restore() {
            error!(pid = %self.pid, error = %e, "Namespace left switched after drop");
        }
    }
}

impl<O: NamespaceOps> std::fmt::Debug for NamespaceSession<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceSession")
            .field("pid", &self.pid)
            .field("original", &self.original_id)
            .field("target", &self.target_id)
            .field("restored", &self.restored)
            .finish_non_exhaustive()
    }
}
