//! Deterministic namespace double for testing
//!
//! Tracks which namespace every OS thread is in without touching the
//! kernel, so session and pinning behaviour can be tested without root.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use nix::errno::Errno;
use nsprobe_core::{Error, NamespaceId, ProcessId, Result};

use crate::ops::NamespaceOps;

/// Namespace every thread starts in
const HOST_NAMESPACE: NamespaceId = NamespaceId::new(4, 4_026_531_840);

/// Mock namespace operations
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use nsprobe_core::ProcessId;
/// use nsprobe_namespace::{MockNamespaces, NamespaceOps, with_namespace};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pid = ProcessId::new(42).unwrap();
/// let ops = Arc::new(MockNamespaces::new().with_target(pid, 4_026_532_001));
/// let inside = Arc::clone(&ops);
///
/// let during = with_namespace(Arc::clone(&ops), pid, move |_, _| inside.active())
///     .await
///     .unwrap();
///
/// assert_eq!(during.ino, 4_026_532_001);
/// assert_eq!(ops.active().unwrap(), ops.host());
/// assert_eq!(ops.opened_handles(), ops.closed_handles());
/// # }
/// ```
#[derive(Clone)]
pub struct MockNamespaces {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    host: NamespaceId,
    targets: HashMap<ProcessId, NamespaceId>,
    active: HashMap<thread::ThreadId, NamespaceId>,
    deny_switch: HashSet<ProcessId>,
    fail_restore: bool,
    opened: usize,
    closed: usize,
    switches: usize,
    foreign_peak: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            host: HOST_NAMESPACE,
            targets: HashMap::new(),
            active: HashMap::new(),
            deny_switch: HashSet::new(),
            fail_restore: false,
            opened: 0,
            closed: 0,
            switches: 0,
            foreign_peak: 0,
        }
    }
}

impl MockState {
    fn active_for(&self, thread: thread::ThreadId) -> NamespaceId {
        self.active.get(&thread).copied().unwrap_or(self.host)
    }

    fn foreign_now(&self) -> usize {
        self.active.values().filter(|id| **id != self.host).count()
    }
}

/// Handle returned by [`MockNamespaces`]
pub struct MockHandle {
    id: NamespaceId,
    pid: Option<ProcessId>,
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Target process, or `None` for a handle to the current namespace
    #[must_use]
    pub const fn pid(&self) -> Option<ProcessId> {
        self.pid
    }
}

impl std::fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        lock(&self.state).closed += 1;
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockNamespaces {
    /// Create a mock where no target process exists yet
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Register a target process living in namespace inode `ino`
    #[must_use]
    pub fn with_target(self, pid: ProcessId, ino: u64) -> Self {
        let host = lock(&self.state).host;
        lock(&self.state)
            .targets
            .insert(pid, NamespaceId::new(host.dev, ino));
        self
    }

    /// Make `setns` into `pid`'s namespace fail with `EPERM`
    #[must_use]
    pub fn deny_switch_into(self, pid: ProcessId) -> Self {
        lock(&self.state).deny_switch.insert(pid);
        self
    }

    /// Make every switch back to an original namespace fail with `EINVAL`
    #[must_use]
    pub fn failing_restore(self) -> Self {
        lock(&self.state).fail_restore = true;
        self
    }

    /// Remove a target, as if the process exited
    pub fn remove_target(&self, pid: ProcessId) {
        lock(&self.state).targets.remove(&pid);
    }

    /// Namespace every thread starts in
    #[must_use]
    pub fn host(&self) -> NamespaceId {
        lock(&self.state).host
    }

    /// Number of handles opened so far
    #[must_use]
    pub fn opened_handles(&self) -> usize {
        lock(&self.state).opened
    }

    /// Number of handles released so far
    #[must_use]
    pub fn closed_handles(&self) -> usize {
        lock(&self.state).closed
    }

    /// Number of successful namespace switches, restores included
    #[must_use]
    pub fn switches(&self) -> usize {
        lock(&self.state).switches
    }

    /// Highest number of threads simultaneously outside the host namespace
    #[must_use]
    pub fn foreign_peak(&self) -> usize {
        lock(&self.state).foreign_peak
    }

    /// Number of threads currently outside the host namespace
    #[must_use]
    pub fn foreign_now(&self) -> usize {
        lock(&self.state).foreign_now()
    }

    fn handle(&self, id: NamespaceId, pid: Option<ProcessId>, state: &mut MockState) -> MockHandle {
        state.opened += 1;
        MockHandle {
            id,
            pid,
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockNamespaces {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockNamespaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockNamespaces").finish_non_exhaustive()
    }
}

impl NamespaceOps for MockNamespaces {
    type Handle = MockHandle;

    fn open_current(&self) -> Result<MockHandle> {
        let mut state = lock(&self.state);
        let id = state.active_for(thread::current().id());

        tracing::debug!(namespace = %id, "Mock: Opened current namespace");

        Ok(self.handle(id, None, &mut state))
    }

    fn open_target(&self, pid: ProcessId) -> Result<MockHandle> {
        let mut state = lock(&self.state);
        let id = state
            .targets
            .get(&pid)
            .copied()
            .ok_or_else(|| Error::NamespaceUnavailable {
                target: format!("pid {pid}"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;

        tracing::debug!(pid = %pid, namespace = %id, "Mock: Opened target namespace");

        Ok(self.handle(id, Some(pid), &mut state))
    }

    fn enter(&self, handle: &MockHandle) -> nix::Result<()> {
        let mut state = lock(&self.state);

        match handle.pid {
            Some(pid) if state.deny_switch.contains(&pid) => return Err(Errno::EPERM),
            None if state.fail_restore => return Err(Errno::EINVAL),
            _ => {}
        }

        state.active.insert(thread::current().id(), handle.id);
        state.switches += 1;
        state.foreign_peak = state.foreign_peak.max(state.foreign_now());

        tracing::debug!(namespace = %handle.id, "Mock: Entered namespace");

        Ok(())
    }

    fn identify(&self, handle: &MockHandle) -> NamespaceId {
        handle.id
    }

    fn active(&self) -> Result<NamespaceId> {
        Ok(lock(&self.state).active_for(thread::current().id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> ProcessId {
        ProcessId::new(raw).unwrap()
    }

    #[test]
    fn test_mock_tracks_threads_independently() {
        let ops = MockNamespaces::new().with_target(pid(42), 100);
        let target = ops.open_target(pid(42)).unwrap();
        ops.enter(&target).unwrap();

        assert_eq!(ops.active().unwrap().ino, 100);

        let other = ops.clone();
        let seen = thread::spawn(move || other.active().unwrap())
            .join()
            .unwrap();
        assert_eq!(seen, ops.host());
        assert_eq!(ops.foreign_now(), 1);
    }

    #[test]
    fn test_mock_unknown_target() {
        let ops = MockNamespaces::new();
        let err = ops.open_target(pid(7)).unwrap_err();
        assert!(matches!(err, Error::NamespaceUnavailable { .. }));
        assert_eq!(ops.opened_handles(), 0);
    }

    #[test]
    fn test_mock_handle_release_counted() {
        let ops = MockNamespaces::new().with_target(pid(1), 1);
        {
            let _current = ops.open_current().unwrap();
            let _target = ops.open_target(pid(1)).unwrap();
            assert_eq!(ops.opened_handles(), 2);
            assert_eq!(ops.closed_handles(), 0);
        }
        assert_eq!(ops.closed_handles(), 2);
    }

    #[test]
    fn test_mock_injected_failures() {
        let ops = MockNamespaces::new()
            .with_target(pid(5), 55)
            .deny_switch_into(pid(5))
            .failing_restore();

        let target = ops.open_target(pid(5)).unwrap();
        assert_eq!(ops.enter(&target), Err(Errno::EPERM));

        let current = ops.open_current().unwrap();
        assert_eq!(ops.enter(&current), Err(Errno::EINVAL));
        assert_eq!(ops.switches(), 0);
    }
}
