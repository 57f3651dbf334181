//! Pinning work to a dedicated OS thread
//!
//! A tokio task may resume on any worker thread after every `.await`, and a
//! worker runs many tasks. Neither is acceptable while a thread sits in a
//! foreign namespace, so namespace-sensitive work runs on a fresh OS thread
//! that belongs to exactly one closure and exits when it returns.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use nsprobe_core::{Error, ProcessId, Result, ThreadId};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

use crate::ops::NamespaceOps;
use crate::session::NamespaceSession;

/// Held while any pinned unit may be outside its original namespace
///
/// The guard travels into the pinned thread and is released only after the
/// closure (and with it any session) has finished, even if the awaiting task
/// was cancelled.
static FOREIGN_MODE: Mutex<()> = Mutex::const_new(());

/// Default name of pinned threads
pub const UNIT_THREAD_NAME: &str = "nsprobe-netns";

/// Factory for pinned execution units
#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    name: String,
}

/// The OS thread a pinned closure runs on
///
/// Only [`ExecutionUnit::pin`] creates one, and only while holding the
/// foreign-mode gate. It is neither `Send` nor `Sync` and cannot be cloned,
/// so it never outlives the closure or leaves its thread:
///
/// ```compile_fail
/// use nsprobe_namespace::{ExecutionUnit, PinnedUnit};
///
/// async fn escape() -> PinnedUnit {
///     ExecutionUnit::new().pin(|unit| Ok(*unit)).await.unwrap()
/// }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct PinnedUnit {
    tid: ThreadId,
    _thread_bound: PhantomData<*const ()>,
}

impl PinnedUnit {
    /// Kernel thread ID of the unit
    #[must_use]
    pub const fn tid(&self) -> ThreadId {
        self.tid
    }

    /// Whether the unit is the process main thread (it never should be)
    #[must_use]
    pub fn is_main_thread(&self) -> bool {
        self.tid.is_main_thread()
    }
}

impl ExecutionUnit {
    /// Create a unit factory with the default thread name
    #[must_use]
    pub fn new() -> Self {
        Self::with_name(UNIT_THREAD_NAME)
    }

    /// Create a unit factory naming its threads `name`
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Run `work` on a dedicated OS thread and await its result
    ///
    /// The thread runs nothing but `work`, so no other task can observe its
    /// namespace. Pinned scopes are serialized process-wide: a second call
    /// waits until the first closure has returned.
    ///
    /// # Errors
    /// Returns whatever `work` returns, or [`Error::ExecutionUnitLost`] if the
    /// thread cannot be spawned or panics.
    pub async fn pin<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&PinnedUnit) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let gate = FOREIGN_MODE.lock().await;
        let (tx, rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let _gate = gate;
                let unit = PinnedUnit {
                    tid: ThreadId::current(),
                    _thread_bound: PhantomData,
                };

                debug!(tid = %unit.tid, "Execution unit pinned");

                let outcome = work(&unit);

                debug!(tid = %unit.tid, ok = outcome.is_ok(), "Execution unit released");

                if tx.send(outcome).is_err() {
                    warn!(tid = %unit.tid, "Pinned work finished after its caller went away");
                }
            })
            .map_err(|e| Error::ExecutionUnitLost {
                message: format!("Failed to spawn execution unit: {e}"),
            })?;

        if let Ok(outcome) = rx.await {
            return outcome;
        }

        // The sender only disappears without sending if the thread panicked
        let joined = tokio::task::spawn_blocking(move || thread.join())
            .await
            .map_err(|e| Error::ExecutionUnitLost {
                message: format!("Failed to join execution unit: {e}"),
            })?;

        Err(Error::ExecutionUnitLost {
            message: match joined {
                Ok(()) => "Execution unit exited without a result".to_string(),
                Err(panic) => format!("Execution unit panicked: {}", panic_message(&*panic)),
            },
        })
    }
}

impl Default for ExecutionUnit {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Run `work` inside the network namespace of `pid` on a pinned unit
///
/// Pins a unit, begins a [`NamespaceSession`], runs `work`, and ends the
/// session before the unit is released. The session ends on every path:
/// - `work` succeeds: a failed restore is returned instead of the value
/// - `work` fails: its error is returned after restoring; if restoring also
///   fails, the restore error wins
/// - `work` panics: the session restores while unwinding
pub async fn with_namespace<O, F, T>(ops: Arc<O>, pid: ProcessId, work: F) -> Result<T>
where
    O: NamespaceOps + 'static,
    F: FnOnce(&NamespaceSession<'_, O>, &PinnedUnit) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    ExecutionUnit::new()
        .pin(move |unit| {
            let session = NamespaceSession::begin(ops.as_ref(), pid, unit)?;
            let outcome = work(&session, unit);
            let restored = session.end();

            match (outcome, restored) {
                (outcome, Ok(())) => outcome,
                (Ok(_), Err(e)) => Err(e),
                (Err(work_error), Err(e)) => {
                    warn!(pid = %pid, error = %work_error, "Work failed before restore failure");
                    Err(e)
                }
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockNamespaces;

    #[tokio::test]
    async fn test_pin_runs_off_caller_thread() {
        let caller = ThreadId::current();
        let unit = ExecutionUnit::new().pin(|unit| Ok(unit.tid())).await.unwrap();

        assert_ne!(unit, caller);
    }

    #[tokio::test]
    async fn test_pin_propagates_error() {
        let err = ExecutionUnit::new()
            .pin(|_| -> Result<()> { Err(Error::invalid_input("boom")) })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_pin_reports_panic() {
        let err = ExecutionUnit::with_name("panicking-unit")
            .pin(|_| -> Result<()> { panic!("pinned work exploded") })
            .await
            .unwrap_err();

        match err {
            Error::ExecutionUnitLost { message } => assert!(message.contains("exploded")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_with_namespace_mock() {
        let pid = ProcessId::new(42).unwrap();
        let ops = Arc::new(MockNamespaces::new().with_target(pid, 4_026_532_001));

        let seen = with_namespace(Arc::clone(&ops), pid, |session, _| Ok(session.target_id()))
            .await
            .unwrap();

        assert_eq!(seen.ino, 4_026_532_001);
        assert_eq!(ops.foreign_now(), 0);
        assert_eq!(ops.opened_handles(), ops.closed_handles());
    }

    #[tokio::test]
    async fn test_with_namespace_restore_error_wins() {
        let pid = ProcessId::new(42).unwrap();
        let ops = Arc::new(
            MockNamespaces::new()
                .with_target(pid, 4_026_532_001)
                .failing_restore(),
        );

        let err = with_namespace(Arc::clone(&ops), pid, |_, _| -> Result<()> {
            Err(Error::invalid_input("work failed"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::NamespaceRestoreFailed { .. }));
        assert_eq!(ops.opened_handles(), ops.closed_handles());
    }

    #[tokio::test]
    async fn test_with_namespace_restore_error_after_success() {
        let pid = ProcessId::new(42).unwrap();
        let ops = Arc::new(
            MockNamespaces::new()
                .with_target(pid, 4_026_532_001)
                .failing_restore(),
        );

        let err = with_namespace(Arc::clone(&ops), pid, |_, _| Ok(7))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NamespaceRestoreFailed { .. }));
    }
}
