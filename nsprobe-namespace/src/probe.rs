//! Exclusivity probe for the diagnostic force-schedule mode
//!
//! While a session is active, a set of ordinary runtime tasks keep yielding
//! and sampling the namespace of whichever worker thread they land on. If
//! pinning were broken, one of them would eventually run on the switched
//! thread and see the foreign namespace.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nsprobe_core::{Error, NamespaceId, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ops::NamespaceOps;

/// Tally of one probing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Namespace samples taken
    pub samples: u64,
    /// Samples that differed from the baseline
    pub violations: u64,
    /// Samples that could not be taken
    pub errors: u64,
    /// First foreign namespace observed
    pub first_violation: Option<NamespaceId>,
}

impl ProbeOutcome {
    fn merge(mut self, other: Self) -> Self {
        self.samples += other.samples;
        self.violations += other.violations;
        self.errors += other.errors;
        self.first_violation = self.first_violation.or(other.first_violation);
        self
    }
}

/// Spawns probing tasks on the current tokio runtime
#[derive(Debug)]
pub struct ExclusivityProbe<O> {
    ops: Arc<O>,
    tasks: usize,
}

/// Probing tasks in flight
#[derive(Debug)]
pub struct RunningProbe {
    baseline: NamespaceId,
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<ProbeOutcome>>,
}

impl<O: NamespaceOps + 'static> ExclusivityProbe<O> {
    /// Create a probe with two tasks per available CPU
    #[must_use]
    pub fn new(ops: Arc<O>) -> Self {
        let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            ops,
            tasks: cpus * 2,
        }
    }

    /// Set the number of probing tasks (at least one)
    #[must_use]
    pub fn with_tasks(mut self, tasks: usize) -> Self {
        self.tasks = tasks.max(1);
        self
    }

    /// Record the baseline namespace and start sampling
    ///
    /// Must be called from within a tokio runtime, before the session begins.
    pub fn start(&self) -> Result<RunningProbe> {
        let baseline = self.ops.active()?;
        let stop = Arc::new(AtomicBool::new(false));

        let handles = (0..self.tasks)
            .map(|_| {
                let ops = Arc::clone(&self.ops);
                let stop = Arc::clone(&stop);
                tokio::spawn(sample(ops, stop, baseline))
            })
            .collect();

        debug!(tasks = self.tasks, baseline = %baseline, "Exclusivity probe started");

        Ok(RunningProbe {
            baseline,
            stop,
            handles,
        })
    }
}

async fn sample<O: NamespaceOps>(
    ops: Arc<O>,
    stop: Arc<AtomicBool>,
    baseline: NamespaceId,
) -> ProbeOutcome {
    let mut outcome = ProbeOutcome::default();

    while !stop.load(Ordering::Acquire) {
        match ops.active() {
            Ok(id) => {
                outcome.samples += 1;
                if id != baseline {
                    outcome.violations += 1;
                    outcome.first_violation.get_or_insert(id);
                }
            }
            Err(_) => outcome.errors += 1,
        }
        tokio::task::yield_now().await;
    }

    outcome
}

impl RunningProbe {
    /// Stop sampling and evaluate the tally
    ///
    /// # Errors
    /// Returns [`Error::ExclusivityViolated`] if any task saw a namespace
    /// other than the baseline.
    pub async fn finish(self) -> Result<ProbeOutcome> {
        self.stop.store(true, Ordering::Release);

        let mut outcome = ProbeOutcome::default();
        for handle in self.handles {
            let tally = handle.await.map_err(|e| Error::ExecutionUnitLost {
                message: format!("Probe task failed: {e}"),
            })?;
            outcome = outcome.merge(tally);
        }

        info!(
            samples = outcome.samples,
            violations = outcome.violations,
            errors = outcome.errors,
            "Exclusivity probe finished"
        );

        match outcome.first_violation {
            Some(observed) => Err(Error::ExclusivityViolated {
                observed: observed.to_string(),
                expected: self.baseline.to_string(),
            }),
            None => Ok(outcome),
        }
    }
}
