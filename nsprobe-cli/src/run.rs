//! Target inspection logic

use std::sync::Arc;

use anyhow::{Context, Result};
use nsprobe_core::{Error, ProcessId, TableKind, TargetReport, ThreadId};
use nsprobe_namespace::{ExclusivityProbe, NamespaceOps, Netns, inspect, with_namespace};
use nsprobe_sockets::SocketTableReader;
use tracing::{debug, error, info, warn};

use crate::config::ProbeConfig;

pub async fn execute(config: ProbeConfig) -> Result<()> {
    debug!(?config, "Starting nsprobe");

    let ops = Arc::new(Netns);
    let reader = SocketTableReader::new();
    let my_pid = ProcessId::current();
    let mut failures = Vec::new();

    for &pid in &config.pids {
        info!(
            "🔍 Analysing {} in TID: {} PID: {}",
            pid,
            ThreadId::current(),
            my_pid
        );

        match inspect_target(Arc::clone(&ops), pid, &config, reader.clone()).await {
            Ok(report) => log_report(&report),
            Err(e) if config.keep_going => {
                error!(pid = %pid, error = %e, "Inspection failed, continuing");
                failures.push(format!("{pid}: {e}"));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to inspect PID {pid}"));
            }
        }
    }

    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} targets failed:\n  {}",
            failures.len(),
            config.pids.len(),
            failures.join("\n  ")
        );
    }

    Ok(())
}

/// Read the configured tables of `pid` inside its network namespace
pub async fn inspect_target<O>(
    ops: Arc<O>,
    pid: ProcessId,
    config: &ProbeConfig,
    reader: SocketTableReader,
) -> nsprobe_core::Result<TargetReport>
where
    O: NamespaceOps + 'static,
{
    let probe = if config.force_schedule {
        info!("⚙️  Probing schedule exclusivity while switched");
        Some(ExclusivityProbe::new(Arc::clone(&ops)).start()?)
    } else {
        None
    };

    let kinds: Vec<TableKind> = config.tables.clone();
    let outcome = with_namespace(ops, pid, move |session, unit| {
        info!("🧵 We are in TID: {}", unit.tid());

        if unit.is_main_thread() {
            return Err(Error::ExecutionUnitLost {
                message: "Namespace work landed on the main thread".to_string(),
            });
        }

        let tables = reader.read_all(&kinds)?;

        let mut report = TargetReport::new(session.pid(), &tables);
        report.target_namespace = inspect::net_link_for_pid(pid);
        report.unit_namespace = inspect::net_link_for_thread(ProcessId::current(), unit.tid());

        Ok(report)
    })
    .await;

    // Stop the probing tasks even when the session failed
    let probed = match probe {
        Some(probe) => probe.finish().await.map(Some),
        None => Ok(None),
    };

    let report = outcome?;
    if let Some(tally) = probed? {
        info!(
            "✅ {} samples from runtime tasks, none saw the foreign namespace",
            tally.samples
        );
    }

    Ok(report)
}

fn log_report(report: &TargetReport) {
    info!("📊 Got data for {}:", report.pid);

    for (kind, rows) in &report.tables {
        info!(pid = %report.pid, kind = %kind, rows, "Got {} lines loaded for {}", rows, kind);
    }

    if let Some(ref link) = report.target_namespace {
        info!("   Namespace for {}: {}", report.pid, link);
    }
    if let Some(ref link) = report.unit_namespace {
        info!("   Namespace for pinned thread: {}", link);
    }

    if report.namespaces_match() == Some(false) {
        warn!(pid = %report.pid, "Pinned thread was not in the target namespace while reading");
    }
}
