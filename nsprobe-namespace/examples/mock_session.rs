//! Mock namespace example for testing without root

use std::sync::Arc;

use nsprobe_core::ProcessId;
use nsprobe_namespace::{ExclusivityProbe, MockNamespaces, with_namespace};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("🧪 Testing with MockNamespaces (no privileges required)\n");

    let mut ops = MockNamespaces::new();
    for raw in 100..103 {
        ops = ops.with_target(ProcessId::new(raw)?, 4_026_532_000 + raw as u64);
    }
    let ops = Arc::new(ops);

    println!("🏠 Host namespace: {}", ops.host());

    let probe = ExclusivityProbe::new(Arc::clone(&ops)).with_tasks(4).start()?;

    for raw in 100..103 {
        let pid = ProcessId::new(raw)?;
        let (target, tid) = with_namespace(Arc::clone(&ops), pid, |session, unit| {
            Ok((session.target_id(), unit.tid()))
        })
        .await?;
        println!("✅ PID {pid}: visited {target} on TID {tid}");
    }

    let outcome = probe.finish().await?;
    println!("\n🔍 Probe samples: {}, violations: {}", outcome.samples, outcome.violations);

    println!(
        "📞 Handles opened: {}, closed: {}",
        ops.opened_handles(),
        ops.closed_handles()
    );
    println!("📈 Peak threads outside host namespace: {}", ops.foreign_peak());

    Ok(())
}
