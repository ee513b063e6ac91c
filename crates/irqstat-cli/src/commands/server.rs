use std::path::Path;

use anyhow::{Context, Result};
use irqstat_core::{IrqOperations, ProcfsIrqService, ServiceConfig};

pub fn run(procfs: &Path, config: ServiceConfig, host: &str, port: u16) -> Result<()> {
    let service = ProcfsIrqService::procfs(procfs, config);
    let num_cpus = service
        .num_cpus()
        .with_context(|| format!("cannot read interrupt counters under {}", procfs.display()))?;

    let base = format!("http://{host}:{port}");
    println!("irqstat server v{}", irqstat_core::VERSION);
    println!("   {base}");
    println!("   {num_cpus} CPUs, procfs at {}", procfs.display());
    println!();
    println!("   Endpoints:");
    println!("     GET /                          API index (try: curl {base})");
    println!("     GET /health                    Health check");
    println!("     GET /irqs                      IRQs with affinity and lifetime counts");
    println!("     GET /irqs/{{irq}}/cpu_affinity   Current CPU affinity");
    println!("     PUT /irqs/{{irq}}/cpu_affinity   Set affinity (form: cpu_affinity_mask=<hex>)");
    println!("     GET /interrupts                Per-CPU distribution over a period");
    println!("     GET /interrupts/cpu/{{cpu}}      Same, for one CPU");
    println!();
    println!("   Query params for /interrupts:");
    println!(
        "     period_seconds=N               Sampling window (1-{}, default: {})",
        config.max_period_seconds, config.default_period_seconds
    );
    println!();
    println!("   Examples:");
    println!("     curl {base}/irqs");
    println!("     curl {base}/interrupts?period_seconds=5");
    println!("     curl -X PUT -d cpu_affinity_mask=3 {base}/irqs/16/cpu_affinity");
    println!();

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(irqstat_server::run_server(service, host, port))
        .with_context(|| format!("server on {host}:{port} failed"))
}
