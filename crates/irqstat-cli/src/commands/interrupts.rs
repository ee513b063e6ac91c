use anyhow::Result;

use super::Backend;
use crate::render;

/// Sample for `period` seconds and print the per-CPU distribution, or the
/// share of a single CPU when `cpu` is given.
pub fn run(backend: &Backend, period: Option<u64>, cpu: Option<usize>) -> Result<()> {
    let period = period.unwrap_or_else(|| backend.default_period());
    eprintln!("Sampling interrupts for {period}s...");

    println!("Period duration (secs): {period}");
    match cpu {
        Some(cpu) => {
            let totals = backend.period_totals_for_cpu(cpu, period)?;
            print!("{}", render::cpu_table(&totals).render());
        }
        None => {
            let totals = backend.period_totals(period)?;
            print!("{}", render::period_table(&totals).render());
            if !totals.clamped_irqs.is_empty() {
                println!(
                    "Counters reset during the period (counted as 0): {}",
                    totals.clamped_irqs.join(", ")
                );
            }
        }
    }
    Ok(())
}
