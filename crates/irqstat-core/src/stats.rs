//! StatsAggregator: reduces per-IRQ counters into per-CPU totals and
//! percentage distributions.
//!
//! Two views are kept apart by type: [`InterruptTotals`] sums
//! lifetime counters from a single snapshot, while [`InterruptTotalsForPeriod`]
//! sums deltas over a sampling window.
//!
//! Percentages are full-precision `f64`; rounding is left to presentation.
//! A window with no interrupts at all yields 0.0 for every CPU.

use serde::{Deserialize, Serialize};

use crate::error::{IrqError, Result};
use crate::sampler::PeriodSample;
use crate::source::CounterSnapshot;

/// Lifetime interrupt totals from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptTotals {
    pub num_interrupts_all_cpus: u64,
    pub num_interrupts_per_cpu: Vec<u64>,
}

/// Interrupts handled by every CPU during a sampling period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptTotalsForPeriod {
    pub num_interrupts_per_cpu: Vec<u64>,
    pub percent_interrupts_per_cpu: Vec<f64>,
    pub num_interrupts_all_cpus: u64,
    pub period_duration_seconds: u64,
    pub num_cpus: usize,
    /// IRQs whose counters went backwards during the period (reset or wrap).
    /// Their deltas were counted as zero.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clamped_irqs: Vec<String>,
}

impl InterruptTotalsForPeriod {
    /// Derive the total and the distribution from per-CPU deltas.
    pub fn from_per_cpu(num_interrupts_per_cpu: Vec<u64>, period_duration_seconds: u64) -> Self {
        Self {
            num_interrupts_all_cpus: num_interrupts_per_cpu.iter().sum(),
            percent_interrupts_per_cpu: percentages(&num_interrupts_per_cpu),
            num_cpus: num_interrupts_per_cpu.len(),
            num_interrupts_per_cpu,
            period_duration_seconds,
            clamped_irqs: Vec::new(),
        }
    }
}

/// One CPU's share of the interrupts handled during a sampling period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptTotalsForPeriodForCpu {
    pub cpu_num: usize,
    pub num_interrupts: u64,
    pub percent_interrupts: f64,
    pub num_interrupts_all_cpus: u64,
    pub period_duration_seconds: u64,
    pub num_cpus: usize,
}

/// `100 * n[i] / sum(n)` for each entry, or all zeros when the sum is zero.
pub fn percentages(per_cpu: &[u64]) -> Vec<f64> {
    let total: u64 = per_cpu.iter().sum();
    if total == 0 {
        return vec![0.0; per_cpu.len()];
    }
    per_cpu
        .iter()
        .map(|&n| 100.0 * n as f64 / total as f64)
        .collect()
}

fn sum_per_cpu<'a>(num_cpus: usize, rows: impl Iterator<Item = &'a [u64]>) -> Vec<u64> {
    let mut per_cpu = vec![0u64; num_cpus];
    for counts in rows {
        for (total, &n) in per_cpu.iter_mut().zip(counts) {
            *total = total.saturating_add(n);
        }
    }
    per_cpu
}

/// Sum period deltas per CPU across all IRQs.
pub fn totals_for_period(sample: &PeriodSample) -> InterruptTotalsForPeriod {
    let per_cpu = sum_per_cpu(
        sample.num_cpus,
        sample.deltas.iter().map(|d| d.counts.as_slice()),
    );
    InterruptTotalsForPeriod {
        clamped_irqs: sample.clamped.clone(),
        ..InterruptTotalsForPeriod::from_per_cpu(per_cpu, sample.period_duration_seconds)
    }
}

/// Period totals restricted to `cpu_num`.
pub fn totals_for_period_for_cpu(
    sample: &PeriodSample,
    cpu_num: usize,
) -> Result<InterruptTotalsForPeriodForCpu> {
    if cpu_num >= sample.num_cpus {
        return Err(IrqError::OutOfRange {
            cpu: cpu_num,
            num_cpus: sample.num_cpus,
        });
    }
    let all = totals_for_period(sample);
    Ok(InterruptTotalsForPeriodForCpu {
        cpu_num,
        num_interrupts: all.num_interrupts_per_cpu[cpu_num],
        percent_interrupts: all.percent_interrupts_per_cpu[cpu_num],
        num_interrupts_all_cpus: all.num_interrupts_all_cpus,
        period_duration_seconds: all.period_duration_seconds,
        num_cpus: all.num_cpus,
    })
}

/// Sum lifetime counters per CPU across all IRQs of one snapshot.
pub fn instantaneous_totals(snapshot: &CounterSnapshot) -> InterruptTotals {
    let per_cpu = sum_per_cpu(
        snapshot.num_cpus,
        snapshot.irqs.iter().map(|row| row.counts.as_slice()),
    );
    InterruptTotals {
        num_interrupts_all_cpus: per_cpu.iter().sum(),
        num_interrupts_per_cpu: per_cpu,
    }
}
