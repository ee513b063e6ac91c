//! # irqstat-core
//!
//! **Interrupt accounting and affinity control for multi-core Linux machines.**
//!
//! `irqstat-core` answers two questions about hardware interrupts: how are they
//! spread across CPUs (lifetime, or over a sampled period), and which CPUs is a
//! given IRQ allowed to run on. It can also change the latter.
//!
//! ## Quick Start
//!
//! ```no_run
//! use irqstat_core::{IrqOperations, ProcfsIrqService, ServiceConfig};
//!
//! let service = ProcfsIrqService::procfs("/proc", ServiceConfig::default());
//!
//! // Per-CPU distribution over a five second window
//! let period = service.period_totals(5).unwrap();
//! for (cpu, pct) in period.percent_interrupts_per_cpu.iter().enumerate() {
//!     println!("CPU{cpu}: {pct:.1}%");
//! }
//!
//! // Pin IRQ 16 to CPUs 0 and 1
//! let mask = service.set_affinity("16", "0x3").unwrap();
//! assert_eq!(mask.to_cpu_list(), "0-1");
//! ```
//!
//! ## Architecture
//!
//! CounterSource → CounterSampler (two snapshots) → StatsAggregator → response
//!
//! AffinityStore ⇄ AffinityController (validate, write, read back)
//!
//! The kernel interfaces are reached only through the [`CounterSource`] and
//! [`AffinityStore`] traits; [`procfs`] implements both over
//! `/proc/interrupts` and `/proc/irq/<n>/smp_affinity`.

pub mod affinity;
pub mod api;
pub mod error;
pub mod mask;
pub mod model;
pub mod procfs;
pub mod sampler;
pub mod service;
pub mod source;
pub mod stats;

#[cfg(test)]
mod testing;

pub use affinity::AffinityController;
pub use error::{IrqError, Result};
pub use mask::AffinityMask;
pub use model::{Irq, IrqInfo};
pub use procfs::{DEFAULT_PROCFS_ROOT, ProcfsAffinityStore, ProcfsCounterSource, parse_interrupts};
pub use sampler::{CounterSampler, IrqDelta, PeriodSample, diff_snapshots};
pub use service::{
    DEFAULT_MAX_PERIOD_SECS, DEFAULT_PERIOD_SECS, IrqOperations, IrqService, ProcfsIrqService,
    ServiceConfig,
};
pub use source::{AffinityStore, CounterSnapshot, CounterSource, IrqCounters};
pub use stats::{
    InterruptTotals, InterruptTotalsForPeriod, InterruptTotalsForPeriodForCpu,
    instantaneous_totals, percentages, totals_for_period, totals_for_period_for_cpu,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
