//! Interfaces to the external interrupt counter source and affinity store.
//!
//! The engine never talks to the kernel directly. It reads counters through a
//! [`CounterSource`] and affinity masks through an [`AffinityStore`]; the
//! procfs implementations live in [`crate::procfs`].

use crate::error::Result;

/// One IRQ row of a counter snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqCounters {
    /// IRQ label as reported by the source (e.g. `"16"`, `"NMI"`).
    pub irq: String,
    /// Interrupt controller / trigger classification.
    pub irq_type: String,
    /// Owning device(s).
    pub device_name: String,
    /// Lifetime interrupt count per CPU; index = CPU number.
    pub counts: Vec<u64>,
}

/// Point-in-time reading of every IRQ counter on the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// One past the highest CPU ID. Per-CPU vectors are indexed by CPU ID.
    pub num_cpus: usize,
    pub irqs: Vec<IrqCounters>,
}

impl CounterSnapshot {
    pub fn get(&self, irq: &str) -> Option<&IrqCounters> {
        self.irqs.iter().find(|row| row.irq == irq)
    }
}

/// Source of per-IRQ, per-CPU interrupt counters.
///
/// Implementations must be side-effect free: two snapshots taken back to back
/// differ only by interrupts delivered in between.
pub trait CounterSource: Send + Sync {
    /// Read all IRQ counters at this instant.
    fn snapshot(&self) -> Result<CounterSnapshot>;

    /// Number of CPUs the source reports counters for.
    fn num_cpus(&self) -> Result<usize> {
        Ok(self.snapshot()?.num_cpus)
    }
}

/// Per-IRQ CPU affinity storage, addressed by IRQ label.
///
/// Masks cross this boundary as kernel hex bitmap strings.
pub trait AffinityStore: Send + Sync {
    /// Read the current mask string for `irq`.
    fn read(&self, irq: &str) -> Result<String>;

    /// Replace the mask for `irq`.
    fn write(&self, irq: &str, mask: &str) -> Result<()>;
}
