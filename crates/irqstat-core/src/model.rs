//! IRQ listing model.

use crate::mask::AffinityMask;
use crate::source::IrqCounters;
use crate::stats::InterruptTotals;

/// One IRQ with its lifetime counters and, once resolved, its affinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Irq {
    pub irq_num: String,
    pub irq_type: String,
    pub device_name: String,
    pub num_interrupts_per_cpu: Vec<u64>,
    /// `None` until looked up, and for IRQs the store has no entry for.
    pub cpu_affinity: Option<AffinityMask>,
}

impl From<IrqCounters> for Irq {
    fn from(row: IrqCounters) -> Self {
        Self {
            irq_num: row.irq,
            irq_type: row.irq_type,
            device_name: row.device_name,
            num_interrupts_per_cpu: row.counts,
            cpu_affinity: None,
        }
    }
}

/// Every IRQ of the machine plus lifetime totals across them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqInfo {
    pub irqs: Vec<Irq>,
    pub totals: InterruptTotals,
}
