//! In-memory counter source and affinity store for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{IrqError, Result};
use crate::source::{AffinityStore, CounterSnapshot, CounterSource, IrqCounters};

pub fn row(irq: &str, counts: &[u64]) -> IrqCounters {
    IrqCounters {
        irq: irq.to_string(),
        irq_type: "IO-APIC".to_string(),
        device_name: "dev".to_string(),
        counts: counts.to_vec(),
    }
}

pub fn snap(num_cpus: usize, rows: Vec<IrqCounters>) -> CounterSnapshot {
    CounterSnapshot {
        num_cpus,
        irqs: rows,
    }
}

/// Hands out scripted snapshots in order and counts how many were taken.
pub struct Scripted {
    queue: Mutex<Vec<CounterSnapshot>>,
    num_cpus: usize,
    taken: AtomicUsize,
}

impl Scripted {
    pub fn new(snapshots: Vec<CounterSnapshot>) -> Self {
        let num_cpus = snapshots.first().map(|s| s.num_cpus).unwrap_or(0);
        Self {
            queue: Mutex::new(snapshots),
            num_cpus,
            taken: AtomicUsize::new(0),
        }
    }

    pub fn taken(&self) -> usize {
        self.taken.load(Ordering::SeqCst)
    }
}

impl CounterSource for Scripted {
    fn snapshot(&self) -> Result<CounterSnapshot> {
        let mut queue = self.queue.lock().unwrap();
        if queue.is_empty() {
            return Err(IrqError::SourceUnavailable("script exhausted".into()));
        }
        self.taken.fetch_add(1, Ordering::SeqCst);
        Ok(queue.remove(0))
    }

    fn num_cpus(&self) -> Result<usize> {
        Ok(self.num_cpus)
    }
}

/// Map-backed store; IRQs listed in `pinned` refuse writes.
#[derive(Default)]
pub struct MemoryStore {
    masks: Mutex<HashMap<String, String>>,
    pub pinned: Vec<String>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            masks: Mutex::new(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl AffinityStore for MemoryStore {
    fn read(&self, irq: &str) -> Result<String> {
        self.masks
            .lock()
            .unwrap()
            .get(irq)
            .cloned()
            .ok_or_else(|| IrqError::NotFound(irq.to_string()))
    }

    fn write(&self, irq: &str, mask: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.pinned.iter().any(|p| p == irq) {
            return Err(IrqError::WriteRejected {
                irq: irq.to_string(),
                reason: "Input/output error".to_string(),
            });
        }
        self.masks
            .lock()
            .unwrap()
            .insert(irq.to_string(), mask.to_string());
        Ok(())
    }
}
