//! AffinityController: mediates reads and writes of IRQ affinity masks.
//!
//! The store is the authority: a write is only reported once the mask has been
//! read back from it, and the read-back value is what callers see.

use crate::error::{IrqError, Result};
use crate::mask::AffinityMask;
use crate::source::AffinityStore;

pub struct AffinityController<A> {
    store: A,
}

impl<A: AffinityStore> AffinityController<A> {
    pub fn new(store: A) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &A {
        &self.store
    }

    /// Current mask for `irq`.
    pub fn get_affinity(&self, irq: &str, num_cpus: usize) -> Result<AffinityMask> {
        let raw = self.store.read(irq)?;
        // A stored value we cannot decode is a broken store, not a bad request.
        AffinityMask::decode_stored(&raw, num_cpus).map_err(|e| {
            IrqError::SourceUnavailable(format!("stored affinity for IRQ {irq} ({raw:?}): {e}"))
        })
    }

    /// Validate `mask_text`, write it, and return the mask the store reports back.
    pub fn set_affinity(&self, irq: &str, mask_text: &str, num_cpus: usize) -> Result<AffinityMask> {
        let requested = AffinityMask::decode(mask_text, num_cpus)?;
        self.apply(irq, &requested)
    }

    /// Write an already validated mask.
    pub fn apply(&self, irq: &str, requested: &AffinityMask) -> Result<AffinityMask> {
        // Surface NotFound before attempting a write.
        self.store.read(irq)?;

        if let Err(e) = self.store.write(irq, &requested.encode()) {
            if let IrqError::WriteRejected { reason, .. } = &e {
                log::warn!("IRQ {irq}: affinity {requested} rejected: {reason}");
            }
            return Err(e);
        }

        let confirmed = self.get_affinity(irq, requested.num_cpus())?;
        if &confirmed == requested {
            log::info!("IRQ {irq}: affinity set to {confirmed} (CPUs {})", confirmed.to_cpu_list());
        } else {
            log::warn!(
                "IRQ {irq}: requested affinity {requested}, store reports {confirmed}"
            );
        }
        Ok(confirmed)
    }
}
