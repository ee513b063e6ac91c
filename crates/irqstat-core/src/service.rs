//! IrqService: the operations exposed to transport and presentation.
//!
//! The service composes the sampler, the aggregator and the affinity
//! controller. It owns duration and CPU-number validation and nothing else;
//! every computation is delegated.

use std::path::Path;
use std::time::Duration;

use crate::affinity::AffinityController;
use crate::error::{IrqError, Result};
use crate::mask::AffinityMask;
use crate::model::{Irq, IrqInfo};
use crate::procfs::{ProcfsAffinityStore, ProcfsCounterSource};
use crate::sampler::{CounterSampler, PeriodSample};
use crate::source::{AffinityStore, CounterSource};
use crate::stats::{self, InterruptTotalsForPeriod, InterruptTotalsForPeriodForCpu};

/// Default upper bound on a sampling period, in seconds.
pub const DEFAULT_MAX_PERIOD_SECS: u64 = 60;
/// Period used when a caller does not name one.
pub const DEFAULT_PERIOD_SECS: u64 = 5;

/// Tunables for [`IrqService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Longest period a caller may ask to sample. Bounds how long a request
    /// can block; there is no cancellation once sampling starts.
    pub max_period_seconds: u64,
    pub default_period_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_period_seconds: DEFAULT_MAX_PERIOD_SECS,
            default_period_seconds: DEFAULT_PERIOD_SECS,
        }
    }
}

/// Operations served to clients.
pub trait IrqOperations: Send + Sync {
    fn config(&self) -> &ServiceConfig;

    /// CPU count of the machine being observed.
    fn num_cpus(&self) -> Result<usize>;

    /// Every IRQ with lifetime counts and current affinity.
    fn list_irqs(&self) -> Result<IrqInfo>;

    fn get_affinity(&self, irq: &str) -> Result<AffinityMask>;

    /// Change the affinity of `irq` to the hex bitmap `mask`.
    fn set_affinity(&self, irq: &str, mask: &str) -> Result<AffinityMask>;

    /// Sample for `duration_seconds` and report per-CPU totals.
    fn period_totals(&self, duration_seconds: u64) -> Result<InterruptTotalsForPeriod>;

    /// Sample for `duration_seconds` and report one CPU's share.
    fn period_totals_for_cpu(
        &self,
        cpu_num: usize,
        duration_seconds: u64,
    ) -> Result<InterruptTotalsForPeriodForCpu>;
}

pub struct IrqService<C, A> {
    sampler: CounterSampler<C>,
    affinity: AffinityController<A>,
    config: ServiceConfig,
}

/// Service backed by the live kernel interfaces.
pub type ProcfsIrqService = IrqService<ProcfsCounterSource, ProcfsAffinityStore>;

impl ProcfsIrqService {
    /// Service reading `<root>/interrupts` and `<root>/irq/*/smp_affinity`.
    pub fn procfs(root: impl AsRef<Path>, config: ServiceConfig) -> Self {
        let root = root.as_ref();
        IrqService::new(
            ProcfsCounterSource::with_root(root),
            ProcfsAffinityStore::with_root(root),
            config,
        )
    }
}

impl<C: CounterSource, A: AffinityStore> IrqService<C, A> {
    pub fn new(counters: C, store: A, config: ServiceConfig) -> Self {
        Self {
            sampler: CounterSampler::new(counters),
            affinity: AffinityController::new(store),
            config,
        }
    }

    /// Replace the wait between period snapshots.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sampler = self.sampler.with_sleep(sleep);
        self
    }

    pub fn counters(&self) -> &C {
        self.sampler.source()
    }

    pub fn store(&self) -> &A {
        self.affinity.store()
    }

    fn check_period(&self, seconds: u64) -> Result<()> {
        let max = self.config.max_period_seconds;
        if seconds == 0 || seconds > max {
            return Err(IrqError::InvalidPeriod { seconds, max });
        }
        Ok(())
    }

    fn sample(&self, duration_seconds: u64) -> Result<PeriodSample> {
        let sample = self.sampler.sample_period(duration_seconds)?;
        if !sample.appeared.is_empty() || !sample.vanished.is_empty() {
            log::info!(
                "IRQ set changed during {duration_seconds}s period, excluded from totals: \
                 appeared={:?} vanished={:?}",
                sample.appeared,
                sample.vanished
            );
        }
        Ok(sample)
    }

    fn lookup_affinity(&self, irq: &str, num_cpus: usize) -> Result<Option<AffinityMask>> {
        match self.affinity.get_affinity(irq, num_cpus) {
            Ok(mask) => Ok(Some(mask)),
            Err(IrqError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<C: CounterSource, A: AffinityStore> IrqOperations for IrqService<C, A> {
    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn num_cpus(&self) -> Result<usize> {
        self.counters().num_cpus()
    }

    fn list_irqs(&self) -> Result<IrqInfo> {
        let snapshot = self.counters().snapshot()?;
        let totals = stats::instantaneous_totals(&snapshot);
        let num_cpus = snapshot.num_cpus;

        let mut irqs = Vec::with_capacity(snapshot.irqs.len());
        for row in snapshot.irqs {
            let cpu_affinity = self.lookup_affinity(&row.irq, num_cpus)?;
            irqs.push(Irq {
                cpu_affinity,
                ..Irq::from(row)
            });
        }
        log::debug!("listed {} IRQs across {num_cpus} CPUs", irqs.len());

        Ok(IrqInfo { irqs, totals })
    }

    fn get_affinity(&self, irq: &str) -> Result<AffinityMask> {
        let num_cpus = self.num_cpus()?;
        self.affinity.get_affinity(irq, num_cpus)
    }

    fn set_affinity(&self, irq: &str, mask: &str) -> Result<AffinityMask> {
        let num_cpus = self.num_cpus()?;
        self.affinity.set_affinity(irq, mask, num_cpus)
    }

    fn period_totals(&self, duration_seconds: u64) -> Result<InterruptTotalsForPeriod> {
        self.check_period(duration_seconds)?;
        let sample = self.sample(duration_seconds)?;
        Ok(stats::totals_for_period(&sample))
    }

    fn period_totals_for_cpu(
        &self,
        cpu_num: usize,
        duration_seconds: u64,
    ) -> Result<InterruptTotalsForPeriodForCpu> {
        self.check_period(duration_seconds)?;
        let num_cpus = self.num_cpus()?;
        if cpu_num >= num_cpus {
            return Err(IrqError::OutOfRange {
                cpu: cpu_num,
                num_cpus,
            });
        }
        let sample = self.sample(duration_seconds)?;
        stats::totals_for_period_for_cpu(&sample, cpu_num)
    }
}
