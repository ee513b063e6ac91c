pub mod affinity;
pub mod interrupts;
pub mod irqs;
pub mod server;

use std::path::Path;

use anyhow::{Context, Result};
use irqstat_core::api::{CpuAffinityResponse, IrqInfoResponse};
use irqstat_core::{
    InterruptTotalsForPeriod, InterruptTotalsForPeriodForCpu, IrqOperations, ProcfsIrqService,
    ServiceConfig,
};

use crate::client::ApiClient;

/// Where the CLI gets its answers: the engine in-process, or a remote server.
pub enum Backend {
    Local(ProcfsIrqService),
    Remote(ApiClient),
}

impl Backend {
    pub fn connect(server: Option<&str>, procfs: &Path, config: ServiceConfig) -> Result<Self> {
        match server {
            Some(url) => {
                log::debug!("using remote irqstat server at {url}");
                Ok(Self::Remote(ApiClient::new(url)?))
            }
            None => {
                log::debug!("reading procfs at {}", procfs.display());
                Ok(Self::Local(ProcfsIrqService::procfs(procfs, config)))
            }
        }
    }

    pub fn default_period(&self) -> u64 {
        match self {
            Self::Local(service) => service.config().default_period_seconds,
            Self::Remote(_) => irqstat_core::DEFAULT_PERIOD_SECS,
        }
    }

    pub fn num_cpus(&self) -> Result<usize> {
        match self {
            Self::Local(service) => Ok(service.num_cpus()?),
            Self::Remote(client) => client.num_cpus(),
        }
    }

    pub fn list_irqs(&self) -> Result<IrqInfoResponse> {
        match self {
            Self::Local(service) => Ok(IrqInfoResponse::from_info(&service.list_irqs()?)),
            Self::Remote(client) => client.list_irqs(),
        }
    }

    pub fn get_affinity(&self, irq: &str) -> Result<CpuAffinityResponse> {
        match self {
            Self::Local(service) => {
                let mask = service
                    .get_affinity(irq)
                    .with_context(|| format!("cannot read affinity of IRQ {irq}"))?;
                Ok(CpuAffinityResponse::from_mask(irq, &mask))
            }
            Self::Remote(client) => client.get_affinity(irq),
        }
    }

    pub fn set_affinity(&self, irq: &str, mask: &str) -> Result<CpuAffinityResponse> {
        match self {
            Self::Local(service) => {
                let mask = service
                    .set_affinity(irq, mask)
                    .with_context(|| format!("cannot set affinity of IRQ {irq}"))?;
                Ok(CpuAffinityResponse::from_mask(irq, &mask))
            }
            Self::Remote(client) => client.set_affinity(irq, mask),
        }
    }

    pub fn period_totals(&self, period_seconds: u64) -> Result<InterruptTotalsForPeriod> {
        match self {
            Self::Local(service) => Ok(service.period_totals(period_seconds)?),
            Self::Remote(client) => client.period_totals(period_seconds),
        }
    }

    pub fn period_totals_for_cpu(
        &self,
        cpu: usize,
        period_seconds: u64,
    ) -> Result<InterruptTotalsForPeriodForCpu> {
        match self {
            Self::Local(service) => Ok(service.period_totals_for_cpu(cpu, period_seconds)?),
            Self::Remote(client) => client.period_totals_for_cpu(cpu, period_seconds),
        }
    }
}
