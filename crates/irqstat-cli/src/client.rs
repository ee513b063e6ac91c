//! Blocking client for a remote irqstat server.

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;

use irqstat_core::api::{CpuAffinityResponse, ErrorResponse, IrqInfoResponse};
use irqstat_core::{InterruptTotalsForPeriod, InterruptTotalsForPeriodForCpu};

pub struct ApiClient {
    base: String,
    http: reqwest::Client,
    rt: tokio::runtime::Runtime,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start HTTP client runtime")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            rt,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        self.rt.block_on(async {
            let resp = request
                .send()
                .await
                .with_context(|| format!("cannot reach irqstat server at {}", self.base))?;
            let status = resp.status();
            if status.is_success() {
                return resp
                    .json::<T>()
                    .await
                    .context("unexpected response from irqstat server");
            }
            match resp.json::<ErrorResponse>().await {
                Ok(err) => Err(anyhow!("{} ({status})", err.message)),
                Err(_) => Err(anyhow!("irqstat server returned {status}")),
            }
        })
    }

    pub fn list_irqs(&self) -> Result<IrqInfoResponse> {
        self.send(self.http.get(self.url("/irqs")))
    }

    pub fn get_affinity(&self, irq: &str) -> Result<CpuAffinityResponse> {
        self.send(self.http.get(self.url(&format!("/irqs/{irq}/cpu_affinity"))))
    }

    pub fn set_affinity(&self, irq: &str, mask: &str) -> Result<CpuAffinityResponse> {
        self.send(
            self.http
                .put(self.url(&format!("/irqs/{irq}/cpu_affinity")))
                .form(&[("cpu_affinity_mask", mask)]),
        )
    }

    pub fn period_totals(&self, period_seconds: u64) -> Result<InterruptTotalsForPeriod> {
        self.send(
            self.http
                .get(self.url(&format!("/interrupts?period_seconds={period_seconds}"))),
        )
    }

    pub fn period_totals_for_cpu(
        &self,
        cpu: usize,
        period_seconds: u64,
    ) -> Result<InterruptTotalsForPeriodForCpu> {
        self.send(self.http.get(self.url(&format!(
            "/interrupts/cpu/{cpu}?period_seconds={period_seconds}"
        ))))
    }

    /// Current CPU count, from the server's health endpoint.
    pub fn num_cpus(&self) -> Result<usize> {
        let health: serde_json::Value = self.send(self.http.get(self.url("/health")))?;
        health["num_cpus"]
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| anyhow!("irqstat server did not report a CPU count"))
    }
}
