//! Wire response types shared by the HTTP server and the CLI client.
//!
//! Each entity has exactly one constructor from the engine's own types, so
//! the JSON shape is decided in one place. Period statistics are already plain
//! numbers and travel as [`crate::stats`] types directly.

use serde::{Deserialize, Serialize};

use crate::error::IrqError;
use crate::mask::AffinityMask;
use crate::model::{Irq, IrqInfo};
use crate::stats::InterruptTotals;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqResponse {
    pub irq_num: String,
    pub irq_type: String,
    pub device_name: String,
    /// Kernel hex bitmap, or null when the IRQ has no affinity entry.
    pub cpu_affinity: Option<String>,
    pub num_interrupts_per_cpu: Vec<u64>,
}

impl IrqResponse {
    pub fn from_irq(irq: &Irq) -> Self {
        Self {
            irq_num: irq.irq_num.clone(),
            irq_type: irq.irq_type.clone(),
            device_name: irq.device_name.clone(),
            cpu_affinity: irq.cpu_affinity.as_ref().map(AffinityMask::encode),
            num_interrupts_per_cpu: irq.num_interrupts_per_cpu.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqInfoResponse {
    pub totals: InterruptTotals,
    pub irqs: Vec<IrqResponse>,
}

impl IrqInfoResponse {
    pub fn from_info(info: &IrqInfo) -> Self {
        Self {
            totals: info.totals.clone(),
            irqs: info.irqs.iter().map(IrqResponse::from_irq).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuAffinityResponse {
    pub irq_num: String,
    /// Kernel hex bitmap, exactly as the store holds it.
    pub cpu_affinity: String,
    pub cpus: Vec<usize>,
}

impl CpuAffinityResponse {
    pub fn from_mask(irq_num: &str, mask: &AffinityMask) -> Self {
        Self {
            irq_num: irq_num.to_string(),
            cpu_affinity: mask.encode(),
            cpus: mask.cpus().collect(),
        }
    }
}

/// Form body accepted when changing an IRQ's affinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAffinityRequest {
    pub cpu_affinity_mask: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// One of the [`IrqError::kind`] names.
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &IrqError) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irq_without_affinity_serializes_null() {
        let irq = Irq {
            irq_num: "NMI".into(),
            irq_type: String::new(),
            device_name: "Non-maskable interrupts".into(),
            num_interrupts_per_cpu: vec![0, 0],
            cpu_affinity: None,
        };
        let v = serde_json::to_value(IrqResponse::from_irq(&irq)).unwrap();
        assert!(v["cpu_affinity"].is_null());
        assert_eq!(v["num_interrupts_per_cpu"], serde_json::json!([0, 0]));
    }

    #[test]
    fn affinity_response_carries_hex_and_list() {
        let mask = AffinityMask::new([0, 1], 4).unwrap();
        let resp = CpuAffinityResponse::from_mask("16", &mask);
        assert_eq!(resp.cpu_affinity, "3");
        assert_eq!(resp.cpus, vec![0, 1]);

        let json = serde_json::to_string(&resp).unwrap();
        let back: CpuAffinityResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn error_response_uses_kind() {
        let resp = ErrorResponse::from_error(&IrqError::NotFound("42".into()));
        assert_eq!(resp.error, "not_found");
        assert!(resp.message.contains("42"));
    }
}
