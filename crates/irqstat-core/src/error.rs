//! Error kinds surfaced by the engine.

use thiserror::Error;

/// Every failure the engine reports to its caller.
///
/// The variants are distinct so the transport layer can map them to
/// different external signals (not-found vs bad-request vs unavailable).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrqError {
    /// The IRQ identifier is unknown to the affinity store.
    #[error("IRQ {0} not found")]
    NotFound(String),

    /// An affinity mask was malformed, empty, or named a CPU that does not exist.
    #[error("invalid affinity mask: {0}")]
    InvalidMask(String),

    /// The affinity store refused the assignment.
    #[error("affinity write for IRQ {irq} rejected: {reason}")]
    WriteRejected { irq: String, reason: String },

    /// A CPU index at or beyond the configured CPU count.
    #[error("CPU {cpu} is out of range (num_cpus: {num_cpus})")]
    OutOfRange { cpu: usize, num_cpus: usize },

    /// The counter source or affinity store could not be read.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A sampling period outside `1..=max` seconds.
    #[error("period of {seconds}s is outside the allowed range 1..={max}")]
    InvalidPeriod { seconds: u64, max: u64 },
}

impl IrqError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidMask(_) => "invalid_mask",
            Self::WriteRejected { .. } => "write_rejected",
            Self::OutOfRange { .. } => "out_of_range",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::InvalidPeriod { .. } => "invalid_period",
        }
    }
}

pub type Result<T> = std::result::Result<T, IrqError>;
