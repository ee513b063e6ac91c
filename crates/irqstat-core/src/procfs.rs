//! Linux procfs implementations of [`CounterSource`] and [`AffinityStore`].
//!
//! Counters come from `/proc/interrupts`, affinities from
//! `/proc/irq/<irq>/smp_affinity`. Both take a configurable root so tests and
//! containers can point them at another tree.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{IrqError, Result};
use crate::source::{AffinityStore, CounterSnapshot, CounterSource, IrqCounters};

/// Default procfs mount point.
pub const DEFAULT_PROCFS_ROOT: &str = "/proc";

/// Reads interrupt counters from `<root>/interrupts`.
#[derive(Debug, Clone)]
pub struct ProcfsCounterSource {
    root: PathBuf,
}

impl ProcfsCounterSource {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PROCFS_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn interrupts_path(&self) -> PathBuf {
        self.root.join("interrupts")
    }

    fn read_interrupts(&self) -> Result<String> {
        let path = self.interrupts_path();
        fs::read_to_string(&path)
            .map_err(|e| IrqError::SourceUnavailable(format!("{}: {e}", path.display())))
    }
}

impl Default for ProcfsCounterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for ProcfsCounterSource {
    fn snapshot(&self) -> Result<CounterSnapshot> {
        let snapshot = parse_interrupts(&self.read_interrupts()?)?;
        log::debug!(
            "read {} IRQ rows across {} CPUs from {}",
            snapshot.irqs.len(),
            snapshot.num_cpus,
            self.interrupts_path().display()
        );
        Ok(snapshot)
    }

    fn num_cpus(&self) -> Result<usize> {
        let content = self.read_interrupts()?;
        Ok(CpuColumns::parse(split_header(&content).0)?.num_cpus())
    }
}

/// Header line of `/proc/interrupts` and the row lines after it. Leading blank
/// lines are skipped.
fn split_header(content: &str) -> (&str, impl Iterator<Item = &str>) {
    let mut lines = content.lines().skip_while(|l| l.trim().is_empty());
    (lines.next().unwrap_or_default(), lines)
}

/// CPU IDs of the counter columns, in column order.
///
/// The kernel only lists online CPUs, so IDs can have gaps (`CPU0 CPU1 CPU3`).
/// Per-CPU vectors are indexed by CPU ID; an offline CPU reads as zero.
#[derive(Debug)]
struct CpuColumns {
    ids: Vec<usize>,
}

impl CpuColumns {
    fn parse(header: &str) -> Result<Self> {
        let ids: Vec<usize> = header
            .split_whitespace()
            .filter_map(|col| col.strip_prefix("CPU"))
            .filter_map(|id| id.parse().ok())
            .collect();
        if ids.is_empty() {
            return Err(IrqError::SourceUnavailable(
                "interrupt table header lists no CPU columns".to_string(),
            ));
        }
        Ok(Self { ids })
    }

    /// One past the highest CPU ID.
    fn num_cpus(&self) -> usize {
        self.ids.iter().max().map_or(0, |&id| id + 1)
    }
}

/// Parse the full text of `/proc/interrupts`.
///
/// ```text
///            CPU0       CPU1
///  16:         10         20   IO-APIC  16-fasteoi   ehci_hcd:usb1
/// NMI:          0          0   Non-maskable interrupts
/// ERR:          0
/// ```
///
/// Rows that do not carry one count per CPU column (`ERR`, `MIS`) are not
/// per-CPU counters and are skipped.
pub fn parse_interrupts(content: &str) -> Result<CounterSnapshot> {
    let (header, rows) = split_header(content);
    let columns = CpuColumns::parse(header)?;

    let irqs = rows
        .filter_map(|line| parse_row(line, &columns))
        .collect();

    Ok(CounterSnapshot {
        num_cpus: columns.num_cpus(),
        irqs,
    })
}

fn parse_row(line: &str, columns: &CpuColumns) -> Option<IrqCounters> {
    let (id, rest) = line.split_once(':')?;
    let irq = id.trim();
    if irq.is_empty() {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let column_counts: Vec<u64> = tokens
        .by_ref()
        .take(columns.ids.len())
        .map_while(|t| t.parse::<u64>().ok())
        .collect();
    if column_counts.len() != columns.ids.len() {
        return None;
    }
    let mut counts = vec![0; columns.num_cpus()];
    for (&cpu, n) in columns.ids.iter().zip(column_counts) {
        counts[cpu] = n;
    }

    let trailing: Vec<&str> = tokens.collect();
    let numeric = irq.bytes().all(|b| b.is_ascii_digit());
    let (irq_type, device_name) = match trailing.as_slice() {
        [chip, trigger, device @ ..] if is_hwirq_trigger(trigger) => {
            (format!("{chip} {trigger}"), device.join(" "))
        }
        [chip, device @ ..] if numeric => (chip.to_string(), device.join(" ")),
        description => (String::new(), description.join(" ")),
    };

    Some(IrqCounters {
        irq: irq.to_string(),
        irq_type,
        device_name,
        counts,
    })
}

/// `"16-fasteoi"`, `"524288-edge"`.
fn is_hwirq_trigger(token: &str) -> bool {
    match token.split_once('-') {
        Some((hwirq, trigger)) => {
            !hwirq.is_empty()
                && hwirq.bytes().all(|b| b.is_ascii_alphanumeric())
                && !trigger.is_empty()
                && trigger.bytes().all(|b| b.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Reads and writes `<root>/irq/<irq>/smp_affinity`.
#[derive(Debug, Clone)]
pub struct ProcfsAffinityStore {
    root: PathBuf,
}

impl ProcfsAffinityStore {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PROCFS_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Only plain IRQ numbers and names address a file; anything that could
    /// escape the `irq/` directory is an unknown IRQ.
    fn affinity_path(&self, irq: &str) -> Result<PathBuf> {
        if irq.is_empty() || !irq.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(IrqError::NotFound(irq.to_string()));
        }
        Ok(self.root.join("irq").join(irq).join("smp_affinity"))
    }
}

impl Default for ProcfsAffinityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AffinityStore for ProcfsAffinityStore {
    fn read(&self, irq: &str) -> Result<String> {
        let path = self.affinity_path(irq)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(raw.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(IrqError::NotFound(irq.to_string()))
            }
            Err(e) => Err(IrqError::SourceUnavailable(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    fn write(&self, irq: &str, mask: &str) -> Result<()> {
        let path = self.affinity_path(irq)?;
        write_existing(&path, mask).map_err(|e| classify_write_error(irq, &path, e))
    }
}

/// Write to a file that must already exist; procfs entries are never created.
fn write_existing(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(format!("{contents}\n").as_bytes())?;
    file.flush()
}

fn classify_write_error(irq: &str, path: &Path, err: io::Error) -> IrqError {
    if err.kind() == io::ErrorKind::NotFound {
        return IrqError::NotFound(irq.to_string());
    }
    let rejected = err.kind() == io::ErrorKind::PermissionDenied
        || matches!(
            err.raw_os_error(),
            Some(libc::EINVAL | libc::EIO | libc::EBUSY | libc::EPERM | libc::EACCES)
        );
    if rejected {
        IrqError::WriteRejected {
            irq: irq.to_string(),
            reason: err.to_string(),
        }
    } else {
        IrqError::SourceUnavailable(format!("{}: {err}", path.display()))
    }
}
