//! CounterSampler: brackets a period with two counter snapshots and derives
//! per-IRQ, per-CPU deltas.
//!
//! Only the two endpoints are observed. Activity inside the window is folded
//! into one delta per counter; bursts that start and end between the samples
//! are counted but not resolved in time.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::error::{IrqError, Result};
use crate::source::{CounterSnapshot, CounterSource};

/// Interrupts delivered to one IRQ during a sampling period, per CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqDelta {
    pub irq: String,
    pub counts: Vec<u64>,
}

/// Result of sampling a period.
///
/// Only IRQs present in both snapshots carry a delta. IRQs that came or went
/// during the window are listed in `appeared` / `vanished`, and IRQs whose
/// counters went backwards (reset or wrap) had those deltas clamped to zero and
/// are listed in `clamped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSample {
    pub num_cpus: usize,
    pub period_duration_seconds: u64,
    pub deltas: Vec<IrqDelta>,
    pub clamped: Vec<String>,
    pub appeared: Vec<String>,
    pub vanished: Vec<String>,
}

type SleepFn = Box<dyn Fn(Duration) + Send + Sync>;

/// Takes two counter snapshots separated by a blocking sleep.
pub struct CounterSampler<C> {
    source: C,
    sleep: SleepFn,
}

impl<C: CounterSource> CounterSampler<C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            sleep: Box::new(thread::sleep),
        }
    }

    /// Replace the wait between snapshots.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Snapshot, sleep for `duration_seconds`, snapshot again, and diff.
    pub fn sample_period(&self, duration_seconds: u64) -> Result<PeriodSample> {
        let start = self.source.snapshot()?;
        (self.sleep)(Duration::from_secs(duration_seconds));
        let end = self.source.snapshot()?;
        diff_snapshots(&start, &end, duration_seconds)
    }
}

/// Element-wise, non-negative difference between two snapshots.
pub fn diff_snapshots(
    start: &CounterSnapshot,
    end: &CounterSnapshot,
    period_duration_seconds: u64,
) -> Result<PeriodSample> {
    if start.num_cpus != end.num_cpus {
        return Err(IrqError::SourceUnavailable(format!(
            "CPU count changed during sampling ({} -> {})",
            start.num_cpus, end.num_cpus
        )));
    }

    let start_map: HashMap<&str, &[u64]> = start
        .irqs
        .iter()
        .map(|row| (row.irq.as_str(), row.counts.as_slice()))
        .collect();

    let mut deltas = Vec::with_capacity(end.irqs.len());
    let mut clamped = Vec::new();
    let mut appeared = Vec::new();

    for row in &end.irqs {
        let Some(before) = start_map.get(row.irq.as_str()) else {
            appeared.push(row.irq.clone());
            continue;
        };

        let mut went_backwards = false;
        let counts = row
            .counts
            .iter()
            .zip(before.iter())
            .map(|(&after, &prev)| {
                if after < prev {
                    went_backwards = true;
                }
                after.saturating_sub(prev)
            })
            .collect();

        if went_backwards {
            log::warn!(
                "IRQ {} counter went backwards during sampling; clamping delta to zero",
                row.irq
            );
            clamped.push(row.irq.clone());
        }
        deltas.push(IrqDelta {
            irq: row.irq.clone(),
            counts,
        });
    }

    let vanished: Vec<String> = start
        .irqs
        .iter()
        .filter(|row| end.get(&row.irq).is_none())
        .map(|row| row.irq.clone())
        .collect();

    if !appeared.is_empty() || !vanished.is_empty() {
        log::debug!(
            "excluding IRQs not present in both snapshots: appeared={appeared:?} vanished={vanished:?}"
        );
    }

    Ok(PeriodSample {
        num_cpus: end.num_cpus,
        period_duration_seconds,
        deltas,
        clamped,
        appeared,
        vanished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Scripted, row, snap};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn deltas_between_two_snapshots() {
        let start = snap(4, vec![row("16", &[10, 20, 5, 5]), row("17", &[0, 0, 0, 0])]);
        let end = snap(4, vec![row("16", &[15, 25, 5, 10]), row("17", &[0, 0, 0, 0])]);
        let sample = diff_snapshots(&start, &end, 5).unwrap();
        assert_eq!(sample.period_duration_seconds, 5);
        assert_eq!(
            sample.deltas,
            vec![
                IrqDelta {
                    irq: "16".into(),
                    counts: vec![5, 5, 0, 5]
                },
                IrqDelta {
                    irq: "17".into(),
                    counts: vec![0, 0, 0, 0]
                },
            ]
        );
        assert!(sample.clamped.is_empty());
    }

    #[test]
    fn decreasing_counter_is_clamped_and_flagged() {
        let start = snap(2, vec![row("30", &[100, 7])]);
        let end = snap(2, vec![row("30", &[3, 9])]);
        let sample = diff_snapshots(&start, &end, 1).unwrap();
        assert_eq!(sample.deltas[0].counts, vec![0, 2]);
        assert_eq!(sample.clamped, vec!["30".to_string()]);
    }

    #[test]
    fn only_irqs_in_both_snapshots_are_reported() {
        let start = snap(2, vec![row("1", &[1, 1]), row("2", &[2, 2])]);
        let end = snap(2, vec![row("2", &[3, 3]), row("3", &[9, 9])]);
        let sample = diff_snapshots(&start, &end, 1).unwrap();
        let ids: Vec<&str> = sample.deltas.iter().map(|d| d.irq.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert_eq!(sample.appeared, vec!["3".to_string()]);
        assert_eq!(sample.vanished, vec!["1".to_string()]);
    }

    #[test]
    fn cpu_count_change_is_an_error() {
        let start = snap(2, vec![row("1", &[1, 1])]);
        let end = snap(3, vec![row("1", &[1, 1, 1])]);
        assert!(matches!(
            diff_snapshots(&start, &end, 1),
            Err(IrqError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn sampler_sleeps_for_the_period_between_snapshots() {
        let source = Scripted::new(vec![
            snap(1, vec![row("9", &[1])]),
            snap(1, vec![row("9", &[4])]),
        ]);
        let slept = Arc::new(AtomicU64::new(0));
        let recorder = Arc::clone(&slept);
        let sampler = CounterSampler::new(source)
            .with_sleep(move |d| recorder.store(d.as_secs(), Ordering::SeqCst));

        let sample = sampler.sample_period(7).unwrap();
        assert_eq!(slept.load(Ordering::SeqCst), 7);
        assert_eq!(sample.deltas[0].counts, vec![3]);
    }

    #[test]
    fn failed_second_snapshot_surfaces() {
        let source = Scripted::new(vec![snap(1, vec![row("9", &[1])])]);
        let sampler = CounterSampler::new(source).with_sleep(|_| {});
        assert!(matches!(
            sampler.sample_period(1),
            Err(IrqError::SourceUnavailable(_))
        ));
    }
}
