//! CPU affinity masks.
//!
//! An [`AffinityMask`] is the set of CPUs allowed to service an IRQ. It is
//! stored as a bitmask of 64-bit words and always validated against the
//! CPU count of the machine it describes: no bit may name a CPU that does not
//! exist, and at least one bit must be set.
//!
//! Two textual forms are understood:
//!
//! - the kernel bitmap form used by `/proc/irq/<n>/smp_affinity`, i.e. hex
//!   digits grouped in 32-bit chunks separated by commas
//!   (`"f"`, `"00000000,00000003"`); an optional `0x` prefix is accepted.
//! - the CPU list form used by `smp_affinity_list` (`"0-1,3"`).

use std::fmt;

use crate::error::{IrqError, Result};

const WORD_BITS: usize = 64;
const GROUP_BITS: usize = 32;
const GROUP_DIGITS: usize = GROUP_BITS / 4;

/// Set of CPU indices permitted to service an IRQ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffinityMask {
    words: Vec<u64>,
    num_cpus: usize,
}

impl AffinityMask {
    /// Build a mask from explicit CPU indices.
    pub fn new(cpus: impl IntoIterator<Item = usize>, num_cpus: usize) -> Result<Self> {
        let mut mask = Self::zeroed(num_cpus);
        for cpu in cpus {
            mask.insert(cpu)?;
        }
        mask.ensure_non_empty()?;
        Ok(mask)
    }

    /// Decode the kernel hex bitmap form.
    pub fn decode(text: &str, num_cpus: usize) -> Result<Self> {
        Self::decode_bitmap(text, num_cpus, false)
    }

    /// Decode a mask as the kernel stores it. The kernel sizes masks for every
    /// possible CPU, so bits at or beyond `num_cpus` are dropped instead of
    /// rejected. The result must still select at least one known CPU.
    pub fn decode_stored(text: &str, num_cpus: usize) -> Result<Self> {
        Self::decode_bitmap(text, num_cpus, true)
    }

    fn decode_bitmap(text: &str, num_cpus: usize, drop_unknown: bool) -> Result<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(IrqError::InvalidMask("mask is empty".to_string()));
        }

        let mut mask = Self::zeroed(num_cpus);
        // Rightmost group holds CPUs 0..32.
        for (group_idx, group) in digits.rsplit(',').enumerate() {
            if group.is_empty() || group.len() > GROUP_DIGITS {
                return Err(IrqError::InvalidMask(format!(
                    "'{trimmed}': groups must hold 1 to {GROUP_DIGITS} hex digits"
                )));
            }
            let value = group
                .bytes()
                .all(|b| b.is_ascii_hexdigit())
                .then(|| u32::from_str_radix(group, 16).ok())
                .flatten()
                .ok_or_else(|| {
                    IrqError::InvalidMask(format!("'{trimmed}' is not a hexadecimal bitmap"))
                })?;
            for bit in 0..GROUP_BITS {
                if value & (1 << bit) == 0 {
                    continue;
                }
                let cpu = group_idx * GROUP_BITS + bit;
                if drop_unknown && cpu >= num_cpus {
                    continue;
                }
                mask.insert(cpu)?;
            }
        }
        mask.ensure_non_empty()?;
        Ok(mask)
    }

    /// Parse the CPU list form, e.g. `"0-3,8"`.
    pub fn from_cpu_list(text: &str, num_cpus: usize) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(IrqError::InvalidMask("CPU list is empty".to_string()));
        }

        let mut mask = Self::zeroed(num_cpus);
        for part in trimmed.split(',') {
            let part = part.trim();
            let parse = |s: &str| {
                s.trim().parse::<usize>().map_err(|_| {
                    IrqError::InvalidMask(format!("'{part}' is not a CPU index or range"))
                })
            };
            match part.split_once('-') {
                Some((lo, hi)) => {
                    let (lo, hi) = (parse(lo)?, parse(hi)?);
                    if lo > hi {
                        return Err(IrqError::InvalidMask(format!(
                            "range '{part}' is reversed"
                        )));
                    }
                    for cpu in lo..=hi {
                        mask.insert(cpu)?;
                    }
                }
                None => mask.insert(parse(part)?)?,
            }
        }
        mask.ensure_non_empty()?;
        Ok(mask)
    }

    /// Render the kernel hex bitmap form.
    ///
    /// Width follows the kernel: one hex digit per four CPUs, grouped into
    /// eight-digit chunks from the right.
    pub fn encode(&self) -> String {
        let n_digits = self.num_cpus.div_ceil(4).max(1);
        let mut out = String::with_capacity(n_digits + n_digits / GROUP_DIGITS);
        for d in (0..n_digits).rev() {
            let bit = d * 4;
            let word = self.words.get(bit / WORD_BITS).copied().unwrap_or(0);
            let nibble = (word >> (bit % WORD_BITS)) & 0xf;
            out.push(char::from_digit(nibble as u32, 16).unwrap_or('0'));
            if d > 0 && d % GROUP_DIGITS == 0 {
                out.push(',');
            }
        }
        out
    }

    /// Render the compact CPU list form, e.g. `"0-1,3"`.
    pub fn to_cpu_list(&self) -> String {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for cpu in self.cpus() {
            match ranges.last_mut() {
                Some((_, end)) if *end + 1 == cpu => *end = cpu,
                _ => ranges.push((cpu, cpu)),
            }
        }
        ranges
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    lo.to_string()
                } else {
                    format!("{lo}-{hi}")
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// CPU indices in ascending order.
    pub fn cpus(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_cpus).filter(|&cpu| self.contains(cpu))
    }

    pub fn contains(&self, cpu: usize) -> bool {
        cpu < self.num_cpus && self.words[cpu / WORD_BITS] & (1 << (cpu % WORD_BITS)) != 0
    }

    /// Number of CPUs in the mask.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Always false for a constructed mask; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CPU count the mask was validated against.
    pub fn num_cpus(&self) -> usize {
        self.num_cpus
    }

    fn zeroed(num_cpus: usize) -> Self {
        Self {
            words: vec![0; num_cpus.div_ceil(WORD_BITS)],
            num_cpus,
        }
    }

    fn insert(&mut self, cpu: usize) -> Result<()> {
        if cpu >= self.num_cpus {
            return Err(IrqError::InvalidMask(format!(
                "CPU {cpu} does not exist (num_cpus: {})",
                self.num_cpus
            )));
        }
        self.words[cpu / WORD_BITS] |= 1 << (cpu % WORD_BITS);
        Ok(())
    }

    fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(IrqError::InvalidMask(
                "mask selects no CPUs; an IRQ needs at least one".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for AffinityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
