//! Plain-text tables for terminal output.

use irqstat_core::api::{CpuAffinityResponse, IrqInfoResponse};
use irqstat_core::{InterruptTotalsForPeriod, InterruptTotalsForPeriodForCpu};

/// Bordered text table. Columns from `numeric_from` onward are right-aligned.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
    numeric_from: usize,
}

enum Row {
    Cells(Vec<String>),
    Rule,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            numeric_from: usize::MAX,
        }
    }

    pub fn numeric_from(mut self, col: usize) -> Self {
        self.numeric_from = col;
        self
    }

    pub fn row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        self.rows
            .push(Row::Cells(cells.into_iter().map(Into::into).collect()));
    }

    /// Horizontal rule before the next row, used ahead of totals.
    pub fn rule(&mut self) {
        self.rows.push(Row::Rule);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            if let Row::Cells(cells) = row {
                for (i, cell) in cells.iter().enumerate() {
                    let w = cell.chars().count();
                    match widths.get_mut(i) {
                        Some(slot) => *slot = (*slot).max(w),
                        None => widths.push(w),
                    }
                }
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let border: String = widths
            .iter()
            .map(|w| format!("+{}", "-".repeat(w + 2)))
            .collect::<String>()
            + "+\n";

        let line = |cells: &[String], align_numbers: bool| -> String {
            let mut out = String::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                if align_numbers && i >= self.numeric_from {
                    out.push_str(&format!("| {cell:>width$} "));
                } else {
                    out.push_str(&format!("| {cell:<width$} "));
                }
            }
            out + "|\n"
        };

        let mut out = border.clone();
        out.push_str(&line(&self.headers, false));
        out.push_str(&border);
        for row in &self.rows {
            match row {
                Row::Cells(cells) => out.push_str(&line(cells, true)),
                Row::Rule => out.push_str(&border),
            }
        }
        if !self.rows.is_empty() {
            out.push_str(&border);
        }
        out
    }
}

pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// IRQ listing with lifetime counts and a totals row.
pub fn irq_table(info: &IrqInfoResponse) -> Table {
    let num_cpus = info.totals.num_interrupts_per_cpu.len();
    let mut headers: Vec<String> = ["IRQ", "Type", "Device", "CPU Affinity"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend((0..num_cpus).map(|cpu| format!("CPU{cpu}")));

    let mut table = Table::new(headers).numeric_from(4);
    for irq in &info.irqs {
        let mut cells = vec![
            irq.irq_num.clone(),
            irq.irq_type.clone(),
            irq.device_name.clone(),
            irq.cpu_affinity.clone().unwrap_or_else(|| "-".to_string()),
        ];
        cells.extend(irq.num_interrupts_per_cpu.iter().map(u64::to_string));
        table.row(cells);
    }
    table.rule();
    let mut totals = vec![
        "Totals".to_string(),
        String::new(),
        String::new(),
        String::new(),
    ];
    totals.extend(info.totals.num_interrupts_per_cpu.iter().map(u64::to_string));
    table.row(totals);
    table
}

pub fn affinity_table(resp: &CpuAffinityResponse) -> Table {
    let mut table = Table::new(["IRQ", "CPU Affinity"]);
    table.row([resp.irq_num.clone(), resp.cpu_affinity.clone()]);
    table
}

/// Per-CPU distribution over a period, with a total row.
pub fn period_table(totals: &InterruptTotalsForPeriod) -> Table {
    let mut table =
        Table::new(["Cpu #", "Total Interrupts", "Percent Interrupts"]).numeric_from(1);
    for (cpu, (count, pct)) in totals
        .num_interrupts_per_cpu
        .iter()
        .zip(&totals.percent_interrupts_per_cpu)
        .enumerate()
    {
        table.row([cpu.to_string(), count.to_string(), percent(*pct)]);
    }
    table.rule();
    table.row([
        "Total".to_string(),
        totals.num_interrupts_all_cpus.to_string(),
        percent(totals.percent_interrupts_per_cpu.iter().sum()),
    ]);
    table
}

pub fn cpu_table(totals: &InterruptTotalsForPeriodForCpu) -> Table {
    let mut table = Table::new(["Field", "Value"]).numeric_from(1);
    table.row(["Cpu #".to_string(), totals.cpu_num.to_string()]);
    table.row([
        "Interrupts".to_string(),
        totals.num_interrupts.to_string(),
    ]);
    table.row([
        "Percent Interrupts".to_string(),
        percent(totals.percent_interrupts),
    ]);
    table.row([
        "Interrupts (all CPUs)".to_string(),
        totals.num_interrupts_all_cpus.to_string(),
    ]);
    table.row([
        "Period (seconds)".to_string(),
        totals.period_duration_seconds.to_string(),
    ]);
    table.row(["CPUs".to_string(), totals.num_cpus.to_string()]);
    table
}
