use anyhow::Result;

use super::Backend;
use crate::render;

/// Print every IRQ with its lifetime per-CPU counts.
pub fn run(backend: &Backend) -> Result<()> {
    let info = backend.list_irqs()?;
    print!("{}", render::irq_table(&info).render());
    Ok(())
}
