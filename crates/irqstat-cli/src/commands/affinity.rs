use anyhow::{Context, Result, bail};
use irqstat_core::AffinityMask;
use irqstat_core::api::CpuAffinityResponse;

use super::Backend;
use crate::render;

pub fn get(backend: &Backend, irq: &str) -> Result<()> {
    let resp = backend.get_affinity(irq)?;
    print_affinity(&resp);
    Ok(())
}

/// Pin `irq` to the CPUs named either by a hex `mask` or a `cpus` list
/// such as `0-3,8`.
pub fn set(backend: &Backend, irq: &str, mask: Option<&str>, cpus: Option<&str>) -> Result<()> {
    let mask = match (mask, cpus) {
        (Some(mask), None) => mask.to_string(),
        (None, Some(list)) => mask_from_cpu_list(list, backend.num_cpus()?)?,
        _ => bail!("give either a hex mask or --cpus"),
    };
    let resp = backend.set_affinity(irq, &mask)?;
    print_affinity(&resp);
    Ok(())
}

fn mask_from_cpu_list(list: &str, num_cpus: usize) -> Result<String> {
    let mask = AffinityMask::from_cpu_list(list, num_cpus)
        .with_context(|| format!("bad CPU list '{list}'"))?;
    Ok(mask.encode())
}

fn cpu_list(resp: &CpuAffinityResponse) -> String {
    let width = resp.cpus.iter().max().map_or(0, |&cpu| cpu + 1);
    AffinityMask::new(resp.cpus.iter().copied(), width)
        .map(|mask| mask.to_cpu_list())
        .unwrap_or_else(|_| "-".to_string())
}

fn print_affinity(resp: &CpuAffinityResponse) {
    print!("{}", render::affinity_table(resp).render());
    println!("CPUs: {}", cpu_list(resp));
}
