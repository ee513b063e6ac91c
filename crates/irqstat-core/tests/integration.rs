//! Integration tests for irqstat-core.
//!
//! These drive the full pipeline against a fake procfs tree:
//! `/proc/interrupts` parsing → sampling → aggregation, and
//! `smp_affinity` validation → write → read-back.

use std::fs;
use std::path::Path;

use irqstat_core::{
    IrqError, IrqOperations, ProcfsIrqService, ServiceConfig, api::IrqInfoResponse,
};

const BEFORE: &str = "           CPU0       CPU1       CPU2       CPU3
  0:         36          0          0          0   IO-APIC   2-edge      timer
 16:         10         20          5          5   IO-APIC  16-fasteoi   ehci_hcd:usb1
 17:          0          0          0          0   IO-APIC  17-fasteoi   snd_hda_intel
NMI:          0          0          0          0   Non-maskable interrupts
ERR:          0
";

const AFTER: &str = "           CPU0       CPU1       CPU2       CPU3
  0:         36          0          0          0   IO-APIC   2-edge      timer
 16:         15         25          5         10   IO-APIC  16-fasteoi   ehci_hcd:usb1
 17:          0          0          0          0   IO-APIC  17-fasteoi   snd_hda_intel
NMI:          0          0          0          0   Non-maskable interrupts
ERR:          0
";

fn fake_procfs(root: &Path) {
    fs::write(root.join("interrupts"), BEFORE).unwrap();
    for (irq, mask) in [("0", "1"), ("16", "f"), ("17", "f")] {
        let dir = root.join("irq").join(irq);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("smp_affinity"), format!("{mask}\n")).unwrap();
    }
}

/// Service whose "sleep" swaps the counter table to the later reading.
fn sampling_service(root: &Path) -> ProcfsIrqService {
    let interrupts = root.join("interrupts");
    ProcfsIrqService::procfs(root, ServiceConfig::default()).with_sleep(move |_| {
        fs::write(&interrupts, AFTER).unwrap();
    })
}

#[test]
fn period_totals_over_procfs() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = sampling_service(dir.path());

    let t = svc.period_totals(5).unwrap();
    assert_eq!(t.num_interrupts_per_cpu, vec![5, 5, 0, 5]);
    assert_eq!(t.num_interrupts_all_cpus, 15);
    assert_eq!(t.num_cpus, 4);
    assert_eq!(t.period_duration_seconds, 5);
    assert!((t.percent_interrupts_per_cpu[0] - 33.333).abs() < 0.01);
    assert_eq!(t.percent_interrupts_per_cpu[2], 0.0);
}

#[test]
fn period_totals_for_cpu_over_procfs() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = sampling_service(dir.path());

    let c = svc.period_totals_for_cpu(0, 5).unwrap();
    assert_eq!(c.cpu_num, 0);
    assert_eq!(c.num_interrupts, 5);
    assert_eq!(c.num_interrupts_all_cpus, 15);
}

#[test]
fn out_of_range_cpu_does_not_sample() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default())
        .with_sleep(|_| panic!("sampling must not start"));

    assert_eq!(
        svc.period_totals_for_cpu(4, 5),
        Err(IrqError::OutOfRange {
            cpu: 4,
            num_cpus: 4
        })
    );
}

#[test]
fn quiet_period_reports_zero_percent() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default()).with_sleep(|_| {});

    let t = svc.period_totals(1).unwrap();
    assert_eq!(t.num_interrupts_all_cpus, 0);
    assert!(t.percent_interrupts_per_cpu.iter().all(|&p| p == 0.0));
}

#[test]
fn list_irqs_over_procfs() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default());

    let info = svc.list_irqs().unwrap();
    let ids: Vec<&str> = info.irqs.iter().map(|i| i.irq_num.as_str()).collect();
    assert_eq!(ids, vec!["0", "16", "17", "NMI"]);
    assert_eq!(info.totals.num_interrupts_per_cpu, vec![46, 20, 5, 5]);
    assert_eq!(info.totals.num_interrupts_all_cpus, 76);

    let wire = IrqInfoResponse::from_info(&info);
    assert_eq!(wire.irqs[1].cpu_affinity.as_deref(), Some("f"));
    assert_eq!(wire.irqs[1].irq_type, "IO-APIC 16-fasteoi");
    assert_eq!(wire.irqs[1].device_name, "ehci_hcd:usb1");
    assert_eq!(wire.irqs[3].cpu_affinity, None);
}

#[test]
fn set_affinity_writes_and_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default());

    let mask = svc.set_affinity("16", "0x3").unwrap();
    assert_eq!(mask.to_cpu_list(), "0-1");
    let on_disk = fs::read_to_string(dir.path().join("irq/16/smp_affinity")).unwrap();
    assert_eq!(on_disk.trim(), "3");
    assert_eq!(svc.get_affinity("16").unwrap(), mask);
}

#[test]
fn invalid_mask_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default());

    for bad in ["0x0", "0x10", "not-hex", ""] {
        assert!(
            matches!(svc.set_affinity("16", bad), Err(IrqError::InvalidMask(_))),
            "{bad:?}"
        );
    }
    let on_disk = fs::read_to_string(dir.path().join("irq/16/smp_affinity")).unwrap();
    assert_eq!(on_disk.trim(), "f");
}

#[test]
fn unknown_irq_affinity_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default());

    assert_eq!(
        svc.get_affinity("NMI"),
        Err(IrqError::NotFound("NMI".into()))
    );
    assert_eq!(
        svc.set_affinity("99", "1"),
        Err(IrqError::NotFound("99".into()))
    );
}

#[test]
fn missing_procfs_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default());
    assert!(matches!(
        svc.list_irqs(),
        Err(IrqError::SourceUnavailable(_))
    ));
    assert!(matches!(
        svc.get_affinity("16"),
        Err(IrqError::SourceUnavailable(_))
    ));
}

/// CPU2 offline; IRQ 16 allowed on CPUs 0, 1 and 3.
const OFFLINE_BEFORE: &str = "           CPU0       CPU1       CPU3
 16:         10         20         30   IO-APIC  16-fasteoi   ehci_hcd:usb1
";

const OFFLINE_AFTER: &str = "           CPU0       CPU1       CPU3
 16:         11         20         34   IO-APIC  16-fasteoi   ehci_hcd:usb1
";

fn offline_procfs(root: &Path) {
    fs::write(root.join("interrupts"), OFFLINE_BEFORE).unwrap();
    let dir = root.join("irq").join("16");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("smp_affinity"), "b\n").unwrap();
}

#[test]
fn offline_cpu_keeps_kernel_cpu_ids() {
    let dir = tempfile::tempdir().unwrap();
    offline_procfs(dir.path());
    let interrupts = dir.path().join("interrupts");
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default()).with_sleep(
        move |_| {
            fs::write(&interrupts, OFFLINE_AFTER).unwrap();
        },
    );

    let info = svc.list_irqs().unwrap();
    let mask = info.irqs[0].cpu_affinity.as_ref().unwrap();
    assert_eq!(mask.to_cpu_list(), "0-1,3");
    assert_eq!(info.irqs[0].num_interrupts_per_cpu, vec![10, 20, 0, 30]);

    let cpu3 = svc.period_totals_for_cpu(3, 1).unwrap();
    assert_eq!(cpu3.num_interrupts, 4);
    assert_eq!(cpu3.num_interrupts_all_cpus, 5);
    assert_eq!(cpu3.num_cpus, 4);

    let pinned = svc.set_affinity("16", "8").unwrap();
    assert_eq!(pinned.to_cpu_list(), "3");
    let on_disk = fs::read_to_string(dir.path().join("irq/16/smp_affinity")).unwrap();
    assert_eq!(on_disk.trim(), "8");
}

#[test]
fn stored_mask_wider_than_online_cpus_lists() {
    let dir = tempfile::tempdir().unwrap();
    fake_procfs(dir.path());
    // Kernel sized for 8 possible CPUs, 4 present.
    fs::write(dir.path().join("irq/17/smp_affinity"), "ff\n").unwrap();
    let svc = ProcfsIrqService::procfs(dir.path(), ServiceConfig::default());

    let info = svc.list_irqs().unwrap();
    let irq17 = info.irqs.iter().find(|i| i.irq_num == "17").unwrap();
    assert_eq!(irq17.cpu_affinity.as_ref().unwrap().to_cpu_list(), "0-3");
    assert_eq!(svc.get_affinity("17").unwrap().to_cpu_list(), "0-3");
}

#[test]
#[cfg(target_os = "linux")]
#[ignore] // Run with: cargo test -- --ignored
fn live_proc_interrupts_parse() {
    let svc = ProcfsIrqService::procfs("/proc", ServiceConfig::default());
    let info = svc.list_irqs().unwrap();
    assert!(!info.irqs.is_empty());
    let num_cpus = svc.num_cpus().unwrap();
    assert!(
        info.irqs
            .iter()
            .all(|irq| irq.num_interrupts_per_cpu.len() == num_cpus)
    );
}
