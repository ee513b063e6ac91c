//! CLI for irqstat: see how interrupts are spread across CPUs and pin IRQs.

mod client;
mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use irqstat_core::{DEFAULT_MAX_PERIOD_SECS, DEFAULT_PERIOD_SECS, DEFAULT_PROCFS_ROOT, ServiceConfig};

use commands::Backend;

#[derive(Parser)]
#[command(name = "irqstat")]
#[command(about = "irqstat: interrupt distribution and IRQ affinity control")]
#[command(version = irqstat_core::VERSION)]
struct Cli {
    /// Query a running irqstat server (e.g. http://10.0.0.5:8080) instead of local procfs
    #[arg(long, global = true)]
    server: Option<String>,

    /// procfs mount point to read
    #[arg(long, global = true, default_value = DEFAULT_PROCFS_ROOT)]
    procfs: PathBuf,

    /// Longest sampling period accepted, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_PERIOD_SECS)]
    max_period: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every IRQ with its type, device, affinity and lifetime per-CPU counts
    Irqs,

    /// Show or change which CPUs may service an IRQ
    Affinity {
        #[command(subcommand)]
        action: AffinityAction,
    },

    /// Sample interrupt counters and show how they were spread across CPUs
    Interrupts {
        /// Sampling period in seconds (default: 5)
        #[arg(long)]
        period: Option<u64>,

        /// Report a single CPU
        #[arg(long)]
        cpu: Option<usize>,
    },

    /// Start the HTTP API server
    Server {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum AffinityAction {
    /// Print the current affinity of an IRQ
    Get {
        /// IRQ number
        irq: String,
    },

    /// Set the affinity of an IRQ
    Set {
        /// IRQ number
        irq: String,

        /// Hex CPU bitmap as the kernel writes it (e.g. 3, 0x3, ff,00000000)
        #[arg(required_unless_present = "cpus", conflicts_with = "cpus")]
        mask: Option<String>,

        /// CPU list instead of a mask (e.g. 0-3,8)
        #[arg(long)]
        cpus: Option<String>,
    },
}

fn run(cli: Cli) -> Result<()> {
    let config = ServiceConfig {
        max_period_seconds: cli.max_period,
        default_period_seconds: DEFAULT_PERIOD_SECS.min(cli.max_period),
    };

    let backend = || Backend::connect(cli.server.as_deref(), &cli.procfs, config);
    match cli.command {
        Commands::Irqs => commands::irqs::run(&backend()?),
        Commands::Affinity { action } => match action {
            AffinityAction::Get { irq } => commands::affinity::get(&backend()?, &irq),
            AffinityAction::Set { irq, mask, cpus } => {
                commands::affinity::set(&backend()?, &irq, mask.as_deref(), cpus.as_deref())
            }
        },
        Commands::Interrupts { period, cpu } => {
            commands::interrupts::run(&backend()?, period, cpu)
        }
        Commands::Server { host, port } => {
            if cli.server.is_some() {
                bail!("--server cannot be combined with the server subcommand");
            }
            commands::server::run(&cli.procfs, config, &host, port)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
