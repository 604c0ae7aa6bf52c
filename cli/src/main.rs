use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pagesim::{
    AccessPattern, Machine, MappingStrategy, Metrics, ReplacementPolicy, RunOutcome, SimConfig,
    SimulationController, Utilization,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pagesim", version, about = "Virtual memory address translation simulator")]
struct Cli {
    /// JSON file with the base configuration; flags override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Debug)]
struct Overrides {
    /// Virtual address space size in MiB
    #[arg(long, global = true)]
    virtual_mb: Option<u64>,

    /// Physical memory size in MiB
    #[arg(long, global = true)]
    physical_mb: Option<u64>,

    /// Page size in bytes (4096, 2097152 or 1073741824)
    #[arg(long, global = true)]
    page_size: Option<u64>,

    /// demand, prefetch or streaming
    #[arg(long, global = true)]
    strategy: Option<MappingStrategy>,

    /// sequential, random or localized
    #[arg(long, global = true)]
    pattern: Option<AccessPattern>,

    /// Delay between steps in milliseconds, 50 to 1000
    #[arg(long, global = true)]
    pacing_ms: Option<u64>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of steps in a run
    #[arg(long, global = true)]
    total_steps: Option<usize>,

    /// Accesses per step
    #[arg(long, global = true)]
    batch: Option<usize>,

    /// TLB slots
    #[arg(long, global = true)]
    tlb: Option<usize>,

    /// Frame eviction policy: random, fifo or lru
    #[arg(long, global = true)]
    eviction: Option<ReplacementPolicy>,

    /// TLB slot replacement policy: random, fifo or lru
    #[arg(long, global = true)]
    tlb_replacement: Option<ReplacementPolicy>,

    /// Probability that an access is a write
    #[arg(long, global = true)]
    write_ratio: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a paced simulation, printing progress and the final metrics
    Run,
    /// Step without pacing and print the resulting snapshot as JSON
    Inspect {
        /// Steps to execute before taking the snapshot
        #[arg(long, default_value_t = 10)]
        steps: usize,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Run the same seed under every mapping strategy and tabulate the results
    Compare,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.overrides.apply(load_config(cli.config.as_deref())?);
    config.validate().context("invalid configuration")?;

    match cli.cmd {
        Cmd::Run => run(config).await?,
        Cmd::Inspect { steps, pretty } => inspect(config, steps, pretty)?,
        Cmd::Compare => compare(config)?,
    }
    Ok(())
}

impl Overrides {
    fn apply(self, mut config: SimConfig) -> SimConfig {
        if let Some(v) = self.virtual_mb {
            config.virtual_space_mb = v;
        }
        if let Some(v) = self.physical_mb {
            config.physical_memory_mb = v;
        }
        if let Some(v) = self.page_size {
            config.page_size = v;
        }
        if let Some(v) = self.strategy {
            config.mapping_strategy = v;
        }
        if let Some(v) = self.pattern {
            config.access_pattern = v;
        }
        if let Some(v) = self.pacing_ms {
            config.step_pacing_ms = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.total_steps {
            config.total_steps = v;
        }
        if let Some(v) = self.batch {
            config.batch_size = v;
        }
        if let Some(v) = self.tlb {
            config.tlb_capacity = v;
        }
        if let Some(v) = self.eviction {
            config.eviction_policy = v;
        }
        if let Some(v) = self.tlb_replacement {
            config.tlb_replacement = v;
        }
        if let Some(v) = self.write_ratio {
            config.write_ratio = v;
        }
        config
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("[ ERROR ] cannot read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("[ ERROR ] cannot parse config {}", path.display()))
}

async fn run(config: SimConfig) -> anyhow::Result<()> {
    let ctl = SimulationController::new(config)?;

    let mut rx = ctl.subscribe();
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let p = *rx.borrow_and_update();
            if p.step > 0 {
                println!("[ {:>5.1}% ] step {}/{}", p.percent, p.step, p.total_steps);
            }
        }
    });

    let interrupt = {
        let ctl = ctl.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, resetting");
                ctl.reset();
            }
        })
    };

    let outcome = ctl.run().await;
    interrupt.abort();
    printer.abort();

    match outcome? {
        RunOutcome::Completed { steps, metrics } => {
            info!(steps, "run finished");
            print_metrics(&metrics, &ctl.snapshot().utilization);
        }
        RunOutcome::Cancelled { steps } => println!("cancelled after {steps} steps"),
    }
    Ok(())
}

fn inspect(config: SimConfig, steps: usize, pretty: bool) -> anyhow::Result<()> {
    let mut machine = Machine::new(config)?;
    for _ in 0..steps {
        if machine.step().is_none() {
            break;
        }
    }
    machine.check_invariants().context("[ ERROR ] simulation state is inconsistent")?;
    let snapshot = machine.snapshot();
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

fn compare(config: SimConfig) -> anyhow::Result<()> {
    println!(
        "{:<10} {:>8} {:>9} {:>10} {:>10} {:>12} {:>7}",
        "strategy", "faults", "evictions", "prefetches", "writebacks", "avg cycles", "tlb %"
    );
    for strategy in [MappingStrategy::Demand, MappingStrategy::Prefetch, MappingStrategy::Streaming] {
        let mut machine = Machine::new(config.clone().with_strategy(strategy))?;
        let m = machine.run_to_completion();
        println!(
            "{:<10} {:>8} {:>9} {:>10} {:>10} {:>12.1} {:>7.1}",
            strategy.name(),
            m.page_faults,
            m.evictions,
            m.prefetches,
            m.writebacks,
            m.average_access_cycles(),
            m.tlb_hit_rate() * 100.0
        );
    }
    Ok(())
}

fn print_metrics(m: &Metrics, u: &Utilization) {
    println!("accesses           {}", m.accesses);
    println!("page faults        {}", m.page_faults);
    println!("tlb hits / misses  {} / {} ({:.1}%)", m.tlb_hits, m.tlb_misses, m.tlb_hit_rate() * 100.0);
    println!("page table walks   {}", m.page_table_walks);
    println!("evictions          {} ({} written back)", m.evictions, m.writebacks);
    println!("prefetched pages   {}", m.prefetches);
    println!("access time        {} cycles ({:.1} avg)", m.memory_access_time, m.average_access_cycles());
    println!(
        "utilization        pages {:.1}%  frames {:.1}%  tlb {:.1}%",
        u.page_utilization, u.frame_utilization, u.tlb_utilization
    );
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn inspect_steps_do_not_touch_the_run_length() {
        let cli = Cli::try_parse_from(["pagesim", "inspect", "--steps", "20"]).unwrap();
        assert_eq!(cli.overrides.total_steps, None);
        assert!(matches!(cli.cmd, Cmd::Inspect { steps: 20, pretty: false }));
        assert_eq!(cli.overrides.apply(SimConfig::default()).total_steps, 100);
    }

    #[test]
    fn run_length_override_leaves_inspect_default() {
        let cli = Cli::try_parse_from(["pagesim", "--total-steps", "50", "inspect"]).unwrap();
        assert_eq!(cli.overrides.total_steps, Some(50));
        assert!(matches!(cli.cmd, Cmd::Inspect { steps: 10, .. }));

        let cli = Cli::try_parse_from(["pagesim", "inspect", "--total-steps", "50", "--steps", "20"]).unwrap();
        assert_eq!(cli.overrides.total_steps, Some(50));
        assert!(matches!(cli.cmd, Cmd::Inspect { steps: 20, .. }));
    }

    #[test]
    fn flags_override_the_base_config() {
        let cli = Cli::try_parse_from([
            "pagesim",
            "compare",
            "--strategy",
            "prefetch",
            "--eviction",
            "lru",
            "--seed",
            "7",
        ])
        .unwrap();
        let config = cli.overrides.apply(SimConfig::default());
        assert_eq!(config.mapping_strategy, MappingStrategy::Prefetch);
        assert_eq!(config.eviction_policy, ReplacementPolicy::Lru);
        assert_eq!(config.seed, 7);
        assert_eq!(config.total_steps, 100);
        assert!(Cli::try_parse_from(["pagesim", "run", "--pattern", "zigzag"]).is_err());
    }
}
