//! FaultCheck simulation runner
//!
//! Drives an E2E-protected channel through the fault controller, either with
//! a fault plan from a TOML config file or with randomly generated plans, and
//! reports how the receiver classified every frame.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use faultcheck_packet::StreamStats;
use faultcheck_sim::{
    ChannelConfig, ChannelOverrides, ChannelReport, Harness, ScenarioConfig, ScenarioGenerator,
    SimConfig,
};

/// FaultCheck E2E simulation.
#[derive(Parser, Debug)]
#[command(name = "faultcheck-sim", about = "Fault-injection simulation for E2E-protected channels")]
struct Cli {
    /// TOML config with a `[channel]` section and `[[streams]]` fault plans.
    /// Without it, random plans are generated.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for generated plans and sensor payloads.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of generated plans to run.
    #[arg(long, default_value_t = 100)]
    scenarios: usize,

    /// Packets per run (overrides the config file).
    #[arg(long)]
    iterations: Option<u64>,

    /// Stream identifier of the channel (overrides the config file).
    #[arg(long)]
    stream: Option<String>,

    /// Payload bytes per frame (overrides the config file).
    #[arg(long)]
    data_size: Option<u8>,

    /// Largest sequence gap still accepted as `ok_some_lost` (overrides the
    /// config file).
    #[arg(long)]
    max_seq_diff: Option<u8>,

    /// Print the reports as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let reports = match &cli.config {
        Some(path) => {
            let input = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut config = SimConfig::from_toml_str(&input)
                .with_context(|| format!("parsing {}", path.display()))?;
            cli.overrides()
                .apply(&mut config.channel)
                .context("applying channel overrides")?;
            tracing::info!(
                config = %path.display(),
                streams = config.plan.streams.len(),
                "running configured plan"
            );
            vec![Harness::from_config(config)?.run()?]
        }
        None => run_generated(&cli)?,
    };

    let unsound: Vec<&ChannelReport> = reports.iter().filter(|r| !r.is_sound()).collect();
    let max_drop_rate = reports
        .iter()
        .filter_map(|r| r.stream_stats.as_ref())
        .map(StreamStats::drop_rate)
        .fold(0.0, f64::max);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    tracing::info!(
        runs = reports.len(),
        unsound = unsound.len(),
        max_drop_rate,
        "simulation finished"
    );

    if !unsound.is_empty() {
        anyhow::bail!(
            "{} of {} runs accepted corrupted frames",
            unsound.len(),
            reports.len()
        );
    }
    Ok(())
}

impl Cli {
    fn overrides(&self) -> ChannelOverrides {
        ChannelOverrides {
            stream: self.stream.clone(),
            data_size: self.data_size,
            max_seq_diff: self.max_seq_diff,
            iterations: self.iterations,
        }
    }
}

fn run_generated(cli: &Cli) -> Result<Vec<ChannelReport>> {
    let mut channel = ChannelConfig {
        seed: cli.seed,
        ..Default::default()
    };
    cli.overrides()
        .apply(&mut channel)
        .context("applying channel overrides")?;

    let mut generator = ScenarioGenerator::new(ScenarioConfig {
        seed: cli.seed,
        stream: channel.stream.clone(),
        byte_index_bound: channel.e2e.protected_size() + 1,
        ..Default::default()
    });

    tracing::info!(
        seed = cli.seed,
        scenarios = cli.scenarios,
        iterations = channel.iterations,
        "running generated plans"
    );

    generator
        .plans(cli.scenarios)
        .into_iter()
        .enumerate()
        .map(|(idx, plan)| {
            let run = ChannelConfig {
                seed: cli.seed.wrapping_add(idx as u64),
                ..channel.clone()
            };
            Harness::new(run, plan)
                .and_then(|mut h| h.run())
                .with_context(|| format!("scenario {idx}"))
        })
        .collect()
}
