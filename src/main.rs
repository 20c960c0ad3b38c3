use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use strategy_optimizer::{
    Optimizer, ProcessSimulator, RunConfig, RunReport, SimulatorBuild, Strategy,
};
use tracing_subscriber::filter::EnvFilter;

/// Used when `RUST_LOG` is unset, so build and launch warnings stay visible.
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "strategy-optimizer")]
#[command(version)]
#[command(about = "Lattice search for the fastest race strategy a simulator accepts")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulator executable
    #[arg(long)]
    program: Option<PathBuf>,

    /// Directory the simulator is built and run in
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Approximate number of lattice cells
    #[arg(long)]
    points: Option<usize>,

    /// Objective value to reach
    #[arg(long)]
    target: Option<f64>,

    #[arg(long)]
    tolerance: Option<f64>,

    /// Per-cell search: best1bin or nelder-mead
    #[arg(long)]
    strategy: Option<Strategy>,

    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many objective evaluations
    #[arg(long)]
    max_evaluations: Option<u64>,

    /// Skip building the simulator before the run
    #[arg(long)]
    no_build: bool,

    /// Write the run report as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(program) = &self.program {
            config.simulator.program = program.clone();
        }
        if let Some(dir) = &self.workdir {
            config.simulator.working_dir = dir.clone();
        }
        if let Some(points) = self.points {
            config.search.lattice_points = points;
        }
        if let Some(target) = self.target {
            config.search.target_value = target;
        }
        if let Some(tolerance) = self.tolerance {
            config.search.tolerance = tolerance;
        }
        if let Some(strategy) = self.strategy {
            config.search.strategy = strategy;
        }
        if self.seed.is_some() {
            config.search.seed = self.seed;
        }
        if self.max_evaluations.is_some() {
            config.search.max_evaluations = self.max_evaluations;
        }
        if self.no_build {
            config.simulator.build_command.clear();
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let sim = &config.simulator;
    if !sim.build_command.is_empty() {
        SimulatorBuild::new(sim.build_command.clone(), &sim.working_dir).run();
    }
    let simulator =
        ProcessSimulator::new(&sim.program, &sim.working_dir).with_leading_args(sim.args.clone());

    let mut optimizer = Optimizer::new(config);
    let report = optimizer.run(simulator)?;

    if let Some(path) = &args.json {
        write_report(path, &report)?;
    }

    Ok(())
}
