use crate::simulation::default_program;
use crate::types::ConstraintLimits;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Strategy {
    #[default]
    #[serde(rename = "best1bin")]
    Best1Bin,
    #[serde(rename = "nelder-mead")]
    NelderMead,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best1bin" | "best-1-bin" => Ok(Self::Best1Bin),
            "nelder-mead" | "neldermead" => Ok(Self::NelderMead),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub simulator: SimulatorConfig,
    pub limits: ConstraintLimits,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub program: PathBuf,
    /// Tokens placed before the parameter vector
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Empty disables the build step
    pub build_command: Vec<String>,
    /// Every n-th evaluation asks the simulator to render
    pub calls_between_image: u64,
    /// Render token of the final confirmatory run
    pub final_render: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            build_command: vec!["go".into(), "build".into(), ".".into()],
            calls_between_image: 20,
            final_render: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Approximate number of lattice cells
    pub lattice_points: usize,
    pub target_value: f64,
    pub tolerance: f64,
    pub strategy: Strategy,
    pub population_size: usize,
    pub max_generations: u32,
    pub crossover: f64,
    pub scaling: f64,
    pub max_evaluations: Option<u64>,
    pub seed: Option<u64>,
    pub report_interval: u64,
    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lattice_points: 20,
            target_value: 0.0,
            tolerance: 0.01,
            strategy: Strategy::Best1Bin,
            population_size: 10,
            max_generations: 100,
            crossover: 0.9,
            scaling: 0.8,
            max_evaluations: None,
            seed: None,
            report_interval: 10,
            verbose: true,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            limits: ConstraintLimits::default(),
            search: SearchConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: RunConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulator.program.as_os_str().is_empty() {
            bail!("simulator.program must not be empty");
        }
        if self.simulator.calls_between_image == 0 {
            bail!("simulator.calls_between_image must be at least 1");
        }
        if self.search.lattice_points == 0 {
            bail!("search.lattice_points must be at least 1");
        }
        if !(self.search.tolerance >= 0.0) {
            bail!("search.tolerance must be non-negative");
        }
        if self.search.population_size < 4 && self.search.strategy == Strategy::Best1Bin {
            bail!("search.population_size must be at least 4 for best1bin");
        }
        if !(0.0..=1.0).contains(&self.search.crossover) {
            bail!("search.crossover must lie in [0, 1]");
        }
        if self.search.report_interval == 0 {
            bail!("search.report_interval must be at least 1");
        }

        let limits = &self.limits;
        for (name, value) in [
            ("max_velocity", limits.max_velocity),
            ("max_acceleration", limits.max_acceleration),
            ("max_deceleration", limits.max_deceleration),
            ("max_energy", limits.max_energy),
            ("max_centripetal", limits.max_centripetal),
            ("penalty_weight", limits.penalty_weight),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                bail!("limits.{} must be positive and finite, got {}", name, value);
            }
        }

        Ok(())
    }
}
