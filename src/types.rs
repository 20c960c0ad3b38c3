use serde::{Deserialize, Serialize};

/// Objective value reported for evaluations that cannot be scored.
pub const SENTINEL_COST: f64 = f64::MAX;

// ===== ENUMS =====

/// Trailing render token handed to the simulator after the parameter vector.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Empty token: the simulator renders with its default cadence.
    #[default]
    Auto,
    /// `none`: rendering suppressed.
    Suppress,
    /// Any other literal, passed through verbatim.
    Directive(String),
}

impl RenderMode {
    pub fn as_arg(&self) -> &str {
        match self {
            Self::Auto => "",
            Self::Suppress => "none",
            Self::Directive(token) => token,
        }
    }

    pub fn from_arg(token: &str) -> Self {
        match token {
            "" => Self::Auto,
            "none" => Self::Suppress,
            other => Self::Directive(other.to_string()),
        }
    }
}

// ===== CORE DATA TYPES =====

/// Physical limits enforced through penalty terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintLimits {
    /// m/s, also the upper search bound of every parameter
    pub max_velocity: f64,
    /// m/s^2
    pub max_acceleration: f64,
    /// m/s^2, compared against the magnitude of the minimum acceleration
    pub max_deceleration: f64,
    /// W
    pub max_energy: f64,
    pub max_centripetal: f64,
    /// Multiplier applied to every constraint violation
    pub penalty_weight: f64,
}

impl Default for ConstraintLimits {
    fn default() -> Self {
        Self {
            max_velocity: 40.0,
            max_acceleration: 3.0,
            max_deceleration: 3.0,
            max_energy: 1300.0,
            max_centripetal: 3.0,
            penalty_weight: 100.0,
        }
    }
}

/// Scalars extracted from one simulator run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub time_elapsed: f64,
    pub energy_consumption: f64,
    pub initial_velocity: f64,
    pub final_velocity: f64,
    pub max_velocity: f64,
    pub min_velocity: f64,
    pub max_acceleration: f64,
    pub min_acceleration: f64,
    pub max_centripetal_force: f64,
}

/// One additive contribution to the objective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTerm {
    pub name: String,
    pub value: f64,
}

/// Hit/miss bookkeeping of the evaluation cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Everything the driver knows once the run has been reported.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub expected_args: usize,
    pub bins_per_dimension: usize,
    pub solution: Vec<f64>,
    pub objective: f64,
    pub converged: bool,
    pub message: String,
    pub cost_evals: u64,
    pub cells_searched: usize,
    pub metrics: Option<SimulationMetrics>,
    pub penalties: Vec<PenaltyTerm>,
    pub cache: CacheStats,
    pub final_output: String,
}

impl RunReport {
    pub fn violated_constraints(&self) -> impl Iterator<Item = &PenaltyTerm> {
        self.penalties.iter().filter(|term| term.value != 0.0)
    }
}
