pub mod config;
pub mod optimization;
pub mod optimizer;
pub mod simulation;
pub mod types;

pub use config::{RunConfig, SearchConfig, SimulatorConfig, Strategy};
pub use optimization::{penalized_objective, penalty_terms, StrategyProblem};
pub use optimizer::{Optimizer, OptimizerError, RunPhase};
pub use simulation::{ProcessSimulator, Simulator, SimulatorAdapter, SimulatorBuild};
pub use types::*;
