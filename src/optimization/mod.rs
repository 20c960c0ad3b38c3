pub mod callback;
pub mod problem;
pub mod solvers;

pub use callback::ProgressMonitor;
pub use problem::{penalized_objective, penalty_terms, StrategyProblem};
pub use solvers::{select_solver, DifferentialEvolution, LatticeSolver, LocalSearch, SimplexSearch};
pub use solvers::{OptimizationCallback, Problem, Solver, SolverResult, ValueToReach};
