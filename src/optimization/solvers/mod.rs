mod differential;
mod evaluator;
mod lattice;
mod simplex;
pub mod traits;

pub use differential::DifferentialEvolution;
pub use evaluator::{Evaluator, StopReason};
pub use lattice::{LatticeSolver, LocalSearch};
pub use simplex::SimplexSearch;
pub use traits::{OptimizationCallback, Problem, Solver, SolverResult, ValueToReach};

use crate::config::{SearchConfig, Strategy};

/// Build the lattice solver described by `search` for a problem of `num_params` dimensions.
pub fn select_solver(search: &SearchConfig, num_params: usize) -> (Box<dyn Solver>, String) {
    let bins = LatticeSolver::bins_for(search.lattice_points, num_params);
    let termination = ValueToReach::new(search.target_value, search.tolerance);

    let local: Box<dyn LocalSearch> = match search.strategy {
        Strategy::Best1Bin => {
            let de = DifferentialEvolution::new(search.population_size, search.max_generations)
                .with_de_params(search.crossover, search.scaling);
            Box::new(match search.seed {
                Some(seed) => de.with_seed(seed),
                None => de,
            })
        }
        Strategy::NelderMead => Box::new(SimplexSearch::new(u64::from(search.max_generations))),
    };

    let reason = format!(
        "Lattice: {} params, {} bins per dimension → {} per cell (target {} ± {})",
        num_params,
        bins,
        local.name(),
        termination.target,
        termination.tolerance
    );

    (
        Box::new(LatticeSolver::new(bins, local).with_termination(termination)),
        reason,
    )
}
