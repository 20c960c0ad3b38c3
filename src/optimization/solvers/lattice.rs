use super::evaluator::{Evaluator, StopReason};
use super::traits::{OptimizationCallback, Problem, Solver, SolverResult, ValueToReach};
use tracing::debug;

/// Search strategy run inside a single lattice cell.
pub trait LocalSearch {
    fn name(&self) -> &str;

    /// Search the box `cell` through `evaluator`, returning the generations spent.
    /// Must return promptly once `evaluator.stopped()` turns true.
    fn search(
        &mut self,
        cell: &[(f64, f64)],
        evaluator: &mut Evaluator<'_, '_>,
    ) -> Result<u32, String>;
}

/// Global solver that partitions the bounded space into a regular grid and
/// runs a local search in every cell until the value to reach is hit.
pub struct LatticeSolver {
    bins_per_dimension: usize,
    termination: ValueToReach,
    local: Box<dyn LocalSearch>,
}

impl LatticeSolver {
    pub fn new(bins_per_dimension: usize, local: Box<dyn LocalSearch>) -> Self {
        Self {
            bins_per_dimension: bins_per_dimension.max(1),
            termination: ValueToReach::default(),
            local,
        }
    }

    pub fn with_termination(mut self, termination: ValueToReach) -> Self {
        self.termination = termination;
        self
    }

    /// Per-dimension bin count so the whole lattice holds about `points` cells.
    pub fn bins_for(points: usize, dimensions: usize) -> usize {
        if dimensions == 0 {
            return 1;
        }
        ((points as f64).powf(1.0 / dimensions as f64).round() as usize).max(1)
    }

    pub fn bins_per_dimension(&self) -> usize {
        self.bins_per_dimension
    }

    /// Total number of cells for `dimensions`, `None` on overflow
    pub fn cell_count(&self, dimensions: usize) -> Option<usize> {
        let exp = u32::try_from(dimensions).ok()?;
        self.bins_per_dimension.checked_pow(exp)
    }

    /// Bounds of cell `index`, enumerated in mixed-radix order (first dimension fastest).
    pub fn cell(&self, index: usize, bounds: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let bins = self.bins_per_dimension;
        let mut rest = index;
        bounds
            .iter()
            .map(|&(min, max)| {
                let k = rest % bins;
                rest /= bins;
                let width = (max - min) / bins as f64;
                let lo = min + k as f64 * width;
                // last bin ends exactly on the upper bound
                let hi = if k + 1 == bins { max } else { lo + width };
                (lo, hi)
            })
            .collect()
    }
}

impl Solver for LatticeSolver {
    fn name(&self) -> &str {
        "Lattice"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult, String> {
        let n = problem.num_params();
        if n == 0 {
            return Err("Problem has no parameters".into());
        }
        let bounds = problem.bounds().to_vec();
        let total_cells = self.cell_count(n).ok_or_else(|| {
            format!(
                "Lattice of {}^{} cells is too large",
                self.bins_per_dimension, n
            )
        })?;

        let mut evaluator = Evaluator::new(problem, callback, self.termination);
        let mut generations = 0u32;
        let mut cells_searched = 0usize;

        for index in 0..total_cells {
            let cell = self.cell(index, &bounds);
            let spent = self.local.search(&cell, &mut evaluator)?;
            generations = generations.saturating_add(spent);
            cells_searched += 1;

            debug!(
                cell = index,
                generations = spent,
                best = evaluator.best_cost(),
                "cell searched"
            );

            if evaluator.stopped() {
                break;
            }
        }

        let message = match evaluator.stop_reason() {
            Some(StopReason::TargetReached) => "Value to reach attained".to_string(),
            Some(StopReason::Callback) => "Stopped by callback".to_string(),
            None => format!("All {} lattice cells searched", total_cells),
        };
        let success = evaluator.stop_reason() == Some(StopReason::TargetReached);
        let cost_evals = evaluator.evals();
        let (params, cost) = evaluator.into_best();

        Ok(SolverResult {
            success,
            cost,
            iterations: generations,
            message,
            params,
            cost_evals,
            cells_searched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::differential::DifferentialEvolution;
    use super::*;

    struct Bowl {
        center: f64,
        bounds: Vec<(f64, f64)>,
    }

    impl Problem for Bowl {
        fn cost(&self, params: &[f64]) -> Result<f64, String> {
            Ok(params.iter().map(|x| (x - self.center).powi(2)).sum())
        }
        fn num_params(&self) -> usize {
            self.bounds.len()
        }
        fn bounds(&self) -> &[(f64, f64)] {
            &self.bounds
        }
    }

    struct Wall;

    impl Problem for Wall {
        fn cost(&self, _: &[f64]) -> Result<f64, String> {
            Ok(f64::MAX)
        }
        fn num_params(&self) -> usize {
            2
        }
        fn bounds(&self) -> &[(f64, f64)] {
            &[(0.0, 40.0), (0.0, 40.0)]
        }
    }

    #[derive(Default)]
    struct Counter {
        calls: u64,
        budget: Option<u64>,
    }

    impl OptimizationCallback for Counter {
        fn on_iteration(&mut self, evaluation: u64, _: &[f64], _: f64) -> Result<(), String> {
            self.calls = evaluation;
            Ok(())
        }
        fn should_stop(&self) -> bool {
            self.budget.is_some_and(|b| self.calls >= b)
        }
    }

    fn de(seed: u64) -> Box<dyn LocalSearch> {
        Box::new(DifferentialEvolution::new(8, 20).with_seed(seed))
    }

    #[test]
    fn bins_track_target_points() {
        assert_eq!(LatticeSolver::bins_for(20, 1), 20);
        assert_eq!(LatticeSolver::bins_for(20, 2), 4);
        assert_eq!(LatticeSolver::bins_for(20, 3), 3);
        assert_eq!(LatticeSolver::bins_for(20, 10), 1);
        assert_eq!(LatticeSolver::bins_for(0, 2), 1);
    }

    #[test]
    fn cells_enumerate_mixed_radix() {
        let solver = LatticeSolver::new(2, de(0));
        let bounds = [(0.0, 10.0), (0.0, 10.0)];
        assert_eq!(solver.cell_count(2), Some(4));
        assert_eq!(solver.cell(0, &bounds), vec![(0.0, 5.0), (0.0, 5.0)]);
        assert_eq!(solver.cell(1, &bounds), vec![(5.0, 10.0), (0.0, 5.0)]);
        assert_eq!(solver.cell(2, &bounds), vec![(0.0, 5.0), (5.0, 10.0)]);
        assert_eq!(solver.cell(3, &bounds), vec![(5.0, 10.0), (5.0, 10.0)]);
    }

    #[test]
    fn stops_at_value_to_reach() {
        let problem = Bowl {
            center: 33.0,
            bounds: vec![(0.0, 40.0); 2],
        };
        let mut counter = Counter::default();
        let local = Box::new(DifferentialEvolution::new(10, 80).with_seed(11));
        let mut solver =
            LatticeSolver::new(4, local).with_termination(ValueToReach::new(0.0, 0.01));
        let result = solver.solve(&problem, &mut counter).unwrap();
        assert!(result.success);
        assert!(result.cost <= 0.01);
        assert_eq!(result.cost_evals, counter.calls);
        assert!(result.cells_searched <= 16);
        assert!(result.params.iter().all(|x| (x - 33.0).abs() < 0.1));
    }

    #[test]
    fn exhausts_lattice_when_target_unreachable() {
        let mut counter = Counter::default();
        let mut solver = LatticeSolver::new(2, de(5));
        let result = solver.solve(&Wall, &mut counter).unwrap();
        assert!(!result.success);
        assert_eq!(result.cells_searched, 4);
        assert_eq!(result.cost, f64::MAX);
        assert!(result.message.contains("All 4"));
    }

    #[test]
    fn callback_budget_stops_search() {
        let mut counter = Counter {
            calls: 0,
            budget: Some(25),
        };
        let mut solver = LatticeSolver::new(2, de(5));
        let result = solver.solve(&Wall, &mut counter).unwrap();
        assert!(!result.success);
        assert_eq!(result.cost_evals, 25);
        assert_eq!(result.message, "Stopped by callback");
    }
}
