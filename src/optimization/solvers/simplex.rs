use super::evaluator::Evaluator;
use super::lattice::LocalSearch;
use super::traits::clamp_params;
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::neldermead::NelderMead;
use std::cell::RefCell;

/// Cell-restricted view of the shared evaluator for argmin.
struct CellCost<'e, 'p, 'c> {
    evaluator: RefCell<&'e mut Evaluator<'p, 'c>>,
    cell: &'e [(f64, f64)],
}

impl CostFunction for CellCost<'_, '_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        let mut evaluator = self.evaluator.borrow_mut();
        if evaluator.stopped() {
            // Aborts the executor; the caller checks `stopped()` afterwards
            return Err(Error::msg("lattice search stopped"));
        }
        let mut clamped = params.clone();
        clamp_params(&mut clamped, self.cell);
        evaluator.evaluate(&clamped).map_err(Error::msg)
    }
}

/// Nelder-Mead simplex started at the cell center, candidates clamped to the cell
pub struct SimplexSearch {
    max_iters: u64,
    sd_tolerance: f64,
    spread: f64, // fraction of the cell width used for the initial simplex
}

impl SimplexSearch {
    pub fn new(max_iters: u64) -> Self {
        Self {
            max_iters,
            sd_tolerance: 1e-6,
            spread: 0.25,
        }
    }

    fn initial_simplex(&self, cell: &[(f64, f64)]) -> Vec<Vec<f64>> {
        let center: Vec<f64> = cell.iter().map(|&(min, max)| 0.5 * (min + max)).collect();

        let mut vertices = Vec::with_capacity(cell.len() + 1);
        vertices.push(center.clone());
        for (i, &(min, max)) in cell.iter().enumerate() {
            let mut vertex = center.clone();
            vertex[i] += self.spread * (max - min);
            vertices.push(vertex);
        }
        vertices
    }
}

impl LocalSearch for SimplexSearch {
    fn name(&self) -> &str {
        "NelderMead"
    }

    fn search(
        &mut self,
        cell: &[(f64, f64)],
        evaluator: &mut Evaluator<'_, '_>,
    ) -> Result<u32, String> {
        let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(self.initial_simplex(cell))
            .with_sd_tolerance(self.sd_tolerance)
            .map_err(|e| e.to_string())?;

        let target = evaluator.termination().threshold();
        let max_iters = self.max_iters;
        let cost = CellCost {
            evaluator: RefCell::new(&mut *evaluator),
            cell,
        };

        let outcome = match Executor::new(cost, solver)
            .configure(|state| state.max_iters(max_iters).target_cost(target))
            .run()
        {
            Ok(res) => Ok(res.state.get_iter()),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(iters) => Ok(u32::try_from(iters).unwrap_or(u32::MAX)),
            Err(_) if evaluator.stopped() => Ok(0),
            Err(e) => Err(e),
        }
    }
}
