#[derive(Clone, Debug)]
pub struct SolverResult {
    pub success: bool,
    pub cost: f64,
    pub iterations: u32,
    pub message: String,
    pub params: Vec<f64>,
    pub cost_evals: u64,
    pub cells_searched: usize,
}

/// Callback interface for optimization progress
pub trait OptimizationCallback {
    /// Called after every cost evaluation with the best parameters and cost seen so far
    fn on_iteration(&mut self, evaluation: u64, params: &[f64], cost: f64) -> Result<(), String>;

    /// Check if optimization should stop early
    fn should_stop(&self) -> bool {
        false
    }
}

/// Core problem definition - just the essentials
pub trait Problem {
    /// Evaluate cost for given parameters (runs simulation)
    fn cost(&self, params: &[f64]) -> Result<f64, String>;

    /// Number of parameters
    fn num_params(&self) -> usize;

    /// Parameter bounds (min, max) for each parameter
    fn bounds(&self) -> &[(f64, f64)];
}

/// Solver interface - takes problem and callback
pub trait Solver {
    fn name(&self) -> &str;

    /// Solve the optimization problem with callback for progress tracking
    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult, String>;
}

/// Value-to-reach termination: fires once the best cost is within `tolerance` of `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueToReach {
    pub target: f64,
    pub tolerance: f64,
}

impl ValueToReach {
    pub fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }

    #[inline]
    pub fn reached(&self, best_cost: f64) -> bool {
        (best_cost - self.target).abs() <= self.tolerance
    }

    /// Largest cost that still satisfies the criterion.
    pub fn threshold(&self) -> f64 {
        self.target + self.tolerance
    }
}

impl Default for ValueToReach {
    fn default() -> Self {
        Self::new(0.0, 0.01)
    }
}

#[inline]
pub(crate) fn clamp_params(params: &mut [f64], bounds: &[(f64, f64)]) {
    for (param, &(min, max)) in params.iter_mut().zip(bounds) {
        *param = param.clamp(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_to_reach_is_symmetric_tolerance() {
        let vtr = ValueToReach::new(0.0, 0.01);
        assert!(vtr.reached(0.005));
        assert!(vtr.reached(0.01));
        assert!(!vtr.reached(0.02));
        assert!(!vtr.reached(f64::MAX));
        assert!(!ValueToReach::new(5.0, 0.1).reached(4.0));
    }

    #[test]
    fn clamp_respects_each_dimension() {
        let mut params = vec![-1.0, 50.0, 3.0];
        clamp_params(&mut params, &[(0.0, 40.0), (0.0, 40.0), (0.0, 2.0)]);
        assert_eq!(params, vec![0.0, 40.0, 2.0]);
    }
}
