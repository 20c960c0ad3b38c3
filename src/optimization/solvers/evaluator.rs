use super::traits::{OptimizationCallback, Problem, ValueToReach};

/// Why an [`Evaluator`] refuses further evaluations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    Callback,
}

/// Shared bookkeeping for one solve: counts evaluations, tracks the global
/// best, feeds the callback, and checks the termination criteria after every call.
pub struct Evaluator<'p, 'c> {
    problem: &'p dyn Problem,
    callback: &'c mut dyn OptimizationCallback,
    termination: ValueToReach,
    best_params: Vec<f64>,
    best_cost: f64,
    evals: u64,
    stop: Option<StopReason>,
}

impl<'p, 'c> Evaluator<'p, 'c> {
    pub fn new(
        problem: &'p dyn Problem,
        callback: &'c mut dyn OptimizationCallback,
        termination: ValueToReach,
    ) -> Self {
        let best_params = problem.bounds().iter().map(|&(min, max)| 0.5 * (min + max)).collect();
        Self {
            problem,
            callback,
            termination,
            best_params,
            best_cost: f64::INFINITY,
            evals: 0,
            stop: None,
        }
    }

    /// Cost of `params`, updating the global best.
    pub fn evaluate(&mut self, params: &[f64]) -> Result<f64, String> {
        let cost = self.problem.cost(params)?;
        self.evals += 1;

        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_params.clear();
            self.best_params.extend_from_slice(params);
        }

        self.callback
            .on_iteration(self.evals, &self.best_params, self.best_cost)?;

        if self.termination.reached(self.best_cost) {
            self.stop = Some(StopReason::TargetReached);
        } else if self.callback.should_stop() {
            self.stop = Some(StopReason::Callback);
        }

        Ok(cost)
    }

    #[inline]
    pub fn stopped(&self) -> bool {
        self.stop.is_some()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub fn termination(&self) -> ValueToReach {
        self.termination
    }

    pub fn evals(&self) -> u64 {
        self.evals
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn best_params(&self) -> &[f64] {
        &self.best_params
    }

    pub fn into_best(self) -> (Vec<f64>, f64) {
        (self.best_params, self.best_cost)
    }
}
