use super::solvers::traits::Problem;
use crate::simulation::{Simulator, SimulatorAdapter};
use crate::types::{
    CacheStats, ConstraintLimits, PenaltyTerm, RenderMode, SENTINEL_COST, SimulationMetrics,
};
use std::cell::RefCell;
use tracing::debug;

/// Additive penalty terms for one set of metrics, in the order they are summed.
///
/// Every term is zero when its constraint holds, except velocity matching which
/// always contributes `|final - initial| * weight`.
pub fn penalty_terms(metrics: &SimulationMetrics, limits: &ConstraintLimits) -> Vec<PenaltyTerm> {
    let w = limits.penalty_weight;
    let mut terms = Vec::with_capacity(7);
    let mut push = |name: &str, value: f64| {
        terms.push(PenaltyTerm {
            name: name.to_string(),
            value,
        })
    };

    let energy = metrics.energy_consumption;
    push(
        "energy",
        if energy > limits.max_energy || energy < 0.0 {
            (energy - limits.max_energy).abs() * w
        } else {
            0.0
        },
    );

    push(
        "max_velocity",
        if metrics.max_velocity > limits.max_velocity {
            (metrics.max_velocity - limits.max_velocity) * w
        } else {
            0.0
        },
    );

    push(
        "min_velocity",
        if metrics.min_velocity < 0.0 {
            metrics.min_velocity.abs() * w
        } else {
            0.0
        },
    );

    push(
        "max_acceleration",
        if metrics.max_acceleration > limits.max_acceleration {
            (metrics.max_acceleration - limits.max_acceleration) * w
        } else {
            0.0
        },
    );

    push(
        "min_acceleration",
        if metrics.min_acceleration < -limits.max_deceleration {
            (metrics.min_acceleration.abs() - limits.max_deceleration) * w
        } else {
            0.0
        },
    );

    // Kept as (limit - force): a violation lowers the objective.
    push(
        "centripetal_force",
        if metrics.max_centripetal_force > limits.max_centripetal {
            (limits.max_centripetal - metrics.max_centripetal_force) * w
        } else {
            0.0
        },
    );

    push(
        "velocity_match",
        (metrics.final_velocity - metrics.initial_velocity).abs() * w,
    );

    terms
}

/// Elapsed time plus every penalty term, coerced to the sentinel when infinite or negative.
pub fn penalized_objective(metrics: &SimulationMetrics, limits: &ConstraintLimits) -> f64 {
    let objective = penalty_terms(metrics, limits)
        .iter()
        .fold(metrics.time_elapsed, |acc, term| acc + term.value);

    // NaN fails the comparison as well
    if objective == f64::INFINITY || !(objective >= 0.0) {
        SENTINEL_COST
    } else {
        objective
    }
}

/// Strategy problem: simulator-backed, penalty-shaped objective over a bounded box
pub struct StrategyProblem<S: Simulator> {
    adapter: RefCell<SimulatorAdapter<S>>,
    limits: ConstraintLimits,
    bounds: Vec<(f64, f64)>,
}

impl<S: Simulator> StrategyProblem<S> {
    /// Every parameter is searched in `[0, max_velocity]`.
    pub fn new(adapter: SimulatorAdapter<S>, limits: ConstraintLimits, num_params: usize) -> Self {
        let bounds = vec![(0.0, limits.max_velocity); num_params];
        Self {
            adapter: RefCell::new(adapter),
            limits,
            bounds,
        }
    }

    pub fn limits(&self) -> &ConstraintLimits {
        &self.limits
    }

    /// Score one candidate. Unparseable output scores as the sentinel.
    pub fn objective(&self, params: &[f64]) -> f64 {
        let output = self.adapter.borrow_mut().evaluate(params);
        match SimulationMetrics::from_output(&output) {
            Ok(metrics) => penalized_objective(&metrics, &self.limits),
            Err(e) => {
                debug!("evaluation penalized: {}", e);
                SENTINEL_COST
            }
        }
    }

    pub fn clear_cache(&self) {
        self.adapter.borrow_mut().clear_cache();
    }

    /// Cached invocation with an explicit render mode.
    pub fn invoke(&self, params: &[f64], render: &RenderMode) -> String {
        self.adapter.borrow_mut().invoke(params, render).to_string()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.adapter.borrow().stats()
    }
}

impl<S: Simulator> Problem for StrategyProblem<S> {
    fn cost(&self, params: &[f64]) -> Result<f64, String> {
        Ok(self.objective(params))
    }

    fn num_params(&self) -> usize {
        self.bounds.len()
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }
}
