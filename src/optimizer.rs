use crate::config::RunConfig;
use crate::optimization::{
    LatticeSolver, ProgressMonitor, SolverResult, StrategyProblem, penalty_terms, select_solver,
};
use crate::simulation::{Simulator, SimulatorAdapter};
use crate::types::{RenderMode, RunReport, SimulationMetrics};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// The simulator's expected argument count could not be discovered
    Bootstrap(String),
    Solver(String),
}

impl fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrap(msg) => write!(f, "bootstrap failed: {}", msg),
            Self::Solver(msg) => write!(f, "solver failed: {}", msg),
        }
    }
}

impl std::error::Error for OptimizerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Setup,
    Searching,
    Reported,
}

/// Drives one optimization run: Setup -> Searching -> Reported.
pub struct Optimizer {
    config: RunConfig,
    phase: RunPhase,
    expected_args: usize,
    bins_per_dimension: usize,
}

impl Optimizer {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            phase: RunPhase::Idle,
            expected_args: 0,
            bins_per_dimension: 1,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn bins_per_dimension(&self) -> usize {
        self.bins_per_dimension
    }

    fn enter(&mut self, phase: RunPhase) {
        info!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    /// Probe the simulator for its dimensionality and build the bounded problem.
    pub fn setup<S: Simulator>(
        &mut self,
        simulator: S,
    ) -> Result<StrategyProblem<S>, OptimizerError> {
        self.enter(RunPhase::Setup);

        let adapter = SimulatorAdapter::new(simulator, self.config.simulator.calls_between_image);
        let expected_args = adapter.expected_args().map_err(OptimizerError::Bootstrap)?;
        if expected_args == 0 {
            return Err(OptimizerError::Bootstrap(
                "simulator expects no arguments, nothing to optimize".into(),
            ));
        }

        self.expected_args = expected_args;
        self.bins_per_dimension =
            LatticeSolver::bins_for(self.config.search.lattice_points, expected_args);
        info!(
            params = expected_args,
            bins = self.bins_per_dimension,
            upper_bound = self.config.limits.max_velocity,
            "problem configured"
        );

        Ok(StrategyProblem::new(
            adapter,
            self.config.limits.clone(),
            expected_args,
        ))
    }

    /// Run the lattice solver over `problem` until the value to reach or another stop fires.
    pub fn search<S: Simulator>(
        &mut self,
        problem: &StrategyProblem<S>,
    ) -> Result<SolverResult, OptimizerError> {
        if self.phase != RunPhase::Setup {
            return Err(OptimizerError::Solver(format!(
                "search cannot start from phase {:?}",
                self.phase
            )));
        }
        self.enter(RunPhase::Searching);

        let search = &self.config.search;
        let (mut solver, reason) = select_solver(search, self.expected_args);
        info!("{}", reason);

        let mut monitor = ProgressMonitor::new(search.report_interval, search.verbose)
            .with_max_evaluations(search.max_evaluations);

        let result = solver
            .solve(problem, &mut monitor)
            .map_err(OptimizerError::Solver)?;

        info!(
            success = result.success,
            cost = result.cost,
            evals = result.cost_evals,
            cells = result.cells_searched,
            "search finished: {}",
            result.message
        );
        if search.verbose {
            monitor.print_summary(result.success, &result.message);
        }

        Ok(result)
    }

    /// Rescore the best candidate, then rerun it once on a cleared cache with the
    /// final render mode.
    pub fn report<S: Simulator>(
        &mut self,
        problem: &StrategyProblem<S>,
        result: SolverResult,
    ) -> RunReport {
        self.enter(RunPhase::Reported);

        let objective = problem.objective(&result.params);
        problem.clear_cache();

        let render = RenderMode::from_arg(&self.config.simulator.final_render);
        let final_output = problem.invoke(&result.params, &render);

        let metrics = match SimulationMetrics::from_output(&final_output) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!("final run could not be parsed: {}", e);
                None
            }
        };
        let penalties = metrics
            .as_ref()
            .map(|m| penalty_terms(m, problem.limits()))
            .unwrap_or_default();

        RunReport {
            expected_args: self.expected_args,
            bins_per_dimension: self.bins_per_dimension,
            solution: result.params,
            objective,
            converged: result.success,
            message: result.message,
            cost_evals: result.cost_evals,
            cells_searched: result.cells_searched,
            metrics,
            penalties,
            cache: problem.cache_stats(),
            final_output,
        }
    }

    /// Full run against `simulator`, printing the result.
    pub fn run<S: Simulator>(&mut self, simulator: S) -> Result<RunReport, OptimizerError> {
        let problem = self.setup(simulator)?;
        let result = self.search(&problem)?;
        let report = self.report(&problem, result);
        print_report(&report);
        Ok(report)
    }
}

pub fn print_report(report: &RunReport) {
    println!("Optimized Result: {:?}", report.solution);
    println!("Objective Value: {}", report.objective);

    let violated: Vec<String> = report
        .violated_constraints()
        .map(|term| format!("{} ({:+.3})", term.name, term.value))
        .collect();
    if !violated.is_empty() {
        println!("Penalized: {}", violated.join(", "));
    }
    println!(
        "Evaluations: {} ({} cells, cache {} hits / {} misses)",
        report.cost_evals, report.cells_searched, report.cache.hits, report.cache.misses
    );

    println!("{}", report.final_output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::Problem;
    use crate::simulation::stub::{report, ScriptedSimulator};
    use std::cell::Cell;
    use std::rc::Rc;

    fn quiet_config() -> RunConfig {
        let mut config = RunConfig::default();
        config.search.verbose = false;
        config.search.seed = Some(7);
        config
    }

    #[test]
    fn setup_derives_bounds_and_lattice() {
        let mut optimizer = Optimizer::new(quiet_config());
        let problem = optimizer
            .setup(ScriptedSimulator::new(2, |_| report(5.0, 10.0)))
            .unwrap();
        assert_eq!(problem.bounds(), &[(0.0, 40.0), (0.0, 40.0)]);
        assert_eq!(optimizer.bins_per_dimension(), 4);
        assert_eq!(optimizer.phase(), RunPhase::Setup);
        assert_eq!(problem.objective(&[10.0, 10.0]), 5.0);
    }

    #[test]
    fn over_speed_adds_penalty() {
        let mut optimizer = Optimizer::new(quiet_config());
        let problem = optimizer
            .setup(ScriptedSimulator::new(2, |_| report(5.0, 45.0)))
            .unwrap();
        assert_eq!(problem.objective(&[10.0, 10.0]), 505.0);
    }

    #[test]
    fn unknown_arity_is_bootstrap_error() {
        let mut simulator = ScriptedSimulator::new(2, |_| String::new());
        simulator.arity = Err("missing marker".into());
        let mut optimizer = Optimizer::new(quiet_config());
        assert!(matches!(
            optimizer.setup(simulator),
            Err(OptimizerError::Bootstrap(_))
        ));

        let mut optimizer = Optimizer::new(quiet_config());
        assert!(matches!(
            optimizer.setup(ScriptedSimulator::new(0, |_| String::new())),
            Err(OptimizerError::Bootstrap(_))
        ));
    }

    #[test]
    fn search_requires_setup() {
        let mut optimizer = Optimizer::new(quiet_config());
        let mut other = Optimizer::new(quiet_config());
        let problem = other
            .setup(ScriptedSimulator::new(2, |_| report(5.0, 10.0)))
            .unwrap();
        assert!(matches!(
            optimizer.search(&problem),
            Err(OptimizerError::Solver(_))
        ));
    }

    #[test]
    fn converges_to_fastest_feasible_candidate() {
        let mut optimizer = Optimizer::new(quiet_config());
        let report = optimizer
            .run(ScriptedSimulator::new(2, |p| {
                let time = ((p[0] - 25.0) / 10.0).powi(2) + ((p[1] - 15.0) / 10.0).powi(2);
                report(time, 10.0)
            }))
            .unwrap();
        assert!(report.converged);
        assert!(report.objective <= 0.01);
        assert!((report.solution[0] - 25.0).abs() < 1.5);
        assert!((report.solution[1] - 15.0).abs() < 1.5);
        assert!(report.metrics.is_some());
        assert_eq!(report.violated_constraints().count(), 0);
        assert_eq!(optimizer.phase(), RunPhase::Reported);
    }

    #[test]
    fn final_run_is_not_served_from_cache() {
        let launches = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&launches);
        let simulator = ScriptedSimulator::new(2, move |_| {
            counter.set(counter.get() + 1);
            format!("{}Launch: {}\n", report(5.0, 10.0), counter.get())
        });

        let mut config = quiet_config();
        config.search.max_evaluations = Some(60);
        let mut optimizer = Optimizer::new(config);
        let problem = optimizer.setup(simulator).unwrap();
        let result = optimizer.search(&problem).unwrap();
        assert_eq!(result.message, "Stopped by callback");
        assert_eq!(result.cost_evals, 60);

        let report = optimizer.report(&problem, result);
        let total = launches.get();
        assert!(total > 1);
        assert!(report.final_output.contains(&format!("Launch: {}\n", total)));
        assert_eq!(report.cache.misses, total as u64);
        assert_eq!(report.cache.entries, 1);
        assert_eq!(report.objective, 5.0);
        assert!(!report.converged);
    }
}
