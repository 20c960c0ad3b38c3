use std::cell::RefCell;
use std::rc::Rc;
use strategy_optimizer::{Optimizer, RenderMode, RunConfig, Simulator, Strategy};

const FASTEST: [f64; 2] = [17.0, 23.0];

/// Canned simulator: quadratic time surface around `FASTEST`, with the reported
/// top speed `overspeed` above the 40 m/s cap.
struct TrackStub {
    overspeed: f64,
    renders: Rc<RefCell<Vec<RenderMode>>>,
}

impl TrackStub {
    fn new(overspeed: f64) -> Self {
        Self {
            overspeed,
            renders: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Simulator for TrackStub {
    fn invoke(&self, params: &[f64], render: &RenderMode) -> String {
        self.renders.borrow_mut().push(render.clone());
        let time: f64 = params
            .iter()
            .zip(FASTEST)
            .map(|(v, best)| ((v - best) / 10.0).powi(2))
            .sum();
        let max_velocity = if self.overspeed > 0.0 { 40.0 + self.overspeed } else { 30.0 };
        format!(
            "Initial Velocity (m/s):  10\n\
             Final Velocity (m/s):  10\n\
             Max Velocity (m/s):  {max_velocity}\n\
             Min Velocity (m/s):  0\n\
             Max Acceleration (m/s^2):  1.5\n\
             Min Acceleration (m/s^2):  -1.5\n\
             Max Centripetal Force (N):  0.4\n\
             Time Elapsed (s):  {time}\n\
             Energy Consumed (J):  4000\n\
             Energy Consumption (W):  800\n"
        )
    }

    fn expected_args(&self) -> Result<usize, String> {
        Ok(2)
    }
}

fn config() -> RunConfig {
    let mut config = RunConfig::default();
    config.search.verbose = false;
    config.search.seed = Some(3);
    config
}

#[test]
fn lattice_run_reaches_target() {
    let mut optimizer = Optimizer::new(config());
    let report = optimizer.run(TrackStub::new(0.0)).unwrap();

    assert_eq!(report.expected_args, 2);
    assert_eq!(report.bins_per_dimension, 4);
    assert!(report.converged, "{}", report.message);
    assert!(report.objective <= 0.01);
    for (v, best) in report.solution.iter().zip(FASTEST) {
        assert!((v - best).abs() < 1.5);
    }

    let metrics = report.metrics.as_ref().unwrap();
    assert_eq!(metrics.energy_consumption, 800.0);
    assert_eq!(report.violated_constraints().count(), 0);
    assert!(report.cache.misses >= 1);
}

#[test]
fn nelder_mead_cells_also_converge() {
    let mut config = config();
    config.search.strategy = Strategy::NelderMead;
    config.search.max_generations = 300;
    let mut optimizer = Optimizer::new(config);
    let report = optimizer.run(TrackStub::new(0.0)).unwrap();
    assert!(report.converged, "{}", report.message);
    for (v, best) in report.solution.iter().zip(FASTEST) {
        assert!((v - best).abs() < 1.5);
    }
}

#[test]
fn speed_violation_shows_in_penalties() {
    let mut config = config();
    config.search.max_evaluations = Some(40);
    let mut optimizer = Optimizer::new(config);
    let report = optimizer.run(TrackStub::new(2.0)).unwrap();

    assert!(!report.converged);
    assert_eq!(report.cost_evals, 40);
    assert!(report.objective >= 200.0);

    let violated: Vec<&str> = report
        .violated_constraints()
        .map(|term| term.name.as_str())
        .collect();
    assert_eq!(violated, vec!["max_velocity"]);
    assert_eq!(report.penalties.iter().find(|t| t.name == "max_velocity").unwrap().value, 200.0);
}

#[test]
fn final_run_uses_configured_render_token() {
    let mut config = config();
    config.search.max_evaluations = Some(25);
    config.simulator.final_render = "final".into();
    let stub = TrackStub::new(0.0);
    let renders = Rc::clone(&stub.renders);

    let mut optimizer = Optimizer::new(config);
    optimizer.run(stub).unwrap();

    let renders = renders.borrow();
    assert_eq!(renders.last(), Some(&RenderMode::Directive("final".into())));
    // the initial population launches in evaluation order: only the first renders
    assert_eq!(renders[0], RenderMode::Auto);
    assert!(renders[1..10].iter().all(|r| *r == RenderMode::Suppress));
}

#[test]
fn report_serializes_to_json() {
    let mut config = config();
    config.search.max_evaluations = Some(20);
    let mut optimizer = Optimizer::new(config);
    let report = optimizer.run(TrackStub::new(0.0)).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["expected_args"], 2);
    assert_eq!(json["cost_evals"], 20);
    assert!(json["final_output"].as_str().unwrap().contains("Time Elapsed (s):"));
}
