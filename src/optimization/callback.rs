use super::solvers::traits::OptimizationCallback;

/// Best-so-far snapshot recorded at a reporting interval
#[derive(Debug, Clone)]
pub struct IterationResult {
    pub evaluation: u64,
    pub params: Vec<f64>,
    pub cost: f64,
}

/// Prints the best objective every `interval` evaluations and enforces an optional budget
pub struct ProgressMonitor {
    verbose: bool,
    interval: u64,
    max_evaluations: Option<u64>,
    evaluations: u64,
    history: Vec<IterationResult>,
}

impl ProgressMonitor {
    pub fn new(interval: u64, verbose: bool) -> Self {
        Self {
            verbose,
            interval: interval.max(1),
            max_evaluations: None,
            evaluations: 0,
            history: Vec::new(),
        }
    }

    pub fn with_max_evaluations(mut self, max_evaluations: Option<u64>) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Snapshots taken at each reporting interval
    pub fn history(&self) -> &[IterationResult] {
        &self.history
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Print optimization summary
    pub fn print_summary(&self, success: bool, stop_reason: &str) {
        println!("\n{}", "=".repeat(80));
        println!("OPTIMIZATION SUMMARY");
        println!("{}", "=".repeat(80));

        println!(
            "\nStatus: {}",
            if success { "✓ TARGET REACHED" } else { "✗ TARGET NOT REACHED" }
        );
        println!("Stop Reason: {}", stop_reason);
        println!("Total Evaluations: {}", self.evaluations);

        if !self.history.is_empty() {
            println!("\n{:<12} {:<20}", "Evaluation", "Best Objective");
            println!("{}", "-".repeat(34));
            for result in &self.history {
                println!("{:<12} {:<20.6e}", result.evaluation, result.cost);
            }
        }

        println!("\n{}\n", "=".repeat(80));
    }
}

impl OptimizationCallback for ProgressMonitor {
    fn on_iteration(&mut self, evaluation: u64, params: &[f64], cost: f64) -> Result<(), String> {
        self.evaluations = evaluation;

        if evaluation % self.interval == 0 {
            self.history.push(IterationResult {
                evaluation,
                params: params.to_vec(),
                cost,
            });
            if self.verbose {
                println!("Evaluation {:>6}: best objective = {:.6e}", evaluation, cost);
            }
        }

        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.max_evaluations
            .is_some_and(|max| self.evaluations >= max)
    }
}
