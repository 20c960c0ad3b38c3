use super::evaluator::Evaluator;
use super::lattice::LocalSearch;
use super::traits::clamp_params;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_STAGNATION: u32 = 10;
const STAGNATION_TOLERANCE: f64 = 1e-9;

/// Differential evolution with the Best1Bin strategy: mutants are built around
/// the best member of the population and recombined with binomial crossover.
pub struct DifferentialEvolution {
    population_size: usize,
    max_generations: u32,
    crossover: f64, // CR - probability of taking the mutant coordinate
    scaling: f64,   // F - difference vector weight
    rng: StdRng,
}

impl DifferentialEvolution {
    pub fn new(population_size: usize, max_generations: u32) -> Self {
        Self {
            // Best1Bin needs the target plus two distinct donors
            population_size: population_size.max(4),
            max_generations,
            crossover: 0.9,
            scaling: 0.8,
            rng: StdRng::from_entropy(),
        }
    }

    /// Configure DE parameters (defaults: CR=0.9, F=0.8)
    pub fn with_de_params(mut self, crossover: f64, scaling: f64) -> Self {
        self.crossover = crossover;
        self.scaling = scaling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Population spread uniformly over the cell, first member at its center
    fn initialize_population(&mut self, cell: &[(f64, f64)]) -> Vec<Vec<f64>> {
        let mut population = Vec::with_capacity(self.population_size);
        population.push(cell.iter().map(|&(min, max)| 0.5 * (min + max)).collect());

        for _ in 1..self.population_size {
            let member = cell
                .iter()
                .map(|&(min, max)| self.rng.gen_range(min..=max))
                .collect();
            population.push(member);
        }

        population
    }

    /// Two distinct donor indices, both different from `target`
    fn pick_donors(&mut self, target: usize) -> (usize, usize) {
        let np = self.population_size;
        let mut r1 = self.rng.gen_range(0..np);
        while r1 == target {
            r1 = self.rng.gen_range(0..np);
        }
        let mut r2 = self.rng.gen_range(0..np);
        while r2 == target || r2 == r1 {
            r2 = self.rng.gen_range(0..np);
        }
        (r1, r2)
    }
}

impl LocalSearch for DifferentialEvolution {
    fn name(&self) -> &str {
        "Best1Bin"
    }

    fn search(
        &mut self,
        cell: &[(f64, f64)],
        evaluator: &mut Evaluator<'_, '_>,
    ) -> Result<u32, String> {
        let n = cell.len();
        let mut population = self.initialize_population(cell);
        let mut costs = Vec::with_capacity(self.population_size);

        for member in &population {
            costs.push(evaluator.evaluate(member)?);
            if evaluator.stopped() {
                return Ok(0);
            }
        }

        let mut best_idx = 0;
        for (i, &cost) in costs.iter().enumerate() {
            if cost < costs[best_idx] {
                best_idx = i;
            }
        }

        let mut stagnation_counter = 0;

        for generation in 0..self.max_generations {
            let prev_best = costs[best_idx];

            for i in 0..self.population_size {
                let (r1, r2) = self.pick_donors(i);
                let forced = self.rng.gen_range(0..n);

                let mut trial = population[i].clone();
                for j in 0..n {
                    if j == forced || self.rng.gen_range(0.0..1.0) < self.crossover {
                        trial[j] = population[best_idx][j]
                            + self.scaling * (population[r1][j] - population[r2][j]);
                    }
                }
                clamp_params(&mut trial, cell);

                let cost = evaluator.evaluate(&trial)?;
                if cost <= costs[i] {
                    population[i] = trial;
                    costs[i] = cost;
                    if cost < costs[best_idx] {
                        best_idx = i;
                    }
                }

                if evaluator.stopped() {
                    return Ok(generation + 1);
                }
            }

            if (prev_best - costs[best_idx]).abs() < STAGNATION_TOLERANCE {
                stagnation_counter += 1;
                if stagnation_counter >= MAX_STAGNATION {
                    return Ok(generation + 1);
                }
            } else {
                stagnation_counter = 0;
            }
        }

        Ok(self.max_generations)
    }
}

#[cfg(test)]
mod tests {
    use super::super::traits::{OptimizationCallback, Problem, ValueToReach};
    use super::*;

    struct Bowl {
        bounds: Vec<(f64, f64)>,
    }

    impl Problem for Bowl {
        fn cost(&self, params: &[f64]) -> Result<f64, String> {
            Ok(params.iter().map(|x| (x - 3.0).powi(2)).sum())
        }
        fn num_params(&self) -> usize {
            self.bounds.len()
        }
        fn bounds(&self) -> &[(f64, f64)] {
            &self.bounds
        }
    }

    struct Quiet;

    impl OptimizationCallback for Quiet {
        fn on_iteration(&mut self, _: u64, _: &[f64], _: f64) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn converges_inside_cell() {
        let problem = Bowl {
            bounds: vec![(0.0, 5.0); 2],
        };
        let mut quiet = Quiet;
        let mut evaluator = Evaluator::new(&problem, &mut quiet, ValueToReach::new(0.0, 1e-3));
        let mut de = DifferentialEvolution::new(12, 200).with_seed(7);
        de.search(problem.bounds(), &mut evaluator).unwrap();
        assert!(evaluator.stopped());
        assert!(evaluator.best_cost() <= 1e-3);
    }

    #[test]
    fn trials_stay_in_cell() {
        let problem = Bowl {
            bounds: vec![(0.0, 40.0); 3],
        };
        let cell = vec![(10.0, 20.0); 3];
        let mut quiet = Quiet;
        let mut evaluator = Evaluator::new(&problem, &mut quiet, ValueToReach::new(0.0, 1e-4));
        let mut de = DifferentialEvolution::new(6, 15).with_seed(1);
        de.search(&cell, &mut evaluator).unwrap();
        assert!(evaluator
            .best_params()
            .iter()
            .all(|&x| (10.0..=20.0).contains(&x)));
        // optimum sits outside the cell, so the best corner is (10, 10, 10)
        assert!(evaluator.best_cost() >= 3.0 * 49.0);
        assert!(!evaluator.stopped());
    }

    #[test]
    fn donors_are_distinct() {
        let mut de = DifferentialEvolution::new(4, 1).with_seed(3);
        for target in 0..4 {
            let (r1, r2) = de.pick_donors(target);
            assert_ne!(r1, target);
            assert_ne!(r2, target);
            assert_ne!(r1, r2);
        }
    }
}
