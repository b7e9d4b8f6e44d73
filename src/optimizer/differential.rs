//! Differential evolution (DE/rand/1/bin) with greedy replacement.

use rand::Rng;
use rand::RngCore;

use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

use super::{OptimizationProblem, Optimizer, Parameter};

/// Classic DE: trial vectors from `x_r1 + F·(x_r2 − x_r3)` with binomial
/// crossover and one forced gene, accepted only when they improve.
#[derive(Debug, Clone, Copy)]
pub struct DifferentialEvolution {
    /// Population size (at least four distinct vectors are required).
    pub population_size: usize,
    /// Generations to evolve.
    pub generations: usize,
    /// Differential weight F.
    pub differential_weight: Scalar,
    /// Crossover probability CR.
    pub crossover_probability: Scalar,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            differential_weight: 0.8,
            crossover_probability: 0.9,
        }
    }
}

impl Optimizer for DifferentialEvolution {
    fn optimize(
        &self,
        problem: &mut OptimizationProblem<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Parameter>> {
        if self.population_size < 4 || self.generations == 0 {
            return Err(CircuitError::InvalidConfiguration(
                "DE needs population >= 4 and generations >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(CircuitError::InvalidConfiguration(
                "DE crossover probability must lie in [0, 1]".into(),
            ));
        }
        let _span = tracing::info_span!(
            "differential_evolution",
            population = self.population_size,
            generations = self.generations
        )
        .entered();

        let dim = problem.dimension();
        let mut population: Vec<Vec<Scalar>> = (0..self.population_size)
            .map(|_| problem.random_point(rng))
            .collect();
        let mut fitness: Vec<Scalar> = population.iter().map(|x| problem.fitness(x)).collect();

        for generation in 0..self.generations {
            for i in 0..self.population_size {
                // Three distinct donors, all different from the target.
                let mut pick = || rng.gen_range(0..self.population_size);
                let (r1, r2, r3) = loop {
                    let (a, b, c) = (pick(), pick(), pick());
                    if a != b && b != c && a != c && a != i && b != i && c != i {
                        break (a, b, c);
                    }
                };

                let forced = rng.gen_range(0..dim);
                let mut trial = population[i].clone();
                for gene in 0..dim {
                    if gene == forced
                        || rng.gen_range(0.0..1.0) < self.crossover_probability
                    {
                        trial[gene] = population[r1][gene]
                            + self.differential_weight
                                * (population[r2][gene] - population[r3][gene]);
                    }
                }
                problem.clamp(&mut trial);

                let trial_fitness = problem.fitness(&trial);
                if trial_fitness > fitness[i] {
                    population[i] = trial;
                    fitness[i] = trial_fitness;
                }
            }
            if generation % 10 == 0 {
                let best = fitness.iter().copied().fold(Scalar::NEG_INFINITY, Scalar::max);
                tracing::debug!(generation, best, "DE generation complete");
            }
        }

        let best_index = fitness
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Ok(problem.with_values(&population[best_index]))
    }
}
