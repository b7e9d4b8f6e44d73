//! Generational genetic algorithm with tournament selection.

use rand::Rng;
use rand::RngCore;

use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

use super::{OptimizationProblem, Optimizer, Parameter};

/// Tournament-selected, uniformly crossed, per-gene mutated GA with full
/// generational replacement.
#[derive(Debug, Clone, Copy)]
pub struct GeneticAlgorithm {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generations to evolve.
    pub generations: usize,
    /// Per-gene probability of re-randomizing within bounds.
    pub mutation_rate: Scalar,
    /// Probability that a selected pair undergoes crossover.
    pub crossover_rate: Scalar,
    /// Individuals drawn per tournament.
    pub tournament_size: usize,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 50,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            tournament_size: 3,
        }
    }
}

impl GeneticAlgorithm {
    fn validate(&self) -> Result<()> {
        if self.population_size < 2 || self.generations == 0 || self.tournament_size == 0 {
            return Err(CircuitError::InvalidConfiguration(
                "GA needs population >= 2, generations >= 1, tournament >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate)
            || !(0.0..=1.0).contains(&self.crossover_rate)
        {
            return Err(CircuitError::InvalidConfiguration(
                "GA rates must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    fn tournament_select<'p>(
        &self,
        population: &'p [Vec<Scalar>],
        fitness: &[Scalar],
        rng: &mut dyn RngCore,
    ) -> &'p [Scalar] {
        let mut winner = rng.gen_range(0..population.len());
        for _ in 1..self.tournament_size {
            let challenger = rng.gen_range(0..population.len());
            if fitness[challenger] > fitness[winner] {
                winner = challenger;
            }
        }
        &population[winner]
    }
}

impl Optimizer for GeneticAlgorithm {
    fn optimize(
        &self,
        problem: &mut OptimizationProblem<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Parameter>> {
        self.validate()?;
        let _span = tracing::info_span!(
            "genetic_algorithm",
            population = self.population_size,
            generations = self.generations
        )
        .entered();

        let mut population: Vec<Vec<Scalar>> = (0..self.population_size)
            .map(|_| problem.random_point(rng))
            .collect();
        let mut fitness: Vec<Scalar> = population.iter().map(|x| problem.fitness(x)).collect();

        let mut best = population[0].clone();
        let mut best_fitness = fitness[0];
        record_best(&population, &fitness, &mut best, &mut best_fitness);

        for generation in 0..self.generations {
            let mut next = Vec::with_capacity(self.population_size);
            while next.len() < self.population_size {
                let mut child1 = self.tournament_select(&population, &fitness, rng).to_vec();
                let mut child2 = self.tournament_select(&population, &fitness, rng).to_vec();

                if rng.gen_range(0.0..1.0) < self.crossover_rate {
                    // Uniform crossover: each gene swaps with probability 1/2.
                    for gene in 0..problem.dimension() {
                        if rng.gen_range(0.0..1.0) < 0.5 {
                            std::mem::swap(&mut child1[gene], &mut child2[gene]);
                        }
                    }
                }

                for child in [&mut child1, &mut child2] {
                    for (gene, p) in child.iter_mut().zip(problem.parameters()) {
                        if rng.gen_range(0.0..1.0) < self.mutation_rate {
                            *gene = rng.gen_range(p.min..=p.max);
                        }
                    }
                }

                next.push(child1);
                if next.len() < self.population_size {
                    next.push(child2);
                }
            }

            population = next;
            fitness = population.iter().map(|x| problem.fitness(x)).collect();
            record_best(&population, &fitness, &mut best, &mut best_fitness);
            tracing::debug!(generation, best_fitness, "GA generation complete");
        }

        Ok(problem.with_values(&best))
    }
}

fn record_best(
    candidates: &[Vec<Scalar>],
    scores: &[Scalar],
    best: &mut Vec<Scalar>,
    best_fitness: &mut Scalar,
) {
    for (x, &f) in candidates.iter().zip(scores) {
        if f > *best_fitness {
            *best_fitness = f;
            best.clone_from(x);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::optimizer::test_support::target_five;

    #[test]
    fn converges_on_the_target_fixture() {
        let mut problem = target_five();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let best = GeneticAlgorithm::default()
            .optimize(&mut problem, &mut rng)
            .unwrap();
        assert!((best[0].value - 5.0).abs() < 0.1, "best {}", best[0].value);
    }

    #[test]
    fn fixed_seed_reproduces_the_run() {
        let run = |seed: u64| {
            let mut problem = target_five();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            GeneticAlgorithm::default()
                .optimize(&mut problem, &mut rng)
                .unwrap()[0]
                .value
        };
        assert_eq!(run(7).to_bits(), run(7).to_bits());
    }

    #[test]
    fn degenerate_configuration_is_rejected() {
        let mut problem = target_five();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bad = GeneticAlgorithm {
            population_size: 1,
            ..GeneticAlgorithm::default()
        };
        assert!(bad.optimize(&mut problem, &mut rng).is_err());
    }
}
