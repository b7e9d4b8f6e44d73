//! Particle swarm optimization with the standard inertia/cognitive/social
//! velocity update.

use rand::Rng;
use rand::RngCore;

use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

use super::{OptimizationProblem, Optimizer, Parameter};

/// Global-best PSO; positions are clamped to the bounds every iteration.
#[derive(Debug, Clone, Copy)]
pub struct ParticleSwarm {
    /// Number of particles.
    pub swarm_size: usize,
    /// Iterations to run.
    pub iterations: usize,
    /// Inertia weight w.
    pub inertia: Scalar,
    /// Cognitive acceleration c1 (pull toward the particle's own best).
    pub cognitive: Scalar,
    /// Social acceleration c2 (pull toward the global best).
    pub social: Scalar,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self {
            swarm_size: 50,
            iterations: 100,
            inertia: 0.7,
            cognitive: 1.4,
            social: 1.4,
        }
    }
}

impl Optimizer for ParticleSwarm {
    fn optimize(
        &self,
        problem: &mut OptimizationProblem<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Parameter>> {
        if self.swarm_size == 0 || self.iterations == 0 {
            return Err(CircuitError::InvalidConfiguration(
                "PSO needs a non-empty swarm and at least one iteration".into(),
            ));
        }
        let _span = tracing::info_span!(
            "particle_swarm",
            swarm = self.swarm_size,
            iterations = self.iterations
        )
        .entered();

        let dim = problem.dimension();
        let mut positions: Vec<Vec<Scalar>> = (0..self.swarm_size)
            .map(|_| problem.random_point(rng))
            .collect();
        // Velocities start small relative to each bound span.
        let mut velocities: Vec<Vec<Scalar>> = (0..self.swarm_size)
            .map(|_| {
                problem
                    .parameters()
                    .iter()
                    .map(|p| rng.gen_range(-p.range() / 10.0..=p.range() / 10.0))
                    .collect()
            })
            .collect();

        let mut personal_best = positions.clone();
        let mut personal_fitness: Vec<Scalar> =
            positions.iter().map(|x| problem.fitness(x)).collect();

        let mut global_best = personal_best[0].clone();
        let mut global_fitness = personal_fitness[0];
        for (x, &f) in personal_best.iter().zip(&personal_fitness) {
            if f > global_fitness {
                global_fitness = f;
                global_best.clone_from(x);
            }
        }

        for iteration in 0..self.iterations {
            for i in 0..self.swarm_size {
                for d in 0..dim {
                    let r1: Scalar = rng.gen_range(0.0..1.0);
                    let r2: Scalar = rng.gen_range(0.0..1.0);
                    velocities[i][d] = self.inertia * velocities[i][d]
                        + self.cognitive * r1 * (personal_best[i][d] - positions[i][d])
                        + self.social * r2 * (global_best[d] - positions[i][d]);
                    positions[i][d] += velocities[i][d];
                }
                problem.clamp(&mut positions[i]);

                let fitness = problem.fitness(&positions[i]);
                if fitness > personal_fitness[i] {
                    personal_fitness[i] = fitness;
                    personal_best[i].clone_from(&positions[i]);
                    if fitness > global_fitness {
                        global_fitness = fitness;
                        global_best.clone_from(&positions[i]);
                    }
                }
            }
            tracing::debug!(iteration, global_fitness, "PSO iteration complete");
        }

        Ok(problem.with_values(&global_best))
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
        let best = ParticleSwarm::default()
            .optimize(&mut problem, &mut rng)
            .unwrap();
        assert!((best[0].value - 5.0).abs() < 0.05, "best {}", best[0].value);
    }

    #[test]
    fn empty_swarm_is_rejected() {
        let mut problem = target_five();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bad = ParticleSwarm {
            swarm_size: 0,
            ..ParticleSwarm::default()
        };
        assert!(bad.optimize(&mut problem, &mut rng).is_err());
    }
}
