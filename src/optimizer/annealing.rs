//! Simulated annealing with geometric cooling and Metropolis acceptance.

use rand::Rng;
use rand::RngCore;

use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

use super::{OptimizationProblem, Optimizer, Parameter};

/// Single-solution annealer. Neighbors are uniform perturbations scaled by
/// the current temperature relative to the starting temperature, so the walk
/// contracts as the schedule cools.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedAnnealing {
    /// Starting temperature.
    pub initial_temperature: Scalar,
    /// Temperature at which the schedule stops.
    pub final_temperature: Scalar,
    /// Geometric cooling factor per temperature step, in (0, 1).
    pub cooling_rate: Scalar,
    /// Candidate moves evaluated at each temperature.
    pub iterations_per_temperature: usize,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            final_temperature: 1e-5,
            cooling_rate: 0.95,
            iterations_per_temperature: 50,
        }
    }
}

impl Optimizer for SimulatedAnnealing {
    fn optimize(
        &self,
        problem: &mut OptimizationProblem<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Parameter>> {
        if self.initial_temperature <= self.final_temperature
            || self.final_temperature <= 0.0
            || !(0.0..1.0).contains(&self.cooling_rate)
            || self.iterations_per_temperature == 0
        {
            return Err(CircuitError::InvalidConfiguration(
                "SA needs 0 < final < initial temperature, cooling in (0, 1), \
                 and at least one move per temperature"
                    .into(),
            ));
        }
        let _span = tracing::info_span!("simulated_annealing").entered();

        // Annealing minimizes energy = −fitness.
        let mut current = problem.random_point(rng);
        let mut current_energy = -problem.fitness(&current);
        let mut best = current.clone();
        let mut best_energy = current_energy;

        let mut temperature = self.initial_temperature;
        while temperature > self.final_temperature {
            for _ in 0..self.iterations_per_temperature {
                // Temperature-scaled uniform neighborhood.
                let scale = temperature / self.initial_temperature;
                let mut neighbor = current.clone();
                for (value, p) in neighbor.iter_mut().zip(problem.parameters()) {
                    let span = p.range() * scale;
                    *value += rng.gen_range(-span..=span);
                }
                problem.clamp(&mut neighbor);

                let neighbor_energy = -problem.fitness(&neighbor);
                let delta = neighbor_energy - current_energy;
                let accept = delta < 0.0
                    || rng.gen_range(0.0..1.0) < (-delta / temperature).exp();
                if accept {
                    current = neighbor;
                    current_energy = neighbor_energy;
                    if current_energy < best_energy {
                        best_energy = current_energy;
                        best.clone_from(&current);
                    }
                }
            }
            temperature *= self.cooling_rate;
            tracing::debug!(temperature, best_energy, "annealing step complete");
        }

        Ok(problem.with_values(&best))
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
        let best = SimulatedAnnealing::default()
            .optimize(&mut problem, &mut rng)
            .unwrap();
        assert!((best[0].value - 5.0).abs() < 0.05, "best {}", best[0].value);
    }

    #[test]
    fn inverted_schedule_is_rejected() {
        let mut problem = target_five();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bad = SimulatedAnnealing {
            initial_temperature: 1e-6,
            ..SimulatedAnnealing::default()
        };
        assert!(bad.optimize(&mut problem, &mut rng).is_err());
    }
}
