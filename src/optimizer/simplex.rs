//! Nelder-Mead downhill simplex.

use rand::RngCore;

use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

use super::{OptimizationProblem, Optimizer, Parameter};

/// Derivative-free simplex search with the standard reflect / expand /
/// contract / shrink moves. The RNG seeds only the starting simplex; the
/// iteration itself is deterministic.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    /// Reflection coefficient α.
    pub alpha: Scalar,
    /// Expansion coefficient γ.
    pub gamma: Scalar,
    /// Contraction coefficient ρ.
    pub rho: Scalar,
    /// Shrink coefficient σ.
    pub sigma: Scalar,
    /// Convergence tolerance on the spread of simplex values.
    pub tolerance: Scalar,
    /// Iteration budget.
    pub max_iterations: usize,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            tolerance: 1e-6,
            max_iterations: 1000,
        }
    }
}

impl NelderMead {
    fn reflect(
        problem: &OptimizationProblem<'_>,
        centroid: &[Scalar],
        worst: &[Scalar],
        coefficient: Scalar,
    ) -> Vec<Scalar> {
        let mut point: Vec<Scalar> = centroid
            .iter()
            .zip(worst)
            .map(|(&c, &w)| c + coefficient * (c - w))
            .collect();
        problem.clamp(&mut point);
        point
    }
}

impl Optimizer for NelderMead {
    fn optimize(
        &self,
        problem: &mut OptimizationProblem<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Parameter>> {
        if self.max_iterations == 0 || self.tolerance <= 0.0 {
            return Err(CircuitError::InvalidConfiguration(
                "Nelder-Mead needs a positive tolerance and iteration budget".into(),
            ));
        }
        let _span = tracing::info_span!("nelder_mead", budget = self.max_iterations).entered();

        let dim = problem.dimension();

        // Simplex of dim+1 points: a random seed vertex plus one vertex
        // offset by 5 % of each bound span. Values are energies (−fitness).
        let seed = problem.random_point(rng);
        let mut simplex = vec![seed];
        for d in 0..dim {
            let mut vertex = simplex[0].clone();
            vertex[d] += 0.05 * problem.parameters()[d].range();
            problem.clamp(&mut vertex);
            simplex.push(vertex);
        }
        let mut values: Vec<Scalar> = simplex.iter().map(|x| -problem.fitness(x)).collect();

        for _iteration in 0..self.max_iterations {
            // Order vertices best-first.
            let mut order: Vec<usize> = (0..simplex.len()).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

            let worst = order[order.len() - 1];
            let spread = values[worst] - values[order[0]];
            if spread < self.tolerance {
                break;
            }

            // Centroid of all but the worst vertex.
            let mut centroid = vec![0.0; dim];
            for &idx in &order[..order.len() - 1] {
                for d in 0..dim {
                    centroid[d] += simplex[idx][d];
                }
            }
            for value in &mut centroid {
                *value /= (simplex.len() - 1) as Scalar;
            }

            let reflected = Self::reflect(problem, &centroid, &simplex[worst], self.alpha);
            let reflected_value = -problem.fitness(&reflected);
            let second_worst_value = values[order[order.len() - 2]];

            if reflected_value < second_worst_value && reflected_value >= values[order[0]] {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            } else if reflected_value < values[order[0]] {
                // Expand past the reflection.
                let expanded = Self::reflect(problem, &centroid, &simplex[worst], self.gamma);
                let expanded_value = -problem.fitness(&expanded);
                if expanded_value < reflected_value {
                    simplex[worst] = expanded;
                    values[worst] = expanded_value;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = reflected_value;
                }
            } else {
                // Contract toward the centroid.
                let contracted = Self::reflect(problem, &centroid, &simplex[worst], -self.rho);
                let contracted_value = -problem.fitness(&contracted);
                if contracted_value < values[worst] {
                    simplex[worst] = contracted;
                    values[worst] = contracted_value;
                } else {
                    // Shrink everything toward the best vertex.
                    let best = order[0];
                    let anchor = simplex[best].clone();
                    for idx in 0..simplex.len() {
                        if idx == best {
                            continue;
                        }
                        for d in 0..dim {
                            simplex[idx][d] =
                                anchor[d] + self.sigma * (simplex[idx][d] - anchor[d]);
                        }
                        values[idx] = -problem.fitness(&simplex[idx]);
                    }
                }
            }
        }

        let best_index = values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Ok(problem.with_values(&simplex[best_index]))
    }
}
