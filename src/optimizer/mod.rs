//! Parameter-tuning metaheuristics over a caller-supplied measurement.
//!
//! All five strategies share one contract: bounded [`Parameter`]s, weighted
//! [`Objective`]s, and a measurement closure returning one value per
//! objective (typically obtained by applying the parameter vector to a live
//! circuit and re-solving). Fitness is the weighted signed sum — minimize
//! contributes negatively, maximize positively, target as negated distance.
//!
//! Strategies are independent values behind the [`Optimizer`] trait, selected
//! by configuration rather than subclassing, and every stochastic one takes
//! an injected RNG so runs are reproducible under a fixed seed:
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use rflab::optimizer::{
//!     DifferentialEvolution, Objective, OptimizationProblem, Optimizer, Parameter,
//! };
//!
//! let parameters = vec![Parameter::new("x", 0.0, 10.0, 2.0)];
//! let objectives = vec![Objective::target("x", 5.0, 1.0)];
//! let mut problem =
//!     OptimizationProblem::new(parameters, objectives, |x| vec![x[0]]).unwrap();
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let best = DifferentialEvolution::default()
//!     .optimize(&mut problem, &mut rng)
//!     .unwrap();
//! assert!((best[0].value - 5.0).abs() < 0.01);
//! ```

mod annealing;
mod differential;
mod genetic;
mod simplex;
mod swarm;

pub use annealing::SimulatedAnnealing;
pub use differential::DifferentialEvolution;
pub use genetic::GeneticAlgorithm;
pub use simplex::NelderMead;
pub use swarm::ParticleSwarm;

use rand::Rng;
use rand::RngCore;

use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

/// One tunable quantity with inclusive bounds. Invariant: `value` always
/// lies in `[min, max]`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name (typically `component.parameter`).
    pub name: String,
    /// Lower bound.
    pub min: Scalar,
    /// Upper bound.
    pub max: Scalar,
    /// Current value, kept within the bounds.
    pub value: Scalar,
}

impl Parameter {
    /// Creates a parameter, clamping the initial value into the bounds.
    #[must_use]
    pub fn new(name: impl Into<String>, min: Scalar, max: Scalar, initial: Scalar) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            value: initial.clamp(min, max),
        }
    }

    /// Bound span `max - min`.
    #[must_use]
    pub fn range(&self) -> Scalar {
        self.max - self.min
    }
}

/// Direction of one optimization objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    /// Smaller measured values are better.
    Minimize,
    /// Larger measured values are better.
    Maximize,
    /// Values closest to the target are better.
    Target(Scalar),
}

/// A named, weighted objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Objective name for reporting.
    pub name: String,
    /// Optimization direction.
    pub goal: Goal,
    /// Relative weight in the fitness sum.
    pub weight: Scalar,
}

impl Objective {
    /// Minimization objective.
    #[must_use]
    pub fn minimize(name: impl Into<String>, weight: Scalar) -> Self {
        Self {
            name: name.into(),
            goal: Goal::Minimize,
            weight,
        }
    }

    /// Maximization objective.
    #[must_use]
    pub fn maximize(name: impl Into<String>, weight: Scalar) -> Self {
        Self {
            name: name.into(),
            goal: Goal::Maximize,
            weight,
        }
    }

    /// Target-value objective.
    #[must_use]
    pub fn target(name: impl Into<String>, target: Scalar, weight: Scalar) -> Self {
        Self {
            name: name.into(),
            goal: Goal::Target(target),
            weight,
        }
    }
}

/// Bounded parameters, weighted objectives, and the measurement that ties
/// them to the circuit under tune.
///
/// The measurement closure receives the candidate parameter vector (in
/// parameter order) and returns one measured value per objective. Because the
/// closure borrows whatever circuit it drives mutably, the borrow checker
/// serializes fitness evaluations against it.
pub struct OptimizationProblem<'a> {
    parameters: Vec<Parameter>,
    objectives: Vec<Objective>,
    measure: Box<dyn FnMut(&[Scalar]) -> Vec<Scalar> + 'a>,
}

impl std::fmt::Debug for OptimizationProblem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationProblem")
            .field("parameters", &self.parameters)
            .field("objectives", &self.objectives)
            .finish_non_exhaustive()
    }
}

impl<'a> OptimizationProblem<'a> {
    /// Builds a problem after validating the configuration.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for empty parameter or
    /// objective lists, inverted bounds, or non-finite weights.
    pub fn new(
        parameters: Vec<Parameter>,
        objectives: Vec<Objective>,
        measure: impl FnMut(&[Scalar]) -> Vec<Scalar> + 'a,
    ) -> Result<Self> {
        if parameters.is_empty() {
            return Err(CircuitError::InvalidConfiguration(
                "optimization needs at least one parameter".into(),
            ));
        }
        if objectives.is_empty() {
            return Err(CircuitError::InvalidConfiguration(
                "optimization needs at least one objective".into(),
            ));
        }
        for p in &parameters {
            if !(p.min < p.max) {
                return Err(CircuitError::InvalidConfiguration(format!(
                    "parameter {} has inverted bounds [{}, {}]",
                    p.name, p.min, p.max
                )));
            }
        }
        for o in &objectives {
            if !o.weight.is_finite() {
                return Err(CircuitError::InvalidConfiguration(format!(
                    "objective {} has a non-finite weight",
                    o.name
                )));
            }
        }
        Ok(Self {
            parameters,
            objectives,
            measure: Box::new(measure),
        })
    }

    /// Declared parameters.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Declared objectives.
    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Number of tunable dimensions.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.parameters.len()
    }

    /// Runs the measurement and folds it into the scalar fitness
    /// (higher is better).
    pub fn fitness(&mut self, candidate: &[Scalar]) -> Scalar {
        let measurements = (self.measure)(candidate);
        let mut fitness = 0.0;
        for (i, objective) in self.objectives.iter().enumerate() {
            let value = measurements.get(i).copied().unwrap_or(0.0);
            fitness += match objective.goal {
                Goal::Minimize => -objective.weight * value,
                Goal::Maximize => objective.weight * value,
                Goal::Target(target) => -objective.weight * (value - target).abs(),
            };
        }
        fitness
    }

    /// Uniform random point inside the bounds.
    pub(crate) fn random_point(&self, rng: &mut dyn RngCore) -> Vec<Scalar> {
        self.parameters
            .iter()
            .map(|p| rng.gen_range(p.min..=p.max))
            .collect()
    }

    /// Clamps a candidate into the bounds, in place.
    pub(crate) fn clamp(&self, candidate: &mut [Scalar]) {
        for (value, p) in candidate.iter_mut().zip(&self.parameters) {
            *value = value.clamp(p.min, p.max);
        }
    }

    /// Copies a winning vector back onto the parameter list.
    pub(crate) fn with_values(&self, values: &[Scalar]) -> Vec<Parameter> {
        self.parameters
            .iter()
            .zip(values)
            .map(|(p, &v)| Parameter {
                name: p.name.clone(),
                min: p.min,
                max: p.max,
                value: v.clamp(p.min, p.max),
            })
            .collect()
    }
}

/// A search strategy over an [`OptimizationProblem`].
pub trait Optimizer {
    /// Runs the search and returns the best parameter vector found.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for an unusable strategy
    /// configuration (zero population, inverted temperatures, ...).
    fn optimize(
        &self,
        problem: &mut OptimizationProblem<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Parameter>>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// The canonical convergence fixture: one parameter in [0, 10], fitness
    /// −|x − 5|.
    pub(crate) fn target_five() -> OptimizationProblem<'static> {
        OptimizationProblem::new(
            vec![Parameter::new("x", 0.0, 10.0, 1.0)],
            vec![Objective::target("x", 5.0, 1.0)],
            |x| vec![x[0]],
        )
        .expect("valid problem")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn initial_values_are_clamped_into_bounds() {
        let p = Parameter::new("x", 0.0, 1.0, 5.0);
        assert_relative_eq!(p.value, 1.0);
    }

    #[test]
    fn empty_lists_and_inverted_bounds_are_rejected() {
        assert!(OptimizationProblem::new(vec![], vec![Objective::minimize("m", 1.0)], |_| vec![])
            .is_err());
        assert!(OptimizationProblem::new(
            vec![Parameter::new("x", 0.0, 1.0, 0.5)],
            vec![],
            |_| vec![]
        )
        .is_err());
        assert!(OptimizationProblem::new(
            vec![Parameter::new("x", 2.0, 1.0, 0.5)],
            vec![Objective::minimize("m", 1.0)],
            |_| vec![]
        )
        .is_err());
    }

    #[test]
    fn fitness_signs_follow_the_goals() {
        let mut minimize = OptimizationProblem::new(
            vec![Parameter::new("x", 0.0, 10.0, 1.0)],
            vec![Objective::minimize("m", 2.0)],
            |x| vec![x[0]],
        )
        .unwrap();
        assert_relative_eq!(minimize.fitness(&[3.0]), -6.0);

        let mut maximize = OptimizationProblem::new(
            vec![Parameter::new("x", 0.0, 10.0, 1.0)],
            vec![Objective::maximize("m", 2.0)],
            |x| vec![x[0]],
        )
        .unwrap();
        assert_relative_eq!(maximize.fitness(&[3.0]), 6.0);

        let mut target = OptimizationProblem::new(
            vec![Parameter::new("x", 0.0, 10.0, 1.0)],
            vec![Objective::target("m", 5.0, 1.0)],
            |x| vec![x[0]],
        )
        .unwrap();
        assert_relative_eq!(target.fitness(&[3.0]), -2.0);
        assert_relative_eq!(target.fitness(&[5.0]), 0.0);
    }
}
