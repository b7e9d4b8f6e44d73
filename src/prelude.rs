//! Convenience re-exports for building circuit analysis and tuning runs.

pub use crate::analysis::{
    AntennaAnalyzer, AntennaKind, MatchingNetwork, NoiseAnalyzer, NoiseKind, SensitivityAnalyzer,
    SensitivityResult, SensitivityTarget, StabilityAnalyzer, StabilityMetrics,
    measure_z_parameters,
};
pub use crate::circuits::{
    AcSample, BjtPolarity, Circuit, CircuitAnalyzer, Component, ComponentId, ComponentKind,
    FrequencyResponse, MosPolarity, NodeId, PinId, SParameters, TransientSample, TransientTrace,
    ZParameters, reflection_coefficient, vswr,
};
pub use crate::constants::*;
pub use crate::errors::CircuitError;
pub use crate::filter::{
    Approximation, FilterDesigner, FilterResponse, FilterSpecification, FilterType,
    build_terminated_filter,
};
pub use crate::math::{C, OPEN_CIRCUIT_IMPEDANCE, Scalar, db, phasor};
pub use crate::optimizer::{
    DifferentialEvolution, GeneticAlgorithm, Goal, NelderMead, Objective, OptimizationProblem,
    Optimizer, Parameter, ParticleSwarm, SimulatedAnnealing,
};
pub use crate::sweep::{linspace, logspace_hz, mag, mag_db, phase_deg};
