//! Network-level analyzers layered on the MNA core: noise, stability,
//! sensitivity, and antenna far-field utilities.

/// Far-field pattern and matching utilities for wire antennas.
pub mod antenna;
/// Thermal/shot/flicker noise integration.
pub mod noise;
/// Finite-difference parameter sensitivity.
pub mod sensitivity;
/// Two-port stability metrics and Z-parameter probing.
pub mod stability;

pub use antenna::{AntennaAnalyzer, AntennaKind, MatchingNetwork};
pub use noise::{NoiseAnalyzer, NoiseKind, NoiseSource};
pub use sensitivity::{SensitivityAnalyzer, SensitivityResult, SensitivityTarget};
pub use stability::{
    StabilityAnalyzer, StabilityMetrics, max_available_gain, max_stable_gain,
    measure_z_parameters,
};
