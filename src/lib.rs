#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Physical constants and frequency helpers.
pub mod constants;
/// Scalar/complex aliases and dB helpers.
pub mod math;
/// Circuit topology, components, and the MNA solver.
pub mod circuits;
/// Noise, stability, sensitivity, and antenna analyzers.
pub mod analysis;
/// Ladder filter synthesis and response analysis.
pub mod filter;
/// Metaheuristic parameter optimizers.
pub mod optimizer;
/// Frequency sweep builders and post-processing helpers.
pub mod sweep;
/// Error types shared across submodules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
