//! Shared error types used across submodules.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// Structural defect in the circuit graph: missing ground reference,
    /// disconnected pin, or a component whose pin list does not match its
    /// declared pin count. Always fatal to the analysis call.
    #[error("topology error: {0}")]
    Topology(String),
    /// The MNA matrix was numerically singular — typically a floating node or
    /// a source loop with no resistive path. Carries the sample frequency and
    /// system size so the offending sweep point can be diagnosed.
    #[error("singular MNA matrix at {frequency} Hz (system size {size})")]
    SingularMatrix {
        /// Frequency of the failed sample in hertz.
        frequency: f64,
        /// Dimension of the assembled (n+m) system.
        size: usize,
    },
    /// Rejected before any work starts: empty parameter/objective lists,
    /// inverted bounds, non-positive sweep or iteration counts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Convenience alias used by fallible operations throughout the crate.
pub type Result<T> = std::result::Result<T, CircuitError>;
