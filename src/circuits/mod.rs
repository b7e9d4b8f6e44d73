//! Circuit primitives and the MNA solver core.

/// MNA assembly and DC/AC/transient drivers.
pub mod analyzer;
/// Element types and their terminal behavior.
pub mod component;
/// Component/pin/node arena and connectivity.
pub mod topology;
/// Two-port parameter sets (Z, S) and conversions.
pub mod twoport;

mod devices;
mod distributed;
mod rf;

pub use analyzer::{
    AcSample, CircuitAnalyzer, FrequencyResponse, TransientSample, TransientTrace,
};
pub use component::{BjtPolarity, Component, ComponentKind, MosPolarity};
pub use topology::{Circuit, ComponentId, Node, NodeId, Pin, PinId};
pub use twoport::{SParameters, ZParameters, reflection_coefficient, vswr};
