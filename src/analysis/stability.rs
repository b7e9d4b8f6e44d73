//! Two-port stability metrics and Z-parameter extraction.
//!
//! Z-parameters are measured with voltage/current probes through the MNA
//! solver: each port is driven in turn by a unit source while the other port
//! floats open, so the open-circuit definitions Z11 = V1/I1 (I2 = 0) apply
//! directly. Conversion to S-parameters and the K/μ criteria follow.

use crate::circuits::{
    Circuit, CircuitAnalyzer, Component, NodeId, SParameters, ZParameters,
};
use crate::errors::{CircuitError, Result};
use crate::math::{C, Scalar};
use crate::sweep::logspace_hz;

/// Scalar stability figures for a linear two-port.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityMetrics {
    /// Rollett stability factor K.
    pub k_factor: Scalar,
    /// S-matrix determinant Δ = S11·S22 − S12·S21.
    pub delta: C,
    /// Edwards-Sinsky μ measured from the source side.
    pub mu_source: Scalar,
    /// Edwards-Sinsky μ measured from the load side.
    pub mu_load: Scalar,
    /// True iff K > 1 and |Δ| < 1.
    pub unconditionally_stable: bool,
}

impl StabilityMetrics {
    /// Computes the metrics from a set of S-parameters.
    #[must_use]
    pub fn from_s(s: &SParameters) -> Self {
        let delta = s.delta();
        let s11_sq = s.s11.norm_sqr();
        let s22_sq = s.s22.norm_sqr();
        let cross = (s.s12.norm() * s.s21.norm()).max(1e-300);

        let k_factor = (1.0 - s11_sq - s22_sq + delta.norm_sqr()) / (2.0 * cross);
        let mu_source =
            (1.0 - s11_sq) / ((s.s22 - delta * s.s11.conj()).norm() + s.s12.norm() * s.s21.norm());
        let mu_load =
            (1.0 - s22_sq) / ((s.s11 - delta * s.s22.conj()).norm() + s.s12.norm() * s.s21.norm());

        Self {
            k_factor,
            delta,
            mu_source,
            mu_load,
            unconditionally_stable: k_factor > 1.0 && delta.norm() < 1.0,
        }
    }
}

/// Maximum stable gain |S21|/|S12|; meaningful when K < 1.
#[must_use]
pub fn max_stable_gain(s: &SParameters) -> Scalar {
    if s.s12.norm() < 1e-300 {
        Scalar::INFINITY
    } else {
        s.s21.norm() / s.s12.norm()
    }
}

/// Maximum available gain MSG·(K − √(K² − 1)); falls back to MSG when the
/// two-port is only conditionally stable.
#[must_use]
pub fn max_available_gain(s: &SParameters) -> Scalar {
    let k = StabilityMetrics::from_s(s).k_factor;
    let msg = max_stable_gain(s);
    if k > 1.0 {
        msg * (k - (k * k - 1.0).sqrt())
    } else {
        msg
    }
}

/// Measures the Z-parameters of the two-port formed by `port1` and `port2`
/// (both referenced to ground) by driving each port with a unit source in a
/// cloned circuit.
///
/// # Errors
///
/// [`CircuitError::Topology`] when the circuit has no ground or a driven
/// port draws no measurable current; solver errors are propagated.
pub fn measure_z_parameters(
    circuit: &Circuit,
    port1: NodeId,
    port2: NodeId,
    frequency: Scalar,
) -> Result<ZParameters> {
    let (v11, v21, i1) = drive_port(circuit, port1, port2, frequency)?;
    let (v22, v12, i2) = drive_port(circuit, port2, port1, frequency)?;

    if i1.norm() < 1e-30 || i2.norm() < 1e-30 {
        return Err(CircuitError::Topology(
            "driven port draws no current; Z-parameters are undefined".into(),
        ));
    }

    Ok(ZParameters {
        z11: v11 / i1,
        z21: v21 / i1,
        z22: v22 / i2,
        z12: v12 / i2,
    })
}

/// Drives `driven` with a 1 V source against ground in a cloned circuit,
/// leaving `other` open, and returns `(v_driven, v_other, i_in)`.
fn drive_port(
    circuit: &Circuit,
    driven: NodeId,
    other: NodeId,
    frequency: Scalar,
) -> Result<(C, C, C)> {
    let ground = circuit
        .ground()
        .ok_or_else(|| CircuitError::Topology("no ground node set".into()))?;

    let mut probe = circuit.clone();
    let source = probe.add_component(Component::voltage_source("Vprobe", 1.0, 0.0))?;
    probe.attach(probe.pin(source, 0), driven)?;
    probe.attach(probe.pin(source, 1), ground)?;

    let mut analyzer = CircuitAnalyzer::new();
    analyzer.analyze(&mut probe, frequency)?;

    let v_driven = probe.node_voltage(driven);
    let v_other = probe.node_voltage(other);
    // Branch current is oriented into the source's positive terminal; the
    // current delivered into the port is its negation.
    let i_in = -probe.component(source).current_through();
    Ok((v_driven, v_other, i_in))
}

/// Z→S→{K, μ} analysis over a circuit's measured two-port.
#[derive(Debug, Clone, Copy)]
pub struct StabilityAnalyzer {
    z0: Scalar,
}

impl StabilityAnalyzer {
    /// Creates an analyzer with reference impedance `z0` (typically 50 Ω).
    #[must_use]
    pub fn new(z0: Scalar) -> Self {
        Self { z0 }
    }

    /// Metrics from already-known Z-parameters. Returns `None` when the Z→S
    /// conversion is singular.
    #[must_use]
    pub fn metrics_from_z(&self, z: &ZParameters) -> Option<StabilityMetrics> {
        z.to_s(self.z0).map(|s| StabilityMetrics::from_s(&s))
    }

    /// Probes the circuit two-port at one frequency and classifies it.
    ///
    /// # Errors
    ///
    /// Propagates probe and solver errors; reports
    /// [`CircuitError::InvalidConfiguration`] when the Z→S conversion is
    /// singular at this frequency.
    pub fn analyze(
        &self,
        circuit: &Circuit,
        port1: NodeId,
        port2: NodeId,
        frequency: Scalar,
    ) -> Result<StabilityMetrics> {
        let z = measure_z_parameters(circuit, port1, port2, frequency)?;
        self.metrics_from_z(&z).ok_or_else(|| {
            CircuitError::InvalidConfiguration(format!(
                "Z-to-S conversion is singular at {frequency} Hz"
            ))
        })
    }

    /// Classifies the two-port across a log-spaced frequency range.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for an empty sweep; per-sample
    /// errors are propagated.
    pub fn analyze_vs_frequency(
        &self,
        circuit: &Circuit,
        port1: NodeId,
        port2: NodeId,
        f_start: Scalar,
        f_stop: Scalar,
        points: usize,
    ) -> Result<Vec<(Scalar, StabilityMetrics)>> {
        if points == 0 || f_start <= 0.0 || f_stop <= 0.0 {
            return Err(CircuitError::InvalidConfiguration(
                "stability sweep needs positive band edges and at least one point".into(),
            ));
        }
        logspace_hz(f_start, f_stop, points)
            .into_iter()
            .map(|f| Ok((f, self.analyze(circuit, port1, port2, f)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn s(s11: C, s12: C, s21: C, s22: C) -> SParameters {
        SParameters { s11, s12, s21, s22 }
    }

    #[test]
    fn well_matched_two_port_is_unconditionally_stable() {
        let s = s(
            C::new(0.1, 0.0),
            C::new(0.05, 0.0),
            C::new(2.0, 0.0),
            C::new(0.2, 0.0),
        );
        let m = StabilityMetrics::from_s(&s);
        assert!(m.k_factor > 1.0);
        assert!(m.delta.norm() < 1.0);
        assert!(m.unconditionally_stable);
        assert!(m.mu_source > 1.0);
        assert!(m.mu_load > 1.0);
    }

    #[test]
    fn strongly_reflective_two_port_is_not() {
        let s = s(
            C::new(0.9, 0.0),
            C::new(0.4, 0.0),
            C::new(2.5, 0.0),
            C::new(0.9, 0.0),
        );
        let m = StabilityMetrics::from_s(&s);
        assert!(m.k_factor < 1.0);
        assert!(!m.unconditionally_stable);
        assert!(m.mu_source < 1.0);
    }

    #[test]
    fn large_delta_defeats_a_good_k() {
        // Nearly unilateral but with huge reflections: K can exceed 1 while
        // |Δ| does not stay below unity.
        let s = s(
            C::new(1.2, 0.0),
            C::new(1e-3, 0.0),
            C::new(1e-3, 0.0),
            C::new(1.2, 0.0),
        );
        let m = StabilityMetrics::from_s(&s);
        assert!(m.delta.norm() > 1.0);
        assert!(!m.unconditionally_stable);
    }

    #[test]
    fn gain_figures_track_the_s_parameters() {
        let stable = s(
            C::new(0.1, 0.0),
            C::new(0.05, 0.0),
            C::new(2.0, 0.0),
            C::new(0.2, 0.0),
        );
        assert_relative_eq!(max_stable_gain(&stable), 40.0, max_relative = 1e-12);
        assert!(max_available_gain(&stable) < max_stable_gain(&stable));
    }

    #[test]
    fn resistive_tee_z_parameters_are_measured_through_the_solver() {
        use crate::circuits::Component;

        // Tee: port1 -- 25Ω -- mid -- 25Ω -- port2, mid -- 50Ω -- ground.
        // Open-circuit Z-parameters: Z11 = Z22 = 75, Z12 = Z21 = 50.
        let mut circuit = Circuit::new();
        let ra = circuit
            .add_component(Component::resistor("Ra", 25.0))
            .unwrap();
        let rb = circuit
            .add_component(Component::resistor("Rb", 25.0))
            .unwrap();
        let rc = circuit
            .add_component(Component::resistor("Rc", 50.0))
            .unwrap();
        let port1 = circuit.node_of(circuit.pin(ra, 0)).unwrap();
        let mid = circuit
            .connect(circuit.pin(ra, 1), circuit.pin(rb, 0))
            .unwrap();
        circuit.attach(circuit.pin(rc, 0), mid).unwrap();
        let port2 = circuit.node_of(circuit.pin(rb, 1)).unwrap();
        let gnd = circuit.node_of(circuit.pin(rc, 1)).unwrap();
        circuit.set_ground(gnd).unwrap();

        let z = measure_z_parameters(&circuit, port1, port2, 0.0).unwrap();
        assert_relative_eq!(z.z11.re, 75.0, max_relative = 1e-6);
        assert_relative_eq!(z.z22.re, 75.0, max_relative = 1e-6);
        assert_relative_eq!(z.z21.re, 50.0, max_relative = 1e-6);
        assert_relative_eq!(z.z12.re, 50.0, max_relative = 1e-6);
    }
}
