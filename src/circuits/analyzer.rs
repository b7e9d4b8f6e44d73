//! Modified Nodal Analysis over complex phasors: DC operating points,
//! log-spaced AC sweeps, and fixed-step transient runs.
//!
//! Each [`CircuitAnalyzer::analyze`] call is a fresh assemble-and-solve pass:
//! no solver state survives between calls apart from the component memory
//! that transient stepping integrates. The circuit is mutated in place (node
//! voltages, source branch currents), which is why every entry point takes
//! `&mut Circuit` — exactly one solve can be in flight per circuit.

use nalgebra::{DMatrix, DVector};

use crate::errors::{CircuitError, Result};
use crate::math::{C, Scalar};
use crate::sweep::logspace_hz;

use super::topology::{Circuit, NodeId};

/// Node voltages recorded at a single sweep frequency.
#[derive(Debug, Clone)]
pub struct AcSample {
    /// Sample frequency in hertz.
    pub frequency: Scalar,
    /// Live-node voltages in node-id order (ground reads as zero).
    pub voltages: Vec<C>,
}

/// Frequency-indexed sweep results, ordered by increasing frequency.
#[derive(Debug, Clone, Default)]
pub struct FrequencyResponse {
    samples: Vec<AcSample>,
}

impl FrequencyResponse {
    /// All recorded samples in ascending frequency order.
    #[must_use]
    pub fn samples(&self) -> &[AcSample] {
        &self.samples
    }

    /// Number of recorded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the sweep recorded nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Voltages recorded at `frequency`. Lookup tolerates the floating-point
    /// round-trip of the exact sampled value.
    #[must_use]
    pub fn at(&self, frequency: Scalar) -> Option<&[C]> {
        self.samples
            .iter()
            .find(|s| {
                let scale = s.frequency.abs().max(frequency.abs()).max(1e-300);
                (s.frequency - frequency).abs() <= scale * 1e-9
            })
            .map(|s| s.voltages.as_slice())
    }

    fn push(&mut self, sample: AcSample) {
        self.samples.push(sample);
    }

    fn sort(&mut self) {
        self.samples
            .sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Node voltages captured at one transient timestep.
#[derive(Debug, Clone)]
pub struct TransientSample {
    /// Simulation time in seconds.
    pub time: Scalar,
    /// Live-node voltages in node-id order.
    pub voltages: Vec<C>,
}

/// Full waveform from a transient run.
#[derive(Debug, Clone, Default)]
pub struct TransientTrace {
    /// One sample per solved timestep, in time order.
    pub samples: Vec<TransientSample>,
}

/// Assembles and solves the complex MNA system for a [`Circuit`].
#[derive(Debug, Clone, Default)]
pub struct CircuitAnalyzer {
    frequency_response: FrequencyResponse,
    time: Scalar,
}

impl CircuitAnalyzer {
    /// Creates an analyzer with no recorded sweep data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation clock after the most recent transient run.
    #[must_use]
    pub fn time(&self) -> Scalar {
        self.time
    }

    /// Recorded AC sweep results from the last [`perform_ac`](Self::perform_ac).
    #[must_use]
    pub fn frequency_response(&self) -> &FrequencyResponse {
        &self.frequency_response
    }

    /// Solves the circuit at `frequency` hertz and writes node voltages and
    /// source branch currents back into the circuit.
    ///
    /// # Errors
    ///
    /// [`CircuitError::Topology`] when no ground node is set;
    /// [`CircuitError::SingularMatrix`] when the assembled system cannot be
    /// inverted (floating node, source loop without a resistive path).
    pub fn analyze(&mut self, circuit: &mut Circuit, frequency: Scalar) -> Result<()> {
        let _span = tracing::debug_span!("analyze", frequency).entered();

        let ground = circuit
            .ground()
            .ok_or_else(|| CircuitError::Topology("no ground node set".into()))?;

        // Unknown ordering: live non-ground nodes in id order, then one
        // branch current per voltage source in insertion order.
        let unknown_nodes: Vec<NodeId> = circuit
            .live_nodes()
            .into_iter()
            .filter(|&n| n != ground)
            .collect();
        let index_of = |node: NodeId| -> Option<usize> {
            if node == ground {
                None
            } else {
                unknown_nodes.iter().position(|&u| u == node)
            }
        };

        let sources = circuit.voltage_sources();
        let n = unknown_nodes.len();
        let m = sources.len();
        let size = n + m;

        let mut a = DMatrix::<C>::zeros(size, size);
        let mut b = DVector::<C>::zeros(size);

        // Conductance block: every non-source element stamps the admittance
        // of its primary terminal pair.
        for (idx, component) in circuit.components().iter().enumerate() {
            if component.kind().is_voltage_source() {
                continue;
            }
            let pins = circuit.pin_ids_of(super::topology::ComponentId(idx));
            let z = component.impedance(frequency);
            // Clamp short-circuit impedances so the admittance stays finite.
            let y = if z.norm() < 1e-12 {
                C::new(1.0e12, 0.0)
            } else {
                C::new(1.0, 0.0) / z
            };

            let n1 = circuit.node_of(pins[0]).and_then(index_of);
            let n2 = circuit.node_of(pins[1]).and_then(index_of);
            match (n1, n2) {
                (Some(i), Some(j)) => {
                    a[(i, i)] += y;
                    a[(j, j)] += y;
                    a[(i, j)] -= y;
                    a[(j, i)] -= y;
                }
                (Some(i), None) => a[(i, i)] += y,
                (None, Some(j)) => a[(j, j)] += y,
                (None, None) => {}
            }
        }

        // Voltage sources: ±1 coupling between node rows and the auxiliary
        // branch-current column, commanded phasor on the constraint row.
        for (k, &source_id) in sources.iter().enumerate() {
            let row = n + k;
            let pins = circuit.pin_ids_of(source_id);
            let pos = circuit.node_of(pins[0]).and_then(index_of);
            let neg = circuit.node_of(pins[1]).and_then(index_of);

            if let Some(p) = pos {
                a[(p, row)] += C::new(1.0, 0.0);
                a[(row, p)] += C::new(1.0, 0.0);
            }
            if let Some(q) = neg {
                a[(q, row)] -= C::new(1.0, 0.0);
                a[(row, q)] -= C::new(1.0, 0.0);
            }
            b[row] = circuit.component(source_id).source_voltage();
        }

        let x = a
            .lu()
            .solve(&b)
            .ok_or(CircuitError::SingularMatrix { frequency, size })?;
        if x.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
            return Err(CircuitError::SingularMatrix { frequency, size });
        }

        // Write-back: node voltages, then source currents, then per-component
        // pin snapshots.
        circuit.set_node_voltage(ground, C::default());
        for (i, &node) in unknown_nodes.iter().enumerate() {
            circuit.set_node_voltage(node, x[i]);
        }
        for (k, &source_id) in sources.iter().enumerate() {
            circuit.component_mut(source_id).set_branch_current(x[n + k]);
        }
        circuit.refresh_component_voltages(frequency);
        Ok(())
    }

    /// Sweeps `points` log-spaced frequencies from `f_start` to `f_stop`
    /// inclusive, recording the node-voltage vector per frequency. A singular
    /// sample is logged and skipped; it does not abort the sweep.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for non-positive band edges or
    /// `points == 0`; [`CircuitError::Topology`] when the circuit has no
    /// ground reference.
    pub fn perform_ac(
        &mut self,
        circuit: &mut Circuit,
        f_start: Scalar,
        f_stop: Scalar,
        points: usize,
    ) -> Result<&FrequencyResponse> {
        if points == 0 {
            return Err(CircuitError::InvalidConfiguration(
                "AC sweep needs at least one point".into(),
            ));
        }
        if f_start <= 0.0 || f_stop <= 0.0 {
            return Err(CircuitError::InvalidConfiguration(format!(
                "AC sweep band edges must be positive (got {f_start}..{f_stop})"
            )));
        }

        let _span = tracing::info_span!("ac_sweep", points).entered();
        self.frequency_response.clear();
        for f in logspace_hz(f_start, f_stop, points) {
            match self.analyze(circuit, f) {
                Ok(()) => self.frequency_response.push(AcSample {
                    frequency: f,
                    voltages: circuit.node_voltages(),
                }),
                Err(CircuitError::SingularMatrix { frequency, size }) => {
                    tracing::debug!(frequency, size, "skipping singular sweep sample");
                }
                Err(e) => return Err(e),
            }
        }
        self.frequency_response.sort();
        Ok(&self.frequency_response)
    }

    /// Steps the circuit from t = 0 to `stop_time` with fixed step `dt`:
    /// solve at the instantaneous source values, then advance every
    /// component's state exactly once per step.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for non-positive `stop_time` or
    /// `dt`; any solve error is propagated.
    pub fn perform_transient(
        &mut self,
        circuit: &mut Circuit,
        stop_time: Scalar,
        dt: Scalar,
    ) -> Result<TransientTrace> {
        if dt <= 0.0 || stop_time <= 0.0 {
            return Err(CircuitError::InvalidConfiguration(format!(
                "transient run needs positive stop_time and dt (got {stop_time}, {dt})"
            )));
        }

        let _span = tracing::info_span!("transient", stop_time, dt).entered();
        let mut trace = TransientTrace::default();
        let steps = (stop_time / dt).round().max(1.0) as usize;
        for step in 0..steps {
            let t = step as Scalar * dt;
            self.analyze(circuit, 0.0)?;
            trace.samples.push(TransientSample {
                time: t,
                voltages: circuit.node_voltages(),
            });
            for idx in 0..circuit.components().len() {
                circuit
                    .component_mut(super::topology::ComponentId(idx))
                    .advance_state(dt);
            }
            self.time = t + dt;
        }
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::circuits::component::Component;

    /// 10 V source across series 1k/2k; midpoint belongs at 6.667 V.
    fn divider() -> (Circuit, NodeId) {
        let mut circuit = Circuit::new();
        let vs = circuit
            .add_component(Component::voltage_source("V1", 10.0, 0.0))
            .unwrap();
        let r1 = circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let r2 = circuit
            .add_component(Component::resistor("R2", 2.0e3))
            .unwrap();
        circuit
            .connect(circuit.pin(vs, 0), circuit.pin(r1, 0))
            .unwrap();
        let mid = circuit
            .connect(circuit.pin(r1, 1), circuit.pin(r2, 0))
            .unwrap();
        let gnd = circuit
            .connect(circuit.pin(r2, 1), circuit.pin(vs, 1))
            .unwrap();
        circuit.set_ground(gnd).unwrap();
        (circuit, mid)
    }

    #[test]
    fn resistive_divider_matches_hand_computation() {
        let (mut circuit, mid) = divider();
        let mut analyzer = CircuitAnalyzer::new();
        analyzer.analyze(&mut circuit, 0.0).unwrap();
        assert_relative_eq!(
            circuit.node_voltage(mid).re,
            10.0 * 2000.0 / 3000.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn analyze_is_idempotent_at_a_fixed_frequency() {
        let (mut circuit, mid) = divider();
        let mut analyzer = CircuitAnalyzer::new();
        analyzer.analyze(&mut circuit, 0.0).unwrap();
        let first = circuit.node_voltage(mid);
        analyzer.analyze(&mut circuit, 0.0).unwrap();
        let second = circuit.node_voltage(mid);
        assert_relative_eq!(first.re, second.re, epsilon = 1e-12);
        assert_relative_eq!(first.im, second.im, epsilon = 1e-12);
    }

    #[test]
    fn missing_ground_is_a_topology_error() {
        let mut circuit = Circuit::new();
        circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let mut analyzer = CircuitAnalyzer::new();
        let err = analyzer.analyze(&mut circuit, 0.0).unwrap_err();
        assert!(matches!(err, CircuitError::Topology(_)));
    }

    #[test]
    fn floating_subcircuit_raises_singular_matrix() {
        let (mut circuit, _) = divider();
        // A resistor whose two fresh nodes never reach ground.
        circuit
            .add_component(Component::resistor("Rfloat", 1.0e3))
            .unwrap();
        let mut analyzer = CircuitAnalyzer::new();
        let err = analyzer.analyze(&mut circuit, 0.0).unwrap_err();
        assert!(matches!(err, CircuitError::SingularMatrix { .. }));
    }

    #[test]
    fn ac_sweep_records_exactly_the_requested_points() {
        // RC lowpass: V1 -- R -- C -- gnd.
        let mut circuit = Circuit::new();
        let vs = circuit
            .add_component(Component::voltage_source("V1", 1.0, 0.0))
            .unwrap();
        let r = circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let c = circuit
            .add_component(Component::capacitor("C1", 1.0e-6))
            .unwrap();
        circuit
            .connect(circuit.pin(vs, 0), circuit.pin(r, 0))
            .unwrap();
        circuit.connect(circuit.pin(r, 1), circuit.pin(c, 0)).unwrap();
        let gnd = circuit
            .connect(circuit.pin(c, 1), circuit.pin(vs, 1))
            .unwrap();
        circuit.set_ground(gnd).unwrap();

        let mut analyzer = CircuitAnalyzer::new();
        let response = analyzer
            .perform_ac(&mut circuit, 1.0, 1.0e6, 25)
            .unwrap();
        assert_eq!(response.len(), 25);
        let first = response.samples()[0].frequency;
        let last = response.samples()[24].frequency;
        assert_relative_eq!(first, 1.0, epsilon = 1e-12);
        assert_relative_eq!(last, 1.0e6, max_relative = 1e-12);
        // Tolerant keyed lookup round-trips the sampled frequency.
        assert!(response.at(first).is_some());
        assert!(response.at(1.0e6).is_some());
    }

    #[test]
    fn rc_corner_attenuates_to_minus_three_db() {
        let r = 1.0e3;
        let cap = 1.0e-9;
        let corner = 1.0 / (2.0 * std::f64::consts::PI * r * cap);

        let mut circuit = Circuit::new();
        let vs = circuit
            .add_component(Component::voltage_source("V1", 1.0, 0.0))
            .unwrap();
        let rc = circuit.add_component(Component::resistor("R1", r)).unwrap();
        let cc = circuit
            .add_component(Component::capacitor("C1", cap))
            .unwrap();
        circuit
            .connect(circuit.pin(vs, 0), circuit.pin(rc, 0))
            .unwrap();
        let out = circuit
            .connect(circuit.pin(rc, 1), circuit.pin(cc, 0))
            .unwrap();
        let gnd = circuit
            .connect(circuit.pin(cc, 1), circuit.pin(vs, 1))
            .unwrap();
        circuit.set_ground(gnd).unwrap();

        let mut analyzer = CircuitAnalyzer::new();
        analyzer.analyze(&mut circuit, corner).unwrap();
        let gain = circuit.node_voltage(out).norm();
        assert_relative_eq!(gain, 1.0 / 2.0_f64.sqrt(), max_relative = 1e-6);
    }

    #[test]
    fn transient_source_clock_advances_monotonically() {
        let (mut circuit, mid) = divider();
        let mut analyzer = CircuitAnalyzer::new();
        let trace = analyzer
            .perform_transient(&mut circuit, 1.0e-3, 1.0e-4)
            .unwrap();
        assert_eq!(trace.samples.len(), 10);
        assert!(analyzer.time() >= 1.0e-3);
        // A DC divider holds its operating point through the run.
        assert_relative_eq!(
            circuit.node_voltage(mid).re,
            10.0 * 2000.0 / 3000.0,
            max_relative = 1e-9
        );
    }
}
