//! Typed circuit elements and their closed-form terminal behavior.
//!
//! Every element is a [`Component`]: a name, a [`ComponentKind`] discriminant,
//! a named-parameter map, and a small private state block. The four analysis
//! operations — [`impedance`](Component::impedance),
//! [`current_through`](Component::current_through),
//! [`voltage_across`](Component::voltage_across), and
//! [`advance_state`](Component::advance_state) — are functions of the
//! component's own state plus the pin-voltage snapshot the solver writes back
//! after each solve. Components never hold references into the circuit graph;
//! the [`Circuit`](super::topology::Circuit) arena owns all connectivity.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::math::{C, OPEN_CIRCUIT_IMPEDANCE, Scalar};

/// BJT doping polarity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BjtPolarity {
    /// NPN device; positive collector current convention.
    Npn,
    /// PNP device; collector current sign is flipped.
    Pnp,
}

/// MOSFET channel polarity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosPolarity {
    /// N-channel device.
    Nmos,
    /// P-channel device.
    Pmos,
}

/// Discriminant for every supported element type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Ideal resistor.
    Resistor,
    /// Ideal capacitor.
    Capacitor,
    /// Ideal inductor.
    Inductor,
    /// Ideal voltage source (DC or sinusoidal). Contributes one extra current
    /// unknown to the MNA system.
    VoltageSource,
    /// Exponential junction diode, linearized per analysis point.
    Diode,
    /// Bipolar junction transistor with fixed small-signal assumptions.
    Bjt(BjtPolarity),
    /// MOSFET with square-law regions.
    Mosfet(MosPolarity),
    /// Operational amplifier with finite gain and output saturation.
    OpAmp,
    /// Quartz crystal: motional RLC branch in parallel with shunt capacitance.
    Crystal,
    /// Uniform transmission line segment with delay history.
    TransmissionLine,
    /// Two-winding transformer.
    Transformer,
    /// Rectangular waveguide section.
    Waveguide,
    /// Three-port circulator with dB-rated isolation.
    Circulator,
    /// Two-port isolator (forward insertion loss, reverse isolation).
    Isolator,
    /// Four-port directional coupler.
    Coupler,
    /// Matched attenuator with a power rating.
    Attenuator,
    /// Fixed phase shifter.
    PhaseShifter,
}

impl ComponentKind {
    /// Ordered pin names this kind declares.
    #[must_use]
    pub fn pin_names(&self) -> &'static [&'static str] {
        match self {
            Self::Resistor | Self::Capacitor | Self::Inductor | Self::Crystal | Self::Waveguide => {
                &["p1", "p2"]
            }
            Self::VoltageSource => &["pos", "neg"],
            Self::Diode => &["anode", "cathode"],
            Self::Bjt(_) => &["collector", "base", "emitter"],
            Self::Mosfet(_) => &["drain", "gate", "source"],
            Self::OpAmp => &["in+", "in-", "out"],
            Self::TransmissionLine => &["in+", "in-", "out+", "out-"],
            Self::Transformer => &["p1", "p2", "s1", "s2"],
            Self::Circulator => &["port1", "port2", "port3"],
            Self::Isolator | Self::Attenuator | Self::PhaseShifter => &["input", "output"],
            Self::Coupler => &["input", "through", "coupled", "isolated"],
        }
    }

    /// Number of pins this kind declares.
    #[must_use]
    pub fn pin_count(&self) -> usize {
        self.pin_names().len()
    }

    /// True for elements that contribute an auxiliary current unknown.
    #[must_use]
    pub fn is_voltage_source(&self) -> bool {
        matches!(self, Self::VoltageSource)
    }
}

/// Mutable per-element memory integrated by [`Component::advance_state`].
///
/// Fields are shared across kinds: `charge` doubles as base/gate charge for
/// transistors, `clock` is only advanced by time-varying sources.
#[derive(Debug, Clone, Default)]
pub(crate) struct ComponentState {
    pub(crate) charge: Scalar,
    pub(crate) flux: Scalar,
    pub(crate) secondary_flux: Scalar,
    pub(crate) stored_energy: Scalar,
    pub(crate) dissipated_power: Scalar,
    pub(crate) clock: Scalar,
    pub(crate) branch_current: C,
    pub(crate) output_voltage: C,
    /// Pin-voltage snapshot written by the solver after each solve.
    pub(crate) pin_voltages: Vec<C>,
    /// Frequency of the most recent solve, for reactance readback.
    pub(crate) last_frequency: Scalar,
    /// Transmission line (voltage, current) delay history, newest first.
    pub(crate) line_history: VecDeque<(C, C)>,
}

/// A single circuit element.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) name: String,
    pub(crate) kind: ComponentKind,
    pub(crate) parameters: BTreeMap<String, Scalar>,
    pub(crate) pin_names: Vec<String>,
    pub(crate) state: ComponentState,
}

impl Component {
    /// Creates a bare component of `kind` with the kind's default pin list and
    /// an empty parameter map. Prefer the typed constructors
    /// ([`resistor`](Self::resistor), [`capacitor`](Self::capacitor), ...).
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        let pin_names = kind.pin_names().iter().map(|s| (*s).to_string()).collect();
        Self {
            name: name.into(),
            kind,
            parameters: BTreeMap::new(),
            pin_names,
            state: ComponentState::default(),
        }
    }

    /// Component name (e.g. `R1`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind discriminant.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Declared pin names, in pin-index order.
    #[must_use]
    pub fn pin_names(&self) -> &[String] {
        &self.pin_names
    }

    /// Looks up a named parameter, defaulting to zero when absent.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Scalar {
        self.parameters.get(name).copied().unwrap_or(0.0)
    }

    /// Sets a named parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: Scalar) {
        self.parameters.insert(name.into(), value);
    }

    /// Iterates over the named parameters.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, Scalar)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Voltage of the pin at `index` from the last solve, or zero before any.
    #[must_use]
    pub fn pin_voltage(&self, index: usize) -> C {
        self.state
            .pin_voltages
            .get(index)
            .copied()
            .unwrap_or_default()
    }

    /// Solver hook: records the node voltages seen at this component's pins.
    pub(crate) fn set_pin_voltages(&mut self, voltages: &[C], frequency: Scalar) {
        self.state.pin_voltages.clear();
        self.state.pin_voltages.extend_from_slice(voltages);
        self.state.last_frequency = frequency;
    }

    /// Solver hook: stores the solved branch current of a voltage source.
    pub(crate) fn set_branch_current(&mut self, current: C) {
        self.state.branch_current = current;
    }
}

// ── Passives and sources ─────────────────────────────────────────────────────

impl Component {
    /// Ideal resistor of `resistance` ohms.
    #[must_use]
    pub fn resistor(name: impl Into<String>, resistance: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Resistor);
        c.set_parameter("resistance", resistance);
        c
    }

    /// Ideal capacitor of `capacitance` farads.
    #[must_use]
    pub fn capacitor(name: impl Into<String>, capacitance: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Capacitor);
        c.set_parameter("capacitance", capacitance);
        c
    }

    /// Ideal inductor of `inductance` henries.
    #[must_use]
    pub fn inductor(name: impl Into<String>, inductance: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Inductor);
        c.set_parameter("inductance", inductance);
        c
    }

    /// Ideal voltage source. `frequency` of zero means DC; otherwise the
    /// source emits `voltage · e^(jωt)` against its local clock in transient
    /// runs and a `voltage`-magnitude phasor in AC analysis.
    #[must_use]
    pub fn voltage_source(name: impl Into<String>, voltage: Scalar, frequency: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::VoltageSource);
        c.set_parameter("voltage", voltage);
        c.set_parameter("frequency", frequency);
        c
    }

    /// Junction diode with default saturation current and thermal voltage.
    #[must_use]
    pub fn diode(name: impl Into<String>) -> Self {
        let mut c = Self::new(name, ComponentKind::Diode);
        c.set_parameter("is", 1e-12);
        c.set_parameter("vt", 0.026);
        c
    }

    /// Commanded source phasor at the component's local clock. Zero for
    /// non-source kinds.
    #[must_use]
    pub(crate) fn source_voltage(&self) -> C {
        if self.kind != ComponentKind::VoltageSource {
            return C::default();
        }
        let amplitude = self.parameter("voltage");
        let freq = self.parameter("frequency");
        if freq == 0.0 {
            C::new(amplitude, 0.0)
        } else {
            let omega = 2.0 * PI * freq;
            C::from_polar(amplitude, omega * self.state.clock)
        }
    }

    fn diode_current(&self) -> C {
        let v = self.voltage_across().norm();
        let is = self.parameter("is");
        let vt = self.parameter("vt");
        C::new(is * ((v / vt).exp() - 1.0), 0.0)
    }
}

// ── The four analysis operations ─────────────────────────────────────────────

impl Component {
    /// Frequency-dependent impedance seen between the element's primary pins.
    ///
    /// Reactive elements at zero frequency and unbiased dynamic-impedance
    /// devices return the bounded [`OPEN_CIRCUIT_IMPEDANCE`] sentinel rather
    /// than an infinity; an ideal voltage source reports exactly zero.
    #[must_use]
    pub fn impedance(&self, frequency: Scalar) -> C {
        match self.kind {
            ComponentKind::Resistor => C::new(self.parameter("resistance"), 0.0),
            ComponentKind::Capacitor => {
                if frequency == 0.0 {
                    C::new(OPEN_CIRCUIT_IMPEDANCE, 0.0)
                } else {
                    let xc = 1.0 / (2.0 * PI * frequency * self.parameter("capacitance"));
                    C::new(0.0, -xc)
                }
            }
            ComponentKind::Inductor => {
                C::new(0.0, 2.0 * PI * frequency * self.parameter("inductance"))
            }
            ComponentKind::VoltageSource => C::default(),
            ComponentKind::Diode => {
                let id = self.diode_current().re;
                if id.abs() < 1e-15 {
                    C::new(OPEN_CIRCUIT_IMPEDANCE, 0.0)
                } else {
                    C::new(self.parameter("vt") / id, 0.0)
                }
            }
            ComponentKind::Bjt(p) => self.bjt_impedance(p),
            ComponentKind::Mosfet(p) => self.mosfet_impedance(p),
            ComponentKind::OpAmp => C::new(self.parameter("rin"), 0.0),
            ComponentKind::Crystal => self.crystal_impedance(frequency),
            ComponentKind::TransmissionLine => self.line_impedance(frequency),
            ComponentKind::Transformer => self.transformer_primary_impedance(frequency),
            ComponentKind::Waveguide => self.waveguide_impedance(frequency),
            ComponentKind::Circulator
            | ComponentKind::Isolator
            | ComponentKind::Coupler
            | ComponentKind::Attenuator
            | ComponentKind::PhaseShifter => C::new(self.parameter("impedance"), 0.0),
        }
    }

    /// Current through the element, derived from the last solve's pin
    /// voltages. For a voltage source this is the solved branch current.
    #[must_use]
    pub fn current_through(&self) -> C {
        let f = self.state.last_frequency;
        match self.kind {
            ComponentKind::Resistor => self.voltage_across() / self.parameter("resistance"),
            ComponentKind::Capacitor
            | ComponentKind::Inductor
            | ComponentKind::Crystal
            | ComponentKind::Waveguide => {
                let z = self.impedance(f);
                // An inductor is a short at DC; mirror the solver's clamped
                // conductance instead of dividing by zero.
                if z.norm() < 1e-12 {
                    self.voltage_across() * 1.0e12
                } else {
                    self.voltage_across() / z
                }
            }
            ComponentKind::VoltageSource => self.state.branch_current,
            ComponentKind::Diode => self.diode_current(),
            ComponentKind::Bjt(p) => self.bjt_collector_current(p),
            ComponentKind::Mosfet(p) => self.mosfet_drain_current(p),
            ComponentKind::OpAmp => C::default(),
            ComponentKind::TransmissionLine | ComponentKind::Transformer => {
                self.voltage_across() / self.impedance(f)
            }
            ComponentKind::Circulator => self.circulator_port_current(),
            ComponentKind::Isolator => self.isolator_current(),
            ComponentKind::Coupler => self.coupler_port_current(),
            ComponentKind::Attenuator => self.attenuator_current(),
            ComponentKind::PhaseShifter => self.phase_shifter_current(),
        }
    }

    /// Voltage across the element's primary terminal pair.
    #[must_use]
    pub fn voltage_across(&self) -> C {
        match self.kind {
            // Collector-emitter / drain-source spans pins 0 and 2.
            ComponentKind::Bjt(_) | ComponentKind::Mosfet(_) => {
                self.pin_voltage(0) - self.pin_voltage(2)
            }
            ComponentKind::OpAmp => self.opamp_output_voltage(),
            _ => self.pin_voltage(0) - self.pin_voltage(1),
        }
    }

    /// Integrates one timestep of element memory. Callers must invoke this
    /// exactly once per transient step; each call advances the element's
    /// physical state by `dt`.
    pub fn advance_state(&mut self, dt: Scalar) {
        match self.kind {
            ComponentKind::Resistor | ComponentKind::Diode => {}
            ComponentKind::Capacitor => {
                let i = self.current_through().norm();
                self.state.charge += i * dt;
            }
            ComponentKind::Inductor => {
                let v = self.voltage_across().norm();
                self.state.flux += v * dt;
            }
            ComponentKind::VoltageSource => {
                self.state.clock += dt;
            }
            ComponentKind::Bjt(p) => {
                let ib = self.bjt_base_current(p).norm();
                self.state.charge += ib * dt;
            }
            ComponentKind::Mosfet(_) => {
                // Gate leakage only.
                self.state.charge += 1e-12 * dt;
            }
            ComponentKind::OpAmp => {
                self.state.output_voltage = self.opamp_output_voltage();
            }
            ComponentKind::Crystal | ComponentKind::Waveguide => {
                let p = (self.voltage_across() * self.current_through().conj()).norm();
                self.state.stored_energy += p * dt;
            }
            ComponentKind::TransmissionLine => self.line_advance(dt),
            ComponentKind::Transformer => {
                self.state.flux += self.voltage_across().norm() * dt;
                self.state.secondary_flux += self.transformer_secondary_voltage().norm() * dt;
            }
            ComponentKind::Circulator
            | ComponentKind::Isolator
            | ComponentKind::Coupler
            | ComponentKind::PhaseShifter => {}
            ComponentKind::Attenuator => {
                let p = (self.voltage_across() * self.current_through().conj()).norm();
                self.state.dissipated_power = p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn resistor_impedance_is_real_and_frequency_independent() {
        let r = Component::resistor("R1", 100.0);
        for f in [0.0, 1.0e3, 1.0e9] {
            let z = r.impedance(f);
            assert_relative_eq!(z.re, 100.0);
            assert_relative_eq!(z.im, 0.0);
        }
    }

    #[test]
    fn capacitor_reactance_follows_one_over_two_pi_f_c() {
        let c = Component::capacitor("C1", 1e-6);
        let f = 1.0e3;
        let z = c.impedance(f);
        assert_relative_eq!(z.norm(), 1.0 / (2.0 * PI * f * 1e-6), max_relative = 1e-12);
        assert_relative_eq!(z.arg().to_degrees(), -90.0, epsilon = 1e-9);
    }

    #[test]
    fn capacitor_at_dc_is_bounded_not_nan() {
        let c = Component::capacitor("C1", 1e-6);
        let z = c.impedance(0.0);
        assert!(z.norm().is_finite());
        assert_relative_eq!(z.re, OPEN_CIRCUIT_IMPEDANCE);
    }

    #[test]
    fn inductor_reactance_follows_two_pi_f_l() {
        let l = Component::inductor("L1", 1e-3);
        let f = 1.0e4;
        let z = l.impedance(f);
        assert_relative_eq!(z.norm(), 2.0 * PI * f * 1e-3, max_relative = 1e-12);
        assert_relative_eq!(z.arg().to_degrees(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn voltage_source_impedance_is_zero() {
        let v = Component::voltage_source("V1", 5.0, 0.0);
        assert_relative_eq!(v.impedance(1.0e6).norm(), 0.0);
    }

    #[test]
    fn sinusoidal_source_tracks_its_clock() {
        let mut v = Component::voltage_source("V1", 1.0, 1.0e3);
        assert_relative_eq!(v.source_voltage().re, 1.0, epsilon = 1e-12);
        // Quarter period later the phasor has rotated 90 degrees.
        v.advance_state(0.25e-3);
        let p = v.source_voltage();
        assert_relative_eq!(p.re, 0.0, epsilon = 1e-9);
        assert_relative_eq!(p.im, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn unbiased_diode_reports_bounded_impedance() {
        let d = Component::diode("D1");
        let z = d.impedance(0.0);
        assert!(z.norm().is_finite());
        assert!(z.re >= OPEN_CIRCUIT_IMPEDANCE);
    }

    #[test]
    fn capacitor_accumulates_charge_per_step() {
        let mut c = Component::capacitor("C1", 1e-6);
        c.set_pin_voltages(&[C::new(1.0, 0.0), C::default()], 1.0e3);
        let before = c.state.charge;
        c.advance_state(1e-6);
        assert!(c.state.charge > before);
    }

    #[test]
    fn pin_count_matches_declared_names() {
        for kind in [
            ComponentKind::Resistor,
            ComponentKind::Bjt(BjtPolarity::Npn),
            ComponentKind::Coupler,
            ComponentKind::TransmissionLine,
        ] {
            assert_eq!(kind.pin_count(), kind.pin_names().len());
        }
    }
}
