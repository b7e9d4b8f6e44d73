//! dB-rated RF passives: circulator, isolator, coupler, attenuator,
//! phase shifter.
//!
//! These elements behave as fixed S-matrices referenced to a real
//! characteristic impedance. Port currents are the S-weighted combination of
//! the pin voltages divided by the reference impedance.

use crate::math::{C, Scalar, db_to_linear, phasor};

use super::component::{Component, ComponentKind};

impl Component {
    /// Three-port circulator with the given reverse isolation in dB.
    /// Pins: port1, port2, port3.
    #[must_use]
    pub fn circulator(name: impl Into<String>, isolation_db: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Circulator);
        c.set_parameter("isolation", isolation_db);
        c.set_parameter("insertion_loss", 0.5);
        c.set_parameter("vswr", 1.2);
        c.set_parameter("impedance", 50.0);
        c
    }

    /// Two-port isolator: low forward loss, `isolation_db` in reverse.
    #[must_use]
    pub fn isolator(name: impl Into<String>, isolation_db: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Isolator);
        c.set_parameter("isolation", isolation_db);
        c.set_parameter("insertion_loss", 0.5);
        c.set_parameter("vswr", 1.2);
        c.set_parameter("impedance", 50.0);
        c
    }

    /// Four-port directional coupler with the given coupling factor in dB.
    /// Pins: input, through, coupled, isolated.
    #[must_use]
    pub fn coupler(name: impl Into<String>, coupling_db: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Coupler);
        c.set_parameter("coupling", coupling_db);
        c.set_parameter("directivity", 25.0);
        c.set_parameter("insertion_loss", 0.5);
        c.set_parameter("impedance", 50.0);
        c
    }

    /// Matched attenuator of `attenuation_db` with a 1 W power rating.
    #[must_use]
    pub fn attenuator(name: impl Into<String>, attenuation_db: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Attenuator);
        c.set_parameter("attenuation", attenuation_db);
        c.set_parameter("vswr", 1.2);
        c.set_parameter("impedance", 50.0);
        c.set_parameter("max_power", 1.0);
        c
    }

    /// Fixed phase shifter of `phase_deg` degrees.
    #[must_use]
    pub fn phase_shifter(name: impl Into<String>, phase_deg: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::PhaseShifter);
        c.set_parameter("phase_shift", phase_deg);
        c.set_parameter("insertion_loss", 1.0);
        c.set_parameter("vswr", 1.3);
        c.set_parameter("impedance", 50.0);
        c
    }

    pub(crate) fn circulator_port_current(&self) -> C {
        let il = db_to_linear(-self.parameter("insertion_loss"));
        let iso = db_to_linear(-self.parameter("isolation"));
        // Port-1 row of the ideal circulator S-matrix: [0, il, iso].
        let coupled = self.pin_voltage(1) * il + self.pin_voltage(2) * iso;
        coupled / self.parameter("impedance")
    }

    pub(crate) fn isolator_current(&self) -> C {
        let v_in = self.pin_voltage(0);
        let v_out = self.pin_voltage(1);
        let il = db_to_linear(-self.parameter("insertion_loss"));
        let iso = db_to_linear(-self.parameter("isolation"));

        // Forward transmission when the input drives; isolation otherwise.
        let factor = if v_in.norm() > v_out.norm() { il } else { iso };
        (v_in - v_out) * factor / self.parameter("impedance")
    }

    pub(crate) fn coupler_port_current(&self) -> C {
        let c = db_to_linear(-self.parameter("coupling"));
        let il = db_to_linear(-self.parameter("insertion_loss"));
        let d = db_to_linear(-self.parameter("directivity"));
        // Input-port row of the coupler S-matrix: [0, il, c, d].
        let coupled =
            self.pin_voltage(1) * il + self.pin_voltage(2) * c + self.pin_voltage(3) * d;
        coupled / self.parameter("impedance")
    }

    pub(crate) fn attenuator_current(&self) -> C {
        let att = db_to_linear(-self.parameter("attenuation"));
        (self.pin_voltage(0) - self.pin_voltage(1)) * att / self.parameter("impedance")
    }

    /// Power dissipated during the last transient step, watts.
    #[must_use]
    pub fn dissipated_power(&self) -> Scalar {
        self.state.dissipated_power
    }

    /// True when the last transient step exceeded the attenuator's rating.
    #[must_use]
    pub fn over_power(&self) -> bool {
        self.kind == ComponentKind::Attenuator
            && self.state.dissipated_power > self.parameter("max_power")
    }

    pub(crate) fn phase_shifter_current(&self) -> C {
        let il = db_to_linear(-self.parameter("insertion_loss"));
        let shift = phasor(self.parameter("phase_shift").to_radians());
        (self.pin_voltage(0) * shift - self.pin_voltage(1)) * il / self.parameter("impedance")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn attenuator_current_scales_with_rating() {
        let mut a = Component::attenuator("AT1", 20.0);
        a.set_pin_voltages(&[C::new(1.0, 0.0), C::default()], 1.0e9);
        // 20 dB -> 0.1 linear, across 50 ohms.
        assert_relative_eq!(a.current_through().re, 0.1 / 50.0, max_relative = 1e-12);
    }

    #[test]
    fn isolator_passes_forward_and_blocks_reverse() {
        let mut iso = Component::isolator("ISO1", 20.0);
        iso.set_pin_voltages(&[C::new(1.0, 0.0), C::default()], 1.0e9);
        let forward = iso.current_through().norm();
        iso.set_pin_voltages(&[C::default(), C::new(1.0, 0.0)], 1.0e9);
        let reverse = iso.current_through().norm();
        assert!(forward > 5.0 * reverse, "fwd={forward} rev={reverse}");
    }

    #[test]
    fn phase_shifter_rotates_the_input() {
        let mut ps = Component::phase_shifter("PS1", 90.0);
        ps.set_pin_voltages(&[C::new(1.0, 0.0), C::default()], 1.0e9);
        let i = ps.current_through();
        assert_relative_eq!(i.arg().to_degrees(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn circulator_couples_the_next_port() {
        let mut circ = Component::circulator("CIR1", 20.0);
        circ.set_pin_voltages(&[C::default(), C::new(1.0, 0.0), C::default()], 1.0e9);
        let i = circ.current_through();
        let il = db_to_linear(-0.5);
        assert_relative_eq!(i.re, il / 50.0, max_relative = 1e-12);
    }

    #[test]
    fn attenuator_tracks_dissipated_power_per_step() {
        let mut a = Component::attenuator("AT1", 3.0);
        a.set_parameter("max_power", 1e-6);
        a.set_pin_voltages(&[C::new(10.0, 0.0), C::default()], 1.0e9);
        a.advance_state(1e-6);
        assert!(a.dissipated_power() > 0.0);
        assert!(a.over_power());
    }

    #[test]
    fn rf_passives_present_their_reference_impedance() {
        for c in [
            Component::circulator("c", 20.0),
            Component::isolator("i", 20.0),
            Component::coupler("k", 20.0),
            Component::attenuator("a", 10.0),
            Component::phase_shifter("p", 45.0),
        ] {
            assert_relative_eq!(c.impedance(1.0e9).re, 50.0);
        }
    }
}
