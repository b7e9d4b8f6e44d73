//! Distributed elements: transmission lines, transformers, waveguides.

use std::f64::consts::PI;

use crate::constants::{FREE_SPACE_IMPEDANCE, SPEED_OF_LIGHT};
use crate::math::{C, Scalar};

use super::component::{Component, ComponentKind};

impl Component {
    /// Uniform transmission line of `length` meters with characteristic
    /// impedance `z0` and the given velocity factor.
    /// Pins: in+, in-, out+, out-.
    #[must_use]
    pub fn transmission_line(
        name: impl Into<String>,
        length: Scalar,
        z0: Scalar,
        velocity_factor: Scalar,
    ) -> Self {
        let mut c = Self::new(name, ComponentKind::TransmissionLine);
        c.set_parameter("length", length);
        c.set_parameter("z0", z0);
        c.set_parameter("vf", velocity_factor);
        c.set_parameter("loss", 0.1);
        c
    }

    /// Two-winding transformer with the given turns ratio and primary
    /// inductance. Pins: p1, p2, s1, s2.
    #[must_use]
    pub fn transformer(
        name: impl Into<String>,
        turns_ratio: Scalar,
        primary_inductance: Scalar,
    ) -> Self {
        let mut c = Self::new(name, ComponentKind::Transformer);
        c.set_parameter("turns_ratio", turns_ratio);
        c.set_parameter("lp", primary_inductance);
        c.set_parameter("coupling", 0.99);
        c.set_parameter("rp", 0.1);
        c.set_parameter("rs", 0.1);
        c
    }

    /// Rectangular waveguide section with cutoff frequency `cutoff` hertz.
    #[must_use]
    pub fn waveguide(
        name: impl Into<String>,
        width: Scalar,
        height: Scalar,
        cutoff: Scalar,
    ) -> Self {
        let mut c = Self::new(name, ComponentKind::Waveguide);
        c.set_parameter("width", width);
        c.set_parameter("height", height);
        c.set_parameter("fc", cutoff);
        c.set_parameter("loss", 0.1);
        c
    }

    fn line_input_voltage(&self) -> C {
        self.pin_voltage(0) - self.pin_voltage(1)
    }

    fn line_delay(&self) -> Scalar {
        let length = self.parameter("length");
        let vf = self.parameter("vf");
        length / (SPEED_OF_LIGHT * vf)
    }

    /// Line voltage one propagation delay in the past (transient runs only).
    #[must_use]
    pub fn delayed_voltage(&self) -> C {
        self.state
            .line_history
            .back()
            .map(|(v, _)| *v)
            .unwrap_or_default()
    }

    /// Line current one propagation delay in the past (transient runs only).
    #[must_use]
    pub fn delayed_current(&self) -> C {
        self.state
            .line_history
            .back()
            .map(|(_, i)| *i)
            .unwrap_or_default()
    }

    fn line_load_impedance(&self) -> C {
        let vl = self.pin_voltage(2) - self.pin_voltage(3);
        let il = self.delayed_current();
        if il.norm() < 1e-12 {
            C::new(self.parameter("z0"), 0.0)
        } else {
            vl / il
        }
    }

    pub(crate) fn line_impedance(&self, frequency: Scalar) -> C {
        let z0 = C::new(self.parameter("z0"), 0.0);
        let length = self.parameter("length");
        let loss = self.parameter("loss");
        let vf = self.parameter("vf");

        // Propagation constant γ = α + jβ; loss is specified per meter at 1 GHz.
        let beta = 2.0 * PI * frequency / (SPEED_OF_LIGHT * vf);
        let alpha = loss * frequency / 1e9;
        let gamma = C::new(alpha, beta) * length;

        let zl = self.line_load_impedance();
        let (ch, sh) = (gamma.cosh(), gamma.sinh());
        z0 * (zl * ch + z0 * sh) / (z0 * ch + zl * sh)
    }

    pub(crate) fn line_advance(&mut self, dt: Scalar) {
        let v_in = self.line_input_voltage();
        let i_in = self.current_through();
        self.state.line_history.push_front((v_in, i_in));

        // Keep only one propagation delay of history.
        let max_history = (self.line_delay() / dt).max(1.0) as usize;
        while self.state.line_history.len() > max_history {
            self.state.line_history.pop_back();
        }
    }

    fn transformer_primary_voltage(&self) -> C {
        self.pin_voltage(0) - self.pin_voltage(1)
    }

    pub(crate) fn transformer_primary_impedance(&self, frequency: Scalar) -> C {
        let lp = self.parameter("lp");
        let rp = self.parameter("rp");
        C::new(rp, 2.0 * PI * frequency * lp)
    }

    /// Secondary winding voltage implied by the turns ratio and coupling.
    #[must_use]
    pub fn transformer_secondary_voltage(&self) -> C {
        let n = self.parameter("turns_ratio");
        let k = self.parameter("coupling");
        self.transformer_primary_voltage() * n * k
    }

    /// Impedance seen looking into the secondary winding.
    #[must_use]
    pub fn transformer_secondary_impedance(&self, frequency: Scalar) -> C {
        let n = self.parameter("turns_ratio");
        let rs = self.parameter("rs");
        C::new(rs, 0.0) + self.transformer_primary_impedance(frequency) * n * n
    }

    pub(crate) fn waveguide_impedance(&self, frequency: Scalar) -> C {
        let fc = self.parameter("fc");
        if frequency < fc {
            // Evanescent below cutoff: purely reactive, bounded.
            return C::new(0.0, 1e6);
        }
        // TE-mode wave impedance η / sqrt(1 - (fc/f)^2).
        let ratio = fc / frequency;
        C::new(FREE_SPACE_IMPEDANCE / (1.0 - ratio * ratio).sqrt(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn unloaded_line_presents_its_characteristic_impedance_at_dc() {
        let tl = Component::transmission_line("TL1", 1.0, 50.0, 0.66);
        let z = tl.line_impedance(0.0);
        assert_relative_eq!(z.re, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn quarter_wave_line_inverts_the_mismatch() {
        // With no current history the load defaults to z0, so the input stays
        // matched at every electrical length.
        let mut tl = Component::transmission_line("TL1", 1.0, 50.0, 1.0);
        tl.set_parameter("loss", 0.0);
        let f_quarter = SPEED_OF_LIGHT / 4.0;
        let z = tl.line_impedance(f_quarter);
        assert_relative_eq!(z.re, 50.0, max_relative = 1e-6);
    }

    #[test]
    fn line_history_is_bounded_by_the_delay() {
        let mut tl = Component::transmission_line("TL1", 1.0, 50.0, 1.0);
        let dt = tl.line_delay() / 4.0;
        for _ in 0..32 {
            tl.advance_state(dt);
        }
        assert!(tl.state.line_history.len() <= 4);
    }

    #[test]
    fn transformer_secondary_scales_by_turns_and_coupling() {
        let mut t = Component::transformer("T1", 2.0, 1e-3);
        t.set_pin_voltages(
            &[C::new(1.0, 0.0), C::default(), C::default(), C::default()],
            0.0,
        );
        assert_relative_eq!(
            t.transformer_secondary_voltage().re,
            2.0 * 0.99,
            epsilon = 1e-12
        );
    }

    #[test]
    fn waveguide_is_reactive_below_cutoff_and_real_above() {
        let wg = Component::waveguide("WG1", 0.0229, 0.0102, 6.56e9);
        let below = wg.waveguide_impedance(5.0e9);
        assert_relative_eq!(below.re, 0.0);
        assert!(below.im > 0.0);
        let above = wg.waveguide_impedance(10.0e9);
        assert!(above.re > FREE_SPACE_IMPEDANCE);
        assert_relative_eq!(above.im, 0.0);
    }
}
