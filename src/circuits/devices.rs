//! Semiconductor and resonator elements: BJT, MOSFET, op-amp, crystal.
//!
//! Device equations are the classic closed forms evaluated about the last
//! solved operating point — exponential junction law with Early effect for
//! the BJT, square-law regions for the MOSFET. No Newton iteration happens
//! here; the analyzer re-linearizes on every solve.

use std::f64::consts::PI;

use crate::math::{C, OPEN_CIRCUIT_IMPEDANCE, Scalar};

use super::component::{BjtPolarity, Component, ComponentKind, MosPolarity};

impl Component {
    /// Bipolar transistor with textbook default parameters (β = 100,
    /// IS = 10 fA, VT = 26 mV, VA = 100 V). Pins: collector, base, emitter.
    #[must_use]
    pub fn bjt(name: impl Into<String>, polarity: BjtPolarity) -> Self {
        let mut c = Self::new(name, ComponentKind::Bjt(polarity));
        c.set_parameter("beta", 100.0);
        c.set_parameter("is", 1e-14);
        c.set_parameter("vt", 0.026);
        c.set_parameter("va", 100.0);
        c
    }

    /// MOSFET with default threshold and transconductance parameters.
    /// Pins: drain, gate, source.
    #[must_use]
    pub fn mosfet(name: impl Into<String>, polarity: MosPolarity) -> Self {
        let mut c = Self::new(name, ComponentKind::Mosfet(polarity));
        c.set_parameter("vth", 0.7);
        c.set_parameter("kp", 20e-6);
        c.set_parameter("lambda", 0.01);
        c
    }

    /// Op-amp with finite open-loop gain and output saturation.
    /// Pins: in+, in-, out.
    #[must_use]
    pub fn opamp(name: impl Into<String>) -> Self {
        let mut c = Self::new(name, ComponentKind::OpAmp);
        c.set_parameter("gain", 1e5);
        c.set_parameter("gbw", 1e6);
        c.set_parameter("vsat", 15.0);
        c.set_parameter("rin", 1e6);
        c
    }

    /// Quartz crystal resonant at `frequency` hertz. The motional inductance
    /// and resistance are derived from the resonant frequency, Q, and the
    /// motional capacitance.
    #[must_use]
    pub fn crystal(name: impl Into<String>, frequency: Scalar) -> Self {
        let mut c = Self::new(name, ComponentKind::Crystal);
        c.set_parameter("frequency", frequency);
        c.set_parameter("q", 10_000.0);
        c.set_parameter("c0", 5e-12);
        c.set_parameter("cm", 1e-12);
        c
    }

    fn bjt_base_emitter_voltage(&self) -> C {
        self.pin_voltage(1) - self.pin_voltage(2)
    }

    fn bjt_base_collector_voltage(&self) -> C {
        self.pin_voltage(1) - self.pin_voltage(0)
    }

    pub(crate) fn bjt_collector_current(&self, polarity: BjtPolarity) -> C {
        let vbe = self.bjt_base_emitter_voltage().norm();
        let vbc = self.bjt_base_collector_voltage().norm();
        let is = self.parameter("is");
        let vt = self.parameter("vt");
        let va = self.parameter("va");

        let ic = is * ((vbe / vt).exp() - 1.0) * (1.0 + vbc / va);
        let ic = match polarity {
            BjtPolarity::Npn => ic,
            BjtPolarity::Pnp => -ic,
        };
        C::new(ic, 0.0)
    }

    pub(crate) fn bjt_base_current(&self, polarity: BjtPolarity) -> C {
        self.bjt_collector_current(polarity) / self.parameter("beta")
    }

    pub(crate) fn bjt_impedance(&self, polarity: BjtPolarity) -> C {
        // Small-signal emitter resistance re = VT / IC about the bias point.
        let ic = self.bjt_collector_current(polarity).norm();
        if ic < 1e-15 {
            C::new(OPEN_CIRCUIT_IMPEDANCE, 0.0)
        } else {
            C::new(self.parameter("vt") / ic, 0.0)
        }
    }

    fn mosfet_gate_source_voltage(&self) -> C {
        self.pin_voltage(1) - self.pin_voltage(2)
    }

    fn mosfet_drain_source_voltage(&self) -> C {
        self.pin_voltage(0) - self.pin_voltage(2)
    }

    pub(crate) fn mosfet_drain_current(&self, polarity: MosPolarity) -> C {
        let vgs = self.mosfet_gate_source_voltage().norm();
        let vds = self.mosfet_drain_source_voltage().norm();
        let vth = self.parameter("vth");
        let kp = self.parameter("kp");
        let lambda = self.parameter("lambda");

        let id = if vgs <= vth {
            0.0
        } else if vds <= vgs - vth {
            kp * ((vgs - vth) * vds - vds * vds / 2.0) * (1.0 + lambda * vds)
        } else {
            kp / 2.0 * (vgs - vth).powi(2) * (1.0 + lambda * vds)
        };
        let id = match polarity {
            MosPolarity::Nmos => id,
            MosPolarity::Pmos => -id,
        };
        C::new(id, 0.0)
    }

    pub(crate) fn mosfet_impedance(&self, polarity: MosPolarity) -> C {
        let id = self.mosfet_drain_current(polarity).norm();
        let vgs = self.mosfet_gate_source_voltage().norm();
        let vth = self.parameter("vth");
        if id < 1e-12 || vgs <= vth {
            C::new(OPEN_CIRCUIT_IMPEDANCE, 0.0)
        } else {
            C::new(1.0 / (self.parameter("kp") * (vgs - vth)), 0.0)
        }
    }

    pub(crate) fn opamp_output_voltage(&self) -> C {
        let vdiff = self.pin_voltage(0) - self.pin_voltage(1);
        let vout = vdiff * self.parameter("gain");
        let vsat = self.parameter("vsat");
        if vout.norm() > vsat {
            // Clip to the rail, preserving phase.
            vout / vout.norm() * vsat
        } else {
            vout
        }
    }

    pub(crate) fn crystal_impedance(&self, frequency: Scalar) -> C {
        let f0 = self.parameter("frequency");
        let q = self.parameter("q");
        let c0 = self.parameter("c0");
        let cm = self.parameter("cm");

        if frequency == 0.0 {
            return C::new(OPEN_CIRCUIT_IMPEDANCE, 0.0);
        }

        // Motional branch derived from the series-resonance condition.
        let lm = 1.0 / (4.0 * PI * PI * f0 * f0 * cm);
        let rm = 2.0 * PI * f0 * lm / q;

        let w = 2.0 * PI * frequency;
        let zc0 = C::new(0.0, -1.0 / (w * c0));
        let zcm = C::new(0.0, -1.0 / (w * cm));
        let zlm = C::new(0.0, w * lm);

        let zm = C::new(rm, 0.0) + zcm + zlm;
        (zc0 * zm) / (zc0 + zm)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn biased(mut c: Component, pins: &[C]) -> Component {
        c.set_pin_voltages(pins, 0.0);
        c
    }

    #[test]
    fn bjt_collector_current_grows_exponentially_with_vbe() {
        let q = Component::bjt("Q1", BjtPolarity::Npn);
        let lo = biased(
            q.clone(),
            &[C::new(5.0, 0.0), C::new(0.60, 0.0), C::default()],
        );
        let hi = biased(q, &[C::new(5.0, 0.0), C::new(0.66, 0.0), C::default()]);
        let ratio = hi.bjt_collector_current(BjtPolarity::Npn).re
            / lo.bjt_collector_current(BjtPolarity::Npn).re;
        // 60 mV of drive is close to a decade of collector current.
        assert!(ratio > 8.0 && ratio < 12.0, "ratio was {ratio}");
    }

    #[test]
    fn pnp_collector_current_is_negated() {
        let q = biased(
            Component::bjt("Q2", BjtPolarity::Pnp),
            &[C::new(5.0, 0.0), C::new(0.65, 0.0), C::default()],
        );
        assert!(q.bjt_collector_current(BjtPolarity::Pnp).re < 0.0);
    }

    #[test]
    fn mosfet_cutoff_below_threshold() {
        let m = biased(
            Component::mosfet("M1", MosPolarity::Nmos),
            &[C::new(5.0, 0.0), C::new(0.3, 0.0), C::default()],
        );
        assert_relative_eq!(m.mosfet_drain_current(MosPolarity::Nmos).norm(), 0.0);
        assert_relative_eq!(
            m.mosfet_impedance(MosPolarity::Nmos).re,
            crate::math::OPEN_CIRCUIT_IMPEDANCE
        );
    }

    #[test]
    fn mosfet_saturation_follows_square_law() {
        let m = biased(
            Component::mosfet("M1", MosPolarity::Nmos),
            &[C::new(5.0, 0.0), C::new(1.7, 0.0), C::default()],
        );
        let id = m.mosfet_drain_current(MosPolarity::Nmos).re;
        // kp/2 * (vgs-vth)^2 * (1 + lambda*vds) with vgs-vth = 1, vds = 5
        let expected = 20e-6 / 2.0 * 1.0 * (1.0 + 0.01 * 5.0);
        assert_relative_eq!(id, expected, max_relative = 1e-9);
    }

    #[test]
    fn opamp_output_saturates_at_the_rail() {
        let a = biased(
            Component::opamp("U1"),
            &[C::new(1.0, 0.0), C::default(), C::default()],
        );
        assert_relative_eq!(a.opamp_output_voltage().norm(), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn crystal_impedance_dips_at_series_resonance() {
        let x = Component::crystal("X1", 10.0e6);
        let z_res = x.crystal_impedance(10.0e6).norm();
        let z_off = x.crystal_impedance(9.0e6).norm();
        assert!(z_res < z_off / 10.0, "z_res={z_res} z_off={z_off}");
    }
}
