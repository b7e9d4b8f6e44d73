//! Far-field pattern utilities for wire antennas.
//!
//! Element patterns use the standard thin-wire expressions; directivity is
//! integrated numerically over the sphere and the feed-point impedance uses
//! the usual empirical interpolation around the half-wave values. An
//! L-network matcher against a real reference ties back into the circuit
//! component values.

use std::f64::consts::PI;

use crate::circuits::twoport::{reflection_coefficient, vswr};
use crate::constants::wavelength_from_frequency;
use crate::math::{C, Scalar};

/// Wire antenna geometry.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AntennaKind {
    /// Thin-wire dipole of total length `length_m`.
    Dipole {
        /// Total element length in meters.
        length_m: Scalar,
    },
    /// Monopole of `length_m` over an ideal ground plane.
    Monopole {
        /// Element length in meters.
        length_m: Scalar,
    },
}

/// L-network matching solution. Element values follow the shunt-first
/// convention: the shunt leg sits across the higher-impedance side.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingNetwork {
    /// Shunt element value: henries when an inductor, farads otherwise.
    pub shunt_value: Scalar,
    /// Series element value: henries when an inductor, farads otherwise.
    pub series_value: Scalar,
    /// True when the shunt leg is an inductor.
    pub shunt_is_inductor: bool,
    /// True when the series leg is an inductor.
    pub series_is_inductor: bool,
}

/// Pattern, gain, and matching analysis for a wire antenna at one frequency.
#[derive(Debug, Clone, Copy)]
pub struct AntennaAnalyzer {
    frequency_hz: Scalar,
    kind: AntennaKind,
    efficiency: Scalar,
}

impl AntennaAnalyzer {
    /// Creates an analyzer; `efficiency` is clamped to [0, 1].
    #[must_use]
    pub fn new(frequency_hz: Scalar, kind: AntennaKind, efficiency: Scalar) -> Self {
        Self {
            frequency_hz,
            kind,
            efficiency: efficiency.clamp(0.0, 1.0),
        }
    }

    /// Operating wavelength in meters.
    #[must_use]
    pub fn wavelength(&self) -> Scalar {
        wavelength_from_frequency(self.frequency_hz)
    }

    fn wave_number(&self) -> Scalar {
        2.0 * PI / self.wavelength()
    }

    /// Un-normalized |E(θ)| of the element pattern.
    fn e_field(&self, theta: Scalar) -> Scalar {
        let sin_t = theta.sin();
        if sin_t.abs() < 1e-12 {
            return 0.0;
        }
        match self.kind {
            AntennaKind::Dipole { length_m } => {
                let kl2 = self.wave_number() * length_m / 2.0;
                (((kl2 * theta.cos()).cos() - kl2.cos()) / sin_t).abs()
            }
            AntennaKind::Monopole { length_m } => {
                // Image theory: upper hemisphere of a doubled dipole.
                if theta > PI / 2.0 {
                    return 0.0;
                }
                let kl2 = self.wave_number() * length_m;
                (((kl2 * theta.cos()).cos() - kl2.cos()) / sin_t).abs()
            }
        }
    }

    /// Normalized pattern in dB: 0 dB at the peak, floored at −100 dB.
    #[must_use]
    pub fn radiation_pattern_db(&self, theta: Scalar) -> Scalar {
        let peak = self.peak_e_field();
        let e = self.e_field(theta);
        if peak < 1e-30 || e < 1e-30 {
            return -100.0;
        }
        20.0 * (e / peak).log10()
    }

    fn peak_e_field(&self) -> Scalar {
        let mut max_e: Scalar = 0.0;
        for i in 1..180 {
            let theta = Scalar::from(i) * PI / 180.0;
            max_e = max_e.max(self.e_field(theta));
        }
        max_e
    }

    /// Directivity in dBi from numerical integration of the radiation
    /// intensity over the sphere.
    #[must_use]
    pub fn directivity_dbi(&self) -> Scalar {
        let n_theta = 720;
        let d_theta = PI / Scalar::from(n_theta);

        let mut u_max: Scalar = 0.0;
        let mut p_rad = 0.0;
        for i in 0..n_theta {
            let theta = (Scalar::from(i) + 0.5) * d_theta;
            let u = self.e_field(theta).powi(2);
            u_max = u_max.max(u);
            // Azimuthal symmetry: the φ integral contributes 2π.
            p_rad += u * theta.sin() * d_theta * 2.0 * PI;
        }
        if p_rad < 1e-30 {
            return 0.0;
        }
        10.0 * (4.0 * PI * u_max / p_rad).log10()
    }

    /// Realized gain in dBi: directivity scaled by radiation efficiency.
    #[must_use]
    pub fn gain_dbi(&self) -> Scalar {
        self.directivity_dbi() + 10.0 * self.efficiency.max(1e-12).log10()
    }

    /// Half-power beamwidth in the elevation plane, degrees.
    #[must_use]
    pub fn half_power_beamwidth(&self) -> Scalar {
        let step = 0.1;
        let mut left = None;
        let mut right = None;
        let mut deg: Scalar = step;
        while deg < 180.0 {
            if self.radiation_pattern_db(deg.to_radians()) >= -3.0 {
                left.get_or_insert(deg);
                right = Some(deg);
            }
            deg += step;
        }
        match (left, right) {
            (Some(l), Some(r)) => r - l,
            _ => 360.0,
        }
    }

    /// Approximate feed-point impedance (R + jX) in ohms.
    #[must_use]
    pub fn input_impedance(&self) -> C {
        match self.kind {
            AntennaKind::Dipole { length_m } => {
                // Interpolation around the half-wave values 73 + j42.5.
                let ratio = length_m / self.wavelength();
                let r = 73.0 + 200.0 * (ratio - 0.5).powi(2);
                let x = 42.5 * (2.0 * PI * ratio).tan().clamp(-10.0, 10.0);
                C::new(r, x)
            }
            AntennaKind::Monopole { length_m } => {
                // Half the equivalent dipole by image theory.
                let ratio = 2.0 * length_m / self.wavelength();
                let r = (73.0 + 200.0 * (ratio - 0.5).powi(2)) / 2.0;
                let x = 42.5 / 2.0 * (2.0 * PI * ratio).tan().clamp(-10.0, 10.0);
                C::new(r, x)
            }
        }
    }

    /// VSWR of the feed against a real reference impedance.
    #[must_use]
    pub fn feed_vswr(&self, z0: Scalar) -> Scalar {
        vswr(reflection_coefficient(self.input_impedance(), z0))
    }

    /// Effective aperture Ae = G·λ²/(4π) in m².
    #[must_use]
    pub fn effective_area(&self) -> Scalar {
        let g = 10.0_f64.powf(self.gain_dbi() / 10.0);
        let lambda = self.wavelength();
        g * lambda * lambda / (4.0 * PI)
    }

    /// Estimated −10 dB return-loss bandwidth in hertz, from the feed Q.
    #[must_use]
    pub fn bandwidth_estimate(&self) -> Scalar {
        let z = self.input_impedance();
        if z.re < 1e-12 {
            return 0.0;
        }
        let q = z.im.abs() / z.re;
        let fractional = if q < 0.1 {
            0.20
        } else {
            (2.0 / (q * 2.0_f64.sqrt())).min(0.50)
        };
        self.frequency_hz * fractional
    }

    /// Computes an L-network matching the feed to a real `z0`. Returns `None`
    /// for a degenerate (zero-resistance) feed or an already-matched one.
    #[must_use]
    pub fn matching_network(&self, z0: Scalar) -> Option<MatchingNetwork> {
        let z_a = self.input_impedance();
        let (r_a, x_a) = (z_a.re, z_a.im);
        if r_a < 1e-12 {
            return None;
        }

        let omega = 2.0 * PI * self.frequency_hz;
        let (r_big, r_small, antenna_is_high) = if r_a > z0 {
            (r_a, z0, true)
        } else {
            (z0, r_a, false)
        };
        let q = (r_big / r_small - 1.0).max(0.0).sqrt();
        if q == 0.0 {
            return None;
        }

        let x_shunt = r_big / q;
        let x_series_needed = q * r_small;
        // The antenna's own reactance folds into the series leg when the
        // series element sits on the antenna side.
        let x_series = if antenna_is_high {
            x_series_needed
        } else {
            x_series_needed - x_a
        };

        let (shunt_value, shunt_is_inductor) = if x_shunt >= 0.0 {
            (x_shunt / omega, true)
        } else {
            (1.0 / (omega * x_shunt.abs()), false)
        };
        let (series_value, series_is_inductor) = if x_series >= 0.0 {
            (x_series / omega, true)
        } else {
            (1.0 / (omega * x_series.abs()), false)
        };

        Some(MatchingNetwork {
            shunt_value,
            series_value,
            shunt_is_inductor,
            series_is_inductor,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::constants::SPEED_OF_LIGHT;

    const FREQ: Scalar = 2.4e9;

    fn half_wave_dipole() -> AntennaAnalyzer {
        let lambda = SPEED_OF_LIGHT / FREQ;
        AntennaAnalyzer::new(
            FREQ,
            AntennaKind::Dipole {
                length_m: lambda / 2.0,
            },
            1.0,
        )
    }

    #[test]
    fn half_wave_dipole_directivity_is_about_2_15_dbi() {
        let d = half_wave_dipole().directivity_dbi();
        assert!((d - 2.15).abs() < 0.3, "directivity {d}");
    }

    #[test]
    fn gain_equals_directivity_at_unity_efficiency() {
        let a = half_wave_dipole();
        assert_relative_eq!(a.gain_dbi(), a.directivity_dbi(), epsilon = 1e-9);
    }

    #[test]
    fn pattern_peaks_broadside_with_a_null_on_axis() {
        let a = half_wave_dipole();
        assert!(a.radiation_pattern_db(PI / 2.0).abs() < 0.5);
        assert!(a.radiation_pattern_db(0.01) < -20.0);
    }

    #[test]
    fn beamwidth_is_near_78_degrees() {
        let bw = half_wave_dipole().half_power_beamwidth();
        assert!((bw - 78.0).abs() < 8.0, "beamwidth {bw}");
    }

    #[test]
    fn feed_resistance_is_in_the_textbook_range() {
        let z = half_wave_dipole().input_impedance();
        assert!((60.0..=90.0).contains(&z.re), "R {}", z.re);
        let v = half_wave_dipole().feed_vswr(50.0);
        assert!(v >= 1.0);
    }

    #[test]
    fn monopole_feed_is_half_the_dipole() {
        let lambda = SPEED_OF_LIGHT / FREQ;
        let mono = AntennaAnalyzer::new(
            FREQ,
            AntennaKind::Monopole {
                length_m: lambda / 4.0,
            },
            1.0,
        );
        let r = mono.input_impedance().re;
        assert!((30.0..=45.0).contains(&r), "R {r}");
    }

    #[test]
    fn matching_network_produces_positive_elements() {
        let mn = half_wave_dipole().matching_network(50.0).unwrap();
        assert!(mn.shunt_value > 0.0);
        assert!(mn.series_value > 0.0);
    }

    #[test]
    fn effective_area_tracks_the_wavelength_squared() {
        let a = half_wave_dipole();
        let ratio = a.effective_area() / a.wavelength().powi(2);
        assert!((0.05..=0.25).contains(&ratio), "Ae/λ² {ratio}");
    }
}
