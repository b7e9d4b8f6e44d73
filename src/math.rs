//! Shared numerical primitives anchored on `nalgebra` and `num-complex`.

use num_complex::Complex;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Primary complex scalar type used for phasors.
pub type C = Complex<Scalar>;

/// Impedance magnitude used as a bounded stand-in for "effectively infinite".
///
/// Reactive elements at zero frequency and dynamic-impedance devices with no
/// bias current report this instead of `inf`, so admittances stay finite when
/// stamped into the MNA matrix.
pub const OPEN_CIRCUIT_IMPEDANCE: Scalar = 1.0e12;

/// Returns the complex exponential `e^(j * theta)`.
#[must_use]
pub fn phasor(theta: Scalar) -> C {
    C::from_polar(1.0, theta)
}

/// Magnitude of a complex value in decibels, clamped away from `-inf`.
#[must_use]
pub fn db(value: C) -> Scalar {
    20.0 * value.norm().max(1e-300).log10()
}

/// Converts a dB loss/ratio to a linear voltage ratio.
#[must_use]
pub fn db_to_linear(db: Scalar) -> Scalar {
    10.0_f64.powf(db / 20.0)
}
