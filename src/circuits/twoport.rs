//! Two-port parameter sets and conversions between them.
//!
//! Impedance (Z) and scattering (S) representations are interconvertible for
//! a real reference impedance; the stability and antenna analyzers build on
//! these conversions.

use crate::math::{C, Scalar, db};

/// Impedance parameters of a linear two-port.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZParameters {
    /// Open-circuit input impedance V1/I1 with I2 = 0.
    pub z11: C,
    /// Reverse transfer impedance V1/I2 with I1 = 0.
    pub z12: C,
    /// Forward transfer impedance V2/I1 with I2 = 0.
    pub z21: C,
    /// Open-circuit output impedance V2/I2 with I1 = 0.
    pub z22: C,
}

impl ZParameters {
    /// Converts to S-parameters against a real reference impedance `z0`.
    /// Returns `None` when the conversion denominator vanishes.
    #[must_use]
    pub fn to_s(&self, z0: Scalar) -> Option<SParameters> {
        let z0 = C::new(z0, 0.0);
        let den = (self.z11 + z0) * (self.z22 + z0) - self.z12 * self.z21;
        if den.norm() == 0.0 {
            return None;
        }
        Some(SParameters {
            s11: ((self.z11 - z0) * (self.z22 + z0) - self.z12 * self.z21) / den,
            s12: 2.0 * z0 * self.z12 / den,
            s21: 2.0 * z0 * self.z21 / den,
            s22: ((self.z11 + z0) * (self.z22 - z0) - self.z12 * self.z21) / den,
        })
    }
}

/// Scattering parameters under a single real reference impedance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SParameters {
    /// Reflection at port 1.
    pub s11: C,
    /// Reverse transmission.
    pub s12: C,
    /// Forward transmission.
    pub s21: C,
    /// Reflection at port 2.
    pub s22: C,
}

impl SParameters {
    /// Determinant Δ = S11·S22 − S12·S21.
    #[must_use]
    pub fn delta(&self) -> C {
        self.s11 * self.s22 - self.s12 * self.s21
    }

    /// Forward transmission |S21| in dB.
    #[must_use]
    pub fn s21_db(&self) -> Scalar {
        db(self.s21)
    }

    /// Converts back to Z-parameters against `z0`. Returns `None` when the
    /// conversion denominator vanishes.
    #[must_use]
    pub fn to_z(&self, z0: Scalar) -> Option<ZParameters> {
        let z0 = C::new(z0, 0.0);
        let one = C::new(1.0, 0.0);
        let den = (one - self.s11) * (one - self.s22) - self.s12 * self.s21;
        if den.norm() == 0.0 {
            return None;
        }
        Some(ZParameters {
            z11: z0 * ((one + self.s11) * (one - self.s22) + self.s12 * self.s21) / den,
            z12: z0 * 2.0 * self.s12 / den,
            z21: z0 * 2.0 * self.s21 / den,
            z22: z0 * ((one - self.s11) * (one + self.s22) + self.s12 * self.s21) / den,
        })
    }
}

/// Reflection coefficient of impedance `z` against a real reference `z0`.
#[must_use]
pub fn reflection_coefficient(z: C, z0: Scalar) -> C {
    let z0 = C::new(z0, 0.0);
    (z - z0) / (z + z0)
}

/// Voltage standing wave ratio implied by a reflection coefficient.
#[must_use]
pub fn vswr(gamma: C) -> Scalar {
    let mag = gamma.norm();
    if mag >= 1.0 {
        Scalar::INFINITY
    } else {
        (1.0 + mag) / (1.0 - mag)
    }
}
