//! Noise integration across registered thermal, shot, and flicker sources.

use crate::circuits::{Circuit, ComponentId};
use crate::constants::{BOLTZMANN_CONSTANT, ELEMENTARY_CHARGE, NOISE_REFERENCE_TEMPERATURE};
use crate::errors::{CircuitError, Result};
use crate::math::Scalar;
use crate::sweep::logspace_hz;

/// Physical origin of a registered noise contribution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    /// Johnson-Nyquist noise, 4kTR per hertz.
    Thermal,
    /// Shot noise, 2qI per hertz.
    Shot,
    /// 1/f noise with a caller-supplied magnitude K.
    Flicker,
}

/// One noise contributor tied to a circuit component.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    /// Mechanism generating the noise.
    pub kind: NoiseKind,
    /// Flicker magnitude K (ignored for thermal and shot sources).
    pub magnitude: Scalar,
    /// Component whose impedance or bias current feeds the formula.
    pub component: ComponentId,
}

/// Accumulates noise sources and integrates their spectral density.
#[derive(Debug, Clone, Default)]
pub struct NoiseAnalyzer {
    sources: Vec<NoiseSource>,
    temperature: Scalar,
}

impl NoiseAnalyzer {
    /// Creates an analyzer at the standard 290 K reference temperature.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            temperature: NOISE_REFERENCE_TEMPERATURE,
        }
    }

    /// Overrides the analysis temperature in kelvin.
    pub fn set_temperature(&mut self, kelvin: Scalar) {
        self.temperature = kelvin;
    }

    /// Registers a noise source.
    pub fn add_source(&mut self, kind: NoiseKind, component: ComponentId, magnitude: Scalar) {
        self.sources.push(NoiseSource {
            kind,
            magnitude,
            component,
        });
    }

    /// Registered sources in insertion order.
    #[must_use]
    pub fn sources(&self) -> &[NoiseSource] {
        &self.sources
    }

    /// Spot noise density at `frequency`, V²/Hz. Shot contributions use the
    /// component's bias current from the most recent solve.
    #[must_use]
    pub fn spot_density(&self, circuit: &Circuit, frequency: Scalar) -> Scalar {
        let mut density = 0.0;
        for source in &self.sources {
            let component = circuit.component(source.component);
            density += match source.kind {
                NoiseKind::Thermal => {
                    let r = component.impedance(frequency).norm();
                    4.0 * BOLTZMANN_CONSTANT * self.temperature * r
                }
                NoiseKind::Shot => {
                    let i = component.current_through().norm();
                    2.0 * ELEMENTARY_CHARGE * i
                }
                NoiseKind::Flicker => source.magnitude / frequency,
            };
        }
        density
    }

    /// Integrated noise power over `[f_start, f_stop]`, V², trapezoid-summed
    /// over a log-spaced grid.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for an inverted or non-positive
    /// band or fewer than two points.
    pub fn total_noise(
        &self,
        circuit: &Circuit,
        f_start: Scalar,
        f_stop: Scalar,
        points: usize,
    ) -> Result<Scalar> {
        let spectrum = self.spectrum(circuit, f_start, f_stop, points)?;
        let mut total = 0.0;
        for pair in spectrum.windows(2) {
            let (f0, d0) = pair[0];
            let (f1, d1) = pair[1];
            total += 0.5 * (d0 + d1) * (f1 - f0);
        }
        Ok(total)
    }

    /// Per-frequency spectral density over a log-spaced grid, `(Hz, V²/Hz)`.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for an inverted or non-positive
    /// band or fewer than two points.
    pub fn spectrum(
        &self,
        circuit: &Circuit,
        f_start: Scalar,
        f_stop: Scalar,
        points: usize,
    ) -> Result<Vec<(Scalar, Scalar)>> {
        if f_start <= 0.0 || f_stop <= f_start {
            return Err(CircuitError::InvalidConfiguration(format!(
                "noise band must satisfy 0 < f_start < f_stop (got {f_start}..{f_stop})"
            )));
        }
        if points < 2 {
            return Err(CircuitError::InvalidConfiguration(
                "noise integration needs at least two points".into(),
            ));
        }
        Ok(logspace_hz(f_start, f_stop, points)
            .into_iter()
            .map(|f| (f, self.spot_density(circuit, f)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::circuits::Component;

    fn resistor_circuit(ohms: Scalar) -> (Circuit, ComponentId) {
        let mut circuit = Circuit::new();
        let r = circuit
            .add_component(Component::resistor("R1", ohms))
            .unwrap();
        (circuit, r)
    }

    #[test]
    fn thermal_density_matches_4ktr() {
        let (circuit, r) = resistor_circuit(1.0e3);
        let mut noise = NoiseAnalyzer::new();
        noise.add_source(NoiseKind::Thermal, r, 0.0);
        let density = noise.spot_density(&circuit, 1.0e3);
        let expected = 4.0 * BOLTZMANN_CONSTANT * NOISE_REFERENCE_TEMPERATURE * 1.0e3;
        assert_relative_eq!(density, expected, max_relative = 1e-12);
    }

    #[test]
    fn flicker_density_falls_with_frequency() {
        let (circuit, r) = resistor_circuit(1.0e3);
        let mut noise = NoiseAnalyzer::new();
        noise.add_source(NoiseKind::Flicker, r, 1.0e-12);
        let low = noise.spot_density(&circuit, 10.0);
        let high = noise.spot_density(&circuit, 1.0e3);
        assert_relative_eq!(low / high, 100.0, max_relative = 1e-9);
    }

    #[test]
    fn wider_band_integrates_more_noise() {
        let (circuit, r) = resistor_circuit(1.0e3);
        let mut noise = NoiseAnalyzer::new();
        noise.add_source(NoiseKind::Thermal, r, 0.0);
        let narrow = noise.total_noise(&circuit, 1.0e3, 1.0e4, 50).unwrap();
        let wide = noise.total_noise(&circuit, 1.0e3, 1.0e6, 50).unwrap();
        assert!(wide > narrow);
        // Flat thermal floor: integral is density times bandwidth.
        let expected = 4.0 * BOLTZMANN_CONSTANT * NOISE_REFERENCE_TEMPERATURE * 1.0e3 * 999.0e3;
        assert_relative_eq!(wide, expected, max_relative = 0.02);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let (circuit, r) = resistor_circuit(1.0e3);
        let mut noise = NoiseAnalyzer::new();
        noise.add_source(NoiseKind::Thermal, r, 0.0);
        assert!(noise.total_noise(&circuit, 1.0e4, 1.0e3, 10).is_err());
        assert!(noise.spectrum(&circuit, 1.0e3, 1.0e4, 1).is_err());
    }
}
