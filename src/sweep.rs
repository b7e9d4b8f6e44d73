//! Frequency sweep builders and post-processing helpers.

use std::io;
use std::io::Write;

use crate::math::{C, Scalar};

/// Generates `n` linearly spaced samples in [start, stop].
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            (0..n).map(|i| start + step * i as Scalar).collect()
        }
    }
}

/// Generates `n` logarithmically spaced samples between `start` and `stop`
/// (Hz), inclusive of both endpoints. Requires start > 0 and stop > 0.
#[must_use]
pub fn logspace_hz(start_hz: Scalar, stop_hz: Scalar, n: usize) -> Vec<Scalar> {
    assert!(start_hz > 0.0 && stop_hz > 0.0);
    match n {
        0 => Vec::new(),
        1 => vec![start_hz],
        _ => {
            let log_start = start_hz.log10();
            let log_stop = stop_hz.log10();
            let step = (log_stop - log_start) / (n as Scalar - 1.0);
            (0..n)
                .map(|i| 10f64.powf(log_start + step * i as Scalar))
                .collect()
        }
    }
}

/// Magnitude of complex sequence.
#[must_use]
pub fn mag(values: impl IntoIterator<Item = C>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.norm()).collect()
}

/// Magnitude in dB (20*log10(|x|)), clamping very small values.
#[must_use]
pub fn mag_db(values: impl IntoIterator<Item = C>) -> Vec<Scalar> {
    values.into_iter().map(crate::math::db).collect()
}

/// Phase in degrees of complex sequence.
#[must_use]
pub fn phase_deg(values: impl IntoIterator<Item = C>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.arg().to_degrees()).collect()
}

/// Writes a CSV of one node's voltage across an AC sweep.
/// `samples` yields `(frequency_hz, voltage)` pairs.
pub fn write_node_sweep_csv<W: Write>(
    mut w: W,
    samples: impl IntoIterator<Item = (Scalar, C)>,
) -> io::Result<()> {
    writeln!(w, "frequency,ReV,ImV")?;
    for (f, v) in samples {
        writeln!(w, "{:.16e},{:.16e},{:.16e}", f, v.re, v.im)?;
    }
    Ok(())
}

/// Writes a CSV of a node's voltage over time from a transient run.
pub fn write_transient_csv<W: Write>(
    mut w: W,
    samples: impl IntoIterator<Item = (Scalar, Scalar)>,
) -> io::Result<()> {
    writeln!(w, "time,voltage")?;
    for (t, v) in samples {
        writeln!(w, "{:.16e},{:.16e}", t, v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn linspace_basic() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn logspace_is_inclusive_of_both_endpoints() {
        let v = logspace_hz(1.0, 1.0e6, 7);
        assert_eq!(v.len(), 7);
        assert_relative_eq!(v[0], 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(v[6], 1.0e6, max_relative = 1.0e-12);
        assert_relative_eq!(v[3], 1.0e3, max_relative = 1.0e-9);
    }

    #[test]
    fn mag_phase_roundtrip() {
        let x = vec![C::new(1.0, 0.0), C::new(0.0, 1.0)];
        let m = mag(x.clone());
        let p = phase_deg(x);
        assert_relative_eq!(m[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(m[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 90.0, epsilon = 1e-12);
    }
}
