//! Ladder filter synthesis and response analysis.
//!
//! [`FilterDesigner::design_filter`] turns a [`FilterSpecification`] into a
//! list of reactive components: normalized prototype coefficients per
//! approximation family, denormalized against the band edges and reference
//! impedance, realized as an alternating L/C ladder (dual for highpass,
//! resonator pairs for bandpass/bandstop). [`FilterDesigner::analyze_filter`]
//! samples the realized network through the MNA solver and reports magnitude,
//! phase, group delay, −3 dB bandwidth, and Q.

use std::f64::consts::PI;

use crate::circuits::{Circuit, CircuitAnalyzer, Component, NodeId};
use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

/// Filter band shape.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Passes below the passband edge.
    Lowpass,
    /// Passes above the passband edge.
    Highpass,
    /// Passes between the two band edges.
    Bandpass,
    /// Rejects between the two band edges.
    Bandstop,
}

/// Prototype approximation family.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approximation {
    /// Maximally flat passband.
    Butterworth,
    /// Equiripple passband.
    ChebyshevI,
    /// Equiripple stopband (inverse Chebyshev).
    ChebyshevII,
    /// Equiripple in both bands.
    Elliptic,
    /// Maximally flat group delay.
    Bessel,
}

/// Immutable input to the synthesis procedure.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpecification {
    /// Band shape to realize.
    pub filter_type: FilterType,
    /// Approximation family for the prototype.
    pub approximation: Approximation,
    /// Filter order (number of reactive prototype elements).
    pub order: usize,
    /// Passband edge in hertz (lower edge for bandpass/bandstop).
    pub passband_freq: Scalar,
    /// Stopband edge in hertz (upper edge for bandpass/bandstop).
    pub stopband_freq: Scalar,
    /// Passband ripple in dB (Chebyshev-I, elliptic).
    pub passband_ripple: Scalar,
    /// Stopband attenuation in dB (Chebyshev-II, elliptic).
    pub stopband_atten: Scalar,
    /// Reference impedance in ohms.
    pub impedance: Scalar,
}

/// Sampled response curve plus scalar bandwidth figures. Never a source of
/// truth — always regenerable from the specification and synthesized ladder.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct FilterResponse {
    /// Sample frequencies in hertz.
    pub frequencies: Vec<Scalar>,
    /// Transfer magnitude in dB.
    pub magnitude_db: Vec<Scalar>,
    /// Transfer phase in degrees.
    pub phase_deg: Vec<Scalar>,
    /// Group delay in seconds, from a small-Δf phase finite difference.
    pub group_delay: Vec<Scalar>,
    /// −3 dB bandwidth in hertz.
    pub bandwidth: Scalar,
    /// Center frequency divided by bandwidth.
    pub q_factor: Scalar,
}

/// Synthesizes ladder filters and measures their response through the
/// circuit analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterDesigner;

impl FilterDesigner {
    /// Creates a designer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Synthesizes the component list realizing `spec`.
    ///
    /// Lowpass/highpass ladders alternate series and shunt elements starting
    /// with a series element; bandpass/bandstop map each prototype element
    /// onto an L/C resonator pair (adjacent in the returned list).
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for a zero order, non-positive
    /// band edges or impedance, or an unsupported Bessel order.
    pub fn design_filter(&self, spec: &FilterSpecification) -> Result<Vec<Component>> {
        validate(spec)?;
        let coeffs = prototype_coefficients(spec)?;
        Ok(realize_ladder(&coeffs, spec))
    }

    /// Samples the transfer function `v(output)/v(input)` of an assembled
    /// filter circuit at the given frequencies and derives the −3 dB
    /// bandwidth and Q.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] when `frequencies` is empty;
    /// solver errors are propagated.
    pub fn analyze_filter(
        &self,
        analyzer: &mut CircuitAnalyzer,
        circuit: &mut Circuit,
        input: NodeId,
        output: NodeId,
        frequencies: &[Scalar],
    ) -> Result<FilterResponse> {
        if frequencies.is_empty() {
            return Err(CircuitError::InvalidConfiguration(
                "filter analysis needs at least one frequency".into(),
            ));
        }

        let mut response = FilterResponse {
            frequencies: frequencies.to_vec(),
            ..FilterResponse::default()
        };

        for &f in frequencies {
            analyzer.analyze(circuit, f)?;
            let transfer = circuit.node_voltage(output) / circuit.node_voltage(input);
            response.magnitude_db.push(crate::math::db(transfer));
            response.phase_deg.push(transfer.arg().to_degrees());

            // Group delay from a 1 % frequency step.
            let df = f * 0.01;
            analyzer.analyze(circuit, f + df)?;
            let transfer_plus = circuit.node_voltage(output) / circuit.node_voltage(input);
            let mut dphase = transfer_plus.arg() - transfer.arg();
            while dphase > PI {
                dphase -= 2.0 * PI;
            }
            while dphase < -PI {
                dphase += 2.0 * PI;
            }
            response.group_delay.push(-dphase / (2.0 * PI * df));
        }

        derive_bandwidth_and_q(&mut response);
        Ok(response)
    }
}

fn validate(spec: &FilterSpecification) -> Result<()> {
    if spec.order == 0 {
        return Err(CircuitError::InvalidConfiguration(
            "filter order must be at least 1".into(),
        ));
    }
    if spec.passband_freq <= 0.0 || spec.impedance <= 0.0 {
        return Err(CircuitError::InvalidConfiguration(
            "band edge and impedance must be positive".into(),
        ));
    }
    if matches!(spec.filter_type, FilterType::Bandpass | FilterType::Bandstop)
        && spec.stopband_freq <= spec.passband_freq
    {
        return Err(CircuitError::InvalidConfiguration(
            "bandpass/bandstop needs stopband_freq above passband_freq".into(),
        ));
    }
    Ok(())
}

fn prototype_coefficients(spec: &FilterSpecification) -> Result<Vec<Scalar>> {
    match spec.approximation {
        Approximation::Butterworth => Ok(butterworth(spec.order)),
        Approximation::ChebyshevI => Ok(chebyshev1(spec.order, spec.passband_ripple)),
        Approximation::ChebyshevII => {
            // Inverse Chebyshev approximated through the equivalent passband
            // ripple implied by the stopband attenuation.
            let eps_s = 1.0 / (10.0_f64.powf(spec.stopband_atten / 10.0) - 1.0).sqrt();
            let ripple = 10.0 * (1.0 + eps_s * eps_s).log10();
            Ok(chebyshev1(spec.order, ripple))
        }
        Approximation::Elliptic => {
            // Moderate-spec elliptic ladders track the Chebyshev-I element
            // values; the equiripple zeros are not realized here.
            Ok(chebyshev1(spec.order, spec.passband_ripple))
        }
        Approximation::Bessel => bessel(spec.order),
    }
}

/// Butterworth prototype: g_k = 2 sin((2k − 1)π / 2n).
fn butterworth(order: usize) -> Vec<Scalar> {
    (1..=order)
        .map(|k| {
            let angle = PI * (2.0 * k as Scalar - 1.0) / (2.0 * order as Scalar);
            2.0 * angle.sin()
        })
        .collect()
}

/// Chebyshev-I prototype via the standard β/γ recursion.
fn chebyshev1(order: usize, ripple_db: Scalar) -> Vec<Scalar> {
    let n = order as Scalar;
    let beta = (1.0 / (ripple_db / 17.37).tanh()).ln();
    let gamma = (beta / (2.0 * n)).sinh();

    let a = |k: usize| (PI * (2.0 * k as Scalar - 1.0) / (2.0 * n)).sin();
    let b = |k: usize| gamma * gamma + (PI * k as Scalar / n).sin().powi(2);

    let mut g = Vec::with_capacity(order);
    g.push(2.0 * a(1) / gamma);
    for k in 2..=order {
        let prev = g[k - 2];
        g.push(4.0 * a(k - 1) * a(k) / (b(k - 1) * prev));
    }
    g
}

/// Bessel prototype values, normalized to the −3 dB point, orders 1–10.
fn bessel(order: usize) -> Result<Vec<Scalar>> {
    const TABLE: [&[Scalar]; 10] = [
        &[2.0000],
        &[1.5774, 0.4226],
        &[1.2550, 0.5528, 0.1922],
        &[1.0598, 0.5116, 0.3181, 0.1104],
        &[0.9303, 0.4577, 0.3312, 0.2090, 0.0718],
        &[0.8377, 0.4116, 0.3158, 0.2364, 0.1480, 0.0505],
        &[0.7677, 0.3744, 0.2944, 0.2378, 0.1778, 0.1104, 0.0375],
        &[0.7125, 0.3446, 0.2735, 0.2297, 0.1867, 0.1387, 0.0855, 0.0289],
        &[0.6678, 0.3203, 0.2547, 0.2184, 0.1859, 0.1506, 0.1111, 0.0682, 0.0230],
        &[0.6305, 0.3002, 0.2384, 0.2066, 0.1808, 0.1539, 0.1240, 0.0911, 0.0557, 0.0187],
    ];
    TABLE
        .get(order - 1)
        .map(|g| g.to_vec())
        .ok_or_else(|| {
            CircuitError::InvalidConfiguration(format!(
                "Bessel prototypes are tabulated up to order 10 (got {order})"
            ))
        })
}

fn realize_ladder(coeffs: &[Scalar], spec: &FilterSpecification) -> Vec<Component> {
    let z0 = spec.impedance;
    let omega_c = 2.0 * PI * spec.passband_freq;
    let mut components = Vec::new();

    match spec.filter_type {
        FilterType::Lowpass => {
            // Series L, shunt C, alternating.
            for (i, &g) in coeffs.iter().enumerate() {
                let position = i + 1;
                if i % 2 == 0 {
                    components.push(Component::inductor(format!("L{position}"), g * z0 / omega_c));
                } else {
                    components
                        .push(Component::capacitor(format!("C{position}"), g / (z0 * omega_c)));
                }
            }
        }
        FilterType::Highpass => {
            // Dual topology: series C, shunt L.
            for (i, &g) in coeffs.iter().enumerate() {
                let position = i + 1;
                if i % 2 == 0 {
                    components.push(Component::capacitor(
                        format!("C{position}"),
                        1.0 / (g * omega_c * z0),
                    ));
                } else {
                    components
                        .push(Component::inductor(format!("L{position}"), z0 / (g * omega_c)));
                }
            }
        }
        FilterType::Bandpass | FilterType::Bandstop => {
            // Geometric-mean center and absolute bandwidth scaling.
            let omega_0 = 2.0 * PI * (spec.passband_freq * spec.stopband_freq).sqrt();
            let bw = 2.0 * PI * (spec.stopband_freq - spec.passband_freq);
            for (i, &g) in coeffs.iter().enumerate() {
                let position = i + 1;
                let series = i % 2 == 0;
                let (l, c) = match (spec.filter_type, series) {
                    // Bandpass: series arm is a series LC, shunt arm a
                    // parallel LC, both resonant at ω0.
                    (FilterType::Bandpass, true) => {
                        (g * z0 / bw, bw / (g * z0 * omega_0 * omega_0))
                    }
                    (FilterType::Bandpass, false) => {
                        (bw * z0 / (g * omega_0 * omega_0), g / (bw * z0))
                    }
                    // Bandstop swaps the resonator styles.
                    (FilterType::Bandstop, true) => {
                        (g * z0 * bw / (omega_0 * omega_0), 1.0 / (g * z0 * bw))
                    }
                    (FilterType::Bandstop, false) => {
                        (z0 / (g * bw), g * bw / (z0 * omega_0 * omega_0))
                    }
                    _ => unreachable!(),
                };
                components.push(Component::inductor(format!("L{position}"), l));
                components.push(Component::capacitor(format!("C{position}"), c));
            }
        }
    }

    components
}

/// Locates the two sample frequencies nearest `max − 3 dB` and derives the
/// bandwidth and Q. A missing lower crossing falls back to the first sample
/// (lowpass), a missing upper crossing to the last (highpass).
fn derive_bandwidth_and_q(response: &mut FilterResponse) {
    let Some(max_db) = response
        .magnitude_db
        .iter()
        .copied()
        .reduce(Scalar::max)
    else {
        return;
    };
    let target = max_db - 3.0;
    let peak = response
        .magnitude_db
        .iter()
        .position(|&m| m == max_db)
        .unwrap_or(0);

    let nearest = |range: &mut dyn Iterator<Item = usize>| -> Option<usize> {
        range.min_by(|&a, &b| {
            let da = (response.magnitude_db[a] - target).abs();
            let db_ = (response.magnitude_db[b] - target).abs();
            da.total_cmp(&db_)
        })
    };

    let lower = nearest(&mut (0..peak)).unwrap_or(0);
    let upper = nearest(&mut ((peak + 1)..response.frequencies.len()))
        .unwrap_or(response.frequencies.len() - 1);

    let f_lo = response.frequencies[lower];
    let f_hi = response.frequencies[upper];
    response.bandwidth = f_hi - f_lo;
    if response.bandwidth > 0.0 {
        response.q_factor = (f_lo * f_hi).sqrt() / response.bandwidth;
    }
}

/// Assembles a doubly terminated test fixture around a synthesized ladder:
/// source → Z0 → ladder → Z0 load → ground. Returns the circuit plus the
/// driven and loaded node handles for response measurement.
///
/// # Errors
///
/// Propagates synthesis errors from [`FilterDesigner::design_filter`].
pub fn build_terminated_filter(spec: &FilterSpecification) -> Result<(Circuit, NodeId, NodeId)> {
    let designer = FilterDesigner::new();
    let ladder = designer.design_filter(spec)?;

    let mut circuit = Circuit::new();
    let source = circuit.add_component(Component::voltage_source("Vs", 1.0, 0.0))?;
    let rs = circuit.add_component(Component::resistor("Rs", spec.impedance))?;
    circuit.connect(circuit.pin(source, 0), circuit.pin(rs, 0))?;
    let input = circuit.node_of(circuit.pin(source, 0)).ok_or_else(|| {
        CircuitError::Topology("source pin lost its node".into())
    })?;
    let ground = circuit.node_of(circuit.pin(source, 1)).ok_or_else(|| {
        CircuitError::Topology("source pin lost its node".into())
    })?;

    // Walk the ladder: even positions in series with the signal path, odd
    // positions shunted to ground. Bandpass/bandstop resonator pairs arrive
    // adjacent and share a position.
    let paired = matches!(
        spec.filter_type,
        FilterType::Bandpass | FilterType::Bandstop
    );
    let mut live = circuit.node_of(circuit.pin(rs, 1)).ok_or_else(|| {
        CircuitError::Topology("termination pin lost its node".into())
    })?;

    let mut elements = ladder.into_iter();
    let mut position = 0usize;
    while let Some(first) = elements.next() {
        let second = if paired { elements.next() } else { None };
        let series = position % 2 == 0;
        let first_id = circuit.add_component(first)?;

        match (second, spec.filter_type) {
            (Some(partner), FilterType::Bandpass) if series => {
                // Series-resonant LC in the signal path.
                let partner_id = circuit.add_component(partner)?;
                circuit.attach(circuit.pin(first_id, 0), live)?;
                circuit.connect(circuit.pin(first_id, 1), circuit.pin(partner_id, 0))?;
                live = circuit
                    .node_of(circuit.pin(partner_id, 1))
                    .ok_or_else(|| CircuitError::Topology("ladder pin lost its node".into()))?;
            }
            (Some(partner), FilterType::Bandpass) => {
                // Parallel-resonant LC shunted to ground.
                let partner_id = circuit.add_component(partner)?;
                circuit.attach(circuit.pin(first_id, 0), live)?;
                circuit.attach(circuit.pin(partner_id, 0), live)?;
                circuit.attach(circuit.pin(first_id, 1), ground)?;
                circuit.attach(circuit.pin(partner_id, 1), ground)?;
            }
            (Some(partner), FilterType::Bandstop) if series => {
                // Parallel-resonant LC in the signal path.
                let partner_id = circuit.add_component(partner)?;
                circuit.attach(circuit.pin(first_id, 0), live)?;
                circuit.attach(circuit.pin(partner_id, 0), live)?;
                let next = circuit
                    .connect(circuit.pin(first_id, 1), circuit.pin(partner_id, 1))?;
                live = next;
            }
            (Some(partner), _) => {
                // Bandstop shunt arm: series-resonant LC to ground.
                let partner_id = circuit.add_component(partner)?;
                circuit.attach(circuit.pin(first_id, 0), live)?;
                circuit.connect(circuit.pin(first_id, 1), circuit.pin(partner_id, 0))?;
                circuit.attach(circuit.pin(partner_id, 1), ground)?;
            }
            (None, _) if series => {
                circuit.attach(circuit.pin(first_id, 0), live)?;
                live = circuit
                    .node_of(circuit.pin(first_id, 1))
                    .ok_or_else(|| CircuitError::Topology("ladder pin lost its node".into()))?;
            }
            (None, _) => {
                circuit.attach(circuit.pin(first_id, 0), live)?;
                circuit.attach(circuit.pin(first_id, 1), ground)?;
            }
        }
        position += 1;
    }

    let load = circuit.add_component(Component::resistor("Rl", spec.impedance))?;
    circuit.attach(circuit.pin(load, 0), live)?;
    circuit.attach(circuit.pin(load, 1), ground)?;
    circuit.set_ground(ground)?;

    Ok((circuit, input, live))
}
