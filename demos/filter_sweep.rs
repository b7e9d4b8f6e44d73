use rflab::prelude::*;

fn main() {
    // 5th-order Chebyshev lowpass, 0.5 dB ripple, 1 MHz cutoff, 50 ohms.
    let spec = FilterSpecification {
        filter_type: FilterType::Lowpass,
        approximation: Approximation::ChebyshevI,
        order: 5,
        passband_freq: 1.0e6,
        stopband_freq: 10.0e6,
        passband_ripple: 0.5,
        stopband_atten: 40.0,
        impedance: 50.0,
    };

    let (mut circuit, input, output) =
        build_terminated_filter(&spec).expect("valid specification");

    let mut analyzer = CircuitAnalyzer::new();
    let designer = FilterDesigner::new();
    let freqs = logspace_hz(1.0e4, 1.0e8, 200);
    let response = designer
        .analyze_filter(&mut analyzer, &mut circuit, input, output, &freqs)
        .expect("analysis succeeds");

    println!("frequency(Hz), magnitude(dB), phase(deg), group_delay(s)");
    for (i, f) in response.frequencies.iter().enumerate() {
        println!(
            "{:.6e}, {:.3}, {:.2}, {:.3e}",
            f, response.magnitude_db[i], response.phase_deg[i], response.group_delay[i]
        );
    }
    println!(
        "# -3 dB bandwidth: {:.4e} Hz, Q: {:.3}",
        response.bandwidth, response.q_factor
    );
}
