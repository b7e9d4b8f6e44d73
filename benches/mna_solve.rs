use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rflab::prelude::*;

/// RC ladder with `stages` sections hanging off a single source.
fn build_ladder(stages: usize) -> Circuit {
    let mut circuit = Circuit::new();
    let vs = circuit
        .add_component(Component::voltage_source("V1", 1.0, 0.0))
        .unwrap();
    let gnd = circuit.node_of(circuit.pin(vs, 1)).unwrap();
    let mut live = circuit.node_of(circuit.pin(vs, 0)).unwrap();

    for i in 0..stages {
        let r = circuit
            .add_component(Component::resistor(format!("R{i}"), 1.0e3))
            .unwrap();
        let c = circuit
            .add_component(Component::capacitor(format!("C{i}"), 1.0e-9))
            .unwrap();
        circuit.attach(circuit.pin(r, 0), live).unwrap();
        live = circuit
            .connect(circuit.pin(r, 1), circuit.pin(c, 0))
            .unwrap();
        circuit.attach(circuit.pin(c, 1), gnd).unwrap();
    }
    circuit.set_ground(gnd).unwrap();
    circuit
}

fn bench_ac_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("ac_sweep");
    for stages in [4usize, 16, 64] {
        group.bench_function(BenchmarkId::new("rc_ladder", stages), |b| {
            b.iter_batched(
                || build_ladder(stages),
                |mut circuit| {
                    let mut analyzer = CircuitAnalyzer::new();
                    let _ = analyzer.perform_ac(&mut circuit, 1.0e3, 1.0e7, 50);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ac_sweep);
criterion_main!(benches);
