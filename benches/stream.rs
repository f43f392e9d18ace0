use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use tempocheck::{
    AgeConstraint, AnalyserConfig, ConstraintSet, DelayConstraint, MemorySink, RawRow,
    StimulusResponse, Validator, VecLogSource,
};

const ROWS: u32 = 10_000;

/// Rows cycling through a nested two-hop chain plus a delay pair.
fn make_rows() -> Vec<RawRow> {
    let signals = ["s0", "s1", "r1", "r0", "x"];
    let mut state = [false; 5];
    let mut rows = Vec::with_capacity(ROWS as usize);
    for i in 0..ROWS {
        if i > 0 {
            let slot = (i as usize - 1) % signals.len();
            state[slot] = !state[slot];
        }
        rows.push(RawRow::new(
            f64::from(i),
            signals
                .iter()
                .zip(state.iter())
                .map(|(name, on)| (*name, if *on { "1" } else { "0" })),
        ));
    }
    rows
}

fn make_constraints() -> ConstraintSet {
    ConstraintSet::new(
        vec![DelayConstraint::new("DC_x", StimulusResponse::new("s0", "x"), 4.0).unwrap()],
        vec![AgeConstraint::new(
            "AC_chain",
            vec![StimulusResponse::new("s0", "r0"), StimulusResponse::new("s1", "r1")],
            3.0,
        )
        .unwrap()],
    )
    .unwrap()
}

fn bench_validate_stream(c: &mut Criterion) {
    let rows = make_rows();
    let mut group = c.benchmark_group("stream");
    group.throughput(Throughput::Elements(u64::from(ROWS)));
    group.bench_function("validate_chain_and_delay", |b| {
        b.iter(|| {
            let mut validator = Validator::new(
                VecLogSource::new(rows.clone()),
                make_constraints(),
                &AnalyserConfig::default(),
            );
            let mut sink = MemorySink::new();
            validator.run(&mut sink).unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_validate_stream);
criterion_main!(benches);
