use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

use fuzzygram::analysis::parser::extract;
use fuzzygram::{Engine, QueryMode};

/// Random mixed Big5/Latin text, `chars` characters long.
fn synth_text(chars: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut text = Vec::with_capacity(chars * 2);
    for _ in 0..chars {
        if rng.gen_bool(0.7) {
            // Valid word-range Big5 pair.
            text.push(rng.gen_range(0xA4..=0xF9));
            text.push(rng.gen_range(0x40..=0x7E));
        } else {
            text.push(b' ');
            let len = rng.gen_range(2..8);
            for _ in 0..len {
                text.push(rng.gen_range(b'a'..=b'z'));
            }
            text.push(b' ');
        }
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for chars in [64, 512, 4096] {
        let text = synth_text(chars);
        group.bench_with_input(BenchmarkId::from_parameter(chars), &text, |b, text| {
            b.iter(|| extract(black_box(text), false));
        });
    }
    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::open(dir.path().join("bench")).unwrap();
    let docs: Vec<Vec<u8>> = (0..256).map(|_| synth_text(64)).collect();

    let mut i = 0;
    c.bench_function("insert_64_chars", |b| {
        b.iter(|| {
            let key = format!("doc-{}", i);
            engine
                .insert(key.as_bytes(), &docs[i % docs.len()])
                .unwrap();
            i += 1;
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::open(dir.path().join("bench")).unwrap();
    for i in 0..1000 {
        let key = format!("doc-{}", i);
        engine.insert(key.as_bytes(), &synth_text(64)).unwrap();
    }

    let queries: Vec<Vec<u8>> = (0..64).map(|_| synth_text(4)).collect();
    let mut group = c.benchmark_group("query_1k_docs");
    for mode in [QueryMode::Fuzzy, QueryMode::Part] {
        let mut i = 0;
        group.bench_function(format!("{:?}", mode), |b| {
            b.iter(|| {
                // Rotate queries so the result cache stays out of the way.
                let q = &queries[i % queries.len()];
                i += 1;
                black_box(engine.query(q, mode, None))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_insert, bench_query);
criterion_main!(benches);
