use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pmtconv::{Converter, Native, NativeArray};
use pmtval::Value;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn build_metadata() -> Value {
    // Typical stream tag payload: a handful of scalars keyed by symbols.
    let mut dict = Value::dict();
    for (i, name) in ["rx_time", "rx_freq", "rx_rate", "gain", "antenna"].iter().enumerate() {
        dict = dict
            .dict_add(Value::symbol(name), Value::real(i as f64 * 1.5e6))
            .unwrap();
    }
    dict
}

fn build_nested_native() -> Native {
    // Seeded so that every run converts the same tree.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);

    fn next_create(budget: usize, rng: &mut impl Rng) -> Native {
        if budget == 0 || rng.random_bool(0.2) {
            return match rng.random_range(0..=3) {
                0 => Native::None,
                1 => Native::from(rng.random::<i64>()),
                2 => Native::from(rng.random::<f64>()),
                3 => Native::str(format!("s{}", rng.random_range(0..64))),
                _ => unreachable!(),
            };
        }

        match rng.random_range(0..=2) {
            0 => Native::Tuple((0..3).map(|_| next_create(budget - 1, rng)).collect()),
            1 => Native::List((0..4).map(|_| next_create(budget - 1, rng)).collect()),
            2 => Native::Dict(
                (0..3)
                    .map(|i| (Native::str(format!("k{}", i)), next_create(budget - 1, rng)))
                    .collect(),
            ),
            _ => unreachable!(),
        }
    }

    next_create(6, &mut rng)
}

fn bench_scalars(c: &mut Criterion) {
    let conv = Converter::global();
    let metadata = build_metadata();
    let native = conv.to_native(&metadata).unwrap();

    c.bench_function("to_native_metadata", |b| {
        b.iter(|| {
            black_box(conv.to_native(&metadata).unwrap());
        })
    });

    c.bench_function("from_native_metadata", |b| {
        b.iter(|| {
            black_box(conv.from_native(&native).unwrap());
        })
    });
}

fn bench_nested(c: &mut Criterion) {
    let conv = Converter::global();
    let native = build_nested_native();
    let value = conv.from_native(&native).unwrap();

    c.bench_function("from_native_nested", |b| {
        b.iter(|| {
            black_box(conv.from_native(&native).unwrap());
        })
    });

    c.bench_function("to_native_nested", |b| {
        b.iter(|| {
            black_box(conv.to_native(&value).unwrap());
        })
    });
}

fn bench_uniform(c: &mut Criterion) {
    let conv = Converter::global();
    let samples: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.01).sin()).collect();
    let array = Native::Array(NativeArray::from_vec(samples.clone()));
    let vector = Value::uniform(samples);

    c.bench_function("from_native_float32_4096", |b| {
        b.iter(|| {
            black_box(conv.from_native(&array).unwrap());
        })
    });

    c.bench_function("to_native_float32_4096", |b| {
        b.iter(|| {
            black_box(conv.to_native(&vector).unwrap());
        })
    });
}

criterion_group!(benches, bench_scalars, bench_nested, bench_uniform);
criterion_main!(benches);
