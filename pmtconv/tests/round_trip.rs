use pmtconv::{Native, NativeArray, from_native, to_native};
use pmtval::{Complex32, Complex64, Value};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const MAX_DEPTH: usize = 4;

fn random_array(rng: &mut ChaCha20Rng) -> NativeArray {
    let len = rng.random_range(0..8);
    match rng.random_range(0..10) {
        0 => NativeArray::from_vec((0..len).map(|_| rng.random::<f32>()).collect()),
        1 => NativeArray::from_vec((0..len).map(|_| rng.random::<f64>()).collect()),
        2 => NativeArray::from_vec(
            (0..len)
                .map(|_| Complex32::new(rng.random(), rng.random()))
                .collect(),
        ),
        3 => NativeArray::from_vec(
            (0..len)
                .map(|_| Complex64::new(rng.random(), rng.random()))
                .collect(),
        ),
        4 => NativeArray::from_vec((0..len).map(|_| rng.random::<i8>()).collect()),
        5 => NativeArray::from_vec((0..len).map(|_| rng.random::<i16>()).collect()),
        6 => NativeArray::from_vec((0..len).map(|_| rng.random::<i32>()).collect()),
        7 => NativeArray::from_vec((0..len).map(|_| rng.random::<u8>()).collect()),
        8 => NativeArray::from_vec((0..len).map(|_| rng.random::<u16>()).collect()),
        _ => NativeArray::from_vec((0..len).map(|_| rng.random::<u32>()).collect()),
    }
}

/// Random native tree without byte strings (their encoding is one-way).
fn random_native(rng: &mut ChaCha20Rng, depth: usize) -> Native {
    let kinds = if depth >= MAX_DEPTH { 7 } else { 11 };
    match rng.random_range(0..kinds) {
        0 => Native::None,
        1 => Native::Bool(rng.random_bool(0.5)),
        2 => Native::Str(format!("sym{}", rng.random_range(0..1000))),
        3 => Native::from(rng.random::<i64>()),
        4 => Native::from(rng.random::<u64>()),
        5 => Native::Float(rng.random_range(-1.0e9..1.0e9)),
        6 => Native::Complex(Complex64::new(rng.random(), rng.random())),
        7 => {
            let len = rng.random_range(0..4);
            Native::Tuple((0..len).map(|_| random_native(rng, depth + 1)).collect())
        }
        8 => {
            let len = rng.random_range(0..4);
            Native::List((0..len).map(|_| random_native(rng, depth + 1)).collect())
        }
        9 => {
            let len = rng.random_range(0..4);
            Native::Dict(
                (0..len)
                    .map(|i| (Native::Str(format!("k{}", i)), random_native(rng, depth + 1)))
                    .collect(),
            )
        }
        _ => Native::Array(random_array(rng)),
    }
}

#[test]
fn native_to_value_to_native_is_identity() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let native = random_native(&mut rng, 0);
        let value = from_native(&native).unwrap();
        assert_eq!(to_native(&value).unwrap(), native, "through {}", value);
    }
}

#[test]
fn value_to_native_to_value_is_identity() {
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    for _ in 0..500 {
        let value = from_native(&random_native(&mut rng, 0)).unwrap();
        let native = to_native(&value).unwrap();
        assert_eq!(from_native(&native).unwrap(), value);
    }
}

#[test]
fn constructor_built_values_round_trip() {
    let key = Value::tuple([Value::symbol("port"), Value::integer(2)]);
    let values = vec![
        Value::Null,
        Value::bool(false),
        Value::integer(i64::MIN),
        Value::uint64(u64::MAX),
        Value::real(f64::NAN),
        Value::complex(-0.0, 3.5),
        Value::tuple([]),
        Value::vector(2, Value::symbol("fill")),
        Value::dict().dict_add(key, Value::uniform(vec![0.25f64])).unwrap(),
        Value::uniform(Vec::<u32>::new()),
    ];
    for value in values {
        let native = to_native(&value).unwrap();
        assert_eq!(from_native(&native).unwrap(), value, "through {:?}", native);
    }
}
