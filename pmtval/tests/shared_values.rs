use std::sync::Arc;

use pmtval::{Complex32, Dict, ElementType, UniformVector, Value, ValueError, ValueTag};

fn sample_dict() -> Value {
    let mut dict = Value::dict();
    for i in 0..64 {
        dict = dict
            .dict_add(Value::symbol(&format!("key{}", i)), Value::integer(i))
            .unwrap();
    }
    dict
}

#[test]
fn concurrent_readers_never_see_partial_updates() {
    let shared = sample_dict();
    let reference = shared.clone();

    crossbeam::thread::scope(|s| {
        for _ in 0..2 {
            let reader = shared.clone();
            s.spawn(move |_| {
                for _ in 0..500 {
                    let dict = reader.as_dict().unwrap();
                    assert_eq!(dict.len(), 64);
                    for i in 0..64 {
                        let key = Value::symbol(&format!("key{}", i));
                        assert_eq!(dict.get(&key), Some(&Value::integer(i)));
                    }
                    assert!(!dict.contains_key(&Value::symbol("writer")));
                }
            });
        }

        let writer_handle = shared.clone();
        s.spawn(move |_| {
            let mut derived = writer_handle;
            for i in 0..500 {
                derived = derived
                    .dict_add(Value::symbol("writer"), Value::integer(i))
                    .unwrap()
                    .dict_delete(&Value::symbol("key0"))
                    .unwrap();
            }
            assert_eq!(derived.length(), Ok(64));
        });
    })
    .unwrap();

    assert_eq!(shared, reference);
}

#[test]
fn values_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
    assert_send_sync::<Dict>();
    assert_send_sync::<UniformVector>();
}

#[test]
fn dict_items_is_a_list_of_pairs() {
    let dict = Value::dict()
        .dict_add(Value::symbol("a"), Value::integer(1))
        .unwrap()
        .dict_add(Value::symbol("b"), Value::real(2.5))
        .unwrap();

    let items = dict.dict_items().unwrap();
    assert_eq!(items.list_length(), 2);
    let mut seen: Vec<(String, Value)> = items
        .iter_list()
        .map(|pair| {
            (
                pair.car().unwrap().symbol_to_string().unwrap(),
                pair.cdr().unwrap().clone(),
            )
        })
        .collect();
    seen.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), Value::integer(1)),
            ("b".to_string(), Value::real(2.5))
        ]
    );
}

#[test]
fn dict_operations_reject_other_tags() {
    assert_eq!(
        Value::integer(3).dict_add(Value::Null, Value::Null),
        Err(ValueError::WrongType {
            expected: ValueTag::Dict,
            found: ValueTag::Integer
        })
    );
}

#[test]
fn dict_keys_can_be_any_value() {
    let key = Value::tuple([Value::integer(1), Value::complex(0.0, 1.0)]);
    let dict = Value::dict().dict_add(key.clone(), Value::bool(true)).unwrap();
    assert_eq!(dict.dict_ref(&key), Ok(Some(&Value::bool(true))));
    assert_eq!(dict.dict_has_key(&Value::integer(1)), Ok(false));
}

#[test]
fn uniform_vectors_share_storage_on_clone() {
    let data: Arc<[Complex32]> = vec![Complex32::new(1.0, 2.0); 4].into();
    let a = Value::uniform(data.clone());
    let b = a.clone();
    match (&a, &b) {
        (Value::Uniform(UniformVector::C32(x)), Value::Uniform(UniformVector::C32(y))) => {
            assert!(Arc::ptr_eq(x, y));
            assert!(Arc::ptr_eq(x, &data));
        }
        _ => panic!("expected c32 uniform vectors"),
    }
    assert_eq!(a.as_uniform().unwrap().element_type(), ElementType::C32);
    assert_eq!(a.uniform_elements::<Complex32>().unwrap().map(|s| s.len()), Some(4));
    assert_eq!(a.uniform_elements::<f32>().unwrap(), None);
}

#[test]
fn symbols_are_interned_values() {
    let a = Value::symbol("rx_time");
    let b = Value::from("rx_time");
    match (&a, &b) {
        (Value::Symbol(x), Value::Symbol(y)) => assert!(x.same_handle(y)),
        _ => panic!("expected symbols"),
    }
}
