//! Ordered conversion rules.
//!
//! A rule pairs a cheap predicate (the value tag, or the native kind) with a
//! conversion function. The converter evaluates rules in table order and
//! commits to the first one whose predicate holds and whose conversion does
//! not report a speculative failure (see [`ConvertError::is_speculative`]).
use log::debug;
use pmtval::{Value, ValueTag};
use strum::IntoEnumIterator;

use crate::{
    config::ByteStringPolicy,
    converter::Converter,
    error::{ConvertError, ConvertResult},
    native::{Native, NativeInt, NativeKind},
};

/// Converts a value into its native form; `depth` is the nesting level of `value`.
pub type DecodeFn = fn(&Converter, &Value, usize) -> ConvertResult<Native>;
/// Converts a native into a value; `depth` is the nesting level of `native`.
pub type EncodeFn = fn(&Converter, &Native, usize) -> ConvertResult<Value>;

#[derive(Debug, Clone, Copy)]
pub struct DecodeRule {
    pub name: &'static str,
    pub tag: ValueTag,
    pub decode: DecodeFn,
}

impl DecodeRule {
    pub const fn new(name: &'static str, tag: ValueTag, decode: DecodeFn) -> Self {
        Self { name, tag, decode }
    }

    #[inline]
    pub fn matches(&self, value: &Value) -> bool {
        value.tag() == self.tag
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EncodeRule {
    pub name: &'static str,
    pub kind: NativeKind,
    pub encode: EncodeFn,
}

impl EncodeRule {
    pub const fn new(name: &'static str, kind: NativeKind, encode: EncodeFn) -> Self {
        Self { name, kind, encode }
    }

    #[inline]
    pub fn matches(&self, native: &Native) -> bool {
        native.kind() == self.kind
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    decode: Vec<DecodeRule>,
    encode: Vec<EncodeRule>,
}

/// Evaluation order of the standard decode rules.
const DECODE_ORDER: [ValueTag; 12] = [
    ValueTag::Null,
    ValueTag::Bool,
    ValueTag::Symbol,
    ValueTag::Integer,
    ValueTag::UInt64,
    ValueTag::Real,
    ValueTag::Complex,
    ValueTag::Tuple,
    ValueTag::Vector,
    ValueTag::Dict,
    ValueTag::Pair,
    ValueTag::UniformVector,
];

impl RuleTable {
    pub fn new(decode: Vec<DecodeRule>, encode: Vec<EncodeRule>) -> Self {
        Self { decode, encode }
    }

    /// One decode rule per value tag and the encode rules of every native kind.
    pub fn standard() -> Self {
        let decode = DECODE_ORDER.iter().map(|tag| standard_decoder(*tag)).collect();
        let encode = NativeKind::iter().flat_map(standard_encoders).collect();
        let table = Self::new(decode, encode);
        debug!(
            "Standard rule table: {} decode rules, {} encode rules",
            table.decode.len(),
            table.encode.len()
        );
        table
    }

    pub fn decode_rules(&self) -> &[DecodeRule] {
        &self.decode
    }

    pub fn encode_rules(&self) -> &[EncodeRule] {
        &self.encode
    }

    /// Evaluate `rule` before every existing decode rule.
    pub fn with_decode_rule_first(mut self, rule: DecodeRule) -> Self {
        self.decode.insert(0, rule);
        self
    }

    pub fn with_decode_rule(mut self, rule: DecodeRule) -> Self {
        self.decode.push(rule);
        self
    }

    /// Evaluate `rule` before every existing encode rule.
    pub fn with_encode_rule_first(mut self, rule: EncodeRule) -> Self {
        self.encode.insert(0, rule);
        self
    }

    pub fn with_encode_rule(mut self, rule: EncodeRule) -> Self {
        self.encode.push(rule);
        self
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_decoder(tag: ValueTag) -> DecodeRule {
    match tag {
        ValueTag::Null => DecodeRule::new("null", tag, decode_null),
        ValueTag::Bool => DecodeRule::new("bool", tag, decode_bool),
        ValueTag::Symbol => DecodeRule::new("symbol", tag, decode_symbol),
        ValueTag::Integer => DecodeRule::new("integer", tag, decode_integer),
        ValueTag::UInt64 => DecodeRule::new("uint64", tag, decode_uint64),
        ValueTag::Real => DecodeRule::new("real", tag, decode_real),
        ValueTag::Complex => DecodeRule::new("complex", tag, decode_complex),
        ValueTag::Tuple => DecodeRule::new("tuple", tag, decode_tuple),
        ValueTag::Vector => DecodeRule::new("vector", tag, decode_vector),
        ValueTag::Dict => DecodeRule::new("dict", tag, decode_dict),
        ValueTag::Pair => DecodeRule::new("pair", tag, decode_pair),
        ValueTag::UniformVector => DecodeRule::new("uniform_vector", tag, decode_uniform),
    }
}

fn standard_encoders(kind: NativeKind) -> Vec<EncodeRule> {
    match kind {
        NativeKind::None => vec![EncodeRule::new("null", kind, encode_none)],
        NativeKind::Bool => vec![EncodeRule::new("bool", kind, encode_bool)],
        NativeKind::Str => vec![EncodeRule::new("symbol", kind, encode_str)],
        NativeKind::Bytes => vec![EncodeRule::new("forced_utf8_symbol", kind, encode_bytes)],
        NativeKind::Int => vec![
            EncodeRule::new("integer", kind, encode_integer),
            EncodeRule::new("uint64", kind, encode_uint64),
        ],
        NativeKind::Float => vec![EncodeRule::new("real", kind, encode_float)],
        NativeKind::Complex => vec![EncodeRule::new("complex", kind, encode_complex)],
        NativeKind::Tuple => vec![EncodeRule::new("tuple", kind, encode_tuple)],
        NativeKind::List => vec![EncodeRule::new("vector", kind, encode_list)],
        NativeKind::Dict => vec![EncodeRule::new("dict", kind, encode_dict)],
        NativeKind::Array => vec![EncodeRule::new("uniform_vector", kind, encode_array)],
    }
}

fn mismatch(rule: &'static str) -> ConvertError {
    ConvertError::RuleMismatch { rule }
}

fn decode_null(_: &Converter, _: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::None)
}

fn decode_bool(_: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::Bool(value.to_bool()?))
}

fn decode_symbol(_: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::Str(value.symbol_to_string()?))
}

fn decode_integer(_: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::Int(NativeInt::Signed(value.to_long()?)))
}

fn decode_uint64(_: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::Int(NativeInt::Unsigned(value.to_uint64()?)))
}

fn decode_real(_: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::Float(value.to_double()?))
}

fn decode_complex(_: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    Ok(Native::Complex(value.to_complex()?))
}

fn decode_tuple(conv: &Converter, value: &Value, depth: usize) -> ConvertResult<Native> {
    let arity = value.tuple_arity()?;
    let mut items = Vec::with_capacity(arity);
    for index in 0..arity {
        items.push(conv.decode_at(value.tuple_ref(index)?, depth + 1)?);
    }
    Ok(Native::Tuple(items))
}

fn decode_vector(conv: &Converter, value: &Value, depth: usize) -> ConvertResult<Native> {
    let len = value.length()?;
    let mut items = Vec::with_capacity(len);
    for index in 0..len {
        items.push(conv.decode_at(value.vector_ref(index)?, depth + 1)?);
    }
    Ok(Native::List(items))
}

fn decode_dict(conv: &Converter, value: &Value, depth: usize) -> ConvertResult<Native> {
    let items = value.dict_items()?;
    let mut entries = Vec::with_capacity(items.list_length());
    for item in items.iter_list() {
        entries.push((
            conv.decode_at(item.car()?, depth + 1)?,
            conv.decode_at(item.cdr()?, depth + 1)?,
        ));
    }
    Ok(Native::Dict(entries))
}

/// Pair chains become tuples: `(a b c)` gives `(a, b, c)` and an improper
/// tail is appended as the last element.
fn decode_pair(conv: &Converter, value: &Value, depth: usize) -> ConvertResult<Native> {
    let mut cells = value.iter_list();
    let mut items = Vec::new();
    for car in cells.by_ref() {
        items.push(conv.decode_at(car, depth + 1)?);
    }
    let tail = cells.tail();
    if !tail.is_null() {
        items.push(conv.decode_at(tail, depth + 1)?);
    }
    Ok(Native::Tuple(items))
}

fn decode_uniform(conv: &Converter, value: &Value, _: usize) -> ConvertResult<Native> {
    let vector = value.as_uniform()?;
    conv.check_uniform_len(vector.len())?;
    Ok(Native::Array(conv.registry().decode(vector)?))
}

fn encode_none(_: &Converter, _: &Native, _: usize) -> ConvertResult<Value> {
    Ok(Value::Null)
}

fn encode_bool(_: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Bool(b) => Ok(Value::Bool(*b)),
        _ => Err(mismatch("bool")),
    }
}

fn encode_str(_: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Str(s) => Ok(Value::symbol(s)),
        _ => Err(mismatch("symbol")),
    }
}

/// Lossy: invalid UTF-8 sequences become U+FFFD and the result decodes as text.
fn encode_bytes(conv: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Bytes(bytes) if conv.config().byte_strings == ByteStringPolicy::Symbol => {
            Ok(Value::symbol(&String::from_utf8_lossy(bytes)))
        }
        _ => Err(mismatch("forced_utf8_symbol")),
    }
}

/// Only signed host integers; unsigned ones are left to the `uint64` rule.
fn encode_integer(_: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Int(NativeInt::Signed(i)) => Ok(Value::Integer(*i)),
        _ => Err(mismatch("integer")),
    }
}

fn encode_uint64(_: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Int(n) => n.as_u64().map(Value::UInt64).ok_or_else(|| ConvertError::OutOfRange {
            value: n.to_string(),
            target: "uint64",
        }),
        _ => Err(mismatch("uint64")),
    }
}

fn encode_float(_: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Float(x) => Ok(Value::Real(*x)),
        _ => Err(mismatch("real")),
    }
}

fn encode_complex(_: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Complex(c) => Ok(Value::Complex(*c)),
        _ => Err(mismatch("complex")),
    }
}

fn encode_tuple(conv: &Converter, native: &Native, depth: usize) -> ConvertResult<Value> {
    match native {
        Native::Tuple(items) => {
            let fields = items
                .iter()
                .map(|item| conv.encode_at(item, depth + 1))
                .collect::<ConvertResult<Vec<_>>>()?;
            Ok(Value::tuple(fields))
        }
        _ => Err(mismatch("tuple")),
    }
}

/// Allocates a vector of the final length, then fills each slot.
fn encode_list(conv: &Converter, native: &Native, depth: usize) -> ConvertResult<Value> {
    match native {
        Native::List(items) => {
            let mut vector = Value::vector(items.len(), Value::Null);
            for (index, item) in items.iter().enumerate() {
                vector = vector.vector_set(index, conv.encode_at(item, depth + 1)?)?;
            }
            Ok(vector)
        }
        _ => Err(mismatch("vector")),
    }
}

fn encode_dict(conv: &Converter, native: &Native, depth: usize) -> ConvertResult<Value> {
    match native {
        Native::Dict(entries) => {
            let mut dict = Value::dict();
            for (key, item) in entries {
                dict = dict.dict_add(
                    conv.encode_at(key, depth + 1)?,
                    conv.encode_at(item, depth + 1)?,
                )?;
            }
            Ok(dict)
        }
        _ => Err(mismatch("dict")),
    }
}

fn encode_array(conv: &Converter, native: &Native, _: usize) -> ConvertResult<Value> {
    match native {
        Native::Array(array) => {
            conv.check_uniform_len(array.len())?;
            Ok(Value::Uniform(conv.registry().encode(array)?))
        }
        _ => Err(mismatch("uniform_vector")),
    }
}
