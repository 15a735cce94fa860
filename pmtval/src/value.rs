//! The polymorphic value carried by messages and stream tags.
use std::{
    fmt,
    hash::{Hash, Hasher},
    mem,
    sync::Arc,
};

use ordered_float::OrderedFloat;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::{
    dict::Dict,
    error::{ValueError, ValueResult},
    list::ListIter,
    numeric::{Complex64, Element, UniformVector},
    symbol::Symbol,
};

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, IntoStaticStr)]
pub enum ValueTag {
    #[strum(serialize = "null")]
    Null,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "symbol")]
    Symbol,
    #[strum(serialize = "integer")]
    Integer,
    #[strum(serialize = "uint64")]
    UInt64,
    #[strum(serialize = "real")]
    Real,
    #[strum(serialize = "complex")]
    Complex,
    #[strum(serialize = "pair")]
    Pair,
    #[strum(serialize = "tuple")]
    Tuple,
    #[strum(serialize = "vector")]
    Vector,
    #[strum(serialize = "dict")]
    Dict,
    #[strum(serialize = "uniform_vector")]
    UniformVector,
}

/// A cons cell. Chains of pairs ending with [`Value::Null`] are proper lists.
#[derive(Debug, Clone)]
pub struct Pair {
    car: Value,
    cdr: Value,
}

impl Pair {
    #[inline]
    pub fn car(&self) -> &Value {
        &self.car
    }

    #[inline]
    pub fn cdr(&self) -> &Value {
        &self.cdr
    }
}

impl Drop for Pair {
    // Unlink long lists iteratively instead of recursing once per node.
    fn drop(&mut self) {
        let mut next = mem::take(&mut self.cdr);
        while let Value::Pair(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut pair) => next = mem::take(&mut pair.cdr),
                Err(_) => break,
            }
        }
    }
}

/// Universal message payload.
///
/// A `Value` never changes once built. Containers hold their children behind
/// `Arc`, so cloning is cheap and the same sub-value can be shared by many
/// messages and threads.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Symbol(Symbol),
    Integer(i64),
    UInt64(u64),
    Real(f64),
    Complex(Complex64),
    Pair(Arc<Pair>),
    Tuple(Arc<[Value]>),
    Vector(Arc<Vec<Value>>),
    Dict(Dict),
    Uniform(UniformVector),
}

impl Value {
    pub const fn null() -> Self {
        Value::Null
    }

    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Interned symbol: equal names give the same handle.
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    pub const fn integer(i: i64) -> Self {
        Value::Integer(i)
    }

    pub const fn uint64(u: u64) -> Self {
        Value::UInt64(u)
    }

    pub const fn real(f: f64) -> Self {
        Value::Real(f)
    }

    pub const fn complex(re: f64, im: f64) -> Self {
        Value::Complex(Complex64::new(re, im))
    }

    pub fn pair(car: Value, cdr: Value) -> Self {
        Value::Pair(Arc::new(Pair { car, cdr }))
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// A vector of `len` slots, all holding `fill`.
    pub fn vector(len: usize, fill: Value) -> Self {
        Value::Vector(Arc::new(vec![fill; len]))
    }

    pub fn dict() -> Self {
        Value::Dict(Dict::new())
    }

    pub fn uniform<T: Element>(data: impl Into<Arc<[T]>>) -> Self {
        Value::Uniform(UniformVector::new(data))
    }

    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Null => ValueTag::Null,
            Value::Bool(_) => ValueTag::Bool,
            Value::Symbol(_) => ValueTag::Symbol,
            Value::Integer(_) => ValueTag::Integer,
            Value::UInt64(_) => ValueTag::UInt64,
            Value::Real(_) => ValueTag::Real,
            Value::Complex(_) => ValueTag::Complex,
            Value::Pair(_) => ValueTag::Pair,
            Value::Tuple(_) => ValueTag::Tuple,
            Value::Vector(_) => ValueTag::Vector,
            Value::Dict(_) => ValueTag::Dict,
            Value::Uniform(_) => ValueTag::UniformVector,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    #[inline]
    pub fn is_uint64(&self) -> bool {
        matches!(self, Value::UInt64(_))
    }

    #[inline]
    pub fn is_real(&self) -> bool {
        matches!(self, Value::Real(_))
    }

    #[inline]
    pub fn is_complex(&self) -> bool {
        matches!(self, Value::Complex(_))
    }

    #[inline]
    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    #[inline]
    pub fn is_tuple(&self) -> bool {
        matches!(self, Value::Tuple(_))
    }

    #[inline]
    pub fn is_vector(&self) -> bool {
        matches!(self, Value::Vector(_))
    }

    #[inline]
    pub fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    #[inline]
    pub fn is_uniform_vector(&self) -> bool {
        matches!(self, Value::Uniform(_))
    }

    fn wrong_type(&self, expected: ValueTag) -> ValueError {
        ValueError::WrongType {
            expected,
            found: self.tag(),
        }
    }

    /// Number of elements of a container.
    ///
    /// Lists (pairs and `Null`) count their cells, dicts their entries.
    pub fn length(&self) -> ValueResult<usize> {
        match self {
            Value::Null | Value::Pair(_) => Ok(self.list_length()),
            Value::Tuple(items) => Ok(items.len()),
            Value::Vector(items) => Ok(items.len()),
            Value::Dict(dict) => Ok(dict.len()),
            Value::Uniform(uniform) => Ok(uniform.len()),
            other => Err(other.wrong_type(ValueTag::Vector)),
        }
    }

    pub fn vector_ref(&self, index: usize) -> ValueResult<&Value> {
        match self {
            Value::Vector(items) => items.get(index).ok_or(ValueError::IndexOutOfBounds {
                index,
                len: items.len(),
            }),
            other => Err(other.wrong_type(ValueTag::Vector)),
        }
    }

    /// Store `item` at `index` and return the updated vector.
    ///
    /// The slot is written in place only when `self` is the sole handle on the
    /// vector storage. Otherwise the storage is copied first, so other holders
    /// never observe the change.
    pub fn vector_set(self, index: usize, item: Value) -> ValueResult<Value> {
        match self {
            Value::Vector(mut items) => {
                let len = items.len();
                let slot = Arc::make_mut(&mut items)
                    .get_mut(index)
                    .ok_or(ValueError::IndexOutOfBounds { index, len })?;
                *slot = item;
                Ok(Value::Vector(items))
            }
            other => Err(other.wrong_type(ValueTag::Vector)),
        }
    }

    pub fn tuple_ref(&self, index: usize) -> ValueResult<&Value> {
        match self {
            Value::Tuple(items) => items.get(index).ok_or(ValueError::IndexOutOfBounds {
                index,
                len: items.len(),
            }),
            other => Err(other.wrong_type(ValueTag::Tuple)),
        }
    }

    pub fn tuple_arity(&self) -> ValueResult<usize> {
        match self {
            Value::Tuple(items) => Ok(items.len()),
            other => Err(other.wrong_type(ValueTag::Tuple)),
        }
    }

    pub fn as_dict(&self) -> ValueResult<&Dict> {
        match self {
            Value::Dict(dict) => Ok(dict),
            other => Err(other.wrong_type(ValueTag::Dict)),
        }
    }

    /// Return a new dict with `key` bound to `value`; `self` is unchanged.
    pub fn dict_add(&self, key: Value, value: Value) -> ValueResult<Value> {
        Ok(Value::Dict(self.as_dict()?.insert(key, value)))
    }

    /// Return a new dict without `key`; `self` is unchanged.
    pub fn dict_delete(&self, key: &Value) -> ValueResult<Value> {
        Ok(Value::Dict(self.as_dict()?.remove(key)))
    }

    /// Return a new dict holding the entries of `self` overridden by `other`.
    pub fn dict_update(&self, other: &Value) -> ValueResult<Value> {
        Ok(Value::Dict(self.as_dict()?.merge(other.as_dict()?)))
    }

    pub fn dict_ref(&self, key: &Value) -> ValueResult<Option<&Value>> {
        Ok(self.as_dict()?.get(key))
    }

    /// Like [`Self::dict_ref`], but a missing key is an error.
    pub fn dict_get(&self, key: &Value) -> ValueResult<&Value> {
        self.dict_ref(key)?
            .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))
    }

    pub fn dict_has_key(&self, key: &Value) -> ValueResult<bool> {
        Ok(self.as_dict()?.contains_key(key))
    }

    /// Entries as a proper list of `(key . value)` pairs.
    pub fn dict_items(&self) -> ValueResult<Value> {
        let dict = self.as_dict()?;
        Ok(Value::list(
            dict.iter()
                .map(|(k, v)| Value::pair(k.clone(), v.clone()))
                .collect::<Vec<_>>(),
        ))
    }

    pub fn dict_keys(&self) -> ValueResult<Value> {
        let dict = self.as_dict()?;
        Ok(Value::list(dict.keys().cloned().collect::<Vec<_>>()))
    }

    pub fn dict_values(&self) -> ValueResult<Value> {
        let dict = self.as_dict()?;
        Ok(Value::list(dict.values().cloned().collect::<Vec<_>>()))
    }

    pub fn as_uniform(&self) -> ValueResult<&UniformVector> {
        match self {
            Value::Uniform(uniform) => Ok(uniform),
            other => Err(other.wrong_type(ValueTag::UniformVector)),
        }
    }

    /// Typed elements of a uniform vector, `None` for another element type.
    pub fn uniform_elements<T: Element>(&self) -> ValueResult<Option<&[T]>> {
        Ok(self.as_uniform()?.as_slice())
    }

    pub fn to_bool(&self) -> ValueResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.wrong_type(ValueTag::Bool)),
        }
    }

    pub fn to_long(&self) -> ValueResult<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(other.wrong_type(ValueTag::Integer)),
        }
    }

    pub fn to_uint64(&self) -> ValueResult<u64> {
        match self {
            Value::UInt64(u) => Ok(*u),
            Value::Integer(i) if *i >= 0 => Ok(*i as u64),
            other => Err(other.wrong_type(ValueTag::UInt64)),
        }
    }

    /// Any real scalar as `f64`.
    pub fn to_double(&self) -> ValueResult<f64> {
        match self {
            Value::Real(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            Value::UInt64(u) => Ok(*u as f64),
            other => Err(other.wrong_type(ValueTag::Real)),
        }
    }

    /// Any numeric scalar as a complex number.
    pub fn to_complex(&self) -> ValueResult<Complex64> {
        match self {
            Value::Complex(c) => Ok(*c),
            Value::Real(_) | Value::Integer(_) | Value::UInt64(_) => {
                Ok(Complex64::new(self.to_double()?, 0.0))
            }
            other => Err(other.wrong_type(ValueTag::Complex)),
        }
    }

    pub fn as_symbol(&self) -> ValueResult<&Symbol> {
        match self {
            Value::Symbol(symbol) => Ok(symbol),
            other => Err(other.wrong_type(ValueTag::Symbol)),
        }
    }

    pub fn symbol_to_string(&self) -> ValueResult<String> {
        Ok(self.as_symbol()?.as_str().to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt64(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<Complex64> for Value {
    fn from(c: Complex64) -> Self {
        Value::Complex(c)
    }
}

impl From<&str> for Value {
    fn from(name: &str) -> Self {
        Value::symbol(name)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<Dict> for Value {
    fn from(dict: Dict) -> Self {
        Value::Dict(dict)
    }
}

impl From<UniformVector> for Value {
    fn from(uniform: UniformVector) -> Self {
        Value::Uniform(uniform)
    }
}

fn complex_total_eq(a: &Complex64, b: &Complex64) -> bool {
    OrderedFloat(a.re) == OrderedFloat(b.re) && OrderedFloat(a.im) == OrderedFloat(b.im)
}

fn pairs_eq(a: &Arc<Pair>, b: &Arc<Pair>) -> bool {
    let (mut a, mut b) = (a, b);
    loop {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        if a.car != b.car {
            return false;
        }
        match (&a.cdr, &b.cdr) {
            (Value::Pair(next_a), Value::Pair(next_b)) => {
                a = next_a;
                b = next_b;
            }
            (tail_a, tail_b) => return tail_a == tail_b,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Value::Complex(a), Value::Complex(b)) => complex_total_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => pairs_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Vector(a), Value::Vector(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Uniform(a), Value::Uniform(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Symbol(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::UInt64(u) => u.hash(state),
            Value::Real(f) => OrderedFloat(*f).hash(state),
            Value::Complex(c) => {
                OrderedFloat(c.re).hash(state);
                OrderedFloat(c.im).hash(state);
            }
            Value::Pair(_) => {
                let mut iter = ListIter::new(self);
                for item in iter.by_ref() {
                    item.hash(state);
                }
                iter.tail().hash(state);
            }
            Value::Tuple(items) => items.hash(state),
            Value::Vector(items) => items.hash(state),
            Value::Dict(dict) => dict.hash(state),
            Value::Uniform(uniform) => uniform.hash(state),
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "()"),
            Value::Bool(true) => write!(f, "#t"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::UInt64(u) => write!(f, "{}", u),
            Value::Real(r) => write!(f, "{}", r),
            Value::Complex(c) => write!(f, "{}", c),
            Value::Pair(_) => {
                let mut iter = ListIter::new(self);
                write!(f, "(")?;
                write_seq(f, iter.by_ref())?;
                match iter.tail() {
                    Value::Null => write!(f, ")"),
                    tail => write!(f, " . {})", tail),
                }
            }
            Value::Tuple(items) => {
                write!(f, "{{")?;
                write_seq(f, items.iter())?;
                write!(f, "}}")
            }
            Value::Vector(items) => {
                write!(f, "#(")?;
                write_seq(f, items.iter())?;
                write!(f, ")")
            }
            Value::Dict(dict) => write!(f, "{}", dict),
            Value::Uniform(uniform) => write!(f, "{}", uniform),
        }
    }
}
