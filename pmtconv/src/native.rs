//! Host-native dynamic values.
//!
//! [`Native`] is the closed set of capabilities a host runtime can hand to the
//! converter: "is it none / a bool / a string / an integer / a mapping / a
//! typed numeric array ...". Front ends (the Python binding for instance) map
//! their own objects onto it.
use std::fmt;

use ordered_float::OrderedFloat;
use pmtval::Complex64;
use strum::{Display, EnumIs, EnumIter, EnumTryAs, IntoStaticStr};

use crate::{
    array::NativeArray,
    error::{ConvertError, ConvertResult},
};

/// A host integer, remembered with the signedness it was produced with.
///
/// Comparison is numeric: `Signed(5) == Unsigned(5)`.
#[derive(Debug, Clone, Copy)]
pub enum NativeInt {
    Signed(i64),
    Unsigned(u64),
}

impl NativeInt {
    #[inline]
    pub fn as_i128(self) -> i128 {
        match self {
            NativeInt::Signed(i) => i as i128,
            NativeInt::Unsigned(u) => u as i128,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        i64::try_from(self.as_i128()).ok()
    }

    pub fn as_u64(self) -> Option<u64> {
        u64::try_from(self.as_i128()).ok()
    }

    pub fn as_f64(self) -> f64 {
        match self {
            NativeInt::Signed(i) => i as f64,
            NativeInt::Unsigned(u) => u as f64,
        }
    }
}

impl PartialEq for NativeInt {
    fn eq(&self, other: &Self) -> bool {
        self.as_i128() == other.as_i128()
    }
}

impl Eq for NativeInt {}

impl fmt::Display for NativeInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeInt::Signed(i) => write!(f, "{}", i),
            NativeInt::Unsigned(u) => write!(f, "{}", u),
        }
    }
}

/// Type name of a [`Native`], as reported in conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum NativeKind {
    #[strum(serialize = "NoneType")]
    None,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "str")]
    Str,
    #[strum(serialize = "bytes")]
    Bytes,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "complex")]
    Complex,
    #[strum(serialize = "tuple")]
    Tuple,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "dict")]
    Dict,
    #[strum(serialize = "ndarray")]
    Array,
}

/// A dynamic value of the host runtime.
#[derive(Debug, Clone, EnumIs, EnumTryAs)]
pub enum Native {
    /// The null sentinel.
    None,
    Bool(bool),
    /// Text, always valid UTF-8.
    Str(String),
    /// Raw byte string, possibly not UTF-8.
    Bytes(Vec<u8>),
    Int(NativeInt),
    Float(f64),
    Complex(Complex64),
    /// Fixed-arity sequence.
    Tuple(Vec<Native>),
    /// Resizable sequence.
    List(Vec<Native>),
    /// Mapping; entry order carries no meaning.
    Dict(Vec<(Native, Native)>),
    /// Typed numeric buffer.
    Array(NativeArray),
}

impl Native {
    pub fn kind(&self) -> NativeKind {
        match self {
            Native::None => NativeKind::None,
            Native::Bool(_) => NativeKind::Bool,
            Native::Str(_) => NativeKind::Str,
            Native::Bytes(_) => NativeKind::Bytes,
            Native::Int(_) => NativeKind::Int,
            Native::Float(_) => NativeKind::Float,
            Native::Complex(_) => NativeKind::Complex,
            Native::Tuple(_) => NativeKind::Tuple,
            Native::List(_) => NativeKind::List,
            Native::Dict(_) => NativeKind::Dict,
            Native::Array(_) => NativeKind::Array,
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Native::Str(s.into())
    }

    pub fn dict(entries: impl IntoIterator<Item = (Native, Native)>) -> Self {
        Native::Dict(entries.into_iter().collect())
    }

    /// Freeze into a form a hashing host mapping accepts as a key.
    ///
    /// Lists and arrays become tuples (arrays flattened in row-major order),
    /// nested sequences included. A dict has no frozen form.
    pub fn into_key(self) -> ConvertResult<Native> {
        match self {
            Native::Tuple(items) | Native::List(items) => items
                .into_iter()
                .map(Native::into_key)
                .collect::<ConvertResult<Vec<_>>>()
                .map(Native::Tuple),
            Native::Array(array) => Ok(Native::Tuple(array.elements().map(Native::from).collect())),
            Native::Dict(_) => Err(ConvertError::UnhashableKey(NativeKind::Dict)),
            other => Ok(other),
        }
    }

    /// Value stored under `key` in a dict, `None` for a missing key or a non-dict.
    pub fn dict_get(&self, key: &Native) -> Option<&Native> {
        match self {
            Native::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

fn dict_entries_eq(a: &[(Native, Native)], b: &[(Native, Native)]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.iter().any(|(k, v)| k == key && v == value))
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Native::None, Native::None) => true,
            (Native::Bool(a), Native::Bool(b)) => a == b,
            (Native::Str(a), Native::Str(b)) => a == b,
            (Native::Bytes(a), Native::Bytes(b)) => a == b,
            (Native::Int(a), Native::Int(b)) => a == b,
            (Native::Float(a), Native::Float(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Native::Complex(a), Native::Complex(b)) => {
                OrderedFloat(a.re) == OrderedFloat(b.re) && OrderedFloat(a.im) == OrderedFloat(b.im)
            }
            (Native::Tuple(a), Native::Tuple(b)) => a == b,
            (Native::List(a), Native::List(b)) => a == b,
            (Native::Dict(a), Native::Dict(b)) => dict_entries_eq(a, b),
            (Native::Array(a), Native::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<()> for Native {
    fn from(_: ()) -> Self {
        Native::None
    }
}

impl From<bool> for Native {
    fn from(b: bool) -> Self {
        Native::Bool(b)
    }
}

impl From<i64> for Native {
    fn from(i: i64) -> Self {
        Native::Int(NativeInt::Signed(i))
    }
}

impl From<i32> for Native {
    fn from(i: i32) -> Self {
        Native::Int(NativeInt::Signed(i as i64))
    }
}

impl From<u64> for Native {
    fn from(u: u64) -> Self {
        Native::Int(NativeInt::Unsigned(u))
    }
}

impl From<f64> for Native {
    fn from(f: f64) -> Self {
        Native::Float(f)
    }
}

impl From<Complex64> for Native {
    fn from(c: Complex64) -> Self {
        Native::Complex(c)
    }
}

impl From<&str> for Native {
    fn from(s: &str) -> Self {
        Native::Str(s.to_owned())
    }
}

impl From<String> for Native {
    fn from(s: String) -> Self {
        Native::Str(s)
    }
}

impl From<Vec<Native>> for Native {
    fn from(items: Vec<Native>) -> Self {
        Native::List(items)
    }
}

impl From<NativeArray> for Native {
    fn from(array: NativeArray) -> Self {
        Native::Array(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_compare_numerically() {
        assert_eq!(NativeInt::Signed(5), NativeInt::Unsigned(5));
        assert_ne!(NativeInt::Signed(-1), NativeInt::Unsigned(u64::MAX));
        assert_eq!(NativeInt::Unsigned(u64::MAX).as_i64(), None);
        assert_eq!(NativeInt::Signed(-1).as_u64(), None);
    }

    #[test]
    fn dict_equality_ignores_order() {
        let a = Native::dict([(Native::from("a"), Native::from(1)), (Native::from("b"), Native::from(2.5))]);
        let b = Native::dict([(Native::from("b"), Native::from(2.5)), (Native::from("a"), Native::from(1))]);
        assert_eq!(a, b);
        assert_eq!(a.dict_get(&Native::from("b")), Some(&Native::Float(2.5)));
    }

    #[test]
    fn tuples_and_lists_differ() {
        assert_ne!(Native::Tuple(vec![Native::from(1)]), Native::List(vec![Native::from(1)]));
        assert_eq!(NativeKind::Array.to_string(), "ndarray");
        assert!(Native::None.is_none());
        assert_eq!(Native::from(true).try_as_bool(), Some(true));
    }

    #[test]
    fn keys_freeze_sequences_into_tuples() {
        let key = Native::List(vec![
            Native::from(1),
            Native::List(vec![Native::from("a")]),
            Native::Array(NativeArray::from_vec(vec![2u8, 3])),
        ]);
        assert_eq!(
            key.into_key().unwrap(),
            Native::Tuple(vec![
                Native::from(1),
                Native::Tuple(vec![Native::from("a")]),
                Native::Tuple(vec![Native::from(2), Native::from(3)]),
            ])
        );
        assert_eq!(Native::from(2.5).into_key().unwrap(), Native::Float(2.5));

        let nested = Native::Tuple(vec![Native::dict([(Native::from("k"), Native::None)])]);
        let err = nested.into_key().unwrap_err();
        assert!(matches!(err, ConvertError::UnhashableKey(NativeKind::Dict)));
    }
}
