//! Complex scalars and uniform (single element type) numeric buffers.
use std::{
    fmt,
    hash::{Hash, Hasher},
    mem::size_of,
    sync::Arc,
};

use ordered_float::OrderedFloat;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ValueError, ValueResult};

/// A complex number stored as two IEEE floats (real part first).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    #[inline]
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

/// Pair of `f32`, the element of a `c32` uniform vector.
pub type Complex32 = Complex<f32>;
/// Pair of `f64`, the payload of [`crate::Value::Complex`].
pub type Complex64 = Complex<f64>;

impl From<Complex32> for Complex64 {
    fn from(value: Complex32) -> Self {
        Complex64::new(value.re as f64, value.im as f64)
    }
}

impl<T: fmt::Display + PartialOrd + Default> fmt::Display for Complex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im < T::default() {
            write!(f, "{}{}j", self.re, self.im)
        } else {
            write!(f, "{}+{}j", self.re, self.im)
        }
    }
}

/// Concrete element kind of a [`UniformVector`].
///
/// The textual names (`u8`, `s8`, ..., `c64`) follow the usual uniform vector
/// naming where `c32` is a pair of `f32` and `c64` a pair of `f64`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ElementType {
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    F32,
    F64,
    C32,
    C64,
}

impl ElementType {
    /// Width in bytes of one element in host memory.
    pub const fn byte_width(&self) -> usize {
        match self {
            ElementType::U8 | ElementType::S8 => 1,
            ElementType::U16 | ElementType::S16 => 2,
            ElementType::U32 | ElementType::S32 | ElementType::F32 => 4,
            ElementType::F64 | ElementType::C32 => 8,
            ElementType::C64 => 16,
        }
    }

    pub const fn is_signed(&self) -> bool {
        !matches!(self, ElementType::U8 | ElementType::U16 | ElementType::U32)
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            ElementType::U8
                | ElementType::S8
                | ElementType::U16
                | ElementType::S16
                | ElementType::U32
                | ElementType::S32
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }

    pub const fn is_complex(&self) -> bool {
        matches!(self, ElementType::C32 | ElementType::C64)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A scalar that can be stored in a [`UniformVector`].
///
/// Implemented for `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `f32`, `f64`,
/// [`Complex32`] and [`Complex64`].
pub trait Element: Copy + Send + Sync + fmt::Debug + fmt::Display + 'static + sealed::Sealed {
    const ELEMENT_TYPE: ElementType;

    fn wrap(data: Arc<[Self]>) -> UniformVector;

    fn view(vector: &UniformVector) -> Option<&[Self]>;

    fn write_ne_bytes(self, out: &mut Vec<u8>);

    /// `chunk` is exactly `ELEMENT_TYPE.byte_width()` bytes long.
    fn read_ne_bytes(chunk: &[u8]) -> Self;

    /// Equality where NaN equals NaN and `-0.0` equals `0.0`.
    fn total_eq(self, other: Self) -> bool;

    fn total_hash<H: Hasher>(self, state: &mut H);
}

macro_rules! int_element {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn wrap(data: Arc<[Self]>) -> UniformVector {
                UniformVector::$variant(data)
            }

            #[inline]
            fn view(vector: &UniformVector) -> Option<&[Self]> {
                match vector {
                    UniformVector::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn write_ne_bytes(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }

            fn read_ne_bytes(chunk: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$ty>()];
                buf.copy_from_slice(chunk);
                <$ty>::from_ne_bytes(buf)
            }

            #[inline]
            fn total_eq(self, other: Self) -> bool {
                self == other
            }

            fn total_hash<H: Hasher>(self, state: &mut H) {
                self.hash(state);
            }
        }
    };
}

macro_rules! float_element {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn wrap(data: Arc<[Self]>) -> UniformVector {
                UniformVector::$variant(data)
            }

            #[inline]
            fn view(vector: &UniformVector) -> Option<&[Self]> {
                match vector {
                    UniformVector::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn write_ne_bytes(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }

            fn read_ne_bytes(chunk: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$ty>()];
                buf.copy_from_slice(chunk);
                <$ty>::from_ne_bytes(buf)
            }

            #[inline]
            fn total_eq(self, other: Self) -> bool {
                OrderedFloat(self) == OrderedFloat(other)
            }

            fn total_hash<H: Hasher>(self, state: &mut H) {
                OrderedFloat(self).hash(state);
            }
        }
    };
}

macro_rules! complex_element {
    ($part:ty, $variant:ident) => {
        impl sealed::Sealed for Complex<$part> {}

        impl Element for Complex<$part> {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn wrap(data: Arc<[Self]>) -> UniformVector {
                UniformVector::$variant(data)
            }

            #[inline]
            fn view(vector: &UniformVector) -> Option<&[Self]> {
                match vector {
                    UniformVector::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn write_ne_bytes(self, out: &mut Vec<u8>) {
                self.re.write_ne_bytes(out);
                self.im.write_ne_bytes(out);
            }

            fn read_ne_bytes(chunk: &[u8]) -> Self {
                let (re, im) = chunk.split_at(size_of::<$part>());
                Complex::new(<$part>::read_ne_bytes(re), <$part>::read_ne_bytes(im))
            }

            #[inline]
            fn total_eq(self, other: Self) -> bool {
                self.re.total_eq(other.re) && self.im.total_eq(other.im)
            }

            fn total_hash<H: Hasher>(self, state: &mut H) {
                self.re.total_hash(state);
                self.im.total_hash(state);
            }
        }
    };
}

int_element!(u8, U8);
int_element!(i8, S8);
int_element!(u16, U16);
int_element!(i16, S16);
int_element!(u32, U32);
int_element!(i32, S32);
float_element!(f32, F32);
float_element!(f64, F64);
complex_element!(f32, C32);
complex_element!(f64, C64);

/// Fixed-length buffer whose elements all share one [`ElementType`].
///
/// The storage is shared, cloning a uniform vector never copies elements.
#[derive(Debug, Clone)]
pub enum UniformVector {
    U8(Arc<[u8]>),
    S8(Arc<[i8]>),
    U16(Arc<[u16]>),
    S16(Arc<[i16]>),
    U32(Arc<[u32]>),
    S32(Arc<[i32]>),
    F32(Arc<[f32]>),
    F64(Arc<[f64]>),
    C32(Arc<[Complex32]>),
    C64(Arc<[Complex64]>),
}

/// Run `$body` with `$data` bound to the typed slice of `$vector`.
macro_rules! with_elements {
    ($vector:expr, $data:ident => $body:expr) => {
        match $vector {
            UniformVector::U8($data) => $body,
            UniformVector::S8($data) => $body,
            UniformVector::U16($data) => $body,
            UniformVector::S16($data) => $body,
            UniformVector::U32($data) => $body,
            UniformVector::S32($data) => $body,
            UniformVector::F32($data) => $body,
            UniformVector::F64($data) => $body,
            UniformVector::C32($data) => $body,
            UniformVector::C64($data) => $body,
        }
    };
}

fn decode_ne<T: Element>(bytes: &[u8]) -> ValueResult<UniformVector> {
    let width = T::ELEMENT_TYPE.byte_width();
    if bytes.len() % width != 0 {
        return Err(ValueError::ByteLength {
            kind: T::ELEMENT_TYPE,
            len: bytes.len(),
            width,
        });
    }
    let data: Arc<[T]> = bytes.chunks_exact(width).map(T::read_ne_bytes).collect();
    Ok(T::wrap(data))
}

fn slices_total_eq<T: Element>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.total_eq(*y))
}

impl UniformVector {
    /// Build a uniform vector from any collection of one element type.
    pub fn new<T: Element>(data: impl Into<Arc<[T]>>) -> Self {
        T::wrap(data.into())
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            UniformVector::U8(_) => ElementType::U8,
            UniformVector::S8(_) => ElementType::S8,
            UniformVector::U16(_) => ElementType::U16,
            UniformVector::S16(_) => ElementType::S16,
            UniformVector::U32(_) => ElementType::U32,
            UniformVector::S32(_) => ElementType::S32,
            UniformVector::F32(_) => ElementType::F32,
            UniformVector::F64(_) => ElementType::F64,
            UniformVector::C32(_) => ElementType::C32,
            UniformVector::C64(_) => ElementType::C64,
        }
    }

    pub fn len(&self) -> usize {
        with_elements!(self, data => data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed view of the elements, `None` if `T` is not the element type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::view(self)
    }

    /// Elements serialized back to back in host byte order.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.element_type().byte_width());
        with_elements!(self, data => {
            for item in data.iter() {
                item.write_ne_bytes(&mut out);
            }
        });
        out
    }

    /// Inverse of [`Self::to_ne_bytes`]. The element count is
    /// `bytes.len() / kind.byte_width()`.
    pub fn from_ne_bytes(kind: ElementType, bytes: &[u8]) -> ValueResult<Self> {
        match kind {
            ElementType::U8 => decode_ne::<u8>(bytes),
            ElementType::S8 => decode_ne::<i8>(bytes),
            ElementType::U16 => decode_ne::<u16>(bytes),
            ElementType::S16 => decode_ne::<i16>(bytes),
            ElementType::U32 => decode_ne::<u32>(bytes),
            ElementType::S32 => decode_ne::<i32>(bytes),
            ElementType::F32 => decode_ne::<f32>(bytes),
            ElementType::F64 => decode_ne::<f64>(bytes),
            ElementType::C32 => decode_ne::<Complex32>(bytes),
            ElementType::C64 => decode_ne::<Complex64>(bytes),
        }
    }
}

impl PartialEq for UniformVector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UniformVector::U8(a), UniformVector::U8(b)) => a == b,
            (UniformVector::S8(a), UniformVector::S8(b)) => a == b,
            (UniformVector::U16(a), UniformVector::U16(b)) => a == b,
            (UniformVector::S16(a), UniformVector::S16(b)) => a == b,
            (UniformVector::U32(a), UniformVector::U32(b)) => a == b,
            (UniformVector::S32(a), UniformVector::S32(b)) => a == b,
            (UniformVector::F32(a), UniformVector::F32(b)) => slices_total_eq(a, b),
            (UniformVector::F64(a), UniformVector::F64(b)) => slices_total_eq(a, b),
            (UniformVector::C32(a), UniformVector::C32(b)) => slices_total_eq(a, b),
            (UniformVector::C64(a), UniformVector::C64(b)) => slices_total_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for UniformVector {}

impl Hash for UniformVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element_type().hash(state);
        with_elements!(self, data => {
            data.len().hash(state);
            for item in data.iter() {
                item.total_hash(state);
            }
        });
    }
}

impl fmt::Display for UniformVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[{}", self.element_type())?;
        with_elements!(self, data => {
            for item in data.iter() {
                write!(f, " {}", item)?;
            }
        });
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_names_parse() {
        assert_eq!("c32".parse::<ElementType>(), Ok(ElementType::C32));
        assert_eq!(ElementType::S16.to_string(), "s16");
        assert_eq!(ElementType::C64.byte_width(), 16);
        assert!(!ElementType::U32.is_signed());
    }

    #[test]
    fn ne_bytes_roundtrip_keeps_bits() {
        let v = UniformVector::new(vec![Complex32::new(1.5, -2.0), Complex32::new(0.0, 3.25)]);
        let bytes = v.to_ne_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(UniformVector::from_ne_bytes(ElementType::C32, &bytes), Ok(v));
    }

    #[test]
    fn ne_bytes_rejects_partial_elements() {
        let err = UniformVector::from_ne_bytes(ElementType::S32, &[0, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            ValueError::ByteLength {
                kind: ElementType::S32,
                len: 3,
                width: 4
            }
        );
    }

    #[test]
    fn nan_elements_compare_equal() {
        let a = UniformVector::new(vec![f32::NAN, 1.0]);
        let b = UniformVector::new(vec![f32::NAN, 1.0]);
        assert_eq!(a, b);
        assert_ne!(a, UniformVector::new(vec![f64::NAN, 1.0]));
    }
}
