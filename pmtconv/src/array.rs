//! Typed numeric arrays as a host runtime exposes them.
//!
//! [`DType`] names follow the numpy convention, so `complex64` is a pair of
//! `f32` and `complex128` a pair of `f64`. Hosts know more dtypes than a
//! [`pmtval::UniformVector`] can store (`int64`, `uint64`); those arrays exist
//! on the native side but have no registry entry.
use std::fmt;

use enum_map::Enum;
use ordered_float::OrderedFloat;
use pmtval::{Complex32, Complex64, ElementType};
use smallvec::{SmallVec, smallvec};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ConvertError, ConvertResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Enum,
)]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    Float32,
    Float64,
    Complex64,
    Complex128,
    Int8,
    Int16,
    Int32,
    Int64,
    #[strum(to_string = "uint8", serialize = "byte")]
    UInt8,
    UInt16,
    UInt32,
    UInt64,
}

impl DType {
    /// Storage kind of a uniform vector holding this dtype, if there is one.
    pub const fn element_type(&self) -> Option<ElementType> {
        Some(match self {
            DType::Float32 => ElementType::F32,
            DType::Float64 => ElementType::F64,
            DType::Complex64 => ElementType::C32,
            DType::Complex128 => ElementType::C64,
            DType::Int8 => ElementType::S8,
            DType::Int16 => ElementType::S16,
            DType::Int32 => ElementType::S32,
            DType::UInt8 => ElementType::U8,
            DType::UInt16 => ElementType::U16,
            DType::UInt32 => ElementType::U32,
            DType::Int64 | DType::UInt64 => return None,
        })
    }
}

impl From<ElementType> for DType {
    fn from(element: ElementType) -> Self {
        match element {
            ElementType::U8 => DType::UInt8,
            ElementType::S8 => DType::Int8,
            ElementType::U16 => DType::UInt16,
            ElementType::S16 => DType::Int16,
            ElementType::U32 => DType::UInt32,
            ElementType::S32 => DType::Int32,
            ElementType::F32 => DType::Float32,
            ElementType::F64 => DType::Float64,
            ElementType::C32 => DType::Complex64,
            ElementType::C64 => DType::Complex128,
        }
    }
}

/// One host numeric scalar, widened to the largest type of its family.
#[derive(Debug, Clone, Copy)]
pub enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex64),
}

impl Scalar {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Int(_) | Scalar::UInt(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Complex(_) => "complex",
        }
    }

    /// Numeric scalar carried by `native`; booleans count as integers.
    pub fn from_native(native: &crate::Native) -> Option<Self> {
        use crate::{Native, NativeInt};
        match native {
            Native::Bool(b) => Some(Scalar::Int(*b as i64)),
            Native::Int(NativeInt::Signed(i)) => Some(Scalar::Int(*i)),
            Native::Int(NativeInt::Unsigned(u)) => Some(Scalar::UInt(*u)),
            Native::Float(f) => Some(Scalar::Float(*f)),
            Native::Complex(c) => Some(Scalar::Complex(*c)),
            _ => None,
        }
    }

    fn total_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::UInt(a), Scalar::UInt(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Scalar::Complex(a), Scalar::Complex(b)) => {
                OrderedFloat(a.re) == OrderedFloat(b.re) && OrderedFloat(a.im) == OrderedFloat(b.im)
            }
            _ => false,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.total_eq(other)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::UInt(u) => write!(f, "{}", u),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Complex(c) => write!(f, "{}", c),
        }
    }
}

impl From<Scalar> for crate::Native {
    fn from(scalar: Scalar) -> Self {
        use crate::{Native, NativeInt};
        match scalar {
            Scalar::Int(i) => Native::Int(NativeInt::Signed(i)),
            Scalar::UInt(u) => Native::Int(NativeInt::Unsigned(u)),
            Scalar::Float(x) => Native::Float(x),
            Scalar::Complex(c) => Native::Complex(c),
        }
    }
}

/// Element buffer of a [`NativeArray`], one variant per [`DType`].
#[derive(Debug, Clone)]
pub enum ArrayData {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex32>),
    Complex128(Vec<Complex64>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
}

macro_rules! with_array_data {
    ($data:expr, $items:ident => $body:expr) => {
        match $data {
            ArrayData::Float32($items) => $body,
            ArrayData::Float64($items) => $body,
            ArrayData::Complex64($items) => $body,
            ArrayData::Complex128($items) => $body,
            ArrayData::Int8($items) => $body,
            ArrayData::Int16($items) => $body,
            ArrayData::Int32($items) => $body,
            ArrayData::Int64($items) => $body,
            ArrayData::UInt8($items) => $body,
            ArrayData::UInt16($items) => $body,
            ArrayData::UInt32($items) => $body,
            ArrayData::UInt64($items) => $body,
        }
    };
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Float64(_) => DType::Float64,
            ArrayData::Complex64(_) => DType::Complex64,
            ArrayData::Complex128(_) => DType::Complex128,
            ArrayData::Int8(_) => DType::Int8,
            ArrayData::Int16(_) => DType::Int16,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::UInt8(_) => DType::UInt8,
            ArrayData::UInt16(_) => DType::UInt16,
            ArrayData::UInt32(_) => DType::UInt32,
            ArrayData::UInt64(_) => DType::UInt64,
        }
    }

    pub fn len(&self) -> usize {
        with_array_data!(self, items => items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scalar_at(&self, index: usize) -> Option<Scalar> {
        with_array_data!(self, items => items.get(index).map(|item| item.to_scalar()))
    }

    /// Narrow `scalars` into a buffer of `dtype`.
    ///
    /// Integers are range checked; floats are accepted only by float and
    /// complex dtypes.
    pub fn from_scalars(
        dtype: DType,
        scalars: impl IntoIterator<Item = Scalar>,
    ) -> ConvertResult<Self> {
        fn collect<T: ArrayElement>(
            scalars: impl IntoIterator<Item = Scalar>,
        ) -> ConvertResult<ArrayData> {
            let items = scalars
                .into_iter()
                .map(T::from_scalar)
                .collect::<ConvertResult<Vec<T>>>()?;
            Ok(T::into_data(items))
        }

        match dtype {
            DType::Float32 => collect::<f32>(scalars),
            DType::Float64 => collect::<f64>(scalars),
            DType::Complex64 => collect::<Complex32>(scalars),
            DType::Complex128 => collect::<Complex64>(scalars),
            DType::Int8 => collect::<i8>(scalars),
            DType::Int16 => collect::<i16>(scalars),
            DType::Int32 => collect::<i32>(scalars),
            DType::Int64 => collect::<i64>(scalars),
            DType::UInt8 => collect::<u8>(scalars),
            DType::UInt16 => collect::<u16>(scalars),
            DType::UInt32 => collect::<u32>(scalars),
            DType::UInt64 => collect::<u64>(scalars),
        }
    }
}

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        self.dtype() == other.dtype()
            && self.len() == other.len()
            && (0..self.len()).all(|i| self.scalar_at(i) == other.scalar_at(i))
    }
}

/// Element types a host array can hold.
pub trait ArrayElement: Copy + Sized + 'static {
    const DTYPE: DType;

    /// Narrow a scalar into this element type.
    fn from_scalar(scalar: Scalar) -> ConvertResult<Self>;

    fn to_scalar(self) -> Scalar;

    fn into_data(items: Vec<Self>) -> ArrayData;

    fn as_data(data: &ArrayData) -> Option<&[Self]>;
}

fn coercion_error(dtype: DType, scalar: &Scalar) -> ConvertError {
    ConvertError::ScalarCoercion {
        dtype: dtype.into(),
        found: scalar.kind_name(),
    }
}

macro_rules! int_array_element {
    ($ty:ty, $variant:ident, $scalar:ident) => {
        impl ArrayElement for $ty {
            const DTYPE: DType = DType::$variant;

            fn from_scalar(scalar: Scalar) -> ConvertResult<Self> {
                let narrowed = match scalar {
                    Scalar::Int(i) => <$ty>::try_from(i).ok(),
                    Scalar::UInt(u) => <$ty>::try_from(u).ok(),
                    other => return Err(coercion_error(Self::DTYPE, &other)),
                };
                narrowed.ok_or_else(|| ConvertError::OutOfRange {
                    value: scalar.to_string(),
                    target: Self::DTYPE.into(),
                })
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$scalar(self.into())
            }

            fn into_data(items: Vec<Self>) -> ArrayData {
                ArrayData::$variant(items)
            }

            fn as_data(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(items) => Some(items),
                    _ => None,
                }
            }
        }
    };
}

int_array_element!(i8, Int8, Int);
int_array_element!(i16, Int16, Int);
int_array_element!(i32, Int32, Int);
int_array_element!(i64, Int64, Int);
int_array_element!(u8, UInt8, UInt);
int_array_element!(u16, UInt16, UInt);
int_array_element!(u32, UInt32, UInt);
int_array_element!(u64, UInt64, UInt);

macro_rules! float_array_element {
    ($ty:ty, $variant:ident) => {
        impl ArrayElement for $ty {
            const DTYPE: DType = DType::$variant;

            fn from_scalar(scalar: Scalar) -> ConvertResult<Self> {
                match scalar {
                    Scalar::Int(i) => Ok(i as $ty),
                    Scalar::UInt(u) => Ok(u as $ty),
                    Scalar::Float(x) => Ok(x as $ty),
                    other => Err(coercion_error(Self::DTYPE, &other)),
                }
            }

            fn to_scalar(self) -> Scalar {
                Scalar::Float(self as f64)
            }

            fn into_data(items: Vec<Self>) -> ArrayData {
                ArrayData::$variant(items)
            }

            fn as_data(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(items) => Some(items),
                    _ => None,
                }
            }
        }
    };
}

float_array_element!(f32, Float32);
float_array_element!(f64, Float64);

macro_rules! complex_array_element {
    ($part:ty, $variant:ident) => {
        impl ArrayElement for pmtval::Complex<$part> {
            const DTYPE: DType = DType::$variant;

            fn from_scalar(scalar: Scalar) -> ConvertResult<Self> {
                let (re, im) = match scalar {
                    Scalar::Int(i) => (i as f64, 0.0),
                    Scalar::UInt(u) => (u as f64, 0.0),
                    Scalar::Float(x) => (x, 0.0),
                    Scalar::Complex(c) => (c.re, c.im),
                };
                Ok(pmtval::Complex::new(re as $part, im as $part))
            }

            fn to_scalar(self) -> Scalar {
                Scalar::Complex(Complex64::new(self.re as f64, self.im as f64))
            }

            fn into_data(items: Vec<Self>) -> ArrayData {
                ArrayData::$variant(items)
            }

            fn as_data(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(items) => Some(items),
                    _ => None,
                }
            }
        }
    };
}

complex_array_element!(f32, Complex64);
complex_array_element!(f64, Complex128);

/// Iterator over the elements of an [`ArrayData`] as [`Scalar`]s.
pub struct ScalarIter<'a> {
    data: &'a ArrayData,
    position: usize,
}

impl Iterator for ScalarIter<'_> {
    type Item = Scalar;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.data.scalar_at(self.position)?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.data.len().saturating_sub(self.position);
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScalarIter<'_> {}

pub type Shape = SmallVec<[usize; 2]>;

/// A typed, possibly multi-dimensional, host array in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeArray {
    shape: Shape,
    data: ArrayData,
}

impl NativeArray {
    /// Checks that `shape` holds exactly the elements of `data`.
    pub fn new(shape: &[usize], data: ArrayData) -> ConvertResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ConvertError::ShapeMismatch {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        Ok(Self {
            shape: Shape::from_slice(shape),
            data,
        })
    }

    /// One-dimensional array over `data`.
    pub fn from_data(data: ArrayData) -> Self {
        Self {
            shape: smallvec![data.len()],
            data,
        }
    }

    pub fn from_vec<T: ArrayElement>(items: Vec<T>) -> Self {
        Self::from_data(T::into_data(items))
    }

    /// Build an array of `dtype`, see [`ArrayData::from_scalars`].
    pub fn from_scalars(
        dtype: DType,
        shape: &[usize],
        scalars: impl IntoIterator<Item = Scalar>,
    ) -> ConvertResult<Self> {
        Self::new(shape, ArrayData::from_scalars(dtype, scalars)?)
    }

    pub fn reshape(self, shape: &[usize]) -> ConvertResult<Self> {
        Self::new(shape, self.data)
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total element count, across all dimensions.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn as_slice<T: ArrayElement>(&self) -> Option<&[T]> {
        T::as_data(&self.data)
    }

    /// Elements in row-major order.
    pub fn elements(&self) -> ScalarIter<'_> {
        ScalarIter {
            data: &self.data,
            position: 0,
        }
    }
}
