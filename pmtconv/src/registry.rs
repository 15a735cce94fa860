//! Mapping between host array dtypes and uniform vector storage kinds.
//!
//! Each [`DTypeEntry`] bundles what the converter needs for one dtype: a
//! constructor building the uniform vector from scalars, the coercion applied
//! to each host element first, an extractor producing the host buffer back and
//! a predicate recognizing uniform vectors of that kind.
//!
//! Decoding scans the entries in registration order and the first matching
//! predicate wins. Encoding looks up the entry registered first for the
//! array dtype.
use std::sync::Arc;

use enum_map::EnumMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use pmtval::{Complex32, Complex64, Element, ElementType, UniformVector};

use crate::{
    array::{ArrayData, ArrayElement, DType, NativeArray, Scalar},
    error::{ConvertError, ConvertResult},
};

pub type Constructor = fn(usize, Vec<Scalar>) -> ConvertResult<UniformVector>;
pub type Coercion = fn(Scalar) -> ConvertResult<Scalar>;
pub type Extractor = fn(&UniformVector) -> Option<ArrayData>;
pub type Predicate = fn(&UniformVector) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct DTypeEntry {
    pub name: &'static str,
    pub dtype: DType,
    pub element: ElementType,
    pub construct: Constructor,
    pub coerce: Coercion,
    pub extract: Extractor,
    pub predicate: Predicate,
}

fn construct<T: Element + ArrayElement>(
    len: usize,
    scalars: Vec<Scalar>,
) -> ConvertResult<UniformVector> {
    if scalars.len() != len {
        return Err(ConvertError::ArityMismatch {
            expected: len,
            found: scalars.len(),
        });
    }
    let items = scalars
        .into_iter()
        .map(T::from_scalar)
        .collect::<ConvertResult<Vec<T>>>()?;
    Ok(UniformVector::new(items))
}

fn extract<T: Element + ArrayElement>(vector: &UniformVector) -> Option<ArrayData> {
    vector.as_slice::<T>().map(|items| T::into_data(items.to_vec()))
}

fn holds<T: Element>(vector: &UniformVector) -> bool {
    vector.element_type() == T::ELEMENT_TYPE
}

/// Host `float(x)`.
fn coerce_float(scalar: Scalar) -> ConvertResult<Scalar> {
    match scalar {
        Scalar::Int(i) => Ok(Scalar::Float(i as f64)),
        Scalar::UInt(u) => Ok(Scalar::Float(u as f64)),
        Scalar::Float(_) => Ok(scalar),
        Scalar::Complex(_) => Err(ConvertError::ScalarCoercion {
            dtype: "float",
            found: scalar.kind_name(),
        }),
    }
}

/// Host `complex(x)`.
fn coerce_complex(scalar: Scalar) -> ConvertResult<Scalar> {
    Ok(match scalar {
        Scalar::Int(i) => Scalar::Complex(Complex64::new(i as f64, 0.0)),
        Scalar::UInt(u) => Scalar::Complex(Complex64::new(u as f64, 0.0)),
        Scalar::Float(x) => Scalar::Complex(Complex64::new(x, 0.0)),
        Scalar::Complex(_) => scalar,
    })
}

/// Host `int(x)`, truncating floats toward zero.
fn coerce_int(scalar: Scalar) -> ConvertResult<Scalar> {
    match scalar {
        Scalar::Int(_) | Scalar::UInt(_) => Ok(scalar),
        Scalar::Float(x) => {
            let truncated = x.trunc();
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(Scalar::Int(truncated as i64))
            } else {
                Err(ConvertError::OutOfRange {
                    value: scalar.to_string(),
                    target: "int",
                })
            }
        }
        Scalar::Complex(_) => Err(ConvertError::ScalarCoercion {
            dtype: "int",
            found: scalar.kind_name(),
        }),
    }
}

impl DTypeEntry {
    /// Entry for element type `T`, registered under `name`.
    pub fn of<T: Element + ArrayElement>(name: &'static str, coerce: Coercion) -> Self {
        Self {
            name,
            dtype: T::DTYPE,
            element: T::ELEMENT_TYPE,
            construct: construct::<T>,
            coerce,
            extract: extract::<T>,
            predicate: holds::<T>,
        }
    }
}

/// Ordered table of [`DTypeEntry`]s.
#[derive(Debug, Clone)]
pub struct DTypeRegistry {
    entries: Vec<DTypeEntry>,
    by_dtype: EnumMap<DType, Option<usize>>,
}

static STANDARD: Lazy<Arc<DTypeRegistry>> = Lazy::new(|| Arc::new(DTypeRegistry::standard()));

impl DTypeRegistry {
    pub fn builder() -> DTypeRegistryBuilder {
        DTypeRegistryBuilder::default()
    }

    /// The ten storage kinds plus `byte` as an alias of `uint8`.
    ///
    /// `int64` and `uint64` arrays stay unregistered.
    pub fn standard() -> Self {
        Self::builder()
            .register(DTypeEntry::of::<f32>("float32", coerce_float))
            .register(DTypeEntry::of::<f64>("float64", coerce_float))
            .register(DTypeEntry::of::<Complex32>("complex64", coerce_complex))
            .register(DTypeEntry::of::<Complex64>("complex128", coerce_complex))
            .register(DTypeEntry::of::<i8>("int8", coerce_int))
            .register(DTypeEntry::of::<i16>("int16", coerce_int))
            .register(DTypeEntry::of::<i32>("int32", coerce_int))
            .register(DTypeEntry::of::<u8>("uint8", coerce_int))
            .register(DTypeEntry::of::<u16>("uint16", coerce_int))
            .register(DTypeEntry::of::<u32>("uint32", coerce_int))
            .register(DTypeEntry::of::<u8>("byte", coerce_int))
            .build()
    }

    /// Shared handle on the standard registry.
    pub fn global() -> Arc<DTypeRegistry> {
        STANDARD.clone()
    }

    pub fn entries(&self) -> &[DTypeEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry registered for `dtype`.
    pub fn lookup(&self, dtype: DType) -> Option<&DTypeEntry> {
        self.by_dtype[dtype].map(|index| &self.entries[index])
    }

    pub fn lookup_name(&self, name: &str) -> Option<&DTypeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Host array holding the elements of `vector`, bit for bit.
    pub fn decode(&self, vector: &UniformVector) -> ConvertResult<NativeArray> {
        for entry in self.entries.iter().filter(|entry| (entry.predicate)(vector)) {
            if let Some(data) = (entry.extract)(vector) {
                return Ok(NativeArray::from_data(data));
            }
        }
        Err(ConvertError::UnsupportedDType(
            vector.element_type().to_string(),
        ))
    }

    /// Uniform vector holding the elements of `array`, flattened.
    pub fn encode(&self, array: &NativeArray) -> ConvertResult<UniformVector> {
        let dtype = array.dtype();
        let entry = self
            .lookup(dtype)
            .ok_or_else(|| ConvertError::UnsupportedDType(dtype.to_string()))?;
        let scalars = array
            .elements()
            .map(entry.coerce)
            .collect::<ConvertResult<Vec<_>>>()?;
        (entry.construct)(array.len(), scalars)
    }

    /// Uniform vector of `element` built from arbitrary numeric scalars.
    pub fn coerce_into(
        &self,
        element: ElementType,
        scalars: impl IntoIterator<Item = Scalar>,
    ) -> ConvertResult<UniformVector> {
        let dtype = DType::from(element);
        let entry = self
            .lookup(dtype)
            .ok_or_else(|| ConvertError::UnsupportedDType(dtype.to_string()))?;
        let coerced = scalars
            .into_iter()
            .map(entry.coerce)
            .collect::<ConvertResult<Vec<_>>>()?;
        (entry.construct)(coerced.len(), coerced)
    }
}

impl Default for DTypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Default)]
pub struct DTypeRegistryBuilder {
    entries: Vec<DTypeEntry>,
}

impl DTypeRegistryBuilder {
    pub fn register(mut self, entry: DTypeEntry) -> Self {
        debug!(
            "Registering dtype `{}` ({} storage)",
            entry.name, entry.element
        );
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> DTypeRegistry {
        let mut by_dtype: EnumMap<DType, Option<usize>> = EnumMap::default();
        for (index, entry) in self.entries.iter().enumerate() {
            by_dtype[entry.dtype].get_or_insert(index);
        }
        info!("Built dtype registry with {} entries", self.entries.len());
        DTypeRegistry {
            entries: self.entries,
            by_dtype,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_eleven_names() {
        let registry = DTypeRegistry::standard();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "float32",
                "float64",
                "complex64",
                "complex128",
                "int8",
                "int16",
                "int32",
                "uint8",
                "uint16",
                "uint32",
                "byte"
            ]
        );
        assert!(registry.lookup(DType::Int64).is_none());
        assert!(registry.lookup(DType::UInt64).is_none());
    }

    #[test]
    fn byte_aliases_uint8() {
        let registry = DTypeRegistry::standard();
        let byte = registry.lookup_name("byte").unwrap();
        assert_eq!(byte.dtype, DType::UInt8);
        assert_eq!(byte.element, ElementType::U8);
        assert_eq!(registry.lookup(DType::UInt8).unwrap().name, "uint8");
    }

    #[test]
    fn decode_picks_first_matching_entry() {
        let registry = DTypeRegistry::standard();
        let array = registry
            .decode(&UniformVector::new(vec![1u8, 2, 255]))
            .unwrap();
        assert_eq!(array.dtype(), DType::UInt8);
        assert_eq!(array.as_slice::<u8>(), Some(&[1u8, 2, 255][..]));
    }

    #[test]
    fn decode_extracts_float_and_complex_storage() {
        let registry = DTypeRegistry::standard();
        let reals = registry
            .decode(&UniformVector::new(vec![0.5f32, -1.0]))
            .unwrap();
        assert_eq!(reals.dtype(), DType::Float32);
        assert_eq!(reals.as_slice::<f32>(), Some(&[0.5f32, -1.0][..]));

        let phasors = vec![Complex64::new(1.0, -1.0), Complex64::new(0.0, 2.0)];
        let complex = registry
            .decode(&UniformVector::new(phasors.clone()))
            .unwrap();
        assert_eq!(complex.dtype(), DType::Complex128);
        assert_eq!(complex.as_slice::<Complex64>(), Some(&phasors[..]));
        assert_eq!(complex.shape(), &[2]);
    }

    #[test]
    fn encode_rejects_wide_integers() {
        let registry = DTypeRegistry::standard();
        let err = registry
            .encode(&NativeArray::from_vec(vec![1i64, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedDType(name) if name == "int64"));
    }

    #[test]
    fn restricted_registry_cannot_decode_missing_kinds() {
        let registry = DTypeRegistry::builder()
            .register(DTypeEntry::of::<f32>("float32", coerce_float))
            .build();
        let err = registry
            .decode(&UniformVector::new(vec![1i16]))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedDType(name) if name == "s16"));
    }

    #[test]
    fn coerce_into_truncates_floats_for_integer_kinds() {
        let registry = DTypeRegistry::standard();
        let vector = registry
            .coerce_into(
                ElementType::S16,
                [Scalar::Float(2.9), Scalar::Float(-2.9), Scalar::Int(7)],
            )
            .unwrap();
        assert_eq!(vector.as_slice::<i16>(), Some(&[2i16, -2, 7][..]));

        let err = registry
            .coerce_into(ElementType::F64, [Scalar::Complex(Complex64::new(0.0, 1.0))])
            .unwrap_err();
        assert!(matches!(err, ConvertError::ScalarCoercion { .. }));
    }

    #[test]
    fn constructor_checks_length() {
        let entry = DTypeRegistry::standard().lookup(DType::Float64).copied().unwrap();
        let err = (entry.construct)(3, vec![Scalar::Float(1.0)]).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::ArityMismatch {
                expected: 3,
                found: 1
            }
        ));
    }
}
