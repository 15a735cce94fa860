//! Conversion between [`pmtval::Value`]s and host-native values.
//!
//! The host side is modelled by [`Native`], a closed set of capabilities
//! (none, bool, str, bytes, int, float, complex, tuple, list, dict and typed
//! numeric [`NativeArray`]s). A [`Converter`] walks an ordered [`RuleTable`]
//! to pick the conversion for each node and consults a [`DTypeRegistry`] for
//! uniform vectors.
//!
//! ```rust
//! use pmtconv::{Native, from_native, to_native};
//! use pmtval::Value;
//!
//! let native = Native::dict([(Native::from("gain"), Native::from(1.5))]);
//! let value = from_native(&native).unwrap();
//! assert_eq!(value.dict_ref(&Value::symbol("gain")), Ok(Some(&Value::real(1.5))));
//! assert_eq!(to_native(&value).unwrap(), native);
//! ```

pub mod array;
pub mod config;
pub mod converter;
pub mod error;
pub mod magic;
pub mod native;
pub mod registry;
pub mod rules;

pub use array::{ArrayData, ArrayElement, DType, NativeArray, Scalar};
pub use config::{ByteStringPolicy, ConverterConfig};
pub use converter::{Converter, ConverterBuilder, from_native, to_native};
pub use error::{ConfigError, ConfigResult, ConvertError, ConvertResult};
pub use native::{Native, NativeInt, NativeKind};
pub use registry::{DTypeEntry, DTypeRegistry, DTypeRegistryBuilder};
pub use rules::{DecodeRule, EncodeRule, RuleTable};
