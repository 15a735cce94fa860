use pmtval::{ValueError, ValueTag};
use thiserror::Error;

use crate::native::NativeKind;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no conversion rule accepts values tagged `{0}`")]
    UnsupportedValueKind(ValueTag),

    #[error("no conversion rule accepts native values of type `{0}`")]
    UnsupportedNativeType(NativeKind),

    #[error("unsupported element dtype `{0}`")]
    UnsupportedDType(String),

    #[error("arity mismatch: expected {expected} elements, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("rule `{rule}` does not apply")]
    RuleMismatch { rule: &'static str },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("cannot coerce a {found} scalar to a {dtype} element")]
    ScalarCoercion {
        dtype: &'static str,
        found: &'static str,
    },

    #[error("uniform vector of {len} elements exceeds the configured limit of {max}")]
    LengthLimit { len: usize, max: usize },

    #[error("conversion nested deeper than {max} levels")]
    DepthLimit { max: usize },

    #[error("a native `{0}` cannot be used as a mapping key")]
    UnhashableKey(NativeKind),

    #[error("array shape {shape:?} cannot hold {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl ConvertError {
    /// Failures meaning "this rule does not apply to that input".
    ///
    /// The rule walk of [`crate::Converter`] swallows them and tries the next
    /// rule; every other error aborts the conversion.
    pub fn is_speculative(&self) -> bool {
        matches!(
            self,
            ConvertError::RuleMismatch { .. }
                | ConvertError::ArityMismatch { .. }
                | ConvertError::OutOfRange { .. }
        )
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration for '{file}': {source}")]
    SerializeError {
        source: toml::ser::Error,
        file: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
