//! Bidirectional conversion between [`Value`]s and [`Native`] values.
use std::sync::Arc;

use log::trace;
use once_cell::sync::Lazy;
use pmtval::Value;

use crate::{
    array::Scalar,
    config::ConverterConfig,
    error::{ConvertError, ConvertResult},
    native::{Native, NativeInt},
    registry::DTypeRegistry,
    rules::RuleTable,
};

/// A rule table, a dtype registry and the limits applied while converting.
///
/// Converters are immutable and cheap to clone; the tables are shared.
#[derive(Debug, Clone)]
pub struct Converter {
    rules: Arc<RuleTable>,
    registry: Arc<DTypeRegistry>,
    config: ConverterConfig,
}

static STANDARD_RULES: Lazy<Arc<RuleTable>> = Lazy::new(|| Arc::new(RuleTable::standard()));

static GLOBAL: Lazy<Converter> = Lazy::new(|| Converter::builder().build());

impl Converter {
    pub fn new(rules: Arc<RuleTable>, registry: Arc<DTypeRegistry>, config: ConverterConfig) -> Self {
        Self {
            rules,
            registry,
            config,
        }
    }

    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::default()
    }

    /// Standard tables with the default configuration.
    pub fn global() -> &'static Converter {
        &GLOBAL
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn registry(&self) -> &DTypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn to_native(&self, value: &Value) -> ConvertResult<Native> {
        self.decode_at(value, 0)
    }

    pub fn from_native(&self, native: &Native) -> ConvertResult<Value> {
        self.encode_at(native, 0)
    }

    /// Convert a value found `depth` levels below the root. Meant for rule
    /// implementations recursing into children.
    pub fn decode_at(&self, value: &Value, depth: usize) -> ConvertResult<Native> {
        self.check_depth(depth)?;
        for rule in self.rules.decode_rules().iter().filter(|rule| rule.matches(value)) {
            match (rule.decode)(self, value, depth) {
                Err(err) if err.is_speculative() => {
                    trace!("Decode rule `{}` declined a {}: {}", rule.name, value.tag(), err);
                }
                result => return result,
            }
        }
        Err(ConvertError::UnsupportedValueKind(value.tag()))
    }

    /// Counterpart of [`Self::decode_at`] for the native side.
    pub fn encode_at(&self, native: &Native, depth: usize) -> ConvertResult<Value> {
        self.check_depth(depth)?;
        for rule in self.rules.encode_rules().iter().filter(|rule| rule.matches(native)) {
            match (rule.encode)(self, native, depth) {
                Err(err) if err.is_speculative() => {
                    trace!("Encode rule `{}` declined a {}: {}", rule.name, native.kind(), err);
                }
                result => return result,
            }
        }
        Err(ConvertError::UnsupportedNativeType(native.kind()))
    }

    /// Encode a native sequence as a proper list of values.
    pub fn encode_list(&self, items: &[Native]) -> ConvertResult<Value> {
        let values = items
            .iter()
            .map(|item| self.encode_at(item, 1))
            .collect::<ConvertResult<Vec<_>>>()?;
        Ok(Value::list(values))
    }

    /// Encode `native` so that it has the shape of `schema`.
    ///
    /// Where the schema holds a number, the native number is cast to that
    /// kind; tuples must have the schema's arity; sequences and arrays placed
    /// where the schema has a uniform vector are coerced to its element type.
    /// Dict values are shaped after the schema entry with the same key. Every
    /// other position is encoded as by [`Self::from_native`].
    pub fn encode_as(&self, native: &Native, schema: &Value) -> ConvertResult<Value> {
        self.encode_shaped(native, schema, 0)
    }

    fn encode_shaped(&self, native: &Native, schema: &Value, depth: usize) -> ConvertResult<Value> {
        self.check_depth(depth)?;
        match (schema, native) {
            (Value::Integer(_), Native::Int(n)) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| out_of_range(n, "integer")),
            (Value::Integer(_), Native::Bool(b)) => Ok(Value::Integer(*b as i64)),
            (Value::UInt64(_), Native::Int(n)) => n
                .as_u64()
                .map(Value::UInt64)
                .ok_or_else(|| out_of_range(n, "uint64")),
            (Value::Real(_), Native::Int(n)) => Ok(Value::Real(n.as_f64())),
            (Value::Complex(_), Native::Int(n)) => Ok(Value::complex(n.as_f64(), 0.0)),
            (Value::Complex(_), Native::Float(x)) => Ok(Value::complex(*x, 0.0)),
            (Value::Tuple(fields), Native::Tuple(items) | Native::List(items)) => {
                if fields.len() != items.len() {
                    return Err(ConvertError::ArityMismatch {
                        expected: fields.len(),
                        found: items.len(),
                    });
                }
                let shaped = fields
                    .iter()
                    .zip(items)
                    .map(|(field, item)| self.encode_shaped(item, field, depth + 1))
                    .collect::<ConvertResult<Vec<_>>>()?;
                Ok(Value::tuple(shaped))
            }
            (Value::Pair(_), Native::Tuple(items) | Native::List(items)) => {
                let fields = schema.list_to_vec();
                let shaped = if fields.len() == items.len() {
                    fields
                        .iter()
                        .zip(items)
                        .map(|(field, item)| self.encode_shaped(item, field, depth + 1))
                        .collect::<ConvertResult<Vec<_>>>()?
                } else {
                    items
                        .iter()
                        .map(|item| self.encode_at(item, depth + 1))
                        .collect::<ConvertResult<Vec<_>>>()?
                };
                Ok(Value::list(shaped))
            }
            (Value::Vector(slots), Native::List(items) | Native::Tuple(items)) => {
                let mut vector = Value::vector(items.len(), Value::Null);
                for (index, item) in items.iter().enumerate() {
                    let encoded = match slots.get(index) {
                        Some(slot) => self.encode_shaped(item, slot, depth + 1)?,
                        None => self.encode_at(item, depth + 1)?,
                    };
                    vector = vector.vector_set(index, encoded)?;
                }
                Ok(vector)
            }
            (Value::Dict(fields), Native::Dict(entries)) => {
                let mut dict = Value::dict();
                for (key, item) in entries {
                    let key = self.encode_at(key, depth + 1)?;
                    let encoded = match fields.get(&key) {
                        Some(field) => self.encode_shaped(item, field, depth + 1)?,
                        None => self.encode_at(item, depth + 1)?,
                    };
                    dict = dict.dict_add(key, encoded)?;
                }
                Ok(dict)
            }
            (Value::Uniform(shape), Native::Array(array)) => {
                self.check_uniform_len(array.len())?;
                let coerced = self
                    .registry
                    .coerce_into(shape.element_type(), array.elements())?;
                Ok(Value::Uniform(coerced))
            }
            (Value::Uniform(shape), Native::List(items) | Native::Tuple(items)) => {
                self.check_uniform_len(items.len())?;
                let scalars = items
                    .iter()
                    .map(|item| {
                        Scalar::from_native(item).ok_or(ConvertError::ScalarCoercion {
                            dtype: shape.element_type().into(),
                            found: item.kind().into(),
                        })
                    })
                    .collect::<ConvertResult<Vec<_>>>()?;
                Ok(Value::Uniform(
                    self.registry.coerce_into(shape.element_type(), scalars)?,
                ))
            }
            _ => self.encode_at(native, depth),
        }
    }

    pub(crate) fn check_uniform_len(&self, len: usize) -> ConvertResult<()> {
        match self.config.max_uniform_len {
            Some(max) if len > max => Err(ConvertError::LengthLimit { len, max }),
            _ => Ok(()),
        }
    }

    fn check_depth(&self, depth: usize) -> ConvertResult<()> {
        if depth > self.config.max_depth {
            return Err(ConvertError::DepthLimit {
                max: self.config.max_depth,
            });
        }
        Ok(())
    }
}

fn out_of_range(n: &NativeInt, target: &'static str) -> ConvertError {
    ConvertError::OutOfRange {
        value: n.to_string(),
        target,
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::global().clone()
    }
}

#[derive(Debug, Default)]
pub struct ConverterBuilder {
    rules: Option<Arc<RuleTable>>,
    registry: Option<Arc<DTypeRegistry>>,
    config: ConverterConfig,
}

impl ConverterBuilder {
    pub fn rules(mut self, rules: impl Into<Arc<RuleTable>>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    pub fn registry(mut self, registry: impl Into<Arc<DTypeRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Converter {
        Converter::new(
            self.rules.unwrap_or_else(|| STANDARD_RULES.clone()),
            self.registry.unwrap_or_else(DTypeRegistry::global),
            self.config,
        )
    }
}

/// Convert `value` with the [global](Converter::global) converter.
pub fn to_native(value: &Value) -> ConvertResult<Native> {
    Converter::global().to_native(value)
}

/// Convert `native` with the [global](Converter::global) converter.
pub fn from_native(native: &Native) -> ConvertResult<Value> {
    Converter::global().from_native(native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByteStringPolicy, NativeArray};

    fn nested(depth: usize) -> Native {
        (0..depth).fold(Native::None, |inner, _| Native::List(vec![inner]))
    }

    #[test]
    fn depth_limit_is_enforced() {
        let conv = Converter::builder()
            .config(ConverterConfig {
                max_depth: 8,
                ..ConverterConfig::default()
            })
            .build();
        assert!(conv.from_native(&nested(8)).is_ok());
        assert!(matches!(
            conv.from_native(&nested(9)),
            Err(ConvertError::DepthLimit { max: 8 })
        ));
    }

    #[test]
    fn length_limit_applies_both_ways() {
        let conv = Converter::builder()
            .config(ConverterConfig {
                max_uniform_len: Some(2),
                ..ConverterConfig::default()
            })
            .build();
        let array = Native::Array(NativeArray::from_vec(vec![1.0f32, 2.0, 3.0]));
        assert!(matches!(
            conv.from_native(&array),
            Err(ConvertError::LengthLimit { len: 3, max: 2 })
        ));
        let vector = Value::uniform(vec![1u16, 2, 3]);
        assert!(matches!(
            conv.to_native(&vector),
            Err(ConvertError::LengthLimit { len: 3, max: 2 })
        ));
    }

    #[test]
    fn rejected_byte_strings_fall_through() {
        let conv = Converter::builder()
            .config(ConverterConfig {
                byte_strings: ByteStringPolicy::Reject,
                ..ConverterConfig::default()
            })
            .build();
        assert!(matches!(
            conv.from_native(&Native::Bytes(b"abc".to_vec())),
            Err(ConvertError::UnsupportedNativeType(crate::NativeKind::Bytes))
        ));
    }

    #[test]
    fn encode_list_builds_pairs() {
        let list = Converter::global()
            .encode_list(&[Native::from(1), Native::from("x")])
            .unwrap();
        assert_eq!(list, Value::list(vec![Value::integer(1), Value::symbol("x")]));
    }
}
