use thiserror::Error;

use crate::{numeric::ElementType, value::ValueTag};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("wrong type: expected {expected}, found {found}")]
    WrongType { expected: ValueTag, found: ValueTag },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("key `{0}` not found in dict")]
    KeyNotFound(String),

    #[error(
        "byte buffer of length {len} is not a multiple of the {kind} element width ({width} bytes)"
    )]
    ByteLength {
        kind: ElementType,
        len: usize,
        width: usize,
    },
}

pub type ValueResult<T> = Result<T, ValueError>;
