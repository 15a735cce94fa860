//! Immutable polymorphic values for message passing in dataflow engines.
//!
//! A [`Value`] is the payload of every message and stream tag exchanged between
//! blocks. It is a closed tagged union over scalars (null, booleans, interned
//! [`Symbol`]s, signed and unsigned integers, reals, complex numbers), generic
//! containers (cons [`Pair`]s, tuples, vectors, persistent [`Dict`]s) and
//! [`UniformVector`]s of a single numeric element type.
//!
//! Values never change after construction. Updates such as
//! [`Value::dict_add`] return new values sharing structure with the old ones,
//! so any value can be read from many threads without synchronization.
//!
//! ```rust
//! use pmtval::{Value, ValueTag};
//!
//! let meta = Value::dict()
//!     .dict_add(Value::symbol("freq"), Value::real(2.4e9))
//!     .unwrap();
//! let msg = Value::pair(meta, Value::uniform(vec![1.0f32, 2.0, 3.0]));
//! assert_eq!(msg.tag(), ValueTag::Pair);
//! assert_eq!(msg.cdr().unwrap().length(), Ok(3));
//! ```

pub mod dict;
pub mod error;
pub mod list;
pub mod numeric;
pub mod symbol;
pub mod value;

pub use dict::Dict;
pub use error::{ValueError, ValueResult};
pub use list::ListIter;
pub use numeric::{Complex, Complex32, Complex64, Element, ElementType, UniformVector};
pub use symbol::{Symbol, SymbolTable};
pub use value::{Pair, Value, ValueTag};
