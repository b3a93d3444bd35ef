//! Value model for Simple expressions

pub mod type_coercion;
pub mod types;
pub mod value;

pub use type_coercion::{CoercionError, CoercionResult, TypeCoercion};
pub use types::ValueType;
pub use value::SimpleValue;
