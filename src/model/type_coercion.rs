//! Type coercion and conversion utilities for Simple values

use super::types::ValueType;
use super::value::{SimpleValue, parse_number};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use thiserror::Error;

/// Result type for type coercion operations
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Errors that can occur during type coercion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// Cannot coerce between the specified types
    #[error("Cannot coerce from {from} to {to}")]
    IncompatibleTypes {
        /// Source type name
        from: String,
        /// Target type name
        to: String,
    },
    /// The value format is invalid for the target type
    #[error("Invalid format '{value}' for type {target_type}")]
    InvalidFormat {
        /// Text of the offending value
        value: String,
        /// Target type name
        target_type: String,
    },
    /// Multiple items in a list when a single value was expected
    #[error("Cannot coerce list with multiple items to single value")]
    MultipleItems,
}

/// Type coercion utility for Simple values.
///
/// `null` converts to `null` for every target type.
pub struct TypeCoercion;

impl TypeCoercion {
    /// Attempt to coerce a value to the specified type
    pub fn coerce_to_type(value: &SimpleValue, target: ValueType) -> CoercionResult<SimpleValue> {
        if value.is_null() {
            return Ok(SimpleValue::Null);
        }
        match target {
            ValueType::Boolean => Self::coerce_to_boolean(value),
            ValueType::Integer => Self::coerce_to_integer(value),
            ValueType::Decimal => Self::coerce_to_decimal(value),
            ValueType::Number => Self::coerce_to_number(value),
            ValueType::String => Self::coerce_to_string(value),
            ValueType::DateTime => Self::coerce_to_datetime(value),
            ValueType::List => Ok(Self::coerce_to_list(value)),
            ValueType::Object => Self::coerce_to_object(value),
            ValueType::Any => Ok(value.clone()),
            ValueType::Null => Err(Self::incompatible(value, target)),
        }
    }

    /// Coerce to boolean
    pub fn coerce_to_boolean(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        match value {
            SimpleValue::Boolean(_) => Ok(value.clone()),
            SimpleValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(SimpleValue::Boolean(true)),
                "false" => Ok(SimpleValue::Boolean(false)),
                _ => Err(Self::invalid(s, ValueType::Boolean)),
            },
            SimpleValue::Integer(i) => match i {
                0 => Ok(SimpleValue::Boolean(false)),
                1 => Ok(SimpleValue::Boolean(true)),
                _ => Err(Self::invalid(&i.to_string(), ValueType::Boolean)),
            },
            SimpleValue::List(items) => Self::single_item(items, Self::coerce_to_boolean),
            _ => Err(Self::incompatible(value, ValueType::Boolean)),
        }
    }

    /// Coerce to integer
    pub fn coerce_to_integer(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        match value {
            SimpleValue::Integer(_) => Ok(value.clone()),
            SimpleValue::Decimal(d) => {
                if d.fract().is_zero() {
                    d.to_i64()
                        .map(SimpleValue::Integer)
                        .ok_or_else(|| Self::invalid(&d.to_string(), ValueType::Integer))
                } else {
                    Err(Self::invalid(&d.to_string(), ValueType::Integer))
                }
            }
            SimpleValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(SimpleValue::Integer)
                .map_err(|_| Self::invalid(s, ValueType::Integer)),
            SimpleValue::Boolean(b) => Ok(SimpleValue::Integer(i64::from(*b))),
            SimpleValue::DateTime(dt) => Ok(SimpleValue::Integer(dt.timestamp_millis())),
            SimpleValue::List(items) => Self::single_item(items, Self::coerce_to_integer),
            _ => Err(Self::incompatible(value, ValueType::Integer)),
        }
    }

    /// Coerce to decimal
    pub fn coerce_to_decimal(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        match value {
            SimpleValue::Decimal(_) => Ok(value.clone()),
            SimpleValue::Integer(i) => Ok(SimpleValue::Decimal(Decimal::from(*i))),
            SimpleValue::String(s) => value
                .as_decimal()
                .map(SimpleValue::Decimal)
                .ok_or_else(|| Self::invalid(s, ValueType::Decimal)),
            SimpleValue::Boolean(b) => Ok(SimpleValue::Decimal(Decimal::from(i64::from(*b)))),
            SimpleValue::List(items) => Self::single_item(items, Self::coerce_to_decimal),
            _ => Err(Self::incompatible(value, ValueType::Decimal)),
        }
    }

    /// Coerce to a number, keeping integral values as integers
    pub fn coerce_to_number(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        match value {
            SimpleValue::Integer(_) | SimpleValue::Decimal(_) => Ok(value.clone()),
            SimpleValue::String(s) => {
                parse_number(s.trim()).ok_or_else(|| Self::invalid(s, ValueType::Number))
            }
            SimpleValue::List(items) => Self::single_item(items, Self::coerce_to_number),
            _ => Err(Self::incompatible(value, ValueType::Number)),
        }
    }

    /// Coerce to string; every non-null value has a text form
    pub fn coerce_to_string(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        Ok(SimpleValue::String(value.to_text()))
    }

    /// Coerce to a date time.
    ///
    /// Integers are read as epoch milliseconds. Strings may be RFC 3339,
    /// `yyyy-MM-dd HH:mm:ss` or `yyyy-MM-dd`, the latter two read as UTC.
    pub fn coerce_to_datetime(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        match value {
            SimpleValue::DateTime(_) => Ok(value.clone()),
            SimpleValue::Integer(millis) => Utc
                .timestamp_millis_opt(*millis)
                .single()
                .map(|dt| SimpleValue::DateTime(dt.fixed_offset()))
                .ok_or_else(|| Self::invalid(&millis.to_string(), ValueType::DateTime)),
            SimpleValue::String(s) => Self::parse_datetime(s.trim())
                .map(SimpleValue::DateTime)
                .ok_or_else(|| Self::invalid(s, ValueType::DateTime)),
            SimpleValue::List(items) => Self::single_item(items, Self::coerce_to_datetime),
            _ => Err(Self::incompatible(value, ValueType::DateTime)),
        }
    }

    /// Wrap a scalar into a single element list
    pub fn coerce_to_list(value: &SimpleValue) -> SimpleValue {
        match value {
            SimpleValue::List(_) => value.clone(),
            other => SimpleValue::List(vec![other.clone()]),
        }
    }

    /// Coerce to a map; only maps qualify
    pub fn coerce_to_object(value: &SimpleValue) -> CoercionResult<SimpleValue> {
        match value {
            SimpleValue::Object(_) => Ok(value.clone()),
            _ => Err(Self::incompatible(value, ValueType::Object)),
        }
    }

    fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt);
        }
        if let Ok(naive) = NaiveDateTime::from_str(text)
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        {
            return Some(naive.and_utc().fixed_offset());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().fixed_offset())
    }

    fn single_item(
        items: &[SimpleValue],
        convert: fn(&SimpleValue) -> CoercionResult<SimpleValue>,
    ) -> CoercionResult<SimpleValue> {
        match items {
            [] => Ok(SimpleValue::Null),
            [single] => convert(single),
            _ => Err(CoercionError::MultipleItems),
        }
    }

    fn incompatible(value: &SimpleValue, target: ValueType) -> CoercionError {
        CoercionError::IncompatibleTypes {
            from: value.type_name().to_string(),
            to: target.name().to_string(),
        }
    }

    fn invalid(value: &str, target: ValueType) -> CoercionError {
        CoercionError::InvalidFormat {
            value: value.to_string(),
            target_type: target.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_numbers() {
        let value = SimpleValue::from("123");
        assert_eq!(
            TypeCoercion::coerce_to_type(&value, ValueType::Integer).unwrap(),
            SimpleValue::Integer(123)
        );
        assert_eq!(
            TypeCoercion::coerce_to_type(&SimpleValue::from("1.5"), ValueType::Number).unwrap(),
            SimpleValue::Decimal(Decimal::from_str("1.5").unwrap())
        );
        assert!(matches!(
            TypeCoercion::coerce_to_type(&SimpleValue::from("abc"), ValueType::Integer),
            Err(CoercionError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_null_passes_through() {
        for ty in [ValueType::Integer, ValueType::String, ValueType::DateTime] {
            assert_eq!(
                TypeCoercion::coerce_to_type(&SimpleValue::Null, ty).unwrap(),
                SimpleValue::Null
            );
        }
    }

    #[test]
    fn test_datetime_parsing() {
        let value =
            TypeCoercion::coerce_to_datetime(&SimpleValue::from("1974-04-20 08:55:47")).unwrap();
        let SimpleValue::DateTime(dt) = value else {
            panic!("expected a date time");
        };
        assert_eq!(dt.format("%Y%m%d").to_string(), "19740420");

        assert!(TypeCoercion::coerce_to_datetime(&SimpleValue::from(true)).is_err());
    }

    #[test]
    fn test_list_coercion() {
        let single = SimpleValue::List(vec![SimpleValue::from("7")]);
        assert_eq!(
            TypeCoercion::coerce_to_integer(&single).unwrap(),
            SimpleValue::Integer(7)
        );
        let many = SimpleValue::List(vec![SimpleValue::from(1), SimpleValue::from(2)]);
        assert_eq!(
            TypeCoercion::coerce_to_integer(&many),
            Err(CoercionError::MultipleItems)
        );
        assert_eq!(
            TypeCoercion::coerce_to_list(&SimpleValue::from(1)),
            SimpleValue::List(vec![SimpleValue::from(1)])
        );
    }
}
