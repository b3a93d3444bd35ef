//! Value types produced by evaluating Simple expressions

use super::types::ValueType;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A value flowing through expression evaluation.
///
/// Message bodies, headers and exchange properties are all represented with
/// this type. Structured payloads (maps and lists) are carried as
/// [`SimpleValue::Object`] and [`SimpleValue::List`] so accessor paths like
/// `${body.address.city}` or `${header.items[last]}` can navigate them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SimpleValue {
    /// Absence of a value
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Decimal value with arbitrary precision
    Decimal(Decimal),
    /// String value
    String(String),
    /// Date and time with a fixed offset
    DateTime(DateTime<FixedOffset>),
    /// Ordered list of values
    List(Vec<SimpleValue>),
    /// Ordered map of named values
    Object(IndexMap<String, SimpleValue>),
}

impl SimpleValue {
    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        SimpleValue::String(value.into())
    }

    /// Build an object value from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SimpleValue)>,
    {
        SimpleValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, SimpleValue::Null)
    }

    /// Check if this value is an integer or decimal
    pub fn is_numeric(&self) -> bool {
        matches!(self, SimpleValue::Integer(_) | SimpleValue::Decimal(_))
    }

    /// Get the concrete type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            SimpleValue::Null => ValueType::Null,
            SimpleValue::Boolean(_) => ValueType::Boolean,
            SimpleValue::Integer(_) => ValueType::Integer,
            SimpleValue::Decimal(_) => ValueType::Decimal,
            SimpleValue::String(_) => ValueType::String,
            SimpleValue::DateTime(_) => ValueType::DateTime,
            SimpleValue::List(_) => ValueType::List,
            SimpleValue::Object(_) => ValueType::Object,
        }
    }

    /// Get the type name used by `${bodyType}`
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Borrow the string content if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SimpleValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a decimal number if it has a numeric reading.
    ///
    /// Strings are parsed, so `"70"` reads as `70`. Booleans, lists and maps
    /// have no numeric reading.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            SimpleValue::Integer(i) => Some(Decimal::from(*i)),
            SimpleValue::Decimal(d) => Some(*d),
            SimpleValue::String(s) => parse_decimal(s.trim()),
            _ => None,
        }
    }

    /// Number of elements for lists and maps, characters for strings
    pub fn len(&self) -> Option<usize> {
        match self {
            SimpleValue::String(s) => Some(s.chars().count()),
            SimpleValue::List(items) => Some(items.len()),
            SimpleValue::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Whether the value counts as true when used as a predicate.
    ///
    /// `null` and empty containers are false; the strings `"true"` and
    /// `"false"` are read as booleans; any other non-empty text is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            SimpleValue::Null => false,
            SimpleValue::Boolean(b) => *b,
            SimpleValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    true
                } else if trimmed.eq_ignore_ascii_case("false") {
                    false
                } else {
                    !trimmed.is_empty()
                }
            }
            SimpleValue::List(items) => !items.is_empty(),
            SimpleValue::Object(map) => !map.is_empty(),
            _ => true,
        }
    }

    /// Render the value as text, the way it appears when spliced into a template.
    ///
    /// `null` renders as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            SimpleValue::Null => String::new(),
            SimpleValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Convert into a JSON value, used by the command line front end
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SimpleValue::Null => serde_json::Value::Null,
            SimpleValue::Boolean(b) => serde_json::Value::Bool(*b),
            SimpleValue::Integer(i) => serde_json::Value::from(*i),
            SimpleValue::Decimal(d) => serde_json::Number::from_str(&d.to_string())
                .map(serde_json::Value::Number)
                .unwrap_or_else(|_| serde_json::Value::String(d.to_string())),
            SimpleValue::String(s) => serde_json::Value::String(s.clone()),
            SimpleValue::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            SimpleValue::List(items) => {
                serde_json::Value::Array(items.iter().map(SimpleValue::to_json).collect())
            }
            SimpleValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Parse text as a number, keeping integers integral
pub(crate) fn parse_number(text: &str) -> Option<SimpleValue> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(SimpleValue::Integer(i));
    }
    parse_decimal(text).map(SimpleValue::Decimal)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl fmt::Display for SimpleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleValue::Null => write!(f, "null"),
            SimpleValue::Boolean(b) => write!(f, "{b}"),
            SimpleValue::Integer(i) => write!(f, "{i}"),
            SimpleValue::Decimal(d) => write!(f, "{d}"),
            SimpleValue::String(s) => write!(f, "{s}"),
            SimpleValue::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            SimpleValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            SimpleValue::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for SimpleValue {
    fn from(value: bool) -> Self {
        SimpleValue::Boolean(value)
    }
}

impl From<i64> for SimpleValue {
    fn from(value: i64) -> Self {
        SimpleValue::Integer(value)
    }
}

impl From<i32> for SimpleValue {
    fn from(value: i32) -> Self {
        SimpleValue::Integer(i64::from(value))
    }
}

impl From<Decimal> for SimpleValue {
    fn from(value: Decimal) -> Self {
        SimpleValue::Decimal(value)
    }
}

impl From<&str> for SimpleValue {
    fn from(value: &str) -> Self {
        SimpleValue::String(value.to_string())
    }
}

impl From<String> for SimpleValue {
    fn from(value: String) -> Self {
        SimpleValue::String(value)
    }
}

impl From<DateTime<FixedOffset>> for SimpleValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        SimpleValue::DateTime(value)
    }
}

impl From<Vec<SimpleValue>> for SimpleValue {
    fn from(value: Vec<SimpleValue>) -> Self {
        SimpleValue::List(value)
    }
}

impl From<IndexMap<String, SimpleValue>> for SimpleValue {
    fn from(value: IndexMap<String, SimpleValue>) -> Self {
        SimpleValue::Object(value)
    }
}

impl<T: Into<SimpleValue>> From<Option<T>> for SimpleValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<serde_json::Value> for SimpleValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SimpleValue::Null,
            serde_json::Value::Bool(b) => SimpleValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SimpleValue::Integer(i),
                None => parse_decimal(&n.to_string())
                    .map(SimpleValue::Decimal)
                    .unwrap_or_else(|| SimpleValue::String(n.to_string())),
            },
            serde_json::Value::String(s) => SimpleValue::String(s),
            serde_json::Value::Array(items) => {
                SimpleValue::List(items.into_iter().map(SimpleValue::from).collect())
            }
            serde_json::Value::Object(map) => SimpleValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, SimpleValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_rendering() {
        assert_eq!(SimpleValue::Null.to_text(), "");
        assert_eq!(SimpleValue::from(123).to_text(), "123");
        assert_eq!(SimpleValue::from("abc").to_text(), "abc");
        assert_eq!(
            SimpleValue::from(vec![SimpleValue::from(1), SimpleValue::from("a")]).to_text(),
            "[1, a]"
        );
        assert_eq!(
            SimpleValue::object([("a", SimpleValue::from(1))]).to_text(),
            "{a=1}"
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!SimpleValue::Null.is_truthy());
        assert!(SimpleValue::from("body").is_truthy());
        assert!(!SimpleValue::from("false").is_truthy());
        assert!(SimpleValue::from("TRUE").is_truthy());
        assert!(!SimpleValue::from("").is_truthy());
        assert!(!SimpleValue::List(vec![]).is_truthy());
        assert!(SimpleValue::from(0).is_truthy());
    }

    #[test]
    fn test_numeric_reading() {
        assert_eq!(SimpleValue::from("70").as_decimal(), Some(Decimal::from(70)));
        assert_eq!(
            SimpleValue::from("0.02").as_decimal(),
            Some(Decimal::from_str("0.02").unwrap())
        );
        assert_eq!(SimpleValue::from("abc").as_decimal(), None);
        assert_eq!(parse_number("42"), Some(SimpleValue::Integer(42)));
    }

    #[test]
    fn test_from_json() {
        let value = SimpleValue::from(json!({"name": "Tiger", "age": 13, "tags": ["a", "b"]}));
        let SimpleValue::Object(map) = &value else {
            panic!("expected object");
        };
        assert_eq!(map.get("name"), Some(&SimpleValue::from("Tiger")));
        assert_eq!(map.get("age"), Some(&SimpleValue::Integer(13)));
        assert_eq!(value.to_json(), json!({"name": "Tiger", "age": 13, "tags": ["a", "b"]}));
    }
}
