//! Type names understood by `bodyAs`, `headerAs` and the `is` operator

use super::value::SimpleValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types that expressions can test for or convert to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// The null type
    Null,
    /// Boolean type
    Boolean,
    /// Integer type
    Integer,
    /// Decimal type
    Decimal,
    /// Either integer or decimal
    Number,
    /// String type
    String,
    /// Date and time type
    DateTime,
    /// List type
    List,
    /// Map type
    Object,
    /// Any non-null value
    Any,
}

impl ValueType {
    /// Resolve a type name as written in an expression.
    ///
    /// Package-qualified names are accepted, so `java.lang.String` and
    /// `String` both resolve to [`ValueType::String`]. Matching ignores case.
    pub fn from_name(name: &str) -> Option<ValueType> {
        let name = name.trim();
        let simple = name.rsplit('.').next().unwrap_or(name);
        let ty = match simple.to_ascii_lowercase().as_str() {
            "string" | "charsequence" | "char" | "character" => ValueType::String,
            "int" | "integer" | "long" | "short" | "byte" | "biginteger" => ValueType::Integer,
            "double" | "float" | "decimal" | "bigdecimal" => ValueType::Decimal,
            "number" => ValueType::Number,
            "boolean" | "bool" => ValueType::Boolean,
            "date" | "datetime" | "instant" | "offsetdatetime" | "zoneddatetime" => {
                ValueType::DateTime
            }
            "list" | "collection" | "array" | "arraylist" | "iterable" => ValueType::List,
            "map" | "hashmap" | "linkedhashmap" => ValueType::Object,
            "object" => ValueType::Any,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical name of the type
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Null => "Null",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Decimal => "Decimal",
            ValueType::Number => "Number",
            ValueType::String => "String",
            ValueType::DateTime => "DateTime",
            ValueType::List => "List",
            ValueType::Object => "Map",
            ValueType::Any => "Object",
        }
    }

    /// Check if a value is an instance of this type; `null` is an instance of nothing
    pub fn matches(&self, value: &SimpleValue) -> bool {
        match (self, value) {
            (_, SimpleValue::Null) => false,
            (ValueType::Any, _) => true,
            (ValueType::Number, v) => v.is_numeric(),
            (ty, v) => *ty == v.value_type(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_names() {
        assert_eq!(ValueType::from_name("String"), Some(ValueType::String));
        assert_eq!(ValueType::from_name("java.lang.String"), Some(ValueType::String));
        assert_eq!(ValueType::from_name("java.lang.Integer"), Some(ValueType::Integer));
        assert_eq!(ValueType::from_name("int"), Some(ValueType::Integer));
        assert_eq!(ValueType::from_name("com.mycompany.DoesNotExist"), None);
    }

    #[test]
    fn test_instance_checks() {
        assert!(ValueType::String.matches(&SimpleValue::from("a")));
        assert!(!ValueType::Integer.matches(&SimpleValue::from("1")));
        assert!(ValueType::Number.matches(&SimpleValue::from(1)));
        assert!(ValueType::Any.matches(&SimpleValue::from(true)));
        assert!(!ValueType::Any.matches(&SimpleValue::Null));
    }
}
