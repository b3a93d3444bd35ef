// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Operator definitions for Simple predicates

use std::fmt;

/// Binary comparison operators
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Equality
    /// Equality (==)
    Equal,
    /// Case-insensitive equality (=~)
    EqualIgnoreCase,
    /// Inequality (!=)
    NotEqual,

    // Ordering
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,

    // Type checking
    /// Type check (is)
    Is,
    /// Negated type check (not is)
    NotIs,

    // Text and membership
    /// Text or list contains (contains)
    Contains,
    /// Negated contains (not contains)
    NotContains,
    /// Case-insensitive contains (~~)
    ContainsIgnoreCase,
    /// Full regular expression match (regex)
    Regex,
    /// Negated regular expression match (not regex)
    NotRegex,
    /// Membership in a comma separated list (in)
    In,
    /// Negated membership (not in)
    NotIn,
    /// Inclusive range check, `'from..to'` (range)
    Range,
    /// Negated range check (not range)
    NotRange,
    /// Text prefix (starts with)
    StartsWith,
    /// Text suffix (ends with)
    EndsWith,
}

/// Unary operators applied to a function result
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Numeric increment (++)
    Increment,
    /// Numeric decrement (--)
    Decrement,
}

/// Logical operators joining predicate clauses
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    /// Logical AND (&&)
    And,
    /// Logical OR (||)
    Or,
}

impl BinaryOperator {
    /// All operators, in no particular order
    pub const ALL: [BinaryOperator; 20] = [
        Self::Equal,
        Self::EqualIgnoreCase,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::Is,
        Self::NotIs,
        Self::Contains,
        Self::NotContains,
        Self::ContainsIgnoreCase,
        Self::Regex,
        Self::NotRegex,
        Self::In,
        Self::NotIn,
        Self::Range,
        Self::NotRange,
        Self::StartsWith,
        Self::EndsWith,
    ];

    /// Look up an operator by its canonical spelling
    pub fn from_text(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == text)
    }

    /// Get the string representation of this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::EqualIgnoreCase => "=~",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Is => "is",
            Self::NotIs => "not is",
            Self::Contains => "contains",
            Self::NotContains => "not contains",
            Self::ContainsIgnoreCase => "~~",
            Self::Regex => "regex",
            Self::NotRegex => "not regex",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Range => "range",
            Self::NotRange => "not range",
            Self::StartsWith => "starts with",
            Self::EndsWith => "ends with",
        }
    }

    /// Check if this operator orders its operands
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqual | Self::LessThan | Self::LessThanOrEqual
        )
    }
}

impl UnaryOperator {
    /// Look up an operator by its spelling
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "++" => Some(Self::Increment),
            "--" => Some(Self::Decrement),
            _ => None,
        }
    }

    /// Get the string representation of this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

impl LogicalOperator {
    /// Look up an operator by its spelling
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "&&" => Some(Self::And),
            "||" => Some(Self::Or),
            _ => None,
        }
    }

    /// Get the string representation of this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
