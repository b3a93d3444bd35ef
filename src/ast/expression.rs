//! Expression tree nodes

use super::function::Function;
use super::operator::{BinaryOperator, LogicalOperator, UnaryOperator};
use crate::model::{SimpleValue, ValueType};
use regex::Regex;
use std::fmt;

/// A compiled Simple expression.
///
/// Trees are immutable once built and safe to share between threads;
/// the engine hands them out behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Constant(SimpleValue),
    /// Children rendered to text and joined
    Concat(Vec<Expression>),
    /// Function reference
    Function(Function),
    /// Function whose text is itself a template, e.g. `${header.${header.key}}`.
    /// The inner template is rendered and compiled as a function at evaluation.
    Dynamic(Box<Expression>),
    /// `++`/`--` applied to an operand
    Unary {
        /// The operator
        operator: UnaryOperator,
        /// The operand
        operand: Box<Expression>,
    },
    /// Binary comparison
    Comparison(Box<Comparison>),
    /// Clauses joined by `&&` or `||`, evaluated left to right
    Logical {
        /// The operator
        operator: LogicalOperator,
        /// Left clause
        left: Box<Expression>,
        /// Right clause
        right: Box<Expression>,
    },
    /// Value interpreted as a boolean
    Truthy(Box<Expression>),
    /// Value converted to a type after evaluation
    Convert {
        /// Target type
        target: ValueType,
        /// The converted expression
        expression: Box<Expression>,
    },
}

/// `left OP right`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Left-hand side, always a function reference
    pub left: Expression,
    /// The operator
    pub operator: BinaryOperator,
    /// Right-hand side
    pub right: Operand,
}

/// Right-hand side of a comparison, shaped by the operator
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A value compared against the left side
    Value(Expression),
    /// Pre-compiled pattern for `regex`
    Pattern(Pattern),
    /// Items for `in`
    Values(Vec<Expression>),
    /// Inclusive bounds for `range`
    Range {
        /// Lower bound
        from: Expression,
        /// Upper bound
        to: Expression,
    },
    /// Resolved type for `is`
    Type(ValueType),
}

/// A compiled regular expression anchored to match whole text
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` so it must match the entire input
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check whether the whole of `text` matches
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Expression {
    /// Create a string constant
    pub fn text(value: impl Into<String>) -> Self {
        Expression::Constant(SimpleValue::String(value.into()))
    }

    /// Check if this node is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self, Expression::Constant(_))
    }

    /// Check if evaluating this node yields a boolean
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            Expression::Comparison(_) | Expression::Logical { .. } | Expression::Truthy(_)
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(SimpleValue::String(s)) => write!(f, "{s}"),
            Expression::Constant(value) => write!(f, "{value}"),
            Expression::Concat(children) => {
                for child in children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Expression::Function(function) => write!(f, "${{{function}}}"),
            Expression::Dynamic(inner) => write!(f, "${{{inner}}}"),
            Expression::Unary { operator, operand } => write!(f, "{operand}{operator}"),
            Expression::Comparison(comparison) => {
                write!(f, "{} {} ", comparison.left, comparison.operator)?;
                match &comparison.right {
                    Operand::Value(value) => write!(f, "{value}"),
                    Operand::Pattern(pattern) => write!(f, "'{}'", pattern.source()),
                    Operand::Values(values) => {
                        write!(f, "'")?;
                        for (i, value) in values.iter().enumerate() {
                            if i > 0 {
                                write!(f, ",")?;
                            }
                            write!(f, "{value}")?;
                        }
                        write!(f, "'")
                    }
                    Operand::Range { from, to } => write!(f, "'{from}..{to}'"),
                    Operand::Type(ty) => write!(f, "{ty}"),
                }
            }
            Expression::Logical {
                operator,
                left,
                right,
            } => write!(f, "{left} {operator} {right}"),
            Expression::Truthy(inner) => write!(f, "{inner}"),
            Expression::Convert { expression, .. } => write!(f, "{expression}"),
        }
    }
}

/// An expression whose value is read as a boolean
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    expression: Expression,
}

impl Predicate {
    /// Wrap an expression
    pub fn new(expression: Expression) -> Self {
        Self { expression }
    }

    /// The wrapped expression
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Unwrap into the inner expression
    pub fn into_inner(self) -> Expression {
        self.expression
    }
}

impl From<Expression> for Predicate {
    fn from(expression: Expression) -> Self {
        Predicate::new(expression)
    }
}

impl From<Predicate> for Expression {
    fn from(predicate: Predicate) -> Self {
        if predicate.expression.is_boolean() {
            predicate.expression
        } else {
            Expression::Truthy(Box::new(predicate.expression))
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = Pattern::new(r"\d{3}").unwrap();
        assert!(pattern.is_match("123"));
        assert!(!pattern.is_match("1234"));
        assert!(!pattern.is_match("a123"));
        assert_eq!(pattern, Pattern::new(r"\d{3}").unwrap());
    }

    #[test]
    fn test_predicate_conversion() {
        let expression = Expression::Function(Function::Body { path: None });
        let converted: Expression = Predicate::from(expression.clone()).into();
        assert_eq!(converted, Expression::Truthy(Box::new(expression)));

        let comparison = Expression::Comparison(Box::new(Comparison {
            left: Expression::Function(Function::Body { path: None }),
            operator: BinaryOperator::Equal,
            right: Operand::Value(Expression::text("a")),
        }));
        let converted: Expression = Predicate::from(comparison.clone()).into();
        assert_eq!(converted, comparison);
    }

    #[test]
    fn test_display_round_trips_shape() {
        let expression = Expression::Concat(vec![
            Expression::text("Hello "),
            Expression::Function(Function::Body { path: None }),
        ]);
        assert_eq!(expression.to_string(), "Hello ${body}");
    }
}
