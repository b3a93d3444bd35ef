//! Simple expression evaluator
//!
//! Compiled expression trees are evaluated against an [`EvaluationContext`],
//! usually a [`Message`]. Evaluation never mutates the tree, so one compiled
//! expression can be evaluated from many threads at once.

#[warn(missing_docs)]
mod calls;
mod compare;
mod context;
mod date;
mod error;
mod functions;
mod message;
mod navigator;

pub use context::{Bean, EvaluationContext, ExceptionInfo, FileInfo};
pub use error::{EvaluationError, EvaluationResult};
pub use message::{DEFAULT_LOCATION, Message};

use crate::ast::{BinaryOperator, Comparison, Expression, LogicalOperator, Operand, Predicate};
use crate::model::{SimpleValue, ValueType};
use crate::parser::FunctionCompiler;
use compare::{apply_binary, apply_unary, in_range, matches_pattern, value_in};
use functions::evaluate_function;

/// Evaluate an expression to a value
pub fn evaluate(
    expression: &Expression,
    context: &dyn EvaluationContext,
) -> EvaluationResult<SimpleValue> {
    match expression {
        Expression::Constant(value) => Ok(value.clone()),
        Expression::Concat(children) => {
            let mut text = String::new();
            for child in children {
                text.push_str(&evaluate(child, context)?.to_text());
            }
            Ok(SimpleValue::String(text))
        }
        Expression::Function(function) => evaluate_function(function, context),
        Expression::Dynamic(template) => evaluate_dynamic(template, context),
        Expression::Unary { operator, operand } => {
            let value = evaluate(operand, context)?;
            apply_unary(*operator, &value)
        }
        Expression::Comparison(comparison) => {
            evaluate_comparison(comparison, context).map(SimpleValue::Boolean)
        }
        Expression::Logical {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, context)?.is_truthy();
            let result = match operator {
                LogicalOperator::And => left && evaluate(right, context)?.is_truthy(),
                LogicalOperator::Or => left || evaluate(right, context)?.is_truthy(),
            };
            Ok(SimpleValue::Boolean(result))
        }
        Expression::Truthy(inner) => Ok(SimpleValue::Boolean(evaluate(inner, context)?.is_truthy())),
        Expression::Convert { target, expression } => {
            let value = evaluate(expression, context)?;
            if *target == ValueType::Any {
                return Ok(value);
            }
            Ok(context.convert(&value, *target)?)
        }
    }
}

/// Evaluate a predicate to a boolean
pub fn matches(predicate: &Predicate, context: &dyn EvaluationContext) -> EvaluationResult<bool> {
    evaluate(predicate.expression(), context).map(|value| value.is_truthy())
}

/// Render the template inside a nested function, then compile and evaluate
/// the rendered text as a function
fn evaluate_dynamic(
    template: &Expression,
    context: &dyn EvaluationContext,
) -> EvaluationResult<SimpleValue> {
    let rendered = evaluate(template, context)?.to_text();
    let text = rendered.trim();
    log::trace!("Nested function rendered as '{text}'");

    let function = FunctionCompiler::new()
        .compile(text, 0, true)
        .map_err(|e| EvaluationError::DynamicSyntax {
            expression: text.to_string(),
            message: e.to_string(),
        })?
        .ok_or_else(|| EvaluationError::Unresolved {
            text: text.to_string(),
        })?;
    evaluate_function(&function, context)
}

fn evaluate_comparison(
    comparison: &Comparison,
    context: &dyn EvaluationContext,
) -> EvaluationResult<bool> {
    let operator = comparison.operator;
    let left = evaluate(&comparison.left, context)?;
    let positive = !matches!(
        operator,
        BinaryOperator::NotRegex | BinaryOperator::NotIn | BinaryOperator::NotRange | BinaryOperator::NotIs
    );

    match &comparison.right {
        Operand::Value(right) => {
            let right = evaluate(right, context)?;
            apply_binary(operator, &left, &right, context)
        }
        Operand::Pattern(pattern) => Ok(positive == matches_pattern(&left, pattern)),
        Operand::Values(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, context))
                .collect::<EvaluationResult<Vec<_>>>()?;
            Ok(positive == value_in(&left, &values, context))
        }
        Operand::Range { from, to } => {
            let from = evaluate(from, context)?;
            let to = evaluate(to, context)?;
            Ok(positive == in_range(&left, &from, &to, context))
        }
        Operand::Type(target) => Ok(positive == target.matches(&left)),
    }
}

impl Expression {
    /// Evaluate this expression against a context
    pub fn evaluate(&self, context: &dyn EvaluationContext) -> EvaluationResult<SimpleValue> {
        evaluate(self, context)
    }

    /// Evaluate and render the result as text; null renders as ""
    pub fn evaluate_to_text(&self, context: &dyn EvaluationContext) -> EvaluationResult<String> {
        evaluate(self, context).map(|value| value.to_text())
    }
}

impl Predicate {
    /// Evaluate this predicate against a context
    pub fn matches(&self, context: &dyn EvaluationContext) -> EvaluationResult<bool> {
        matches(self, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Function, UnaryOperator};
    use pretty_assertions::assert_eq;

    fn header(name: &str) -> Expression {
        Expression::Function(Function::Header {
            name: name.to_string(),
            path: None,
        })
    }

    #[test]
    fn test_concat_renders_text() {
        let message = Message::new().with_header("name", "Claus").with_header("age", 42);
        let expression = Expression::Concat(vec![
            Expression::text("Hello "),
            header("name"),
            Expression::text(" aged "),
            header("age"),
            header("missing"),
        ]);
        assert_eq!(
            expression.evaluate(&message).unwrap(),
            SimpleValue::from("Hello Claus aged 42")
        );
    }

    #[test]
    fn test_dynamic_function() {
        let message = Message::new()
            .with_header("key", "target")
            .with_header("target", "found it");
        let expression = Expression::Dynamic(Box::new(Expression::Concat(vec![
            Expression::text("header."),
            header("key"),
        ])));
        assert_eq!(expression.evaluate(&message).unwrap(), SimpleValue::from("found it"));

        let broken = Expression::Dynamic(Box::new(Expression::text("bodyAs(")));
        assert!(matches!(
            broken.evaluate(&message),
            Err(EvaluationError::DynamicSyntax { .. })
        ));
    }

    #[test]
    fn test_logical_short_circuit() {
        let message = Message::new().with_header("flag", false);
        // The right side would fail if evaluated
        let failing = Expression::Unary {
            operator: UnaryOperator::Increment,
            operand: Box::new(header("missing")),
        };
        let and = Expression::Logical {
            operator: LogicalOperator::And,
            left: Box::new(header("flag")),
            right: Box::new(failing.clone()),
        };
        assert_eq!(and.evaluate(&message).unwrap(), SimpleValue::Boolean(false));

        let or = Expression::Logical {
            operator: LogicalOperator::Or,
            left: Box::new(Expression::Truthy(Box::new(header("flag")))),
            right: Box::new(failing),
        };
        assert!(or.evaluate(&message).is_err());
    }

    #[test]
    fn test_static_operands() {
        let message = Message::new().with_header("code", 150);
        let comparison = |operator, right| {
            Expression::Comparison(Box::new(Comparison {
                left: header("code"),
                operator,
                right,
            }))
        };
        let range = comparison(
            BinaryOperator::NotRange,
            Operand::Range {
                from: Expression::Constant(SimpleValue::from(100)),
                to: Expression::Constant(SimpleValue::from(199)),
            },
        );
        assert_eq!(range.evaluate(&message).unwrap(), SimpleValue::Boolean(false));

        let is = comparison(BinaryOperator::Is, Operand::Type(ValueType::Integer));
        assert!(matches(&Predicate::new(is), &message).unwrap());
    }

    #[test]
    fn test_convert() {
        let message = Message::new().with_header("number", "42");
        let expression = Expression::Convert {
            target: ValueType::Integer,
            expression: Box::new(header("number")),
        };
        assert_eq!(expression.evaluate(&message).unwrap(), SimpleValue::from(42));
    }
}
