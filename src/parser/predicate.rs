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

//! Operator and predicate compilation
//!
//! Recognises sources of the shape
//!
//! ```text
//! FUNCTION[unary]? WS OPERATOR WS RHS ( WS (&& | ||) WS clause )*
//! ```
//!
//! where the left-hand side of every clause is a delimited function
//! reference. Sources that do not have this shape are left to the template
//! scanner.

use super::error::{ParseError, ParseResult};
use super::path::unquote;
use super::registry::TokenRegistry;
use super::scanner::{compile_function_text, compile_template_at, contains_function_start, find_function_end};
use super::strategy::ParseEnvironment;
use super::token::TokenKind;
use super::tokenizer::{Tokenizer, next_token};
use crate::ast::{
    BinaryOperator, Comparison, Expression, LogicalOperator, Operand, Pattern, UnaryOperator,
};
use crate::model::value::parse_number;
use crate::model::{SimpleValue, ValueType};

const OPERATOR_SYMBOLS: &[char] = &['=', '!', '<', '>', '~', '&', '|'];

enum Clause {
    Comparison(Expression),
    Bare(Expression),
}

/// Compile `source` as a predicate if it has the predicate shape.
///
/// Returns `Ok(None)` when it does not, so the caller can fall back to the
/// template scanner. Clauses are combined left to right.
pub fn parse_predicate(env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Option<Expression>> {
    let clauses = split_clauses(env.registry, source);
    let multiple = clauses.len() > 1;
    let mut result: Option<Expression> = None;

    for (start, end, operator) in clauses {
        let expression = match parse_clause(env, &source[start..end], start)? {
            Some(Clause::Comparison(expression)) => expression,
            Some(Clause::Bare(expression)) if multiple => Expression::Truthy(Box::new(expression)),
            _ => return Ok(None),
        };
        result = Some(match (result, operator) {
            (Some(left), Some(operator)) => Expression::Logical {
                operator,
                left: Box::new(left),
                right: Box::new(expression),
            },
            _ => expression,
        });
    }
    Ok(result)
}

/// Split at top-level `&&`/`||` surrounded by whitespace. Each clause is
/// returned with the logical operator that precedes it.
fn split_clauses(registry: &TokenRegistry, source: &str) -> Vec<(usize, usize, Option<LogicalOperator>)> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<TokenKind> = None;
    let mut clause_start = 0;
    let mut pending: Option<LogicalOperator> = None;
    let mut pos = 0;

    while pos < source.len() {
        let token = next_token(
            registry,
            source,
            pos,
            false,
            &[
                TokenKind::FunctionStart,
                TokenKind::FunctionEnd,
                TokenKind::SingleQuote,
                TokenKind::DoubleQuote,
                TokenKind::LogicalOperator,
            ],
        );
        match token.kind {
            TokenKind::FunctionStart => depth += 1,
            TokenKind::FunctionEnd if depth > 0 => depth -= 1,
            kind if kind.is_quote() && depth == 0 => {
                quote = match quote {
                    None => Some(kind),
                    Some(open) if open == kind => None,
                    other => other,
                };
            }
            TokenKind::LogicalOperator if depth == 0 && quote.is_none() => {
                let spaced_before = source[..pos].ends_with(char::is_whitespace);
                let spaced_after = source[token.end()..].starts_with(char::is_whitespace);
                if spaced_before && spaced_after {
                    clauses.push((clause_start, pos, pending.take()));
                    pending = LogicalOperator::from_text(token.text);
                    clause_start = token.end();
                }
            }
            _ => {}
        }
        pos = token.end();
    }
    clauses.push((clause_start, source.len(), pending));
    clauses
}

fn parse_clause(env: &ParseEnvironment<'_>, clause: &str, offset: usize) -> ParseResult<Option<Clause>> {
    let registry = env.registry;
    let text = clause.trim();
    let offset = offset + (clause.len() - clause.trim_start().len());

    let start = next_token(registry, text, 0, false, &[TokenKind::FunctionStart]);
    if !start.is(TokenKind::FunctionStart) {
        return Ok(None);
    }
    let Some((inner_end, end_length)) = find_function_end(registry, text, start.end()) else {
        return Ok(None);
    };
    let mut left = compile_function_text(env, &text[start.end()..inner_end], offset + start.end())?;

    let mut tokenizer = Tokenizer::new(registry, text, false);
    tokenizer.seek(inner_end + end_length);
    if let Some(unary) = tokenizer.peek_token(&[TokenKind::UnaryOperator]) {
        if let Some(operator) = unary
            .is(TokenKind::UnaryOperator)
            .then(|| UnaryOperator::from_text(unary.text))
            .flatten()
        {
            left = Expression::Unary {
                operator,
                operand: Box::new(left),
            };
            tokenizer.seek(unary.end());
        }
    }
    if tokenizer.is_at_end() {
        return Ok(Some(Clause::Bare(left)));
    }
    if tokenizer.skip_whitespace() == 0 {
        return Ok(None);
    }

    let operator_position = tokenizer.position();
    let rest = &text[operator_position..];
    let token = next_token(registry, text, operator_position, false, &[TokenKind::BinaryOperator]);
    let after = &text[token.end()..];
    let operator = if token.is(TokenKind::BinaryOperator)
        && (after.is_empty() || after.starts_with(char::is_whitespace))
    {
        BinaryOperator::from_text(token.text)
    } else {
        None
    };
    let Some(operator) = operator else {
        let word = rest.split(char::is_whitespace).next().unwrap_or_default();
        if word.len() > 1 && word.chars().all(|c| OPERATOR_SYMBOLS.contains(&c)) {
            return Err(ParseError::UnknownOperator {
                operator: word.to_string(),
                position: offset + operator_position,
            });
        }
        return Ok(None);
    };

    let rhs = after.trim();
    let rhs_position = offset + token.end() + (after.len() - after.trim_start().len());
    if rhs.is_empty() {
        return Err(ParseError::syntax(
            format!("Expected a value after operator '{operator}'"),
            offset + operator_position,
        ));
    }

    let right = right_operand(env, operator, rhs, rhs_position)?;
    Ok(Some(Clause::Comparison(Expression::Comparison(Box::new(
        Comparison {
            left,
            operator,
            right,
        },
    )))))
}

fn right_operand(
    env: &ParseEnvironment<'_>,
    operator: BinaryOperator,
    rhs: &str,
    position: usize,
) -> ParseResult<Operand> {
    let has_function = contains_function_start(env.registry, rhs);
    let (literal, literal_position, quoted) = match quoted_text(env.registry, rhs, position)? {
        Some(inner) => (inner, position + 1, true),
        None => (rhs, position, false),
    };

    match operator {
        BinaryOperator::Is | BinaryOperator::NotIs if !has_function => {
            ValueType::from_name(literal)
                .map(Operand::Type)
                .ok_or_else(|| ParseError::UnknownType {
                    name: literal.to_string(),
                    position: literal_position,
                })
        }
        BinaryOperator::Regex | BinaryOperator::NotRegex if !has_function => Pattern::new(literal)
            .map(Operand::Pattern)
            .map_err(|e| ParseError::InvalidPattern {
                pattern: literal.to_string(),
                message: e.to_string(),
                position: literal_position,
            }),
        BinaryOperator::In | BinaryOperator::NotIn if !has_function => Ok(Operand::Values(
            literal
                .split(',')
                .map(|item| Expression::text(item.trim()))
                .collect(),
        )),
        BinaryOperator::Range | BinaryOperator::NotRange if quoted || !has_function => {
            let Some((from, to)) = literal.split_once("..").filter(|_| quoted) else {
                return Err(ParseError::syntax(
                    format!("Range operator expects a quoted 'from..to' value but was: {rhs}"),
                    position,
                ));
            };
            let to_position = literal_position + from.len() + 2;
            Ok(Operand::Range {
                from: value_expression(env, from.trim(), literal_position)?,
                to: value_expression(env, to.trim(), to_position)?,
            })
        }
        _ => right_value(env, rhs, position).map(Operand::Value),
    }
}

/// Classify a right-hand side: null, quoted text, template, number, boolean
/// or bare text, in that order.
fn right_value(env: &ParseEnvironment<'_>, rhs: &str, position: usize) -> ParseResult<Expression> {
    let registry = env.registry;
    if covers(registry, rhs, TokenKind::NullLiteral) {
        return Ok(Expression::Constant(SimpleValue::Null));
    }
    if let Some(inner) = quoted_text(registry, rhs, position)? {
        if contains_function_start(registry, inner) {
            return compile_template_at(env, inner, position + 1);
        }
        return Ok(Expression::text(inner));
    }
    value_expression(env, rhs, position)
}

fn value_expression(env: &ParseEnvironment<'_>, text: &str, position: usize) -> ParseResult<Expression> {
    let registry = env.registry;
    if contains_function_start(registry, text) {
        return compile_template_at(env, text, position);
    }
    if let Some(number) = numeric_literal(registry, text) {
        return Ok(Expression::Constant(number));
    }
    if covers(registry, text, TokenKind::BooleanLiteral) {
        return Ok(Expression::Constant(SimpleValue::Boolean(text == "true")));
    }
    Ok(Expression::text(text))
}

/// Inner text of a single or double quoted value; an opening quote without
/// its closing twin is an error
fn quoted_text<'a>(registry: &TokenRegistry, text: &'a str, position: usize) -> ParseResult<Option<&'a str>> {
    let first = next_token(
        registry,
        text,
        0,
        false,
        &[TokenKind::SingleQuote, TokenKind::DoubleQuote],
    );
    if !first.kind.is_quote() {
        return Ok(None);
    }
    match unquote(text) {
        Some(inner) if text.ends_with(first.text) => Ok(Some(inner)),
        _ => Err(ParseError::syntax(
            format!("Quoted value has no ending quote: {text}"),
            position,
        )),
    }
}

/// Check that a single token of `kind` spans all of `text`
fn covers(registry: &TokenRegistry, text: &str, kind: TokenKind) -> bool {
    let token = next_token(registry, text, 0, false, &[kind]);
    token.is(kind) && token.length == text.len()
}

fn numeric_literal(registry: &TokenRegistry, text: &str) -> Option<SimpleValue> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    if !covers(registry, digits, TokenKind::NumericLiteral) {
        return None;
    }
    parse_number(&format!("{sign}{}", digits.replace(',', ".")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Function;
    use crate::parser::FunctionCompiler;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParseResult<Option<Expression>> {
        let registry = TokenRegistry::with_defaults();
        let functions = FunctionCompiler::new();
        let env = ParseEnvironment {
            registry: &registry,
            functions: &functions,
            allow_escape: true,
            strict_functions: true,
        };
        parse_predicate(&env, source)
    }

    fn comparison(source: &str) -> Comparison {
        match parse(source).unwrap() {
            Some(Expression::Comparison(comparison)) => *comparison,
            other => panic!("expected a comparison for {source}, got {other:?}"),
        }
    }

    fn header(name: &str) -> Expression {
        Expression::Function(Function::Header {
            name: name.to_string(),
            path: None,
        })
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            comparison("${header.foo} == 'abc'"),
            Comparison {
                left: header("foo"),
                operator: BinaryOperator::Equal,
                right: Operand::Value(Expression::text("abc")),
            }
        );
    }

    #[test]
    fn test_right_hand_side_classification() {
        assert_eq!(
            comparison("${body} == null").right,
            Operand::Value(Expression::Constant(SimpleValue::Null))
        );
        assert_eq!(
            comparison("${body} > 100").right,
            Operand::Value(Expression::Constant(SimpleValue::Integer(100)))
        );
        assert_eq!(
            comparison("${body} > -1").right,
            Operand::Value(Expression::Constant(SimpleValue::Integer(-1)))
        );
        assert_eq!(
            comparison("${body} == true").right,
            Operand::Value(Expression::Constant(SimpleValue::Boolean(true)))
        );
        assert_eq!(
            comparison("${body} == abc").right,
            Operand::Value(Expression::text("abc"))
        );
        assert_eq!(
            comparison("${body} == \"abc\"").right,
            Operand::Value(Expression::text("abc"))
        );
        assert_eq!(
            comparison("${body} == ${header.foo}").right,
            Operand::Value(header("foo"))
        );
        assert_eq!(
            comparison("${body} == 'x${header.foo}'").right,
            Operand::Value(Expression::Concat(vec![Expression::text("x"), header("foo")]))
        );
    }

    #[test]
    fn test_operator_specific_operands() {
        assert_eq!(
            comparison("${body} is 'java.lang.String'").right,
            Operand::Type(ValueType::String)
        );
        assert_eq!(
            comparison("${body} in 'a,b, c'").right,
            Operand::Values(vec![
                Expression::text("a"),
                Expression::text("b"),
                Expression::text("c")
            ])
        );
        assert_eq!(
            comparison("${body} range '100..200'").right,
            Operand::Range {
                from: Expression::Constant(SimpleValue::Integer(100)),
                to: Expression::Constant(SimpleValue::Integer(200)),
            }
        );
        assert!(matches!(
            comparison("${body} regex '\\d+'").right,
            Operand::Pattern(_)
        ));
    }

    #[test]
    fn test_not_a_predicate() {
        assert_eq!(parse("Hello ${body}").unwrap(), None);
        assert_eq!(parse("${body}").unwrap(), None);
        assert!(parse("${body} is here").is_err());
        assert_eq!(parse("${body} foo 'x'").unwrap(), None);
        assert_eq!(parse("${body}x == 1").unwrap(), None);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse("${body} === 'x'"),
            Err(ParseError::UnknownOperator { .. })
        ));
        assert!(matches!(
            parse("${body} is com.mycompany.DoesNotExist"),
            Err(ParseError::UnknownType { .. })
        ));
        assert!(parse("${body} range abc..200").is_err());
        assert!(parse("${body} range '100.200'").is_err());
        assert!(parse("${body} == 'abc").is_err());
        // a lone symbol is ordinary text
        assert_eq!(parse("${body} = ${header.foo}").unwrap(), None);
        assert!(parse("${body} == ").is_err());
        assert!(matches!(
            parse("${body} regex '['"),
            Err(ParseError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_logical_clauses_are_left_to_right() {
        let expression = parse("${header.a} == 1 && ${header.b} == 2 || ${header.c} == 3")
            .unwrap()
            .unwrap();
        let Expression::Logical {
            operator: LogicalOperator::Or,
            left,
            ..
        } = expression
        else {
            panic!("expected || at the top");
        };
        assert!(matches!(
            *left,
            Expression::Logical {
                operator: LogicalOperator::And,
                ..
            }
        ));
    }

    #[test]
    fn test_logical_operator_inside_quotes_is_text() {
        let c = comparison("${body} == 'a && b'");
        assert_eq!(c.right, Operand::Value(Expression::text("a && b")));
    }

    #[test]
    fn test_unary_left_hand_side() {
        let c = comparison("${header.bar}++ == 124");
        assert!(matches!(
            c.left,
            Expression::Unary {
                operator: UnaryOperator::Increment,
                ..
            }
        ));
    }
}
