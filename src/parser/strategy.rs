//! Ordered parse strategies
//!
//! A source is offered to each strategy in turn; the first one that claims
//! it produces the tree. Expressions go through the legacy parser and then
//! the template scanner. Predicates try the comparison shape before falling
//! back to the template scanner.

use super::error::ParseResult;
use super::function::FunctionCompiler;
use super::legacy::LegacyStrategy;
use super::predicate::parse_predicate;
use super::registry::TokenRegistry;
use super::scanner::compile_template;
use crate::ast::Expression;
use std::fmt;

/// Everything one compilation needs, borrowed for its duration
#[derive(Debug, Clone, Copy)]
pub struct ParseEnvironment<'a> {
    /// Token snapshot used throughout the compilation
    pub registry: &'a TokenRegistry,
    /// Function forms and layered resolvers
    pub functions: &'a FunctionCompiler,
    /// Whether escape sequences are resolved in constant text
    pub allow_escape: bool,
    /// Whether unrecognised function text compiles to a run-time lookup
    /// instead of failing
    pub strict_functions: bool,
}

/// One way of turning source text into an expression tree
pub trait ParseStrategy: Send + Sync + fmt::Debug {
    /// Name used in log output
    fn name(&self) -> &'static str;

    /// Compile `source`, or return `Ok(None)` to let the next strategy try
    fn parse(&self, env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Option<Expression>>;
}

/// The template scanner; claims everything
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateStrategy;

impl ParseStrategy for TemplateStrategy {
    fn name(&self) -> &'static str {
        "template"
    }

    fn parse(&self, env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Option<Expression>> {
        compile_template(env, source).map(Some)
    }
}

/// Comparison shape first, then the template scanner
#[derive(Debug, Default, Clone, Copy)]
pub struct PredicateStrategy;

impl ParseStrategy for PredicateStrategy {
    fn name(&self) -> &'static str {
        "predicate"
    }

    fn parse(&self, env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Option<Expression>> {
        if let Some(predicate) = parse_predicate(env, source)? {
            return Ok(Some(predicate));
        }
        TemplateStrategy.parse(env, source)
    }
}

fn with_legacy(legacy_syntax: bool, modern: Box<dyn ParseStrategy>) -> Vec<Box<dyn ParseStrategy>> {
    let mut strategies: Vec<Box<dyn ParseStrategy>> = Vec::with_capacity(2);
    if legacy_syntax {
        strategies.push(Box::new(LegacyStrategy));
    }
    strategies.push(modern);
    strategies
}

/// Strategies for `compile_expression`
pub fn expression_strategies(legacy_syntax: bool) -> Vec<Box<dyn ParseStrategy>> {
    with_legacy(legacy_syntax, Box::new(TemplateStrategy))
}

/// Strategies for `compile_predicate`
pub fn predicate_strategies(legacy_syntax: bool) -> Vec<Box<dyn ParseStrategy>> {
    with_legacy(legacy_syntax, Box::new(PredicateStrategy))
}

/// Run `source` through `strategies`; text no strategy claims is a constant
pub fn compile_with(
    strategies: &[Box<dyn ParseStrategy>],
    env: &ParseEnvironment<'_>,
    source: &str,
) -> ParseResult<Expression> {
    for strategy in strategies {
        if let Some(expression) = strategy.parse(env, source)? {
            log::trace!("'{}' compiled by the {} strategy", source, strategy.name());
            return Ok(expression);
        }
    }
    Ok(Expression::text(source))
}
