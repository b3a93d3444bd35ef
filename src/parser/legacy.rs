//! Legacy compatibility parsing
//!
//! Older expressions were written without delimiters, e.g. `header.foo` or
//! `body`. Sources containing no function delimiters at all are offered to
//! the function compiler in lenient mode; anything it does not recognise is
//! left to the template or predicate strategy.

use super::call::is_call;
use super::error::ParseResult;
use super::strategy::{ParseEnvironment, ParseStrategy};
use super::token::TokenKind;
use super::tokenizer::next_token;
use crate::ast::Expression;

/// Try to read the whole source as an undelimited function reference
pub fn try_legacy_parse(env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Option<Expression>> {
    let mut pos = 0;
    while pos < source.len() {
        let token = next_token(
            env.registry,
            source,
            pos,
            env.allow_escape,
            &[TokenKind::FunctionStart, TokenKind::FunctionEnd],
        );
        if token.kind.is_function_delimiter() {
            return Ok(None);
        }
        pos = token.end();
    }

    let text = source.trim();
    // Calls are only recognised inside delimiters
    if text.is_empty() || is_call(text) {
        return Ok(None);
    }
    let leading = source.len() - source.trim_start().len();
    Ok(env
        .functions
        .compile(text, leading, false)?
        .map(Expression::Function))
}

/// First strategy in both the expression and predicate lists
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyStrategy;

impl ParseStrategy for LegacyStrategy {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn parse(&self, env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Option<Expression>> {
        try_legacy_parse(env, source)
    }
}
