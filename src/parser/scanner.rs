//! Template scanning: splits text into constants and embedded functions

use super::call::is_call;
use super::error::{ParseError, ParseResult};
use super::registry::TokenRegistry;
use super::strategy::ParseEnvironment;
use super::token::TokenKind;
use super::tokenizer::next_token;
use crate::ast::{Expression, UnaryOperator};

/// Compile a template such as `Hello ${header.name}!`.
///
/// Text outside functions becomes [`Expression::Constant`] nodes, with escape
/// sequences resolved when the environment allows them. A template holding a
/// single node is returned unwrapped, so `${body}` keeps the body's type.
pub fn compile_template(env: &ParseEnvironment<'_>, source: &str) -> ParseResult<Expression> {
    compile_template_at(env, source, 0)
}

/// Same as [`compile_template`] for a slice starting at `offset` in the
/// original source; error positions are reported relative to the original.
pub(crate) fn compile_template_at(
    env: &ParseEnvironment<'_>,
    source: &str,
    offset: usize,
) -> ParseResult<Expression> {
    let registry = env.registry;
    let mut children = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while pos < source.len() {
        let token = next_token(
            registry,
            source,
            pos,
            env.allow_escape,
            &[TokenKind::FunctionStart, TokenKind::Escape],
        );
        if !token.is(TokenKind::FunctionStart) {
            literal.push_str(token.text);
            pos = token.end();
            continue;
        }

        if !literal.is_empty() {
            children.push(Expression::text(std::mem::take(&mut literal)));
        }
        let inner_start = token.end();
        let (inner_end, end_length) = find_function_end(registry, source, inner_start)
            .ok_or(ParseError::UnterminatedFunction {
                position: offset + pos,
            })?;
        let mut node = compile_function_text(env, &source[inner_start..inner_end], offset + inner_start)?;
        pos = inner_end + end_length;

        if pos < source.len() {
            let unary = next_token(registry, source, pos, false, &[TokenKind::UnaryOperator]);
            if let Some(operator) = unary
                .is(TokenKind::UnaryOperator)
                .then(|| UnaryOperator::from_text(unary.text))
                .flatten()
            {
                node = Expression::Unary {
                    operator,
                    operand: Box::new(node),
                };
                pos = unary.end();
            }
        }
        children.push(node);
    }

    if !literal.is_empty() {
        children.push(Expression::text(literal));
    }
    let expression = if children.len() > 1 {
        Expression::Concat(children)
    } else {
        children.pop().unwrap_or_else(|| Expression::text(""))
    };
    Ok(expression)
}

/// Find the function-end token balancing a function start whose inner text
/// begins at `from`. Returns the end token's offset and length.
pub(crate) fn find_function_end(
    registry: &TokenRegistry,
    source: &str,
    from: usize,
) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut pos = from;
    while pos < source.len() {
        let token = next_token(
            registry,
            source,
            pos,
            false,
            &[TokenKind::FunctionStart, TokenKind::FunctionEnd],
        );
        match token.kind {
            TokenKind::FunctionStart => depth += 1,
            TokenKind::FunctionEnd => {
                depth -= 1;
                if depth == 0 {
                    return Some((pos, token.length));
                }
            }
            _ => {}
        }
        pos = token.end();
    }
    None
}

/// Check if `text` contains any function-start token
pub(crate) fn contains_function_start(registry: &TokenRegistry, text: &str) -> bool {
    let mut pos = 0;
    while pos < text.len() {
        let token = next_token(registry, text, pos, false, &[TokenKind::FunctionStart]);
        if token.is(TokenKind::FunctionStart) {
            return true;
        }
        pos = token.end();
    }
    false
}

/// Compile the text between a function's delimiters
pub(crate) fn compile_function_text(
    env: &ParseEnvironment<'_>,
    inner: &str,
    position: usize,
) -> ParseResult<Expression> {
    let trimmed = inner.trim();
    let position = position + (inner.len() - inner.trim_start().len());

    // Calls compile their own arguments, so nested functions stay static
    if contains_function_start(env.registry, trimmed) && !is_call(trimmed) {
        let template = compile_template_at(env, trimmed, position)?;
        return Ok(Expression::Dynamic(Box::new(template)));
    }

    env.functions
        .compile_with_arguments(trimmed, position, env.strict_functions, env)?
        .map(Expression::Function)
        .ok_or_else(|| ParseError::UnknownFunction {
            function: trimmed.to_string(),
            position,
        })
}
