//! Tokenizer for Simple expressions
//!
//! The tokenizer is driven by a [`TokenRegistry`] rather than a fixed
//! grammar, so function delimiters can be reconfigured at runtime. Callers
//! pass a filter of the token kinds they care about; anything else falls
//! through to a single-character token.

use super::registry::TokenRegistry;
use super::token::{Token, TokenKind};

const ESCAPE_MARKER: char = '\\';

/// Read the next token at `index`.
///
/// An empty `filter` accepts every kind. A token is always returned; when
/// nothing in the filter matches, the character at `index` is returned as a
/// [`TokenKind::Character`] token. `index` must lie on a character boundary
/// inside `source`; at the end of input an empty character token is returned.
pub fn next_token<'a>(
    registry: &TokenRegistry,
    source: &'a str,
    index: usize,
    allow_escape: bool,
    filter: &[TokenKind],
) -> Token<'a> {
    let Some(rest) = source.get(index..) else {
        return empty_token(source, index);
    };
    let Some(current) = rest.chars().next() else {
        return empty_token(source, index);
    };

    if accepts(filter, TokenKind::NumericLiteral) {
        let length = scan_numeric(rest);
        if length > 0 {
            return Token {
                kind: TokenKind::NumericLiteral,
                text: &rest[..length],
                index,
                length,
            };
        }
    }

    if allow_escape && accepts(filter, TokenKind::Escape) && current == ESCAPE_MARKER {
        let escaped = match rest[1..].chars().next() {
            Some('n') => Some("\n"),
            Some('t') => Some("\t"),
            Some('r') => Some("\r"),
            _ => None,
        };
        return match escaped {
            Some(text) => Token {
                kind: TokenKind::Escape,
                text,
                index,
                length: 2,
            },
            None => Token {
                kind: TokenKind::Escape,
                text: &rest[..1],
                index,
                length: 1,
            },
        };
    }

    for token_type in registry.types() {
        let kind = token_type.kind();
        if !accepts(filter, kind) {
            continue;
        }
        let text = token_type.text();
        if !rest.starts_with(text) {
            continue;
        }
        if kind == TokenKind::UnaryOperator && !unary_allowed(registry, source, index, text.len())
        {
            continue;
        }
        return Token {
            kind,
            text: &rest[..text.len()],
            index,
            length: text.len(),
        };
    }

    let length = current.len_utf8();
    Token {
        kind: TokenKind::Character,
        text: &rest[..length],
        index,
        length,
    }
}

fn accepts(filter: &[TokenKind], kind: TokenKind) -> bool {
    filter.is_empty() || filter.contains(&kind)
}

fn empty_token(source: &str, index: usize) -> Token<'_> {
    Token {
        kind: TokenKind::Character,
        text: "",
        index: index.min(source.len()),
        length: 0,
    }
}

/// Length in bytes of the numeric literal at the start of `text`, 0 if none
fn scan_numeric(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let mut separator_seen = false;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_digit() {
            pos += 1;
        } else if (b == b'.' || b == b',')
            && !separator_seen
            && pos > 0
            && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)
        {
            separator_seen = true;
            pos += 1;
        } else {
            break;
        }
    }
    pos
}

/// `++`/`--` only count as operators directly after a function end and
/// before whitespace or the end of input.
fn unary_allowed(registry: &TokenRegistry, source: &str, index: usize, length: usize) -> bool {
    let before = &source[..index];
    let after = &source[index + length..];
    let follows_function = registry
        .texts_of(TokenKind::FunctionEnd)
        .any(|end| before.ends_with(end));
    follows_function && after.chars().next().is_none_or(char::is_whitespace)
}

/// Iterator-style wrapper around [`next_token`]
#[derive(Debug)]
pub struct Tokenizer<'a> {
    registry: &'a TokenRegistry,
    source: &'a str,
    position: usize,
    allow_escape: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer positioned at the start of `source`
    pub fn new(registry: &'a TokenRegistry, source: &'a str, allow_escape: bool) -> Self {
        Self {
            registry,
            source,
            position: 0,
            allow_escape,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move to another byte offset
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.source.len());
    }

    /// Check if all input was consumed
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Return the next token accepted by `filter` and advance past it
    pub fn next_token(&mut self, filter: &[TokenKind]) -> Option<Token<'a>> {
        let token = self.peek_token(filter)?;
        self.position = token.end();
        Some(token)
    }

    /// Return the next token without advancing
    pub fn peek_token(&self, filter: &[TokenKind]) -> Option<Token<'a>> {
        if self.is_at_end() {
            return None;
        }
        Some(next_token(
            self.registry,
            self.source,
            self.position,
            self.allow_escape,
            filter,
        ))
    }

    /// Skip whitespace tokens, returning how many were skipped
    pub fn skip_whitespace(&mut self) -> usize {
        let mut skipped = 0;
        while let Some(token) = self.peek_token(&[TokenKind::Whitespace]) {
            if !token.is(TokenKind::Whitespace) {
                break;
            }
            self.position = token.end();
            skipped += 1;
        }
        skipped
    }

    /// Tokenize the remaining input with every kind enabled
    pub fn tokenize_all(&mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token(&[]) {
            tokens.push(token);
        }
        tokens
    }
}
