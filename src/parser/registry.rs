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

//! Token type registry
//!
//! The registry is an ordered catalogue of [`TokenType`]s. Snapshots are
//! immutable; changing a category produces a new snapshot with a fresh
//! generation number. A process-wide snapshot lives behind a
//! [`parking_lot::RwLock`] and is swapped atomically, so a compilation that
//! took a snapshot keeps seeing consistent delimiters while another thread
//! reconfigures them.

use super::token::{TokenKind, TokenType};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

static GLOBAL_REGISTRY: Lazy<RwLock<Arc<TokenRegistry>>> =
    Lazy::new(|| RwLock::new(Arc::new(TokenRegistry::with_defaults())));

const DEFAULT_TYPES: &[(TokenKind, &str)] = &[
    (TokenKind::FunctionStart, "${"),
    (TokenKind::FunctionStart, "$simple{"),
    (TokenKind::FunctionEnd, "}"),
    (TokenKind::Whitespace, " "),
    (TokenKind::Whitespace, "\t"),
    (TokenKind::Whitespace, "\n"),
    (TokenKind::Whitespace, "\r"),
    (TokenKind::Whitespace, "\x0c"),
    (TokenKind::SingleQuote, "'"),
    (TokenKind::DoubleQuote, "\""),
    (TokenKind::BooleanLiteral, "true"),
    (TokenKind::BooleanLiteral, "false"),
    (TokenKind::NullLiteral, "null"),
    (TokenKind::BinaryOperator, "=="),
    (TokenKind::BinaryOperator, "=~"),
    (TokenKind::BinaryOperator, ">="),
    (TokenKind::BinaryOperator, "<="),
    (TokenKind::BinaryOperator, ">"),
    (TokenKind::BinaryOperator, "<"),
    (TokenKind::BinaryOperator, "!="),
    (TokenKind::BinaryOperator, "not is"),
    (TokenKind::BinaryOperator, "is"),
    (TokenKind::BinaryOperator, "not contains"),
    (TokenKind::BinaryOperator, "contains"),
    (TokenKind::BinaryOperator, "~~"),
    (TokenKind::BinaryOperator, "not regex"),
    (TokenKind::BinaryOperator, "regex"),
    (TokenKind::BinaryOperator, "not in"),
    (TokenKind::BinaryOperator, "in"),
    (TokenKind::BinaryOperator, "not range"),
    (TokenKind::BinaryOperator, "range"),
    (TokenKind::BinaryOperator, "starts with"),
    (TokenKind::BinaryOperator, "ends with"),
    (TokenKind::UnaryOperator, "++"),
    (TokenKind::UnaryOperator, "--"),
    (TokenKind::LogicalOperator, "&&"),
    (TokenKind::LogicalOperator, "||"),
];

/// Immutable, ordered catalogue of token types.
///
/// Earlier entries win when several match at the same offset, which is why
/// the defaults list `>=` before `>` and `not in` before `in`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRegistry {
    types: Vec<TokenType>,
    generation: u64,
}

impl TokenRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            types: Vec::new(),
            generation: next_generation(),
        }
    }

    /// Create a registry holding the default catalogue
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.add_default_types();
        registry
    }

    /// Append the default catalogue to this registry
    pub fn add_default_types(&mut self) {
        self.types.extend(
            DEFAULT_TYPES
                .iter()
                .map(|(kind, text)| TokenType::new(*kind, *text)),
        );
    }

    /// Return a new snapshot where every entry of `kind` is replaced by `texts`.
    ///
    /// The new entries are placed at the front of the catalogue so they take
    /// priority over everything else. Empty texts are ignored.
    pub fn replace_category<S: AsRef<str>>(&self, kind: TokenKind, texts: &[S]) -> Self {
        let mut types: Vec<TokenType> = texts
            .iter()
            .map(AsRef::as_ref)
            .filter(|text| !text.is_empty())
            .map(|text| TokenType::new(kind, text))
            .collect();
        types.extend(self.types.iter().filter(|t| t.kind() != kind).cloned());
        Self {
            types,
            generation: next_generation(),
        }
    }

    /// All token types in priority order
    pub fn types(&self) -> &[TokenType] {
        &self.types
    }

    /// Texts registered for one category, in priority order
    pub fn texts_of(&self, kind: TokenKind) -> impl Iterator<Item = &str> + '_ {
        self.types
            .iter()
            .filter(move |t| t.kind() == kind)
            .map(TokenType::text)
    }

    /// Generation number of this snapshot; every snapshot gets a distinct one
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Snapshot of the process-wide registry
pub fn current_registry() -> Arc<TokenRegistry> {
    GLOBAL_REGISTRY.read().clone()
}

/// Replace one category of the process-wide registry
pub fn replace_token_category<S: AsRef<str>>(kind: TokenKind, texts: &[S]) {
    let mut global = GLOBAL_REGISTRY.write();
    let next = global.replace_category(kind, texts);
    log::info!(
        "Replaced {} tokens with {:?} (generation {})",
        kind,
        next.texts_of(kind).collect::<Vec<_>>(),
        next.generation()
    );
    *global = Arc::new(next);
}

/// Change the tokens that open an embedded function, e.g. `["[["]`
pub fn change_function_start_token<S: AsRef<str>>(texts: &[S]) {
    replace_token_category(TokenKind::FunctionStart, texts);
}

/// Change the tokens that close an embedded function, e.g. `["]]"]`
pub fn change_function_end_token<S: AsRef<str>>(texts: &[S]) {
    replace_token_category(TokenKind::FunctionEnd, texts);
}

/// Restore the default catalogue in the process-wide registry
pub fn reset_token_registry() {
    let mut global = GLOBAL_REGISTRY.write();
    let next = TokenRegistry::with_defaults();
    log::info!("Reset token registry (generation {})", next.generation());
    *global = Arc::new(next);
}
