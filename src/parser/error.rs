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

//! Parser error types

use std::borrow::Cow;
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Compile-time error raised while parsing an expression or predicate.
///
/// Every variant carries the byte offset in the source text where the
/// problem was detected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A function-start token without a matching function-end token
    #[error("expecting end-of-function token but found end of string at position {position}")]
    UnterminatedFunction {
        /// Position of the unmatched function-start token
        position: usize,
    },

    /// A recognised function form used with the wrong shape
    #[error("Valid syntax: {syntax} was: {function}")]
    InvalidSyntax {
        /// The expected form, e.g. `${bodyAs(type)}`
        syntax: Cow<'static, str>,
        /// The function text that was found
        function: String,
        /// Position of the function text
        position: usize,
    },

    /// Function text that no function form recognises
    #[error("Unknown function: {function} at position {position}")]
    UnknownFunction {
        /// The function text
        function: String,
        /// Position of the function text
        position: usize,
    },

    /// Operator-shaped text that is not a known binary operator
    #[error("Unknown binary operator '{operator}' at position {position}")]
    UnknownOperator {
        /// The operator text
        operator: String,
        /// Position of the operator
        position: usize,
    },

    /// A type name the `is` operator or a conversion cannot resolve
    #[error("Unknown type '{name}' at position {position}")]
    UnknownType {
        /// The type name as written
        name: String,
        /// Position of the type name
        position: usize,
    },

    /// A regular expression literal that does not compile
    #[error("Invalid regular expression '{pattern}' at position {position}: {message}")]
    InvalidPattern {
        /// The pattern text
        pattern: String,
        /// Compiler message
        message: String,
        /// Position of the pattern
        position: usize,
    },

    /// Any other syntax error
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError {
        /// Error message describing the syntax error
        message: Cow<'static, str>,
        /// Position where the error occurred
        position: usize,
    },
}

impl ParseError {
    /// Create a generic syntax error
    pub fn syntax(message: impl Into<Cow<'static, str>>, position: usize) -> Self {
        ParseError::SyntaxError {
            message: message.into(),
            position,
        }
    }

    /// Create an invalid-syntax error for a function form
    pub fn invalid_syntax(
        syntax: impl Into<Cow<'static, str>>,
        function: impl Into<String>,
        position: usize,
    ) -> Self {
        ParseError::InvalidSyntax {
            syntax: syntax.into(),
            function: function.into(),
            position,
        }
    }

    /// Byte offset in the source where the error was detected
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnterminatedFunction { position }
            | ParseError::InvalidSyntax { position, .. }
            | ParseError::UnknownFunction { position, .. }
            | ParseError::UnknownOperator { position, .. }
            | ParseError::UnknownType { position, .. }
            | ParseError::InvalidPattern { position, .. }
            | ParseError::SyntaxError { position, .. } => *position,
        }
    }

    /// Move the position by `offset`, for errors raised on embedded text
    pub fn shifted(mut self, offset: usize) -> Self {
        match &mut self {
            ParseError::UnterminatedFunction { position }
            | ParseError::InvalidSyntax { position, .. }
            | ParseError::UnknownFunction { position, .. }
            | ParseError::UnknownOperator { position, .. }
            | ParseError::UnknownType { position, .. }
            | ParseError::InvalidPattern { position, .. }
            | ParseError::SyntaxError { position, .. } => *position += offset,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_position() {
        let err = ParseError::UnterminatedFunction { position: 6 };
        assert_eq!(err.position(), 6);
        assert!(err.to_string().contains("end-of-function"));

        let err = ParseError::invalid_syntax("${bodyAs(type)}", "bodyAs(String", 2);
        assert_eq!(
            err.to_string(),
            "Valid syntax: ${bodyAs(type)} was: bodyAs(String"
        );
        assert_eq!(err.position(), 2);
    }
}
