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

//! Error types for the Simple language
//!
//! Syntax errors carry the expression text they came from; evaluation and
//! resource errors are wrapped as they are.

use crate::evaluator::EvaluationError;
use crate::parser::ParseError;
use thiserror::Error;

/// Result type alias for Simple language operations
pub type Result<T> = std::result::Result<T, SimpleError>;

/// Top-level error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimpleError {
    /// The expression does not compile
    #[error("{error} in expression: {expression}")]
    Syntax {
        /// The expression text as given
        expression: String,
        /// The underlying parse error
        #[source]
        error: ParseError,
    },

    /// Evaluation failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// An expression resource could not be loaded
    #[error("Cannot load resource '{resource}': {message}")]
    Resource {
        /// Resource reference, e.g. `resource:file:route.simple`
        resource: String,
        /// Failure description
        message: String,
    },
}

impl SimpleError {
    /// Wrap a parse error together with the expression it came from
    pub fn syntax(expression: impl Into<String>, error: ParseError) -> Self {
        SimpleError::Syntax {
            expression: expression.into(),
            error,
        }
    }

    /// Byte offset of a syntax error in the expression
    pub fn position(&self) -> Option<usize> {
        match self {
            SimpleError::Syntax { error, .. } => Some(error.position()),
            _ => None,
        }
    }

    /// Check if this is a syntax error
    pub fn is_syntax(&self) -> bool {
        matches!(self, SimpleError::Syntax { .. })
    }
}
