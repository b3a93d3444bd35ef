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

//! `file:` functions describing the file a message was read from

use crate::ast::{FileFunction, Function};
use crate::parser::{FunctionResolver, ParseError, ParseResult, if_starts_with_return_remainder};

/// Resolves `${file:name}`, `${file:onlyname.noext}`, `${file:modified}` and
/// the other `file:` attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFunctionResolver;

impl FileFunctionResolver {
    /// Create the resolver
    pub fn new() -> Self {
        Self
    }
}

impl FunctionResolver for FileFunctionResolver {
    fn name(&self) -> &str {
        "file"
    }

    fn resolve(&self, text: &str, position: usize) -> ParseResult<Option<Function>> {
        let Some(attribute) = if_starts_with_return_remainder("file:", text) else {
            return Ok(None);
        };
        FileFunction::from_name(attribute.trim())
            .map(|file| Some(Function::File(file)))
            .ok_or_else(|| ParseError::invalid_syntax("${file:name}", text, position))
    }
}
