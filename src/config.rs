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

//! Language configuration options

use serde::{Deserialize, Serialize};

/// Configuration for a [`SimpleLanguage`](crate::SimpleLanguage) instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Maximum number of compiled expressions (and, separately, predicates)
    /// kept in the cache; 0 disables caching
    pub cache_size: usize,

    /// Whether `\n`, `\t` and `\r` in constant text are resolved
    pub allow_escape: bool,

    /// Whether sources without function markers are first tried as bare
    /// function text, so `body` compiles like `${body}`
    pub legacy_syntax: bool,

    /// Whether unrecognised function text compiles to a lookup resolved at
    /// evaluation time (rather than failing to compile)
    pub strict_functions: bool,
}

impl LanguageConfig {
    /// Create a configuration with a custom cache size
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache_size,
            ..Self::default()
        }
    }

    /// Create a configuration optimized for high throughput
    pub fn high_performance() -> Self {
        Self {
            cache_size: 10_000,
            ..Self::default()
        }
    }

    /// Create a configuration with caching disabled
    pub fn disabled_cache() -> Self {
        Self {
            cache_size: 0,
            ..Self::default()
        }
    }

    /// Create a configuration for testing
    pub fn testing() -> Self {
        Self {
            cache_size: 16,
            ..Self::default()
        }
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            cache_size: 1_000,
            allow_escape: true,
            legacy_syntax: true,
            strict_functions: true,
        }
    }
}
