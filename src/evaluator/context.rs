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

//! Evaluation context: the message an expression is evaluated against

use super::error::EvaluationResult;
use crate::model::{CoercionResult, SimpleValue, TypeCoercion, ValueType};
use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Read access to everything an expression can refer to.
///
/// Only the body and headers are required; the remaining accessors default
/// to "absent". [`Message`](super::Message) is the ready-made implementation.
pub trait EvaluationContext {
    /// Message id, `${id}`
    fn message_id(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Message body, `${body}`
    fn body(&self) -> Cow<'_, SimpleValue>;

    /// A single header, `${header.name}`
    fn header(&self, name: &str) -> Option<Cow<'_, SimpleValue>>;

    /// All headers, `${headers}`
    fn headers(&self) -> IndexMap<String, SimpleValue>;

    /// An exchange property, `${exchangeProperty.name}`
    fn property(&self, _name: &str) -> Option<Cow<'_, SimpleValue>> {
        None
    }

    /// A variable, `${variable.name}`
    fn variable(&self, _name: &str) -> Option<Cow<'_, SimpleValue>> {
        None
    }

    /// All variables, `${variables}`
    fn variables(&self) -> IndexMap<String, SimpleValue> {
        IndexMap::new()
    }

    /// The caught exception, `${exception}`
    fn exception(&self) -> Option<Cow<'_, ExceptionInfo>> {
        None
    }

    /// A system property, `${sys.name}`
    fn system_property(&self, _name: &str) -> Option<String> {
        None
    }

    /// An environment variable, `${sysenv.name}`
    fn env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    /// A registered bean, `${bean:name}`
    fn bean(&self, _name: &str) -> Option<Arc<dyn Bean>> {
        None
    }

    /// A property placeholder, `${properties:key}`. An empty `locations`
    /// slice means the default sources.
    fn resolve_placeholder(&self, _key: &str, _locations: &[String]) -> Option<String> {
        None
    }

    /// The file being processed, `${file:name}`
    fn file(&self) -> Option<Cow<'_, FileInfo>> {
        None
    }

    /// Convert a value; used by comparisons, `bodyAs` and `headerAs`
    fn convert(&self, value: &SimpleValue, target: ValueType) -> CoercionResult<SimpleValue> {
        TypeCoercion::coerce_to_type(value, target)
    }
}

/// A named object that `${bean:...}` and `${ref:...}` can invoke
pub trait Bean: Send + Sync {
    /// Invoke the bean; `method` is `None` for `${bean:name}` and `${ref:name}`
    fn invoke(
        &self,
        method: Option<&str>,
        context: &dyn EvaluationContext,
    ) -> EvaluationResult<SimpleValue>;
}

impl<F> Bean for F
where
    F: Fn(Option<&str>, &dyn EvaluationContext) -> EvaluationResult<SimpleValue> + Send + Sync,
{
    fn invoke(
        &self,
        method: Option<&str>,
        context: &dyn EvaluationContext,
    ) -> EvaluationResult<SimpleValue> {
        self(method, context)
    }
}

/// A caught exception
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionInfo {
    /// Exception type name
    pub type_name: String,
    /// Exception message
    pub message: String,
    /// Rendered stack trace, if captured
    pub stacktrace: Option<String>,
    /// Additional fields reachable with `${exception.field}`
    pub fields: IndexMap<String, SimpleValue>,
}

impl ExceptionInfo {
    /// Create an exception with a type name and message
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stacktrace: None,
            fields: IndexMap::new(),
        }
    }

    /// Attach a stack trace
    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    /// Attach an extra field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The exception as a map, for accessor paths
    pub fn to_value(&self) -> SimpleValue {
        let mut map = IndexMap::with_capacity(self.fields.len() + 3);
        map.insert("type".to_string(), SimpleValue::from(self.type_name.as_str()));
        map.insert("message".to_string(), SimpleValue::from(self.message.as_str()));
        if let Some(stacktrace) = &self.stacktrace {
            map.insert("stacktrace".to_string(), SimpleValue::from(stacktrace.as_str()));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        SimpleValue::Object(map)
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// The file a message was read from
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    /// Name relative to the starting directory, e.g. `sub/hello.txt`
    pub name: String,
    /// Path as given
    pub path: String,
    /// Parent directory
    pub parent: Option<String>,
    /// Whether `path` is absolute
    pub absolute: bool,
    /// Absolute form of `path`
    pub absolute_path: String,
    /// File size in bytes
    pub length: u64,
    /// Last modification time
    pub modified: Option<DateTime<FixedOffset>>,
}

impl FileInfo {
    /// Describe a file by its relative name and path, without touching the
    /// file system
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = path.is_absolute();
        let absolute_path = if absolute {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Self {
            name: name.into(),
            path: path.to_string_lossy().into_owned(),
            parent: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .filter(|p| !p.is_empty()),
            absolute,
            absolute_path: absolute_path.to_string_lossy().into_owned(),
            length: 0,
            modified: None,
        }
    }

    /// Describe an existing file, reading its size and modification time
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = metadata
            .modified()
            .ok()
            .map(|time| DateTime::<Utc>::from(time).fixed_offset());
        Ok(Self {
            length: metadata.len(),
            modified,
            ..Self::new(name, path)
        })
    }

    /// Set the file size
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = length;
        self
    }

    /// Set the modification time
    pub fn with_modified(mut self, modified: DateTime<FixedOffset>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Name without any leading directories
    pub fn only_name(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.name)
    }

    /// Extension of the name, without the dot
    pub fn extension(&self) -> Option<&str> {
        let only_name = self.only_name();
        only_name
            .rfind('.')
            .filter(|i| *i > 0)
            .map(|i| &only_name[i + 1..])
    }

    /// Strip the extension from `name`
    pub fn without_extension(name: &str) -> &str {
        let start = name.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
        match name[start..].rfind('.') {
            Some(dot) if dot > 0 => &name[..start + dot],
            _ => name,
        }
    }
}
