//! In-memory message used as the default evaluation context

use super::context::{Bean, EvaluationContext, ExceptionInfo, FileInfo};
use crate::model::SimpleValue;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Location name used for placeholders registered without a location
pub const DEFAULT_LOCATION: &str = "default";

/// A message with a body, headers and exchange properties.
///
/// Header lookups fall back to a case-insensitive match, so `${header.Foo}`
/// finds a header stored as `foo`.
#[derive(Clone, Default)]
pub struct Message {
    id: Option<String>,
    body: SimpleValue,
    headers: IndexMap<String, SimpleValue>,
    properties: IndexMap<String, SimpleValue>,
    variables: IndexMap<String, SimpleValue>,
    exception: Option<ExceptionInfo>,
    system_properties: HashMap<String, String>,
    placeholders: IndexMap<String, IndexMap<String, String>>,
    beans: IndexMap<String, Arc<dyn Bean>>,
    file: Option<FileInfo>,
}

impl Message {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<SimpleValue>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_system_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.system_properties.insert(name.into(), value.into());
        self
    }

    /// Register a placeholder value under a property source location
    pub fn with_placeholder(
        mut self,
        location: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.placeholders
            .entry(location.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    pub fn with_bean(mut self, name: impl Into<String>, bean: impl Bean + 'static) -> Self {
        self.beans.insert(name.into(), Arc::new(bean));
        self
    }

    pub fn with_file(mut self, file: FileInfo) -> Self {
        self.file = Some(file);
        self
    }

    /// Replace the body
    pub fn set_body(&mut self, body: impl Into<SimpleValue>) {
        self.body = body.into();
    }

    /// Set or replace a header
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<SimpleValue>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Remove a header, returning its value
    pub fn remove_header(&mut self, name: &str) -> Option<SimpleValue> {
        self.headers.shift_remove(name)
    }

    /// Set or replace an exchange property
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<SimpleValue>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Set or replace a variable
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<SimpleValue>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Borrow the body
    pub fn body_value(&self) -> &SimpleValue {
        &self.body
    }

    /// Borrow a header, matching the name case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&SimpleValue> {
        self.headers.get(name).or_else(|| {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }
}

impl EvaluationContext for Message {
    fn message_id(&self) -> Option<Cow<'_, str>> {
        self.id.as_deref().map(Cow::Borrowed)
    }

    fn body(&self) -> Cow<'_, SimpleValue> {
        Cow::Borrowed(&self.body)
    }

    fn header(&self, name: &str) -> Option<Cow<'_, SimpleValue>> {
        self.header_value(name).map(Cow::Borrowed)
    }

    fn headers(&self) -> IndexMap<String, SimpleValue> {
        self.headers.clone()
    }

    fn property(&self, name: &str) -> Option<Cow<'_, SimpleValue>> {
        self.properties.get(name).map(Cow::Borrowed)
    }

    fn variable(&self, name: &str) -> Option<Cow<'_, SimpleValue>> {
        self.variables.get(name).map(Cow::Borrowed)
    }

    fn variables(&self) -> IndexMap<String, SimpleValue> {
        self.variables.clone()
    }

    fn exception(&self) -> Option<Cow<'_, ExceptionInfo>> {
        self.exception.as_ref().map(Cow::Borrowed)
    }

    fn system_property(&self, name: &str) -> Option<String> {
        self.system_properties.get(name).cloned()
    }

    fn bean(&self, name: &str) -> Option<Arc<dyn Bean>> {
        self.beans.get(name).cloned()
    }

    fn resolve_placeholder(&self, key: &str, locations: &[String]) -> Option<String> {
        if locations.is_empty() {
            return self
                .placeholders
                .values()
                .find_map(|source| source.get(key))
                .cloned();
        }
        locations
            .iter()
            .filter_map(|location| self.placeholders.get(location.as_str()))
            .find_map(|source| source.get(key))
            .cloned()
    }

    fn file(&self) -> Option<Cow<'_, FileInfo>> {
        self.file.as_ref().map(Cow::Borrowed)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("properties", &self.properties)
            .field("variables", &self.variables)
            .field("exception", &self.exception)
            .field("beans", &self.beans.keys().collect::<Vec<_>>())
            .field("file", &self.file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let message = Message::new().with_body("hello").with_header("Foo", "abc");
        assert_eq!(message.header_value("foo"), Some(&SimpleValue::from("abc")));
        assert_eq!(message.header_value("FOO"), Some(&SimpleValue::from("abc")));
        assert_eq!(message.header_value("bar"), None);
    }

    #[test]
    fn test_placeholder_locations() {
        let message = Message::new()
            .with_placeholder(DEFAULT_LOCATION, "greeting", "hello")
            .with_placeholder("orders.properties", "greeting", "order hello")
            .with_placeholder("orders.properties", "queue", "orders");

        assert_eq!(
            message.resolve_placeholder("greeting", &[]).as_deref(),
            Some("hello")
        );
        assert_eq!(
            message
                .resolve_placeholder("greeting", &["orders.properties".to_string()])
                .as_deref(),
            Some("order hello")
        );
        assert_eq!(
            message.resolve_placeholder("queue", &["missing".to_string()]),
            None
        );
    }

    #[test]
    fn test_mutation() {
        let mut message = Message::new().with_header("a", 1);
        message.set_body("changed");
        message.set_header("b", true);
        message.set_variable("v", 2);
        assert_eq!(message.variable("v").as_deref(), Some(&SimpleValue::Integer(2)));
        assert_eq!(message.remove_header("a"), Some(SimpleValue::Integer(1)));
        assert_eq!(message.body_value(), &SimpleValue::from("changed"));
        assert_eq!(message.headers().len(), 1);
    }
}
