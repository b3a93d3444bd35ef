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

//! Compilation of the text inside `${...}` into a [`Function`]
//!
//! Function text is matched against an ordered chain of forms; the first
//! form that recognises the text wins. Layered [`FunctionResolver`]s are
//! consulted before the built-in chain so extensions can claim prefixes of
//! their own. Built-in calls with argument lists are handled by
//! [`super::call`].

use super::call::{ArgumentCompiler, LiteralArguments, compile_call};
use super::date::{compile_date, compile_date_with_timezone};
use super::error::{ParseError, ParseResult};
use super::path::{parse_access_path, unquote};
use crate::ast::{AccessPath, Function, UuidKind};
use crate::model::ValueType;
use std::fmt;
use std::sync::Arc;

/// Extension point for additional function forms
pub trait FunctionResolver: Send + Sync + fmt::Debug {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Try to compile `text`.
    ///
    /// Returns `Ok(None)` when the text is not meant for this resolver, and an
    /// error when it is but is malformed.
    fn resolve(&self, text: &str, position: usize) -> ParseResult<Option<Function>>;
}

/// Input handed to a function form builder
struct FormInput<'a> {
    function: &'a str,
    remainder: &'a str,
    position: usize,
    strict: bool,
}

impl FormInput<'_> {
    fn invalid(&self, syntax: &'static str) -> ParseError {
        ParseError::invalid_syntax(syntax, self.function, self.position)
    }

    /// The text looked like this form but is not; an error only in strict mode
    fn not_this_form(&self, syntax: &'static str) -> ParseResult<Option<Function>> {
        if self.strict {
            Err(self.invalid(syntax))
        } else {
            Ok(None)
        }
    }

    fn path(&self, text: &str) -> ParseResult<Option<AccessPath>> {
        if text.is_empty() {
            return Ok(None);
        }
        let offset = self.position + self.function.len() - text.len();
        parse_access_path(text, offset, false).map(Some)
    }
}

type FormBuilder = fn(&FormInput<'_>) -> ParseResult<Option<Function>>;

/// Prefixed forms in match order; earlier prefixes shadow later ones
const FORMS: &[(&str, FormBuilder)] = &[
    ("bodyAs(", body_as),
    ("mandatoryBodyAs(", mandatory_body_as),
    ("in.body", body_path),
    ("out.body", body_path),
    ("body", body_path),
    ("headerAs(", header_as),
    ("in.headers", header),
    ("in.header", header),
    ("headers", header),
    ("header", header),
    ("exchangeProperty", property),
    ("property", property),
    ("exception", exception_path),
    ("sys.", system_property),
    ("sysenv.", environment),
    ("sysenv:", environment),
    ("env.", environment),
    ("env:", environment),
    ("date:", date),
    ("date-with-timezone:", date_with_timezone),
    ("bean:", bean),
    ("ref:", reference),
    ("propertiesExist:", properties_exist),
    ("properties:", placeholder),
    ("variableAs(", variable_as),
    ("variable", variable),
    ("uuid(", uuid),
    ("empty(", empty),
    ("newEmpty(", empty),
];

/// Compiles function text using the built-in forms and any layered resolvers
#[derive(Debug, Clone, Default)]
pub struct FunctionCompiler {
    resolvers: Vec<Arc<dyn FunctionResolver>>,
}

impl FunctionCompiler {
    /// Create a compiler with only the built-in forms
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolver consulted before the built-in forms
    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Registered resolvers in consultation order
    pub fn resolvers(&self) -> &[Arc<dyn FunctionResolver>] {
        &self.resolvers
    }

    /// Compile function text.
    ///
    /// In strict mode unrecognised text compiles to a [`Function::Path`]
    /// resolved at evaluation time, or fails if it is not even a valid path.
    /// In lenient mode unrecognised text yields `Ok(None)`. Call arguments
    /// are taken as literal text; see [`FunctionCompiler::compile_with_arguments`].
    pub fn compile(&self, text: &str, position: usize, strict: bool) -> ParseResult<Option<Function>> {
        self.compile_with_arguments(text, position, strict, &LiteralArguments)
    }

    /// Compile function text, compiling the arguments of built-in calls
    /// such as `substring(1,2,${header.code})` with `arguments`
    pub fn compile_with_arguments(
        &self,
        text: &str,
        position: usize,
        strict: bool,
        arguments: &dyn ArgumentCompiler,
    ) -> ParseResult<Option<Function>> {
        for resolver in &self.resolvers {
            if let Some(function) = resolver.resolve(text, position)? {
                log::trace!("Function '{}' claimed by resolver {}", text, resolver.name());
                return Ok(Some(function));
            }
        }

        if let Some(function) = direct_function(text) {
            return Ok(Some(function));
        }

        if let Some(call) = compile_call(text, position, arguments)? {
            return Ok(Some(Function::Call(Box::new(call))));
        }

        for (prefix, build) in FORMS {
            let Some(remainder) = if_starts_with_return_remainder(prefix, text) else {
                continue;
            };
            let input = FormInput {
                function: text,
                remainder,
                position,
                strict,
            };
            if let Some(function) = build(&input)? {
                return Ok(Some(function));
            }
        }

        if !strict {
            return Ok(None);
        }
        parse_access_path(text, position, true)
            .map(|path| Some(Function::Path(path)))
            .map_err(|_| ParseError::UnknownFunction {
                function: text.to_string(),
                position,
            })
    }
}

/// Return what follows `prefix` in `text`, but only if something does
pub fn if_starts_with_return_remainder<'a>(prefix: &str, text: &'a str) -> Option<&'a str> {
    text.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

fn direct_function(text: &str) -> Option<Function> {
    let function = match text {
        "body" | "in.body" | "out.body" => Function::Body { path: None },
        "bodyType" => Function::BodyType,
        "id" | "messageId" | "in.messageId" => Function::MessageId,
        "exception" => Function::Exception { path: None },
        "exception.message" => Function::ExceptionMessage,
        "exception.stacktrace" => Function::ExceptionStacktrace,
        "threadName" => Function::ThreadName,
        "null" => Function::Null,
        "headers" | "in.headers" => Function::Headers,
        "headers.size" | "headers.size()" | "headers.length" | "headers.length()" => {
            Function::HeadersSize
        }
        "variables" => Function::Variables,
        "variables.size" | "variables.size()" | "variables.length" | "variables.length()" => {
            Function::VariablesSize
        }
        "uuid" => Function::Uuid(UuidKind::Default),
        _ => return None,
    };
    Some(function)
}

fn starts_path(text: &str) -> bool {
    text.starts_with(['.', '?', '['])
}

fn body_as(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    convert_body(input, false)
}

fn mandatory_body_as(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    convert_body(input, true)
}

fn convert_body(input: &FormInput<'_>, mandatory: bool) -> ParseResult<Option<Function>> {
    let syntax = if mandatory {
        "${mandatoryBodyAs(type)}"
    } else {
        "${bodyAs(type)}"
    };
    let (type_part, rest) = input
        .remainder
        .split_once(')')
        .ok_or_else(|| input.invalid(syntax))?;
    let type_name = strip_quotes(type_part.trim());
    if type_name.is_empty() || (!rest.is_empty() && !starts_path(rest)) {
        return Err(input.invalid(syntax));
    }
    Ok(Some(Function::BodyAs {
        type_name: type_name.to_string(),
        mandatory,
        path: input.path(rest)?,
    }))
}

fn body_path(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    if !starts_path(input.remainder) {
        return input.not_this_form("${body.OGNL}");
    }
    Ok(Some(Function::Body {
        path: input.path(input.remainder)?,
    }))
}

fn header_as(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    const SYNTAX: &str = "${headerAs(key, type)}";
    let (arguments, rest) = input
        .remainder
        .split_once(')')
        .ok_or_else(|| input.invalid(SYNTAX))?;
    let (key, type_name) = arguments
        .split_once(',')
        .ok_or_else(|| input.invalid(SYNTAX))?;
    let key = strip_quotes(key.trim());
    let type_name = strip_quotes(type_name.trim());
    if key.is_empty() || type_name.is_empty() || !rest.is_empty() {
        return Err(input.invalid(SYNTAX));
    }
    Ok(Some(Function::HeaderAs {
        name: key.to_string(),
        type_name: type_name.to_string(),
    }))
}

/// Split `.name`, `:name`, `?name` or `[name]` into a key and trailing path
fn split_key<'a>(input: &FormInput<'a>) -> Option<(&'a str, &'a str)> {
    let mut rest = input.remainder;
    if let Some(stripped) = rest.strip_prefix('?') {
        rest = stripped;
    }
    if let Some(bracketed) = rest.strip_prefix('[') {
        let close = bracketed.find(']')?;
        return Some((&bracketed[..close], &bracketed[close + 1..]));
    }
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(':'))
        .or_else(|| (rest.len() < input.remainder.len()).then_some(rest))?;
    if let Some(bracketed) = rest.strip_prefix('[') {
        let close = bracketed.find(']')?;
        return Some((&bracketed[..close], &bracketed[close + 1..]));
    }
    let end = rest.find(['.', '[', '?']).unwrap_or(rest.len());
    Some((&rest[..end], &rest[end..]))
}

fn header(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    let Some((key, rest)) = split_key(input) else {
        return input.not_this_form("${header.name}");
    };
    let name = strip_quotes(key.trim());
    if name.is_empty() {
        return Err(input.invalid("${header.name}"));
    }
    Ok(Some(Function::Header {
        name: name.to_string(),
        path: input.path(rest)?,
    }))
}

fn property(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    let Some((key, rest)) = split_key(input) else {
        return input.not_this_form("${exchangeProperty.name}");
    };
    let name = strip_quotes(key.trim());
    if name.is_empty() {
        return Err(input.invalid("${exchangeProperty.name}"));
    }
    Ok(Some(Function::Property {
        name: name.to_string(),
        path: input.path(rest)?,
    }))
}

fn exception_path(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    if !starts_path(input.remainder) {
        return input.not_this_form("${exception.OGNL}");
    }
    Ok(Some(Function::Exception {
        path: input.path(input.remainder)?,
    }))
}

fn system_property(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    Ok(Some(Function::SystemProperty(input.remainder.trim().to_string())))
}

fn environment(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    Ok(Some(Function::Environment(input.remainder.trim().to_string())))
}

fn date(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    compile_date(input.function, input.remainder, input.position).map(|d| Some(Function::Date(d)))
}

fn date_with_timezone(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    compile_date_with_timezone(input.function, input.remainder, input.position)
        .map(|d| Some(Function::Date(d)))
}

fn reference(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    Ok(Some(Function::Ref(input.remainder.trim().to_string())))
}

fn bean(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    let remainder = input.remainder.trim();
    let (name, method) = if let Some((name, method)) = remainder.split_once("::") {
        (name, Some(method))
    } else if let Some((name, query)) = remainder.split_once('?') {
        let method = query
            .strip_prefix("method=")
            .ok_or_else(|| input.invalid("${bean:name?method=name}"))?;
        (name, Some(method))
    } else if let Some((name, method)) = remainder.split_once('.') {
        (name, Some(method))
    } else {
        (remainder, None)
    };
    if name.is_empty() || method.is_some_and(str::is_empty) {
        return Err(input.invalid("${bean:name.method}"));
    }
    Ok(Some(Function::Bean {
        name: name.to_string(),
        method: method.map(str::to_string),
    }))
}

fn placeholder(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    let (locations, key) = match input.remainder.split_once(':') {
        Some((locations, key)) => (
            locations
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            key,
        ),
        None => (Vec::new(), input.remainder),
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(input.invalid("${properties:locations:key}"));
    }
    Ok(Some(Function::Placeholder {
        key: key.to_string(),
        locations,
    }))
}

fn properties_exist(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    let key = input.remainder.trim();
    let (key, negate) = match key.strip_prefix('!') {
        Some(key) => (key.trim(), true),
        None => (key, false),
    };
    if key.is_empty() {
        return Err(input.invalid("${propertiesExist:key}"));
    }
    Ok(Some(Function::PropertiesExist {
        key: key.to_string(),
        negate,
    }))
}

fn variable_as(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    const SYNTAX: &str = "${variableAs(key, type)}";
    let (arguments, rest) = input
        .remainder
        .split_once(')')
        .ok_or_else(|| input.invalid(SYNTAX))?;
    let (key, type_name) = arguments
        .split_once(',')
        .ok_or_else(|| input.invalid(SYNTAX))?;
    let key = strip_quotes(key.trim());
    let type_name = strip_quotes(type_name.trim());
    if key.is_empty() || type_name.is_empty() || !rest.is_empty() {
        return Err(input.invalid(SYNTAX));
    }
    Ok(Some(Function::VariableAs {
        name: key.to_string(),
        type_name: type_name.to_string(),
    }))
}

fn variable(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    let Some((key, rest)) = split_key(input) else {
        return input.not_this_form("${variable.name}");
    };
    let name = strip_quotes(key.trim());
    if name.is_empty() {
        return Err(input.invalid("${variable.name}"));
    }
    Ok(Some(Function::Variable {
        name: name.to_string(),
        path: input.path(rest)?,
    }))
}

fn uuid(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    const SYNTAX: &str = "${uuid(default|short|simple)}";
    let kind = input
        .remainder
        .strip_suffix(')')
        .and_then(|name| UuidKind::from_name(strip_quotes(name.trim())))
        .ok_or_else(|| input.invalid(SYNTAX))?;
    Ok(Some(Function::Uuid(kind)))
}

fn empty(input: &FormInput<'_>) -> ParseResult<Option<Function>> {
    const SYNTAX: &str = "${empty(map|list|string)}";
    let name = input
        .remainder
        .strip_suffix(')')
        .map(|name| strip_quotes(name.trim()).to_ascii_lowercase())
        .ok_or_else(|| input.invalid(SYNTAX))?;
    let ty = match name.as_str() {
        "map" => ValueType::Object,
        "list" => ValueType::List,
        "string" => ValueType::String,
        _ => return Err(input.invalid(SYNTAX)),
    };
    Ok(Some(Function::Empty(ty)))
}

fn strip_quotes(text: &str) -> &str {
    unquote(text).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DateCommand, PathSegment};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn compile(text: &str) -> ParseResult<Option<Function>> {
        FunctionCompiler::new().compile(text, 0, true)
    }

    fn header_named(name: &str) -> Function {
        Function::Header {
            name: name.to_string(),
            path: None,
        }
    }

    #[test]
    fn test_remainder_must_be_non_empty() {
        assert_eq!(if_starts_with_return_remainder("header.", "header.foo"), Some("foo"));
        assert_eq!(if_starts_with_return_remainder("header.", "header."), None);
        assert_eq!(if_starts_with_return_remainder("header.", "body"), None);
    }

    #[test]
    fn test_direct_names() {
        assert_eq!(compile("body").unwrap(), Some(Function::Body { path: None }));
        assert_eq!(compile("in.body").unwrap(), Some(Function::Body { path: None }));
        assert_eq!(compile("id").unwrap(), Some(Function::MessageId));
        assert_eq!(compile("exception.message").unwrap(), Some(Function::ExceptionMessage));
        assert_eq!(compile("headers.size").unwrap(), Some(Function::HeadersSize));
    }

    #[test]
    fn test_header_spellings() {
        for text in [
            "header.foo",
            "headers.foo",
            "in.header.foo",
            "in.headers.foo",
            "header:foo",
            "header[foo]",
            "header['foo']",
            "header?foo",
        ] {
            assert_eq!(compile(text).unwrap(), Some(header_named("foo")), "{text}");
        }
    }

    #[test]
    fn test_header_with_path() {
        let Some(Function::Header { name, path }) = compile("header.wicket[cool]").unwrap() else {
            panic!("expected header");
        };
        assert_eq!(name, "wicket");
        assert_eq!(path.unwrap().source(), "[cool]");
    }

    #[test]
    fn test_body_forms() {
        let Some(Function::Body { path: Some(path) }) = compile("body.address?.city").unwrap()
        else {
            panic!("expected body path");
        };
        assert_eq!(path.segments().len(), 2);
        assert!(path.segments()[1].is_null_safe());

        assert_eq!(
            compile("bodyAs(String)").unwrap(),
            Some(Function::BodyAs {
                type_name: "String".to_string(),
                mandatory: false,
                path: None
            })
        );
        assert_eq!(
            compile("mandatoryBodyAs('java.lang.Integer')").unwrap(),
            Some(Function::BodyAs {
                type_name: "java.lang.Integer".to_string(),
                mandatory: true,
                path: None
            })
        );
    }

    #[test]
    fn test_malformed_call_forms() {
        let err = compile("bodyAs(String").unwrap_err();
        assert_eq!(err.to_string(), "Valid syntax: ${bodyAs(type)} was: bodyAs(String");
        assert!(compile("headerAs(foo)").is_err());
        assert!(compile("headerAs(foo, )").is_err());
        assert!(compile("bodyfoo").is_err());
    }

    #[test]
    fn test_header_as() {
        assert_eq!(
            compile("headerAs(num, Integer)").unwrap(),
            Some(Function::HeaderAs {
                name: "num".to_string(),
                type_name: "Integer".to_string()
            })
        );
    }

    #[test]
    fn test_environment_and_system() {
        for text in ["sysenv.HOME", "sysenv:HOME", "env.HOME", "env:HOME"] {
            assert_eq!(
                compile(text).unwrap(),
                Some(Function::Environment("HOME".to_string()))
            );
        }
        assert_eq!(
            compile("sys.user.name").unwrap(),
            Some(Function::SystemProperty("user.name".to_string()))
        );
    }

    #[test]
    fn test_bean_spellings() {
        let expected = Some(Function::Bean {
            name: "orders".to_string(),
            method: Some("total".to_string()),
        });
        assert_eq!(compile("bean:orders.total").unwrap(), expected);
        assert_eq!(compile("bean:orders::total").unwrap(), expected);
        assert_eq!(compile("bean:orders?method=total").unwrap(), expected);
        assert_eq!(
            compile("bean:orders").unwrap(),
            Some(Function::Bean {
                name: "orders".to_string(),
                method: None
            })
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            compile("properties:app.name").unwrap(),
            Some(Function::Placeholder {
                key: "app.name".to_string(),
                locations: vec![]
            })
        );
        assert_eq!(
            compile("properties:a.properties,b.properties:app.name").unwrap(),
            Some(Function::Placeholder {
                key: "app.name".to_string(),
                locations: vec!["a.properties".to_string(), "b.properties".to_string()]
            })
        );
    }

    #[test]
    fn test_dates() {
        let Some(Function::Date(date)) = compile("date:header.birthday:yyyyMMdd").unwrap() else {
            panic!("expected date");
        };
        assert_eq!(date.command, DateCommand::Header("birthday".to_string()));
        assert!(compile("date:yyyyMMdd").is_err());
    }

    #[test]
    fn test_fallback_path() {
        let Some(Function::Path(path)) = compile("xxx").unwrap() else {
            panic!("expected fallback path");
        };
        assert_eq!(
            path.segments(),
            &[PathSegment::Property {
                name: "xxx".to_string(),
                null_safe: false
            }]
        );
        assert!(matches!(
            compile("hello world"),
            Err(ParseError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_lenient_mode() {
        let compiler = FunctionCompiler::new();
        assert_eq!(compiler.compile("Hello World", 0, false).unwrap(), None);
        assert_eq!(compiler.compile("bodyguard", 0, false).unwrap(), None);
        assert_eq!(
            compiler.compile("header.foo", 0, false).unwrap(),
            Some(header_named("foo"))
        );
        assert!(compiler.compile("date:yyyyMMdd", 0, false).is_err());
    }

    #[test]
    fn test_variables() {
        assert_eq!(compile("variables").unwrap(), Some(Function::Variables));
        assert_eq!(compile("variables.size()").unwrap(), Some(Function::VariablesSize));
        assert_eq!(
            compile("variable.foo").unwrap(),
            Some(Function::Variable {
                name: "foo".to_string(),
                path: None
            })
        );
        let Some(Function::Variable { name, path }) = compile("variable:order.lines[0]").unwrap() else {
            panic!("expected variable");
        };
        assert_eq!(name, "order");
        assert_eq!(path.unwrap().source(), ".lines[0]");
        assert_eq!(
            compile("variableAs(num, Integer)").unwrap(),
            Some(Function::VariableAs {
                name: "num".to_string(),
                type_name: "Integer".to_string()
            })
        );
    }

    #[rstest]
    #[case("uuid", Function::Uuid(UuidKind::Default))]
    #[case("uuid(short)", Function::Uuid(UuidKind::Short))]
    #[case("uuid(random)", Function::Uuid(UuidKind::Default))]
    #[case("empty(map)", Function::Empty(ValueType::Object))]
    #[case("newEmpty(LIST)", Function::Empty(ValueType::List))]
    #[case("propertiesExist:!app.name", Function::PropertiesExist { key: "app.name".to_string(), negate: true })]
    fn test_generator_forms(#[case] text: &str, #[case] expected: Function) {
        assert_eq!(compile(text).unwrap(), Some(expected));
    }

    #[test]
    fn test_unknown_generator_names() {
        assert!(compile("uuid(mine)").is_err());
        assert!(compile("empty(set)").is_err());
        assert!(compile("propertiesExist:").is_err());
    }

    #[test]
    fn test_calls_take_literal_arguments() {
        let Some(Function::Call(call)) = compile("join(';')").unwrap() else {
            panic!("expected call");
        };
        assert_eq!(call.name(), "join");
        assert!(compile("substring(1").is_err());
    }

    #[derive(Debug)]
    struct Upper;

    impl FunctionResolver for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn resolve(&self, text: &str, _position: usize) -> ParseResult<Option<Function>> {
            Ok(text
                .strip_prefix("upper:")
                .map(|name| Function::Header {
                    name: name.to_uppercase(),
                    path: None,
                }))
        }
    }

    #[test]
    fn test_resolvers_run_first() {
        let compiler = FunctionCompiler::new().with_resolver(Arc::new(Upper));
        assert_eq!(
            compiler.compile("upper:foo", 0, true).unwrap(),
            Some(header_named("FOO"))
        );
        assert_eq!(compiler.resolvers().len(), 1);
    }
}
