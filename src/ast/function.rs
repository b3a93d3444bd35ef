//! Function accessors: the things `${...}` can refer to

use super::call::Call;
use super::path::AccessPath;
use crate::model::ValueType;
use chrono::FixedOffset;
use std::fmt;

/// A compiled function reference.
///
/// Each variant reads one aspect of the evaluation context; variants with a
/// `path` navigate further into the value they read.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// `${id}`: the message id
    MessageId,
    /// `${body}` or `${body.path}`
    Body {
        /// Optional accessor path
        path: Option<AccessPath>,
    },
    /// `${bodyType}`: type name of the body
    BodyType,
    /// `${bodyAs(Type)}` and `${mandatoryBodyAs(Type)}`
    BodyAs {
        /// Target type name as written; resolved at evaluation
        type_name: String,
        /// Whether a null body is an error
        mandatory: bool,
        /// Optional accessor path applied after conversion
        path: Option<AccessPath>,
    },
    /// `${header.name}` and its aliases
    Header {
        /// Header name
        name: String,
        /// Optional accessor path
        path: Option<AccessPath>,
    },
    /// `${headerAs(name, Type)}`
    HeaderAs {
        /// Header name
        name: String,
        /// Target type name as written; resolved at evaluation
        type_name: String,
    },
    /// `${headers}`: all headers as a map
    Headers,
    /// `${headers.size}`
    HeadersSize,
    /// `${exchangeProperty.name}` and `${property.name}`
    Property {
        /// Property name
        name: String,
        /// Optional accessor path
        path: Option<AccessPath>,
    },
    /// `${exception}` or `${exception.path}`
    Exception {
        /// Optional accessor path
        path: Option<AccessPath>,
    },
    /// `${exception.message}`
    ExceptionMessage,
    /// `${exception.stacktrace}`
    ExceptionStacktrace,
    /// `${sys.name}`
    SystemProperty(String),
    /// `${sysenv.name}` and `${env:name}`
    Environment(String),
    /// `${threadName}`
    ThreadName,
    /// `${null}`
    Null,
    /// `${date:...}` and `${date-with-timezone:...}`
    Date(DateFunction),
    /// `${bean:name.method}`
    Bean {
        /// Registered bean name
        name: String,
        /// Optional method name
        method: Option<String>,
    },
    /// `${ref:name}`
    Ref(String),
    /// `${properties:locations:key}`
    Placeholder {
        /// Placeholder key
        key: String,
        /// Property source locations, empty for the default sources
        locations: Vec<String>,
    },
    /// `${propertiesExist:key}`, negated with `${propertiesExist:!key}`
    PropertiesExist {
        /// Placeholder key
        key: String,
        /// Whether the result is inverted
        negate: bool,
    },
    /// `${variable.name}` and its aliases
    Variable {
        /// Variable name
        name: String,
        /// Optional accessor path
        path: Option<AccessPath>,
    },
    /// `${variableAs(name, Type)}`
    VariableAs {
        /// Variable name
        name: String,
        /// Target type name as written; resolved at evaluation
        type_name: String,
    },
    /// `${variables}`: all variables as a map
    Variables,
    /// `${variables.size}`
    VariablesSize,
    /// `${uuid}` or `${uuid(kind)}`
    Uuid(UuidKind),
    /// `${empty(map)}`, `${empty(list)}` or `${empty(string)}`
    Empty(ValueType),
    /// A built-in call with arguments, e.g. `${substring(1,2)}`
    Call(Box<Call>),
    /// `${file:...}`, provided by the file extension
    File(FileFunction),
    /// Unrecognised function text resolved against header, property, then
    /// body fields when evaluated
    Path(AccessPath),
}

/// Where a date function reads its base date from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateCommand {
    /// Current time
    Now,
    /// Last modification time of the current file
    File,
    /// A header holding a date
    Header(String),
    /// An exchange property holding a date
    Property(String),
}

impl fmt::Display for DateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateCommand::Now => write!(f, "now"),
            DateCommand::File => write!(f, "file"),
            DateCommand::Header(name) => write!(f, "header.{name}"),
            DateCommand::Property(name) => write!(f, "exchangeProperty.{name}"),
        }
    }
}

/// Compiled `date:` function
#[derive(Debug, Clone, PartialEq)]
pub struct DateFunction {
    /// Base date source
    pub command: DateCommand,
    /// Sum of `+`/`-` offsets in milliseconds
    pub offset_millis: i64,
    /// Target offset for `date-with-timezone`
    pub timezone: Option<FixedOffset>,
    /// Output pattern as written, e.g. `yyyyMMdd`
    pub pattern: Option<String>,
    /// Output pattern translated to a chrono format string
    pub format: Option<String>,
}

/// Generator used by `${uuid(kind)}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UuidKind {
    /// Random (version 4) UUID in hyphenated form; also `random` and `classic`
    #[default]
    Default,
    /// 16 hex digits
    Short,
    /// Process-wide counter: `1`, `2`, ...
    Simple,
}

impl UuidKind {
    /// Resolve the generator name inside `uuid(...)`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "" | "default" | "random" | "classic" => Some(Self::Default),
            "short" => Some(Self::Short),
            "simple" => Some(Self::Simple),
            _ => None,
        }
    }
}

impl fmt::Display for UuidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UuidKind::Default => write!(f, "default"),
            UuidKind::Short => write!(f, "short"),
            UuidKind::Simple => write!(f, "simple"),
        }
    }
}

/// Attributes of the current file exposed as `${file:...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFunction {
    /// `file:name`: name relative to the starting directory
    Name,
    /// `file:name.noext`: relative name without extension
    NameNoExt,
    /// `file:name.ext` and `file:ext`: the extension
    Extension,
    /// `file:onlyname`: name without any leading path
    OnlyName,
    /// `file:onlyname.noext`
    OnlyNameNoExt,
    /// `file:parent`
    Parent,
    /// `file:path`
    Path,
    /// `file:absolute`: whether the path is absolute
    Absolute,
    /// `file:absolute.path`
    AbsolutePath,
    /// `file:length` and `file:size`
    Length,
    /// `file:modified`
    Modified,
}

impl FileFunction {
    /// Resolve the text after `file:`
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "name" => Self::Name,
            "name.noext" => Self::NameNoExt,
            "name.ext" | "ext" => Self::Extension,
            "onlyname" => Self::OnlyName,
            "onlyname.noext" => Self::OnlyNameNoExt,
            "parent" => Self::Parent,
            "path" => Self::Path,
            "absolute" => Self::Absolute,
            "absolute.path" => Self::AbsolutePath,
            "length" | "size" => Self::Length,
            "modified" => Self::Modified,
            _ => return None,
        };
        Some(function)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::MessageId => write!(f, "id"),
            Function::Body { path: None } => write!(f, "body"),
            Function::Body { path: Some(path) } => write!(f, "body{path}"),
            Function::BodyType => write!(f, "bodyType"),
            Function::BodyAs {
                type_name,
                mandatory,
                path,
            } => {
                let name = if *mandatory { "mandatoryBodyAs" } else { "bodyAs" };
                write!(f, "{name}({type_name})")?;
                match path {
                    Some(path) => write!(f, "{path}"),
                    None => Ok(()),
                }
            }
            Function::Header { name, path } => {
                write!(f, "header.{name}")?;
                match path {
                    Some(path) => write!(f, "{path}"),
                    None => Ok(()),
                }
            }
            Function::HeaderAs { name, type_name } => write!(f, "headerAs({name}, {type_name})"),
            Function::Headers => write!(f, "headers"),
            Function::HeadersSize => write!(f, "headers.size"),
            Function::Property { name, path } => {
                write!(f, "exchangeProperty.{name}")?;
                match path {
                    Some(path) => write!(f, "{path}"),
                    None => Ok(()),
                }
            }
            Function::Exception { path: None } => write!(f, "exception"),
            Function::Exception { path: Some(path) } => write!(f, "exception{path}"),
            Function::ExceptionMessage => write!(f, "exception.message"),
            Function::ExceptionStacktrace => write!(f, "exception.stacktrace"),
            Function::SystemProperty(name) => write!(f, "sys.{name}"),
            Function::Environment(name) => write!(f, "sysenv.{name}"),
            Function::ThreadName => write!(f, "threadName"),
            Function::Null => write!(f, "null"),
            Function::Date(date) => {
                write!(f, "date:{}", date.command)?;
                match &date.pattern {
                    Some(pattern) => write!(f, ":{pattern}"),
                    None => Ok(()),
                }
            }
            Function::Bean { name, method } => match method {
                Some(method) => write!(f, "bean:{name}.{method}"),
                None => write!(f, "bean:{name}"),
            },
            Function::Ref(name) => write!(f, "ref:{name}"),
            Function::Placeholder { key, .. } => write!(f, "properties:{key}"),
            Function::PropertiesExist { key, negate } => {
                let bang = if *negate { "!" } else { "" };
                write!(f, "propertiesExist:{bang}{key}")
            }
            Function::Variable { name, path } => {
                write!(f, "variable.{name}")?;
                match path {
                    Some(path) => write!(f, "{path}"),
                    None => Ok(()),
                }
            }
            Function::VariableAs { name, type_name } => {
                write!(f, "variableAs({name}, {type_name})")
            }
            Function::Variables => write!(f, "variables"),
            Function::VariablesSize => write!(f, "variables.size"),
            Function::Uuid(UuidKind::Default) => write!(f, "uuid"),
            Function::Uuid(kind) => write!(f, "uuid({kind})"),
            Function::Empty(ty) => write!(f, "empty({})", ty.name().to_ascii_lowercase()),
            Function::Call(call) => write!(f, "{call}"),
            Function::File(file) => write!(f, "file:{file:?}"),
            Function::Path(path) => write!(f, "{path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_function_names() {
        assert_eq!(FileFunction::from_name("ext"), Some(FileFunction::Extension));
        assert_eq!(FileFunction::from_name("name.ext"), Some(FileFunction::Extension));
        assert_eq!(FileFunction::from_name("size"), Some(FileFunction::Length));
        assert_eq!(FileFunction::from_name("bogus"), None);
    }

    #[test]
    fn test_uuid_kinds() {
        assert_eq!(UuidKind::from_name("classic"), Some(UuidKind::Default));
        assert_eq!(UuidKind::from_name("short"), Some(UuidKind::Short));
        assert_eq!(UuidKind::from_name("mine"), None);
        assert_eq!(Function::Uuid(UuidKind::Simple).to_string(), "uuid(simple)");
        assert_eq!(Function::Empty(ValueType::List).to_string(), "empty(list)");
    }
}
