//! Evaluation of function references

use super::calls::evaluate_call;
use super::context::{EvaluationContext, FileInfo};
use super::date::evaluate_date;
use super::error::{EvaluationError, EvaluationResult};
use super::navigator::{navigate, navigate_from, navigate_path};
use crate::ast::{AccessPath, FileFunction, Function, PathSegment, UuidKind};
use crate::model::{SimpleValue, ValueType};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read the value a function refers to
pub(crate) fn evaluate_function(
    function: &Function,
    context: &dyn EvaluationContext,
) -> EvaluationResult<SimpleValue> {
    match function {
        Function::MessageId => Ok(context
            .message_id()
            .map(|id| SimpleValue::String(id.into_owned()))
            .unwrap_or_default()),
        Function::Body { path } => navigate(&context.body(), path.as_ref()),
        Function::BodyType => Ok(SimpleValue::from(context.body().type_name())),
        Function::BodyAs {
            type_name,
            mandatory,
            path,
        } => {
            let target = resolve_type(type_name)?;
            let body = context.body();
            if body.is_null() {
                if *mandatory {
                    return Err(EvaluationError::MandatoryBody {
                        type_name: type_name.clone(),
                    });
                }
                return Ok(SimpleValue::Null);
            }
            let converted = context.convert(&body, target)?;
            navigate(&converted, path.as_ref())
        }
        Function::Header { name, path } => match context.header(name) {
            Some(value) => navigate(&value, path.as_ref()),
            None => Ok(SimpleValue::Null),
        },
        Function::HeaderAs { name, type_name } => {
            let target = resolve_type(type_name)?;
            match context.header(name) {
                Some(value) => Ok(context.convert(&value, target)?),
                None => Ok(SimpleValue::Null),
            }
        }
        Function::Headers => Ok(SimpleValue::Object(context.headers())),
        Function::HeadersSize => Ok(SimpleValue::Integer(context.headers().len() as i64)),
        Function::Property { name, path } => match context.property(name) {
            Some(value) => navigate(&value, path.as_ref()),
            None => Ok(SimpleValue::Null),
        },
        Function::Exception { path } => match (context.exception(), path) {
            (None, _) => Ok(SimpleValue::Null),
            (Some(exception), None) => Ok(SimpleValue::String(exception.to_string())),
            (Some(exception), Some(path)) => navigate_path(&exception.to_value(), path),
        },
        Function::ExceptionMessage => Ok(context
            .exception()
            .map(|exception| SimpleValue::String(exception.message.clone()))
            .unwrap_or_default()),
        Function::ExceptionStacktrace => Ok(context
            .exception()
            .and_then(|exception| exception.stacktrace.clone())
            .map(SimpleValue::String)
            .unwrap_or_default()),
        Function::SystemProperty(name) => Ok(context.system_property(name).into()),
        Function::Environment(name) => Ok(context.env(name).into()),
        Function::ThreadName => {
            let thread = std::thread::current();
            Ok(SimpleValue::from(thread.name().unwrap_or("unnamed")))
        }
        Function::Null => Ok(SimpleValue::Null),
        Function::Date(date) => evaluate_date(date, context),
        Function::Bean { name, method } => {
            let bean = context
                .bean(name)
                .ok_or_else(|| EvaluationError::UnknownBean { name: name.clone() })?;
            bean.invoke(method.as_deref(), context)
        }
        Function::Ref(name) => match context.bean(name) {
            Some(bean) => bean.invoke(None, context),
            None => Ok(SimpleValue::Null),
        },
        Function::Placeholder { key, locations } => context
            .resolve_placeholder(key, locations)
            .map(SimpleValue::String)
            .ok_or_else(|| EvaluationError::PlaceholderNotFound {
                key: key.clone(),
                text: function.to_string(),
            }),
        Function::PropertiesExist { key, negate } => {
            let exists = context.resolve_placeholder(key, &[]).is_some();
            Ok(SimpleValue::Boolean(exists != *negate))
        }
        Function::Variable { name, path } => match context.variable(name) {
            Some(value) => navigate(&value, path.as_ref()),
            None => Ok(SimpleValue::Null),
        },
        Function::VariableAs { name, type_name } => {
            let target = resolve_type(type_name)?;
            match context.variable(name) {
                Some(value) => Ok(context.convert(&value, target)?),
                None => Ok(SimpleValue::Null),
            }
        }
        Function::Variables => Ok(SimpleValue::Object(context.variables())),
        Function::VariablesSize => Ok(SimpleValue::Integer(context.variables().len() as i64)),
        Function::Uuid(kind) => Ok(SimpleValue::String(generate_uuid(*kind))),
        Function::Empty(ty) => Ok(match ty {
            ValueType::Object => SimpleValue::Object(IndexMap::new()),
            ValueType::List => SimpleValue::List(Vec::new()),
            _ => SimpleValue::String(String::new()),
        }),
        Function::Call(call) => evaluate_call(call, context),
        Function::File(attribute) => Ok(context
            .file()
            .map(|file| file_attribute(&file, *attribute))
            .unwrap_or_default()),
        Function::Path(path) => resolve_path(path, context),
    }
}

static SIMPLE_UUID: AtomicU64 = AtomicU64::new(1);

fn generate_uuid(kind: UuidKind) -> String {
    match kind {
        UuidKind::Default => uuid::Uuid::new_v4().to_string(),
        UuidKind::Short => {
            let mut simple = uuid::Uuid::new_v4().simple().to_string();
            simple.truncate(16);
            simple
        }
        UuidKind::Simple => SIMPLE_UUID.fetch_add(1, Ordering::Relaxed).to_string(),
    }
}

fn resolve_type(type_name: &str) -> EvaluationResult<ValueType> {
    ValueType::from_name(type_name).ok_or_else(|| EvaluationError::UnknownType {
        name: type_name.to_string(),
    })
}

/// Unrecognised function text: the head names a header, then an exchange
/// property, then a field of the body
fn resolve_path(path: &AccessPath, context: &dyn EvaluationContext) -> EvaluationResult<SimpleValue> {
    if let Some(PathSegment::Property { name, .. }) = path.segments().first() {
        if let Some(header) = context.header(name) {
            log::trace!("'{}' resolved from header {name}", path.source());
            return navigate_from(&header, path, 1);
        }
        if let Some(property) = context.property(name) {
            log::trace!("'{}' resolved from exchange property {name}", path.source());
            return navigate_from(&property, path, 1);
        }
    }

    let body = context.body();
    if let SimpleValue::Object(fields) = body.as_ref() {
        let head_found = match path.segments().first() {
            Some(PathSegment::Property { name, .. }) => fields.contains_key(name.as_str()),
            _ => true,
        };
        if head_found {
            log::trace!("'{}' resolved from the body", path.source());
            return navigate_path(&body, path);
        }
    }

    Err(EvaluationError::Unresolved {
        text: path.source().to_string(),
    })
}

fn file_attribute(file: &FileInfo, attribute: FileFunction) -> SimpleValue {
    match attribute {
        FileFunction::Name => SimpleValue::from(file.name.as_str()),
        FileFunction::NameNoExt => SimpleValue::from(FileInfo::without_extension(&file.name)),
        FileFunction::Extension => file.extension().map(SimpleValue::from).unwrap_or_default(),
        FileFunction::OnlyName => SimpleValue::from(file.only_name()),
        FileFunction::OnlyNameNoExt => {
            SimpleValue::from(FileInfo::without_extension(file.only_name()))
        }
        FileFunction::Parent => file.parent.clone().into(),
        FileFunction::Path => SimpleValue::from(file.path.as_str()),
        FileFunction::Absolute => SimpleValue::Boolean(file.absolute),
        FileFunction::AbsolutePath => SimpleValue::from(file.absolute_path.as_str()),
        FileFunction::Length => SimpleValue::Integer(i64::try_from(file.length).unwrap_or(i64::MAX)),
        FileFunction::Modified => file.modified.into(),
    }
}
