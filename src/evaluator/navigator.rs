//! Accessor path navigation over values

use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{AccessPath, IndexKey, PathSegment};
use crate::model::SimpleValue;

/// Navigate `root` along `path`, when there is one
pub(crate) fn navigate(root: &SimpleValue, path: Option<&AccessPath>) -> EvaluationResult<SimpleValue> {
    match path {
        Some(path) => navigate_path(root, path),
        None => Ok(root.clone()),
    }
}

/// Walk every segment of `path`.
///
/// A null root yields null. Once a `?` segment has been seen, a null
/// intermediate or an index out of range also yields null instead of an
/// error.
pub(crate) fn navigate_path(root: &SimpleValue, path: &AccessPath) -> EvaluationResult<SimpleValue> {
    navigate_from(root, path, 0)
}

/// Walk the segments of `path` after the first `skip`, which the caller
/// already used to locate `root`
pub(crate) fn navigate_from(
    root: &SimpleValue,
    path: &AccessPath,
    skip: usize,
) -> EvaluationResult<SimpleValue> {
    let mut current = root.clone();
    let mut null_safe = path.segments()[..skip.min(path.segments().len())]
        .iter()
        .any(|segment| segment.is_null_safe());

    for (i, segment) in path.segments().iter().enumerate().skip(skip) {
        null_safe |= segment.is_null_safe();
        if current.is_null() {
            if null_safe || i == skip {
                return Ok(SimpleValue::Null);
            }
            return Err(EvaluationError::NullNavigation {
                path: path.to_string(),
            });
        }
        current = match segment {
            PathSegment::Property { name, .. } => member(&current, name)?,
            PathSegment::Index { key, .. } => index(&current, key, null_safe)?,
        };
    }
    Ok(current)
}

fn member(value: &SimpleValue, name: &str) -> EvaluationResult<SimpleValue> {
    if let SimpleValue::Object(map) = value {
        if let Some(found) = map.get(name) {
            return Ok(found.clone());
        }
        if let Some(found) = getter_field(name).and_then(|field| map.get(&field)) {
            return Ok(found.clone());
        }
    }
    if matches!(name, "size" | "length") {
        if let Some(len) = value.len() {
            return Ok(SimpleValue::Integer(len as i64));
        }
    }
    match value {
        SimpleValue::Object(_) => Ok(SimpleValue::Null),
        other => Err(EvaluationError::PropertyNotFound {
            property: name.to_string(),
            type_name: other.type_name().to_string(),
        }),
    }
}

/// `getName` and `isActive` address the fields `name` and `active`
fn getter_field(name: &str) -> Option<String> {
    let rest = name
        .strip_prefix("get")
        .or_else(|| name.strip_prefix("is"))
        .filter(|rest| rest.starts_with(|c: char| c.is_uppercase()))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn index(value: &SimpleValue, key: &IndexKey, null_safe: bool) -> EvaluationResult<SimpleValue> {
    match (value, key) {
        (SimpleValue::List(items), IndexKey::Position(position)) => {
            element(items, Some(*position), *position as i64, null_safe)
        }
        (SimpleValue::List(items), IndexKey::FromLast(back)) => {
            let position = items.len().checked_sub(back + 1);
            element(items, position, items.len() as i64 - 1 - *back as i64, null_safe)
        }
        (SimpleValue::List(items), IndexKey::Key(key)) => match key.trim().parse::<usize>() {
            Ok(position) => element(items, Some(position), position as i64, null_safe),
            Err(_) => Err(EvaluationError::invalid_operation(format!(
                "List index must be numeric, was: {key}"
            ))),
        },
        (SimpleValue::Object(map), IndexKey::Key(key)) => {
            Ok(map.get(key).cloned().unwrap_or_default())
        }
        (SimpleValue::Object(map), IndexKey::Position(position)) => {
            Ok(map.get(&position.to_string()).cloned().unwrap_or_default())
        }
        (other, key) => Err(EvaluationError::invalid_operation(format!(
            "Cannot index {} with [{}]",
            other.type_name(),
            describe(key)
        ))),
    }
}

fn element(
    items: &[SimpleValue],
    position: Option<usize>,
    requested: i64,
    null_safe: bool,
) -> EvaluationResult<SimpleValue> {
    match position.and_then(|p| items.get(p)) {
        Some(item) => Ok(item.clone()),
        None if null_safe => Ok(SimpleValue::Null),
        None => Err(EvaluationError::IndexOutOfBounds {
            index: requested,
            size: items.len(),
        }),
    }
}

fn describe(key: &IndexKey) -> String {
    match key {
        IndexKey::Position(position) => position.to_string(),
        IndexKey::FromLast(0) => "last".to_string(),
        IndexKey::FromLast(back) => format!("last-{back}"),
        IndexKey::Key(key) => key.clone(),
    }
}
