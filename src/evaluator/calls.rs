//! Evaluation of built-in calls

use super::context::EvaluationContext;
use super::error::{EvaluationError, EvaluationResult};
use super::evaluate;
use crate::ast::{Call, Expression};
use crate::model::SimpleValue;
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;

pub(crate) fn evaluate_call(call: &Call, context: &dyn EvaluationContext) -> EvaluationResult<SimpleValue> {
    match call {
        Call::Replace { from, to, source } => {
            with_text(source, context, |text| SimpleValue::String(text.replace(from, to)))
        }
        Call::Substring { head, tail, source } => {
            let head = integer(call, head, context)?;
            let tail = integer(call, tail, context)?;
            with_text(source, context, |text| SimpleValue::String(clip(text, head, tail)))
        }
        Call::SubstringBefore { source, before } => {
            let before = evaluate(before, context)?.to_text();
            with_text(source, context, |text| {
                text.split_once(before.as_str())
                    .map(|(head, _)| SimpleValue::from(head))
                    .unwrap_or_default()
            })
        }
        Call::SubstringAfter { source, after } => {
            let after = evaluate(after, context)?.to_text();
            with_text(source, context, |text| {
                text.split_once(after.as_str())
                    .map(|(_, rest)| SimpleValue::from(rest))
                    .unwrap_or_default()
            })
        }
        Call::SubstringBetween {
            source,
            after,
            before,
        } => {
            let after = evaluate(after, context)?.to_text();
            let before = evaluate(before, context)?.to_text();
            with_text(source, context, |text| {
                text.split_once(after.as_str())
                    .and_then(|(_, rest)| rest.split_once(before.as_str()))
                    .map(|(between, _)| SimpleValue::from(between))
                    .unwrap_or_default()
            })
        }
        Call::Trim(source) => with_text(source, context, |text| SimpleValue::from(text.trim())),
        Call::Size(source) => {
            let value = evaluate(source, context)?;
            let size = match &value {
                SimpleValue::Null => 0,
                other => other.len().unwrap_or(1),
            };
            Ok(SimpleValue::Integer(size as i64))
        }
        Call::Random { min, max } => {
            let min = integer(call, min, context)?;
            let max = integer(call, max, context)?;
            if min >= max {
                return Err(EvaluationError::invalid_operation(format!(
                    "random({min},{max}) needs min below max"
                )));
            }
            Ok(SimpleValue::Integer(fastrand::i64(min..max)))
        }
        Call::Skip { count, source } => {
            let count = usize::try_from(integer(call, count, context)?).unwrap_or(0);
            Ok(match items(evaluate(source, context)?) {
                Some(items) => SimpleValue::List(items.into_iter().skip(count).collect()),
                None => SimpleValue::Null,
            })
        }
        Call::Collate { size, source } => {
            let size = usize::try_from(integer(call, size, context)?)
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| EvaluationError::invalid_operation("collate needs a positive group size"))?;
            Ok(match items(evaluate(source, context)?) {
                Some(items) => SimpleValue::List(
                    items
                        .chunks(size)
                        .map(|group| SimpleValue::List(group.to_vec()))
                        .collect(),
                ),
                None => SimpleValue::Null,
            })
        }
        Call::Join {
            separator,
            prefix,
            source,
        } => {
            let prefix = prefix.as_deref().unwrap_or("");
            let joined = items(evaluate(source, context)?)
                .unwrap_or_default()
                .iter()
                .map(|item| format!("{prefix}{}", item.to_text()))
                .collect::<Vec<_>>()
                .join(separator.as_str());
            Ok(SimpleValue::String(joined))
        }
        Call::Iif {
            condition,
            when_true,
            when_false,
        } => {
            if evaluate(condition, context)?.is_truthy() {
                evaluate(when_true, context)
            } else {
                evaluate(when_false, context)
            }
        }
        Call::List(items) => items
            .iter()
            .map(|item| evaluate(item, context))
            .collect::<EvaluationResult<Vec<_>>>()
            .map(SimpleValue::List),
        Call::Map(pairs) => {
            let mut map = IndexMap::with_capacity(pairs.len());
            for (key, value) in pairs {
                map.insert(evaluate(key, context)?.to_text(), evaluate(value, context)?);
            }
            Ok(SimpleValue::Object(map))
        }
    }
}

/// Apply `f` to the text of `source`; a null value stays null
fn with_text(
    source: &Expression,
    context: &dyn EvaluationContext,
    f: impl FnOnce(&str) -> SimpleValue,
) -> EvaluationResult<SimpleValue> {
    match evaluate(source, context)? {
        SimpleValue::Null => Ok(SimpleValue::Null),
        value => Ok(f(&value.to_text())),
    }
}

fn integer(call: &Call, argument: &Expression, context: &dyn EvaluationContext) -> EvaluationResult<i64> {
    let value = evaluate(argument, context)?;
    value
        .as_decimal()
        .and_then(|number| number.trunc().to_i64())
        .ok_or_else(|| {
            EvaluationError::invalid_operation(format!(
                "{}() expects a number but was '{}'",
                call.name(),
                value.to_text()
            ))
        })
}

/// Drop `head` characters from the start and `tail` from the end. A single
/// negative count clips from the end instead.
fn clip(text: &str, head: i64, tail: i64) -> String {
    let (head, tail) = if head < 0 && tail == 0 { (0, head) } else { (head, tail) };
    let head = head.unsigned_abs() as usize;
    let tail = tail.unsigned_abs() as usize;
    let length = text.chars().count();
    if head + tail >= length {
        return String::new();
    }
    text.chars().skip(head).take(length - head - tail).collect()
}

/// The items of a list, or a single value as a one-item list
fn items(value: SimpleValue) -> Option<Vec<SimpleValue>> {
    match value {
        SimpleValue::Null => None,
        SimpleValue::List(items) => Some(items),
        other => Some(vec![other]),
    }
}
