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

//! Operator semantics for predicates

use super::context::EvaluationContext;
use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{BinaryOperator, Pattern, UnaryOperator};
use crate::model::value::parse_number;
use crate::model::{SimpleValue, ValueType};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Both sides as decimals, when at least one side is numeric and the other
/// has a numeric reading
fn numeric_pair(left: &SimpleValue, right: &SimpleValue) -> Option<(Decimal, Decimal)> {
    if !(left.is_numeric() || right.is_numeric()) {
        return None;
    }
    Some((left.as_decimal()?, right.as_decimal()?))
}

/// Equality after coercing the right side to the left side's type.
///
/// Values that cannot be coerced either way are not equal.
pub(crate) fn values_equal(
    left: &SimpleValue,
    right: &SimpleValue,
    context: &dyn EvaluationContext,
) -> bool {
    match (left, right) {
        (SimpleValue::Null, SimpleValue::Null) => return true,
        (SimpleValue::Null, _) | (_, SimpleValue::Null) => return false,
        _ => {}
    }
    if let Some((l, r)) = numeric_pair(left, right) {
        return l == r;
    }
    match context.convert(right, left.value_type()) {
        Ok(converted) => converted == *left,
        Err(_) => context
            .convert(left, right.value_type())
            .map(|converted| converted == *right)
            .unwrap_or(false),
    }
}

/// Order two values. `None` when either side is null.
pub(crate) fn compare_values(
    left: &SimpleValue,
    right: &SimpleValue,
    context: &dyn EvaluationContext,
) -> EvaluationResult<Option<Ordering>> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    if let Some((l, r)) = numeric_pair(left, right) {
        return Ok(Some(l.cmp(&r)));
    }
    let converted = context.convert(right, left.value_type())?;
    let ordering = match (left, &converted) {
        (SimpleValue::String(a), SimpleValue::String(b)) => a.cmp(b),
        (SimpleValue::Boolean(a), SimpleValue::Boolean(b)) => a.cmp(b),
        (SimpleValue::DateTime(a), SimpleValue::DateTime(b)) => a.cmp(b),
        (a, b) => {
            return Err(EvaluationError::invalid_operation(format!(
                "Cannot order {} and {}",
                a.type_name(),
                b.type_name()
            )));
        }
    };
    Ok(Some(ordering))
}

/// Apply a binary operator whose right side was evaluated at run time
pub(crate) fn apply_binary(
    operator: BinaryOperator,
    left: &SimpleValue,
    right: &SimpleValue,
    context: &dyn EvaluationContext,
) -> EvaluationResult<bool> {
    let result = match operator {
        BinaryOperator::Equal => values_equal(left, right, context),
        BinaryOperator::NotEqual => !values_equal(left, right, context),
        BinaryOperator::EqualIgnoreCase => equal_ignore_case(left, right),
        BinaryOperator::GreaterThan => {
            compare_values(left, right, context)? == Some(Ordering::Greater)
        }
        BinaryOperator::GreaterThanOrEqual => matches!(
            compare_values(left, right, context)?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
        BinaryOperator::LessThan => compare_values(left, right, context)? == Some(Ordering::Less),
        BinaryOperator::LessThanOrEqual => matches!(
            compare_values(left, right, context)?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        BinaryOperator::Contains => contains(left, right, false, context),
        BinaryOperator::NotContains => !contains(left, right, false, context),
        BinaryOperator::ContainsIgnoreCase => contains(left, right, true, context),
        BinaryOperator::StartsWith => {
            !left.is_null() && !right.is_null() && left.to_text().starts_with(&right.to_text())
        }
        BinaryOperator::EndsWith => {
            !left.is_null() && !right.is_null() && left.to_text().ends_with(&right.to_text())
        }
        BinaryOperator::Regex | BinaryOperator::NotRegex => {
            let pattern = Pattern::new(&right.to_text())
                .map_err(|e| EvaluationError::invalid_operation(e.to_string()))?;
            let matched = matches_pattern(left, &pattern);
            (operator == BinaryOperator::Regex) == matched
        }
        BinaryOperator::In | BinaryOperator::NotIn => {
            let values = in_values(right);
            let found = value_in(left, &values, context);
            (operator == BinaryOperator::In) == found
        }
        BinaryOperator::Range | BinaryOperator::NotRange => {
            let text = right.to_text();
            let (from, to) = text.split_once("..").ok_or_else(|| {
                EvaluationError::invalid_operation(format!(
                    "Range must be written as 'from..to', was: {text}"
                ))
            })?;
            let inside = in_range(left, &range_bound(from), &range_bound(to), context);
            (operator == BinaryOperator::Range) == inside
        }
        BinaryOperator::Is | BinaryOperator::NotIs => {
            let name = right.to_text();
            let target = ValueType::from_name(&name)
                .ok_or(EvaluationError::UnknownType { name })?;
            (operator == BinaryOperator::Is) == target.matches(left)
        }
    };
    Ok(result)
}

fn equal_ignore_case(left: &SimpleValue, right: &SimpleValue) -> bool {
    match (left, right) {
        (SimpleValue::Null, SimpleValue::Null) => true,
        (SimpleValue::Null, _) | (_, SimpleValue::Null) => false,
        _ => left.to_text().to_lowercase() == right.to_text().to_lowercase(),
    }
}

/// Containment: list membership, map key, or substring
pub(crate) fn contains(
    left: &SimpleValue,
    right: &SimpleValue,
    ignore_case: bool,
    context: &dyn EvaluationContext,
) -> bool {
    match left {
        SimpleValue::Null => false,
        SimpleValue::List(items) => items.iter().any(|item| {
            if ignore_case {
                equal_ignore_case(item, right)
            } else {
                values_equal(item, right, context)
            }
        }),
        SimpleValue::Object(map) => {
            let key = right.to_text();
            if ignore_case {
                map.keys().any(|k| k.to_lowercase() == key.to_lowercase())
            } else {
                map.contains_key(&key)
            }
        }
        _ if right.is_null() => false,
        _ if ignore_case => left
            .to_text()
            .to_lowercase()
            .contains(&right.to_text().to_lowercase()),
        _ => left.to_text().contains(&right.to_text()),
    }
}

/// Whether the left side, rendered as text, fully matches `pattern`.
/// Null never matches.
pub(crate) fn matches_pattern(left: &SimpleValue, pattern: &Pattern) -> bool {
    !left.is_null() && pattern.is_match(&left.to_text())
}

fn in_values(right: &SimpleValue) -> Vec<SimpleValue> {
    match right {
        SimpleValue::List(items) => items.clone(),
        SimpleValue::String(text) => text
            .split(',')
            .map(|item| SimpleValue::from(item.trim()))
            .collect(),
        other => vec![other.clone()],
    }
}

/// Whether `left` equals any of `values`
pub(crate) fn value_in(
    left: &SimpleValue,
    values: &[SimpleValue],
    context: &dyn EvaluationContext,
) -> bool {
    values.iter().any(|value| values_equal(left, value, context))
}

fn range_bound(text: &str) -> SimpleValue {
    let text = text.trim();
    parse_number(text).unwrap_or_else(|| SimpleValue::from(text))
}

/// Inclusive range check; values that cannot be ordered against the bounds
/// are outside the range
pub(crate) fn in_range(
    left: &SimpleValue,
    from: &SimpleValue,
    to: &SimpleValue,
    context: &dyn EvaluationContext,
) -> bool {
    if left.is_null() {
        return false;
    }
    match (
        compare_values(left, from, context),
        compare_values(left, to, context),
    ) {
        (Ok(Some(lower)), Ok(Some(upper))) => {
            lower != Ordering::Less && upper != Ordering::Greater
        }
        _ => false,
    }
}

/// `++` and `--` on numbers and numeric text
pub(crate) fn apply_unary(operator: UnaryOperator, value: &SimpleValue) -> EvaluationResult<SimpleValue> {
    let delta: i64 = match operator {
        UnaryOperator::Increment => 1,
        UnaryOperator::Decrement => -1,
    };
    match value {
        SimpleValue::Integer(i) => i.checked_add(delta).map(SimpleValue::Integer).ok_or_else(|| {
            EvaluationError::invalid_operation(format!("{i}{operator} overflows"))
        }),
        SimpleValue::Decimal(d) => d
            .checked_add(Decimal::from(delta))
            .map(SimpleValue::Decimal)
            .ok_or_else(|| EvaluationError::invalid_operation(format!("{d}{operator} overflows"))),
        SimpleValue::String(text) => match parse_number(text.trim()) {
            Some(number) => apply_unary(operator, &number),
            None => Err(EvaluationError::invalid_operation(format!(
                "Cannot apply {operator} to non-numeric text '{text}'"
            ))),
        },
        other => Err(EvaluationError::invalid_operation(format!(
            "Cannot apply {operator} to {}",
            other.type_name()
        ))),
    }
}
