//! Evaluation of compiled `date:` functions

use super::context::EvaluationContext;
use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{DateCommand, DateFunction};
use crate::model::{SimpleValue, ValueType};
use chrono::{DateTime, FixedOffset, Local, TimeDelta};
use std::fmt::Write;

/// Produce the date, shifted and zoned, either as a value or formatted text.
///
/// A base date that is absent (missing header, no current file) yields null.
pub(crate) fn evaluate_date(
    date: &DateFunction,
    context: &dyn EvaluationContext,
) -> EvaluationResult<SimpleValue> {
    let Some(base) = base_date(&date.command, context)? else {
        return Ok(SimpleValue::Null);
    };

    let shifted = TimeDelta::try_milliseconds(date.offset_millis)
        .and_then(|offset| base.checked_add_signed(offset))
        .ok_or_else(|| EvaluationError::Date {
            message: format!("offset of {}ms is out of range", date.offset_millis),
        })?;
    let zoned = match date.timezone {
        Some(timezone) => shifted.with_timezone(&timezone),
        None => shifted,
    };

    match &date.format {
        None => Ok(SimpleValue::DateTime(zoned)),
        Some(format) => {
            let mut text = String::new();
            write!(text, "{}", zoned.format(format)).map_err(|_| EvaluationError::Date {
                message: format!(
                    "cannot format date with pattern '{}'",
                    date.pattern.as_deref().unwrap_or(format)
                ),
            })?;
            Ok(SimpleValue::String(text))
        }
    }
}

fn base_date(
    command: &DateCommand,
    context: &dyn EvaluationContext,
) -> EvaluationResult<Option<DateTime<FixedOffset>>> {
    let (source, value) = match command {
        DateCommand::Now => return Ok(Some(Local::now().fixed_offset())),
        DateCommand::File => return Ok(context.file().and_then(|file| file.modified)),
        DateCommand::Header(name) => (format!("header {name}"), context.header(name)),
        DateCommand::Property(name) => (format!("exchangeProperty {name}"), context.property(name)),
    };
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    match context.convert(&value, ValueType::DateTime) {
        Ok(SimpleValue::DateTime(date)) => Ok(Some(date)),
        Ok(other) => Err(EvaluationError::Date {
            message: format!("cannot read a date from {source}, was {}", other.type_name()),
        }),
        Err(e) => Err(EvaluationError::Date {
            message: format!("cannot read a date from {source}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{FileInfo, Message};
    use crate::parser::date::{compile_date, compile_date_with_timezone};
    use chrono::TimeZone;

    fn birthday() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(1974, 4, 20, 8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_header_date_with_pattern() {
        let message = Message::new().with_header("birthday", birthday());
        let date = compile_date("", "header.birthday:yyyyMMdd", 0).unwrap();
        assert_eq!(
            evaluate_date(&date, &message).unwrap(),
            SimpleValue::from("19740420")
        );

        let date = compile_date("", "header.birthday+1d-30m:yyyy-MM-dd HH:mm", 0).unwrap();
        assert_eq!(
            evaluate_date(&date, &message).unwrap(),
            SimpleValue::from("1974-04-21 08:00")
        );
    }

    #[test]
    fn test_timezone_shift() {
        let message = Message::new().with_header("birthday", birthday());
        let date = compile_date_with_timezone("", "header.birthday:GMT+2:HH:mm", 0).unwrap();
        assert_eq!(
            evaluate_date(&date, &message).unwrap(),
            SimpleValue::from("10:30")
        );
    }

    #[test]
    fn test_missing_sources_are_null() {
        let message = Message::new();
        let date = compile_date("", "header.missing", 0).unwrap();
        assert_eq!(evaluate_date(&date, &message).unwrap(), SimpleValue::Null);
        let date = compile_date("", "file:yyyy", 0).unwrap();
        assert_eq!(evaluate_date(&date, &message).unwrap(), SimpleValue::Null);

        let message = message.with_file(FileInfo::new("a.txt", "a.txt").with_modified(birthday()));
        assert_eq!(
            evaluate_date(&date, &message).unwrap(),
            SimpleValue::from("1974")
        );
    }

    #[test]
    fn test_header_text_is_parsed() {
        let message = Message::new().with_header("due", "2024-01-31");
        let date = compile_date("", "header.due:dd/MM/yyyy", 0).unwrap();
        assert_eq!(
            evaluate_date(&date, &message).unwrap(),
            SimpleValue::from("31/01/2024")
        );

        let message = Message::new().with_header("due", "not a date");
        assert!(matches!(
            evaluate_date(&date, &message),
            Err(EvaluationError::Date { .. })
        ));
    }

    #[test]
    fn test_now_is_a_date() {
        let date = compile_date("", "now", 0).unwrap();
        assert!(matches!(
            evaluate_date(&date, &Message::new()).unwrap(),
            SimpleValue::DateTime(_)
        ));
    }
}
