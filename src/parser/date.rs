//! Compilation of `date:` and `date-with-timezone:` functions

use super::error::{ParseError, ParseResult};
use crate::ast::{DateCommand, DateFunction};
use chrono::FixedOffset;
use chrono::format::{Item, StrftimeItems};
use once_cell::sync::Lazy;
use regex::Regex;

static OFFSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([+-])\s*(\d+)\s*(ms|d|h|m|s)").unwrap()
});

/// One or more offsets running to the end of the command
static OFFSET_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\s*[+-]\s*\d+\s*(?:ms|d|h|m|s))+\s*$").unwrap()
});

const MILLIS_PER_UNIT: &[(&str, i64)] = &[
    ("ms", 1),
    ("s", 1_000),
    ("m", 60_000),
    ("h", 3_600_000),
    ("d", 86_400_000),
];

/// Compile the text after `date:`, i.e. `command[:pattern]`
pub fn compile_date(function: &str, remainder: &str, position: usize) -> ParseResult<DateFunction> {
    let (command, pattern) = match remainder.split_once(':') {
        Some((command, pattern)) => (command, Some(pattern)),
        None => (remainder, None),
    };
    build(function, command, None, pattern, position)
}

/// Compile the text after `date-with-timezone:`, i.e. `command:timezone:pattern`
pub fn compile_date_with_timezone(
    function: &str,
    remainder: &str,
    position: usize,
) -> ParseResult<DateFunction> {
    let parts: Vec<&str> = remainder.splitn(3, ':').collect();
    let [command, timezone, pattern] = parts.as_slice() else {
        return Err(ParseError::invalid_syntax(
            "${date-with-timezone:command:timezone:pattern}",
            function,
            position,
        ));
    };
    let offset = parse_timezone(timezone).ok_or_else(|| {
        ParseError::syntax(format!("Unknown timezone '{timezone}' in {function}"), position)
    })?;
    build(function, command, Some(offset), Some(pattern), position)
}

fn build(
    function: &str,
    command_with_offsets: &str,
    timezone: Option<FixedOffset>,
    pattern: Option<&str>,
    position: usize,
) -> ParseResult<DateFunction> {
    let split_at = OFFSET_SUFFIX
        .find(command_with_offsets)
        .map_or(command_with_offsets.len(), |m| m.start());
    let command_text = command_with_offsets[..split_at].trim();
    let command = parse_command(command_text).ok_or_else(|| {
        ParseError::syntax(
            format!("Command not supported for dateExpression: {command_text} in {function}"),
            position,
        )
    })?;
    let offset_millis = capture_offsets(&command_with_offsets[split_at..]);

    let (pattern, format) = match pattern.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pattern) => {
            let format = translate_pattern(pattern).map_err(|reason| {
                ParseError::syntax(
                    format!("Invalid date pattern '{pattern}': {reason}"),
                    position,
                )
            })?;
            (Some(pattern.to_string()), Some(format))
        }
        None => (None, None),
    };

    Ok(DateFunction {
        command,
        offset_millis,
        timezone,
        pattern,
        format,
    })
}

fn parse_command(text: &str) -> Option<DateCommand> {
    if text == "now" {
        return Some(DateCommand::Now);
    }
    if text == "file" {
        return Some(DateCommand::File);
    }
    for prefix in ["in.header.", "in.headers.", "headers.", "header."] {
        if let Some(name) = text.strip_prefix(prefix).filter(|n| !n.is_empty()) {
            return Some(DateCommand::Header(name.to_string()));
        }
    }
    for prefix in ["exchangeProperty.", "property."] {
        if let Some(name) = text.strip_prefix(prefix).filter(|n| !n.is_empty()) {
            return Some(DateCommand::Property(name.to_string()));
        }
    }
    None
}

fn capture_offsets(text: &str) -> i64 {
    OFFSET_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let amount: i64 = caps[2].parse().ok()?;
            let unit = MILLIS_PER_UNIT
                .iter()
                .find(|(name, _)| *name == &caps[3])
                .map(|(_, millis)| *millis)?;
            let sign = if &caps[1] == "-" { -1 } else { 1 };
            Some(sign * amount.saturating_mul(unit))
        })
        .fold(0i64, i64::saturating_add)
}

/// Parse `UTC`, `GMT`, `Z`, `GMT+2`, `UTC-05`, `+0200` or `-05:30`
pub fn parse_timezone(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    let upper = text.to_ascii_uppercase();
    let offset_text = if matches!(upper.as_str(), "UTC" | "GMT" | "Z") {
        return FixedOffset::east_opt(0);
    } else if upper.starts_with("UTC") || upper.starts_with("GMT") {
        &text[3..]
    } else {
        text
    };

    let (sign, digits) = match offset_text.chars().next()? {
        '+' => (1, &offset_text[1..]),
        '-' => (-1, &offset_text[1..]),
        _ => return None,
    };
    let digits = digits.replace(':', "");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 18 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Translate a `SimpleDateFormat` style pattern to a chrono format string
pub fn translate_pattern(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut format = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // '' is a literal quote, otherwise quoted text runs to the next quote
            if chars.get(i + 1) == Some(&'\'') {
                format.push('\'');
                i += 2;
                continue;
            }
            let mut j = i + 1;
            loop {
                match chars.get(j) {
                    None => return Err("unterminated quote".to_string()),
                    Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                        format.push('\'');
                        j += 2;
                    }
                    Some('\'') => break,
                    Some(&literal) => {
                        push_literal(&mut format, literal);
                        j += 1;
                    }
                }
            }
            i = j + 1;
            continue;
        }
        if !c.is_ascii_alphabetic() {
            push_literal(&mut format, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('a', _) => "%p",
            ('D', _) => "%j",
            ('u', _) => "%u",
            ('Z', _) => "%z",
            ('X', _) => "%:z",
            ('z', _) => "%Z",
            (other, _) => return Err(format!("unsupported pattern letter '{other}'")),
        };
        format.push_str(spec);
        i += run;
    }

    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err("pattern does not translate to a valid format".to_string());
    }
    Ok(format)
}

fn push_literal(format: &mut String, c: char) {
    if c == '%' {
        format.push_str("%%");
    } else {
        format.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_translation() {
        assert_eq!(translate_pattern("yyyyMMdd").unwrap(), "%Y%m%d");
        assert_eq!(
            translate_pattern("yyyy-MM-dd'T'HH:mm:ss:SSS").unwrap(),
            "%Y-%m-%dT%H:%M:%S:%3f"
        );
        assert_eq!(translate_pattern("h 'o''clock' a").unwrap(), "%-I o'clock %p");
        assert_eq!(translate_pattern("100%").unwrap(), "100%%");
        assert!(translate_pattern("yyyy'").is_err());
        assert!(translate_pattern("QQ").is_err());
    }

    #[test]
    fn test_commands_and_offsets() {
        let date = compile_date("date:now-1h:yyyy", "now-1h:yyyy", 0).unwrap();
        assert_eq!(date.command, DateCommand::Now);
        assert_eq!(date.offset_millis, -3_600_000);
        assert_eq!(date.format.as_deref(), Some("%Y"));

        let date = compile_date("", "header.birthday+2d-30m", 0).unwrap();
        assert_eq!(date.command, DateCommand::Header("birthday".to_string()));
        assert_eq!(date.offset_millis, 2 * 86_400_000 - 30 * 60_000);

        let date = compile_date("", "now + 1 d", 0).unwrap();
        assert_eq!(date.offset_millis, 86_400_000);

        let date = compile_date("", "exchangeProperty.due", 0).unwrap();
        assert_eq!(date.command, DateCommand::Property("due".to_string()));
        assert_eq!(date.pattern, None);
    }

    #[test]
    fn test_dash_in_header_name_is_not_an_offset() {
        let date = compile_date("", "header.due-date:yyyy", 0).unwrap();
        assert_eq!(date.command, DateCommand::Header("due-date".to_string()));
        assert_eq!(date.offset_millis, 0);

        let date = compile_date("", "header.due-date-2h", 0).unwrap();
        assert_eq!(date.command, DateCommand::Header("due-date".to_string()));
        assert_eq!(date.offset_millis, -7_200_000);

        let date = compile_date("", "property.x-1d+foo", 0).unwrap();
        assert_eq!(date.command, DateCommand::Property("x-1d+foo".to_string()));
        assert!(compile_date("", "now+foo", 0).is_err());
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = compile_date("date:yyyyMMdd", "yyyyMMdd", 2).unwrap_err();
        assert!(err.to_string().contains("Command not supported"));
        assert_eq!(err.position(), 2);
    }

    #[test]
    fn test_timezone_forms() {
        assert_eq!(parse_timezone("UTC"), FixedOffset::east_opt(0));
        assert_eq!(parse_timezone("GMT+2"), FixedOffset::east_opt(7200));
        assert_eq!(parse_timezone("+0530"), FixedOffset::east_opt(19800));
        assert_eq!(parse_timezone("-05"), FixedOffset::west_opt(18000));
        assert_eq!(parse_timezone("Europe/Paris"), None);

        let err = compile_date_with_timezone("date-with-timezone:now:UTC", "now:UTC", 0)
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
        let date = compile_date_with_timezone("", "now:GMT+1:HH", 0).unwrap();
        assert_eq!(date.timezone, FixedOffset::east_opt(3600));
    }
}
