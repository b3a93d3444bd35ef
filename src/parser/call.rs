//! Compilation of built-in calls such as `substring(1,2)` or `join(';')`
//!
//! A call is a name followed by a parenthesised argument list. Arguments are
//! split at top-level commas and compiled through an [`ArgumentCompiler`],
//! so they may embed functions of their own: `substring(1,2,${header.code})`.

use super::error::{ParseError, ParseResult};
use super::path::unquote;
use super::predicate::parse_predicate;
use super::scanner::compile_template_at;
use super::strategy::ParseEnvironment;
use crate::ast::{Call, Expression};

/// Compiles the arguments of a built-in call
pub trait ArgumentCompiler {
    /// Compile an argument read as a value
    fn value(&self, text: &str, position: usize) -> ParseResult<Expression>;

    /// Compile an argument read as a condition, e.g. the first argument of
    /// `iif`
    fn condition(&self, text: &str, position: usize) -> ParseResult<Expression>;
}

/// Takes every argument as literal text.
///
/// Used where no token registry is at hand, such as function text rendered
/// at evaluation time.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralArguments;

impl ArgumentCompiler for LiteralArguments {
    fn value(&self, text: &str, _position: usize) -> ParseResult<Expression> {
        Ok(Expression::text(strip_quotes(text)))
    }

    fn condition(&self, text: &str, position: usize) -> ParseResult<Expression> {
        Ok(Expression::Truthy(Box::new(self.value(text, position)?)))
    }
}

impl ArgumentCompiler for ParseEnvironment<'_> {
    fn value(&self, text: &str, position: usize) -> ParseResult<Expression> {
        match unquote(text) {
            Some(inner) => compile_template_at(self, inner, position + 1),
            None => compile_template_at(self, text, position),
        }
    }

    fn condition(&self, text: &str, position: usize) -> ParseResult<Expression> {
        match parse_predicate(self, text).map_err(|e| e.shifted(position))? {
            Some(predicate) => Ok(predicate),
            None => Ok(Expression::Truthy(Box::new(self.value(text, position)?))),
        }
    }
}

struct CallInput<'a> {
    function: &'a str,
    position: usize,
    arguments: Vec<(usize, &'a str)>,
    compiler: &'a dyn ArgumentCompiler,
}

impl CallInput<'_> {
    fn invalid(&self, syntax: &'static str) -> ParseError {
        ParseError::invalid_syntax(syntax, self.function, self.position)
    }

    /// Check the argument count, failing with `syntax` otherwise
    fn expect(&self, count: std::ops::RangeInclusive<usize>, syntax: &'static str) -> ParseResult<()> {
        if count.contains(&self.arguments.len()) {
            Ok(())
        } else {
            Err(self.invalid(syntax))
        }
    }

    fn value(&self, index: usize) -> ParseResult<Expression> {
        let (position, text) = self.arguments[index];
        self.compiler.value(text, position)
    }

    fn value_or(&self, index: usize, default: Expression) -> ParseResult<Expression> {
        if index < self.arguments.len() {
            self.value(index)
        } else {
            Ok(default)
        }
    }

    fn literal(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(|(_, text)| strip_quotes(text))
    }
}

type CallBuilder = fn(&CallInput<'_>) -> ParseResult<Call>;

const CALLS: &[(&str, CallBuilder)] = &[
    ("replace", replace),
    ("substring", substring),
    ("substringBefore", substring_before),
    ("substringAfter", substring_after),
    ("substringBetween", substring_between),
    ("trim", trim),
    ("size", size),
    ("random", random),
    ("skip", skip),
    ("collate", collate),
    ("join", join),
    ("iif", iif),
    ("list", list),
    ("map", map),
];

fn call_name(text: &str) -> Option<(&'static str, CallBuilder, &str)> {
    CALLS.iter().find_map(|(name, build)| {
        text.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('('))
            .map(|rest| (*name, *build, rest))
    })
}

/// Check if `text` starts like a built-in call, e.g. `substring(`
pub fn is_call(text: &str) -> bool {
    call_name(text).is_some()
}

/// Compile `text` if it is a built-in call
pub fn compile_call(
    text: &str,
    position: usize,
    compiler: &dyn ArgumentCompiler,
) -> ParseResult<Option<Call>> {
    let Some((name, build, rest)) = call_name(text) else {
        return Ok(None);
    };
    let unbalanced = || {
        ParseError::syntax(format!("Missing ')' in call {text}"), position + text.len())
    };
    let close = rest.rfind(')').ok_or_else(unbalanced)?;
    if !rest[close + 1..].trim().is_empty() {
        return Err(unbalanced());
    }

    let offset = position + name.len() + 1;
    let arguments = split_arguments(&rest[..close])
        .into_iter()
        .map(|(at, argument)| (offset + at, argument))
        .collect();
    let input = CallInput {
        function: text,
        position,
        arguments,
        compiler,
    };
    build(&input).map(Some)
}

/// Split at commas outside quotes and brackets. Arguments are trimmed and
/// returned with their offset; blank text has no arguments.
pub(crate) fn split_arguments(text: &str) -> Vec<(usize, &str)> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                arguments.push(trimmed(text, start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    arguments.push(trimmed(text, start, text.len()));
    arguments
}

fn trimmed(text: &str, start: usize, end: usize) -> (usize, &str) {
    let raw = &text[start..end];
    (start + raw.len() - raw.trim_start().len(), raw.trim())
}

fn strip_quotes(text: &str) -> &str {
    unquote(text).unwrap_or(text)
}

fn xml_decode(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn replace(input: &CallInput<'_>) -> ParseResult<Call> {
    const SYNTAX: &str = "${replace(from,to)} or ${replace(from,to,expression)}";
    input.expect(2..=3, SYNTAX)?;
    let from = input.literal(0).map(xml_decode).unwrap_or_default();
    if from.is_empty() {
        return Err(input.invalid(SYNTAX));
    }
    let to = match input.literal(1) {
        Some("&empty;") | None => String::new(),
        Some(to) => xml_decode(to),
    };
    Ok(Call::Replace {
        from,
        to,
        source: input.value_or(2, Call::body())?,
    })
}

fn substring(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(1..=3, "${substring(num)}, ${substring(num,num)}, or ${substring(num,num,expression)}")?;
    Ok(Call::Substring {
        head: input.value(0)?,
        tail: input.value_or(1, Expression::text("0"))?,
        source: input.value_or(2, Call::body())?,
    })
}

/// `[value,]marker`: the marker is the last argument
fn source_and_marker(input: &CallInput<'_>) -> ParseResult<(Expression, Expression)> {
    if input.arguments.len() == 2 {
        Ok((input.value(0)?, input.value(1)?))
    } else {
        Ok((Call::body(), input.value(0)?))
    }
}

fn substring_before(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(1..=2, "${substringBefore(exp)} or ${substringBefore(exp,exp)}")?;
    let (source, before) = source_and_marker(input)?;
    Ok(Call::SubstringBefore { source, before })
}

fn substring_after(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(1..=2, "${substringAfter(exp)} or ${substringAfter(exp,exp)}")?;
    let (source, after) = source_and_marker(input)?;
    Ok(Call::SubstringAfter { source, after })
}

fn substring_between(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(2..=3, "${substringBetween(after,before)} or ${substringBetween(exp,after,before)}")?;
    let (source, first) = if input.arguments.len() == 3 {
        (input.value(0)?, 1)
    } else {
        (Call::body(), 0)
    };
    Ok(Call::SubstringBetween {
        source,
        after: input.value(first)?,
        before: input.value(first + 1)?,
    })
}

fn trim(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(0..=1, "${trim()} or ${trim(exp)}")?;
    Ok(Call::Trim(input.value_or(0, Call::body())?))
}

fn size(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(0..=1, "${size()} or ${size(exp)}")?;
    Ok(Call::Size(input.value_or(0, Call::body())?))
}

fn random(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(1..=2, "${random(min,max)} or ${random(max)}")?;
    let (min, max) = if input.arguments.len() == 2 {
        (input.value(0)?, input.value(1)?)
    } else {
        (Expression::text("0"), input.value(0)?)
    };
    Ok(Call::Random { min, max })
}

fn skip(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(1..=1, "${skip(number)}")?;
    Ok(Call::Skip {
        count: input.value(0)?,
        source: Call::body(),
    })
}

fn collate(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(1..=1, "${collate(group)}")?;
    Ok(Call::Collate {
        size: input.value(0)?,
        source: Call::body(),
    })
}

fn join(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(0..=3, "${join(separator,prefix,expression)}")?;
    Ok(Call::Join {
        separator: input.literal(0).unwrap_or(",").to_string(),
        prefix: input
            .literal(1)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string),
        source: input.value_or(2, Call::body())?,
    })
}

fn iif(input: &CallInput<'_>) -> ParseResult<Call> {
    input.expect(3..=3, "${iif(predicate,trueExpression,falseExpression)}")?;
    let (position, condition) = input.arguments[0];
    Ok(Call::Iif {
        condition: input.compiler.condition(condition, position)?,
        when_true: input.value(1)?,
        when_false: input.value(2)?,
    })
}

fn list(input: &CallInput<'_>) -> ParseResult<Call> {
    let items = (0..input.arguments.len())
        .map(|i| input.value(i))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Call::List(items))
}

fn map(input: &CallInput<'_>) -> ParseResult<Call> {
    let count = input.arguments.len();
    if count % 2 == 1 {
        return Err(ParseError::syntax(
            format!("Map function must have an even number of values, was: {count} values."),
            input.position,
        ));
    }
    let pairs = (0..count)
        .step_by(2)
        .map(|i| Ok((input.value(i)?, input.value(i + 1)?)))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Call::Map(pairs))
}
