//! Accessor path parsing
//!
//! Grammar, informally:
//!
//! ```text
//! path     := head? step*
//! head     := identifier
//! step     := '?'? ( '.' identifier ( '()' )? | '[' key ']' )
//! key      := 'last' ( '-' digits )? | digits | quoted | text
//! ```

use super::error::{ParseError, ParseResult};
use crate::ast::{AccessPath, IndexKey, PathSegment};
use smallvec::SmallVec;
use unicode_xid::UnicodeXID;

/// Parse an accessor path such as `.address?.lines[last-1]`.
///
/// When `allow_head` is set the path may start with a bare identifier
/// (`foo.bar`), which is how unrecognised function text is read.
/// `position` is the offset of `text` in the original source and is used
/// for error reporting only.
pub fn parse_access_path(text: &str, position: usize, allow_head: bool) -> ParseResult<AccessPath> {
    let mut segments: SmallVec<[PathSegment; 4]> = SmallVec::new();
    let mut pos = 0;
    let mut null_safe = false;

    while pos < text.len() {
        let rest = &text[pos..];
        let Some(current) = rest.chars().next() else {
            break;
        };
        match current {
            '?' => {
                if null_safe || !matches!(rest[1..].chars().next(), Some('.') | Some('[')) {
                    return Err(invalid(text, position + pos, "'?' must precede '.' or '['"));
                }
                null_safe = true;
                pos += 1;
            }
            '.' => {
                let (name, consumed) = read_member(&rest[1..])
                    .ok_or_else(|| invalid(text, position + pos, "expected a member name"))?;
                segments.push(PathSegment::Property {
                    name: name.to_string(),
                    null_safe: std::mem::take(&mut null_safe),
                });
                pos += 1 + consumed;
            }
            '[' => {
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid(text, position + pos, "missing ']'"))?;
                let key = parse_index_key(&rest[1..close])
                    .ok_or_else(|| invalid(text, position + pos, "invalid index"))?;
                segments.push(PathSegment::Index {
                    key,
                    null_safe: std::mem::take(&mut null_safe),
                });
                pos += close + 1;
            }
            _ if pos == 0 && allow_head => {
                let (name, consumed) = read_member(rest)
                    .ok_or_else(|| invalid(text, position, "expected a member name"))?;
                segments.push(PathSegment::Property {
                    name: name.to_string(),
                    null_safe: false,
                });
                pos += consumed;
            }
            other => {
                return Err(invalid(
                    text,
                    position + pos,
                    &format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    if null_safe {
        return Err(invalid(text, position + text.len(), "dangling '?'"));
    }
    if segments.is_empty() {
        return Err(invalid(text, position, "empty path"));
    }
    Ok(AccessPath::new(text, segments))
}

/// Read an identifier, optionally followed by `()`, returning the name and
/// the number of bytes consumed.
fn read_member(text: &str) -> Option<(&str, usize)> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !(UnicodeXID::is_xid_start(first) || first == '_' || first == '$') {
        return None;
    }
    let end = chars
        .find(|(_, c)| !(UnicodeXID::is_xid_continue(*c) || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let name = &text[..end];
    let consumed = if text[end..].starts_with("()") {
        end + 2
    } else {
        end
    };
    Some((name, consumed))
}

fn parse_index_key(raw: &str) -> Option<IndexKey> {
    let key = raw.trim();
    if key.is_empty() {
        return None;
    }
    if let Some(unquoted) = unquote(key) {
        return Some(IndexKey::Key(unquoted.to_string()));
    }
    if let Some(after_last) = key.strip_prefix("last") {
        let after_last = after_last.trim_start();
        if after_last.is_empty() {
            return Some(IndexKey::FromLast(0));
        }
        if let Some(offset) = after_last.strip_prefix('-') {
            return offset.trim().parse().ok().map(IndexKey::FromLast);
        }
    }
    if let Ok(position) = key.parse::<usize>() {
        return Some(IndexKey::Position(position));
    }
    Some(IndexKey::Key(key.to_string()))
}

/// Strip one level of matching single or double quotes
pub(crate) fn unquote(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

fn invalid(text: &str, position: usize, reason: &str) -> ParseError {
    ParseError::syntax(format!("Invalid accessor path '{text}': {reason}"), position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn property(name: &str, null_safe: bool) -> PathSegment {
        PathSegment::Property {
            name: name.to_string(),
            null_safe,
        }
    }

    #[test]
    fn test_dotted_members() {
        let path = parse_access_path(".friend?.friend.name", 0, false).unwrap();
        assert_eq!(
            path.segments(),
            &[
                property("friend", false),
                property("friend", true),
                property("name", false),
            ]
        );
        assert_eq!(path.source(), ".friend?.friend.name");
    }

    #[test]
    fn test_index_keys() {
        let path = parse_access_path("[0][last][last - 2]['a.b'][foo.bar]", 0, false).unwrap();
        let keys: Vec<_> = path
            .segments()
            .iter()
            .map(|s| match s {
                PathSegment::Index { key, .. } => key.clone(),
                _ => panic!("expected index"),
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                IndexKey::Position(0),
                IndexKey::FromLast(0),
                IndexKey::FromLast(2),
                IndexKey::Key("a.b".to_string()),
                IndexKey::Key("foo.bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_head_and_getters() {
        let path = parse_access_path("order.getId()", 5, true).unwrap();
        assert_eq!(path.segments(), &[property("order", false), property("getId", false)]);
        assert!(parse_access_path("order", 0, false).is_err());
    }

    #[test]
    fn test_invalid_paths() {
        assert!(parse_access_path("", 0, true).is_err());
        assert!(parse_access_path(".", 0, false).is_err());
        assert!(parse_access_path("[0", 0, false).is_err());
        assert!(parse_access_path("[last - x]", 0, false).is_err());
        assert!(parse_access_path(".a?", 0, false).is_err());
        let err = parse_access_path("hello world", 10, true).unwrap_err();
        assert_eq!(err.position(), 15);
    }
}
