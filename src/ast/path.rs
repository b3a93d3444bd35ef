//! Accessor paths navigating into structured values
//!
//! A path such as `.address?.lines[last-1]` is a list of segments applied
//! in order to a root value (the body, a header, a property...).

use smallvec::SmallVec;
use std::fmt;

/// Key inside an index segment (`[...]`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Zero based list position, `[0]`
    Position(usize),
    /// Position counted back from the last element, `[last]` or `[last-2]`
    FromLast(usize),
    /// Map key, `[name]` or `['name']`
    Key(String),
}

/// One navigation step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named member, `.name`
    Property {
        /// Member name with getter prefixes kept as written
        name: String,
        /// Whether `?` preceded this step
        null_safe: bool,
    },
    /// Indexed member, `[key]`
    Index {
        /// The index key
        key: IndexKey,
        /// Whether `?` preceded this step
        null_safe: bool,
    },
}

impl PathSegment {
    /// Whether this step was marked null-safe with `?`
    pub fn is_null_safe(&self) -> bool {
        match self {
            PathSegment::Property { null_safe, .. } | PathSegment::Index { null_safe, .. } => {
                *null_safe
            }
        }
    }
}

/// A parsed accessor path together with its source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessPath {
    source: String,
    segments: SmallVec<[PathSegment; 4]>,
}

impl AccessPath {
    /// Create a path from parsed segments
    pub fn new(source: impl Into<String>, segments: SmallVec<[PathSegment; 4]>) -> Self {
        Self {
            source: source.into(),
            segments,
        }
    }

    /// The text the path was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Navigation steps in order
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Check if the path has no steps
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
