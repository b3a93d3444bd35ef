//! Built-in calls such as `${substring(1,2)}` or `${join(';')}`
//!
//! Arguments are expressions of their own and may embed functions, so calls
//! refer back into [`Expression`].

use super::expression::Expression;
use super::function::Function;
use std::fmt;

/// A built-in call and its compiled arguments.
///
/// Calls that operate on a value default to the message body when the value
/// argument is omitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `replace(from,to[,value])`: literal replacement of every occurrence
    Replace {
        /// Text to look for
        from: String,
        /// Replacement text
        to: String,
        /// The value to replace in
        source: Expression,
    },
    /// `substring(head[,tail[,value]])`: drop `head` characters from the
    /// start and `tail` from the end
    Substring {
        /// Characters dropped from the start
        head: Expression,
        /// Characters dropped from the end
        tail: Expression,
        /// The value to cut
        source: Expression,
    },
    /// `substringBefore([value,]text)`
    SubstringBefore {
        /// The value to search
        source: Expression,
        /// Marker text
        before: Expression,
    },
    /// `substringAfter([value,]text)`
    SubstringAfter {
        /// The value to search
        source: Expression,
        /// Marker text
        after: Expression,
    },
    /// `substringBetween([value,]after,before)`
    SubstringBetween {
        /// The value to search
        source: Expression,
        /// Opening marker
        after: Expression,
        /// Closing marker
        before: Expression,
    },
    /// `trim([value])`
    Trim(Expression),
    /// `size([value])`: elements of a list or map, characters of text
    Size(Expression),
    /// `random([min,]max)`: integer in `min..max`
    Random {
        /// Inclusive lower bound
        min: Expression,
        /// Exclusive upper bound
        max: Expression,
    },
    /// `skip(count)`: the body's items without the first `count`
    Skip {
        /// Number of items to drop
        count: Expression,
        /// The items
        source: Expression,
    },
    /// `collate(size)`: the body's items in groups of `size`
    Collate {
        /// Group size
        size: Expression,
        /// The items
        source: Expression,
    },
    /// `join([separator[,prefix[,value]]])`
    Join {
        /// Text between items, `,` by default
        separator: String,
        /// Text put in front of every item
        prefix: Option<String>,
        /// The items
        source: Expression,
    },
    /// `iif(predicate,whenTrue,whenFalse)`
    Iif {
        /// The condition
        condition: Expression,
        /// Value when the condition holds
        when_true: Expression,
        /// Value otherwise
        when_false: Expression,
    },
    /// `list(a,b,...)`
    List(Vec<Expression>),
    /// `map(k1,v1,k2,v2,...)`
    Map(Vec<(Expression, Expression)>),
}

impl Call {
    /// The expression used when the value argument is left out
    pub fn body() -> Expression {
        Expression::Function(Function::Body { path: None })
    }

    /// Name as written before the opening parenthesis
    pub fn name(&self) -> &'static str {
        match self {
            Call::Replace { .. } => "replace",
            Call::Substring { .. } => "substring",
            Call::SubstringBefore { .. } => "substringBefore",
            Call::SubstringAfter { .. } => "substringAfter",
            Call::SubstringBetween { .. } => "substringBetween",
            Call::Trim(_) => "trim",
            Call::Size(_) => "size",
            Call::Random { .. } => "random",
            Call::Skip { .. } => "skip",
            Call::Collate { .. } => "collate",
            Call::Join { .. } => "join",
            Call::Iif { .. } => "iif",
            Call::List(_) => "list",
            Call::Map(_) => "map",
        }
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[&dyn fmt::Display]) -> fmt::Result {
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{argument}")?;
    }
    Ok(())
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        match self {
            Call::Replace { from, to, source } => {
                write_arguments(f, &[from as &dyn fmt::Display, to, source])?
            }
            Call::Substring { head, tail, source } => {
                write_arguments(f, &[head as &dyn fmt::Display, tail, source])?
            }
            Call::SubstringBefore { source, before } => {
                write_arguments(f, &[source as &dyn fmt::Display, before])?
            }
            Call::SubstringAfter { source, after } => {
                write_arguments(f, &[source as &dyn fmt::Display, after])?
            }
            Call::SubstringBetween {
                source,
                after,
                before,
            } => write_arguments(f, &[source as &dyn fmt::Display, after, before])?,
            Call::Trim(source) | Call::Size(source) => write!(f, "{source}")?,
            Call::Random { min, max } => write_arguments(f, &[min as &dyn fmt::Display, max])?,
            Call::Skip { count, .. } => write!(f, "{count}")?,
            Call::Collate { size, .. } => write!(f, "{size}")?,
            Call::Join {
                separator,
                prefix,
                source,
            } => {
                let prefix = prefix.as_deref().unwrap_or("");
                write_arguments(f, &[separator as &dyn fmt::Display, &prefix, source])?
            }
            Call::Iif {
                condition,
                when_true,
                when_false,
            } => write_arguments(f, &[condition as &dyn fmt::Display, when_true, when_false])?,
            Call::List(items) => {
                let items: Vec<&dyn fmt::Display> =
                    items.iter().map(|i| i as &dyn fmt::Display).collect();
                write_arguments(f, &items)?;
            }
            Call::Map(pairs) => {
                let items: Vec<&dyn fmt::Display> = pairs
                    .iter()
                    .flat_map(|(k, v)| [k as &dyn fmt::Display, v as &dyn fmt::Display])
                    .collect();
                write_arguments(f, &items)?;
            }
        }
        write!(f, ")")
    }
}
