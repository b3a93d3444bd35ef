//! Abstract Syntax Tree (AST) definitions for Simple expressions
//!
//! The tree is produced by the [`parser`](crate::parser) and consumed by the
//! [`evaluator`](crate::evaluator). It carries no evaluation logic itself.

#![warn(missing_docs)]

mod call;
mod expression;
mod function;
mod operator;
mod path;

pub use call::*;
pub use expression::*;
pub use function::*;
pub use operator::*;
pub use path::*;
