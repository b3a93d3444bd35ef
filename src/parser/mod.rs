//! Simple expression parser
//!
//! Compilation runs in layers: the [`tokenizer`] reads tokens from a
//! [`TokenRegistry`] snapshot, the [`scanner`] splits templates into
//! constants and functions, [`function`] compiles function text, and
//! [`predicate`] recognises comparisons. [`strategy`] ties these together
//! with the [`legacy`] parser.

#![warn(missing_docs)]

pub mod call;
pub mod date;
pub mod error;
pub mod function;
pub mod legacy;
pub mod path;
pub mod predicate;
pub mod registry;
pub mod scanner;
pub mod strategy;
pub mod token;
pub mod tokenizer;

pub use call::{ArgumentCompiler, LiteralArguments, is_call};
pub use error::{ParseError, ParseResult};
pub use function::{FunctionCompiler, FunctionResolver, if_starts_with_return_remainder};
pub use legacy::{LegacyStrategy, try_legacy_parse};
pub use predicate::parse_predicate;
pub use registry::{
    TokenRegistry, change_function_end_token, change_function_start_token, current_registry,
    replace_token_category, reset_token_registry,
};
pub use scanner::compile_template;
pub use strategy::{
    ParseEnvironment, ParseStrategy, PredicateStrategy, TemplateStrategy, compile_with,
    expression_strategies, predicate_strategies,
};
pub use token::{Token, TokenKind, TokenType};
pub use tokenizer::{Tokenizer, next_token};
