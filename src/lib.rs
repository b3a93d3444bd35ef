//! Simple expression language in Rust
//!
//! An embeddable expression and predicate language for message routing:
//! templates such as `Hello ${header.name}!`, predicates such as
//! `${header.priority} in 'high,urgent' && ${body.total} > 100`, a
//! reconfigurable tokenizer and a cache of compiled trees.
//!
//! ```rust
//! use simple_lang::{Message, SimpleLanguage};
//!
//! let language = SimpleLanguage::new();
//! let message = Message::new().with_body("World").with_header("lang", "en");
//!
//! let greeting = language.evaluate("Hello ${body}!", &message).unwrap();
//! assert_eq!(greeting.to_text(), "Hello World!");
//! assert!(language.matches("${header.lang} == 'en'", &message).unwrap());
//! ```

pub mod ast;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod extension;
pub mod model;
pub mod parser;
pub mod resource;

// Re-export main types
pub use ast::{Expression, Predicate};
pub use cache::CacheStats;
pub use config::LanguageConfig;
pub use engine::{SimpleLanguage, default_language, predicate, simple};
pub use error::{Result, SimpleError};
pub use evaluator::{
    Bean, EvaluationContext, EvaluationError, ExceptionInfo, FileInfo, Message,
};
pub use extension::FileFunctionResolver;
pub use model::{SimpleValue, ValueType};
pub use parser::{
    ParseError, TokenKind, TokenRegistry, change_function_end_token, change_function_start_token,
    reset_token_registry,
};
pub use resource::{FileResourceLoader, NoopResourceLoader, ResourceLoader};
