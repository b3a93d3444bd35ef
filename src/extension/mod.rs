//! Function extensions layered on top of the core language
//!
//! An extension is a [`FunctionResolver`](crate::parser::FunctionResolver)
//! registered with [`SimpleLanguage::with_resolver`](crate::SimpleLanguage::with_resolver).
//! Resolvers are consulted before the built-in function forms.

pub mod file;

pub use file::FileFunctionResolver;
