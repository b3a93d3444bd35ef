// Error types for Simple expression evaluation

use crate::model::CoercionError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur during evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Value could not be converted
    #[error("Type error: {0}")]
    Coercion(#[from] CoercionError),

    /// Unrecognised function text that matched no header, property or body field
    #[error("Cannot resolve '{text}' against the message")]
    Unresolved {
        /// The function text
        text: String,
    },

    /// Type name that does not resolve
    #[error("Unknown type '{name}'")]
    UnknownType {
        /// Type name as written
        name: String,
    },

    /// A mandatory body was null
    #[error("Mandatory body of type {type_name} was null")]
    MandatoryBody {
        /// Requested type name
        type_name: String,
    },

    /// Property not found
    #[error("Property {property} not found on {type_name}")]
    PropertyNotFound {
        /// Property name
        property: String,
        /// Type of the value navigated
        type_name: String,
    },

    /// Navigation through a null value without `?`
    #[error("Cannot navigate '{path}' because a value along it is null")]
    NullNavigation {
        /// The accessor path
        path: String,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for list of size {size}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// List size
        size: usize,
    },

    /// Bean not registered
    #[error("No bean registered under '{name}'")]
    UnknownBean {
        /// Bean name
        name: String,
    },

    /// Bean invocation failed
    #[error("Bean '{name}' failed: {message}")]
    Bean {
        /// Bean name
        name: String,
        /// Failure description
        message: String,
    },

    /// Property placeholder not found
    #[error("Property with key [{key}] not found in properties from text: {text}")]
    PlaceholderNotFound {
        /// Placeholder key
        key: String,
        /// Function text
        text: String,
    },

    /// Date could not be produced
    #[error("Cannot evaluate date: {message}")]
    Date {
        /// Error message
        message: String,
    },

    /// A nested function rendered to text that does not compile
    #[error("Illegal syntax in nested function '{expression}': {message}")]
    DynamicSyntax {
        /// Rendered function text
        expression: String,
        /// Parser message
        message: String,
    },

    /// Invalid operation
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Error message
        message: String,
    },
}

impl EvaluationError {
    /// Create an invalid-operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        EvaluationError::InvalidOperation {
            message: message.into(),
        }
    }
}
