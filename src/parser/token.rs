//! Token categories and the tokens produced by the tokenizer

use std::fmt;
use std::sync::Arc;

/// Category of a recognised token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Space, tab, newline, carriage return or form feed
    Whitespace,
    /// `'`
    SingleQuote,
    /// `"`
    DoubleQuote,
    /// Opens an embedded function, `${` by default
    FunctionStart,
    /// Closes an embedded function, `}` by default
    FunctionEnd,
    /// `true` or `false`
    BooleanLiteral,
    /// `null`
    NullLiteral,
    /// The escape marker and the escape sequences it introduces
    Escape,
    /// A run of digits with at most one decimal separator
    NumericLiteral,
    /// Comparison operators such as `==` or `contains`
    BinaryOperator,
    /// `++` and `--`
    UnaryOperator,
    /// `&&` and `||`
    LogicalOperator,
    /// Any single character not otherwise recognised
    Character,
}

impl TokenKind {
    /// Check if this kind is one of the quote kinds
    pub fn is_quote(&self) -> bool {
        matches!(self, TokenKind::SingleQuote | TokenKind::DoubleQuote)
    }

    /// Check if this kind delimits an embedded function
    pub fn is_function_delimiter(&self) -> bool {
        matches!(self, TokenKind::FunctionStart | TokenKind::FunctionEnd)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::SingleQuote => "singleQuote",
            TokenKind::DoubleQuote => "doubleQuote",
            TokenKind::FunctionStart => "functionStart",
            TokenKind::FunctionEnd => "functionEnd",
            TokenKind::BooleanLiteral => "booleanValue",
            TokenKind::NullLiteral => "nullValue",
            TokenKind::Escape => "escape",
            TokenKind::NumericLiteral => "numericValue",
            TokenKind::BinaryOperator => "binaryOperator",
            TokenKind::UnaryOperator => "unaryOperator",
            TokenKind::LogicalOperator => "logicalOperator",
            TokenKind::Character => "character",
        };
        write!(f, "{name}")
    }
}

/// A registered token: a category paired with its literal text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenType {
    kind: TokenKind,
    text: Arc<str>,
}

impl TokenType {
    /// Create a token type
    pub fn new(kind: TokenKind, text: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Category of this token type
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Literal text matched for this token type
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.text)
    }
}

/// A token found in a source string.
///
/// `index` and `length` are byte offsets into the source; `text` is the
/// semantic text, which differs from the source slice for escape
/// sequences (`\n` in the source yields a newline here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Category of the token
    pub kind: TokenKind,
    /// Semantic text of the token
    pub text: &'a str,
    /// Byte offset of the token in the source
    pub index: usize,
    /// Number of source bytes consumed
    pub length: usize,
}

impl<'a> Token<'a> {
    /// Byte offset just past this token
    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Check the token category
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
