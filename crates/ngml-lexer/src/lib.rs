//! NGML Lexer
//!
//! Tokenizes NGML component source into a stream of tokens on demand.
//! The scanner carries an explicit stack of lexical modes so that the same
//! characters mean different things inside code, template bodies, HTML
//! tags, attribute values, and CSS blocks.
//!
//! # Example
//!
//! ```
//! use ngml_lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("class App {}");
//! assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Class);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::{Mode, Scanner};
pub use token::{Span, Token, TokenKind};

/// What went wrong while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedLiteral,
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("unterminated template or style body")]
    UnterminatedTemplate,
}

/// Lexer error with position information. Fatal to the current token
/// stream: the scanner cannot resynchronize mid-literal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}
