//! NGML Parser
//!
//! Parses NGML component source into a `Program` AST plus a list of
//! diagnostics. The parser drives the mode-stack scanner from `ngml-lexer`
//! directly, selecting the lexical mode for each backtick-delimited body
//! (template vs. CSS) as it goes.
//!
//! Parsing is best-effort: recoverable syntax errors become diagnostics
//! and parsing resumes at the next synchronizing token, so one invocation
//! can report several independent errors. The result always carries a
//! (possibly partial) AST; nothing panics on bad input.
//!
//! # Example
//!
//! ```
//! let result = ngml_parser::parse("@Component({ selector: 'x' }) class X {}");
//! assert!(result.diagnostics.is_empty());
//! assert_eq!(result.program.declarations.len(), 1);
//! ```

pub mod ast;
pub mod css;
pub mod expr;
pub mod parser;
pub mod template;

pub use ast::{Declaration, Program};
pub use parser::Parser;

use ngml_lexer::Span;

/// Parser error with position information. Internal parse functions
/// propagate this; recovery converts it into a [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn at(message: String, span: Span) -> Self {
        Self {
            message,
            line: span.line,
            column: span.column,
        }
    }
}

/// Diagnostic severity. This front end only emits errors; the enum keeps
/// the reporting surface open for later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A user-facing problem found while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {}",
            self.severity, self.line, self.column, self.message
        )
    }
}

/// The outcome of a parse: a best-effort AST and everything that went
/// wrong along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse one compilation unit.
pub fn parse(source: &str) -> ParseResult {
    Parser::parse(source)
}
