//! Diagnostic reporting with source locations
//!
//! Front-end failures are reported as [`SyntaxError`] diagnostics carrying
//! the offending source; everything that reaches the host from a session is
//! an [`EvalError`].

use crate::common::Span;
use crate::interp::Exception;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }

    /// 1-based line and column of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let before = &self.content[..offset];
        let line = before.matches('\n').count() + 1;
        let col = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, col)
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Lexer and parser failure
///
/// These are never visible to guest code: a `try` statement cannot catch
/// them because they happen before evaluation starts.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SyntaxError {
    #[error("invalid token `{text}`")]
    #[diagnostic(code(syntax::invalid_token))]
    InvalidToken {
        text: String,
        #[label("not a valid token")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("unterminated string literal")]
    #[diagnostic(code(syntax::unterminated_string))]
    UnterminatedString {
        #[label("string starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("unexpected token: expected {expected}, found {found}")]
    #[diagnostic(code(syntax::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("unindent does not match any outer indentation level")]
    #[diagnostic(code(syntax::inconsistent_dedent))]
    InconsistentDedent {
        #[label("this line")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("can't assign to {what}")]
    #[diagnostic(
        code(syntax::invalid_target),
        help("assignment targets are names, subscripts, slices, attributes or tuples/lists of targets")
    )]
    InvalidTarget {
        what: String,
        #[label("not assignable")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("'{keyword}' outside {context}")]
    #[diagnostic(code(syntax::outside_context))]
    OutsideContext {
        keyword: String,
        context: String,
        #[label("not allowed here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("too many nested expressions or blocks (limit {limit})")]
    #[diagnostic(code(syntax::too_deeply_nested))]
    TooDeeplyNested {
        limit: usize,
        #[label("nesting limit reached here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("invalid literal `{text}`: {reason}")]
    #[diagnostic(code(syntax::invalid_literal))]
    InvalidLiteral {
        text: String,
        reason: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl SyntaxError {
    /// Byte offset the diagnostic points at
    pub fn offset(&self) -> usize {
        let span = match self {
            SyntaxError::InvalidToken { span, .. }
            | SyntaxError::UnterminatedString { span, .. }
            | SyntaxError::UnexpectedToken { span, .. }
            | SyntaxError::InconsistentDedent { span, .. }
            | SyntaxError::InvalidTarget { span, .. }
            | SyntaxError::OutsideContext { span, .. }
            | SyntaxError::TooDeeplyNested { span, .. }
            | SyntaxError::InvalidLiteral { span, .. } => span,
        };
        span.offset()
    }
}

/// Failure of `Session::evaluate`
#[derive(Error, Debug, Diagnostic)]
pub enum EvalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    /// A guest exception nobody caught
    #[error("uncaught exception {0}")]
    #[diagnostic(code(runtime::uncaught))]
    Raised(Exception),
}

impl EvalError {
    /// The guest exception, if this is one
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            EvalError::Raised(exc) => Some(exc),
            EvalError::Syntax(_) => None,
        }
    }

    /// Type-name string of the failure; syntax errors report `SyntaxError`
    pub fn kind(&self) -> &str {
        match self {
            EvalError::Raised(exc) => &exc.kind,
            EvalError::Syntax(_) => "SyntaxError",
        }
    }
}
