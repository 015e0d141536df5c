//! Serpent: an interpreter for a small dynamically-typed scripting language
//!
//! The language has indentation-based blocks, small integers that promote to
//! arbitrary precision longs, strings, tuples, lists, dicts, classes with
//! inheritance, functions with defaults and `*rest`/`**kwrest` parameters, and
//! string-typed exceptions.
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter (Environment + Object Model)
//! ```
//!
//! # Example
//!
//! ```
//! let mut session = serpent::Session::new();
//! session.evaluate("def f(a, b=2): return a * b").unwrap();
//! let value = session.evaluate("f(21), 2147483647 + 1").unwrap();
//! assert_eq!(value.repr(), "(42, 2147483648L)");
//! ```

pub mod ast;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod session;

pub use config::Config;
pub use diagnostics::{EvalError, SourceFile, SyntaxError};
pub use interp::{Exception, Value};
pub use session::Session;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Evaluate source text in a fresh session
pub fn evaluate(source: &str) -> Result<Value, EvalError> {
    Session::new().evaluate(source)
}
