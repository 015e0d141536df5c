//! Evaluation sessions
//!
//! A [`Session`] owns one interpreter and its global environment. Successive
//! calls to [`Session::evaluate`] see each other's global bindings.

use crate::config::Config;
use crate::diagnostics::{EvalError, SourceFile};
use crate::interp::{BuiltinModules, Interpreter, ModuleResolver, Value};
use crate::{lexer, parser};

pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_resolver(config, BuiltinModules)
    }

    /// Session whose `import` statements go to `resolver`
    pub fn with_resolver(config: Config, resolver: impl ModuleResolver + 'static) -> Self {
        Self {
            interpreter: Interpreter::new(config, Box::new(resolver)),
        }
    }

    /// Lex, parse and run `source` against the session globals
    pub fn evaluate(&mut self, source: &str) -> Result<Value, EvalError> {
        let file = SourceFile::new(self.interpreter.config().source_name.clone(), source);
        let tokens = lexer::lex_file(&file)?;
        tracing::debug!("Lexed {} tokens", tokens.len());
        let module = parser::parse(&tokens, &file)?;
        tracing::debug!("Parsed {} statements", module.body.len());
        self.interpreter.run(&module).map_err(EvalError::Raised)
    }

    /// Text written by `print` since the last call
    pub fn take_output(&mut self) -> String {
        self.interpreter.take_output()
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.interpreter.global(name)
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.interpreter.set_global(name, value);
    }

    pub fn config(&self) -> &Config {
        self.interpreter.config()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
