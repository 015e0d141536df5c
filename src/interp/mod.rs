//! Tree-walking interpreter

pub mod builtins;
pub mod env;
pub mod eval;
pub mod int;
pub mod ops;
pub mod value;

pub use builtins::{Builtin, BuiltinModules, ModuleResolver};
pub use env::Environment;
pub use eval::Interpreter;
pub use int::Int;
pub use value::{ControlFlow, Dict, Exception, Module, Namespace, Value};
