//! Variable environment
//!
//! Two levels: the module globals and, while a function or class body runs,
//! a frame of locals. Names declared `global` in a frame bypass its locals
//! for reads, writes and deletes.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::value::{Exception, Namespace, Value};

/// Local scope of a running function or class body
pub struct Frame {
    locals: Namespace,
    declared_global: FxHashSet<Rc<str>>,
    globals: Rc<RefCell<Namespace>>,
}

impl Frame {
    pub fn new(globals: Rc<RefCell<Namespace>>, locals: Namespace) -> Self {
        Self {
            locals,
            declared_global: FxHashSet::default(),
            globals,
        }
    }

    /// Take the locals, e.g. to become a class dictionary
    pub fn into_locals(self) -> Namespace {
        self.locals
    }
}

/// Scope chain for one session
pub struct Environment {
    globals: Rc<RefCell<Namespace>>,
    builtins: Namespace,
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new(builtins: Namespace) -> Self {
        Self {
            globals: Rc::new(RefCell::new(Namespace::default())),
            builtins,
            frames: Vec::new(),
        }
    }

    /// Globals of the code currently running
    pub fn current_globals(&self) -> Rc<RefCell<Namespace>> {
        match self.frames.last() {
            Some(frame) => frame.globals.clone(),
            None => self.globals.clone(),
        }
    }

    /// The session's module globals
    pub fn module_globals(&self) -> &Rc<RefCell<Namespace>> {
        &self.globals
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Read a name: locals, then globals, then built-ins
    pub fn lookup(&self, name: &str) -> Result<Value, Exception> {
        if let Some(frame) = self.frames.last() {
            if !frame.declared_global.contains(name) {
                if let Some(value) = frame.locals.get(name) {
                    return Ok(value.clone());
                }
            }
        }
        if let Some(value) = self.current_globals().borrow().get(name) {
            return Ok(value.clone());
        }
        self.builtins
            .get(name)
            .cloned()
            .ok_or_else(|| Exception::name_error(name))
    }

    /// Bind a name in the scope a write goes to
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) if !frame.declared_global.contains(name) => {
                frame.locals.insert(Rc::from(name), value);
            }
            _ => {
                self.current_globals()
                    .borrow_mut()
                    .insert(Rc::from(name), value);
            }
        }
    }

    /// Unbind a name; unbound names raise NameError
    pub fn delete(&mut self, name: &str) -> Result<(), Exception> {
        let removed = match self.frames.last_mut() {
            Some(frame) if !frame.declared_global.contains(name) => {
                frame.locals.remove(name).is_some()
            }
            _ => self.current_globals().borrow_mut().remove(name).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(Exception::name_error(name))
        }
    }

    /// `global` statement; a no-op at module level
    pub fn declare_global(&mut self, names: &[String]) {
        if let Some(frame) = self.frames.last_mut() {
            frame
                .declared_global
                .extend(names.iter().map(|n| Rc::from(n.as_str())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        let mut builtins = Namespace::default();
        builtins.insert(Rc::from("len"), Value::str("builtin"));
        Environment::new(builtins)
    }

    #[test]
    fn test_locals_shadow_globals() {
        let mut env = env();
        env.assign("g", Value::int(1));
        let globals = env.current_globals();
        env.push_frame(Frame::new(globals, Namespace::default()));
        env.assign("g", Value::int(2));
        assert!(env.lookup("g").unwrap().equals(&Value::int(2)));
        env.pop_frame();
        assert!(env.lookup("g").unwrap().equals(&Value::int(1)));
    }

    #[test]
    fn test_declared_global_writes_through() {
        let mut env = env();
        let globals = env.current_globals();
        env.push_frame(Frame::new(globals, Namespace::default()));
        env.declare_global(&["g".to_string()]);
        env.assign("g", Value::int(3));
        env.pop_frame();
        assert!(env.lookup("g").unwrap().equals(&Value::int(3)));
    }

    #[test]
    fn test_delete_unbound_is_name_error() {
        let mut env = env();
        let err = env.delete("missing").unwrap_err();
        assert_eq!(&*err.kind, "NameError");
        assert_eq!(err.payload.as_str(), Some("missing"));
    }

    #[test]
    fn test_builtins_are_last() {
        let mut env = env();
        assert_eq!(env.lookup("len").unwrap().as_str(), Some("builtin"));
        env.assign("len", Value::int(0));
        assert!(env.lookup("len").unwrap().equals(&Value::int(0)));
    }
}
