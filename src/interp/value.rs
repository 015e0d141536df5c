//! Runtime values for the interpreter
//!
//! Everything except integers and `None` lives behind an `Rc`, so cloning a
//! `Value` copies a reference and `is` can compare pointers. Lists, dicts,
//! classes, instances and modules use interior mutability.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use super::builtins::Builtin;
use super::int::Int;
use crate::ast::FunctionDef;
use crate::common::ensure_stack;

/// Containers nested deeper than this print as `...`
pub const MAX_PRINT_DEPTH: usize = 400;

/// Attribute table and scope storage
pub type Namespace = FxHashMap<Rc<str>, Value>;

/// Runtime value
#[derive(Clone)]
pub enum Value {
    None,
    Int(Int),
    Str(Rc<str>),
    Tuple(Rc<[Value]>),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Function(Rc<Function>),
    Method(Rc<Method>),
    Builtin(Builtin),
    Module(Rc<Module>),
}

impl Value {
    pub fn int(n: impl Into<Int>) -> Value {
        Value::Int(n.into())
    }

    /// Canonical truth value `1` or `0`
    pub fn bool(b: bool) -> Value {
        Value::Int(Int::Small(i32::from(b)))
    }

    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::from(items))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(dict: Dict) -> Value {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    /// Get the type name of this value, as reported by `type()`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Int(Int::Small(_)) => "int",
            Value::Int(Int::Long(_)) => "long",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Function(_) => "function",
            Value::Method(_) => "instance method",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Module(_) => "module",
        }
    }

    /// Truth value without consulting instance hooks
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Int(n) => !n.is_zero(),
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<&Int> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Address of the heap object, if any
    fn address(&self) -> Option<usize> {
        let ptr = match self {
            Value::Str(s) => Rc::as_ptr(s) as *const u8 as usize,
            Value::Tuple(t) => Rc::as_ptr(t) as *const u8 as usize,
            Value::List(l) => Rc::as_ptr(l) as usize,
            Value::Dict(d) => Rc::as_ptr(d) as usize,
            Value::Class(c) => Rc::as_ptr(c) as usize,
            Value::Instance(i) => Rc::as_ptr(i) as usize,
            Value::Function(f) => Rc::as_ptr(f) as usize,
            Value::Method(m) => Rc::as_ptr(m) as usize,
            Value::Module(m) => Rc::as_ptr(m) as usize,
            Value::None | Value::Int(_) | Value::Builtin(_) => return None,
        };
        Some(ptr)
    }

    /// Reference identity (`is`)
    ///
    /// Integers, `None` and built-in functions have no heap identity; they
    /// are identical when they are the same value of the same kind.
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => match (self.address(), other.address()) {
                (Some(a), Some(b)) => a == b && self.type_name() == other.type_name(),
                _ => false,
            },
        }
    }

    /// Structural equality (`==`)
    pub fn equals(&self, other: &Value) -> bool {
        self.eq_guarded(other, &mut Vec::new())
    }

    /// Pairs already under comparison are assumed equal, which keeps
    /// self-referential containers from recursing forever.
    fn eq_guarded(&self, other: &Value, active: &mut Vec<(usize, usize)>) -> bool {
        ensure_stack(|| self.eq_inner(other, active))
    }

    fn eq_inner(&self, other: &Value, active: &mut Vec<(usize, usize)>) -> bool {
        if self.is(other) {
            return true;
        }
        let pair = (self.address().unwrap_or(0), other.address().unwrap_or(0));
        if active.contains(&pair) {
            return true;
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp_value(b) == Ordering::Equal,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b, pair, active),
            (Value::List(a), Value::List(b)) => {
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                seq_eq(&a, &b, pair, active)
            }
            (Value::Dict(a), Value::Dict(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return false;
                }
                let entries: Vec<_> = a.items().collect();
                active.push(pair);
                let equal = entries.into_iter().all(|(key, value)| {
                    HashKey::from_value(&key)
                        .ok()
                        .and_then(|k| b.get(&k).cloned())
                        .is_some_and(|other| value.eq_guarded(&other, active))
                });
                active.pop();
                equal
            }
            _ => false,
        }
    }

    /// Total ordering used by `<`, `cmp()` and friends
    ///
    /// Integers compare numerically, strings, tuples and lists
    /// lexicographically. Values of different kinds order by type name;
    /// anything else falls back to the object address. Like equality, a
    /// pair of containers met again while it is being compared counts as
    /// equal.
    pub fn compare(&self, other: &Value) -> Ordering {
        self.cmp_guarded(other, &mut Vec::new())
    }

    fn cmp_guarded(&self, other: &Value, active: &mut Vec<(usize, usize)>) -> Ordering {
        ensure_stack(|| self.cmp_inner(other, active))
    }

    fn cmp_inner(&self, other: &Value, active: &mut Vec<(usize, usize)>) -> Ordering {
        let pair = (self.address().unwrap_or(0), other.address().unwrap_or(0));
        if active.contains(&pair) {
            return Ordering::Equal;
        }
        if self.equals(other) {
            return Ordering::Equal;
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp_value(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => seq_cmp(a, b, pair, active),
            (Value::List(a), Value::List(b)) => {
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                seq_cmp(&a, &b, pair, active)
            }
            (Value::Dict(a), Value::Dict(b)) => a
                .borrow()
                .len()
                .cmp(&b.borrow().len())
                .then_with(|| self.address().cmp(&other.address())),
            _ => {
                let (a, b) = (self.type_name(), other.type_name());
                if a == b {
                    self.address().cmp(&other.address())
                } else {
                    a.cmp(b)
                }
            }
        }
    }

    /// Printed form, as produced by backquotes and `repr()`
    pub fn repr(&self) -> String {
        let mut plain = |_: &Rc<Instance>| Ok::<Option<String>, Infallible>(None);
        match Printer::new(&mut plain).repr(self) {
            Ok(s) => s,
            Err(never) => match never {},
        }
    }

    /// Informal string form: strings print their contents, the rest their repr
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }
}

fn seq_eq(
    a: &[Value],
    b: &[Value],
    pair: (usize, usize),
    active: &mut Vec<(usize, usize)>,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    active.push(pair);
    let equal = a.iter().zip(b).all(|(x, y)| x.eq_guarded(y, active));
    active.pop();
    equal
}

fn seq_cmp(
    a: &[Value],
    b: &[Value],
    pair: (usize, usize),
    active: &mut Vec<(usize, usize)>,
) -> Ordering {
    active.push(pair);
    let order = a
        .iter()
        .zip(b)
        .map(|(x, y)| x.cmp_guarded(y, active))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()));
    active.pop();
    order
}

/// Quote a string the way the printed form shows it
///
/// Single quotes unless the text contains a single quote and no double
/// quote; control characters are escaped.
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Printed-form writer
///
/// `hook` gets a chance to render instances (the interpreter uses it for
/// `__repr__`); returning `None` selects the default `<C instance>` form.
/// Containers already being printed show as `[...]` or `{...}`, and
/// anything nested deeper than [`MAX_PRINT_DEPTH`] as `...`.
pub struct Printer<'h, E> {
    active: Vec<usize>,
    depth: usize,
    hook: &'h mut dyn FnMut(&Rc<Instance>) -> Result<Option<String>, E>,
}

impl<'h, E> Printer<'h, E> {
    pub fn new(hook: &'h mut dyn FnMut(&Rc<Instance>) -> Result<Option<String>, E>) -> Self {
        Self {
            active: Vec::new(),
            depth: 0,
            hook,
        }
    }

    pub fn repr(&mut self, value: &Value) -> Result<String, E> {
        let mut out = String::new();
        self.write(value, &mut out)?;
        Ok(out)
    }

    fn write(&mut self, value: &Value, out: &mut String) -> Result<(), E> {
        if self.depth >= MAX_PRINT_DEPTH {
            out.push_str("...");
            return Ok(());
        }
        self.depth += 1;
        let result = ensure_stack(|| self.write_value(value, out));
        self.depth -= 1;
        result
    }

    fn write_value(&mut self, value: &Value, out: &mut String) -> Result<(), E> {
        match value {
            Value::None => out.push_str("None"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Str(s) => out.push_str(&quote_str(s)),
            Value::Tuple(items) => {
                out.push('(');
                self.write_items(items, out)?;
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::List(list) => {
                let addr = Rc::as_ptr(list) as usize;
                if self.active.contains(&addr) {
                    out.push_str("[...]");
                    return Ok(());
                }
                self.active.push(addr);
                let items = list.borrow().clone();
                out.push('[');
                let result = self.write_items(&items, out);
                out.push(']');
                self.active.pop();
                result?;
            }
            Value::Dict(dict) => {
                let addr = Rc::as_ptr(dict) as usize;
                if self.active.contains(&addr) {
                    out.push_str("{...}");
                    return Ok(());
                }
                self.active.push(addr);
                let entries: Vec<_> = dict.borrow().items().collect();
                out.push('{');
                let result = self.write_entries(&entries, out);
                out.push('}');
                self.active.pop();
                result?;
            }
            Value::Class(class) => out.push_str(&format!("<class {}>", class.name)),
            Value::Instance(instance) => match (self.hook)(instance)? {
                Some(text) => out.push_str(&text),
                None => out.push_str(&format!("<{} instance>", instance.class.name)),
            },
            Value::Function(func) => out.push_str(&format!("<function {}>", func.name)),
            Value::Method(method) => match &method.receiver {
                Some(_) => out.push_str(&format!(
                    "<method {}.{} of {} instance>",
                    method.class.name, method.function.name, method.class.name
                )),
                None => out.push_str(&format!(
                    "<unbound method {}.{}>",
                    method.class.name, method.function.name
                )),
            },
            Value::Builtin(builtin) => {
                out.push_str(&format!("<built-in function {}>", builtin.name()))
            }
            Value::Module(module) => {
                if module.builtin {
                    out.push_str(&format!("<module '{}' (built-in)>", module.name));
                } else {
                    out.push_str(&format!("<module '{}'>", module.name));
                }
            }
        }
        Ok(())
    }

    fn write_entries(&mut self, entries: &[(Value, Value)], out: &mut String) -> Result<(), E> {
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write(key, out)?;
            out.push_str(": ");
            self.write(value, out)?;
        }
        Ok(())
    }

    fn write_items(&mut self, items: &[Value], out: &mut String) -> Result<(), E> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write(item, out)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl From<Int> for Value {
    fn from(n: Int) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

// ==================== DICTIONARIES ====================

/// Hashable projection of a value
///
/// Integers hash by numeric value, so `1` and `1L` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(BigInt),
    Str(Rc<str>),
    Tuple(Vec<HashKey>),
}

impl HashKey {
    pub fn from_value(value: &Value) -> Result<HashKey, Exception> {
        match value {
            Value::Int(n) => Ok(HashKey::Int(n.to_bigint())),
            Value::Str(s) => Ok(HashKey::Str(s.clone())),
            Value::Tuple(items) => items
                .iter()
                .map(HashKey::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(HashKey::Tuple),
            other => Err(Exception::type_error(format!(
                "unhashable type: '{}'",
                other.type_name()
            ))),
        }
    }
}

/// Mapping storage; iteration follows insertion order
#[derive(Clone, Default)]
pub struct Dict {
    entries: IndexMap<HashKey, (Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &HashKey) -> Option<&Value> {
        self.entries.get(key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &HashKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace; a replaced entry keeps its original key object
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), Exception> {
        let hash = HashKey::from_value(&key)?;
        match self.entries.get_mut(&hash) {
            Some(entry) => entry.1 = value,
            None => {
                self.entries.insert(hash, (key, value));
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &HashKey) -> Option<Value> {
        self.entries.shift_remove(key).map(|(_, v)| v)
    }

    pub fn items(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries.values().map(|(k, v)| (k.clone(), v.clone()))
    }
}

// ==================== OBJECTS ====================

/// User-defined class
pub struct Class {
    pub name: Rc<str>,
    pub bases: Vec<Rc<Class>>,
    pub dict: RefCell<Namespace>,
}

impl Class {
    pub fn new(name: &str, bases: Vec<Rc<Class>>, dict: Namespace) -> Self {
        Self {
            name: Rc::from(name),
            bases,
            dict: RefCell::new(dict),
        }
    }

    /// Find an attribute on this class or its bases
    ///
    /// Depth-first, bases in declaration order, first match wins.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.dict.borrow().get(name) {
            return Some(value.clone());
        }
        let mut pending: Vec<&Class> = self.bases.iter().rev().map(|b| b.as_ref()).collect();
        while let Some(class) = pending.pop() {
            if let Some(value) = class.dict.borrow().get(name) {
                return Some(value.clone());
            }
            pending.extend(class.bases.iter().rev().map(|b| b.as_ref()));
        }
        None
    }

    /// True if `self` is `other` or inherits from it
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut pending: Vec<&Class> = vec![self];
        while let Some(class) = pending.pop() {
            if std::ptr::eq(class, other) {
                return true;
            }
            pending.extend(class.bases.iter().map(|b| b.as_ref()));
        }
        false
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub dict: RefCell<Namespace>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            dict: RefCell::new(Namespace::default()),
        }
    }
}

/// A `def` or `lambda` together with its evaluated defaults
pub struct Function {
    pub name: Rc<str>,
    pub def: Rc<FunctionDef>,
    /// One entry per positional parameter, evaluated at definition time
    pub defaults: Vec<Option<Value>>,
    /// Scope the function was defined in
    pub globals: Rc<RefCell<Namespace>>,
}

impl Function {
    /// Bind call arguments to parameter names
    ///
    /// Positional arguments fill parameters left to right, then keywords by
    /// name, then defaults. Leftovers go to `*rest` and `**kwrest` when they
    /// are declared.
    pub fn bind(
        &self,
        args: Vec<Value>,
        kwargs: Vec<(Rc<str>, Value)>,
    ) -> Result<Namespace, Exception> {
        let params = &self.def.params;
        let given = args.len();
        let mut slots: Vec<Option<Value>> = vec![None; params.positional.len()];
        let mut args = args.into_iter();
        for slot in slots.iter_mut() {
            match args.next() {
                Some(arg) => *slot = Some(arg),
                None => break,
            }
        }
        let surplus: Vec<Value> = args.collect();
        if !surplus.is_empty() && params.rest.is_none() {
            return Err(Exception::type_error(format!(
                "{}() takes at most {} argument(s) ({} given)",
                self.name,
                params.positional.len(),
                given
            )));
        }

        let mut extra = Dict::new();
        for (name, value) in kwargs {
            match params.positional.iter().position(|p| *p.name == *name) {
                Some(i) if slots[i].is_some() => {
                    return Err(Exception::type_error(format!(
                        "{}() got multiple values for argument '{}'",
                        self.name, name
                    )));
                }
                Some(i) => slots[i] = Some(value),
                None if params.kwrest.is_some() => {
                    let key = Value::Str(name.clone());
                    if extra.contains(&HashKey::Str(name.clone())) {
                        return Err(Exception::type_error(format!(
                            "{}() got multiple values for keyword '{}'",
                            self.name, name
                        )));
                    }
                    extra.insert(key, value)?;
                }
                None => {
                    return Err(Exception::type_error(format!(
                        "{}() got an unexpected keyword argument '{}'",
                        self.name, name
                    )));
                }
            }
        }

        let mut locals = Namespace::default();
        for ((param, slot), default) in params.positional.iter().zip(slots).zip(&self.defaults) {
            let value = match slot.or_else(|| default.clone()) {
                Some(value) => value,
                None => {
                    let required = self.defaults.iter().filter(|d| d.is_none()).count();
                    return Err(Exception::type_error(format!(
                        "{}() takes at least {} argument(s) ({} given)",
                        self.name, required, given
                    )));
                }
            };
            locals.insert(Rc::from(param.name.as_str()), value);
        }
        if let Some(rest) = &params.rest {
            locals.insert(Rc::from(rest.as_str()), Value::tuple(surplus));
        }
        if let Some(kwrest) = &params.kwrest {
            locals.insert(Rc::from(kwrest.as_str()), Value::dict(extra));
        }
        Ok(locals)
    }
}

/// A function reached through a class, with or without a receiver
pub struct Method {
    pub function: Rc<Function>,
    /// `Some` for bound methods
    pub receiver: Option<Value>,
    pub class: Rc<Class>,
}

/// Module object handed out by a module resolver
pub struct Module {
    pub name: Rc<str>,
    pub dict: RefCell<Namespace>,
    /// Supplied by the host rather than loaded from source
    pub builtin: bool,
}

impl Module {
    pub fn new(name: &str, builtin: bool) -> Self {
        let mut dict = Namespace::default();
        dict.insert(Rc::from("__name__"), Value::str(name));
        Self {
            name: Rc::from(name),
            dict: RefCell::new(dict),
            builtin,
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.dict.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.dict.borrow_mut().insert(Rc::from(name), value);
    }
}

// ==================== SIGNALS ====================

/// A raised guest exception: a type-name string plus a payload
#[derive(Debug, Clone)]
pub struct Exception {
    pub kind: Rc<str>,
    pub payload: Value,
}

impl Exception {
    pub fn new(kind: &str, payload: Value) -> Self {
        Self {
            kind: Rc::from(kind),
            payload,
        }
    }

    fn message(kind: &str, msg: impl Into<String>) -> Self {
        Self::new(kind, Value::str(&msg.into()))
    }

    pub fn name_error(name: &str) -> Self {
        Self::new("NameError", Value::str(name))
    }

    pub fn attribute_error(name: &str) -> Self {
        Self::new("AttributeError", Value::str(name))
    }

    pub fn key_error(key: Value) -> Self {
        Self::new("KeyError", key)
    }

    pub fn import_error(name: &str) -> Self {
        Self::new("ImportError", Value::str(name))
    }

    pub fn index_error(msg: impl Into<String>) -> Self {
        Self::message("IndexError", msg)
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::message("TypeError", msg)
    }

    pub fn value_error(msg: impl Into<String>) -> Self {
        Self::message("ValueError", msg)
    }

    pub fn zero_division(msg: impl Into<String>) -> Self {
        Self::message("ZeroDivisionError", msg)
    }

    pub fn overflow_error(msg: impl Into<String>) -> Self {
        Self::message("OverflowError", msg)
    }

    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::message("RuntimeError", msg)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Value::None => write!(f, "{}", self.kind),
            payload => write!(f, "{}: {}", self.kind, payload.to_str()),
        }
    }
}

/// Control flow signal threaded through statement execution
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Return from function with value
    Return(Value),
    /// Break from the innermost loop
    Break,
    /// Continue to next iteration
    Continue,
    /// Exception propagating to the nearest handler
    Raise(Exception),
}

impl From<Exception> for ControlFlow {
    fn from(exc: Exception) -> Self {
        ControlFlow::Raise(exc)
    }
}
