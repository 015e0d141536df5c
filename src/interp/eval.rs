//! Tree-walking interpreter
//!
//! Statements execute to `Result<(), ControlFlow>`; `return`, `break`,
//! `continue` and raised exceptions travel up as the error side until a
//! loop, function call or `try` statement consumes them.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{self, Arg, CompareOp, ExprKind, ImportNames, StmtKind, Target, TryStmt};
use crate::common::ensure_stack;
use crate::config::Config;

use super::builtins::{ModuleResolver, builtin_namespace};
use super::env::{Environment, Frame};
use super::int::Int;
use super::ops;
use super::value::{
    Class, ControlFlow, Dict, Exception, Function, Instance, Method, Module, Printer, Value,
};

type Flow<T> = Result<T, ControlFlow>;

/// Tree-walking interpreter
pub struct Interpreter {
    /// Variable environment
    env: Environment,
    config: Config,
    resolver: Box<dyn ModuleResolver>,
    /// Modules imported so far, by dotted name
    modules: FxHashMap<String, Rc<Module>>,
    /// Text written by `print`
    output: String,
    /// A space is owed before the next printed item
    softspace: bool,
    call_depth: usize,
}

impl Interpreter {
    pub fn new(config: Config, resolver: Box<dyn ModuleResolver>) -> Self {
        let env = Environment::new(builtin_namespace());
        env.module_globals()
            .borrow_mut()
            .insert(Rc::from("__name__"), Value::str(&config.main_module_name));
        Interpreter {
            env,
            config,
            resolver,
            modules: FxHashMap::default(),
            output: String::new(),
            softspace: false,
            call_depth: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drain the captured `print` output
    pub fn take_output(&mut self) -> String {
        self.softspace = false;
        std::mem::take(&mut self.output)
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.module_globals().borrow().get(name).cloned()
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.env
            .module_globals()
            .borrow_mut()
            .insert(Rc::from(name), value);
    }

    /// Execute a module against the session globals
    ///
    /// Returns the value of the last statement when it is an expression
    /// statement, `None` otherwise.
    pub fn run(&mut self, module: &ast::Module) -> Result<Value, Exception> {
        let mut last = Value::None;
        for stmt in &module.body {
            let result = match &stmt.kind {
                StmtKind::Expr(expr) => self.eval_expr(expr),
                _ => self.exec_stmt(stmt).map(|()| Value::None),
            };
            last = match result {
                Ok(value) => value,
                Err(ControlFlow::Raise(exc)) => {
                    tracing::debug!("Uncaught exception {}", exc);
                    return Err(exc);
                }
                Err(ControlFlow::Return(_)) => {
                    return Err(Exception::runtime_error("'return' outside function"));
                }
                Err(ControlFlow::Break | ControlFlow::Continue) => {
                    return Err(Exception::runtime_error("loop control outside loop"));
                }
            };
        }
        Ok(last)
    }

    // ==================== STATEMENTS ====================

    fn exec_suite(&mut self, suite: &[ast::Stmt]) -> Flow<()> {
        for stmt in suite {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &ast::Stmt) -> Flow<()> {
        ensure_stack(|| self.exec_stmt_inner(stmt))
    }

    fn exec_stmt_inner(&mut self, stmt: &ast::Stmt) -> Flow<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval_expr(value)?;
                for target in targets {
                    self.assign_target(target, value.clone())?;
                }
            }
            StmtKind::Print {
                values,
                trailing_comma,
            } => self.exec_print(values, *trailing_comma)?,
            StmtKind::Del(targets) => {
                for target in targets {
                    self.delete_target(target)?;
                }
            }
            StmtKind::Pass => {}
            StmtKind::Break => return Err(ControlFlow::Break),
            StmtKind::Continue => return Err(ControlFlow::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                return Err(ControlFlow::Return(value));
            }
            StmtKind::Raise { kind, payload } => {
                let kind = self.eval_expr(kind)?;
                let Value::Str(kind) = kind else {
                    return Err(Exception::type_error("exceptions must be strings").into());
                };
                let payload = match payload {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                tracing::trace!("Raising {}", kind);
                return Err(ControlFlow::Raise(Exception { kind, payload }));
            }
            StmtKind::Global(names) => self.env.declare_global(names),
            StmtKind::Import(paths) => {
                for path in paths {
                    let top = self.import_path(path)?;
                    self.env.assign(&path[0], Value::Module(top));
                }
            }
            StmtKind::FromImport { module, names } => {
                let module = self.import_leaf(module)?;
                match names {
                    ImportNames::All => {
                        let mut public: Vec<_> = module
                            .dict
                            .borrow()
                            .iter()
                            .filter(|(name, _)| !name.starts_with('_'))
                            .map(|(name, value)| (name.clone(), value.clone()))
                            .collect();
                        public.sort_by(|a, b| a.0.cmp(&b.0));
                        for (name, value) in public {
                            self.env.assign(&name, value);
                        }
                    }
                    ImportNames::Names(names) => {
                        for name in names {
                            let value = module
                                .get(name)
                                .ok_or_else(|| Exception::import_error(name))?;
                            self.env.assign(name, value);
                        }
                    }
                }
            }
            StmtKind::Assert { test, message } => {
                let test = self.eval_expr(test)?;
                if !self.truthy(&test)? {
                    let payload = match message {
                        Some(expr) => self.eval_expr(expr)?,
                        None => Value::None,
                    };
                    return Err(Exception::new("AssertionError", payload).into());
                }
            }
            StmtKind::If { branches, orelse } => {
                for (test, body) in branches {
                    let test = self.eval_expr(test)?;
                    if self.truthy(&test)? {
                        return self.exec_suite(body);
                    }
                }
                if let Some(orelse) = orelse {
                    self.exec_suite(orelse)?;
                }
            }
            StmtKind::While { test, body, orelse } => {
                loop {
                    let value = self.eval_expr(test)?;
                    if !self.truthy(&value)? {
                        break;
                    }
                    match self.exec_suite(body) {
                        Ok(()) | Err(ControlFlow::Continue) => {}
                        Err(ControlFlow::Break) => return Ok(()),
                        Err(other) => return Err(other),
                    }
                }
                if let Some(orelse) = orelse {
                    self.exec_suite(orelse)?;
                }
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let seq = self.eval_expr(iter)?;
                let mut index = 0;
                while let Some(item) = self.sequence_item(&seq, index)? {
                    index += 1;
                    self.assign_target(target, item)?;
                    match self.exec_suite(body) {
                        Ok(()) | Err(ControlFlow::Continue) => {}
                        Err(ControlFlow::Break) => return Ok(()),
                        Err(other) => return Err(other),
                    }
                }
                if let Some(orelse) = orelse {
                    self.exec_suite(orelse)?;
                }
            }
            StmtKind::Try(try_stmt) => self.exec_try(try_stmt)?,
            StmtKind::Def(def) => {
                let function = self.make_function(def)?;
                self.env.assign(&def.name, function);
            }
            StmtKind::Class(class) => {
                let value = self.make_class(class)?;
                self.env.assign(&class.name, value);
            }
        }
        Ok(())
    }

    fn exec_print(&mut self, values: &[ast::Expr], trailing_comma: bool) -> Flow<()> {
        for expr in values {
            let value = self.eval_expr(expr)?;
            let text = self.str_value(&value)?;
            if self.softspace {
                self.output.push(' ');
            }
            self.output.push_str(&text);
            self.softspace = !text.ends_with('\n');
        }
        if !trailing_comma {
            self.output.push('\n');
            self.softspace = false;
        }
        Ok(())
    }

    /// `finally` runs on every exit path; its own transfer supersedes the
    /// pending one.
    fn exec_try(&mut self, stmt: &TryStmt) -> Flow<()> {
        let outcome = self.exec_try_body(stmt);
        match &stmt.finally {
            Some(finally) => {
                self.exec_suite(finally)?;
                outcome
            }
            None => outcome,
        }
    }

    fn exec_try_body(&mut self, stmt: &TryStmt) -> Flow<()> {
        match self.exec_suite(&stmt.body) {
            Ok(()) => match &stmt.orelse {
                Some(orelse) => self.exec_suite(orelse),
                None => Ok(()),
            },
            Err(ControlFlow::Raise(exc)) => {
                for handler in &stmt.handlers {
                    let matched = match &handler.kind {
                        None => true,
                        Some(kind) => {
                            let kind = self.eval_expr(kind)?;
                            exception_matches(&kind, &exc)
                        }
                    };
                    if matched {
                        if let Some(target) = &handler.target {
                            self.assign_target(target, exc.payload.clone())?;
                        }
                        return self.exec_suite(&handler.body);
                    }
                }
                Err(ControlFlow::Raise(exc))
            }
            Err(other) => Err(other),
        }
    }

    fn make_function(&mut self, def: &Rc<ast::FunctionDef>) -> Flow<Value> {
        let mut defaults = Vec::with_capacity(def.params.positional.len());
        for param in &def.params.positional {
            defaults.push(match &param.default {
                Some(expr) => Some(self.eval_expr(expr)?),
                None => None,
            });
        }
        Ok(Value::Function(Rc::new(Function {
            name: Rc::from(def.name.as_str()),
            def: def.clone(),
            defaults,
            globals: self.env.current_globals(),
        })))
    }

    /// Run a class body in its own scope; the resulting locals become the
    /// class dictionary.
    fn make_class(&mut self, def: &ast::ClassDef) -> Flow<Value> {
        let mut bases = Vec::with_capacity(def.bases.len());
        for base in &def.bases {
            match self.eval_expr(base)? {
                Value::Class(class) => bases.push(class),
                other => {
                    return Err(Exception::type_error(format!(
                        "base is not a class: '{}'",
                        other.type_name()
                    ))
                    .into());
                }
            }
        }
        let globals = self.env.current_globals();
        self.env.push_frame(Frame::new(globals, Default::default()));
        let result = self.exec_suite(&def.body);
        let locals = self
            .env
            .pop_frame()
            .map(Frame::into_locals)
            .unwrap_or_default();
        result?;
        Ok(Value::Class(Rc::new(Class::new(&def.name, bases, locals))))
    }

    // ==================== TARGETS ====================

    fn assign_target(&mut self, target: &Target, value: Value) -> Flow<()> {
        match target {
            Target::Name(name) => {
                self.env.assign(name, value);
                Ok(())
            }
            Target::Attribute { value: object, attr } => {
                let object = self.eval_expr(object)?;
                set_attr(&object, attr, value)?;
                Ok(())
            }
            Target::Subscript {
                value: container,
                index,
            } => {
                let container = self.eval_expr(container)?;
                let index = self.eval_expr(index)?;
                match &container {
                    Value::Instance(instance) => {
                        self.call_hook(instance, "__setitem__", vec![index, value])?;
                        Ok(())
                    }
                    _ => Ok(ops::set_item(&container, &index, value)?),
                }
            }
            Target::Slice {
                value: container,
                lower,
                upper,
            } => {
                let container = self.eval_expr(container)?;
                let (lower, upper) = self.eval_bounds(lower.as_ref(), upper.as_ref())?;
                Ok(ops::set_slice(
                    &container,
                    lower.as_ref(),
                    upper.as_ref(),
                    &value,
                )?)
            }
            Target::Unpack(targets) => {
                let items: Vec<Value> = match &value {
                    Value::Tuple(items) => items.to_vec(),
                    Value::List(items) => items.borrow().clone(),
                    other => {
                        return Err(Exception::type_error(format!(
                            "unpack non-sequence of type '{}'",
                            other.type_name()
                        ))
                        .into());
                    }
                };
                if items.len() != targets.len() {
                    return Err(Exception::value_error("unpack sequence of wrong size").into());
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign_target(target, item)?;
                }
                Ok(())
            }
        }
    }

    fn delete_target(&mut self, target: &Target) -> Flow<()> {
        match target {
            Target::Name(name) => Ok(self.env.delete(name)?),
            Target::Attribute { value, attr } => {
                let object = self.eval_expr(value)?;
                Ok(del_attr(&object, attr)?)
            }
            Target::Subscript { value, index } => {
                let container = self.eval_expr(value)?;
                let index = self.eval_expr(index)?;
                match &container {
                    Value::Instance(instance) => {
                        self.call_hook(instance, "__delitem__", vec![index])?;
                        Ok(())
                    }
                    _ => Ok(ops::del_item(&container, &index)?),
                }
            }
            Target::Slice {
                value,
                lower,
                upper,
            } => {
                let container = self.eval_expr(value)?;
                let (lower, upper) = self.eval_bounds(lower.as_ref(), upper.as_ref())?;
                Ok(ops::del_slice(&container, lower.as_ref(), upper.as_ref())?)
            }
            Target::Unpack(targets) => {
                for target in targets {
                    self.delete_target(target)?;
                }
                Ok(())
            }
        }
    }

    fn eval_bounds(
        &mut self,
        lower: Option<&ast::Expr>,
        upper: Option<&ast::Expr>,
    ) -> Flow<(Option<Value>, Option<Value>)> {
        let lower = match lower {
            Some(expr) => Some(self.eval_expr(expr)?),
            None => None,
        };
        let upper = match upper {
            Some(expr) => Some(self.eval_expr(expr)?),
            None => None,
        };
        Ok((lower, upper))
    }

    // ==================== EXPRESSIONS ====================

    fn eval_expr(&mut self, expr: &ast::Expr) -> Flow<Value> {
        ensure_stack(|| self.eval_expr_inner(expr))
    }

    fn eval_expr_inner(&mut self, expr: &ast::Expr) -> Flow<Value> {
        match &expr.kind {
            ExprKind::Int { value, long } => Ok(Value::Int(if *long {
                Int::Long(value.clone())
            } else {
                Int::narrow(value.clone())
            })),
            ExprKind::Str(s) => Ok(Value::str(s)),
            ExprKind::Name(name) => Ok(self.env.lookup(name)?),
            ExprKind::Tuple(items) => Ok(Value::tuple(self.eval_all(items)?)),
            ExprKind::List(items) => Ok(Value::list(self.eval_all(items)?)),
            ExprKind::Dict(entries) => {
                let mut dict = Dict::new();
                for (key, value) in entries {
                    let key = self.eval_expr(key)?;
                    let value = self.eval_expr(value)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            ExprKind::Repr(inner) => {
                let value = self.eval_expr(inner)?;
                Ok(Value::Str(Rc::from(self.repr_value(&value)?)))
            }
            ExprKind::Attribute { value, attr } => {
                let object = self.eval_expr(value)?;
                self.get_attr(&object, attr)
            }
            ExprKind::Subscript { value, index } => {
                let container = self.eval_expr(value)?;
                let index = self.eval_expr(index)?;
                match &container {
                    Value::Instance(instance) => {
                        self.call_hook(instance, "__getitem__", vec![index])
                    }
                    _ => Ok(ops::get_item(&container, &index)?),
                }
            }
            ExprKind::Slice {
                value,
                lower,
                upper,
            } => {
                let container = self.eval_expr(value)?;
                let (lower, upper) = self.eval_bounds(lower.as_deref(), upper.as_deref())?;
                Ok(ops::get_slice(&container, lower.as_ref(), upper.as_ref())?)
            }
            ExprKind::Call { func, args } => {
                let callee = self.eval_expr(func)?;
                let mut positional = Vec::new();
                let mut keywords = Vec::new();
                for arg in args {
                    match arg {
                        Arg::Positional(expr) => positional.push(self.eval_expr(expr)?),
                        Arg::Keyword(name, expr) => {
                            keywords.push((Rc::from(name.as_str()), self.eval_expr(expr)?))
                        }
                    }
                }
                self.call_value(&callee, positional, keywords)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                Ok(ops::unary(*op, &operand)?)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                Ok(ops::binary(*op, &left, &right)?)
            }
            ExprKind::Compare { first, rest } => {
                let mut left = self.eval_expr(first)?;
                for (op, expr) in rest {
                    let right = self.eval_expr(expr)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::bool(false));
                    }
                    left = right;
                }
                Ok(Value::bool(true))
            }
            ExprKind::And(left, right) => {
                let left = self.eval_expr(left)?;
                if self.truthy(&left)? {
                    self.eval_expr(right)
                } else {
                    Ok(left)
                }
            }
            ExprKind::Or(left, right) => {
                let left = self.eval_expr(left)?;
                if self.truthy(&left)? {
                    Ok(left)
                } else {
                    self.eval_expr(right)
                }
            }
            ExprKind::Not(operand) => {
                let operand = self.eval_expr(operand)?;
                Ok(Value::bool(!self.truthy(&operand)?))
            }
            ExprKind::Lambda(def) => self.make_function(def),
        }
    }

    fn eval_all(&mut self, exprs: &[ast::Expr]) -> Flow<Vec<Value>> {
        exprs.iter().map(|expr| self.eval_expr(expr)).collect()
    }

    // ==================== CALLS ====================

    pub(super) fn call_value(
        &mut self,
        callee: &Value,
        mut args: Vec<Value>,
        kwargs: Vec<(Rc<str>, Value)>,
    ) -> Flow<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args, kwargs),
            Value::Method(method) => {
                match &method.receiver {
                    Some(receiver) => args.insert(0, receiver.clone()),
                    None => {
                        let valid = matches!(
                            args.first(),
                            Some(Value::Instance(instance)) if instance.class.is_subclass_of(&method.class)
                        );
                        if !valid {
                            return Err(Exception::type_error(format!(
                                "unbound method must be called with {} instance as first argument",
                                method.class.name
                            ))
                            .into());
                        }
                    }
                }
                self.call_function(&method.function, args, kwargs)
            }
            Value::Class(class) => {
                let instance = Value::Instance(Rc::new(Instance::new(class.clone())));
                match class.lookup("__init__") {
                    Some(Value::Function(init)) => {
                        args.insert(0, instance.clone());
                        self.call_function(&init, args, kwargs)?;
                    }
                    Some(init) => {
                        self.call_value(&init, args, kwargs)?;
                    }
                    None if args.is_empty() && kwargs.is_empty() => {}
                    None => {
                        return Err(Exception::type_error("this constructor takes no arguments").into());
                    }
                }
                Ok(instance)
            }
            Value::Instance(instance) => match instance.class.lookup("__call__") {
                Some(_) => {
                    let method = self.get_attr(callee, "__call__")?;
                    self.call_value(&method, args, kwargs)
                }
                None => Err(not_callable(callee)),
            },
            Value::Builtin(builtin) => self.call_builtin(*builtin, args, kwargs),
            other => Err(not_callable(other)),
        }
    }

    fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
        kwargs: Vec<(Rc<str>, Value)>,
    ) -> Flow<Value> {
        tracing::trace!("Calling {} with {} argument(s)", function.name, args.len());
        let locals = function.bind(args, kwargs)?;
        if self.call_depth >= self.config.max_call_depth {
            return Err(Exception::runtime_error("maximum recursion depth exceeded").into());
        }
        self.call_depth += 1;
        self.env
            .push_frame(Frame::new(function.globals.clone(), locals));
        let result = self.exec_suite(&function.def.body);
        self.env.pop_frame();
        self.call_depth -= 1;

        match result {
            Ok(()) => Ok(Value::None),
            Err(ControlFlow::Return(value)) => Ok(value),
            Err(ControlFlow::Raise(exc)) => Err(ControlFlow::Raise(exc)),
            Err(ControlFlow::Break | ControlFlow::Continue) => {
                Err(Exception::runtime_error("loop control outside loop").into())
            }
        }
    }

    /// Call a special method found on the instance's class
    pub(super) fn call_hook(
        &mut self,
        instance: &Rc<Instance>,
        name: &str,
        mut args: Vec<Value>,
    ) -> Flow<Value> {
        match instance.class.lookup(name) {
            Some(Value::Function(function)) => {
                args.insert(0, Value::Instance(instance.clone()));
                self.call_function(&function, args, Vec::new())
            }
            Some(other) => self.call_value(&other, args, Vec::new()),
            None => Err(Exception::attribute_error(name).into()),
        }
    }

    // ==================== ATTRIBUTES ====================

    fn get_attr(&mut self, object: &Value, name: &str) -> Flow<Value> {
        match object {
            Value::Instance(instance) => {
                if name == "__class__" {
                    return Ok(Value::Class(instance.class.clone()));
                }
                if let Some(value) = instance.dict.borrow().get(name) {
                    return Ok(value.clone());
                }
                if let Some(value) = instance.class.lookup(name) {
                    return Ok(bind(value, Some(object.clone()), &instance.class));
                }
                if instance.class.lookup("__getattr__").is_some() {
                    return self.call_hook(instance, "__getattr__", vec![Value::str(name)]);
                }
                Err(Exception::attribute_error(name).into())
            }
            Value::Class(class) => match name {
                "__name__" => Ok(Value::Str(class.name.clone())),
                "__bases__" => Ok(Value::tuple(
                    class.bases.iter().cloned().map(Value::Class).collect(),
                )),
                _ => class
                    .lookup(name)
                    .map(|value| bind(value, None, class))
                    .ok_or_else(|| Exception::attribute_error(name).into()),
            },
            Value::Function(function) if name == "__name__" => {
                Ok(Value::Str(function.name.clone()))
            }
            Value::Method(method) if name == "__name__" => {
                Ok(Value::Str(method.function.name.clone()))
            }
            Value::Module(module) => module
                .get(name)
                .ok_or_else(|| Exception::attribute_error(name).into()),
            _ => Err(Exception::attribute_error(name).into()),
        }
    }

    // ==================== PROTOCOLS ====================

    /// Truth value, consulting `__nonzero__` then `__len__` on instances
    fn truthy(&mut self, value: &Value) -> Flow<bool> {
        let Value::Instance(instance) = value else {
            return Ok(value.is_truthy());
        };
        if instance.class.lookup("__nonzero__").is_some() {
            let result = self.call_hook(instance, "__nonzero__", Vec::new())?;
            return Ok(result.is_truthy());
        }
        if instance.class.lookup("__len__").is_some() {
            return Ok(self.length(value)? != 0);
        }
        Ok(true)
    }

    pub(super) fn length(&mut self, value: &Value) -> Flow<usize> {
        if let Value::Instance(instance) = value {
            let result = self.call_hook(instance, "__len__", Vec::new())?;
            return result
                .as_int()
                .and_then(Int::to_i64)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| Exception::value_error("__len__() should return >= 0").into());
        }
        ops::length(value).ok_or_else(|| {
            Exception::type_error(format!("len() of unsized object of type '{}'", value.type_name()))
                .into()
        })
    }

    /// Element `index` of a sequence, or `None` once it is exhausted
    ///
    /// Instances are indexed through `__getitem__` until it raises
    /// IndexError.
    fn sequence_item(&mut self, seq: &Value, index: usize) -> Flow<Option<Value>> {
        match seq {
            Value::Instance(instance) => {
                match self.call_hook(instance, "__getitem__", vec![Value::int(index)]) {
                    Ok(value) => Ok(Some(value)),
                    Err(ControlFlow::Raise(exc)) if &*exc.kind == "IndexError" => Ok(None),
                    Err(other) => Err(other),
                }
            }
            _ => Ok(ops::sequence_item(seq, index)?),
        }
    }

    /// All elements of a sequence, in order
    pub(super) fn sequence_items(&mut self, seq: &Value) -> Flow<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(item) = self.sequence_item(seq, items.len())? {
            items.push(item);
        }
        Ok(items)
    }

    /// Printed form, rendering instances through `__repr__`
    pub(super) fn repr_value(&mut self, value: &Value) -> Flow<String> {
        let mut hook = |instance: &Rc<Instance>| -> Flow<Option<String>> {
            if instance.class.lookup("__repr__").is_none() {
                return Ok(None);
            }
            match self.call_hook(instance, "__repr__", Vec::new())? {
                Value::Str(text) => Ok(Some(text.to_string())),
                other => Err(Exception::type_error(format!(
                    "__repr__ returned non-string (type {})",
                    other.type_name()
                ))
                .into()),
            }
        };
        Printer::new(&mut hook).repr(value)
    }

    /// Informal string form; instances may supply `__str__`
    pub(super) fn str_value(&mut self, value: &Value) -> Flow<String> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            Value::Instance(instance) if instance.class.lookup("__str__").is_some() => {
                match self.call_hook(instance, "__str__", Vec::new())? {
                    Value::Str(text) => Ok(text.to_string()),
                    other => Err(Exception::type_error(format!(
                        "__str__ returned non-string (type {})",
                        other.type_name()
                    ))
                    .into()),
                }
            }
            other => self.repr_value(other),
        }
    }

    // ==================== IMPORTS ====================

    fn load_module(&mut self, name: &str) -> Result<Rc<Module>, Exception> {
        if let Some(module) = self.modules.get(name) {
            return Ok(module.clone());
        }
        let module = self
            .resolver
            .resolve(name)
            .ok_or_else(|| Exception::import_error(name))?;
        tracing::debug!("Imported module {}", name);
        self.modules.insert(name.to_string(), module.clone());
        Ok(module)
    }

    /// Load every prefix of a dotted path, linking each module into its
    /// parent. Returns the modules in path order.
    fn load_path(&mut self, path: &[String]) -> Result<Vec<Rc<Module>>, Exception> {
        let mut loaded: Vec<Rc<Module>> = Vec::with_capacity(path.len());
        let mut full = String::new();
        for part in path {
            if !full.is_empty() {
                full.push('.');
            }
            full.push_str(part);
            let module = self.load_module(&full)?;
            if let Some(parent) = loaded.last() {
                parent.set(part, Value::Module(module.clone()));
            }
            loaded.push(module);
        }
        Ok(loaded)
    }

    /// `import a.b.c` binds `a`
    fn import_path(&mut self, path: &[String]) -> Result<Rc<Module>, Exception> {
        self.load_path(path)?
            .into_iter()
            .next()
            .ok_or_else(|| Exception::import_error(""))
    }

    /// `from a.b import x` reads from `a.b`
    fn import_leaf(&mut self, path: &[String]) -> Result<Rc<Module>, Exception> {
        self.load_path(path)?
            .pop()
            .ok_or_else(|| Exception::import_error(""))
    }
}

/// Wrap a function found on a class as a method
fn bind(value: Value, receiver: Option<Value>, class: &Rc<Class>) -> Value {
    match value {
        Value::Function(function) => Value::Method(Rc::new(Method {
            function,
            receiver,
            class: class.clone(),
        })),
        other => other,
    }
}

fn set_attr(object: &Value, name: &str, value: Value) -> Result<(), Exception> {
    match object {
        Value::Instance(instance) => {
            instance.dict.borrow_mut().insert(Rc::from(name), value);
        }
        Value::Class(class) => {
            class.dict.borrow_mut().insert(Rc::from(name), value);
        }
        Value::Module(module) => module.set(name, value),
        other => {
            return Err(Exception::type_error(format!(
                "'{}' object has only read-only attributes",
                other.type_name()
            )));
        }
    }
    Ok(())
}

fn del_attr(object: &Value, name: &str) -> Result<(), Exception> {
    let removed = match object {
        Value::Instance(instance) => instance.dict.borrow_mut().remove(name).is_some(),
        Value::Class(class) => class.dict.borrow_mut().remove(name).is_some(),
        Value::Module(module) => module.dict.borrow_mut().remove(name).is_some(),
        other => {
            return Err(Exception::type_error(format!(
                "'{}' object has only read-only attributes",
                other.type_name()
            )));
        }
    };
    if removed {
        Ok(())
    } else {
        Err(Exception::attribute_error(name))
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, Exception> {
    use std::cmp::Ordering;
    Ok(match op {
        CompareOp::Eq => left.equals(right),
        CompareOp::Ne => !left.equals(right),
        CompareOp::Lt => left.compare(right) == Ordering::Less,
        CompareOp::Gt => left.compare(right) == Ordering::Greater,
        CompareOp::Le => left.compare(right) != Ordering::Greater,
        CompareOp::Ge => left.compare(right) != Ordering::Less,
        CompareOp::In => ops::contains(right, left)?,
        CompareOp::NotIn => !ops::contains(right, left)?,
        CompareOp::Is => left.is(right),
        CompareOp::IsNot => !left.is(right),
    })
}

/// An `except` clause names a string or a tuple of alternatives
fn exception_matches(kind: &Value, exc: &Exception) -> bool {
    match kind {
        Value::Str(name) => **name == *exc.kind,
        Value::Tuple(kinds) => kinds.iter().any(|k| exception_matches(k, exc)),
        _ => false,
    }
}

fn not_callable(value: &Value) -> ControlFlow {
    Exception::type_error(format!(
        "object of type '{}' is not callable",
        value.type_name()
    ))
    .into()
}
