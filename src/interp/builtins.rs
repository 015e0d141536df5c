//! Built-in functions and host-supplied modules

use std::rc::Rc;

use super::eval::Interpreter;
use super::int::Int;
use super::ops::MAX_SEQUENCE_LEN;
use super::value::{ControlFlow, Exception, Module, Namespace, Value};

/// Exception type names pre-bound to themselves
pub const EXCEPTION_NAMES: &[&str] = &[
    "NameError",
    "IndexError",
    "KeyError",
    "TypeError",
    "AssertionError",
    "AttributeError",
    "ZeroDivisionError",
    "ValueError",
    "ImportError",
    "OverflowError",
    "RuntimeError",
];

/// Functions available to every program without an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    Tuple,
    List,
    Len,
    Range,
    Chr,
    Ord,
    Type,
    Repr,
    Str,
    Cmp,
}

impl Builtin {
    pub const ALL: [Builtin; 11] = [
        Builtin::Abs,
        Builtin::Tuple,
        Builtin::List,
        Builtin::Len,
        Builtin::Range,
        Builtin::Chr,
        Builtin::Ord,
        Builtin::Type,
        Builtin::Repr,
        Builtin::Str,
        Builtin::Cmp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::Tuple => "tuple",
            Builtin::List => "list",
            Builtin::Len => "len",
            Builtin::Range => "range",
            Builtin::Chr => "chr",
            Builtin::Ord => "ord",
            Builtin::Type => "type",
            Builtin::Repr => "repr",
            Builtin::Str => "str",
            Builtin::Cmp => "cmp",
        }
    }

    /// Accepted positional argument counts
    fn arity(&self) -> (usize, usize) {
        match self {
            Builtin::Range => (1, 3),
            Builtin::Cmp => (2, 2),
            _ => (1, 1),
        }
    }
}

/// The namespace consulted after globals
pub fn builtin_namespace() -> Namespace {
    let mut ns = Namespace::default();
    for builtin in Builtin::ALL {
        ns.insert(Rc::from(builtin.name()), Value::Builtin(builtin));
    }
    ns.insert(Rc::from("None"), Value::None);
    for name in EXCEPTION_NAMES {
        ns.insert(Rc::from(*name), Value::str(name));
    }
    ns
}

/// Source of modules for `import`
pub trait ModuleResolver {
    /// Look up a module by its full dotted name
    fn resolve(&self, name: &str) -> Option<Rc<Module>>;
}

/// Resolver offering only the built-in `sys` module
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinModules;

impl ModuleResolver for BuiltinModules {
    fn resolve(&self, name: &str) -> Option<Rc<Module>> {
        match name {
            "sys" => {
                let sys = Module::new("sys", true);
                sys.set("maxint", Value::int(i32::MAX));
                Some(Rc::new(sys))
            }
            _ => None,
        }
    }
}

impl Interpreter {
    pub(super) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        kwargs: Vec<(Rc<str>, Value)>,
    ) -> Result<Value, ControlFlow> {
        if !kwargs.is_empty() {
            return Err(Exception::type_error(format!(
                "{}() takes no keyword arguments",
                builtin.name()
            ))
            .into());
        }
        let (min, max) = builtin.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                format!("exactly {}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(Exception::type_error(format!(
                "{}() takes {} argument(s) ({} given)",
                builtin.name(),
                expected,
                args.len()
            ))
            .into());
        }

        match builtin {
            Builtin::Abs => match &args[0] {
                Value::Int(n) => Ok(Value::Int(n.abs())),
                Value::Instance(instance) => {
                    self.call_hook(instance, "__abs__", Vec::new())
                }
                other => Err(bad_argument(builtin, other)),
            },
            Builtin::Tuple => match &args[0] {
                Value::Tuple(_) => Ok(args[0].clone()),
                other => Ok(Value::tuple(self.sequence_items(other)?)),
            },
            Builtin::List => Ok(Value::list(self.sequence_items(&args[0])?)),
            Builtin::Len => Ok(Value::int(self.length(&args[0])?)),
            Builtin::Range => range(&args),
            Builtin::Chr => {
                let code = int_arg(builtin, &args[0])?
                    .to_i64()
                    .filter(|c| (0..256).contains(c))
                    .ok_or_else(|| Exception::value_error("chr() arg not in range(256)"))?;
                let c = char::from(code as u8);
                Ok(Value::Str(Rc::from(c.to_string())))
            }
            Builtin::Ord => match &args[0] {
                Value::Str(s) if s.chars().count() == 1 => {
                    let code = s.chars().next().map(u32::from).unwrap_or_default();
                    Ok(Value::int(i64::from(code)))
                }
                Value::Str(s) => Err(Exception::type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))
                .into()),
                other => Err(bad_argument(builtin, other)),
            },
            Builtin::Type => Ok(Value::str(args[0].type_name())),
            Builtin::Repr => Ok(Value::Str(Rc::from(self.repr_value(&args[0])?))),
            Builtin::Str => Ok(Value::Str(Rc::from(self.str_value(&args[0])?))),
            Builtin::Cmp => {
                let order = args[0].compare(&args[1]);
                Ok(Value::int(order as i32))
            }
        }
    }
}

fn int_arg(builtin: Builtin, value: &Value) -> Result<&Int, ControlFlow> {
    value.as_int().ok_or_else(|| bad_argument(builtin, value))
}

fn bad_argument(builtin: Builtin, value: &Value) -> ControlFlow {
    Exception::type_error(format!(
        "bad argument type for {}(): '{}'",
        builtin.name(),
        value.type_name()
    ))
    .into()
}

/// `range(stop)`, `range(start, stop)`, `range(start, stop, step)`
fn range(args: &[Value]) -> Result<Value, ControlFlow> {
    let mut bounds = Vec::with_capacity(args.len());
    for arg in args {
        let n = int_arg(Builtin::Range, arg)?
            .to_i64()
            .ok_or_else(|| Exception::overflow_error("range() result has too many items"))?;
        bounds.push(n);
    }
    let (start, stop, step) = match bounds[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => {
            return Err(Exception::type_error("range() requires 1-3 int arguments").into());
        }
    };
    if step == 0 {
        return Err(Exception::value_error("range() step argument must not be zero").into());
    }
    let (start_wide, stop_wide, step_wide) = (i128::from(start), i128::from(stop), i128::from(step));
    let count = if step > 0 {
        (stop_wide - start_wide + step_wide - 1).div_euclid(step_wide)
    } else {
        (start_wide - stop_wide - step_wide - 1).div_euclid(-step_wide)
    }
    .max(0);
    if count > MAX_SEQUENCE_LEN as i128 {
        return Err(Exception::overflow_error("range() result has too many items").into());
    }
    let mut items = Vec::with_capacity(count as usize);
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::int(i));
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::list(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_binds_exception_names_to_themselves() {
        let ns = builtin_namespace();
        for name in EXCEPTION_NAMES {
            assert_eq!(ns.get(*name).and_then(|v| v.as_str()), Some(*name));
        }
        assert!(matches!(ns.get("None"), Some(Value::None)));
        assert!(matches!(ns.get("len"), Some(Value::Builtin(Builtin::Len))));
    }

    #[test]
    fn test_range_directions() {
        let list = |args: &[i32]| {
            let args: Vec<Value> = args.iter().map(|n| Value::int(*n)).collect();
            range(&args).unwrap().repr()
        };
        assert_eq!(list(&[3]), "[0, 1, 2]");
        assert_eq!(list(&[2, 5]), "[2, 3, 4]");
        assert_eq!(list(&[5, 0, -2]), "[5, 3, 1]");
        assert_eq!(list(&[5, 2]), "[]");
        assert_eq!(list(&[-3, 3, 4]), "[-3, 1]");
    }

    #[test]
    fn test_range_too_many_items() {
        let args = [Value::int(0), Value::int(i32::MAX)];
        let Err(ControlFlow::Raise(err)) = range(&args) else {
            panic!("Expected an OverflowError");
        };
        assert_eq!(&*err.kind, "OverflowError");
    }

    #[test]
    fn test_sys_module() {
        let sys = BuiltinModules.resolve("sys").unwrap();
        assert!(sys.builtin);
        assert_eq!(sys.get("__name__").and_then(|v| v.as_str().map(String::from)), Some("sys".into()));
        assert!(sys.get("maxint").unwrap().equals(&Value::int(2147483647)));
        assert!(BuiltinModules.resolve("os").is_none());
    }
}
