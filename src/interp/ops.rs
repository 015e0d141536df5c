//! Primitive operations on built-in value kinds
//!
//! Arithmetic, containment, subscription and slicing for ints, strings,
//! tuples, lists and dicts. Instance hooks are dispatched by the evaluator
//! before it falls back to these.

use std::rc::Rc;

use crate::ast::{BinaryOp, UnaryOp};

use super::int::Int;
use super::value::{Exception, HashKey, Value};

/// Longest string, tuple or list that repetition and `range` will build
pub const MAX_SEQUENCE_LEN: usize = 1 << 24;

type OpResult<T> = Result<T, Exception>;

pub fn unary(op: UnaryOp, operand: &Value) -> OpResult<Value> {
    let Value::Int(n) = operand else {
        let symbol = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
        };
        return Err(Exception::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        )));
    };
    Ok(Value::Int(match op {
        UnaryOp::Neg => n.neg(),
        UnaryOp::Pos => n.clone(),
        UnaryOp::Invert => n.invert(),
    }))
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> OpResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let result = match op {
            BinaryOp::Add => a.add(b),
            BinaryOp::Sub => a.sub(b),
            BinaryOp::Mul => a.mul(b),
            BinaryOp::Div => a.div(b)?,
            BinaryOp::Mod => a.rem(b)?,
            BinaryOp::Pow => a.pow(b)?,
            BinaryOp::Shl => a.shl(b)?,
            BinaryOp::Shr => a.shr(b)?,
            BinaryOp::BitAnd => a.bitand(b),
            BinaryOp::BitOr => a.bitor(b),
            BinaryOp::BitXor => a.bitxor(b),
        };
        return Ok(Value::Int(result));
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            Ok(Value::Str(Rc::from(format!("{}{}", a, b))))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinaryOp::Mul, seq, Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), seq) => {
            repeat(seq, n)
        }
        _ => Err(Exception::type_error(format!(
            "unsupported operand types for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Sequence repetition; non-positive counts give an empty sequence
fn repeat(seq: &Value, count: &Int) -> OpResult<Value> {
    let count = usize::try_from(count.to_index().max(0))
        .map_err(|_| Exception::overflow_error("repeat count too large"))?;
    let len = match seq {
        Value::Str(s) => s.len(),
        Value::Tuple(items) => items.len(),
        Value::List(items) => items.borrow().len(),
        _ => 0,
    };
    if len.checked_mul(count).is_none_or(|total| total > MAX_SEQUENCE_LEN) {
        return Err(Exception::overflow_error("repeated sequence is too long"));
    }
    match seq {
        Value::Str(s) => Ok(Value::Str(Rc::from(s.repeat(count)))),
        Value::Tuple(items) => Ok(Value::tuple(repeat_items(items, count))),
        Value::List(items) => Ok(Value::list(repeat_items(&items.borrow(), count))),
        other => Err(Exception::type_error(format!(
            "can't multiply sequence of type '{}'",
            other.type_name()
        ))),
    }
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    out
}

/// `item in container`
pub fn contains(container: &Value, item: &Value) -> OpResult<bool> {
    match container {
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(&**needle)),
            _ => Err(Exception::type_error(
                "'in <string>' requires string as left operand",
            )),
        },
        Value::Tuple(items) => Ok(items.iter().any(|v| v.equals(item))),
        Value::List(items) => {
            let items = items.borrow().clone();
            Ok(items.iter().any(|v| v.equals(item)))
        }
        Value::Dict(dict) => Ok(dict.borrow().contains(&HashKey::from_value(item)?)),
        other => Err(Exception::type_error(format!(
            "'in' or 'not in' needs sequence right argument, not '{}'",
            other.type_name()
        ))),
    }
}

/// Number of elements, for the kinds that have one
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Str(s) => Some(s.chars().count()),
        Value::Tuple(items) => Some(items.len()),
        Value::List(items) => Some(items.borrow().len()),
        Value::Dict(dict) => Some(dict.borrow().len()),
        _ => None,
    }
}

/// Resolve a possibly negative index against `len`
fn normalize_index(index: &Value, len: usize, kind: &str) -> OpResult<usize> {
    let Value::Int(n) = index else {
        return Err(Exception::type_error(format!(
            "{} indices must be integers",
            kind
        )));
    };
    let len = len as i64;
    let mut i = n.to_index();
    if i < 0 {
        i = i.saturating_add(len);
    }
    if i < 0 || i >= len {
        return Err(Exception::index_error(format!("{} index out of range", kind)));
    }
    Ok(i as usize)
}

pub fn get_item(container: &Value, index: &Value) -> OpResult<Value> {
    match container {
        Value::Str(s) => {
            let i = normalize_index(index, s.chars().count(), "string")?;
            let c = s.chars().nth(i).map(String::from).unwrap_or_default();
            Ok(Value::Str(Rc::from(c)))
        }
        Value::Tuple(items) => {
            let i = normalize_index(index, items.len(), "tuple")?;
            Ok(items[i].clone())
        }
        Value::List(items) => {
            let items = items.borrow();
            let i = normalize_index(index, items.len(), "list")?;
            Ok(items[i].clone())
        }
        Value::Dict(dict) => {
            let key = HashKey::from_value(index)?;
            dict.borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| Exception::key_error(index.clone()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is unsubscriptable",
            other.type_name()
        ))),
    }
}

pub fn set_item(container: &Value, index: &Value, value: Value) -> OpResult<()> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let i = normalize_index(index, items.len(), "list assignment")?;
            items[i] = value;
            Ok(())
        }
        Value::Dict(dict) => dict.borrow_mut().insert(index.clone(), value),
        other => Err(Exception::type_error(format!(
            "'{}' object doesn't support item assignment",
            other.type_name()
        ))),
    }
}

pub fn del_item(container: &Value, index: &Value) -> OpResult<()> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let i = normalize_index(index, items.len(), "list assignment")?;
            items.remove(i);
            Ok(())
        }
        Value::Dict(dict) => {
            let key = HashKey::from_value(index)?;
            dict.borrow_mut()
                .remove(&key)
                .map(|_| ())
                .ok_or_else(|| Exception::key_error(index.clone()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object doesn't support item deletion",
            other.type_name()
        ))),
    }
}

/// Clamp slice bounds into `[0, len]`, with `upper >= lower`
fn slice_bounds(
    lower: Option<&Value>,
    upper: Option<&Value>,
    len: usize,
) -> OpResult<(usize, usize)> {
    let bound = |value: Option<&Value>, default: i64| -> OpResult<usize> {
        let raw = match value {
            None => default,
            Some(Value::Int(n)) => n.to_index(),
            Some(_) => return Err(Exception::type_error("slice indices must be integers")),
        };
        let len = len as i64;
        let adjusted = if raw < 0 { raw.saturating_add(len) } else { raw };
        Ok(adjusted.clamp(0, len) as usize)
    };
    let lo = bound(lower, 0)?;
    let hi = bound(upper, len as i64)?;
    Ok((lo, hi.max(lo)))
}

pub fn get_slice(container: &Value, lower: Option<&Value>, upper: Option<&Value>) -> OpResult<Value> {
    match container {
        Value::Str(s) => {
            let (lo, hi) = slice_bounds(lower, upper, s.chars().count())?;
            let sub: String = s.chars().skip(lo).take(hi - lo).collect();
            Ok(Value::Str(Rc::from(sub)))
        }
        Value::Tuple(items) => {
            let (lo, hi) = slice_bounds(lower, upper, items.len())?;
            Ok(Value::tuple(items[lo..hi].to_vec()))
        }
        Value::List(items) => {
            let items = items.borrow();
            let (lo, hi) = slice_bounds(lower, upper, items.len())?;
            Ok(Value::list(items[lo..hi].to_vec()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is unsliceable",
            other.type_name()
        ))),
    }
}

/// Replace a list slice with the elements of a tuple or list
pub fn set_slice(
    container: &Value,
    lower: Option<&Value>,
    upper: Option<&Value>,
    value: &Value,
) -> OpResult<()> {
    let Value::List(items) = container else {
        return Err(Exception::type_error(format!(
            "'{}' object doesn't support slice assignment",
            container.type_name()
        )));
    };
    // Copy first: the source may be the list itself
    let replacement: Vec<Value> = match value {
        Value::List(src) => src.borrow().clone(),
        Value::Tuple(src) => src.to_vec(),
        other => {
            return Err(Exception::type_error(format!(
                "must assign list or tuple to slice, not '{}'",
                other.type_name()
            )));
        }
    };
    let mut items = items.borrow_mut();
    let (lo, hi) = slice_bounds(lower, upper, items.len())?;
    items.splice(lo..hi, replacement);
    Ok(())
}

pub fn del_slice(container: &Value, lower: Option<&Value>, upper: Option<&Value>) -> OpResult<()> {
    let Value::List(items) = container else {
        return Err(Exception::type_error(format!(
            "'{}' object doesn't support slice deletion",
            container.type_name()
        )));
    };
    let mut items = items.borrow_mut();
    let (lo, hi) = slice_bounds(lower, upper, items.len())?;
    items.drain(lo..hi);
    Ok(())
}

/// Element `index` of a built-in sequence, or `None` past the end
///
/// Used by `for` loops; lists are read live so appends during the loop are
/// seen.
pub fn sequence_item(seq: &Value, index: usize) -> OpResult<Option<Value>> {
    match seq {
        Value::Str(s) => Ok(s.chars().nth(index).map(|c| Value::Str(Rc::from(c.to_string())))),
        Value::Tuple(items) => Ok(items.get(index).cloned()),
        Value::List(items) => Ok(items.borrow().get(index).cloned()),
        other => Err(Exception::type_error(format!(
            "loop over non-sequence of type '{}'",
            other.type_name()
        ))),
    }
}
