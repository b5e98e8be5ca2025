//! Fixed method table for arrays, strings and numbers.
//!
//! This is the whole callable surface of the sandbox besides user-written
//! arrow functions and the charting namespace constructors.

use std::cmp::Ordering;

use super::error::{ScriptError, ScriptResult};
use super::interpreter::{Interpreter, property_name};
use super::value::{ScriptValue, VALUE_SLOT_BYTES};

pub(crate) fn get_member(receiver: &ScriptValue, key: &str) -> ScriptResult<ScriptValue> {
    match receiver {
        ScriptValue::Undefined | ScriptValue::Null => Err(ScriptError::runtime(format!(
            "cannot read properties of {receiver} (reading `{key}`)"
        ))),
        ScriptValue::Object(map) => Ok(map.get(key).cloned().unwrap_or(ScriptValue::Undefined)),
        ScriptValue::Array(items) => {
            if key == "length" {
                return Ok(ScriptValue::Number(items.len() as f64));
            }
            Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index).cloned())
                .unwrap_or(ScriptValue::Undefined))
        }
        ScriptValue::String(s) => {
            if key == "length" {
                return Ok(ScriptValue::Number(s.encode_utf16().count() as f64));
            }
            Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|index| s.chars().nth(index))
                .map_or(ScriptValue::Undefined, |c| ScriptValue::String(c.to_string())))
        }
        _ => Ok(ScriptValue::Undefined),
    }
}

pub(crate) fn is_mutating_method(receiver: &ScriptValue, method: &str) -> bool {
    matches!(receiver, ScriptValue::Array(_)) && matches!(method, "push" | "sort" | "reverse")
}

/// Runs an in-place array method on an owned copy, returning the updated
/// array (to write back to its variable) and the call result.
pub(crate) fn call_mutating(
    interp: &mut Interpreter,
    receiver: ScriptValue,
    method: &str,
    args: &[ScriptValue],
) -> ScriptResult<(ScriptValue, ScriptValue)> {
    let ScriptValue::Array(mut items) = receiver else {
        return Err(ScriptError::runtime(format!("`{method}` requires an array")));
    };
    match method {
        "push" => {
            let mut size = 0usize;
            for value in items.iter().chain(args) {
                size = size.saturating_add(interp.measure(value)?);
                interp.check_size(size)?;
            }
            items.extend(args.iter().cloned());
            let length = ScriptValue::Number(items.len() as f64);
            Ok((ScriptValue::Array(items), length))
        }
        "reverse" => {
            items.reverse();
            let array = ScriptValue::Array(items);
            Ok((array.clone(), array))
        }
        _ => {
            items = sort_values(interp, items, args.first())?;
            let array = ScriptValue::Array(items);
            Ok((array.clone(), array))
        }
    }
}

/// Dispatches a builtin method; `Ok(None)` when `method` is not a builtin for
/// this receiver so the caller can fall back to a function-valued property.
pub(crate) fn call_method(
    interp: &mut Interpreter,
    receiver: &ScriptValue,
    method: &str,
    args: &[ScriptValue],
) -> ScriptResult<Option<ScriptValue>> {
    match receiver {
        ScriptValue::Array(items) => array_method(interp, items, method, args),
        ScriptValue::String(s) => string_method(interp, s, method, args),
        ScriptValue::Number(_) | ScriptValue::Exact(_) => {
            Ok(number_method(receiver.to_number(), method, args))
        }
        _ => Ok(None),
    }
}

fn arg(args: &[ScriptValue], index: usize) -> ScriptValue {
    args.get(index).cloned().unwrap_or(ScriptValue::Undefined)
}

fn index_arg(index: usize) -> ScriptValue {
    ScriptValue::Number(index as f64)
}

fn callback(args: &[ScriptValue], method: &str) -> ScriptResult<ScriptValue> {
    match args.first() {
        Some(f @ (ScriptValue::Function(_) | ScriptValue::Native(_))) => Ok(f.clone()),
        _ => Err(ScriptError::runtime(format!(
            "`{method}` expects a function argument"
        ))),
    }
}

fn array_method(
    interp: &mut Interpreter,
    items: &[ScriptValue],
    method: &str,
    args: &[ScriptValue],
) -> ScriptResult<Option<ScriptValue>> {
    let value = match method {
        "map" => {
            let f = callback(args, method)?;
            let mut out = Vec::with_capacity(items.len());
            let mut size = 0usize;
            for (index, item) in items.iter().enumerate() {
                let value = interp.call_value(&f, &[item.clone(), index_arg(index)])?;
                size = size.saturating_add(interp.measure(&value)?);
                interp.check_size(size)?;
                out.push(value);
            }
            ScriptValue::Array(out)
        }
        "filter" => {
            let f = callback(args, method)?;
            let mut out = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let keep = interp.call_value(&f, &[item.clone(), index_arg(index)])?;
                if keep.is_truthy() {
                    out.push(item.clone());
                }
            }
            ScriptValue::Array(out)
        }
        "forEach" => {
            let f = callback(args, method)?;
            for (index, item) in items.iter().enumerate() {
                interp.call_value(&f, &[item.clone(), index_arg(index)])?;
            }
            ScriptValue::Undefined
        }
        "find" | "findIndex" | "some" | "every" => {
            let f = callback(args, method)?;
            let mut found = None;
            for (index, item) in items.iter().enumerate() {
                let hit = interp.call_value(&f, &[item.clone(), index_arg(index)])?.is_truthy();
                if hit != (method == "every") {
                    found = Some(index);
                    break;
                }
            }
            match (method, found) {
                ("find", Some(index)) => items[index].clone(),
                ("find", None) => ScriptValue::Undefined,
                ("findIndex", Some(index)) => ScriptValue::Number(index as f64),
                ("findIndex", None) => ScriptValue::Number(-1.0),
                ("some", hit) => ScriptValue::Bool(hit.is_some()),
                (_, miss) => ScriptValue::Bool(miss.is_none()),
            }
        }
        "reduce" => {
            let f = callback(args, method)?;
            let mut iter = items.iter().enumerate();
            let mut accumulator = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match iter.next() {
                    Some((_, first)) => first.clone(),
                    None => {
                        return Err(ScriptError::runtime(
                            "reduce of empty array with no initial value",
                        ));
                    }
                },
            };
            for (index, item) in iter {
                let args = [accumulator, item.clone(), index_arg(index)];
                accumulator = interp.call_value(&f, &args)?;
            }
            accumulator
        }
        "slice" => {
            let (start, end) = slice_bounds(items.len(), args);
            ScriptValue::Array(items[start..end].to_vec())
        }
        "concat" => {
            let mut size = 0usize;
            for value in items.iter().chain(args) {
                size = size.saturating_add(interp.measure(value)?);
                interp.check_size(size)?;
            }
            let mut out = items.to_vec();
            for value in args {
                match value {
                    ScriptValue::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            ScriptValue::Array(out)
        }
        "join" => {
            let separator = match args.first() {
                None | Some(ScriptValue::Undefined) => ",".to_owned(),
                Some(other) => other.to_string(),
            };
            let mut joined = String::new();
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    joined.push_str(&separator);
                }
                if !item.is_nullish() {
                    joined.push_str(&item.to_string());
                }
                interp.check_size(joined.len())?;
            }
            ScriptValue::String(joined)
        }
        "includes" => {
            let needle = arg(args, 0);
            ScriptValue::Bool(items.iter().any(|item| item.strict_equals(&needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let index = items.iter().position(|item| item.strict_equals(&needle));
            ScriptValue::Number(index.map_or(-1.0, |index| index as f64))
        }
        "flat" => {
            let mut out = Vec::with_capacity(items.len());
            let mut size = 0usize;
            for item in items {
                size = size.saturating_add(interp.measure(item)?);
                interp.check_size(size)?;
                match item {
                    ScriptValue::Array(inner) => out.extend(inner.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            ScriptValue::Array(out)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn slice_bounds(len: usize, args: &[ScriptValue]) -> (usize, usize) {
    let resolve = |value: Option<&ScriptValue>, default: usize| -> usize {
        match value {
            None | Some(ScriptValue::Undefined) => default,
            Some(value) => {
                let n = value.to_number();
                if n.is_nan() {
                    0
                } else if n < 0.0 {
                    (len as f64 + n.trunc()).max(0.0) as usize
                } else {
                    (n.trunc() as usize).min(len)
                }
            }
        }
    };
    let start = resolve(args.first(), 0);
    let end = resolve(args.get(1), len);
    (start, end.max(start))
}

fn sort_values(
    interp: &mut Interpreter,
    items: Vec<ScriptValue>,
    comparator: Option<&ScriptValue>,
) -> ScriptResult<Vec<ScriptValue>> {
    let comparator = comparator.filter(|c| !c.is_nullish()).cloned();
    let mut compare = |a: &ScriptValue, b: &ScriptValue| -> ScriptResult<Ordering> {
        match (a, b) {
            (ScriptValue::Undefined, ScriptValue::Undefined) => return Ok(Ordering::Equal),
            (ScriptValue::Undefined, _) => return Ok(Ordering::Greater),
            (_, ScriptValue::Undefined) => return Ok(Ordering::Less),
            _ => {}
        }
        match &comparator {
            None => Ok(a.to_string().cmp(&b.to_string())),
            Some(f) => Ok(interp
                .call_value(f, &[a.clone(), b.clone()])?
                .to_number()
                .partial_cmp(&0.0)
                .unwrap_or(Ordering::Equal)),
        }
    };
    merge_sort(items, &mut compare)
}

/// Stable top-down merge sort. It tolerates comparators that are not a total
/// order and stops at the first comparator error.
fn merge_sort<F>(mut items: Vec<ScriptValue>, compare: &mut F) -> ScriptResult<Vec<ScriptValue>>
where
    F: FnMut(&ScriptValue, &ScriptValue) -> ScriptResult<Ordering>,
{
    if items.len() < 2 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        let next = if compare(a, b)? == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn string_method(
    interp: &Interpreter,
    s: &str,
    method: &str,
    args: &[ScriptValue],
) -> ScriptResult<Option<ScriptValue>> {
    let text_arg = |index: usize| arg(args, index).to_string();
    let value = match method {
        "toUpperCase" => ScriptValue::String(s.to_uppercase()),
        "toLowerCase" => ScriptValue::String(s.to_lowercase()),
        "trim" => ScriptValue::String(s.trim().to_owned()),
        "toString" => ScriptValue::String(s.to_owned()),
        "includes" => ScriptValue::Bool(s.contains(text_arg(0).as_str())),
        "startsWith" => ScriptValue::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => ScriptValue::Bool(s.ends_with(text_arg(0).as_str())),
        "indexOf" => {
            let needle = text_arg(0);
            ScriptValue::Number(s.find(needle.as_str()).map_or(-1.0, |byte| {
                s[..byte].chars().count() as f64
            }))
        }
        "replace" => ScriptValue::String(s.replacen(text_arg(0).as_str(), &text_arg(1), 1)),
        "split" => match args.first() {
            None | Some(ScriptValue::Undefined) => {
                ScriptValue::Array(vec![ScriptValue::String(s.to_owned())])
            }
            Some(separator) => {
                let separator = separator.to_string();
                let parts = if separator.is_empty() {
                    s.chars().count()
                } else {
                    s.matches(separator.as_str()).count() + 1
                };
                let size = parts.saturating_mul(VALUE_SLOT_BYTES);
                interp.check_size(size.saturating_add(s.len()))?;
                let parts: Vec<ScriptValue> = if separator.is_empty() {
                    s.chars().map(|c| ScriptValue::String(c.to_string())).collect()
                } else {
                    s.split(separator.as_str())
                        .map(|part| ScriptValue::String(part.to_owned()))
                        .collect()
                };
                ScriptValue::Array(parts)
            }
        },
        "slice" | "substring" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), args);
            ScriptValue::String(chars[start..end].iter().collect())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn number_method(n: f64, method: &str, args: &[ScriptValue]) -> Option<ScriptValue> {
    match method {
        "toFixed" => {
            let digits = match args.first() {
                None | Some(ScriptValue::Undefined) => 0,
                Some(value) => value.to_number().clamp(0.0, 100.0) as usize,
            };
            if !n.is_finite() {
                return Some(ScriptValue::String(property_name(&ScriptValue::Number(n))));
            }
            Some(ScriptValue::String(format!("{n:.digits$}")))
        }
        "toString" => Some(ScriptValue::String(property_name(&ScriptValue::Number(n)))),
        _ => None,
    }
}
