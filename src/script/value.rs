use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use super::ast::Function;

/// Size charged for each value slot, on top of string and key bytes.
pub(crate) const VALUE_SLOT_BYTES: usize = 16;

/// Constructors exposed through the charting namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFunction {
    LinearGradient,
    RadialGradient,
}

/// Runtime value inside the sandbox.
///
/// Objects keep insertion order so evaluated configs serialize back with the
/// key order the author wrote.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    /// Computed number.
    Number(f64),
    /// Number read from source text or input JSON, kept in that exact form
    /// until arithmetic touches it.
    Exact(Number),
    String(String),
    Array(Vec<ScriptValue>),
    Object(IndexMap<String, ScriptValue>),
    Function(Rc<Function>),
    Native(NativeFunction),
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Exact(a), Self::Exact(b)) if a.is_f64() == b.is_f64() => a == b,
            (Self::Number(_) | Self::Exact(_), Self::Number(_) | Self::Exact(_)) => {
                self.to_number() == other.to_number()
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Native(a), Self::Native(b)) => a == b,
            _ => false,
        }
    }
}

impl ScriptValue {
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Exact(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Converts to plain JSON data with `JSON.stringify` semantics: functions
    /// and `undefined` are dropped from objects and become `null` in arrays,
    /// non-finite numbers become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Undefined | Self::Null | Self::Function(_) | Self::Native(_) => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Exact(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    if value.is_json_omitted() {
                        continue;
                    }
                    out.insert(key.clone(), value.to_json());
                }
                Value::Object(out)
            }
        }
    }

    fn is_json_omitted(&self) -> bool {
        matches!(self, Self::Undefined | Self::Function(_) | Self::Native(_))
    }

    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Exact(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Array(_) | Self::Object(_) => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) | Self::Exact(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) | Self::Native(_) => "function",
        }
    }

    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Exact(n) => n.as_f64().unwrap_or(f64::NAN),
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Self::Array(items) if items.is_empty() => 0.0,
            Self::Array(items) if items.len() == 1 => items[0].to_number(),
            _ => f64::NAN,
        }
    }

    /// Unary minus; exact numbers stay exact while the result fits.
    #[must_use]
    pub fn negate(&self) -> Self {
        if let Self::Exact(n) = self {
            let negated = if let Some(value) = n.as_u64() {
                i64::try_from(-i128::from(value)).ok().map(Number::from)
            } else if let Some(value) = n.as_i64() {
                Some(Number::from(value.unsigned_abs()))
            } else {
                n.as_f64().and_then(|value| Number::from_f64(-value))
            };
            if let Some(negated) = negated {
                return Self::Exact(negated);
            }
        }
        Self::Number(-self.to_number())
    }

    /// Approximate heap footprint in bytes, counted up to just past `cap`.
    #[must_use]
    pub fn approx_size(&self, cap: usize) -> usize {
        let mut total = VALUE_SLOT_BYTES;
        match self {
            Self::String(s) => total += s.len(),
            Self::Array(items) => {
                for item in items {
                    if total > cap {
                        break;
                    }
                    total = total.saturating_add(item.approx_size(cap - total));
                }
            }
            Self::Object(map) => {
                for (key, value) in map {
                    if total > cap {
                        break;
                    }
                    total = total.saturating_add(key.len());
                    total = total.saturating_add(value.approx_size(cap.saturating_sub(total)));
                }
            }
            _ => {}
        }
        total
    }

    /// Strict equality; arrays and objects compare structurally.
    #[must_use]
    pub fn strict_equals(&self, other: &Self) -> bool {
        self == other
    }

    #[must_use]
    pub fn loose_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Self::Number(_) | Self::Exact(_), Self::String(_))
            | (Self::String(_), Self::Number(_) | Self::Exact(_))
            | (Self::Bool(_), _)
            | (_, Self::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Exact(n) => f.write_str(&exact_key(n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
            Self::Function(_) | Self::Native(_) => f.write_str("function () { [code] }"),
        }
    }
}

/// Formats a number the way JavaScript's `String(n)` does for the common cases.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{n:.0}");
    }
    format!("{n}")
}

/// Spelling of an exact number as a property key or string: integers print
/// in full, floats the way JavaScript prints them.
#[must_use]
pub fn exact_key(n: &Number) -> String {
    match n.as_f64() {
        Some(value) if n.is_f64() => format_number(value),
        _ => n.to_string(),
    }
}

/// Integral values inside the exactly-representable range become JSON integers.
#[must_use]
pub fn number_to_json(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        if n >= 0.0 {
            return Value::Number(Number::from(n as u64));
        }
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ScriptValue, format_number};

    #[test]
    fn numbers_format_like_javascript() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn json_conversion_drops_undefined_and_keeps_integers() {
        let value = ScriptValue::from_json(&json!({ "a": 1, "b": [1.5, null] }));
        let ScriptValue::Object(mut map) = value else {
            panic!("expected object");
        };
        map.insert("gone".to_owned(), ScriptValue::Undefined);
        let back = ScriptValue::Object(map).to_json();
        assert_eq!(back, json!({ "a": 1, "b": [1.5, null] }));
    }

    #[test]
    fn exact_numbers_keep_their_json_form() {
        let value = ScriptValue::from_json(&json!({ "a": 2.0, "big": 9_007_199_254_740_993u64 }));
        assert_eq!(value.to_json(), json!({ "a": 2.0, "big": 9_007_199_254_740_993u64 }));
        assert_eq!(
            ScriptValue::from_json(&json!(9_007_199_254_740_993u64)).negate().to_json(),
            json!(-9_007_199_254_740_993i64)
        );
        assert_eq!(ScriptValue::from_json(&json!(2.0)).negate().to_json(), json!(-2.0));
        assert_eq!(ScriptValue::from_json(&json!(2)), ScriptValue::Number(2.0));
    }

    #[test]
    fn loose_equality_coerces_numbers_and_strings() {
        assert!(ScriptValue::Number(1.0).loose_equals(&ScriptValue::String("1".to_owned())));
        assert!(ScriptValue::Null.loose_equals(&ScriptValue::Undefined));
        assert!(!ScriptValue::Null.loose_equals(&ScriptValue::Number(0.0)));
    }
}
