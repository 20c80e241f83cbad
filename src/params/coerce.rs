use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

/// User supplied coercion. The `Err` string explains why the value was rejected.
pub type CoerceFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Target type of a parameter.
#[derive(Clone)]
pub enum ParamType {
    /// Strings; numbers and booleans are rendered to text.
    Str,
    /// 64-bit signed integers.
    Int,
    Float,
    /// `true`/`false`/`1`/`0`, case-insensitive.
    Bool,
    /// Arrays; a string is split on commas.
    List,
    Custom(CoerceFn),
}

impl ParamType {
    /// Wrap a coercion function.
    #[must_use]
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        ParamType::Custom(Arc::new(f))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
            ParamType::List => "list",
            ParamType::Custom(_) => "custom",
        }
    }

    /// Convert `value` to this type.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match self {
            ParamType::Str => to_str(value),
            ParamType::Int => to_int(value),
            ParamType::Float => to_float(value),
            ParamType::Bool => to_bool(value),
            ParamType::List => Ok(to_list(value)),
            ParamType::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_str(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err("not a string".to_string()),
    }
}

fn to_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "not an integer".to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                Ok(Value::from(f as i64))
            }
            _ => Err("not an integer".to_string()),
        },
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        _ => Err("not an integer".to_string()),
    }
}

fn to_float(value: &Value) -> Result<Value, String> {
    let f = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    f.and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| "not a number".to_string())
}

fn to_bool(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err("not a boolean".to_string()),
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(Value::Bool(true)),
            Some(0) => Ok(Value::Bool(false)),
            _ => Err("not a boolean".to_string()),
        },
        _ => Err("not a boolean".to_string()),
    }
}

fn to_list(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        Value::String(s) => Value::Array(split_commas(s)),
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![other.clone()]),
    }
}

/// `"1, 2,,3"` to `["1", "2", "3"]`.
pub(crate) fn split_commas(s: &str) -> Vec<Value> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Value::String(p.to_string()))
        .collect()
}
