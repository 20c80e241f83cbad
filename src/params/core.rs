use super::coerce::{split_commas, ParamType};
use crate::error::CallError;
use crate::transport::Request;
use regex::Regex;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Positional arguments stay inline up to this count.
pub const MAX_INLINE_ARGS: usize = 4;

/// Positional arguments (the path segments left over after routing).
pub type ArgVec = SmallVec<[String; MAX_INLINE_ARGS]>;

/// Lazily evaluated default. Called once per call that needs it, so mutable defaults such as
/// an empty map are never shared between calls.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Arguments bound for one handler invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub args: ArgVec,
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    #[must_use]
    pub fn new(args: impl IntoIterator<Item = String>, kwargs: Map<String, Value>) -> Self {
        Self {
            args: args.into_iter().collect(),
            kwargs,
        }
    }

    /// Positional `args` plus the request's merged query and body parameters.
    #[must_use]
    pub fn from_request(request: &Request, args: impl IntoIterator<Item = String>) -> Self {
        Self::new(args, request.kwargs())
    }

    #[inline]
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.kwargs.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.kwargs.get(name).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kwargs.contains_key(name)
    }

    /// Remove and return a keyword argument.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.kwargs.remove(name)
    }
}

/// A check (and possibly a transformation) applied to the arguments before the handler body.
pub trait Validator: Send + Sync {
    /// Inspect the request and arguments; rebind or reject.
    fn apply(&self, request: &Request, args: &mut CallArgs) -> Result<(), CallError>;
}

/// How repeated or comma separated values are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultipleAction {
    /// One value; when the key repeats the last value wins.
    #[default]
    Single,
    /// Every string element is split on commas and the pieces are flattened into a new list.
    StoreList,
    /// Like `StoreList`, then appended to any list already bound under the destination.
    AppendList,
}

/// Where a parameter is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamSource {
    /// Query and body merged, body wins.
    #[default]
    Merged,
    Query,
    Body,
}

/// Declarative description of one named parameter.
#[derive(Clone)]
pub struct ParamSpec {
    names: Vec<String>,
    dest: Option<String>,
    required: bool,
    default: Option<DefaultFn>,
    param_type: Option<ParamType>,
    choices: Option<Vec<Value>>,
    min_size: Option<f64>,
    max_size: Option<f64>,
    pattern: Option<Regex>,
    action: MultipleAction,
    source: ParamSource,
    allow_empty: bool,
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("names", &self.names)
            .field("dest", &self.dest)
            .field("required", &self.required)
            .field("has_default", &self.default.is_some())
            .field("param_type", &self.param_type)
            .field("choices", &self.choices)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("action", &self.action)
            .field("source", &self.source)
            .field("allow_empty", &self.allow_empty)
            .finish()
    }
}

impl ParamSpec {
    /// A required parameter named `name`, looked up in the merged query and body.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            dest: None,
            required: true,
            default: None,
            param_type: None,
            choices: None,
            min_size: None,
            max_size: None,
            pattern: None,
            action: MultipleAction::Single,
            source: ParamSource::Merged,
            allow_empty: false,
        }
    }

    /// Parameter read from the query string only.
    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name).source(ParamSource::Query)
    }

    /// Parameter read from the request body only.
    #[must_use]
    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name).source(ParamSource::Body)
    }

    /// Another accepted name. Names are tried in declaration order.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Bind under `dest` instead of the canonical name.
    #[must_use]
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Default value, cloned for every call that needs it. A non-null default goes through
    /// the same coercion and constraints as a supplied value.
    #[must_use]
    pub fn default_value(self, value: Value) -> Self {
        self.default_with(move || value.clone())
    }

    /// Default computed on every call that needs it.
    #[must_use]
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn param_type(mut self, param_type: ParamType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    /// Allowed values, compared after coercion.
    #[must_use]
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Lower bound on the value (numbers), character count (strings) or length (lists, maps).
    #[must_use]
    pub fn min_size(mut self, min: f64) -> Self {
        self.min_size = Some(min);
        self
    }

    /// Upper bound, measured like [`min_size`](Self::min_size).
    #[must_use]
    pub fn max_size(mut self, max: f64) -> Self {
        self.max_size = Some(max);
        self
    }

    /// The whole value must match `pattern`.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Regex::new(&format!("^(?:{pattern})$"))?);
        Ok(self)
    }

    #[must_use]
    pub fn store_list(mut self) -> Self {
        self.action = MultipleAction::StoreList;
        self
    }

    #[must_use]
    pub fn append_list(mut self) -> Self {
        self.action = MultipleAction::AppendList;
        self
    }

    #[must_use]
    pub fn source(mut self, source: ParamSource) -> Self {
        self.source = source;
        self
    }

    /// Accept empty values (`""`, `0`, `false`, `null`, empty lists and maps).
    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// The first declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.names.first().map_or("", String::as_str)
    }

    /// Keyword the coerced value is bound under.
    #[must_use]
    pub fn dest_name(&self) -> &str {
        self.dest.as_deref().unwrap_or_else(|| self.name())
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Find the raw value. Every alias found is removed from the keyword arguments so only
    /// the destination binding remains.
    fn lookup(&self, request: &Request, args: &mut CallArgs) -> Option<Value> {
        let mut found = None;
        for name in &self.names {
            let value = match self.source {
                ParamSource::Merged => args.kwargs.remove(name),
                ParamSource::Query => {
                    args.kwargs.remove(name);
                    request.query().get(name).cloned()
                }
                ParamSource::Body => {
                    args.kwargs.remove(name);
                    request.body_kwargs().get(name).cloned()
                }
            };
            if found.is_none() {
                found = value;
            }
        }
        found
    }

    /// Apply the multiple-value action.
    fn collect(&self, value: Value, existing: Option<Value>) -> Value {
        match self.action {
            MultipleAction::Single => match value {
                Value::Array(mut items) if !matches!(self.param_type, Some(ParamType::List)) => {
                    items.pop().unwrap_or(Value::Null)
                }
                other => other,
            },
            MultipleAction::StoreList => Value::Array(flatten_commas(Vec::new(), value)),
            MultipleAction::AppendList => {
                let items = match existing {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                Value::Array(flatten_commas(items, value))
            }
        }
    }

    fn coerce(&self, value: Value) -> Result<Value, CallError> {
        let Some(param_type) = &self.param_type else {
            return Ok(value);
        };
        let elementwise = self.action != MultipleAction::Single
            && !matches!(param_type, ParamType::List);
        let convert = |v: &Value| {
            param_type.coerce(v).map_err(|reason| {
                CallError::validation(format!(
                    "param {} with value {} failed {} coercion: {}",
                    self.name(),
                    v,
                    param_type.name(),
                    reason
                ))
            })
        };
        match value {
            Value::Array(items) if elementwise => items
                .iter()
                .map(convert)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => convert(&other),
        }
    }

    fn check(&self, value: &Value) -> Result<(), CallError> {
        match value {
            Value::Array(items) if self.action != MultipleAction::Single => {
                items.iter().try_for_each(|item| self.check_one(item))
            }
            other => self.check_one(other),
        }
    }

    fn check_one(&self, value: &Value) -> Result<(), CallError> {
        let name = self.name();

        if let Some(choices) = &self.choices {
            if !choices.iter().any(|c| values_equal(c, value)) {
                return Err(CallError::validation(format!(
                    "param {name} with value {value} not in choices"
                )));
            }
        }

        if self.min_size.is_some() || self.max_size.is_some() {
            if let Some(size) = measure(value) {
                if let Some(min) = self.min_size {
                    if size < min {
                        return Err(CallError::validation(format!(
                            "param {name} was smaller than {min}"
                        )));
                    }
                }
                if let Some(max) = self.max_size {
                    if size > max {
                        return Err(CallError::validation(format!(
                            "param {name} was bigger than {max}"
                        )));
                    }
                }
            }
        }

        if let Some(pattern) = &self.pattern {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if !pattern.is_match(&text) {
                return Err(CallError::validation(format!(
                    "param {name} with value {value} does not match the required pattern"
                )));
            }
        }

        Ok(())
    }
}

impl Validator for ParamSpec {
    fn apply(&self, request: &Request, args: &mut CallArgs) -> Result<(), CallError> {
        let dest = self.dest_name().to_string();

        let Some(raw) = self.lookup(request, args) else {
            if let Some(default) = &self.default {
                // null means "no value" and skips coercion and constraints
                let mut value = default();
                if !value.is_null() {
                    value = self.coerce(value)?;
                    self.check(&value)?;
                }
                args.kwargs.insert(dest, value);
            } else if self.required {
                return Err(CallError::validation(format!(
                    "required param {} was not present",
                    self.name()
                )));
            }
            return Ok(());
        };

        if !self.allow_empty && is_empty(&raw) {
            return Err(CallError::validation(format!(
                "param {} was empty",
                self.name()
            )));
        }

        let existing = match self.action {
            MultipleAction::AppendList => args.kwargs.remove(&dest),
            _ => None,
        };
        let value = self.coerce(self.collect(raw, existing))?;
        self.check(&value)?;
        args.kwargs.insert(dest, value);
        Ok(())
    }
}

/// `null`, `false`, `0`, `""`, `[]` and `{}`.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Split every string in `value` (a list or a single value) on commas and push the pieces
/// onto `items`.
fn flatten_commas(mut items: Vec<Value>, value: Value) -> Vec<Value> {
    let pieces = match value {
        Value::Array(values) => values,
        other => vec![other],
    };
    for piece in pieces {
        match piece {
            Value::String(s) => items.extend(split_commas(&s)),
            other => items.push(other),
        }
    }
    items
}

/// Size of a value for min/max checks; `None` for values without one.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        Value::Object(o) => Some(o.len() as f64),
        Value::Bool(_) | Value::Null => None,
    }
}

/// Equality that treats `1` and `1.0` as the same choice.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Every named parameter must be present, and non-empty unless `allow_empty`.
#[derive(Debug, Clone)]
pub struct RequireParams {
    names: Vec<String>,
    allow_empty: bool,
}

impl RequireParams {
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            allow_empty: false,
        }
    }

    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

impl Validator for RequireParams {
    fn apply(&self, _request: &Request, args: &mut CallArgs) -> Result<(), CallError> {
        for name in &self.names {
            match args.kwargs.get(name) {
                None => {
                    return Err(CallError::validation(format!(
                        "required param {name} was not present"
                    )))
                }
                Some(v) if !self.allow_empty && is_empty(v) => {
                    return Err(CallError::validation(format!("param {name} was empty")))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
