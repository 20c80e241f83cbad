use super::*;
use crate::error::CallError;
use crate::transport::Request;
use http::{Method, StatusCode};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicI64, Ordering};

fn kwargs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn get() -> Request {
    Request::builder(Method::GET, "/").build()
}

fn apply(spec: &ParamSpec, request: &Request, raw: Value) -> Result<CallArgs, CallError> {
    let mut args = CallArgs::new(Vec::new(), kwargs(raw));
    spec.apply(request, &mut args)?;
    Ok(args)
}

#[test]
fn test_dest() {
    let spec = ParamSpec::new("foo").dest("bar");
    let args = apply(&spec, &get(), json!({"foo": 1})).unwrap();
    assert_eq!(args.get("bar"), Some(&json!(1)));
    assert!(!args.contains("foo"));
}

#[test]
fn test_aliases() {
    let spec = ParamSpec::new("foo")
        .alias("foos")
        .alias("foo3")
        .param_type(ParamType::Int);
    let req = get();
    assert_eq!(
        apply(&spec, &req, json!({"foo": 1})).unwrap().get("foo"),
        Some(&json!(1))
    );
    assert_eq!(
        apply(&spec, &req, json!({"foos": 2})).unwrap().get("foo"),
        Some(&json!(2))
    );
    let args = apply(&spec, &req, json!({"foo3": "3"})).unwrap();
    assert_eq!(args.get("foo"), Some(&json!(3)));
    assert!(!args.contains("foo3"));
    assert!(apply(&spec, &req, json!({"foo4": 1})).is_err());
}

#[test]
fn test_first_alias_wins() {
    let spec = ParamSpec::new("foo").alias("bar");
    let args = apply(&spec, &get(), json!({"bar": "b", "foo": "f"})).unwrap();
    assert_eq!(args.get("foo"), Some(&json!("f")));
    assert!(!args.contains("bar"));
}

#[test]
fn test_callable_default_is_evaluated_per_call() {
    let counter = std::sync::Arc::new(AtomicI64::new(0));
    let c = std::sync::Arc::clone(&counter);
    let spec = ParamSpec::new("foo").default_with(move || json!(c.fetch_add(1, Ordering::SeqCst)));
    let req = get();
    let r1 = apply(&spec, &req, json!({})).unwrap();
    let r2 = apply(&spec, &req, json!({})).unwrap();
    assert_eq!(r1.get("foo"), Some(&json!(0)));
    assert_eq!(r2.get("foo"), Some(&json!(1)));
}

#[test]
fn test_not_required() {
    let req = get();
    let spec = ParamSpec::new("foo").optional();
    assert!(apply(&spec, &req, json!({"foo": 1})).unwrap().contains("foo"));
    assert!(!apply(&spec, &req, json!({})).unwrap().contains("foo"));

    let spec = ParamSpec::new("foo").optional().default_value(json!(5));
    assert_eq!(
        apply(&spec, &req, json!({})).unwrap().get("foo"),
        Some(&json!(5))
    );

    let spec = ParamSpec::new("foo").param_type(ParamType::Int).optional();
    assert!(!apply(&spec, &req, json!({})).unwrap().contains("foo"));
}

#[test]
fn test_required_missing() {
    let spec = ParamSpec::new("foo").param_type(ParamType::Int);
    let err = apply(&spec, &get(), json!({})).unwrap_err();
    assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    assert!(err.to_string().contains("foo"));
}

#[test]
fn test_zero_is_empty_unless_allowed() {
    let spec = ParamSpec::new("foo").param_type(ParamType::Int);
    assert!(apply(&spec, &get(), json!({"foo": 0})).is_err());
    let spec = spec.allow_empty(true);
    assert_eq!(
        apply(&spec, &get(), json!({"foo": 0})).unwrap().get("foo"),
        Some(&json!(0))
    );
}

#[test]
fn test_default_checked_against_choices() {
    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .choices([1, 2, 3])
        .default_value(json!(0));
    let err = apply(&spec, &get(), json!({})).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .choices([1, 2, 3])
        .default_value(json!(2));
    assert_eq!(
        apply(&spec, &get(), json!({})).unwrap().get("foo"),
        Some(&json!(2))
    );
}

#[test]
fn test_default_is_coerced() {
    let spec = ParamSpec::new("page")
        .param_type(ParamType::Int)
        .default_value(json!("3"));
    assert_eq!(
        apply(&spec, &get(), json!({})).unwrap().get("page"),
        Some(&json!(3))
    );

    let spec = ParamSpec::new("page")
        .param_type(ParamType::Int)
        .default_value(json!("three"));
    assert!(apply(&spec, &get(), json!({})).is_err());
}

#[test]
fn test_falsy_default_skips_empty_check() {
    let spec = ParamSpec::new("foo").default_value(json!(0));
    assert_eq!(
        apply(&spec, &get(), json!({})).unwrap().get("foo"),
        Some(&json!(0))
    );

    // null is bound without coercion even for typed params
    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .choices([1, 2, 3])
        .default_value(Value::Null);
    assert_eq!(
        apply(&spec, &get(), json!({})).unwrap().get("foo"),
        Some(&Value::Null)
    );
}

#[test]
fn test_choices() {
    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .choices([1, 2, 3]);
    let req = get();
    assert_eq!(
        apply(&spec, &req, json!({"foo": "1"})).unwrap().get("foo"),
        Some(&json!(1))
    );
    assert_eq!(
        apply(&spec, &req, json!({"foo": "2"})).unwrap().get("foo"),
        Some(&json!(2))
    );
    let err = apply(&spec, &req, json!({"foo": "8"})).unwrap_err();
    assert!(err.to_string().contains("choices"));
}

#[test]
fn test_body_only() {
    let spec = ParamSpec::body("foo")
        .param_type(ParamType::Int)
        .choices([1, 2, 3]);

    let post = |target: &str, body: Value| {
        let mut req = Request::builder(Method::POST, target).json(&body).build();
        req.load_body().unwrap();
        req
    };

    // present only in the query
    let req = post("/?foo=1", json!({}));
    assert!(apply(&spec, &req, Value::Object(req.kwargs())).is_err());

    // present in the body but not a valid choice
    let req = post("/", json!({"foo": "8"}));
    assert!(apply(&spec, &req, Value::Object(req.kwargs())).is_err());

    let req = post("/", json!({"foo": "1"}));
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!(1)));

    let req = post("/?foo=1", json!({"foo": "3"}));
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!(3)));
}

#[test]
fn test_query_only() {
    let spec = ParamSpec::query("foo")
        .param_type(ParamType::Int)
        .choices([1, 2, 3]);

    let req = Request::builder(Method::GET, "/?foo=8").build();
    assert!(apply(&spec, &req, Value::Object(req.kwargs())).is_err());

    let req = Request::builder(Method::GET, "/?foo=1").build();
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!(1)));

    // a body value never satisfies a query parameter
    let mut req = Request::builder(Method::POST, "/")
        .json(&json!({"foo": "1"}))
        .build();
    req.load_body().unwrap();
    assert!(apply(&spec, &req, Value::Object(req.kwargs())).is_err());
}

#[test]
fn test_stacked_specs() {
    let req = Request::builder(Method::GET, "/?foo=1&bar=1.5").build();
    let mut args = CallArgs::from_request(&req, Vec::new());
    ParamSpec::query("foo")
        .param_type(ParamType::Int)
        .apply(&req, &mut args)
        .unwrap();
    ParamSpec::query("bar")
        .param_type(ParamType::Float)
        .apply(&req, &mut args)
        .unwrap();
    assert_eq!(args.get_i64("foo"), Some(1));
    assert_eq!(args.get("bar"), Some(&json!(1.5)));
}

#[test]
fn test_store_list() {
    let spec = ParamSpec::query("foo")
        .param_type(ParamType::Int)
        .store_list();

    let req = Request::builder(Method::GET, "/?foo=1,2,3,4").build();
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!([1, 2, 3, 4])));

    let req = Request::builder(Method::GET, "/?foo=1,2,3,4&foo=5").build();
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!([1, 2, 3, 4, 5])));
}

#[test]
fn test_store_list_splits_every_element() {
    let spec = ParamSpec::query("foo")
        .param_type(ParamType::Str)
        .store_list();
    let req = Request::builder(Method::GET, "/?foo=a,b&foo=c").build();
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!(["a", "b", "c"])));

    // replaces rather than extends an earlier binding
    let mut args = CallArgs::new(Vec::new(), kwargs(json!({"foo": ["x,y", "z"], "ids": [9]})));
    ParamSpec::new("foo")
        .dest("ids")
        .store_list()
        .apply(&get(), &mut args)
        .unwrap();
    assert_eq!(args.get("ids"), Some(&json!(["x", "y", "z"])));
}

#[test]
fn test_append_list() {
    let spec = ParamSpec::query("foo")
        .param_type(ParamType::Int)
        .append_list();
    let req = Request::builder(Method::GET, "/?foo=1,2,3,4&foo=5").build();
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("foo"), Some(&json!([1, 2, 3, 4, 5])));
}

#[test]
fn test_append_list_extends_earlier_binding() {
    let req = get();
    let mut args = CallArgs::new(Vec::new(), kwargs(json!({"a": "1,2", "b": "3"})));
    ParamSpec::new("a")
        .dest("ids")
        .param_type(ParamType::Int)
        .append_list()
        .apply(&req, &mut args)
        .unwrap();
    ParamSpec::new("b")
        .dest("ids")
        .param_type(ParamType::Int)
        .append_list()
        .apply(&req, &mut args)
        .unwrap();
    assert_eq!(args.get("ids"), Some(&json!([1, 2, 3])));
}

#[test]
fn test_repeated_key_single_keeps_last() {
    let spec = ParamSpec::query("page").param_type(ParamType::Int);
    let req = Request::builder(Method::GET, "/?page=1&page=2").build();
    let args = apply(&spec, &req, Value::Object(req.kwargs())).unwrap();
    assert_eq!(args.get("page"), Some(&json!(2)));
}

#[test]
fn test_size_numbers() {
    let req = get();
    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .min_size(100.0);
    assert!(apply(&spec, &req, json!({"foo": 50})).is_err());
    assert_eq!(
        apply(&spec, &req, json!({"foo": 200})).unwrap().get("foo"),
        Some(&json!(200))
    );

    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .max_size(100.0);
    assert!(apply(&spec, &req, json!({"foo": 200})).is_err());
    assert!(apply(&spec, &req, json!({"foo": 20})).is_ok());

    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Int)
        .min_size(100.0)
        .max_size(200.0);
    assert!(apply(&spec, &req, json!({"foo": 120})).is_ok());
}

#[test]
fn test_size_strings_count_chars() {
    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Str)
        .min_size(2.0)
        .max_size(4.0);
    let req = get();
    assert!(apply(&spec, &req, json!({"foo": "bar"})).is_ok());
    assert!(apply(&spec, &req, json!({"foo": "über"})).is_ok());
    assert!(apply(&spec, &req, json!({"foo": "barbar"})).is_err());
}

#[test]
fn test_custom_type() {
    let spec = ParamSpec::new("foo").param_type(ParamType::custom(|v| {
        v.as_str()
            .map(|s| Value::String(s.to_uppercase()))
            .ok_or_else(|| "expected text".to_string())
    }));
    let args = apply(&spec, &get(), json!({"foo": "bar"})).unwrap();
    assert_eq!(args.get_str("foo"), Some("BAR"));
}

#[test]
fn test_null_default() {
    let spec = ParamSpec::new("foo").default_value(Value::Null);
    let args = apply(&spec, &get(), json!({})).unwrap();
    assert_eq!(args.get("foo"), Some(&Value::Null));
}

#[test]
fn test_reference_default_not_shared() {
    let spec = ParamSpec::new("foo").default_value(json!({}));
    let req = get();
    for _ in 0..2 {
        let mut args = apply(&spec, &req, json!({})).unwrap();
        let map = args.kwargs.get_mut("foo").and_then(Value::as_object_mut).unwrap();
        map.insert("k".to_string(), json!("v"));
        assert_eq!(map.len(), 1);
    }

    let spec = ParamSpec::new("foo").default_value(json!([]));
    for _ in 0..2 {
        let mut args = apply(&spec, &req, json!({})).unwrap();
        let list = args.kwargs.get_mut("foo").and_then(Value::as_array_mut).unwrap();
        list.push(json!(1));
        assert_eq!(list.len(), 1);
    }
}

#[test]
fn test_pattern_is_full_match() {
    let spec = ParamSpec::new("foo").pattern(r"\S+@\S+").unwrap();
    let req = get();
    assert!(apply(&spec, &req, json!({"foo": "foo@bar.com"})).is_ok());
    assert!(apply(&spec, &req, json!({"foo": " foo@bar.com"})).is_err());

    let spec = ParamSpec::new("foo").pattern(r"(?i)^[a-z]+@\S+$").unwrap();
    assert!(apply(&spec, &req, json!({"foo": "FOO@bar.com"})).is_ok());
    assert!(apply(&spec, &req, json!({"foo": "foo bar@bar.com"})).is_err());
}

#[test]
fn test_invalid_pattern() {
    assert!(ParamSpec::new("foo").pattern("(").is_err());
}

#[test]
fn test_bool() {
    let spec = ParamSpec::new("foo")
        .param_type(ParamType::Bool)
        .allow_empty(true);
    let req = get();
    for (raw, expected) in [
        ("true", true),
        ("True", true),
        ("1", true),
        ("false", false),
        ("False", false),
        ("0", false),
    ] {
        let args = apply(&spec, &req, json!({ "foo": raw })).unwrap();
        assert_eq!(args.get("foo"), Some(&json!(expected)), "input {raw}");
    }

    // "False" is a non-empty string, so it passes without allow_empty
    let spec = ParamSpec::new("bar").param_type(ParamType::Bool);
    let args = apply(&spec, &req, json!({"bar": "False"})).unwrap();
    assert_eq!(args.get("bar"), Some(&json!(false)));
}

#[test]
fn test_list_type() {
    let spec = ParamSpec::new("foo").param_type(ParamType::List);
    let args = apply(&spec, &get(), json!({"foo": ["bar", "baz"]})).unwrap();
    assert_eq!(args.get("foo"), Some(&json!(["bar", "baz"])));
}

#[test]
fn test_require_params() {
    let req = get();
    let strict = RequireParams::new(["foo", "bar"]);
    let lenient = RequireParams::new(["foo", "bar"]).allow_empty(true);

    let mut args = CallArgs::new(Vec::new(), kwargs(json!({"foo": 1})));
    assert!(strict.apply(&req, &mut args).is_err());
    assert!(lenient.apply(&req, &mut args).is_err());

    let mut args = CallArgs::new(Vec::new(), kwargs(json!({"foo": 1, "bar": 2})));
    assert!(strict.apply(&req, &mut args).is_ok());
    assert!(lenient.apply(&req, &mut args).is_ok());

    let mut args = CallArgs::new(Vec::new(), kwargs(json!({"foo": 1, "bar": 0})));
    assert!(strict.apply(&req, &mut args).is_err());
    assert!(lenient.apply(&req, &mut args).is_ok());
}

#[test]
fn test_four_stacked_params() {
    let req = get();
    let mut args = CallArgs::new(
        Vec::new(),
        kwargs(json!({"foo": 1, "bar": 2, "che": 3, "baz": 4})),
    );
    for name in ["foo", "bar", "che", "baz"] {
        ParamSpec::new(name).apply(&req, &mut args).unwrap();
    }
    assert_eq!(args.kwargs.len(), 4);
}
