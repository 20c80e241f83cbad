#![allow(dead_code)]

pub mod fixtures {
    use endpoints::controller::{ControllerClass, HandlerMethod};
    use endpoints::dispatcher::Dispatcher;
    use endpoints::error::CallError;
    use endpoints::params::{ParamSpec, ParamType};
    use endpoints::router::RoutingTable;
    use endpoints::security::BasicAuth;
    use endpoints::transport::Request;
    use http::{Method, StatusCode};
    use serde_json::json;

    /// The namespace tree most tests run against.
    ///
    /// ```text
    /// app          Default, Redirect, Stop, Auth, Boom, Cors
    /// app.foo      Bar
    /// app.foo.baz  Default, Che
    /// ```
    pub fn routing_table() -> RoutingTable {
        RoutingTable::builder("app")
            .register("", default_class())
            .register("", redirect_class())
            .register("", stop_class())
            .register("", auth_class())
            .register("", boom_class())
            .register("", cors_class())
            .register("foo", bar_class())
            .register("foo.baz", named("Default"))
            .register("foo.baz", named("Che"))
            .build()
    }

    pub fn dispatcher() -> Dispatcher {
        Dispatcher::new(routing_table())
    }

    pub fn get(path: &str) -> Request {
        Request::builder(Method::GET, path).build()
    }

    /// Answers `GET` with its class name and positional arguments.
    pub fn named(name: &'static str) -> ControllerClass {
        ControllerClass::builder(name)
            .handle("GET", move |_ctl, args| {
                Ok(Some(json!({ "class": name, "args": args.args.to_vec() })))
            })
            .build()
    }

    fn default_class() -> ControllerClass {
        ControllerClass::builder("Default")
            .handle("GET", |_ctl, args| Ok(Some(json!(args.args.to_vec()))))
            .build()
    }

    fn bar_class() -> ControllerClass {
        ControllerClass::builder("Bar")
            .handle("GET", |_ctl, args| Ok(Some(json!(args.args.to_vec()))))
            .method(
                "POST_v2",
                HandlerMethod::new(|_ctl, args| Ok(args.get("foo").cloned()))
                    .param(ParamSpec::body("foo").param_type(ParamType::Str)),
            )
            .handle("POST", |_ctl, _args| Ok(None))
            .method(
                "PUT",
                HandlerMethod::new(|ctl, args| {
                    ctl.response.set_status(StatusCode::CREATED);
                    Ok(Some(json!({ "id": args.arg(0), "size": args.get("size") })))
                })
                .positional(1)
                .param(
                    ParamSpec::new("size")
                        .param_type(ParamType::Int)
                        .choices([1, 2, 3]),
                ),
            )
            .build()
    }

    fn redirect_class() -> ControllerClass {
        ControllerClass::builder("Redirect")
            .handle("GET", |_ctl, _args| Err(CallError::redirect("http://example.com")))
            .build()
    }

    fn stop_class() -> ControllerClass {
        ControllerClass::builder("Stop")
            .handle("GET", |_ctl, _args| {
                Err(CallError::stop(StatusCode::RESET_CONTENT, None))
            })
            .handle("POST", |ctl, _args| {
                ctl.response.set_header(
                    http::header::HeaderName::from_static("x-leak"),
                    http::header::HeaderValue::from_static("1"),
                );
                Err(CallError::stop(StatusCode::OK, Some(json!({ "stopped": true }))))
            })
            .build()
    }

    fn auth_class() -> ControllerClass {
        ControllerClass::builder("Auth")
            .method(
                "GET",
                HandlerMethod::new(|_ctl, _args| Ok(Some(json!("welcome"))))
                    .validator(BasicAuth::new(|_req, user, pass| user == "bar" && pass == "che")),
            )
            .build()
    }

    fn boom_class() -> ControllerClass {
        ControllerClass::builder("Boom")
            .handle("GET", |_ctl, _args| {
                Err(anyhow::anyhow!("database connection refused").into())
            })
            .handle("POST", |_ctl, _args| panic!("handler exploded"))
            .method(
                "PUT",
                HandlerMethod::new(|_ctl, _args| Ok(None)).positional(0),
            )
            .build()
    }

    fn cors_class() -> ControllerClass {
        ControllerClass::builder("Cors")
            .handle("GET", |_ctl, _args| Ok(Some(json!("ok"))))
            .handle("DELETE", |_ctl, _args| Err(CallError::forbidden("no")))
            .cors()
            .build()
    }
}
