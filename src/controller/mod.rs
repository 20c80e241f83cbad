//! # Controller Module
//!
//! Controller classes are the unit the router resolves to. A class has a name (the
//! title-cased path segment that selects it), a set of handler methods keyed by
//! `METHOD` or `METHOD_version`, and optionally a per-request state factory.
//!
//! ## Handler methods
//!
//! A [`HandlerMethod`] wraps the handler body together with:
//!
//! - its validators, run in declaration order before the body
//! - its positional arity; a request whose leftover path segments do not fit is a 404,
//!   the same as a path that names nothing
//!
//! ```rust
//! use endpoints::controller::{ControllerClass, HandlerMethod};
//! use endpoints::params::{ParamSpec, ParamType};
//! use serde_json::json;
//!
//! let users = ControllerClass::builder("Users")
//!     // GET /users/<id>
//!     .method(
//!         "GET",
//!         HandlerMethod::new(|_ctl, args| Ok(Some(json!({ "id": args.arg(0) })))).positional(1),
//!     )
//!     // POST /users with Accept: application/json;version=v2
//!     .method(
//!         "POST_v2",
//!         HandlerMethod::new(|ctl, args| {
//!             ctl.response.set_status(http::StatusCode::CREATED);
//!             Ok(Some(json!({ "name": args.get("name") })))
//!         })
//!         .param(ParamSpec::body("name").param_type(ParamType::Str)),
//!     )
//!     .build();
//!
//! assert!(users.has_method("POST_v2"));
//! ```
//!
//! ## Per-request state
//!
//! [`ControllerClass::with_state`] attaches a factory that builds a fresh `S` from the request
//! before any validator runs. Handler bodies reach it through [`Controller::state`].
//!
//! ## CORS
//!
//! A class built with [`ClassBuilder::cors`] echoes the request `Origin` on every outcome
//! and answers `OPTIONS` preflights itself unless it defines an `OPTIONS` handler.

mod core;

pub use core::{ArgArity, ClassBuilder, Controller, ControllerClass, HandlerMethod};
pub(crate) use core::MethodInvoker;
