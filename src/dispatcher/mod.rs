//! # Dispatcher Module
//!
//! The dispatcher is the single entry point transport adapters call. It turns one normalized
//! [`Request`](crate::transport::Request) into one [`CallOutcome`] and never returns an error
//! outward.
//!
//! ## Call Pipeline
//!
//! 1. Resolve the path to a controller class ([`Router::resolve`](crate::router::Router::resolve)).
//! 2. Read the `version` parameter of the first `Accept` entry matching the configured
//!    content type.
//! 3. Select `METHOD_version` when the class has it, else `METHOD`. CORS classes answer
//!    `OPTIONS` themselves when they define no `OPTIONS` handler.
//! 4. Check the positional arity, read the body and merge query and body parameters.
//! 5. Build the per-request state, run the method's validators in order, then the body.
//! 6. Map the result to a status, headers and body.
//!
//! ## Status Mapping
//!
//! | Result | Status | Extra |
//! |---|---|---|
//! | `Ok(Some(v))` | 200 or handler-set | body `v` |
//! | `Ok(None)` | 204 or handler-set | |
//! | `Redirect` | 302 or carried | `Location` |
//! | `Stop` | carried | optional body |
//! | `AccessDenied` | 401 / 403 | `WWW-Authenticate` when a scheme was attempted |
//! | `Validation` | 400 or carried | `{"errmsg": ...}` |
//! | `NotFound`, `MethodNotFound` | 404 | `{"errmsg": ...}` |
//! | `BodyRead` | 408 | `{"errmsg": ...}` |
//! | `Unhandled`, handler panic | 500 | generic `errmsg`, error hook called |
//!
//! An error outcome is rebuilt from the error alone. Headers or status the handler set on its
//! response before failing are dropped, except CORS headers which are re-applied.
//!
//! ## Example
//!
//! ```rust
//! use endpoints::controller::ControllerClass;
//! use endpoints::dispatcher::Dispatcher;
//! use endpoints::error::CallError;
//! use endpoints::router::RoutingTable;
//! use endpoints::transport::Request;
//! use http::{Method, StatusCode};
//!
//! let class = ControllerClass::builder("Default")
//!     .handle("GET", |_ctl, _args| Err(CallError::redirect("http://example.com")))
//!     .build();
//! let dispatcher = Dispatcher::new(RoutingTable::builder("app").register("", class).build());
//!
//! let outcome = dispatcher.handle(Request::builder(Method::GET, "/").build());
//! assert_eq!(outcome.status, StatusCode::FOUND);
//! assert_eq!(outcome.header("location"), Some("http://example.com"));
//! ```
//!
//! ## Correlation
//!
//! Every call runs inside an `info` span carrying its [`CallId`](crate::ids::CallId). The id is
//! taken from the configured request-id header when it holds a ULID and echoed back in the
//! outcome headers.

mod core;

pub use core::{CallOutcome, Dispatcher, ErrorHook};
