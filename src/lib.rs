//! # endpoints
//!
//! **endpoints** is the request-dispatch core of a controller-oriented HTTP framework. Given a
//! normalized request it finds the controller class responsible for the path, negotiates the
//! API version from the `Accept` header, validates and coerces parameters, runs the handler
//! method and maps whatever happened into a status, headers and an optional JSON body.
//!
//! ## Overview
//!
//! URLs map onto a tree of namespaces. `/foo/bar/happy/sad` is served by the class `Bar`
//! registered in the `foo` namespace, and `happy`, `sad` become positional arguments. Classes
//! expose one handler per HTTP method, optionally per version (`POST_v2`), and every handler
//! carries an ordered list of validators (parameter specs, credential checks) that run before
//! its body.
//!
//! ## Architecture
//!
//! - **[`accept`]** - `Accept` header parsing, ranking and filtering
//! - **[`params`]** - Declarative parameter specs and the [`params::Validator`] trait
//! - **[`security`]** - Credential validators (basic, bearer token, client credentials) and a
//!   per-client rate limit
//! - **[`controller`]** - Controller classes, handler methods and per-request context
//! - **[`router`]** - Greedy namespace resolution over a [`router::RoutingTable`]
//! - **[`dispatcher`]** - The call pipeline and error-to-status mapping
//! - **[`transport`]** - Minimal normalized request/response types used by adapters
//! - **[`config`]** / **[`logging`]** - Environment and YAML driven configuration, tracing setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Adapter as Transport adapter
//!     participant D as Dispatcher
//!     participant R as Router
//!     participant A as AcceptHeader
//!     participant V as Validators
//!     participant H as Handler method
//!
//!     Adapter->>D: handle(Request)
//!     D->>R: resolve(path segments)
//!     R-->>D: RouteResolution (class, remaining args)
//!     D->>A: version(content_type)
//!     A-->>D: Some("v2") / None
//!     D->>D: select METHOD_version or METHOD
//!     D->>V: apply(request, args) in order
//!     V-->>D: Ok / CallError
//!     D->>H: body(controller, args)
//!     H-->>D: Ok(Some(value)) / Ok(None) / Err(CallError)
//!     D-->>Adapter: CallOutcome (status, headers, body)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use endpoints::controller::ControllerClass;
//! use endpoints::dispatcher::Dispatcher;
//! use endpoints::transport::Request;
//! use endpoints::router::RoutingTable;
//! use http::Method;
//! use serde_json::json;
//!
//! let bar = ControllerClass::builder("Bar")
//!     .handle("GET", |_ctl, args| Ok(Some(json!(args.args.to_vec()))))
//!     .build();
//!
//! let table = RoutingTable::builder("app").register("foo", bar).build();
//! let dispatcher = Dispatcher::new(table);
//!
//! let outcome = dispatcher.handle(Request::builder(Method::GET, "/foo/bar/happy/sad").build());
//! assert_eq!(outcome.status, http::StatusCode::OK);
//! assert_eq!(outcome.body, Some(json!(["happy", "sad"])));
//! ```

pub mod accept;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod params;
pub mod router;
pub mod security;
pub mod transport;

pub use accept::{AcceptHeader, MediaTypePreference};
pub use config::DispatchConfig;
pub use controller::{ControllerClass, HandlerMethod};
pub use dispatcher::{CallOutcome, Dispatcher};
pub use error::{CallError, HandlerResult};
pub use params::{CallArgs, ParamSpec, ParamType, Validator};
pub use router::{Router, RoutingTable};
