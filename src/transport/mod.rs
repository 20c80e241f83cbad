//! # Transport Module
//!
//! The normalized request and response the dispatcher works on. Transport adapters (a
//! hyper service, a CGI bridge, a test harness) translate their native request into a
//! [`Request`] and serialize the resulting [`CallOutcome`](crate::dispatcher::CallOutcome).
//!
//! ## Request
//!
//! - Headers are an [`http::HeaderMap`], so lookups are case-insensitive
//! - The path is split into percent-decoded segments
//! - Query parameters become a JSON map; repeated keys collect into an array
//! - The body is read lazily through a `Read` handle; JSON objects and
//!   `application/x-www-form-urlencoded` bodies become body parameters
//!
//! ```rust
//! use endpoints::transport::Request;
//! use http::Method;
//!
//! let req = Request::builder(Method::GET, "/users/john%20doe?tag=a&tag=b")
//!     .header("Authorization", "Bearer abc123")
//!     .build();
//!
//! assert_eq!(req.path_args(), ["users", "john doe"]);
//! assert_eq!(req.query()["tag"], serde_json::json!(["a", "b"]));
//! assert_eq!(req.auth_bearer(), Some("abc123"));
//! ```
//!
//! ## Response
//!
//! [`Response`] is the mutable response a handler may adjust (status, headers) before
//! returning its body. Without an explicit status the code is 200 when a body is present
//! and 204 otherwise.

mod request;
mod response;

pub use request::{Request, RequestBuilder};
pub use response::Response;
