//! # Security Module
//!
//! Credential validators that plug into a handler method's validator list.
//!
//! ## Overview
//!
//! Each validator extracts one kind of credential from the request and hands it to an
//! injected check. Policy (which tokens are valid, which users exist) lives in that check;
//! this module only decides *where* credentials come from and *how* a failure is reported.
//!
//! | Validator | Credential source | Challenge scheme |
//! |---|---|---|
//! | [`BasicAuth`] | `Authorization: Basic` | `Basic` |
//! | [`TokenAuth`] | bearer header, `access_token` query/body param | `Bearer` |
//! | [`ClientAuth`] | basic header, `client_id`/`client_secret` query/body params | `Basic` |
//! | [`CustomAuth`] | anything the check reads from the request | caller supplied |
//!
//! Missing credentials and a check returning `false` both end the call with
//! [`CallError::AccessDenied`](crate::error::CallError::AccessDenied) (401). The dispatcher
//! turns the scheme into a `WWW-Authenticate` header.
//!
//! [`RateLimit`] sits in the same validator list and answers 429 once a client has made too
//! many calls to one path inside its window.
//!
//! ## Usage
//!
//! ```rust
//! use endpoints::controller::{ControllerClass, HandlerMethod};
//! use endpoints::security::BasicAuth;
//! use serde_json::json;
//!
//! let admin = ControllerClass::builder("Admin")
//!     .method(
//!         "GET",
//!         HandlerMethod::new(|_ctl, _args| Ok(Some(json!("welcome"))))
//!             .validator(BasicAuth::new(|_req, user, pass| user == "admin" && pass == "s3cret")),
//!     )
//!     .build();
//! # let _ = admin;
//! ```
//!
//! Checks that need to report *why* they failed can return a [`CallError`] themselves
//! through [`CustomAuth::try_new`].
//!
//! [`CallError`]: crate::error::CallError

mod core;
mod ratelimit;

pub use core::{BasicAuth, ClientAuth, CustomAuth, TokenAuth};
pub use ratelimit::RateLimit;
