//! # Parameters Module
//!
//! Declarative parameter validation applied before a handler body runs.
//!
//! A handler method carries an ordered list of [`Validator`]s. The most common one is
//! [`ParamSpec`], which describes a single named parameter:
//!
//! - **names**: the canonical name plus aliases; the first name present in the request wins
//! - **required** / **default**: absent parameters either fail, get a default (evaluated
//!   fresh for every call) or stay unset
//! - **type**: coercion from the wire representation (`"1"` to `1`, `"true"` to `true`,
//!   comma lists, or any function)
//! - **choices**, **min/max size**, **pattern**: constraints on the coerced value
//! - **store_list** / **append_list**: split comma separated values into a list
//! - **dest**: bind under a different keyword name
//! - **source**: merged query+body (default), query only or body only
//!
//! ## Example
//!
//! ```rust
//! use endpoints::params::{CallArgs, ParamSpec, ParamType, Validator};
//! use endpoints::transport::Request;
//! use http::Method;
//! use serde_json::json;
//!
//! let spec = ParamSpec::new("ids")
//!     .param_type(ParamType::Int)
//!     .store_list()
//!     .max_size(100.0);
//!
//! let req = Request::builder(Method::GET, "/?ids=1,2,3").build();
//! let mut args = CallArgs::from_request(&req, Vec::new());
//! spec.apply(&req, &mut args).unwrap();
//! assert_eq!(args.get("ids"), Some(&json!([1, 2, 3])));
//! ```
//!
//! ## Ordering
//!
//! Validators run in declaration order and stop at the first failure. A later spec binding the
//! same destination overwrites the earlier binding.
//!
//! ## Errors
//!
//! Every failure is a [`CallError::Validation`](crate::error::CallError::Validation) (400)
//! whose message names the parameter and the violated constraint.

mod coerce;
mod core;

#[cfg(test)]
mod tests;

pub use coerce::{CoerceFn, ParamType};
pub use core::{
    ArgVec, CallArgs, DefaultFn, MultipleAction, ParamSource, ParamSpec, RequireParams,
    Validator, MAX_INLINE_ARGS,
};
