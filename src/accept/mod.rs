//! # Accept Header Module
//!
//! Parses `Accept` style header values into ranked [`MediaTypePreference`]s and filters them
//! against the media type the service produces.
//!
//! ## Ranking
//!
//! Entries are ordered by:
//!
//! 1. quality (`q`, default 1.0) descending
//! 2. specificity descending (`text/html` > `text/*` > `*/*`)
//! 3. number of non-`q` parameters descending
//! 4. original position (the sort is stable)
//!
//! ```rust
//! use endpoints::accept::AcceptHeader;
//!
//! let header = AcceptHeader::parse(
//!     "text/*;q=0.3, text/html;q=0.7, text/html;level=1, text/html;level=2;q=0.4, */*;q=0.5",
//! );
//! let order: Vec<&str> = header.iter().map(|m| m.raw()).collect();
//! assert_eq!(
//!     order,
//!     ["text/html;level=1", "text/html;q=0.7", "*/*;q=0.5", "text/html;level=2;q=0.4", "text/*;q=0.3"]
//! );
//! ```
//!
//! ## Versioning
//!
//! API versions travel as a media type parameter, e.g.
//! `Accept: application/json;version=v2`. [`AcceptHeader::version`] returns the version of the
//! best ranked entry compatible with the response content type; the dispatcher uses it to pick
//! `POST_v2` over `POST`.
//!
//! ## Filtering
//!
//! [`AcceptHeader::filter`] is lazy and can be called any number of times; each call is a new
//! pass over the already sorted entries. A `*` on either side matches anything, and every
//! requested parameter must be present on the entry with the same value.

mod core;

pub use core::{AcceptHeader, MediaTypePreference, Specificity};
