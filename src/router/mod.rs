//! # Router Module
//!
//! Maps request paths onto controller classes through a tree of namespaces.
//!
//! ## Overview
//!
//! A [`RoutingTable`] is built once at startup. Classes are registered under dotted module
//! paths relative to a root namespace:
//!
//! ```text
//! app                 Default
//! app.foo             Default, Bar
//! app.foo.baz         Che
//! ```
//!
//! The [`Router`] resolves path segments against that tree greedily:
//!
//! 1. Starting at the root, consume segments while a child namespace with exactly that
//!    name exists.
//! 2. Title-case the next segment (`bar` becomes `Bar`, `foo_bar` becomes `Foo_Bar`). If
//!    the deepest namespace registers a class with that name, consume the segment too.
//! 3. Otherwise fall back to the namespace's default class without consuming anything.
//! 4. Whatever is left becomes the positional arguments.
//!
//! | Path | Class | Args |
//! |---|---|---|
//! | `/` | `app.Default` | `[]` |
//! | `/happy` | `app.Default` | `["happy"]` |
//! | `/foo/bar/happy/sad` | `app.foo.Bar` | `["happy", "sad"]` |
//! | `/foo/baz/che` | `app.foo.baz.Che` | `[]` |
//!
//! Only classes registered in the resolved namespace are considered. A `Bar` living in
//! another namespace is never picked up.
//!
//! ## Example
//!
//! ```rust
//! use endpoints::controller::ControllerClass;
//! use endpoints::router::{Router, RoutingTable};
//! use std::sync::Arc;
//!
//! let table = RoutingTable::builder("app")
//!     .register("foo", ControllerClass::builder("Bar").build())
//!     .build();
//! let router = Router::new(Arc::new(table), "Default");
//!
//! let segments: Vec<String> = vec!["foo".into(), "bar".into(), "7".into()];
//! let resolved = router.resolve(&segments).unwrap();
//! assert_eq!(resolved.class_name, "Bar");
//! assert_eq!(resolved.module_path, "app.foo");
//! assert_eq!(resolved.remaining_args, ["7"]);
//! ```
//!
//! ## Caching
//!
//! Namespace lookups are memoized in a concurrent map. Only successful lookups are cached,
//! so the cache never grows with junk paths. Resolutions themselves are computed per call.

mod core;
mod table;

pub use core::{title_case, RouteResolution, Router};
pub use table::{Namespace, NamespaceSource, RoutingTable, RoutingTableBuilder};
