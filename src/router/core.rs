use super::table::{Namespace, NamespaceSource};
use crate::config::DEFAULT_CLASS_NAME;
use crate::controller::ControllerClass;
use crate::error::CallError;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The class a path resolved to, plus the segments it did not consume.
#[derive(Debug, Clone)]
pub struct RouteResolution {
    pub class: Arc<ControllerClass>,
    /// Dotted path of the namespace the class lives in.
    pub module_path: String,
    pub class_name: String,
    pub remaining_args: Vec<String>,
}

/// Greedy namespace resolver.
pub struct Router {
    source: Arc<dyn NamespaceSource>,
    default_class: String,
    cache: DashMap<String, Arc<Namespace>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("root", &self.source.root())
            .field("default_class", &self.default_class)
            .field("cached_namespaces", &self.cache.len())
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new(source: Arc<dyn NamespaceSource>, default_class: impl Into<String>) -> Self {
        let mut default_class = default_class.into();
        if default_class.is_empty() {
            default_class = DEFAULT_CLASS_NAME.to_string();
        }
        Self {
            source,
            default_class,
            cache: DashMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn default_class(&self) -> &str {
        &self.default_class
    }

    /// Resolve path segments to a class.
    ///
    /// # Errors
    ///
    /// [`CallError::NotFound`] when the root namespace is missing, or when the deepest
    /// matching namespace has neither a class named after the next segment nor a default
    /// class.
    pub fn resolve(&self, segments: &[String]) -> Result<RouteResolution, CallError> {
        let root = self.source.root();
        let mut namespace = self
            .lookup(root)
            .ok_or_else(|| CallError::not_found(format!("no namespace {root}")))?;

        let mut consumed = 0;
        for segment in segments {
            // dotted segments would escape into a different module path
            if segment.contains('.') || !namespace.has_child(segment) {
                break;
            }
            let child_path = format!("{}.{}", namespace.module_path(), segment);
            match self.lookup(&child_path) {
                Some(child) => {
                    namespace = child;
                    consumed += 1;
                }
                None => break,
            }
        }

        if let Some(segment) = segments.get(consumed) {
            let class_name = title_case(segment);
            if let Some(class) = namespace.class(&class_name) {
                let class = Arc::clone(class);
                return Ok(self.resolution(&namespace, class, class_name, &segments[consumed + 1..]));
            }
        }

        match namespace.class(&self.default_class) {
            Some(class) => {
                let class = Arc::clone(class);
                let class_name = self.default_class.clone();
                Ok(self.resolution(&namespace, class, class_name, &segments[consumed..]))
            }
            None => {
                debug!(
                    module_path = %namespace.module_path(),
                    segments = ?segments,
                    "No controller class matched"
                );
                Err(CallError::not_found(format!(
                    "no controller for /{}",
                    segments.join("/")
                )))
            }
        }
    }

    /// Every module path known to the namespace source.
    #[must_use]
    pub fn modules(&self) -> Vec<String> {
        let mut paths = self.source.module_paths();
        if paths.is_empty() {
            paths = self.cache.iter().map(|e| e.key().clone()).collect();
            paths.sort_unstable();
        }
        paths
    }

    /// Drop every cached namespace.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn resolution(
        &self,
        namespace: &Namespace,
        class: Arc<ControllerClass>,
        class_name: String,
        remaining: &[String],
    ) -> RouteResolution {
        debug!(
            module_path = %namespace.module_path(),
            class = %class_name,
            args = remaining.len(),
            default_class = %self.default_class,
            "Route resolved"
        );
        RouteResolution {
            class,
            module_path: namespace.module_path().to_string(),
            class_name,
            remaining_args: remaining.to_vec(),
        }
    }

    fn lookup(&self, module_path: &str) -> Option<Arc<Namespace>> {
        if let Some(hit) = self.cache.get(module_path) {
            return Some(Arc::clone(hit.value()));
        }
        let namespace = self.source.namespace(module_path)?;
        self.cache
            .insert(module_path.to_string(), Arc::clone(&namespace));
        Some(namespace)
    }
}

/// Title-case a path segment: the first letter of every run of letters is uppercased and the
/// rest lowercased, so `foo_bar` becomes `Foo_Bar` and `v2api` becomes `V2Api`.
#[must_use]
pub fn title_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut in_word = false;
    for c in segment.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
