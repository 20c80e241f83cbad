use crate::controller::ControllerClass;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the router looks up namespaces.
///
/// [`RoutingTable`] is the implementation used in practice; tests and adapters with their own
/// registries can provide another.
pub trait NamespaceSource: Send + Sync {
    /// Dotted path of the root namespace.
    fn root(&self) -> &str;

    /// The namespace at `module_path`, if one exists.
    fn namespace(&self, module_path: &str) -> Option<Arc<Namespace>>;

    /// Every known module path.
    fn module_paths(&self) -> Vec<String> {
        Vec::new()
    }
}

/// One node of the namespace tree.
#[derive(Debug, Default)]
pub struct Namespace {
    module_path: String,
    children: BTreeSet<String>,
    classes: HashMap<String, Arc<ControllerClass>>,
}

impl Namespace {
    #[inline]
    #[must_use]
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    #[inline]
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains(name)
    }

    /// Names of the child namespaces, sorted.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&Arc<ControllerClass>> {
        self.classes.get(name)
    }

    /// Names of the classes registered here, sorted.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A static namespace tree built at startup.
#[derive(Debug)]
pub struct RoutingTable {
    root: String,
    namespaces: BTreeMap<String, Arc<Namespace>>,
}

impl RoutingTable {
    #[must_use]
    pub fn builder(root: impl Into<String>) -> RoutingTableBuilder {
        let root = root.into();
        let mut namespaces = BTreeMap::new();
        namespaces.insert(
            root.clone(),
            Namespace {
                module_path: root.clone(),
                ..Namespace::default()
            },
        );
        RoutingTableBuilder { root, namespaces }
    }

    /// Total number of registered classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.classes.len()).sum()
    }
}

impl NamespaceSource for RoutingTable {
    fn root(&self) -> &str {
        &self.root
    }

    fn namespace(&self, module_path: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(module_path).map(Arc::clone)
    }

    fn module_paths(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }
}

/// Builder returned by [`RoutingTable::builder`].
#[derive(Debug)]
pub struct RoutingTableBuilder {
    root: String,
    namespaces: BTreeMap<String, Namespace>,
}

impl RoutingTableBuilder {
    /// Register `class` under `module_path`, relative to the root (`""` is the root itself,
    /// `"foo.bar"` is `<root>.foo.bar`). Missing intermediate namespaces are created.
    ///
    /// A class registered twice under the same namespace and name replaces the earlier one.
    #[must_use]
    pub fn register(mut self, module_path: &str, class: ControllerClass) -> Self {
        let mut path = self.root.clone();
        for part in module_path.split('.').filter(|p| !p.is_empty()) {
            let parent = path.clone();
            path.push('.');
            path.push_str(part);
            if let Some(ns) = self.namespaces.get_mut(&parent) {
                ns.children.insert(part.to_string());
            }
            self.namespaces
                .entry(path.clone())
                .or_insert_with(|| Namespace {
                    module_path: path.clone(),
                    ..Namespace::default()
                });
        }

        if let Some(ns) = self.namespaces.get_mut(&path) {
            let name = class.name().to_string();
            if ns.classes.insert(name.clone(), Arc::new(class)).is_some() {
                warn!(
                    module_path = %path,
                    class = %name,
                    "Controller class registered twice, replacing"
                );
            }
        }
        self
    }

    #[must_use]
    pub fn build(self) -> RoutingTable {
        let namespaces: BTreeMap<String, Arc<Namespace>> = self
            .namespaces
            .into_iter()
            .map(|(path, ns)| (path, Arc::new(ns)))
            .collect();
        let table = RoutingTable {
            root: self.root,
            namespaces,
        };
        info!(
            root = %table.root,
            namespaces = table.namespaces.len(),
            classes = table.class_count(),
            "Routing table built"
        );
        table
    }
}
