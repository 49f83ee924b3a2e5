pub mod loader;
pub mod resolver;

pub use loader::{load_namespace, namespace_name};

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::{ConfigId, CoreError, CoreErrorKind, CoreResult};

/// A resolvable value bound in a namespace.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Task(ConfigId),
    Group(Vec<ConfigId>),
    Namespace(Namespace),
    Value(Value),
    /// Placeholder binding; lookups treat it as missing.
    Absent,
}

impl Binding {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Group(_) => "group",
            Self::Namespace(_) => "namespace",
            Self::Value(_) => "value",
            Self::Absent => "absent",
        }
    }
}

/// Symbol table produced by loading one source unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    bindings: BTreeMap<String, Binding>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn with(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.insert(name, binding);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Loaded namespaces, kept in load order.
#[derive(Clone, Debug, Default)]
pub struct NamespaceSet {
    namespaces: Vec<(String, Namespace)>,
}

impl NamespaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a namespace. Names must be unique across the set.
    pub fn insert(&mut self, name: impl Into<String>, namespace: Namespace) -> CoreResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(CoreError::new(
                CoreErrorKind::DuplicateNamespace,
                format!("namespace '{name}' is already loaded"),
            )
            .in_namespace(name));
        }

        self.namespaces.push((name, namespace));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.namespaces
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, namespace)| namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Namespace)> {
        self.namespaces
            .iter()
            .map(|(name, namespace)| (name.as_str(), namespace))
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
