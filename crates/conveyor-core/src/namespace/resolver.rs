use crate::models::{CoreError, CoreErrorKind, CoreResult};
use crate::namespace::{Binding, Namespace, NamespaceSet};

impl Namespace {
    /// Walks a dotted key path through nested namespaces.
    ///
    /// Returns `None` when any segment is missing or absent, or when an
    /// intermediate segment is not a namespace.
    pub fn lookup_path(&self, path: &str) -> Option<&Binding> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;

        for segment in segments {
            current = match current {
                Binding::Namespace(inner) => inner.get(segment)?,
                _ => return None,
            };
        }

        match current {
            Binding::Absent => None,
            found => Some(found),
        }
    }
}

impl NamespaceSet {
    /// Resolves a symbolic reference.
    ///
    /// `ns.key` is looked up inside `ns` only when `ns` is a loaded namespace.
    /// Any other reference is tried as a key path against every namespace in
    /// load order and the first match wins.
    pub fn resolve(&self, reference: &str) -> CoreResult<&Binding> {
        if let Some((head, rest)) = reference.split_once('.')
            && !rest.is_empty()
            && let Some(namespace) = self.get(head)
        {
            let binding = namespace
                .lookup_path(rest)
                .ok_or_else(|| variable_not_found(reference).in_namespace(head))?;
            tracing::debug!(
                reference,
                namespace = head,
                kind = binding.describe(),
                "resolved qualified reference"
            );
            return Ok(binding);
        }

        self.iter()
            .find_map(|(name, namespace)| {
                namespace.lookup_path(reference).map(|binding| (name, binding))
            })
            .map(|(name, binding)| {
                tracing::debug!(
                    reference,
                    namespace = name,
                    kind = binding.describe(),
                    "resolved reference"
                );
                binding
            })
            .ok_or_else(|| variable_not_found(reference))
    }
}

fn variable_not_found(reference: &str) -> CoreError {
    CoreError::new(
        CoreErrorKind::VariableNotFound,
        format!("variable '{reference}' not found"),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::ConfigId;

    #[test]
    fn lookup_path_descends_nested_namespaces() {
        let inner = Namespace::new().with("fetch", Binding::Task(ConfigId(3)));
        let outer = Namespace::new().with("stages", Binding::Namespace(inner));

        assert_eq!(
            outer.lookup_path("stages.fetch"),
            Some(&Binding::Task(ConfigId(3)))
        );
        assert_eq!(outer.lookup_path("stages.parse"), None);
    }

    #[test]
    fn lookup_path_does_not_descend_into_values() {
        let namespace = Namespace::new().with("limit", Binding::Value(json!({"max": 3})));

        assert_eq!(namespace.lookup_path("limit.max"), None);
        assert!(namespace.lookup_path("limit").is_some());
    }

    #[test]
    fn absent_bindings_are_not_found() {
        let namespace = Namespace::new().with("placeholder", Binding::Absent);

        assert_eq!(namespace.lookup_path("placeholder"), None);
    }
}
