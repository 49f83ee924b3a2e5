use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::models::{ConfigId, ConfigStore, CoreError, CoreErrorKind, CoreResult, TaskConfig};
use crate::namespace::{Binding, Namespace, NamespaceSet};

enum Draft {
    Ready(Binding),
    Group(Vec<GroupEntry>),
    /// Array without inline tasks: a group when it references a binding of
    /// the unit, a plain value otherwise.
    List(Vec<Value>),
    Nested(BTreeMap<String, Draft>),
}

enum GroupEntry {
    Inline(ConfigId),
    Reference(String),
}

impl NamespaceSet {
    /// Loads every source unit in order. Task configurations land in `store`.
    pub fn load<P: AsRef<Path>>(paths: &[P], store: &mut ConfigStore) -> CoreResult<Self> {
        let mut set = Self::new();
        for path in paths {
            let (name, namespace) = load_namespace(path.as_ref(), store)?;
            set.insert(name, namespace)?;
        }
        Ok(set)
    }
}

/// Namespace name of a source unit: its file stem.
pub fn namespace_name(path: &Path) -> CoreResult<String> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            CoreError::new(
                CoreErrorKind::LoadFailure,
                format!("cannot derive a namespace name from '{}'", path.display()),
            )
        })?;

    if stem.contains('.') {
        return Err(CoreError::new(
            CoreErrorKind::LoadFailure,
            format!(
                "namespace name '{stem}' derived from '{}' must not contain '.'",
                path.display()
            ),
        ));
    }

    Ok(stem.to_string())
}

/// Loads one source unit into a fresh namespace.
pub fn load_namespace(path: &Path, store: &mut ConfigStore) -> CoreResult<(String, Namespace)> {
    let name = namespace_name(path)?;

    let contents = fs::read_to_string(path).map_err(|error| {
        CoreError::new(
            CoreErrorKind::LoadFailure,
            format!("failed to read '{}': {error}", path.display()),
        )
        .in_namespace(name.clone())
    })?;

    let document =
        parse_document(path, &contents).map_err(|error| error.in_namespace(name.clone()))?;
    let namespace =
        build_namespace(document, store).map_err(|error| error.in_namespace(name.clone()))?;

    tracing::debug!(
        namespace = %name,
        path = %path.display(),
        bindings = namespace.len(),
        "loaded source unit"
    );

    Ok((name, namespace))
}

fn parse_document(path: &Path, contents: &str) -> CoreResult<Map<String, Value>> {
    let is_toml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));

    if is_toml {
        return toml::from_str::<Map<String, Value>>(contents).map_err(|error| {
            parse_failure(format!("invalid TOML in '{}': {error}", path.display()))
        });
    }

    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(parse_failure(format!(
            "top level of '{}' must be a table, found {}",
            path.display(),
            json_kind(&other)
        ))),
        Err(error) => Err(parse_failure(format!(
            "invalid JSON in '{}': {error}",
            path.display()
        ))),
    }
}

fn build_namespace(document: Map<String, Value>, store: &mut ConfigStore) -> CoreResult<Namespace> {
    let root = draft_table(document, "", store)?;
    finish_table(&root, &root, "")
}

fn draft_table(
    table: Map<String, Value>,
    prefix: &str,
    store: &mut ConfigStore,
) -> CoreResult<BTreeMap<String, Draft>> {
    let mut drafts = BTreeMap::new();
    for (key, value) in table {
        let key_path = join_path(prefix, &key);
        let draft = draft_value(value, &key_path, store)?;
        drafts.insert(key, draft);
    }
    Ok(drafts)
}

fn draft_value(value: Value, key_path: &str, store: &mut ConfigStore) -> CoreResult<Draft> {
    match value {
        Value::Null => Ok(Draft::Ready(Binding::Absent)),
        Value::Object(object) => match TaskConfig::from_object(object) {
            Ok(config) => Ok(Draft::Ready(Binding::Task(store.insert(config)))),
            Err(object) => Ok(Draft::Nested(draft_table(object, key_path, store)?)),
        },
        Value::Array(items) if !items.iter().any(is_task_object) => Ok(Draft::List(items)),
        Value::Array(items) => {
            let mut entries = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let entry = match item {
                    Value::Object(object) => match TaskConfig::from_object(object) {
                        Ok(config) => GroupEntry::Inline(store.insert(config)),
                        Err(_) => return Err(untyped_element(key_path, index)),
                    },
                    other => group_reference(other, key_path, index)?,
                };
                entries.push(entry);
            }
            Ok(Draft::Group(entries))
        }
        other => Ok(Draft::Ready(Binding::Value(other))),
    }
}

fn finish_table(
    root: &BTreeMap<String, Draft>,
    table: &BTreeMap<String, Draft>,
    prefix: &str,
) -> CoreResult<Namespace> {
    let mut namespace = Namespace::new();
    for (key, draft) in table {
        let key_path = join_path(prefix, key);
        let binding = match draft {
            Draft::Ready(binding) => binding.clone(),
            Draft::Nested(inner) => Binding::Namespace(finish_table(root, inner, &key_path)?),
            Draft::Group(entries) => {
                let mut visiting = vec![key_path.clone()];
                Binding::Group(expand_group(root, entries, &mut visiting)?)
            }
            Draft::List(items) => match list_as_group(root, items, &key_path)? {
                Some(entries) => {
                    let mut visiting = vec![key_path.clone()];
                    Binding::Group(expand_group(root, &entries, &mut visiting)?)
                }
                None => Binding::Value(Value::Array(items.clone())),
            },
        };
        namespace.insert(key.clone(), binding);
    }
    Ok(namespace)
}

/// Group references are dotted paths from the root of the same unit.
fn expand_group(
    root: &BTreeMap<String, Draft>,
    entries: &[GroupEntry],
    visiting: &mut Vec<String>,
) -> CoreResult<Vec<ConfigId>> {
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let reference = match entry {
            GroupEntry::Inline(id) => {
                ids.push(*id);
                continue;
            }
            GroupEntry::Reference(reference) => reference,
        };

        if visiting.contains(reference) {
            return Err(parse_failure(format!(
                "group reference cycle through '{reference}'"
            )));
        }

        match find_draft(root, reference) {
            Some(Draft::Ready(Binding::Task(id))) => ids.push(*id),
            Some(Draft::Group(inner)) => {
                visiting.push(reference.clone());
                ids.extend(expand_group(root, inner, visiting)?);
                visiting.pop();
            }
            Some(Draft::List(items)) => {
                let Some(inner) = list_as_group(root, items, reference)? else {
                    return Err(not_a_member(reference));
                };
                visiting.push(reference.clone());
                ids.extend(expand_group(root, &inner, visiting)?);
                visiting.pop();
            }
            Some(_) => return Err(not_a_member(reference)),
            None => {
                return Err(parse_failure(format!(
                    "group reference '{reference}' is not defined"
                )));
            }
        }
    }
    Ok(ids)
}

/// Reads a task-free array as a group when any string element names a binding
/// of the unit. Every element must then be a reference.
fn list_as_group(
    root: &BTreeMap<String, Draft>,
    items: &[Value],
    key_path: &str,
) -> CoreResult<Option<Vec<GroupEntry>>> {
    let references_unit = items
        .iter()
        .filter_map(Value::as_str)
        .any(|reference| find_draft(root, reference).is_some());
    if !references_unit {
        return Ok(None);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(_) => Err(untyped_element(key_path, index)),
            other => group_reference(other.clone(), key_path, index),
        })
        .collect::<CoreResult<Vec<_>>>()
        .map(Some)
}

fn group_reference(item: Value, key_path: &str, index: usize) -> CoreResult<GroupEntry> {
    match item {
        Value::String(reference) => Ok(GroupEntry::Reference(reference)),
        other => Err(parse_failure(format!(
            "group '{key_path}' element {index} is a {}, expected a task table or a reference",
            json_kind(&other)
        ))),
    }
}

fn not_a_member(reference: &str) -> CoreError {
    parse_failure(format!(
        "group reference '{reference}' does not name a task or a group"
    ))
}

fn untyped_element(key_path: &str, index: usize) -> CoreError {
    parse_failure(format!(
        "group '{key_path}' element {index} has no '{}' key",
        TaskConfig::TYPE_KEY
    ))
}

fn is_task_object(value: &Value) -> bool {
    value
        .get(TaskConfig::TYPE_KEY)
        .is_some_and(Value::is_string)
}

fn find_draft<'a>(root: &'a BTreeMap<String, Draft>, reference: &str) -> Option<&'a Draft> {
    let mut segments = reference.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Draft::Nested(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

fn parse_failure(message: String) -> CoreError {
    CoreError::new(CoreErrorKind::ParseFailure, message)
}
