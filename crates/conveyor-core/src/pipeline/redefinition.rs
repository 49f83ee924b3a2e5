use serde_json::{Map, Value};

use crate::models::{ConfigId, ConfigStore, CoreError, CoreErrorKind, CoreResult, TaskConfig};

/// A parsed `selector.path=value` override.
///
/// The value is always applied as a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redefinition {
    pub selector: String,
    pub path: Vec<String>,
    pub value: String,
}

impl Redefinition {
    pub fn parse(expression: &str) -> CoreResult<Self> {
        let (keys_and_selector, value) = expression
            .split_once('=')
            .ok_or_else(|| malformed(expression, "missing '='"))?;
        let (selector, key_path) = keys_and_selector
            .split_once('.')
            .ok_or_else(|| malformed(expression, "missing '.' between task and key path"))?;

        if selector.is_empty() {
            return Err(malformed(expression, "empty task selector"));
        }

        let path: Vec<String> = key_path.split('.').map(str::to_string).collect();
        if path.iter().any(String::is_empty) {
            return Err(malformed(expression, "empty key in path"));
        }

        Ok(Self {
            selector: selector.to_string(),
            path,
            value: value.to_string(),
        })
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Parses every expression up front so a malformed one aborts before anything
/// is mutated.
pub fn parse_redefinitions<S: AsRef<str>>(expressions: &[S]) -> CoreResult<Vec<Redefinition>> {
    expressions
        .iter()
        .map(|expression| Redefinition::parse(expression.as_ref()))
        .collect()
}

/// Applies override expressions to the pipeline's configurations, in order.
pub fn apply_redefinitions<S: AsRef<str>>(
    pipeline: &[ConfigId],
    store: &mut ConfigStore,
    expressions: &[S],
) -> CoreResult<()> {
    for redefinition in parse_redefinitions(expressions)? {
        apply_redefinition(pipeline, store, &redefinition)?;
    }
    Ok(())
}

/// Applies one override to every matching configuration and returns how many
/// distinct configurations it changed. A configuration listed several times in
/// the pipeline counts once.
pub fn apply_redefinition(
    pipeline: &[ConfigId],
    store: &mut ConfigStore,
    redefinition: &Redefinition,
) -> CoreResult<usize> {
    let mut matched: Vec<ConfigId> = Vec::new();
    for id in pipeline {
        let selected = store
            .get(*id)
            .is_some_and(|config| config.matches_selector(&redefinition.selector));
        if selected && !matched.contains(id) {
            matched.push(*id);
        }
    }

    if matched.is_empty() {
        return Err(CoreError::new(
            CoreErrorKind::NoMatchingTask,
            format!("no task with name '{}' in the pipeline", redefinition.selector),
        )
        .for_task(redefinition.selector.clone()));
    }

    for id in &matched {
        let config = store.get_mut(*id).ok_or_else(|| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("unknown configuration id '{}'", id.0),
            )
        })?;
        assign(config, &redefinition.path, &redefinition.value)?;
    }

    tracing::info!(
        task = %redefinition.selector,
        path = %redefinition.dotted_path(),
        value = %redefinition.value,
        matched = matched.len(),
        "redefined task field"
    );

    Ok(matched.len())
}

fn assign(config: &mut TaskConfig, path: &[String], value: &str) -> CoreResult<()> {
    if let [only] = path
        && only == TaskConfig::TYPE_KEY
    {
        config.task_type = value.to_string();
        return Ok(());
    }

    let identity = config.identity().to_string();
    assign_path(&mut config.fields, path, Value::String(value.to_string())).map_err(|depth| {
        CoreError::new(
            CoreErrorKind::PathLookup,
            format!(
                "task '{identity}' has no member '{}' (while setting '{}')",
                path[..=depth].join("."),
                path.join(".")
            ),
        )
        .for_task(identity.clone())
    })
}

/// Walks existing members down to the parent of the last segment and assigns
/// there. On failure returns the index of the segment that could not be
/// reached.
fn assign_path(
    fields: &mut Map<String, Value>,
    path: &[String],
    value: Value,
) -> Result<(), usize> {
    let Some((last, parents)) = path.split_last() else {
        return Err(0);
    };
    let Some((first, rest)) = parents.split_first() else {
        fields.insert(last.clone(), value);
        return Ok(());
    };

    let mut current = fields.get_mut(first).ok_or(0_usize)?;
    for (offset, segment) in rest.iter().enumerate() {
        current = member_mut(current, segment).ok_or(offset + 1)?;
    }

    match current {
        Value::Object(object) => {
            object.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or(parents.len())?;
            *slot = value;
            Ok(())
        }
        _ => Err(parents.len()),
    }
}

fn member_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(object) => object.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

fn malformed(expression: &str, reason: &str) -> CoreError {
    CoreError::new(
        CoreErrorKind::MalformedRedefinition,
        format!("malformed redefinition '{expression}': {reason}"),
    )
}
