use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::models::{CoreError, CoreErrorKind, CoreResult};

/// Identity of a task configuration inside a [`ConfigStore`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ConfigId(pub usize);

/// One unit of work handed to the execution engine.
///
/// `task_type` names the task implementation that runs it. Everything else the
/// source unit declared for the task lives in `fields`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskConfig {
    pub task_type: String,
    pub fields: Map<String, Value>,
}

impl TaskConfig {
    /// Reserved source key carrying the implementation type.
    pub const TYPE_KEY: &'static str = "task";
    pub const NAME_KEY: &'static str = "name";

    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        let name: String = name.into();
        self.with_field(Self::NAME_KEY, name)
    }

    /// Builds a configuration from a source object. Objects without a string
    /// `task` key are handed back unchanged.
    pub fn from_object(mut object: Map<String, Value>) -> Result<Self, Map<String, Value>> {
        let task_type = match object.get(Self::TYPE_KEY) {
            Some(Value::String(task_type)) => task_type.clone(),
            _ => return Err(object),
        };
        object.remove(Self::TYPE_KEY);

        Ok(Self {
            task_type,
            fields: object,
        })
    }

    /// Explicit name designator. Only string names count.
    pub fn name(&self) -> Option<&str> {
        self.fields.get(Self::NAME_KEY).and_then(Value::as_str)
    }

    pub fn identity(&self) -> &str {
        self.name().unwrap_or(&self.task_type)
    }

    /// A configuration with a name is addressed by that name only; an unnamed
    /// one is addressed by its implementation type.
    pub fn matches_selector(&self, selector: &str) -> bool {
        match self.name() {
            Some(name) => name == selector,
            None => self.task_type == selector,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(
            Self::TYPE_KEY.to_string(),
            Value::String(self.task_type.clone()),
        );
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

impl Serialize for TaskConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(Self::TYPE_KEY, &self.task_type)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Owns every task configuration loaded for a run.
///
/// Namespaces and pipelines refer to configurations by [`ConfigId`], so a
/// configuration reachable from several bindings is one shared record.
#[derive(Clone, Debug, Default)]
pub struct ConfigStore {
    configs: Vec<TaskConfig>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: TaskConfig) -> ConfigId {
        let id = ConfigId(self.configs.len());
        self.configs.push(config);
        id
    }

    pub fn get(&self, id: ConfigId) -> Option<&TaskConfig> {
        self.configs.get(id.0)
    }

    pub fn get_mut(&mut self, id: ConfigId) -> Option<&mut TaskConfig> {
        self.configs.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Copies the configurations behind `ids`, in order.
    pub fn snapshot(&self, ids: &[ConfigId]) -> CoreResult<Vec<TaskConfig>> {
        ids.iter()
            .map(|id| {
                self.get(*id).cloned().ok_or_else(|| {
                    CoreError::new(
                        CoreErrorKind::Internal,
                        format!("unknown configuration id '{}'", id.0),
                    )
                })
            })
            .collect()
    }
}
