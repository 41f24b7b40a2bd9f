use indexmap::IndexMap;
use serde_json::Value;

/// Argument mapping of a field, in declaration order.
pub type Arguments = serde_json::Map<String, Value>;

/// A record of the data store. Relations are only present once eager-loaded and are always
/// stored as lists, the relation field decides whether it exposes one entity or many.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entity {
    pub model: String,
    pub key: Value,
    pub attributes: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub relations: IndexMap<String, Vec<Entity>>,
}

impl Entity {
    pub fn new(model: impl Into<String>, key: impl Into<Value>, attributes: serde_json::Map<String, Value>) -> Self {
        Entity {
            model: model.into(),
            key: key.into(),
            attributes,
            relations: IndexMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&[Entity]> {
        self.relations.get(name).map(Vec::as_slice)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, entities: Vec<Entity>) {
        self.relations.insert(name.into(), entities);
    }

    /// String form of the primary key, as used in identifiers and diagnostics.
    pub fn key_string(&self) -> String {
        key_to_string(&self.key)
    }
}

pub fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(key) => key.clone(),
        other => other.to_string(),
    }
}
