use std::collections::BTreeMap;
use std::ops::Deref;

use serde::Serialize;
use serde_json::Value;

/// A model together with the relations eager-loaded for it.
///
/// Serializes as the model's fields followed by one field per loaded relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<M> {
    #[serde(flatten)]
    pub model: M,
    #[serde(flatten)]
    pub relations: BTreeMap<String, Value>,
}

impl<M> Record<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Value> {
        self.relations.get(name)
    }

    #[must_use]
    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    #[must_use]
    pub fn into_model(self) -> M {
        self.model
    }
}

impl<M> Deref for Record<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}
