use serde_json::{Map, Value};

use super::{
    ContextKey, DEFAULT_PAGE, DEFAULT_PER_PAGE, ResourceContext, SortBy, as_object, is_truthy,
    positive_integer, read_sort, string_list,
};
use crate::errors::RepositoryError;

/// Context backed by an explicit map of options.
///
/// Unrecognized top-level keys are dropped on construction and on merge, so
/// the stored map only ever contains [`ContextKey`] entries.
///
/// ```rust,ignore
/// let mut context = ArrayContext::from_json(json!({
///     "filters": {"title": "crab"},
///     "sort_by": "created_at",
///     "sort_order": "desc",
/// }))?;
/// context.merge(json!({"filters": {"user.first_name": "mr"}}).as_object().cloned().unwrap_or_default());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayContext {
    values: Map<String, Value>,
}

impl ArrayContext {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            values: recognized(values),
        }
    }

    /// Build from a JSON value, which must be an object.
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidArgument`] for any non-object value.
    pub fn from_json(value: Value) -> Result<Self, RepositoryError> {
        match value {
            Value::Object(values) => Ok(Self::new(values)),
            other => Err(RepositoryError::invalid_argument(format!(
                "A context must be built from an object, got {other}"
            ))),
        }
    }

    /// Snapshot any other context.
    #[must_use]
    pub fn from_context(context: &dyn ResourceContext) -> Self {
        Self::new(context.to_array())
    }

    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.values.insert(ContextKey::User.as_str().to_string(), user);
        self
    }

    /// Merge options into the context.
    ///
    /// Nested maps merge recursively, lists are unioned and scalars are
    /// replaced by the incoming value.
    pub fn merge(&mut self, values: Map<String, Value>) -> &mut Self {
        for (key, incoming) in recognized(values) {
            match self.values.get_mut(&key) {
                Some(existing) => merge_value(existing, incoming),
                None => {
                    self.values.insert(key, incoming);
                }
            }
        }
        self
    }

    /// Remove top-level options.
    pub fn exclude<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.values.remove(key.as_ref());
        }
        self
    }

    /// Read a value by dotted path, e.g. `filters.name`.
    ///
    /// Below the top-level key an exact key match wins over descending, so
    /// dotted filter keys such as `filters.user.first_name` are reachable.
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidArgument`] when the path does not start
    /// with a recognized key.
    pub fn get(&self, path: &str) -> Result<Option<&Value>, RepositoryError> {
        let (head, rest) = split_head(path)?;
        let Some(value) = self.values.get(head.as_str()) else {
            return Ok(None);
        };
        Ok(match rest {
            Some(rest) => lookup(value, rest),
            None => Some(value),
        })
    }

    /// Like [`get`](Self::get) with a fallback for missing values.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub fn get_or(&self, path: &str, default: Value) -> Result<Value, RepositoryError> {
        Ok(self.get(path)?.cloned().unwrap_or(default))
    }

    /// Write a value by dotted path, creating intermediate maps.
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidArgument`] when the path does not start
    /// with a recognized key.
    pub fn set(&mut self, path: &str, value: Value) -> Result<&mut Self, RepositoryError> {
        let (head, rest) = split_head(path)?;
        let Some(rest) = rest else {
            self.values.insert(head.as_str().to_string(), value);
            return Ok(self);
        };

        let slot = self
            .values
            .entry(head.as_str())
            .or_insert(Value::Null);
        assign(slot, rest, value);
        Ok(self)
    }

    /// Raw view of the stored options.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for ArrayContext {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

impl ResourceContext for ArrayContext {
    fn filters(&self) -> Map<String, Value> {
        as_object(self.values.get(ContextKey::Filters.as_str()))
    }

    fn page(&self) -> u64 {
        positive_integer(self.values.get(ContextKey::Page.as_str())).unwrap_or(DEFAULT_PAGE)
    }

    fn per_page(&self) -> u64 {
        positive_integer(self.values.get(ContextKey::PerPage.as_str())).unwrap_or(DEFAULT_PER_PAGE)
    }

    fn paginate(&self) -> bool {
        self.values
            .get(ContextKey::Page.as_str())
            .is_some_and(is_truthy)
    }

    fn sort_by(&self) -> SortBy {
        read_sort(
            self.values.get(ContextKey::SortBy.as_str()),
            self.values.get(ContextKey::SortOrder.as_str()),
        )
    }

    fn with(&self) -> Vec<String> {
        string_list(self.values.get(ContextKey::With.as_str()))
    }

    fn user(&self) -> Option<Value> {
        self.values
            .get(ContextKey::User.as_str())
            .filter(|user| !user.is_null())
            .cloned()
    }

    fn to_array(&self) -> Map<String, Value> {
        let mut values = self.values.clone();
        values.insert("paginate".to_string(), Value::Bool(self.paginate()));
        values
    }
}

fn recognized(values: Map<String, Value>) -> Map<String, Value> {
    values
        .into_iter()
        .filter(|(key, _)| {
            let known = key.parse::<ContextKey>().is_ok();
            if !known {
                tracing::trace!(key = %key, "Dropping unrecognized context key");
            }
            known
        })
        .collect()
}

fn split_head(path: &str) -> Result<(ContextKey, Option<&str>), RepositoryError> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    Ok((head.parse()?, rest.filter(|rest| !rest.is_empty())))
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let map = value.as_object()?;
    if let Some(found) = map.get(path) {
        return Some(found);
    }
    let (first, rest) = path.split_once('.')?;
    lookup(map.get(first)?, rest)
}

fn assign(slot: &mut Value, path: &str, value: Value) {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let Value::Object(map) = slot else {
        return;
    };
    match path.split_once('.') {
        Some((segment, rest)) => assign(map.entry(segment).or_insert(Value::Null), rest, value),
        None => {
            map.insert(path.to_string(), value);
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match current.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(current), Value::Array(incoming)) => {
            for item in incoming {
                if !current.contains(&item) {
                    current.push(item);
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}
