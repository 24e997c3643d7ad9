use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use super::{
    ContextKey, DEFAULT_PAGE, DEFAULT_PER_PAGE, ResourceContext, SortBy, as_object,
    positive_integer, read_sort, string_list,
};

/// Renames the wire parameters a [`RequestContext`] reads.
///
/// Deserializes from a plain map, so it can live in application config:
///
/// ```json
/// { "sort_by": "orderBy", "sort_order": "direction" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap {
    names: BTreeMap<ContextKey, String>,
}

impl KeyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn map_key(mut self, key: ContextKey, name: impl Into<String>) -> Self {
        self.names.insert(key, name.into());
        self
    }

    /// Wire name for `key`, falling back to the key's own name.
    #[must_use]
    pub fn name(&self, key: ContextKey) -> &str {
        self.names.get(&key).map_or(key.as_str(), String::as_str)
    }
}

/// Principal placed in request extensions by an authentication layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub Value);

/// Context read from request parameters.
///
/// Only the parameters named by the [`KeyMap`] are ever read. Pagination is
/// requested by the mere presence of the page parameter, and a missing sort
/// order stays absent so the repository default can apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    params: Map<String, Value>,
    keys: KeyMap,
    user: Option<Value>,
}

impl RequestContext {
    /// Wrap an already decoded parameter bag.
    #[must_use]
    pub fn new(params: Map<String, Value>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Decode a raw query string such as
    /// `filters[title]=crab&with[]=comments&page=2`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::new(parse_query(query))
    }

    #[must_use]
    pub fn map_keys(mut self, keys: KeyMap) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    fn param(&self, key: ContextKey) -> Option<&Value> {
        self.params.get(self.keys.name(key))
    }
}

impl ResourceContext for RequestContext {
    fn filters(&self) -> Map<String, Value> {
        as_object(self.param(ContextKey::Filters))
    }

    fn page(&self) -> u64 {
        positive_integer(self.param(ContextKey::Page)).unwrap_or(DEFAULT_PAGE)
    }

    fn per_page(&self) -> u64 {
        positive_integer(self.param(ContextKey::PerPage)).unwrap_or(DEFAULT_PER_PAGE)
    }

    fn paginate(&self) -> bool {
        self.param(ContextKey::Page).is_some()
    }

    fn sort_by(&self) -> SortBy {
        read_sort(
            self.param(ContextKey::SortBy),
            self.param(ContextKey::SortOrder),
        )
    }

    fn with(&self) -> Vec<String> {
        string_list(self.param(ContextKey::With))
    }

    fn user(&self) -> Option<Value> {
        self.user.clone()
    }

    fn to_array(&self) -> Map<String, Value> {
        let sort = self.sort_by();
        let mut values = Map::new();
        values.insert(ContextKey::Filters.to_string(), Value::Object(self.filters()));
        values.insert(ContextKey::Page.to_string(), self.page().into());
        values.insert("paginate".to_string(), self.paginate().into());
        values.insert(ContextKey::PerPage.to_string(), self.per_page().into());
        values.insert(
            ContextKey::SortBy.to_string(),
            sort.column.map_or(Value::Null, Value::String),
        );
        values.insert(
            ContextKey::SortOrder.to_string(),
            sort.order
                .map_or(Value::Null, |order| Value::String(order.as_str().to_string())),
        );
        values.insert(
            ContextKey::User.to_string(),
            self.user.clone().unwrap_or(Value::Null),
        );
        values.insert(
            ContextKey::With.to_string(),
            self.with().into_iter().map(Value::String).collect(),
        );
        values
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut context = Self::from_query(parts.uri.query().unwrap_or_default());
        if let Some(keys) = parts.extensions.get::<KeyMap>() {
            context = context.map_keys(keys.clone());
        }
        if let Some(CurrentUser(user)) = parts.extensions.get::<CurrentUser>() {
            context = context.with_user(user.clone());
        }
        Ok(context)
    }
}

/// Decode a query string into nested JSON using bracket notation.
///
/// `a[b]=1` nests into maps, `a[]=1` appends to a list and a repeated plain
/// key keeps the last value. All leaf values are strings.
#[must_use]
pub fn parse_query(query: &str) -> Map<String, Value> {
    let mut params = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let (base, segments) = split_brackets(&key);
        if base.is_empty() {
            continue;
        }
        insert_param(&mut params, base, &segments, Value::String(value.into_owned()));
    }
    params
}

fn split_brackets(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);
    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    (base, segments)
}

fn insert_param(params: &mut Map<String, Value>, key: &str, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        params.insert(key.to_string(), value);
        return;
    };

    let slot = params.entry(key).or_insert(Value::Null);
    if first.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(value);
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(nested) = slot {
        insert_param(nested, first, rest, value);
    }
}
