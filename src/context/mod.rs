//! # Resource contexts
//!
//! A resource context carries the options a caller wants applied to a
//! repository query: filters, pagination, sorting, eager-loaded relations and
//! the acting user. Two implementations are provided:
//!
//! - [`ArrayContext`]: built from an explicit JSON map, with `merge`,
//!   `exclude`, `get` and `set` for controlled mutation.
//! - [`RequestContext`]: read-only view over request parameters, usable as an
//!   Axum extractor.
//!
//! Both expose the same [`ResourceContext`] trait, so a [`Repository`] never
//! cares where its options came from.
//!
//! [`Repository`]: crate::Repository

mod array;
mod request;

pub use array::ArrayContext;
pub use request::{CurrentUser, KeyMap, RequestContext, parse_query};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::RepositoryError;
use crate::filtering::SortOrder;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 15;

/// The option keys a context recognizes. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKey {
    Filters,
    Page,
    PerPage,
    SortBy,
    SortOrder,
    User,
    With,
}

impl ContextKey {
    pub const ALL: [Self; 7] = [
        Self::Filters,
        Self::Page,
        Self::PerPage,
        Self::SortBy,
        Self::SortOrder,
        Self::User,
        Self::With,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filters => "filters",
            Self::Page => "page",
            Self::PerPage => "per_page",
            Self::SortBy => "sort_by",
            Self::SortOrder => "sort_order",
            Self::User => "user",
            Self::With => "with",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKey {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| RepositoryError::invalid_argument(format!("Unknown context key '{s}'")))
    }
}

/// Requested ordering. Either piece may be absent, in which case the
/// repository falls back to its own default for that piece.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortBy {
    pub column: Option<String>,
    pub order: Option<SortOrder>,
}

impl SortBy {
    /// Direction with the ascending default applied.
    #[must_use]
    pub fn direction(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }
}

/// Read access to the options that drive a repository query.
pub trait ResourceContext: fmt::Debug + Send + Sync {
    /// Filter map, keyed by filter path.
    fn filters(&self) -> Map<String, Value>;

    /// Requested page, 1-based.
    fn page(&self) -> u64;

    fn per_page(&self) -> u64;

    /// Whether the caller asked for a paginated result.
    fn paginate(&self) -> bool;

    fn sort_by(&self) -> SortBy;

    /// Relation names requested for eager loading, in request order.
    fn with(&self) -> Vec<String>;

    /// Acting principal, if one was attached.
    fn user(&self) -> Option<Value>;

    /// Snapshot of every recognized option plus the derived `paginate` flag.
    fn to_array(&self) -> Map<String, Value>;
}

/// Loose truthiness used for `page` and for dropping empty filters.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Positive integer from a number or numeric string.
pub(crate) fn positive_integer(value: Option<&Value>) -> Option<u64> {
    let parsed = match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|n| *n > 0)
}

/// Relation names from a list or a single string.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn as_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

fn sort_column(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn read_sort(column: Option<&Value>, order: Option<&Value>) -> SortBy {
    SortBy {
        column: sort_column(column),
        order: order.and_then(Value::as_str).and_then(SortOrder::parse),
    }
}
