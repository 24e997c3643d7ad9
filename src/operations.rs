use std::fmt;
use std::str::FromStr;

use crate::errors::RepositoryError;

/// Repository operations addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    All,
    Find,
    List,
    Create,
    Update,
    Destroy,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Find => "find",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    /// Whether the operation has a variant returning the composed query.
    #[must_use]
    pub const fn supports_query_only(self) -> bool {
        matches!(self, Self::All | Self::Find | Self::List)
    }
}

/// Whether an operation runs or only composes its query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Execute,
    QueryOnly,
}

/// A parsed operation name such as `list` or `allQuery`.
///
/// [`Repository::query_by_name`](crate::Repository::query_by_name) composes
/// the query-only forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Invocation {
    pub operation: Operation,
    pub mode: Mode,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Execute => f.write_str(self.operation.as_str()),
            Mode::QueryOnly => write!(f, "{}Query", self.operation.as_str()),
        }
    }
}

impl FromStr for Invocation {
    type Err = RepositoryError;

    /// Accepts `all`, `find`, `list`, `create`, `update`, `destroy` and the
    /// query-only forms `allQuery`/`all_query`, `findQuery`, `listQuery`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let unsupported = || RepositoryError::MethodNotSupported(name.to_string());

        let (base, mode) = match name
            .strip_suffix("Query")
            .or_else(|| name.strip_suffix("_query"))
        {
            Some(base) => (base, Mode::QueryOnly),
            None => (name, Mode::Execute),
        };

        let operation = match base {
            "all" => Operation::All,
            "find" => Operation::Find,
            "list" => Operation::List,
            "create" => Operation::Create,
            "update" => Operation::Update,
            "destroy" => Operation::Destroy,
            _ => return Err(unsupported()),
        };

        if mode == Mode::QueryOnly && !operation.supports_query_only() {
            return Err(unsupported());
        }
        Ok(Self { operation, mode })
    }
}
