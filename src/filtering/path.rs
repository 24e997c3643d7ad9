//! Parsed filter keys.
//!
//! A filter key such as `user.first_name+last_name!|title` is parsed once into
//! a [`FilterKey`]: an OR group of [`FieldPath`]s, each with its relation hops,
//! its target column(s) and whether it matches exactly.

use std::str::FromStr;

use crate::errors::RepositoryError;
use crate::relations::relation_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// Trailing `!`: equality (or `IN` for lists).
    Exact,
    /// `LIKE '%value%'`.
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Column(String),
    /// `a+b`: the columns joined by a single space.
    Concat(Vec<String>),
}

/// One `|`-separated segment of a filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    relations: Vec<String>,
    target: Target,
    matching: Matching,
}

impl FieldPath {
    /// # Errors
    /// [`RepositoryError::InvalidArgument`] for empty relation or column names.
    pub fn parse(segment: &str) -> Result<Self, RepositoryError> {
        let invalid = || RepositoryError::invalid_argument(format!("Invalid filter key '{segment}'"));

        let (path, matching) = match segment.strip_suffix('!') {
            Some(path) => (path, Matching::Exact),
            None => (segment, Matching::Substring),
        };

        let mut pieces: Vec<&str> = path.split('.').collect();
        let field = pieces.pop().unwrap_or_default();
        if field.is_empty() || pieces.iter().any(|piece| piece.is_empty()) {
            return Err(invalid());
        }

        let target = if field.contains('+') {
            let columns: Vec<String> = field.split('+').map(str::to_string).collect();
            if columns.iter().any(String::is_empty) {
                return Err(invalid());
            }
            Target::Concat(columns)
        } else {
            Target::Column(field.to_string())
        };

        Ok(Self {
            relations: pieces.into_iter().map(relation_name).collect(),
            target,
            matching,
        })
    }

    /// First relation hop, if the path leaves the current model.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.relations.first().map(String::as_str)
    }

    /// The same path one relation further in.
    #[must_use]
    pub fn tail(&self) -> Self {
        Self {
            relations: self.relations.iter().skip(1).cloned().collect(),
            target: self.target.clone(),
            matching: self.matching,
        }
    }

    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub fn matching(&self) -> Matching {
        self.matching
    }
}

/// A whole filter key: one path, or several alternatives joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey {
    paths: Vec<FieldPath>,
}

impl FilterKey {
    #[must_use]
    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.paths.len() > 1
    }
}

impl FromStr for FilterKey {
    type Err = RepositoryError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let paths = key
            .split('|')
            .map(FieldPath::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> FilterKey {
        raw.parse().unwrap()
    }

    #[test]
    fn test_plain_column() {
        let parsed = key("title");
        assert!(!parsed.is_group());
        let path = &parsed.paths()[0];
        assert_eq!(path.head(), None);
        assert_eq!(path.target(), &Target::Column("title".to_string()));
        assert_eq!(path.matching(), Matching::Substring);
    }

    #[test]
    fn test_exactness_is_per_segment() {
        let parsed = key("title!|body");
        assert!(parsed.is_group());
        assert_eq!(parsed.paths()[0].matching(), Matching::Exact);
        assert_eq!(parsed.paths()[1].matching(), Matching::Substring);

        let parsed = key("title|body!");
        assert_eq!(parsed.paths()[0].matching(), Matching::Substring);
        assert_eq!(parsed.paths()[1].matching(), Matching::Exact);
    }

    #[test]
    fn test_relation_hops_are_normalized() {
        let parsed = key("posts.postMeta.version!");
        let path = &parsed.paths()[0];
        assert_eq!(path.relations(), ["posts", "post_meta"]);
        assert_eq!(path.head(), Some("posts"));

        let tail = path.tail();
        assert_eq!(tail.head(), Some("post_meta"));
        assert_eq!(tail.tail().head(), None);
        assert_eq!(tail.tail().matching(), Matching::Exact);
    }

    #[test]
    fn test_concatenated_columns() {
        let parsed = key("user.first_name+last_name");
        let path = &parsed.paths()[0];
        assert_eq!(path.head(), Some("user"));
        assert_eq!(
            path.target(),
            &Target::Concat(vec!["first_name".to_string(), "last_name".to_string()])
        );
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        for raw in ["", "user.", ".title", "a..b", "first+", "title|", "!"] {
            assert!(
                raw.parse::<FilterKey>().is_err(),
                "'{raw}' should not parse"
            );
        }
    }
}
