use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use serde_json::Value;

use super::repository::ListColumn;
use crate::errors::RepositoryError;
use crate::filtering::{AllowedWith, SortOrder};
use crate::relations::Relation;

/// An entity a [`Repository`](crate::Repository) can serve.
///
/// Implementors describe their relations so dotted filter and sort paths can
/// be joined, and may override the repository defaults.
///
/// ```rust,ignore
/// #[async_trait]
/// impl Resource for post::Entity {
///     const MORPH_CLASS: &'static str = "post";
///
///     fn relation(name: &str) -> Option<Relation> {
///         match name {
///             "user" => Some(Relation::from_def::<user::Entity>(&post::Relation::User.def())),
///             "comments" => Some(Relation::morph_many::<comment::Entity>("commentable")),
///             _ => None,
///         }
///     }
///
///     async fn load_relation(
///         db: &DatabaseConnection,
///         name: &str,
///         models: &[post::Model],
///     ) -> Result<Vec<Value>, RepositoryError> {
///         match name {
///             "user" => relation_values(models.load_one(user::Entity, db).await?),
///             _ => Err(RepositoryError::unknown_relation("posts", name)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Resource: EntityTrait<Model: Serialize + Sync> {
    /// Value polymorphic relations store in their type column for this model.
    const MORPH_CLASS: &'static str;

    /// Relation declared under `name` (snake case), if any.
    fn relation(name: &str) -> Option<Relation>;

    /// Load relation `name` for `models`, returning one JSON value per model
    /// in the same order.
    async fn load_relation(
        db: &DatabaseConnection,
        name: &str,
        models: &[Self::Model],
    ) -> Result<Vec<Value>, RepositoryError> {
        let _ = (db, models);
        Err(RepositoryError::unknown_relation(
            Self::default().table_name(),
            name,
        ))
    }

    fn default_sort() -> Option<(&'static str, SortOrder)> {
        None
    }

    fn allowed_with() -> AllowedWith {
        AllowedWith::default()
    }

    fn default_with() -> &'static [&'static str] {
        &[]
    }

    fn default_list_column() -> Option<ListColumn<Self::Model>> {
        None
    }
}

/// Serialize loader output (`Vec<Vec<M>>` or `Vec<Option<M>>`) into one JSON
/// value per owner.
///
/// # Errors
/// [`RepositoryError::Serialization`] if a related model fails to serialize.
pub fn relation_values<T: Serialize>(loaded: Vec<T>) -> Result<Vec<Value>, RepositoryError> {
    loaded
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(RepositoryError::from)
}
