//! Relation reflection used by the filter and sort engines.
//!
//! Each [`Resource`] answers "what is relation `name` and how is it joined"
//! through [`Resource::relation`]. The answer is a [`Relation`]: a closed
//! [`RelationKind`] plus the [`Schema`] of the related model, which in turn can
//! resolve its own relations so dotted paths can be followed to any depth.

use std::fmt;

use heck::ToSnakeCase;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{Condition, EntityTrait, IdenStatic, Identity, Iterable, PrimaryKeyToColumn, RelationDef};

use crate::core::Resource;
use crate::errors::RepositoryError;

/// Runtime description of a model: its table, key, morph class and relations.
#[derive(Clone)]
pub struct Schema {
    table: String,
    primary_key: String,
    morph_class: &'static str,
    resolver: fn(&str) -> Option<Relation>,
}

impl Schema {
    #[must_use]
    pub fn of<R: Resource>() -> Self {
        Self {
            table: R::default().table_name().to_string(),
            primary_key: primary_key_name::<R>(),
            morph_class: R::MORPH_CLASS,
            resolver: R::relation,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub fn morph_class(&self) -> &'static str {
        self.morph_class
    }

    /// Look up a relation by its wire name (`postMeta`, `post-meta` and
    /// `post_meta` all resolve the same accessor).
    ///
    /// # Errors
    /// [`RepositoryError::UnknownRelation`] when the model does not declare it.
    pub fn relation(&self, name: &str) -> Result<Relation, RepositoryError> {
        let name = relation_name(name);
        (self.resolver)(&name).ok_or_else(|| RepositoryError::unknown_relation(&self.table, name))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("morph_class", &self.morph_class)
            .finish_non_exhaustive()
    }
}

/// Relation accessor name in Rust convention.
#[must_use]
pub fn relation_name(name: &str) -> String {
    name.to_snake_case()
}

/// First primary key column of `E`.
pub(crate) fn primary_key_name<E: EntityTrait>() -> String {
    E::PrimaryKey::iter()
        .next()
        .map_or_else(|| "id".to_string(), |key| key.into_column().as_str().to_string())
}

/// How a relation is joined. Key names follow the usual ORM vocabulary:
/// a foreign key lives on the child table, the owner/local key on the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// The owner holds `foreign_key`, pointing at `owner_key` on the related table.
    BelongsTo {
        foreign_key: String,
        owner_key: String,
    },
    /// The related table holds `foreign_key`, pointing at `local_key` on the
    /// owner (its primary key when `None`).
    HasOneOrMany {
        foreign_key: String,
        local_key: Option<String>,
    },
    /// Like `HasOneOrMany`, with `morph_type` on the related table holding the
    /// owner's morph class.
    MorphOneOrMany {
        foreign_key: String,
        morph_type: String,
        local_key: Option<String>,
    },
    /// Declared but not joinable, e.g. `HasManyThrough`.
    Unsupported(String),
}

impl RelationKind {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::BelongsTo { .. } => "BelongsTo",
            Self::HasOneOrMany { .. } => "HasOneOrMany",
            Self::MorphOneOrMany { .. } => "MorphOneOrMany",
            Self::Unsupported(kind) => kind,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Relation {
    kind: RelationKind,
    related: Schema,
}

impl Relation {
    #[must_use]
    pub fn new<R: Resource>(kind: RelationKind) -> Self {
        Self {
            kind,
            related: Schema::of::<R>(),
        }
    }

    #[must_use]
    pub fn belongs_to<R: Resource>(foreign_key: &str, owner_key: &str) -> Self {
        Self::new::<R>(RelationKind::BelongsTo {
            foreign_key: foreign_key.to_string(),
            owner_key: owner_key.to_string(),
        })
    }

    #[must_use]
    pub fn has_one<R: Resource>(foreign_key: &str) -> Self {
        Self::new::<R>(RelationKind::HasOneOrMany {
            foreign_key: foreign_key.to_string(),
            local_key: None,
        })
    }

    #[must_use]
    pub fn has_many<R: Resource>(foreign_key: &str) -> Self {
        Self::has_one::<R>(foreign_key)
    }

    /// Polymorphic relation named `name`, stored in `{name}_id` / `{name}_type`.
    #[must_use]
    pub fn morph_many<R: Resource>(name: &str) -> Self {
        Self::new::<R>(RelationKind::MorphOneOrMany {
            foreign_key: format!("{name}_id"),
            morph_type: format!("{name}_type"),
            local_key: None,
        })
    }

    #[must_use]
    pub fn morph_one<R: Resource>(name: &str) -> Self {
        Self::morph_many::<R>(name)
    }

    #[must_use]
    pub fn unsupported<R: Resource>(kind: &str) -> Self {
        Self::new::<R>(RelationKind::Unsupported(kind.to_string()))
    }

    /// Override the owner-side key of a has/morph relation.
    #[must_use]
    pub fn with_local_key(mut self, key: &str) -> Self {
        match &mut self.kind {
            RelationKind::HasOneOrMany { local_key, .. }
            | RelationKind::MorphOneOrMany { local_key, .. } => *local_key = Some(key.to_string()),
            RelationKind::BelongsTo { .. } | RelationKind::Unsupported(_) => {}
        }
        self
    }

    /// Bridge a Sea-ORM relation definition (`Relation::Posts.def()`).
    ///
    /// Owner-side definitions (`has_one`, `has_many`) become
    /// [`RelationKind::HasOneOrMany`], the rest [`RelationKind::BelongsTo`].
    /// Composite keys cannot be expressed by the engines.
    #[must_use]
    pub fn from_def<R: Resource>(def: &RelationDef) -> Self {
        let (Some(from), Some(to)) = (unary(&def.from_col), unary(&def.to_col)) else {
            return Self::unsupported::<R>("CompositeKey");
        };
        let kind = if def.is_owner {
            RelationKind::HasOneOrMany {
                foreign_key: to,
                local_key: Some(from),
            }
        } else {
            RelationKind::BelongsTo {
                foreign_key: from,
                owner_key: to,
            }
        };
        Self::new::<R>(kind)
    }

    #[must_use]
    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }

    #[must_use]
    pub fn related(&self) -> &Schema {
        &self.related
    }

    /// Columns joining `owner` (queried as `owner_alias`) to the related
    /// table (queried as `related_alias`).
    ///
    /// # Errors
    /// [`RepositoryError::UnsupportedRelation`] for kinds without join keys.
    pub fn join_keys(
        &self,
        owner: &Schema,
        owner_alias: &str,
        related_alias: &str,
    ) -> Result<JoinKeys, RepositoryError> {
        let local = |key: &Option<String>| {
            QualifiedColumn::new(owner_alias, key.as_deref().unwrap_or(owner.primary_key()))
        };
        let keys = match &self.kind {
            RelationKind::BelongsTo {
                foreign_key,
                owner_key,
            } => JoinKeys {
                owner_key: QualifiedColumn::new(owner_alias, foreign_key),
                related_key: QualifiedColumn::new(related_alias, owner_key),
                discriminator: None,
            },
            RelationKind::HasOneOrMany {
                foreign_key,
                local_key,
            } => JoinKeys {
                owner_key: local(local_key),
                related_key: QualifiedColumn::new(related_alias, foreign_key),
                discriminator: None,
            },
            RelationKind::MorphOneOrMany {
                foreign_key,
                morph_type,
                local_key,
            } => JoinKeys {
                owner_key: local(local_key),
                related_key: QualifiedColumn::new(related_alias, foreign_key),
                discriminator: Some((
                    QualifiedColumn::new(related_alias, morph_type),
                    owner.morph_class().to_string(),
                )),
            },
            RelationKind::Unsupported(kind) => {
                return Err(RepositoryError::unsupported_relation(kind.as_str()));
            }
        };
        Ok(keys)
    }
}

fn unary(identity: &Identity) -> Option<String> {
    match identity {
        Identity::Unary(iden) => Some(iden.to_string()),
        _ => None,
    }
}

/// A `table.column` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedColumn {
    pub table: String,
    pub column: String,
}

impl QualifiedColumn {
    #[must_use]
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    #[must_use]
    pub fn expr(&self) -> Expr {
        Expr::col((Alias::new(&self.table), Alias::new(&self.column)))
    }

    fn column_ref(&self) -> (Alias, Alias) {
        (Alias::new(&self.table), Alias::new(&self.column))
    }
}

impl fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Join predicate between an owner row and related rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKeys {
    pub owner_key: QualifiedColumn,
    pub related_key: QualifiedColumn,
    /// Polymorphic type column and the owner's morph class.
    pub discriminator: Option<(QualifiedColumn, String)>,
}

impl JoinKeys {
    /// `related_key = owner_key [AND type_column = morph_class]`.
    #[must_use]
    pub fn condition(&self) -> Condition {
        let condition = Condition::all().add(self.related_key.expr().equals(self.owner_key.column_ref()));
        match &self.discriminator {
            Some((column, class)) => condition.add(column.expr().eq(class.as_str())),
            None => condition,
        }
    }
}
