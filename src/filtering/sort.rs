use sea_orm::sea_query::{Alias, Order, Query, SimpleExpr, SubQueryStatement};
use sea_orm::{EntityTrait, QueryOrder, Select};
use serde::{Deserialize, Serialize};

use crate::errors::RepositoryError;
use crate::relations::{QualifiedColumn, Schema};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive `asc` / `desc`; anything else is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

/// Expression to order `schema` rows by.
///
/// `column` orders by the model's own column. `relation.column` orders by a
/// correlated subquery picking the first matching related value:
///
/// ```sql
/// (SELECT "post_metas"."version" FROM "post_metas" AS "post_metas"
///   WHERE "post_metas"."post_id" = "posts"."id" LIMIT 1)
/// ```
///
/// # Errors
/// - [`RepositoryError::InvalidArgument`] for empty segments or more than one relation hop.
/// - [`RepositoryError::UnknownRelation`] / [`RepositoryError::UnsupportedRelation`]
///   when the relation cannot be joined.
pub fn sort_expression(schema: &Schema, path: &str) -> Result<SimpleExpr, RepositoryError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(RepositoryError::invalid_argument(format!(
            "Invalid sort column '{path}'"
        )));
    }

    match segments.as_slice() {
        [column] => Ok(QualifiedColumn::new(schema.table(), column).expr().into()),
        [name, column] => {
            let relation = schema.relation(name)?;
            let related = relation.related();
            let alias = if related.table() == schema.table() {
                format!("{}_sort", related.table())
            } else {
                related.table().to_string()
            };
            let keys = relation.join_keys(schema, schema.table(), &alias)?;
            tracing::trace!(
                relation = %name,
                kind = relation.kind().name(),
                column = %column,
                "Sorting through relation"
            );

            let mut subquery = Query::select();
            subquery
                .expr(QualifiedColumn::new(&alias, column).expr())
                .from_as(Alias::new(related.table()), Alias::new(&alias))
                .cond_where(keys.condition())
                .limit(1);
            Ok(SimpleExpr::SubQuery(
                None,
                Box::new(SubQueryStatement::SelectStatement(subquery)),
            ))
        }
        _ => Err(RepositoryError::invalid_argument(format!(
            "Cannot sort by '{path}': only one relation hop is supported"
        ))),
    }
}

/// Append the ordering for `path` to `select`.
///
/// # Errors
/// See [`sort_expression`].
pub fn apply_sort<E: EntityTrait>(
    select: Select<E>,
    schema: &Schema,
    path: &str,
    order: SortOrder,
) -> Result<Select<E>, RepositoryError> {
    let expr = sort_expression(schema, path)?;
    Ok(select.order_by(expr, order.into()))
}
