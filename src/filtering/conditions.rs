use sea_orm::Value as DbValue;
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, Query, SimpleExpr};
use sea_orm::Condition;
use serde_json::{Map, Value};

use super::path::{FieldPath, FilterKey, Matching, Target};
use crate::context::is_truthy;
use crate::errors::RepositoryError;
use crate::relations::{QualifiedColumn, Schema};

/// Translate a filter map into a condition on `schema`'s table.
///
/// Entries are ANDed together. Falsy values are skipped, nested maps are read
/// as dotted keys, and each key is parsed into a [`FilterKey`].
///
/// # Errors
/// Propagates malformed keys and relations that are undeclared or cannot be joined.
pub fn filter_condition(
    schema: &Schema,
    filters: &Map<String, Value>,
) -> Result<Condition, RepositoryError> {
    let mut condition = Condition::all();
    for (raw_key, value) in flatten(filters) {
        if !is_truthy(&value) {
            continue;
        }
        let key: FilterKey = raw_key.parse()?;
        tracing::debug!(key = %raw_key, group = key.is_group(), "Applying filter");
        condition = condition.add(key_condition(schema, &key, &value)?);
    }
    Ok(condition)
}

/// `{"posts": {"title": "x"}}` becomes `[("posts.title", "x")]`.
fn flatten(filters: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut entries = Vec::new();
    for (key, value) in filters {
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                entries.extend(
                    flatten(nested)
                        .into_iter()
                        .map(|(inner, value)| (format!("{key}.{inner}"), value)),
                );
            }
            _ => entries.push((key.clone(), value.clone())),
        }
    }
    entries
}

fn key_condition(
    schema: &Schema,
    key: &FilterKey,
    value: &Value,
) -> Result<Condition, RepositoryError> {
    let root = Scope {
        schema,
        alias: schema.table().to_string(),
        taken: vec![schema.table().to_string()],
    };
    key.paths()
        .iter()
        .try_fold(Condition::any(), |group, path| {
            Ok(group.add(path_condition(&root, path, value)?))
        })
}

/// The table a path segment is evaluated against.
struct Scope<'a> {
    schema: &'a Schema,
    alias: String,
    taken: Vec<String>,
}

impl Scope<'_> {
    /// Alias for a related table, distinct from every enclosing alias.
    fn alias_for(&self, table: &str) -> String {
        if self.taken.iter().any(|alias| alias == table) {
            format!("{table}_{}", self.taken.len())
        } else {
            table.to_string()
        }
    }
}

fn path_condition(
    scope: &Scope<'_>,
    path: &FieldPath,
    value: &Value,
) -> Result<Condition, RepositoryError> {
    let Some(head) = path.head() else {
        return Ok(leaf_condition(&scope.alias, path, value));
    };

    let relation = scope.schema.relation(head)?;
    let related = relation.related();
    let alias = scope.alias_for(related.table());
    let keys = relation.join_keys(scope.schema, &scope.alias, &alias)?;
    tracing::trace!(
        relation = %head,
        kind = relation.kind().name(),
        alias = %alias,
        "Filtering through relation"
    );

    let mut taken = scope.taken.clone();
    taken.push(alias.clone());
    let inner_scope = Scope {
        schema: related,
        alias,
        taken,
    };
    let inner = path_condition(&inner_scope, &path.tail(), value)?;

    let mut subquery = Query::select();
    subquery
        .expr(Expr::val(1))
        .from_as(
            Alias::new(related.table()),
            Alias::new(&inner_scope.alias),
        )
        .cond_where(keys.condition().add(inner));
    Ok(Condition::all().add(Expr::exists(subquery)))
}

fn leaf_condition(alias: &str, path: &FieldPath, value: &Value) -> Condition {
    let subject: SimpleExpr = match path.target() {
        Target::Column(column) => QualifiedColumn::new(alias, column).expr().into(),
        Target::Concat(columns) => Func::cust(Alias::new("CONCAT_WS"))
            .args(concat_args(alias, columns))
            .into(),
    };

    match (path.matching(), value) {
        (Matching::Exact, Value::Array(items)) => {
            Condition::all().add(Expr::expr(subject).is_in(items.iter().map(exact_value)))
        }
        (Matching::Exact, scalar) => Condition::all().add(Expr::expr(subject).eq(exact_value(scalar))),
        (Matching::Substring, Value::Array(items)) => items.iter().fold(Condition::any(), |any, item| {
            any.add(Expr::expr(subject.clone()).like(like_contains(item)))
        }),
        (Matching::Substring, scalar) => {
            Condition::all().add(Expr::expr(subject).like(like_contains(scalar)))
        }
    }
}

/// Separator first, then the columns: `CONCAT_WS(' ', a, b)`.
fn concat_args(alias: &str, columns: &[String]) -> Vec<SimpleExpr> {
    std::iter::once(SimpleExpr::from(Expr::val(" ")))
        .chain(
            columns
                .iter()
                .map(|column| SimpleExpr::from(QualifiedColumn::new(alias, column).expr())),
        )
        .collect()
}

/// Bind JSON scalars with their own SQL type.
///
/// Numbers bind as `BIGINT`/`DOUBLE` whatever the column type. SQLite and
/// MySQL convert them against text columns; PostgreSQL rejects `text = bigint`,
/// so exact matches on text columns there need string values (`"9"`, not `9`).
fn exact_value(value: &Value) -> DbValue {
    match value {
        Value::Bool(flag) => (*flag).into(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.into()
            } else if let Some(uint) = number.as_u64() {
                uint.into()
            } else {
                number.as_f64().unwrap_or_default().into()
            }
        }
        Value::String(text) => text.clone().into(),
        other => other.to_string().into(),
    }
}

fn like_contains(value: &Value) -> LikeExpr {
    LikeExpr::new(like_pattern(value)).escape('\\')
}

/// `%value%` with LIKE metacharacters escaped, so the value matches literally.
fn like_pattern(value: &Value) -> String {
    let mut pattern = String::from("%");
    for ch in like_text(value).chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn like_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => String::from(if *flag { "1" } else { "0" }),
        other => other.to_string(),
    }
}
