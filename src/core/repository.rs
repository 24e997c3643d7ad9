use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend,
    EntityTrait, IntoActiveModel, Iterable, ModelTrait, PaginatorTrait, PrimaryKeyToColumn,
    QueryFilter, QuerySelect, QueryTrait, Select, Statement, Value as DbValue,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::Record;
use super::traits::Resource;
use crate::context::{ArrayContext, ResourceContext};
use crate::errors::RepositoryError;
use crate::filtering::{AllowedWith, SortOrder, apply_sort, eager_relations, filter_condition};
use crate::operations::{Invocation, Mode, Operation};
use crate::pagination::{Listing, Page};
use crate::relations::{QualifiedColumn, Schema};

type LabelFn<M> = Arc<dyn Fn(&M) -> Value + Send + Sync>;

/// LIMIT and OFFSET are bound as signed 64-bit integers.
const MAX_SQL_ROWS: u64 = i64::MAX.unsigned_abs();

/// What `list` uses as the label of each entry.
pub enum ListColumn<M> {
    /// Project `primary_key AS value, column AS label` in SQL.
    Column(String),
    /// Compute the label from each loaded model.
    Mapper(LabelFn<M>),
}

impl<M> ListColumn<M> {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    #[must_use]
    pub fn mapper<F, V>(f: F) -> Self
    where
        F: Fn(&M) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::Mapper(Arc::new(move |model| f(model).into()))
    }
}

impl<M> Clone for ListColumn<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Column(name) => Self::Column(name.clone()),
            Self::Mapper(f) => Self::Mapper(Arc::clone(f)),
        }
    }
}

impl<M> fmt::Debug for ListColumn<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => f.debug_tuple("Column").field(name).finish(),
            Self::Mapper(_) => f.write_str("Mapper(..)"),
        }
    }
}

impl<M> From<&str> for ListColumn<M> {
    fn from(name: &str) -> Self {
        Self::Column(name.to_string())
    }
}

/// One `{value, label}` pair produced by `list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub value: Value,
    pub label: Value,
}

impl ListItem {
    fn from_row(row: &Value) -> Self {
        Self {
            value: row.get("value").cloned().unwrap_or(Value::Null),
            label: row.get("label").cloned().unwrap_or(Value::Null),
        }
    }
}

/// A composed, unexecuted read: the select plus the relations to eager-load.
#[derive(Debug, Clone)]
pub struct ResourceQuery<E: EntityTrait> {
    pub select: Select<E>,
    pub with: Vec<String>,
}

impl<E: EntityTrait> ResourceQuery<E> {
    #[must_use]
    pub fn build(&self, backend: DbBackend) -> Statement {
        self.select.build(backend)
    }

    /// SQL with values inlined, for logging and assertions.
    #[must_use]
    pub fn sql(&self, backend: DbBackend) -> String {
        self.build(backend).to_string()
    }

    #[must_use]
    pub fn into_select(self) -> Select<E> {
        self.select
    }
}

/// Context-driven reads and plain writes for one entity type.
///
/// Reads pass the query through eager-load selection, sorting and filtering
/// (in that order) using the current [`ResourceContext`], then either fetch a
/// page or every row. The `*_query` variants stop before execution.
pub struct Repository<E: Resource> {
    db: DatabaseConnection,
    context: Box<dyn ResourceContext>,
    schema: Schema,
    allowed_with: AllowedWith,
    default_with: Vec<String>,
    default_sort_by: Option<String>,
    default_sort_order: SortOrder,
    default_list_column: Option<ListColumn<E::Model>>,
    entity: PhantomData<E>,
}

impl<E: Resource> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("schema", &self.schema)
            .field("context", &self.context)
            .field("allowed_with", &self.allowed_with)
            .field("default_with", &self.default_with)
            .field("default_sort_by", &self.default_sort_by)
            .field("default_sort_order", &self.default_sort_order)
            .finish_non_exhaustive()
    }
}

impl<E: Resource> Repository<E> {
    /// Repository with an empty context and the entity's own defaults.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (default_sort_by, default_sort_order) = E::default_sort()
            .map_or((None, SortOrder::Asc), |(column, order)| {
                (Some(column.to_string()), order)
            });
        Self {
            db,
            context: Box::new(ArrayContext::default()),
            schema: Schema::of::<E>(),
            allowed_with: E::allowed_with(),
            default_with: E::default_with().iter().map(ToString::to_string).collect(),
            default_sort_by,
            default_sort_order,
            default_list_column: E::default_list_column(),
            entity: PhantomData,
        }
    }

    /// Repository driven by `context`.
    #[must_use]
    pub fn for_context(db: DatabaseConnection, context: impl ResourceContext + 'static) -> Self {
        Self::new(db).with_context(context)
    }

    /// Repository driven by an [`ArrayContext`] built from `values`.
    #[must_use]
    pub fn from_values(db: DatabaseConnection, values: Map<String, Value>) -> Self {
        Self::for_context(db, ArrayContext::new(values))
    }

    #[must_use]
    pub fn with_context(mut self, context: impl ResourceContext + 'static) -> Self {
        self.set_context(context, false);
        self
    }

    /// Replace the context. With `set_allowed_with`, exactly the relations the
    /// new context requests become allowed.
    pub fn set_context(
        &mut self,
        context: impl ResourceContext + 'static,
        set_allowed_with: bool,
    ) -> &mut Self {
        if set_allowed_with {
            self.allowed_with = AllowedWith::only(context.with());
        }
        self.context = Box::new(context);
        self
    }

    #[must_use]
    pub fn context(&self) -> &dyn ResourceContext {
        self.context.as_ref()
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn set_allowed_with(&mut self, allowed: AllowedWith) -> &mut Self {
        self.allowed_with = allowed;
        self
    }

    pub fn set_default_with<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_with = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_default_sort(&mut self, column: &str, order: SortOrder) -> &mut Self {
        self.default_sort_by = Some(column.to_string());
        self.default_sort_order = order;
        self
    }

    pub fn set_default_list_column(&mut self, column: ListColumn<E::Model>) -> &mut Self {
        self.default_list_column = Some(column);
        self
    }

    /// Relations the next read will eager-load.
    #[must_use]
    pub fn eager_relations(&self) -> Vec<String> {
        eager_relations(&self.allowed_with, &self.context.with(), &self.default_with)
    }

    /// Compose a read without executing it.
    ///
    /// # Errors
    /// Invalid sort or filter paths, and relations that cannot be joined.
    pub fn all_query(&self, query: Option<Select<E>>) -> Result<ResourceQuery<E>, RepositoryError> {
        let select = query.unwrap_or_else(E::find);
        let with = self.eager_relations();
        let select = self.sort(select)?;

        let filters = self.context.filters();
        let condition = filter_condition(&self.schema, &filters)?;
        let select = if condition.is_empty() {
            select
        } else {
            select.filter(condition)
        };

        tracing::debug!(
            table = self.schema.table(),
            filters = filters.len(),
            with = ?with,
            "Composed repository query"
        );
        Ok(ResourceQuery { select, with })
    }

    /// Every matching row, or the requested page when the context paginates.
    ///
    /// # Errors
    /// Composition errors from [`all_query`](Self::all_query) and database errors.
    pub async fn all(
        &self,
        query: Option<Select<E>>,
    ) -> Result<Listing<Record<E::Model>>, RepositoryError> {
        let ResourceQuery { select, with } = self.all_query(query)?;
        if self.context.paginate() {
            let (per_page, page) = self.page_window()?;
            let paginator = select.paginate(&self.db, per_page);
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page - 1).await?;
            let records = self.load(models, &with).await?;
            Ok(Listing::Page(Page::new(records, total, per_page, page)))
        } else {
            let models = select.all(&self.db).await?;
            Ok(Listing::All(self.load(models, &with).await?))
        }
    }

    /// Compose a primary-key lookup without executing it. Only eager loading
    /// applies; sorting and filters are ignored.
    #[must_use]
    pub fn find_query<V>(&self, id: V, query: Option<Select<E>>) -> ResourceQuery<E>
    where
        V: Into<DbValue>,
    {
        let key = QualifiedColumn::new(self.schema.table(), self.schema.primary_key());
        let id: DbValue = id.into();
        let select = query.unwrap_or_else(E::find).filter(key.expr().eq(id));
        ResourceQuery {
            select,
            with: self.eager_relations(),
        }
    }

    /// Exactly one row by primary key.
    ///
    /// # Errors
    /// [`RepositoryError::NotFound`] when no row matches.
    pub async fn find<V>(&self, id: V, query: Option<Select<E>>) -> Result<Record<E::Model>, RepositoryError>
    where
        V: Into<DbValue> + fmt::Display,
    {
        let label = id.to_string();
        let not_found = || RepositoryError::not_found(self.schema.table(), Some(label.clone()));

        let ResourceQuery { select, with } = self.find_query(id, query);
        let model = select.one(&self.db).await?.ok_or_else(not_found)?;
        self.load(vec![model], &with)
            .await?
            .pop()
            .ok_or_else(not_found)
    }

    /// Compose the projected `{value, label}` read without executing it.
    ///
    /// A mapper label cannot be expressed in SQL, so for mappers this is the
    /// plain [`all_query`](Self::all_query).
    ///
    /// # Errors
    /// See [`list`](Self::list).
    pub fn list_query(
        &self,
        column: Option<ListColumn<E::Model>>,
        query: Option<Select<E>>,
    ) -> Result<ResourceQuery<E>, RepositoryError> {
        let composed = self.all_query(query)?;
        Ok(match self.list_column(column)? {
            ListColumn::Column(name) => ResourceQuery {
                select: self.project(&name, composed.select),
                with: Vec::new(),
            },
            ListColumn::Mapper(_) => composed,
        })
    }

    /// `{value, label}` pairs for select boxes, keyed by primary key.
    ///
    /// Without an explicit column the entity's default list column is used,
    /// then the default sort column.
    ///
    /// # Errors
    /// [`RepositoryError::InvalidArgument`] when no label column can be
    /// determined, plus everything [`all`](Self::all) can return.
    pub async fn list(
        &self,
        column: Option<ListColumn<E::Model>>,
        query: Option<Select<E>>,
    ) -> Result<Listing<ListItem>, RepositoryError> {
        match self.list_column(column)? {
            ListColumn::Column(name) => {
                let select = self.project(&name, self.all_query(query)?.select).into_json();
                if self.context.paginate() {
                    let (per_page, page) = self.page_window()?;
                    let paginator = select.paginate(&self.db, per_page);
                    let total = paginator.num_items().await?;
                    let rows = paginator.fetch_page(page - 1).await?;
                    let items = rows.iter().map(ListItem::from_row).collect();
                    Ok(Listing::Page(Page::new(items, total, per_page, page)))
                } else {
                    let rows = select.all(&self.db).await?;
                    Ok(Listing::All(rows.iter().map(ListItem::from_row).collect()))
                }
            }
            ListColumn::Mapper(label) => {
                let key = self.schema.primary_key().to_string();
                self.all(query).await?.try_map(|record| {
                    let value = serde_json::to_value(&record.model)?
                        .get(&key)
                        .cloned()
                        .unwrap_or(Value::Null);
                    Ok(ListItem {
                        value,
                        label: label(&record.model),
                    })
                })
            }
        }
    }

    /// Compose the query of a query-only operation named at runtime, such as
    /// `allQuery` or `find_query`. `findQuery` needs `id`; the others ignore it.
    ///
    /// # Errors
    /// [`RepositoryError::MethodNotSupported`] for unknown names and for
    /// operations that execute, [`RepositoryError::InvalidArgument`] for
    /// `findQuery` without an id, plus the composition errors of the named
    /// builder.
    pub fn query_by_name(&self, name: &str, id: Option<DbValue>) -> Result<ResourceQuery<E>, RepositoryError> {
        let invocation: Invocation = name.parse()?;
        if invocation.mode != Mode::QueryOnly {
            return Err(RepositoryError::MethodNotSupported(name.to_string()));
        }
        match invocation.operation {
            Operation::All => self.all_query(None),
            Operation::List => self.list_query(None, None),
            Operation::Find => id
                .map(|id| self.find_query(id, None))
                .ok_or_else(|| RepositoryError::invalid_argument(format!("'{name}' requires an id"))),
            Operation::Create | Operation::Update | Operation::Destroy => {
                Err(RepositoryError::MethodNotSupported(name.to_string()))
            }
        }
    }

    /// Insert a new row.
    ///
    /// # Errors
    /// Database errors.
    pub async fn create<A>(&self, data: A) -> Result<E::Model, RepositoryError>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        let model = data.insert(&self.db).await?;
        tracing::debug!(table = self.schema.table(), "Created record");
        Ok(model)
    }

    /// Apply `changes` to `model` and persist them.
    ///
    /// # Errors
    /// Database errors, including the row having disappeared.
    pub async fn update<A, F>(&self, model: E::Model, changes: F) -> Result<E::Model, RepositoryError>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
        F: FnOnce(&mut A) + Send,
    {
        let mut active = model.into_active_model();
        changes(&mut active);
        let model = active.update(&self.db).await?;
        tracing::debug!(table = self.schema.table(), "Updated record");
        Ok(model)
    }

    /// Delete the row backing `model`.
    ///
    /// # Errors
    /// [`RepositoryError::NotFound`] if nothing was deleted.
    pub async fn destroy(&self, model: &E::Model) -> Result<(), RepositoryError> {
        let not_found = || RepositoryError::not_found(self.schema.table(), None);
        let column = E::PrimaryKey::iter()
            .next()
            .ok_or_else(not_found)?
            .into_column();
        let result = E::delete_many()
            .filter(column.eq(model.get(column)))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found());
        }
        tracing::debug!(table = self.schema.table(), "Deleted record");
        Ok(())
    }

    /// Page size and 1-based page number from the context, rejected when the
    /// resulting LIMIT or OFFSET does not fit the database's integer type.
    fn page_window(&self) -> Result<(u64, u64), RepositoryError> {
        let (per_page, page) = (self.context.per_page(), self.context.page());
        page.saturating_sub(1)
            .checked_mul(per_page)
            .filter(|offset| per_page <= MAX_SQL_ROWS && *offset <= MAX_SQL_ROWS)
            .map(|_| (per_page, page))
            .ok_or_else(|| {
                RepositoryError::invalid_argument(format!(
                    "page {page} with {per_page} per page is out of range"
                ))
            })
    }

    fn sort(&self, select: Select<E>) -> Result<Select<E>, RepositoryError> {
        let requested = self.context.sort_by();
        let Some(column) = requested.column.or_else(|| self.default_sort_by.clone()) else {
            return Ok(select);
        };
        let order = requested.order.unwrap_or(self.default_sort_order);
        tracing::debug!(column = %column, order = order.as_str(), "Sorting");
        apply_sort(select, &self.schema, &column, order)
    }

    fn list_column(&self, column: Option<ListColumn<E::Model>>) -> Result<ListColumn<E::Model>, RepositoryError> {
        column
            .or_else(|| self.default_list_column.clone())
            .or_else(|| self.default_sort_by.clone().map(ListColumn::Column))
            .filter(|column| !matches!(column, ListColumn::Column(name) if name.is_empty()))
            .ok_or_else(|| RepositoryError::invalid_argument("'column' should be a string or callable"))
    }

    fn project(&self, column: &str, select: Select<E>) -> Select<E> {
        let table = self.schema.table();
        let value: SimpleExpr = QualifiedColumn::new(table, self.schema.primary_key()).expr().into();
        let label: SimpleExpr = QualifiedColumn::new(table, column).expr().into();
        select
            .select_only()
            .expr_as(value, "value")
            .expr_as(label, "label")
    }

    async fn load(
        &self,
        models: Vec<E::Model>,
        with: &[String],
    ) -> Result<Vec<Record<E::Model>>, RepositoryError> {
        let mut loaded = Vec::with_capacity(with.len());
        if !models.is_empty() {
            for name in with {
                tracing::trace!(relation = %name, count = models.len(), "Eager loading");
                loaded.push((name, E::load_relation(&self.db, name, &models).await?));
            }
        }

        Ok(models
            .into_iter()
            .enumerate()
            .map(|(index, model)| {
                let mut record = Record::new(model);
                for (name, values) in &loaded {
                    record.relations.insert(
                        (*name).clone(),
                        values.get(index).cloned().unwrap_or(Value::Null),
                    );
                }
                record
            })
            .collect())
    }
}
