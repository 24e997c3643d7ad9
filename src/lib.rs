//! # repocrate
//!
//! Context-driven repositories for Sea-ORM entities.
//!
//! A [`Repository`] is bound to one entity implementing [`Resource`]. Its
//! reads are shaped by a [`ResourceContext`] (an explicit [`ArrayContext`] or
//! a [`RequestContext`] extracted from an Axum request) carrying filters,
//! sorting, pagination and eager-load requests:
//!
//! ```rust,ignore
//! use repocrate::{RequestContext, Repository, RepositoryError, Listing, Record};
//!
//! // GET /posts?filters[user.first_name]=mr&sort_by=user.first_name&with[]=comments&page=1
//! async fn index(
//!     State(db): State<DatabaseConnection>,
//!     context: RequestContext,
//! ) -> Result<Json<Listing<Record<post::Model>>>, RepositoryError> {
//!     let repository = Repository::<post::Entity>::for_context(db, context);
//!     Ok(Json(repository.all(None).await?))
//! }
//! ```
//!
//! Filter keys follow a small path language (see [`filtering`]); dotted paths
//! are joined through the relations each [`Resource`] declares.

pub mod context;
pub mod core;
pub mod errors;
pub mod filtering;
pub mod operations;
pub mod pagination;
pub mod relations;

pub use context::{ArrayContext, ContextKey, CurrentUser, KeyMap, RequestContext, ResourceContext, SortBy};
pub use crate::core::{ListColumn, ListItem, Record, Repository, Resource, ResourceQuery, relation_values};
pub use errors::RepositoryError;
pub use filtering::{AllowedWith, SortOrder};
pub use operations::{Invocation, Mode, Operation};
pub use pagination::{Listing, Page};
pub use relations::{JoinKeys, QualifiedColumn, Relation, RelationKind, Schema};
