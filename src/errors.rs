//! # Repository errors
//!
//! Every fallible operation in this crate returns [`RepositoryError`]. The enum
//! distinguishes caller mistakes (bad context keys, unsupported sort paths),
//! configuration mistakes (undeclared or unsupported relations) and failures
//! coming from the database.
//!
//! When used inside an Axum handler the error converts into a response with a
//! sanitized message; database details are only written to the log.
//!
//! ```rust,ignore
//! async fn index(
//!     State(db): State<DatabaseConnection>,
//!     context: RequestContext,
//! ) -> Result<Json<Listing<Record<post::Model>>>, RepositoryError> {
//!     let posts = Repository::<post::Entity>::new(db).with_context(context).all(None).await?;
//!     Ok(Json(posts))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Errors raised while composing or executing repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A caller supplied something the repository cannot interpret.
    #[error("{0}")]
    InvalidArgument(String),

    /// `find` or `destroy` targeted a row that does not exist.
    #[error("{}", not_found_message(.resource, .id.as_deref()))]
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// A relation exists but its kind cannot be joined by the filter or sort engine.
    #[error("Relation type {kind} is not supported")]
    UnsupportedRelation { kind: String },

    /// A dotted path named a relation the model does not declare.
    #[error("Relation '{relation}' is not defined on '{model}'")]
    UnknownRelation { model: String, relation: String },

    /// The operation name is not part of the repository surface.
    #[error("Method '{0}' is not supported")]
    MethodNotSupported(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

fn not_found_message(resource: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{resource} with ID '{id}' not found"),
        None => format!("{resource} not found"),
    }
}

impl RepositoryError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn unsupported_relation(kind: impl Into<String>) -> Self {
        Self::UnsupportedRelation { kind: kind.into() }
    }

    pub fn unknown_relation(model: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnknownRelation {
            model: model.into(),
            relation: relation.into(),
        }
    }

    /// HTTP status used when the error leaves an Axum handler.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidArgument(_) | Self::UnknownRelation { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotSupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedRelation { .. } | Self::Database(_) | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to API clients.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) => "A database error occurred".to_string(),
            Self::Serialization(_) | Self::UnsupportedRelation { .. } => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database(err) => {
                tracing::error!(error = ?err, "Database error occurred");
            }
            Self::Serialization(err) => {
                tracing::error!(error = %err, "Failed to serialize repository result");
            }
            Self::UnsupportedRelation { kind } => {
                tracing::error!(kind = %kind, "Relation kind cannot be joined");
            }
            _ => {
                tracing::debug!(
                    error = %self,
                    status = %self.status_code(),
                    "Repository error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for RepositoryError {
    fn into_response(self) -> Response {
        self.log_internal();
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
