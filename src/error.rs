use sea_orm::DbErr;

/// Errors raised by repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    // Criteria errors
    #[error("Invalid criterion type: {0}")]
    InvalidCriterion(String),

    // Lookup errors
    #[error("{0} not found")]
    NotFound(String),

    // Persistence errors
    #[error("Failed to store {entity}: {reason}")]
    StoreFailed { entity: String, reason: String },

    #[error("Failed to update {entity}: {reason}")]
    UpdateFailed { entity: String, reason: String },

    // Construction errors
    #[error("Invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("Invalid attributes: {0}")]
    InvalidAttributes(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),
}

impl RepositoryError {
    pub fn store_failed(entity: impl Into<String>, err: DbErr) -> Self {
        RepositoryError::StoreFailed {
            entity: entity.into(),
            reason: err.to_string(),
        }
    }

    pub fn update_failed(entity: impl Into<String>, err: DbErr) -> Self {
        RepositoryError::UpdateFailed {
            entity: entity.into(),
            reason: err.to_string(),
        }
    }
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(resource) => RepositoryError::NotFound(resource),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

#[cfg(feature = "axum")]
mod response {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use serde::Serialize;

    use super::RepositoryError;

    /// JSON error response body
    #[derive(Serialize)]
    struct ErrorResponse {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    }

    impl IntoResponse for RepositoryError {
        fn into_response(self) -> Response {
            let (status, error_message, details) = match &self {
                // 400 Bad Request
                RepositoryError::InvalidCriterion(msg) => (
                    StatusCode::BAD_REQUEST,
                    "Invalid criterion",
                    Some(msg.clone()),
                ),
                RepositoryError::InvalidAttributes(msg) => (
                    StatusCode::BAD_REQUEST,
                    "Validation error",
                    Some(msg.clone()),
                ),

                // 404 Not Found
                RepositoryError::NotFound(resource) => {
                    (StatusCode::NOT_FOUND, "Not found", Some(resource.clone()))
                }

                // 500 Internal Server Error
                RepositoryError::StoreFailed { .. } | RepositoryError::UpdateFailed { .. } => {
                    tracing::error!("Persistence error: {}", self);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Persistence error", None)
                }
                RepositoryError::InvalidEntityType(msg) => {
                    tracing::error!("Invalid entity type: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error",
                        None,
                    )
                }
                RepositoryError::Database(msg) => {
                    tracing::error!("Database error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Database error", None)
                }
            };

            let body = Json(ErrorResponse {
                error: error_message.to_string(),
                details,
            });

            (status, body).into_response()
        }
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
