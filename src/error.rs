use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy surfaced by the API handlers. Every variant maps to one
/// HTTP status; server-side variants are logged and return a generic body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    ResourceUnavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        ApiError::PermissionDenied(msg.into())
    }
}

/// Maps a storage-level duplicate-key violation to Conflict. The UNIQUE
/// constraints on pair tables are the last line of defense against
/// concurrent double-adds that slip past the handler pre-checks.
pub fn conflict_on_duplicate(err: sea_orm::DbErr, msg: &str) -> ApiError {
    let text = err.to_string();
    if text.contains("Duplicate") || text.contains("unique") {
        ApiError::Conflict(msg.to_string())
    } else {
        ApiError::Database(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::ResourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Database(e) => {
                log::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            ApiError::Internal(e) => {
                log::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(
            ApiError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::permission_denied("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::ResourceUnavailable("font".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn duplicate_key_becomes_conflict() {
        let err = sea_orm::DbErr::Custom(
            "Duplicate entry '1-2' for key 'unique_user_recipe'".to_string(),
        );
        match conflict_on_duplicate(err, "already added") {
            ApiError::Conflict(msg) => assert_eq!(msg, "already added"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn other_db_errors_pass_through() {
        let err = sea_orm::DbErr::Custom("connection reset".to_string());
        assert!(matches!(
            conflict_on_duplicate(err, "already added"),
            ApiError::Database(_)
        ));
    }
}
