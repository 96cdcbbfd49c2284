//! # Error Handling
//!
//! Domain errors raised by the registries and runners, and the problem+json
//! response they map to at the HTTP edge.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry;

/// Errors produced by DataFlow operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Caller supplied input that violates a registry invariant.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<&'static str>,
    },

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A platform stored procedure failed; the message is its own text.
    #[error("{message}")]
    RemoteProcedure { procedure: String, message: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn remote(procedure: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteProcedure {
            procedure: procedure.into(),
            message: message.into(),
        }
    }

    /// True when the error came from caller input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Request trace ID, or a short correlation ID outside a request scope
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    db_error
        .code()
        .map(|code| code.as_ref() == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code.as_ref()))
        .unwrap_or(false)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message, field } => {
                let api = Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message);
                match field {
                    Some(field) => api.with_details(json!({ field: message })),
                    None => api,
                }
            }
            DomainError::NotFound { entity, id } => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("{} {} not found", entity, id),
            )
            .with_details(json!({ "entity": entity, "id": id })),
            DomainError::RemoteProcedure { procedure, message } => {
                tracing::warn!(procedure = %procedure, error = %message, "Remote procedure failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "REMOTE_PROCEDURE_FAILED",
                    &message,
                )
                .with_details(json!({ "procedure": procedure }))
            }
            DomainError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            other => {
                tracing::error!("Database error: {:?}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let api: ApiError = DomainError::invalid_field("job_name", "job_name is required").into();

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(api.message, Box::from("job_name is required"));
        assert_eq!(
            api.details,
            Some(Box::new(json!({"job_name": "job_name is required"})))
        );
    }

    #[test]
    fn test_not_found_carries_entity() {
        let id = uuid::Uuid::new_v4();
        let api: ApiError = DomainError::not_found("transformation job", id).into();

        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.code, Box::from("NOT_FOUND"));
        assert!(api.message.contains(&id.to_string()));
    }

    #[test]
    fn test_remote_procedure_keeps_message_verbatim() {
        let error = DomainError::remote("profile_table", "relation \"x\" does not exist");
        assert_eq!(error.to_string(), "relation \"x\" does not exist");

        let api: ApiError = error.into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.code, Box::from("REMOTE_PROCEDURE_FAILED"));
        assert_eq!(api.message, Box::from("relation \"x\" does not exist"));
    }

    #[test]
    fn test_database_errors() {
        let api: ApiError = DomainError::from(sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "refused".to_string(),
        )))
        .into();
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);

        let api: ApiError = sea_orm::DbErr::RecordNotFound("job".to_string()).into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.message.contains("job"));

        let api: ApiError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, Box::from("Database error occurred"));
    }

    #[test]
    fn test_from_anyhow() {
        let api: ApiError = anyhow::anyhow!("Something went wrong").into();

        assert_eq!(api.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert_eq!(api.message, Box::from("An internal error occurred"));
    }

    #[test]
    fn test_problem_json_content_type() {
        let response = validation_error("Validation failed", json!({"name": "required"}))
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_trace_id_fallback_format() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[tokio::test]
    async fn test_trace_id_from_request_scope() {
        let context = telemetry::TraceContext {
            trace_id: "req-123".to_string(),
        };
        let error = telemetry::with_trace_context(context, async {
            ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "bad")
        })
        .await;

        assert_eq!(error.trace_id, Some(Box::from("req-123")));
    }
}
