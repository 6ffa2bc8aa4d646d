use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError};
use serde::Serialize;

/// 统一错误响应体 `{"success": false, "message": ...}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match &error {
            DomainError::InvalidArgument { .. }
            | DomainError::InvalidTransition { .. }
            | DomainError::BusinessRuleViolation { .. } => ApiError::unprocessable(error.to_string()),
            DomainError::NotFound { .. } => ApiError::not_found(error.to_string()),
            DomainError::AlreadyExists { .. } => {
                ApiError::new(StatusCode::CONFLICT, error.to_string())
            }
            DomainError::PermissionDenied { .. } => ApiError::forbidden(error.to_string()),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::Domain(err) => err.into(),
            AppErr::Repository(RepositoryError::NotFound) => {
                ApiError::not_found("requested resource not found")
            }
            AppErr::Repository(RepositoryError::Conflict) => {
                ApiError::new(StatusCode::CONFLICT, "resource already exists")
            }
            AppErr::Repository(RepositoryError::Stale) => ApiError::new(
                StatusCode::CONFLICT,
                "resource was modified by another request, please retry",
            ),
            AppErr::Repository(RepositoryError::Storage { message }) => {
                tracing::error!(error = %message, "存储层错误");
                ApiError::internal_server_error()
            }
            AppErr::Password(err) => {
                tracing::error!(error = %err, "密码哈希错误");
                ApiError::internal_server_error()
            }
            AppErr::Broadcast(err) => {
                tracing::error!(error = %err, "推送错误");
                ApiError::internal_server_error()
            }
            AppErr::Infrastructure(message) => {
                tracing::error!(error = %message, "基础设施错误");
                ApiError::internal_server_error()
            }
            AppErr::Authentication => ApiError::unauthorized("Invalid credentials"),
            AppErr::Authorization => {
                ApiError::forbidden(crate::middleware::INSUFFICIENT_PERMISSIONS)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
