use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    /// 校验失败时的逐字段违规说明
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                details: Vec::new(),
            },
        }
    }

    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    fn with_details(mut self, details: Vec<String>) -> Self {
        self.body.details = details;
        self
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Validation(violations) => {
                ApiError::unprocessable("VALIDATION_FAILED", "validation failed")
                    .with_details(violations.messages())
            }
            ApplicationError::UnknownAuthor(name) => ApiError::unprocessable(
                "UNKNOWN_AUTHOR",
                format!("sender is not a registered participant: {name}"),
            ),
            ApplicationError::NameTaken(name) => ApiError::new(
                StatusCode::CONFLICT,
                "NAME_TAKEN",
                format!("participant already exists: {name}"),
            ),
            ApplicationError::ParticipantNotFound(name) => ApiError::not_found(
                "PARTICIPANT_NOT_FOUND",
                format!("participant not found: {name}"),
            ),
            ApplicationError::MessageNotFound => {
                ApiError::not_found("MESSAGE_NOT_FOUND", "message not found")
            }
            ApplicationError::NotMessageOwner => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "NOT_MESSAGE_OWNER",
                "only the author may modify a message",
            ),
            ApplicationError::Repository(err) => {
                tracing::error!(error = %err, "存储层失败");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "internal storage failure",
                )
            }
            ApplicationError::PartialFailure { operation, cause } => {
                // 前一步已提交，单独标记方便运维核对遗留记录
                tracing::error!(operation, error = %cause, "partial_failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PARTIAL_FAILURE",
                    "operation partially applied",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
