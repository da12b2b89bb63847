use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API error variants, each with a stable `kind` code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("user not found")]
    UserNotFound,
    #[error("issue not found")]
    IssueNotFound,
    #[error("issue type not found")]
    IssueTypeNotFound,
    #[error("role not found")]
    RoleNotFound,
    #[error("verification token not found")]
    TokenNotFound,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("unknown issue type")]
    UnknownIssueType,
    #[error("email already taken")]
    EmailTaken,
    #[error("username already taken")]
    UsernameTaken,
    #[error("issue type already exists")]
    IssueTypeAlreadyExists,
    #[error("role already exists")]
    RoleAlreadyExists,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("forbidden")]
    Forbidden,
    #[error("unknown issue status")]
    UnknownStatus,
    #[error("too many files")]
    TooManyFiles,
    #[error("file too large")]
    FileTooLarge,
    #[error("{0}")]
    Validation(String),
    #[error("mail service unavailable")]
    MailUnavailable,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::IssueTypeNotFound => "ISSUE_TYPE_NOT_FOUND",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::UnknownIssueType => "UNKNOWN_ISSUE_TYPE",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::IssueTypeAlreadyExists => "ISSUE_TYPE_ALREADY_EXISTS",
            Self::RoleAlreadyExists => "ROLE_ALREADY_EXISTS",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::Forbidden => "FORBIDDEN",
            Self::UnknownStatus => "UNKNOWN_STATUS",
            Self::TooManyFiles => "TOO_MANY_FILES",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::Validation(_) => "VALIDATION",
            Self::MailUnavailable => "MAIL_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound
            | Self::IssueNotFound
            | Self::IssueTypeNotFound
            | Self::RoleNotFound
            | Self::TokenNotFound => StatusCode::NOT_FOUND,
            Self::InvalidToken | Self::InvalidCredential | Self::UnknownIssueType => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailTaken
            | Self::UsernameTaken
            | Self::IssueTypeAlreadyExists
            | Self::RoleAlreadyExists => StatusCode::CONFLICT,
            Self::EmailNotVerified | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UnknownStatus | Self::TooManyFiles | Self::FileTooLarge | Self::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::MailUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are already recorded by the trace layer; only 500s carry a chain worth logging.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
