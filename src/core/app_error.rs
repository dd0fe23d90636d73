//! Error type shared by every handler and workflow.
//!
//! Handlers return `Result<impl IntoResponse, AppError>`. The HTTP status is
//! taken from [`ErrorKind::status`], never from the message text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::aliases::DieselError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// The entity is already in a state that forbids the action.
    #[error("{0}")]
    InvalidState(String),

    /// A committed write did not read back as expected.
    #[error("{0}")]
    InconsistentState(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Storage(#[source] DieselError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    InvalidState,
    InconsistentState,
    Unauthorized,
    Forbidden,
    Storage,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::InvalidState => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InconsistentState | Self::Storage | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the message may be shown to the caller as-is.
    fn is_public(&self) -> bool {
        !matches!(self, Self::Storage | Self::Internal)
    }
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InconsistentState(_) => ErrorKind::InconsistentState,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Other(err) => match err.downcast_ref::<AppError>() {
                Some(inner) => inner.kind(),
                None => ErrorKind::Internal,
            },
        }
    }

    /// Message of the innermost `AppError`, skipping `anyhow` context layers.
    fn public_message(&self) -> String {
        match self {
            Self::Other(err) => match err.downcast_ref::<AppError>() {
                Some(inner) => inner.public_message(),
                None => err.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound("record".into()),
            other => AppError::Storage(other),
        }
    }
}

/// Body sent for every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let error = if kind.is_public() {
            self.public_message()
        } else {
            tracing::error!(error = ?self, "request failed");
            "internal server error".to_string()
        };

        (kind.status(), Json(ErrorBody { error, kind })).into_response()
    }
}

/// Success envelope used by every handler.
#[derive(Serialize, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn kinds_map_to_statuses() {
        let table = [
            (AppError::not_found("Order"), StatusCode::NOT_FOUND),
            (AppError::bad_request("bad"), StatusCode::BAD_REQUEST),
            (AppError::invalid_state("done"), StatusCode::CONFLICT),
            (
                AppError::InconsistentState("drift".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                AppError::Storage(DieselError::RollbackTransaction),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in table {
            assert_eq!(err.kind().status(), status, "{err}");
        }
    }

    #[test]
    fn diesel_not_found_becomes_not_found() {
        let err: AppError = DieselError::NotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn wrapped_app_error_keeps_its_kind() {
        let result: Result<(), AppError> = Err(AppError::invalid_state("already processed"));
        let err: AppError = result.context("Transfer failed").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.public_message(), "already processed");
    }

    #[test]
    fn message_mentions_the_missing_entity() {
        assert_eq!(AppError::not_found("Order").to_string(), "Order not found");
    }
}
