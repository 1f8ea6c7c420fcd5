//! Service and HTTP errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dbank_ledger::LedgerError;
use dbank_persistence::PersistenceError;
use dbank_transfer::{ErrorCode, TransferError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the account and reconciliation services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Failed to {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: PersistenceError,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl ServiceError {
    pub(crate) fn persistence(operation: &'static str) -> impl FnOnce(PersistenceError) -> Self {
        move |source| ServiceError::Persistence { operation, source }
    }

    /// RPC status code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Transfer(e) => e.code(),
            ServiceError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ServiceError::Persistence { source, .. } => match source {
                PersistenceError::NotFound { .. } => ErrorCode::NotFound,
                PersistenceError::AlreadyExists { .. } => ErrorCode::InvalidArgument,
                _ => ErrorCode::Internal,
            },
            ServiceError::Ledger(_) => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

/// Error returned from HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ServiceError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}
