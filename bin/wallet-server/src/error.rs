use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use multisig_wallet_domain::{
    address::AddressError,
    owners::OwnerError,
    screen::{ScreenKind, TransitionError},
    tx::TxValidationErrors,
};
use multisig_wallet_engine::DispatchEngineError;

use crate::payload::{FieldErrorPayload, response::ErrorResponsePayload};

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppError {
    #[error("dispatch engine error: {0}")]
    DispatchEngine(Box<DispatchEngineError>),

    #[error("{0}")]
    InvalidAddress(#[from] AddressError),

    #[error("{0}")]
    InvalidOwners(#[from] OwnerError),

    #[error("invalid transaction request: {0}")]
    InvalidTransactionRequest(TxValidationErrors),

    #[error("invalid transaction kind: {0:?}")]
    InvalidTxKind(String),

    #[error("invalid transaction tab: {0:?}")]
    InvalidTxTab(String),

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("{0}")]
    InvalidTransition(TransitionError),

    #[error("wallet form cannot be edited on screen `{0}`")]
    FormLocked(ScreenKind),

    #[error("session not found error")]
    SessionNotFound,

    #[error("wallet not found error")]
    WalletNotFound,

    #[error("dispatch not found error")]
    DispatchNotFound,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidAddress(_)
            | AppError::InvalidOwners(_)
            | AppError::InvalidTransactionRequest(_)
            | AppError::InvalidTxKind(_)
            | AppError::InvalidTxTab(_)
            | AppError::InvalidNumber(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition(TransitionError::InvalidTransition { .. })
            | AppError::FormLocked(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound | AppError::WalletNotFound | AppError::DispatchNotFound => {
                StatusCode::NOT_FOUND
            },
            AppError::DispatchEngine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Vec<FieldErrorPayload> {
        match self {
            AppError::InvalidTransition(TransitionError::InvalidForm(errors)) => {
                FieldErrorPayload::from_errors(errors)
            },
            AppError::InvalidTransactionRequest(errors) => FieldErrorPayload::from_errors(errors),
            _ => Vec::new(),
        }
    }
}

impl From<DispatchEngineError> for AppError {
    fn from(err: DispatchEngineError) -> Self {
        Self::DispatchEngine(err.into())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidAddress(err) => Self::InvalidAddress(err),
            err => Self::InvalidTransition(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();

        if code.is_server_error() {
            tracing::error!("server error: {self}");
        } else if code == StatusCode::NOT_FOUND {
            tracing::info!("not found: {self}");
        } else {
            tracing::warn!("client error: {self}");
        }

        let body = ErrorResponsePayload::builder()
            .error(self.to_string())
            .fields(self.field_errors())
            .build();

        (code, Json(body)).into_response()
    }
}
