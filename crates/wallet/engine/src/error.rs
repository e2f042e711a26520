use std::borrow::Cow;

use tokio::sync::oneshot;

use crate::{connection::ConnectionError, connection_runtime::ConnectionRuntimeError};

/// Errors returned by the [`DispatchEngine`](crate::DispatchEngine).
#[derive(Debug, thiserror::Error)]
#[error("dispatch engine error: {0}")]
pub struct DispatchEngineError(#[from] DispatchEngineErrorKind);

impl DispatchEngineError {
    /// Returns `true` when the requested dispatch or wallet does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.0, DispatchEngineErrorKind::NotFound(_))
    }

    /// Returns the connection error, when the connection itself failed.
    pub fn connection_error(&self) -> Option<&ConnectionError> {
        match &self.0 {
            DispatchEngineErrorKind::Connection(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum DispatchEngineErrorKind {
    #[error("connection runtime error: {0}")]
    ConnectionRuntime(#[from] ConnectionRuntimeError),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("mpsc sender error: {0}")]
    MpscSender(Cow<'static, str>),

    #[error("oneshot receive error: {0}")]
    OneshotReceive(#[from] oneshot::error::RecvError),

    #[error("not found error: {0}")]
    NotFound(Cow<'static, str>),

    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl DispatchEngineErrorKind {
    pub fn mpsc_sender<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::MpscSender(err.into())
    }

    pub fn not_found<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotFound(err.into())
    }

    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}
