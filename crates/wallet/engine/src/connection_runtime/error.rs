pub type Result<T, E = ConnectionRuntimeError> = core::result::Result<T, E>;

/// Errors that can occur in the connection runtime.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionRuntimeError {
    /// A dispatch or read task panicked.
    ///
    /// The runtime still waits for every other in-flight task before reporting it.
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
