//! Dispatch engine relaying validated intent to the chain through an injected [`Connection`].

mod connection_runtime;
mod error;

pub mod connection;
pub mod dispatch;

pub use self::{
    connection::{Connection, ConnectionError, TxReceipt},
    connection_runtime::ConnectionRuntimeError,
    dispatch::{DISPATCH_RETENTION, DispatchHandle, DispatchId, DispatchStatus, NAVIGATION_DELAY},
    error::DispatchEngineError,
};

use core::time::Duration;

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use multisig_wallet_domain::{
    call::{CallRequest, ViewCall},
    dashboard::WalletSnapshot,
};
use tokio::{
    sync::{
        mpsc::{self, error::SendError},
        oneshot,
    },
    task::JoinHandle,
};

use self::{
    connection_runtime::msg::{CallView, ConnectionRuntimeMsg, Dispatch, FetchWallet, GetDispatch},
    error::DispatchEngineErrorKind,
};

/// Relays contract calls to a [`Connection`] and tracks their lifecycle.
///
/// The engine is either [`Stopped`] or [`Started`]; calls can only be dispatched once the
/// connection runtime has been started.
///
/// Handles of settled dispatches stay available through [`DispatchEngine::dispatch_handle`]
/// for the dispatch retention window, [`DISPATCH_RETENTION`] unless configured otherwise.
pub struct DispatchEngine<C, R> {
    connection: Arc<C>,
    dispatch_retention: Duration,
    runtime: R,
}

/// The connection runtime is not running.
pub struct Stopped;

/// The connection runtime is running.
pub struct Started {
    sender: mpsc::UnboundedSender<ConnectionRuntimeMsg>,
    handle: JoinHandle<Result<(), ConnectionRuntimeError>>,
}

impl<C, R> DispatchEngine<C, R>
where
    C: Connection,
{
    /// Returns the connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Returns the connected account.
    pub fn account(&self) -> Address {
        self.connection.account()
    }

    /// Returns the chain the connection is on.
    pub fn chain_id(&self) -> u64 {
        self.connection.chain_id()
    }
}

impl<C> DispatchEngine<C, Stopped>
where
    C: Connection,
{
    /// Creates an engine over `connection`.
    pub fn new(connection: C) -> Self {
        Self {
            connection: Arc::new(connection),
            dispatch_retention: DISPATCH_RETENTION,
            runtime: Stopped,
        }
    }

    /// Sets how long the handle of a settled dispatch can still be looked up.
    pub fn with_dispatch_retention(self, dispatch_retention: Duration) -> Self {
        Self { dispatch_retention, ..self }
    }

    /// Starts the connection runtime on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn start_connection_runtime(self) -> DispatchEngine<C, Started> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let handle = connection_runtime::spawn_new(
            Arc::clone(&self.connection),
            self.dispatch_retention,
            receiver,
        );

        DispatchEngine {
            connection: self.connection,
            dispatch_retention: self.dispatch_retention,
            runtime: Started { sender, handle },
        }
    }
}

impl<C> DispatchEngine<C, Started>
where
    C: Connection,
{
    /// Dispatches `request` and returns a handle on its lifecycle.
    ///
    /// The returned handle starts out [`DispatchStatus::Idle`] or later; the call is driven
    /// in the background and keeps going if the handle is dropped.
    #[tracing::instrument(skip_all, fields(call = request.call().function_name(), target = %request.target()))]
    pub async fn dispatch(&self, request: CallRequest) -> Result<DispatchHandle, DispatchEngineError> {
        let (msg, receiver) = {
            let (sender, receiver) = oneshot::channel();

            let msg = Dispatch::builder().request(request).sender(sender).build();

            (ConnectionRuntimeMsg::Dispatch(msg), receiver)
        };

        self.send_to_connection_runtime(msg)
            .map_err(|_| DispatchEngineErrorKind::mpsc_sender("failed to send dispatch"))?;

        let handle = receiver.await.map_err(DispatchEngineErrorKind::from)?;

        tracing::info!(id = %handle.id(), "call dispatched");

        Ok(handle)
    }

    /// Returns the handle of a previous dispatch.
    ///
    /// Handles are dropped once their dispatch has been settled for longer than the dispatch
    /// retention window.
    pub async fn dispatch_handle(&self, id: DispatchId) -> Result<DispatchHandle, DispatchEngineError> {
        let (msg, receiver) = {
            let (sender, receiver) = oneshot::channel();

            let msg = GetDispatch::builder().id(id).sender(sender).build();

            (ConnectionRuntimeMsg::GetDispatch(msg), receiver)
        };

        self.send_to_connection_runtime(msg)
            .map_err(|_| DispatchEngineErrorKind::mpsc_sender("failed to send get dispatch"))?;

        receiver
            .await
            .map_err(DispatchEngineErrorKind::from)?
            .ok_or_else(|| DispatchEngineErrorKind::not_found(format!("dispatch {id} not found")))
            .map_err(From::from)
    }

    /// Reads what the dashboard shows about the wallet at `address`.
    pub async fn wallet_snapshot(&self, address: Address) -> Result<WalletSnapshot, DispatchEngineError> {
        let (msg, receiver) = {
            let (sender, receiver) = oneshot::channel();

            let msg = FetchWallet::builder().address(address).sender(sender).build();

            (ConnectionRuntimeMsg::FetchWallet(msg), receiver)
        };

        self.send_to_connection_runtime(msg)
            .map_err(|_| DispatchEngineErrorKind::mpsc_sender("failed to send fetch wallet"))?;

        receiver
            .await
            .map_err(DispatchEngineErrorKind::from)?
            .map_err(DispatchEngineErrorKind::from)?
            .ok_or_else(|| DispatchEngineErrorKind::not_found(format!("wallet {address} not found")))
            .map_err(From::from)
    }

    /// Evaluates the read-only `call` against the contract at `target`.
    #[tracing::instrument(skip_all, fields(%target, call = call.function_name()))]
    pub async fn call_view(
        &self,
        target: Address,
        call: ViewCall,
    ) -> Result<U256, DispatchEngineError> {
        let (msg, receiver) = {
            let (sender, receiver) = oneshot::channel();

            let msg = CallView::builder().target(target).call(call).sender(sender).build();

            (ConnectionRuntimeMsg::CallView(msg), receiver)
        };

        self.send_to_connection_runtime(msg)
            .map_err(|_| DispatchEngineErrorKind::mpsc_sender("failed to send view call"))?;

        receiver
            .await
            .map_err(DispatchEngineErrorKind::from)?
            .map_err(DispatchEngineErrorKind::from)
            .map_err(From::from)
    }

    /// Stops the connection runtime once every in-flight dispatch has settled.
    pub async fn stop_connection_runtime(self) -> Result<DispatchEngine<C, Stopped>, DispatchEngineError> {
        self.send_to_connection_runtime(ConnectionRuntimeMsg::Shutdown)
            .map_err(|_| DispatchEngineErrorKind::mpsc_sender("failed to send shutdown msg"))?;

        self.runtime
            .handle
            .await
            .map_err(|_| DispatchEngineErrorKind::other("connection runtime task misbehavior"))?
            .map_err(DispatchEngineErrorKind::from)?;

        Ok(DispatchEngine {
            connection: self.connection,
            dispatch_retention: self.dispatch_retention,
            runtime: Stopped,
        })
    }

    #[allow(clippy::result_large_err)]
    fn send_to_connection_runtime(
        &self,
        msg: ConnectionRuntimeMsg,
    ) -> Result<(), SendError<ConnectionRuntimeMsg>> {
        self.runtime.sender.send(msg)
    }
}
