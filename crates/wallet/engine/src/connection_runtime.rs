//! Connection runtime driving dispatched calls.
//!
//! The runtime is a single task that owns the message intake. Every dispatched call is
//! driven to completion in its own task and publishes its [`DispatchStatus`] on a watch
//! channel, so callers observe the lifecycle without polling the runtime.
//!
//! ```text
//!  DispatchEngine                       Runtime task
//! ┌───────────────────────┐            ┌───────────────────────────────┐
//! │ mpsc::UnboundedSender ┼────────────┼──> mpsc::UnboundedReceiver    │
//! │ oneshot::Receiver <───┼────────────┼─── oneshot::Sender            │
//! └───────────────────────┘            │        │ spawn                │
//!                                      │        v                      │
//!  DispatchHandle                      │  dispatch task (JoinSet)      │
//! ┌───────────────────────┐            │   Connection::send_call       │
//! │ watch::Receiver <─────┼────────────┼── Connection::wait_for_receipt│
//! └───────────────────────┘            └───────────────────────────────┘
//! ```
//!
//! Settled dispatches are forgotten once they are older than the retention window. The check
//! runs whenever a message is taken in, since only messages add dispatches.
//!
//! On [`ConnectionRuntimeMsg::Shutdown`] the runtime stops taking messages and waits for
//! every in-flight task. Dispatched transactions are never cancelled.

pub mod msg;

mod error;

pub use self::error::ConnectionRuntimeError;

use core::time::Duration;

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use multisig_wallet_domain::call::CallRequest;
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
    time::Instant,
};

use self::{
    error::Result,
    msg::{
        CallView, CallViewDissolved, ConnectionRuntimeMsg, Dispatch, DispatchDissolved, FetchWallet,
        FetchWalletDissolved, GetDispatch, GetDispatchDissolved,
    },
};
use crate::{
    connection::Connection,
    dispatch::{DispatchHandle, DispatchId, DispatchStatus},
};

/// Spawns a new connection runtime task on the current tokio runtime.
///
/// The task runs until a [`ConnectionRuntimeMsg::Shutdown`] message is received or the
/// message channel is closed.
///
/// # Panics
///
/// Panics when called outside of a tokio runtime.
pub fn spawn_new<C>(
    connection: Arc<C>,
    dispatch_retention: Duration,
    msg_receiver: mpsc::UnboundedReceiver<ConnectionRuntimeMsg>,
) -> JoinHandle<Result<()>>
where
    C: Connection,
{
    tokio::spawn(run_connection_runtime(connection, dispatch_retention, msg_receiver))
}

/// A task of the runtime, reporting the dispatch it settled if any.
type TaskOutput = Option<(DispatchId, Instant)>;

/// Dispatch handles, with the settled ones queued in the order they settled.
#[derive(Default)]
struct Dispatches {
    handles: HashMap<DispatchId, DispatchHandle>,
    settled: VecDeque<(Instant, DispatchId)>,
}

impl Dispatches {
    fn settle(&mut self, id: DispatchId, settled_at: Instant) {
        let at = self.settled.partition_point(|(at, _)| *at <= settled_at);
        self.settled.insert(at, (settled_at, id));
    }

    fn forget_older_than(&mut self, retention: Duration) {
        let now = Instant::now();

        while let Some(&(settled_at, id)) = self.settled.front() {
            if now.duration_since(settled_at) < retention {
                break;
            }

            self.settled.pop_front();
            self.handles.remove(&id);

            tracing::debug!(%id, "settled dispatch forgotten");
        }
    }
}

#[tracing::instrument(skip_all, fields(account = %connection.account(), chain_id = connection.chain_id()))]
async fn run_connection_runtime<C>(
    connection: Arc<C>,
    dispatch_retention: Duration,
    mut msg_receiver: mpsc::UnboundedReceiver<ConnectionRuntimeMsg>,
) -> Result<()>
where
    C: Connection,
{
    let mut dispatches = Dispatches::default();
    let mut tasks = JoinSet::new();

    while let Some(msg) = msg_receiver.recv().await {
        while let Some(joined) = tasks.try_join_next() {
            match joined {
                Ok(Some((id, settled_at))) => dispatches.settle(id, settled_at),
                Ok(None) => {},
                Err(e) => tracing::error!("connection task failed: {e}"),
            }
        }

        dispatches.forget_older_than(dispatch_retention);

        match msg {
            ConnectionRuntimeMsg::Shutdown => {
                tracing::info!("received shutdown msg, stopping connection runtime");
                break;
            },
            ConnectionRuntimeMsg::Dispatch(msg) => {
                handle_dispatch(&connection, &mut dispatches, &mut tasks, msg);
            },
            ConnectionRuntimeMsg::GetDispatch(msg) => {
                handle_get_dispatch(&dispatches, msg);
            },
            ConnectionRuntimeMsg::FetchWallet(msg) => {
                handle_fetch_wallet(&connection, &mut tasks, msg);
            },
            ConnectionRuntimeMsg::CallView(msg) => {
                handle_call_view(&connection, &mut tasks, msg);
            },
        }
    }

    tracing::info!(in_flight = tasks.len(), "waiting for in-flight connection tasks");

    let mut failure = None;

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("connection task failed: {e}");
            failure.get_or_insert(e);
        }
    }

    tracing::info!("shutting down connection runtime");

    failure.map_or(Ok(()), |e| Err(e.into()))
}

fn handle_dispatch<C>(
    connection: &Arc<C>,
    dispatches: &mut Dispatches,
    tasks: &mut JoinSet<TaskOutput>,
    msg: Dispatch,
) where
    C: Connection,
{
    let DispatchDissolved { request, sender } = msg.dissolve();

    let id = DispatchId::new();
    let (status_sender, status_receiver) = watch::channel(DispatchStatus::Idle);
    let handle = DispatchHandle::new(id, request.call().function_name(), status_receiver);

    dispatches.handles.insert(id, handle.clone());
    tasks.spawn(drive_dispatch(Arc::clone(connection), id, request, status_sender));

    let _ = sender
        .send(handle)
        .inspect_err(|_| tracing::error!("oneshot sender failed to send dispatch handle"));
}

fn handle_get_dispatch(dispatches: &Dispatches, msg: GetDispatch) {
    let GetDispatchDissolved { id, sender } = msg.dissolve();

    let _ = sender
        .send(dispatches.handles.get(&id).cloned())
        .inspect_err(|_| tracing::error!("oneshot sender failed to send dispatch handle"));
}

fn handle_fetch_wallet<C>(connection: &Arc<C>, tasks: &mut JoinSet<TaskOutput>, msg: FetchWallet)
where
    C: Connection,
{
    let FetchWalletDissolved { address, sender } = msg.dissolve();
    let connection = Arc::clone(connection);

    tasks.spawn(async move {
        let snapshot = connection.fetch_wallet(address).await;

        let _ = sender
            .send(snapshot)
            .inspect_err(|_| tracing::error!("oneshot sender failed to send wallet snapshot"));

        None
    });
}

fn handle_call_view<C>(connection: &Arc<C>, tasks: &mut JoinSet<TaskOutput>, msg: CallView)
where
    C: Connection,
{
    let CallViewDissolved { target, call, sender } = msg.dissolve();
    let connection = Arc::clone(connection);

    tasks.spawn(async move {
        let value = connection.call_view(target, call).await;

        let _ = sender
            .send(value)
            .inspect_err(|_| tracing::error!("oneshot sender failed to send view call result"));

        None
    });
}

#[tracing::instrument(skip_all, fields(%id, call = request.call().function_name()))]
async fn drive_dispatch<C>(
    connection: Arc<C>,
    id: DispatchId,
    request: CallRequest,
    status: watch::Sender<DispatchStatus>,
) -> TaskOutput
where
    C: Connection,
{
    status.send_replace(DispatchStatus::Pending);

    let tx_hash = match connection.send_call(request).await {
        Ok(tx_hash) => tx_hash,
        Err(e) => {
            tracing::warn!("call was not broadcast: {e}");
            status.send_replace(DispatchStatus::Failed { tx_hash: None, message: e.to_string() });
            return Some((id, Instant::now()));
        },
    };

    tracing::info!(%tx_hash, "call broadcast, awaiting confirmation");
    status.send_replace(DispatchStatus::Confirming { tx_hash });

    let settled = match connection.wait_for_receipt(tx_hash).await {
        Ok(receipt) => {
            tracing::info!(block_number = receipt.block_number(), "call confirmed");
            DispatchStatus::Confirmed { receipt }
        },
        Err(e) => {
            tracing::warn!("call failed after broadcast: {e}");
            DispatchStatus::Failed { tx_hash: Some(tx_hash), message: e.to_string() }
        },
    };

    status.send_replace(settled);

    Some((id, Instant::now()))
}
