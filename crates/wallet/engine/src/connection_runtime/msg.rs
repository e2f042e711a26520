use alloy_primitives::{Address, U256};
use bon::Builder;
use dissolve_derive::Dissolve;
use multisig_wallet_domain::{
    call::{CallRequest, ViewCall},
    dashboard::WalletSnapshot,
};
use tokio::sync::oneshot;

use crate::{
    connection::ConnectionError,
    dispatch::{DispatchHandle, DispatchId},
};

pub enum ConnectionRuntimeMsg {
    Dispatch(Dispatch),
    GetDispatch(GetDispatch),
    FetchWallet(FetchWallet),
    CallView(CallView),
    Shutdown,
}

#[derive(Debug, Builder, Dissolve)]
pub struct Dispatch {
    request: CallRequest,
    sender: oneshot::Sender<DispatchHandle>,
}

#[derive(Debug, Builder, Dissolve)]
pub struct GetDispatch {
    id: DispatchId,
    sender: oneshot::Sender<Option<DispatchHandle>>,
}

#[derive(Debug, Builder, Dissolve)]
pub struct FetchWallet {
    address: Address,
    sender: oneshot::Sender<Result<Option<WalletSnapshot>, ConnectionError>>,
}

#[derive(Debug, Builder, Dissolve)]
pub struct CallView {
    target: Address,
    call: ViewCall,
    sender: oneshot::Sender<Result<U256, ConnectionError>>,
}
