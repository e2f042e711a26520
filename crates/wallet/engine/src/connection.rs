//! The wallet connection capability.
//!
//! A [`Connection`] stands for whatever signs and relays calls on behalf of the connected
//! account: a browser wallet, a remote signer, or the [`SimulatedConnection`] used for
//! development. The engine only observes what the connection reports.

mod simulated;

pub use self::simulated::{SimulatedConnection, SimulatedConnectionConfig};

use std::borrow::Cow;

use alloy_primitives::{Address, TxHash, U256};
use bon::Builder;
use dissolve_derive::Dissolve;
use multisig_wallet_domain::{
    call::{CallRequest, ViewCall, WalletCreated},
    dashboard::WalletSnapshot,
};

/// An injected wallet connection.
pub trait Connection: Send + Sync + 'static {
    /// Returns the connected account.
    fn account(&self) -> Address;

    /// Returns the chain the connection is on.
    fn chain_id(&self) -> u64;

    /// Asks the connected account to sign and broadcast `request`.
    ///
    /// Resolves to the transaction hash once the call has been broadcast.
    fn send_call(
        &self,
        request: CallRequest,
    ) -> impl Future<Output = Result<TxHash, ConnectionError>> + Send;

    /// Waits until the transaction `tx_hash` is included and returns its receipt.
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TxReceipt, ConnectionError>> + Send;

    /// Evaluates the read-only `call` against the contract at `target`.
    fn call_view(
        &self,
        target: Address,
        call: ViewCall,
    ) -> impl Future<Output = Result<U256, ConnectionError>> + Send;

    /// Reads what the dashboard shows about the wallet at `address`.
    ///
    /// Resolves to `None` when there is no wallet at `address`.
    fn fetch_wallet(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<Option<WalletSnapshot>, ConnectionError>> + Send;
}

/// Errors reported by a [`Connection`].
///
/// The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The account declined to sign.
    #[error("{0}")]
    Rejected(Cow<'static, str>),

    /// The transaction was included but reverted.
    #[error("{0}")]
    Reverted(Cow<'static, str>),

    /// The connection could not reach the chain.
    #[error("{0}")]
    Transport(Cow<'static, str>),
}

impl ConnectionError {
    /// Creates a [`ConnectionError::Rejected`] error.
    pub fn rejected<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Rejected(err.into())
    }

    /// Creates a [`ConnectionError::Reverted`] error.
    pub fn reverted<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Reverted(err.into())
    }

    /// Creates a [`ConnectionError::Transport`] error.
    pub fn transport<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Transport(err.into())
    }
}

/// The receipt of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct TxReceipt {
    tx_hash: TxHash,
    block_number: u64,
    sender: Address,
    to: Address,
    /// Set when the transaction deployed a wallet through the factory.
    wallet_created: Option<WalletCreated>,
}

impl TxReceipt {
    /// Returns the transaction hash.
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Returns the block the transaction was included in.
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Returns the sender.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Returns the contract that received the call.
    pub fn to(&self) -> Address {
        self.to
    }

    /// Returns the wallet creation event, if the transaction emitted one.
    pub fn wallet_created(&self) -> Option<&WalletCreated> {
        self.wallet_created.as_ref()
    }
}
