//! Test utilities for the multisig wallet crates.
//!
//! This crate provides address fixtures, a ready-to-use wallet creation request and a
//! scriptable [`MockConnection`] whose signing and inclusion steps can be held back, so tests
//! can observe every status a dispatch goes through.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use alloy_primitives::{Address, TxHash, U256, address};
use multisig_wallet_domain::{
    call::{CallRequest, ContractCall, ViewCall, WalletCreated},
    dashboard::WalletSnapshot,
    request::WalletCreationRequest,
};
use multisig_wallet_engine::{Connection, ConnectionError, TxReceipt};
use tokio::sync::Semaphore;

// FIXTURES
// ================================================================================================

/// The account every mock connection signs with.
pub const ALICE: Address = address!("0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");

/// A second owner.
pub const BOB: Address = address!("0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");

/// A third owner.
pub const CAROL: Address = address!("0xc4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4c4");

/// The chain id reported by mock connections.
pub const MOCK_CHAIN_ID: u64 = 31337;

/// Returns the textual form of `address` as typed by a user, lowercase.
pub fn address_text(address: &Address) -> String {
    format!("{address:#x}")
}

/// Returns a random address.
pub fn random_address() -> Address {
    Address::from(rand::random::<[u8; 20]>())
}

/// Returns a valid request for a 3-owner "Treasury" wallet with thresholds `2 / 2 / 3`.
pub fn treasury_request() -> WalletCreationRequest {
    WalletCreationRequest::builder()
        .owners(vec![ALICE, BOB, CAROL])
        .minimum_threshold(2)
        .initial_approvals(2)
        .initial_votes(3)
        .name("Treasury")
        .build()
        .expect("treasury request is valid")
}

// MOCK CONNECTION
// ================================================================================================

/// A scriptable [`Connection`].
///
/// A gated connection holds every signature and every inclusion until the test releases it
/// with [`release_send`](Self::release_send) and [`release_receipt`](Self::release_receipt).
/// Failures are scripted with [`fail_next_send`](Self::fail_next_send) and
/// [`fail_next_receipt`](Self::fail_next_receipt).
#[derive(Debug)]
pub struct MockConnection {
    gated: bool,
    send_gate: Semaphore,
    receipt_gate: Semaphore,
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    block_number: u64,
    calls: Vec<CallRequest>,
    sent: HashMap<TxHash, CallRequest>,
    send_failure: Option<ConnectionError>,
    receipt_failure: Option<ConnectionError>,
    deploy_at: Option<Address>,
    wallets: HashMap<Address, WalletSnapshot>,
    numbers: HashMap<Address, U256>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnection {
    /// Creates a connection that signs and includes every call immediately.
    pub fn new() -> Self {
        Self {
            gated: false,
            send_gate: Semaphore::new(0),
            receipt_gate: Semaphore::new(0),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Creates a connection that waits for the test before signing or including a call.
    pub fn gated() -> Self {
        Self { gated: true, ..Self::new() }
    }

    /// Lets one pending call be signed.
    pub fn release_send(&self) {
        self.send_gate.add_permits(1);
    }

    /// Lets one broadcast call be included.
    pub fn release_receipt(&self) {
        self.receipt_gate.add_permits(1);
    }

    /// Makes the next call fail to be signed.
    pub fn fail_next_send(&self, err: ConnectionError) {
        self.state().send_failure = Some(err);
    }

    /// Makes the next inclusion fail.
    pub fn fail_next_receipt(&self, err: ConnectionError) {
        self.state().receipt_failure = Some(err);
    }

    /// Deploys the next factory call's wallet at `address` instead of a random one.
    pub fn deploy_next_wallet_at(&self, address: Address) {
        self.state().deploy_at = Some(address);
    }

    /// Makes `snapshot` readable at its address.
    pub fn insert_wallet(&self, snapshot: WalletSnapshot) {
        self.state().wallets.insert(snapshot.address(), snapshot);
    }

    /// Returns every call received so far, in order.
    pub fn calls(&self) -> Vec<CallRequest> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock connection state poisoned")
    }

    async fn pass(&self, gate: &Semaphore) {
        if self.gated {
            gate.acquire().await.expect("mock connection gate closed").forget();
        }
    }
}

impl Connection for MockConnection {
    fn account(&self) -> Address {
        ALICE
    }

    fn chain_id(&self) -> u64 {
        MOCK_CHAIN_ID
    }

    async fn send_call(&self, request: CallRequest) -> Result<TxHash, ConnectionError> {
        self.state().calls.push(request.clone());

        self.pass(&self.send_gate).await;

        let mut state = self.state();

        if let Some(err) = state.send_failure.take() {
            return Err(err);
        }

        let tx_hash = TxHash::from(rand::random::<[u8; 32]>());
        state.sent.insert(tx_hash, request);

        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ConnectionError> {
        self.pass(&self.receipt_gate).await;

        let mut state = self.state();

        if let Some(err) = state.receipt_failure.take() {
            return Err(err);
        }

        let request = state
            .sent
            .remove(&tx_hash)
            .ok_or_else(|| ConnectionError::transport(format!("transaction {tx_hash} not found")))?;

        state.block_number += 1;

        if let ContractCall::SetNumber { number } = request.call() {
            state.numbers.insert(request.target(), *number);
        }

        let wallet_created = request.call().creates_wallet().then(|| {
            WalletCreated::builder()
                .initializer(ALICE)
                .wallet(state.deploy_at.take().unwrap_or_else(random_address))
                .handler(random_address())
                .build()
        });

        let receipt = TxReceipt::builder()
            .tx_hash(tx_hash)
            .block_number(state.block_number)
            .sender(ALICE)
            .to(request.target())
            .maybe_wallet_created(wallet_created)
            .build();

        Ok(receipt)
    }

    async fn call_view(&self, target: Address, call: ViewCall) -> Result<U256, ConnectionError> {
        match call {
            ViewCall::GetNumber => Ok(self.state().numbers.get(&target).copied().unwrap_or_default()),
        }
    }

    async fn fetch_wallet(&self, address: Address) -> Result<Option<WalletSnapshot>, ConnectionError> {
        Ok(self.state().wallets.get(&address).cloned())
    }
}
