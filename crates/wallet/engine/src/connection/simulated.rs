use core::time::Duration;

use std::collections::HashMap;

use alloy_primitives::{Address, TxHash, U256};
use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use multisig_wallet_domain::{
    address::abbreviate_address,
    call::{
        CallRequest, CallRequestDissolved, ContractCall, CreateWalletCall, ViewCall, WalletCreated,
    },
    dashboard::{Approvals, TokenBalance, TxRecord, TxStatus, WalletSnapshot},
    tx::TransactionRequest,
};
use tokio::sync::Mutex;

use super::{Connection, ConnectionError, TxReceipt};

const REJECTED_MESSAGE: &str = "User rejected the request.";

/// Configuration of a [`SimulatedConnection`].
#[derive(Debug, Clone, Builder)]
pub struct SimulatedConnectionConfig {
    /// The account that signs every call.
    account: Address,

    /// The chain the connection pretends to be on.
    chain_id: u64,

    /// How long the account takes to sign a call.
    #[builder(default)]
    send_delay: Duration,

    /// How long a broadcast transaction takes to be included.
    #[builder(default)]
    confirmation_delay: Duration,

    /// When set, every call is declined as if the account refused to sign.
    #[builder(default)]
    reject_calls: bool,
}

/// An in-memory connection for development.
///
/// Calls are "signed" after `send_delay` and "included" after `confirmation_delay`. Factory
/// calls deploy a wallet at a random address, and wallets that were never deployed read as
/// placeholder data.
#[derive(Debug)]
pub struct SimulatedConnection {
    config: SimulatedConnectionConfig,
    chain: Mutex<SimulatedChain>,
}

#[derive(Debug, Default)]
struct SimulatedChain {
    block_number: u64,
    pending: HashMap<TxHash, CallRequest>,
    wallets: HashMap<Address, WalletSnapshot>,
    numbers: HashMap<Address, U256>,
}

impl SimulatedConnection {
    /// Creates a connection with nothing deployed yet.
    pub fn new(config: SimulatedConnectionConfig) -> Self {
        Self { config, chain: Mutex::new(SimulatedChain::default()) }
    }
}

impl Connection for SimulatedConnection {
    fn account(&self) -> Address {
        self.config.account
    }

    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    #[tracing::instrument(skip_all, fields(call = request.call().function_name()))]
    async fn send_call(&self, request: CallRequest) -> Result<TxHash, ConnectionError> {
        tokio::time::sleep(self.config.send_delay).await;

        if self.config.reject_calls {
            return Err(ConnectionError::rejected(REJECTED_MESSAGE));
        }

        let tx_hash = TxHash::from(rand::random::<[u8; 32]>());

        self.chain.lock().await.pending.insert(tx_hash, request);

        Ok(tx_hash)
    }

    #[tracing::instrument(skip(self))]
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ConnectionError> {
        tokio::time::sleep(self.config.confirmation_delay).await;

        let mut chain = self.chain.lock().await;

        let CallRequestDissolved { target, call } = chain
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| ConnectionError::transport(format!("transaction {tx_hash} not found")))?
            .dissolve();

        chain.block_number += 1;

        let wallet_created = match call {
            ContractCall::CreateMultiSigWalletAndHandler(args) => {
                let created = WalletCreated::builder()
                    .initializer(self.account())
                    .wallet(random_address())
                    .handler(random_address())
                    .build();

                tracing::info!(wallet = %created.wallet(), "simulated wallet deployed");

                chain.wallets.insert(created.wallet(), deployed_snapshot(created.wallet(), args));

                Some(created)
            },
            ContractCall::SubmitTransaction(request) => {
                let wallet =
                    chain.wallets.entry(target).or_insert_with(|| placeholder_snapshot(target));
                let record = submitted_record(&request, wallet.minimum_approvals());
                wallet.record_transaction(record);

                None
            },
            ContractCall::SetNumber { number } => {
                chain.numbers.insert(target, number);

                None
            },
        };

        let receipt = TxReceipt::builder()
            .tx_hash(tx_hash)
            .block_number(chain.block_number)
            .sender(self.account())
            .to(target)
            .maybe_wallet_created(wallet_created)
            .build();

        Ok(receipt)
    }

    async fn call_view(&self, target: Address, call: ViewCall) -> Result<U256, ConnectionError> {
        match call {
            ViewCall::GetNumber => {
                Ok(self.chain.lock().await.numbers.get(&target).copied().unwrap_or_default())
            },
        }
    }

    async fn fetch_wallet(&self, address: Address) -> Result<Option<WalletSnapshot>, ConnectionError> {
        let snapshot = self
            .chain
            .lock()
            .await
            .wallets
            .get(&address)
            .cloned()
            .unwrap_or_else(|| placeholder_snapshot(address));

        Ok(Some(snapshot))
    }
}

fn random_address() -> Address {
    Address::from(rand::random::<[u8; 20]>())
}

fn deployed_snapshot(address: Address, args: CreateWalletCall) -> WalletSnapshot {
    let minimum_approvals = args.minimum_threshold().saturating_to::<u32>();

    WalletSnapshot::builder()
        .address(address)
        .name(args.name())
        .balance(U256::ZERO)
        .owners(args.owners().to_vec())
        .minimum_approvals(minimum_approvals)
        .created_on(Utc::now().date_naive())
        .build()
}

fn submitted_record(request: &TransactionRequest, required: u32) -> TxRecord {
    let (kind, unit) = match request {
        TransactionRequest::Raw { .. } => ("Transfer", "ETH".to_owned()),
        TransactionRequest::Erc20 { token_address, .. } => {
            ("Token Transfer", abbreviate_address(token_address))
        },
    };

    TxRecord::builder()
        .at(Utc::now().naive_utc())
        .kind(kind)
        .approvals(Approvals { collected: 1, required })
        .amount(format!("-{} {unit}", request.display_value()))
        .status(TxStatus::Pending)
        .build()
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

/// Sample data shown for wallets the connection knows nothing about.
fn placeholder_snapshot(address: Address) -> WalletSnapshot {
    let record = |at, kind: &str, approvals: Option<(u32, u32)>, amount: &str, status| {
        TxRecord::builder()
            .at(at)
            .kind(kind)
            .maybe_approvals(approvals.map(|(collected, required)| Approvals { collected, required }))
            .amount(amount)
            .status(status)
            .build()
    };

    WalletSnapshot::builder()
        .address(address)
        .name("Multisig Wallet")
        .balance(U256::from(3_237_900_000_000_000_000u128))
        .owners((0x11..=0x55).step_by(0x11).map(Address::repeat_byte).collect())
        .minimum_approvals(3)
        .created_on(NaiveDate::from_ymd_opt(2023, 4, 15).unwrap_or_default())
        .token_balances(vec![TokenBalance::builder().symbol("WBTC").amount("0.03").build()])
        .transactions(vec![
            record(at(2023, 4, 15, 12, 33), "Deposit", None, "+1.23 BTC", TxStatus::Executed),
            record(at(2023, 4, 12, 3, 31), "Transfer", Some((3, 3)), "+1.23 BTC", TxStatus::Confirmed),
            record(at(2023, 4, 8, 17, 23), "Deposit", None, "+1.23 BTC", TxStatus::Confirmed),
            record(at(2023, 4, 5, 10, 12), "Transfer", Some((2, 3)), "+1.23 BTC", TxStatus::Pending),
            record(at(2023, 4, 3, 9, 45), "Withdrawal", Some((1, 3)), "-0.56 ETH", TxStatus::Pending),
            record(at(2023, 4, 1, 16, 5), "Withdrawal", Some((0, 3)), "-2.00 BTC", TxStatus::Revoked),
        ])
        .build()
}
