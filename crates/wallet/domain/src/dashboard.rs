//! Wallet dashboard models.

use alloy_primitives::{Address, U256, utils::format_ether};
use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime};
use dissolve_derive::Dissolve;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Format used to display the time of a transaction record.
pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%d - %I:%M %p";

/// The status of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TxStatus {
    /// Awaiting approvals.
    Pending,
    /// Withdrawn by its proposer.
    Revoked,
    /// Approved by enough owners.
    Confirmed,
    /// Executed on chain.
    Executed,
}

/// A tab of the dashboard transaction list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TxTab {
    /// Every transaction.
    #[default]
    All,
    /// [`TxStatus::Pending`] transactions.
    Pending,
    /// [`TxStatus::Revoked`] transactions.
    Revoked,
    /// [`TxStatus::Confirmed`] transactions.
    Confirmed,
    /// [`TxStatus::Executed`] transactions.
    Executed,
}

impl TxTab {
    /// Returns `true` when a transaction with `status` belongs to the tab.
    pub fn includes(self, status: TxStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == TxStatus::Pending,
            Self::Revoked => status == TxStatus::Revoked,
            Self::Confirmed => status == TxStatus::Confirmed,
            Self::Executed => status == TxStatus::Executed,
        }
    }
}

/// Approvals collected over approvals required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approvals {
    /// Approvals collected so far.
    pub collected: u32,
    /// Approvals required to execute.
    pub required: u32,
}

/// A row of the dashboard transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct TxRecord {
    at: NaiveDateTime,
    #[builder(into)]
    kind: String,
    approvals: Option<Approvals>,
    /// Signed amount with its unit, e.g. `+1.23 BTC`.
    #[builder(into)]
    amount: String,
    status: TxStatus,
}

impl TxRecord {
    /// Returns when the transaction happened.
    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    /// Returns the time formatted with [`RECORD_TIME_FORMAT`].
    pub fn display_time(&self) -> String {
        self.at.format(RECORD_TIME_FORMAT).to_string()
    }

    /// Returns the kind, e.g. `Deposit`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the approvals, for transactions that need them.
    pub fn approvals(&self) -> Option<Approvals> {
        self.approvals
    }

    /// Returns the signed amount with its unit.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Returns the status.
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Returns `true` when `needle` occurs in the kind, the amount or the displayed time,
    /// ignoring case.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();

        needle.is_empty()
            || [self.kind.as_str(), self.amount.as_str(), self.display_time().as_str()]
                .iter()
                .any(|haystack| haystack.to_lowercase().contains(&needle))
    }
}

/// A token balance held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct TokenBalance {
    #[builder(into)]
    symbol: String,
    #[builder(into)]
    amount: String,
}

impl TokenBalance {
    /// Returns the token symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the balance as a decimal string.
    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// Everything the dashboard shows about a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct WalletSnapshot {
    address: Address,
    #[builder(into)]
    name: String,
    /// Balance in wei.
    balance: U256,
    owners: Vec<Address>,
    minimum_approvals: u32,
    created_on: NaiveDate,
    #[builder(default)]
    token_balances: Vec<TokenBalance>,
    #[builder(default)]
    transactions: Vec<TxRecord>,
}

impl WalletSnapshot {
    /// Returns the wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the wallet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the balance in wei.
    pub fn balance(&self) -> U256 {
        self.balance
    }

    /// Returns the balance in ether as a decimal string.
    pub fn display_balance(&self) -> String {
        format_ether(self.balance)
    }

    /// Returns the owners.
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Returns the minimum number of approvals.
    pub fn minimum_approvals(&self) -> u32 {
        self.minimum_approvals
    }

    /// Returns the creation date.
    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    /// Returns the token balances.
    pub fn token_balances(&self) -> &[TokenBalance] {
        &self.token_balances
    }

    /// Returns every transaction, most recent first.
    pub fn transactions(&self) -> &[TxRecord] {
        &self.transactions
    }

    /// Records a new transaction at the top of the list.
    pub fn record_transaction(&mut self, record: TxRecord) {
        self.transactions.insert(0, record);
    }

    /// Returns the transactions on `tab` matching `search`, keeping their order.
    ///
    /// An empty search matches everything.
    pub fn filter_transactions<'a>(
        &'a self,
        tab: TxTab,
        search: &'a str,
    ) -> impl Iterator<Item = &'a TxRecord> {
        self.transactions
            .iter()
            .filter(move |record| tab.includes(record.status) && record.matches(search))
    }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;

    fn record(at: &str, kind: &str, amount: &str, status: TxStatus) -> TxRecord {
        TxRecord::builder()
            .at(NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap())
            .kind(kind)
            .amount(amount)
            .status(status)
            .build()
    }

    fn snapshot() -> WalletSnapshot {
        WalletSnapshot::builder()
            .address(Address::repeat_byte(0xaa))
            .name("Treasury")
            .balance(U256::from(3_237_900_000_000_000_000u128))
            .owners(vec![Address::repeat_byte(1), Address::repeat_byte(2)])
            .minimum_approvals(2)
            .created_on(NaiveDate::from_ymd_opt(2023, 4, 15).unwrap())
            .transactions(vec![
                record("2023-04-15 12:33", "Deposit", "+1.23 BTC", TxStatus::Executed),
                record("2023-04-12 03:31", "Transfer", "+1.23 BTC", TxStatus::Confirmed),
                record("2023-04-10 09:15", "Withdrawal", "-0.56 ETH", TxStatus::Pending),
                record("2023-04-08 18:02", "Withdrawal", "-2.00 BTC", TxStatus::Revoked),
            ])
            .build()
    }

    #[test]
    fn record_time_display() {
        let record = record("2023-04-15 12:33", "Deposit", "+1.23 BTC", TxStatus::Executed);
        assert_eq!(record.display_time(), "2023-04-15 - 12:33 PM");
    }

    #[test]
    fn tabs_filter_by_status() {
        let snapshot = snapshot();

        assert_eq!(snapshot.filter_transactions(TxTab::All, "").count(), 4);
        for (tab, kind) in [
            (TxTab::Pending, "Withdrawal"),
            (TxTab::Revoked, "Withdrawal"),
            (TxTab::Confirmed, "Transfer"),
            (TxTab::Executed, "Deposit"),
        ] {
            let kinds: Vec<_> = snapshot.filter_transactions(tab, "").map(TxRecord::kind).collect();
            assert_eq!(kinds, vec![kind], "tab {tab}");
        }
    }

    #[test]
    fn search_is_case_insensitive_over_kind_amount_and_time() {
        let snapshot = snapshot();

        assert_eq!(snapshot.filter_transactions(TxTab::All, "withdrawal").count(), 2);
        assert_eq!(snapshot.filter_transactions(TxTab::All, "btc").count(), 3);
        assert_eq!(snapshot.filter_transactions(TxTab::All, "03:31 am").count(), 1);
        assert_eq!(snapshot.filter_transactions(TxTab::Pending, "btc").count(), 0);
    }

    #[test]
    fn recorded_transactions_come_first() {
        let mut snapshot = snapshot();
        snapshot.record_transaction(record(
            "2023-05-01 08:00",
            "Transfer",
            "-0.10 ETH",
            TxStatus::Pending,
        ));

        assert_eq!(snapshot.transactions().len(), 5);
        assert_eq!(snapshot.transactions()[0].amount(), "-0.10 ETH");
        assert_eq!(snapshot.filter_transactions(TxTab::Pending, "").count(), 2);
    }

    #[test]
    fn tab_names_parse_ignoring_case() {
        assert_eq!(TxTab::from_str("Pending").unwrap(), TxTab::Pending);
        assert_eq!(TxTab::default().to_string(), "all");
        assert!(TxTab::from_str("archived").is_err());
    }
}
