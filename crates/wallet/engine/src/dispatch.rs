//! Dispatch lifecycle as observed from a connection.

use core::{fmt, str::FromStr, time::Duration};

use alloy_primitives::{Address, TxHash};
use strum::{Display, IntoStaticStr};
use tokio::sync::watch;
use uuid::Uuid;

use crate::connection::TxReceipt;

/// Delay between the confirmation of a wallet creation and the navigation to its dashboard.
pub const NAVIGATION_DELAY: Duration = Duration::from_secs(3);

/// Default time a settled dispatch stays available for lookup.
pub const DISPATCH_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Identifier of a dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchId(Uuid);

impl DispatchId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DispatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for DispatchId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The status of a dispatched call.
///
/// `Idle -> Pending -> Confirming -> Confirmed | Failed`. Transitions are driven by the
/// connection alone; a failed dispatch is never retried.
#[derive(Debug, Clone, Default, PartialEq, Eq, IntoStaticStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStatus {
    /// Nothing has been sent yet.
    #[default]
    Idle,

    /// Waiting for the account to sign.
    Pending,

    /// Broadcast, waiting for inclusion.
    Confirming {
        /// The broadcast transaction.
        tx_hash: TxHash,
    },

    /// Included successfully.
    Confirmed {
        /// The receipt of the transaction.
        receipt: TxReceipt,
    },

    /// Declined, reverted, or lost.
    Failed {
        /// The transaction, when it had been broadcast.
        tx_hash: Option<TxHash>,
        /// The connection error message, verbatim.
        message: String,
    },
}

/// The severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    /// Progress information.
    Info,
    /// A successful outcome.
    Success,
    /// A failure.
    Error,
}

/// A transient message raised when a dispatch changes status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The severity.
    pub level: NotificationLevel,
    /// The message.
    pub message: String,
}

impl DispatchStatus {
    /// Returns the progress shown to the user, in percent.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Idle | Self::Pending | Self::Failed { .. } => 0,
            Self::Confirming { .. } => 50,
            Self::Confirmed { .. } => 100,
        }
    }

    /// Returns the status line shown under the progress bar.
    pub fn status_text(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Pending => Some("Please confirm the transaction...".to_owned()),
            Self::Confirming { .. } => Some("Awaiting transaction confirmation...".to_owned()),
            Self::Confirmed { receipt } if receipt.wallet_created().is_some() => {
                Some("Wallet Created - Fetching Wallet ...".to_owned())
            },
            Self::Confirmed { .. } => Some("Transaction confirmed".to_owned()),
            Self::Failed { message, .. } => Some(message.clone()),
        }
    }

    /// Returns the notification raised on entering this status, if any.
    pub fn notification(&self) -> Option<Notification> {
        let (level, message) = match self {
            Self::Idle | Self::Pending => return None,
            Self::Confirming { .. } => {
                (NotificationLevel::Info, "Transaction pending, please wait...".to_owned())
            },
            Self::Confirmed { receipt } if receipt.wallet_created().is_some() => {
                (NotificationLevel::Success, "Transaction confirmed - Wallet created!".to_owned())
            },
            Self::Confirmed { .. } => {
                (NotificationLevel::Success, "Transaction confirmed".to_owned())
            },
            Self::Failed { message, .. } => (NotificationLevel::Error, message.clone()),
        };

        Some(Notification { level, message })
    }

    /// Returns the transaction hash, once known.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Idle | Self::Pending => None,
            Self::Confirming { tx_hash } => Some(*tx_hash),
            Self::Confirmed { receipt } => Some(receipt.tx_hash()),
            Self::Failed { tx_hash, .. } => *tx_hash,
        }
    }

    /// Returns the wallet whose dashboard should be opened after [`NAVIGATION_DELAY`].
    ///
    /// Only a confirmed wallet creation navigates.
    pub fn navigation_target(&self) -> Option<Address> {
        match self {
            Self::Confirmed { receipt } => receipt.wallet_created().map(|created| created.wallet()),
            _ => None,
        }
    }

    /// Returns `true` once the status can no longer change.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }
}

/// A view on the status of one dispatched call.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    id: DispatchId,
    function_name: &'static str,
    status: watch::Receiver<DispatchStatus>,
}

impl DispatchHandle {
    pub(crate) fn new(
        id: DispatchId,
        function_name: &'static str,
        status: watch::Receiver<DispatchStatus>,
    ) -> Self {
        Self { id, function_name, status }
    }

    /// Returns the identifier of the dispatch.
    pub fn id(&self) -> DispatchId {
        self.id
    }

    /// Returns the name of the dispatched function.
    pub fn function_name(&self) -> &'static str {
        self.function_name
    }

    /// Returns the latest status.
    pub fn status(&self) -> DispatchStatus {
        self.status.borrow().clone()
    }

    /// Waits until the status satisfies `f` and returns it.
    ///
    /// Returns the latest status if the dispatch ended without ever satisfying `f`.
    pub async fn wait_for(&mut self, mut f: impl FnMut(&DispatchStatus) -> bool) -> DispatchStatus {
        let status = self
            .status
            .wait_for(|status| f(status) || status.is_settled())
            .await
            .map(|status| DispatchStatus::clone(&status));

        status.unwrap_or_else(|_| self.status())
    }

    /// Waits until the dispatch is confirmed or has failed.
    pub async fn wait_settled(&mut self) -> DispatchStatus {
        self.wait_for(DispatchStatus::is_settled).await
    }
}
