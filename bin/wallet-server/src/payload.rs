pub mod request;
pub mod response;

use core::{fmt, num::NonZeroU32};

use alloy_primitives::{Address, TxHash};
use bon::Builder;
use chrono::{DateTime, NaiveDate, Utc};
use multisig_wallet_domain::{
    call::ContractCall,
    dashboard::{Approvals, TokenBalance, TxRecord, TxStatus, WalletSnapshot},
    request::{WalletCreationRequest, WalletForm},
    screen::{ReviewDialog, Screen, ScreenKind},
    validation::ValidationErrors,
};
use multisig_wallet_engine::{DispatchHandle, DispatchStatus, dispatch::Notification};
use serde::Serialize;
use serde_with::DisplayFromStr;
use uuid::Uuid;

use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorPayload {
    field: String,
    message: String,
}

impl FieldErrorPayload {
    pub fn new(field: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self { field: field.to_string(), message: message.to_string() }
    }

    pub fn from_errors<F, E>(errors: &ValidationErrors<F, E>) -> Vec<Self>
    where
        F: fmt::Display + PartialEq,
        E: fmt::Display,
    {
        errors.iter().map(|error| Self::new(error.field(), error.error())).collect()
    }

    pub fn is_for(&self, field: impl fmt::Display) -> bool {
        self.field == field.to_string()
    }
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct WalletRequestPayload {
    #[serde_as(as = "Vec<DisplayFromStr>")]
    owners: Vec<Address>,

    minimum_threshold: NonZeroU32,
    initial_approvals: NonZeroU32,
    initial_votes: NonZeroU32,
    name: String,
    function_signature: &'static str,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct WalletFormPayload {
    #[serde_as(as = "Vec<DisplayFromStr>")]
    owners: Vec<Address>,

    minimum_threshold: i64,
    initial_approvals: i64,
    initial_votes: i64,
    name: String,
    errors: Vec<FieldErrorPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct ReviewPayload {
    step: &'static str,
    request: WalletRequestPayload,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct SessionPayload {
    id: Uuid,

    #[serde_as(as = "DisplayFromStr")]
    screen: ScreenKind,

    #[serde_as(as = "Option<DisplayFromStr>")]
    opened_wallet: Option<Address>,

    form: Option<WalletFormPayload>,
    review: Option<ReviewPayload>,
    deploying: Option<WalletRequestPayload>,
    dispatch: Option<DispatchPayload>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Serialize)]
pub struct NotificationPayload {
    level: &'static str,
    message: String,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct DispatchPayload {
    id: Uuid,
    function_name: &'static str,

    #[serde_as(as = "DisplayFromStr")]
    status: DispatchStatus,

    progress: u8,
    status_text: Option<String>,
    notification: Option<NotificationPayload>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    tx_hash: Option<TxHash>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    created_wallet: Option<Address>,
}

#[derive(Debug, Builder, Serialize)]
pub struct TokenBalancePayload {
    symbol: String,
    amount: String,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct WalletPayload {
    #[serde_as(as = "DisplayFromStr")]
    address: Address,

    name: String,
    balance: String,

    #[serde_as(as = "Vec<DisplayFromStr>")]
    owners: Vec<Address>,

    minimum_approvals: u32,
    created_on: NaiveDate,
    token_balances: Vec<TokenBalancePayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct ApprovalsPayload {
    collected: u32,
    required: u32,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct TxRecordPayload {
    time: String,
    kind: String,
    approvals: Option<ApprovalsPayload>,
    amount: String,

    #[serde_as(as = "DisplayFromStr")]
    status: TxStatus,
}

impl From<&WalletCreationRequest> for WalletRequestPayload {
    fn from(request: &WalletCreationRequest) -> Self {
        let function_signature = ContractCall::from(request.clone()).signature();

        WalletRequestPayload::builder()
            .owners(request.owners().to_vec())
            .minimum_threshold(request.minimum_threshold())
            .initial_approvals(request.initial_approvals())
            .initial_votes(request.initial_votes())
            .name(request.name().to_owned())
            .function_signature(function_signature)
            .build()
    }
}

impl From<&WalletForm> for WalletFormPayload {
    fn from(form: &WalletForm) -> Self {
        let errors = form
            .validate()
            .err()
            .map(|errors| FieldErrorPayload::from_errors(&errors))
            .unwrap_or_default();

        WalletFormPayload::builder()
            .owners(form.owners().to_vec())
            .minimum_threshold(form.minimum_threshold())
            .initial_approvals(form.initial_approvals())
            .initial_votes(form.initial_votes())
            .name(form.name().to_owned())
            .errors(errors)
            .build()
    }
}

impl From<&ReviewDialog> for ReviewPayload {
    fn from(dialog: &ReviewDialog) -> Self {
        let step = match dialog {
            ReviewDialog::RiskWarning(_) => "risk_warning",
            ReviewDialog::Summary(_) => "summary",
        };

        ReviewPayload::builder().step(step).request(dialog.request().into()).build()
    }
}

impl SessionPayload {
    pub fn new(id: Uuid, session: &Session) -> Self {
        let screen = session.onboarding().screen();

        let (form, review, deploying) = match screen {
            Screen::CreateWallet(create) => {
                (Some(create.form().into()), create.dialog().map(From::from), None)
            },
            Screen::Deploying(request) => (None, None, Some(request.into())),
            Screen::Welcome | Screen::GetStarted | Screen::AddWallet => (None, None, None),
        };

        SessionPayload::builder()
            .id(id)
            .screen(screen.kind())
            .maybe_opened_wallet(session.opened_wallet())
            .maybe_form(form)
            .maybe_review(review)
            .maybe_deploying(deploying)
            .maybe_dispatch(session.dispatch().map(From::from))
            .created_at(session.timestamps().created_at())
            .updated_at(session.timestamps().updated_at())
            .build()
    }
}

impl From<Notification> for NotificationPayload {
    fn from(notification: Notification) -> Self {
        let Notification { level, message } = notification;

        NotificationPayload::builder()
            .level(<&'static str>::from(level))
            .message(message)
            .build()
    }
}

impl From<&DispatchHandle> for DispatchPayload {
    fn from(handle: &DispatchHandle) -> Self {
        let status = handle.status();

        DispatchPayload::builder()
            .id(handle.id().uuid())
            .function_name(handle.function_name())
            .progress(status.progress())
            .maybe_status_text(status.status_text())
            .maybe_notification(status.notification().map(From::from))
            .maybe_tx_hash(status.tx_hash())
            .maybe_created_wallet(status.navigation_target())
            .status(status)
            .build()
    }
}

impl From<&TokenBalance> for TokenBalancePayload {
    fn from(balance: &TokenBalance) -> Self {
        TokenBalancePayload::builder()
            .symbol(balance.symbol().to_owned())
            .amount(balance.amount().to_owned())
            .build()
    }
}

impl From<&WalletSnapshot> for WalletPayload {
    fn from(snapshot: &WalletSnapshot) -> Self {
        WalletPayload::builder()
            .address(snapshot.address())
            .name(snapshot.name().to_owned())
            .balance(snapshot.display_balance())
            .owners(snapshot.owners().to_vec())
            .minimum_approvals(snapshot.minimum_approvals())
            .created_on(snapshot.created_on())
            .token_balances(snapshot.token_balances().iter().map(From::from).collect())
            .build()
    }
}

impl From<Approvals> for ApprovalsPayload {
    fn from(Approvals { collected, required }: Approvals) -> Self {
        ApprovalsPayload::builder().collected(collected).required(required).build()
    }
}

impl From<&TxRecord> for TxRecordPayload {
    fn from(record: &TxRecord) -> Self {
        TxRecordPayload::builder()
            .time(record.display_time())
            .kind(record.kind().to_owned())
            .maybe_approvals(record.approvals().map(From::from))
            .amount(record.amount().to_owned())
            .status(record.status())
            .build()
    }
}
