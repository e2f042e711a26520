use dissolve_derive::Dissolve;
use multisig_wallet_domain::screen::ScreenAction;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Dissolve, Deserialize)]
pub struct ResolveRouteRequestPayload {
    path: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ValidateWalletRequestPayload {
    owners: String,
    minimum_threshold: i64,
    initial_approvals: i64,
    initial_votes: i64,
    name: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct GetSessionDetailsRequestPayload {
    session_id: Uuid,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ApplySessionActionRequestPayload {
    session_id: Uuid,

    #[serde(flatten)]
    action: ScreenActionPayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScreenActionPayload {
    GetStarted,
    AddExistingWallet,
    CreateNewWallet,
    Back,
    ViewWallet { wallet_address: String },
    OpenReview,
    AcknowledgeRisk,
    CancelReview,
    ConfirmDeploy,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct AddSessionOwnersRequestPayload {
    session_id: Uuid,
    input: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct RemoveSessionOwnerRequestPayload {
    session_id: Uuid,
    owner: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UpdateSessionFormRequestPayload {
    session_id: Uuid,
    name: Option<String>,
    minimum_threshold: Option<i64>,
    initial_approvals: Option<i64>,
    initial_votes: Option<i64>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct GetWalletDetailsRequestPayload {
    wallet_address: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ListWalletTxRequestPayload {
    wallet_address: String,
    tab: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct SubmitWalletTxRequestPayload {
    wallet_address: String,
    kind: String,
    to: String,
    token_address: Option<String>,
    value: String,
    data: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct SetCounterNumberRequestPayload {
    number: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct GetDispatchStatusRequestPayload {
    dispatch_id: Uuid,
}

impl From<ScreenActionPayload> for ScreenAction {
    fn from(payload: ScreenActionPayload) -> Self {
        match payload {
            ScreenActionPayload::GetStarted => Self::GetStarted,
            ScreenActionPayload::AddExistingWallet => Self::AddExistingWallet,
            ScreenActionPayload::CreateNewWallet => Self::CreateNewWallet,
            ScreenActionPayload::Back => Self::Back,
            ScreenActionPayload::ViewWallet { wallet_address } => Self::ViewWallet(wallet_address),
            ScreenActionPayload::OpenReview => Self::OpenReview,
            ScreenActionPayload::AcknowledgeRisk => Self::AcknowledgeRisk,
            ScreenActionPayload::CancelReview => Self::CancelReview,
            ScreenActionPayload::ConfirmDeploy => Self::ConfirmDeploy,
        }
    }
}
