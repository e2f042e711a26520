use alloy_primitives::{Address, U256};
use bon::Builder;
use serde::Serialize;
use serde_with::DisplayFromStr;

use crate::payload::{
    DispatchPayload, FieldErrorPayload, SessionPayload, TxRecordPayload, WalletPayload,
    WalletRequestPayload,
};

#[derive(Debug, Builder, Serialize)]
pub struct ErrorResponsePayload {
    error: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldErrorPayload>,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct ResolveRouteResponsePayload {
    view: &'static str,

    #[serde_as(as = "Option<DisplayFromStr>")]
    wallet_address: Option<Address>,
}

#[derive(Debug, Builder, Serialize)]
pub struct ValidateWalletResponsePayload {
    valid: bool,
    errors: Vec<FieldErrorPayload>,
    request: Option<WalletRequestPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct SessionResponsePayload {
    session: SessionPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct ApplySessionActionResponsePayload {
    transition: &'static str,
    session: SessionPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct GetWalletDetailsResponsePayload {
    wallet: WalletPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListWalletTxResponsePayload {
    txs: Vec<TxRecordPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct DispatchResponsePayload {
    dispatch: DispatchPayload,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct GetCounterNumberResponsePayload {
    #[serde_as(as = "DisplayFromStr")]
    number: U256,
}
