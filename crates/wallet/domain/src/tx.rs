//! Transaction submission requests.

use core::str::FromStr;

use alloy_primitives::{
    Address, Bytes, U256,
    utils::{format_ether, parse_ether},
};
use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    address::parse_address,
    validation::{Collector, ValidationErrors},
};

/// The fields of the transaction submission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TxField {
    /// The recipient.
    To,
    /// The token contract, for token transfers only.
    TokenAddress,
    /// The amount, as a decimal string.
    Value,
    /// The optional call data.
    Data,
}

/// The kind of transaction being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TxKind {
    /// A native value transfer with optional raw call data.
    Raw,
    /// An ERC20 token transfer.
    Erc20,
}

/// A violation of the transaction form rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxRuleError {
    /// The address is not `0x` followed by 40 hex digits.
    #[error("address must be a valid Ethereum address")]
    InvalidAddress,

    /// The value is missing.
    #[error("value is required")]
    MissingValue,

    /// The value is not a non-negative decimal number with at most 18 decimals.
    #[error("value must be a valid number")]
    InvalidValue,

    /// The data is not `0x`-prefixed hex.
    #[error("data must be a hex string")]
    InvalidData,

    /// A token address was given for a raw transaction.
    #[error("token address is only valid for erc20 transactions")]
    UnexpectedTokenAddress,
}

/// Validation errors for a transaction request.
pub type TxValidationErrors = ValidationErrors<TxField, TxRuleError>;

/// A validated transaction to submit through a multisig wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRequest {
    /// A native value transfer with optional call data.
    Raw {
        /// The recipient.
        to: Address,
        /// The amount in wei.
        value: U256,
        /// Optional call data.
        data: Option<Bytes>,
    },
    /// An ERC20 token transfer.
    Erc20 {
        /// The recipient.
        to: Address,
        /// The token contract.
        token_address: Address,
        /// The amount in the token's base unit, assuming 18 decimals.
        value: U256,
        /// Optional call data.
        data: Option<Bytes>,
    },
}

impl TransactionRequest {
    /// Returns the kind of transaction.
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Raw { .. } => TxKind::Raw,
            Self::Erc20 { .. } => TxKind::Erc20,
        }
    }

    /// Returns the recipient.
    pub fn to(&self) -> Address {
        match self {
            Self::Raw { to, .. } | Self::Erc20 { to, .. } => *to,
        }
    }

    /// Returns the amount in base units.
    pub fn value(&self) -> U256 {
        match self {
            Self::Raw { value, .. } | Self::Erc20 { value, .. } => *value,
        }
    }

    /// Returns the call data, if any.
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            Self::Raw { data, .. } | Self::Erc20 { data, .. } => data.as_ref(),
        }
    }

    /// Returns the token contract for token transfers.
    pub fn token_address(&self) -> Option<Address> {
        match self {
            Self::Raw { .. } => None,
            Self::Erc20 { token_address, .. } => Some(*token_address),
        }
    }

    /// Returns the amount formatted as a decimal string in whole units.
    pub fn display_value(&self) -> String {
        format_ether(self.value())
    }
}

/// Raw, unvalidated transaction form input.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct TransactionForm {
    kind: TxKind,
    #[builder(into)]
    to: String,
    #[builder(into)]
    token_address: Option<String>,
    #[builder(into)]
    value: String,
    #[builder(into)]
    data: Option<String>,
}

impl TransactionForm {
    /// Validates the form.
    ///
    /// # Errors
    ///
    /// Returns every violation, attached to the offending [`TxField`].
    pub fn validate(&self) -> Result<TransactionRequest, TxValidationErrors> {
        let mut errors = Collector::new();

        let to = parse_address(self.to.trim())
            .inspect_err(|_| errors.push(TxField::To, TxRuleError::InvalidAddress))
            .ok();

        let token_address = match (self.kind, self.token_address.as_deref().map(str::trim)) {
            (TxKind::Erc20, Some(token)) => parse_address(token)
                .inspect_err(|_| errors.push(TxField::TokenAddress, TxRuleError::InvalidAddress))
                .ok(),
            (TxKind::Erc20, None) => {
                errors.push(TxField::TokenAddress, TxRuleError::InvalidAddress);
                None
            },
            (TxKind::Raw, Some(token)) if !token.is_empty() => {
                errors.push(TxField::TokenAddress, TxRuleError::UnexpectedTokenAddress);
                None
            },
            (TxKind::Raw, _) => None,
        };

        let value = parse_value(self.value.trim())
            .inspect_err(|e| errors.push(TxField::Value, e.clone()))
            .ok();

        let data = parse_data(self.data.as_deref().map(str::trim).unwrap_or_default())
            .inspect_err(|e| errors.push(TxField::Data, e.clone()))
            .ok()
            .flatten();

        let request = match (self.kind, to, token_address, value) {
            (TxKind::Raw, Some(to), _, Some(value)) => Some(TransactionRequest::Raw { to, value, data }),
            (TxKind::Erc20, Some(to), Some(token_address), Some(value)) => {
                Some(TransactionRequest::Erc20 { to, token_address, value, data })
            },
            _ => None,
        };

        errors.finish(request)
    }
}

const ETHER_DECIMALS: usize = 18;

/// Parses a decimal amount in whole units (`digits[.digits]`) into base units.
fn parse_value(value: &str) -> Result<U256, TxRuleError> {
    if value.is_empty() {
        return Err(TxRuleError::MissingValue);
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if !is_digits(whole) || !fraction.is_none_or(is_digits) {
        return Err(TxRuleError::InvalidValue);
    }

    if fraction.is_some_and(|f| f.len() > ETHER_DECIMALS) {
        return Err(TxRuleError::InvalidValue);
    }

    parse_ether(value).map_err(|_| TxRuleError::InvalidValue)
}

fn parse_data(data: &str) -> Result<Option<Bytes>, TxRuleError> {
    if data.is_empty() {
        return Ok(None);
    }

    if !data.starts_with("0x") {
        return Err(TxRuleError::InvalidData);
    }

    let bytes = Bytes::from_str(data).map_err(|_| TxRuleError::InvalidData)?;

    Ok((!bytes.is_empty()).then_some(bytes))
}
