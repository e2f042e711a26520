//! Textual address parsing and display helpers.

use core::str::FromStr;

use alloy_primitives::{Address, TxHash};

/// Length of the textual form of an address: `0x` followed by 40 hex digits.
pub const ADDRESS_TEXT_LEN: usize = 42;

/// Prefix every textual address must start with.
pub const ADDRESS_PREFIX: &str = "0x";

/// Parses a textual address.
///
/// The input must be exactly [`ADDRESS_TEXT_LEN`] characters long, start with
/// [`ADDRESS_PREFIX`] and carry a hex body. Mixed-case input is accepted as is; the EIP-55
/// checksum is not verified.
///
/// # Errors
///
/// Returns [`AddressError::InvalidFormat`] when any of the rules above is violated.
pub fn parse_address(input: &str) -> Result<Address, AddressError> {
    let invalid = || AddressError::InvalidFormat(input.to_owned());

    let body = input
        .strip_prefix(ADDRESS_PREFIX)
        .filter(|_| input.len() == ADDRESS_TEXT_LEN)
        .ok_or_else(invalid)?;

    if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    Address::from_str(input).map_err(|_| invalid())
}

/// Returns `true` when `input` is a well-formed textual address.
pub fn is_valid_address(input: &str) -> bool {
    parse_address(input).is_ok()
}

/// Abbreviates an address for compact display, e.g. `0xAbCd...1234`.
pub fn abbreviate_address(address: &Address) -> String {
    let checksummed = address.to_checksum(None);
    format!("{}...{}", &checksummed[..6], &checksummed[checksummed.len() - 4..])
}

/// Abbreviates a transaction hash for compact display, e.g. `0x1a2b3...9f0e`.
pub fn abbreviate_hash(hash: &TxHash) -> String {
    let hex = hash.to_string();
    format!("{}...{}", &hex[..7], &hex[hex.len() - 4..])
}

/// Error returned when a textual address is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The input is not `0x` followed by 40 hex digits.
    #[error("invalid address format: {0:?}")]
    InvalidFormat(String),
}
