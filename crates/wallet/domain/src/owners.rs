//! Owner list accumulation.
//!
//! Owners are entered as free text: either a single address or a JSON array of addresses.
//! Both shapes go through the same validation routine, and a batch is applied atomically.

use alloy_primitives::Address;

use crate::address::{AddressError, parse_address};

/// The shape of a raw owner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerInput {
    /// A single address candidate.
    Single(String),
    /// A JSON array of address candidates.
    Batch(Vec<String>),
}

impl OwnerInput {
    /// Interprets free-text input.
    ///
    /// A JSON array of strings is tried first; anything else is treated as a single address.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        match serde_json::from_str::<Vec<String>>(input) {
            Ok(batch) => Self::Batch(batch),
            Err(_) => Self::Single(input.to_owned()),
        }
    }

    fn into_candidates(self) -> Vec<String> {
        match self {
            Self::Single(candidate) => vec![candidate],
            Self::Batch(candidates) => candidates,
        }
    }
}

/// The ordered, duplicate-free list of owners collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerList(Vec<Address>);

impl OwnerList {
    /// Creates an empty owner list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `input` and appends the resulting addresses.
    ///
    /// # Errors
    ///
    /// - [`OwnerError::Empty`] when the input holds no candidate
    /// - [`OwnerError::InvalidAddress`] when any candidate is malformed
    /// - [`OwnerError::Duplicate`] when any candidate is already listed or repeated in the input
    ///
    /// On error the list is left untouched.
    pub fn add(&mut self, input: &str) -> Result<&[Address], OwnerError> {
        self.add_input(OwnerInput::parse(input))
    }

    /// Appends the addresses of an already parsed input. See [`add`](Self::add).
    pub fn add_input(&mut self, input: OwnerInput) -> Result<&[Address], OwnerError> {
        let candidates = input.into_candidates();

        if candidates.iter().all(|c| c.trim().is_empty()) {
            return Err(OwnerError::Empty);
        }

        let mut accepted: Vec<Address> = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let address = parse_address(candidate.trim())?;

            if self.contains(&address) || accepted.contains(&address) {
                return Err(OwnerError::Duplicate(address));
            }

            accepted.push(address);
        }

        self.0.extend(accepted);

        Ok(&self.0)
    }

    /// Removes `address`, returning whether it was listed.
    pub fn remove(&mut self, address: &Address) -> bool {
        let len = self.0.len();
        self.0.retain(|owner| owner != address);
        len != self.0.len()
    }

    /// Returns `true` when `address` is already listed.
    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    /// Returns the owners in insertion order.
    pub fn as_slice(&self) -> &[Address] {
        &self.0
    }

    /// Returns the number of owners.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no owner has been added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<OwnerList> for Vec<Address> {
    fn from(OwnerList(owners): OwnerList) -> Self {
        owners
    }
}

/// Errors that can occur while adding owners.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnerError {
    /// The input carried no address.
    #[error("no owner address provided")]
    Empty,

    /// A candidate is not a well-formed address.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// A candidate is already an owner, or appears twice in the input.
    #[error("duplicate owner address: {0}")]
    Duplicate(Address),
}
