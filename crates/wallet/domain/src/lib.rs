//! Domain types for the multisig wallet client.
//!
//! This crate provides the pure, side-effect free core of the wallet client: address parsing,
//! owner list accumulation, wallet creation and transaction request validation, the typed
//! contract calls handed to a connection, the onboarding screen state machine and the wallet
//! dashboard models.

pub mod address;
pub mod call;
pub mod dashboard;
pub mod owners;
pub mod request;
pub mod screen;
pub mod tx;
pub mod validation;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;

/// Timestamp metadata for tracking entity creation and modification times.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct Timestamps {
    /// The timestamp when the entity was created.
    created_at: DateTime<Utc>,
    /// The timestamp when the entity was last updated.
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Creates timestamps where both creation and update times are `now`.
    pub fn now() -> Self {
        let now = Utc::now();
        Self { created_at: now, updated_at: now }
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the entity as updated now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
