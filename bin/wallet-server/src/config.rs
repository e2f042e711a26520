//! Configuration management for the multisig wallet server.
//!
//! This module provides configuration loading from both base configuration file
//! and environment variables. Environment variables override the base configuration
//! and use the prefix `MULTISIGWALLET_`.

use core::time::Duration;

use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Loads the application configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys.
/// For example, `MULTISIGWALLET_APP__LISTEN` corresponds to `app.listen`.
///
/// # Errors
///
/// If the configuration could not be loaded or parsed
pub fn get_configuration() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(
            Environment::with_prefix(Config::CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all application settings.
#[derive(Deserialize)]
pub struct Config {
    /// Application-specific configuration
    pub app: AppConfig,

    /// Deployed contracts configuration
    pub chain: ChainConfig,

    /// Simulated wallet connection configuration
    pub connection: ConnectionConfig,
}

/// Application-specific configuration settings.
#[derive(Deserialize)]
pub struct AppConfig {
    /// The address to listen on (e.g., "0.0.0.0:59060")
    pub listen: String,

    /// CORS allowed origins (e.g., ["http://localhost:3000", "https://example.com"])
    /// Use ["*"] to allow all origins
    pub cors_allowed_origins: Vec<String>,

    /// Delay between a confirmed wallet creation and the switch to its dashboard
    #[serde(with = "humantime_serde")]
    pub navigation_delay: Duration,

    /// How long a session survives without being updated
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,

    /// How long a settled dispatch can still be looked up
    #[serde(with = "humantime_serde")]
    pub dispatch_retention: Duration,
}

/// Deployed contracts configuration settings.
#[derive(Deserialize)]
pub struct ChainConfig {
    /// The chain the contracts are deployed on
    pub chain_id: u64,

    /// Address of the wallet factory contract
    pub factory_address: String,

    /// Address of the demonstration counter contract
    pub counter_address: String,
}

/// Simulated wallet connection settings.
#[derive(Deserialize)]
pub struct ConnectionConfig {
    /// The connected account
    pub account: String,

    /// How long the account takes to sign a call
    #[serde(with = "humantime_serde")]
    pub send_delay: Duration,

    /// How long a broadcast transaction takes to be included
    #[serde(with = "humantime_serde")]
    pub confirmation_delay: Duration,

    /// Decline every call, as if the account refused to sign
    pub reject_calls: bool,
}

impl Config {
    const CONFIG_ENV_PREFIX: &str = "MULTISIGWALLET";
}
