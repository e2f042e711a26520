//! # Configuration
//!
//! The server is configured through:
//! - Base configuration file (`base_config.ron`)
//! - Environment variables prefixed with `MULTISIGWALLET_` (override base config)
//!
//! ## Base Configuration
//!
//! The default configuration is loaded from `base_config.ron`:
//!
//! ```ron
//! Config(
//!     app: AppConfig(
//!         listen: "localhost:59060",
//!         cors_allowed_origins: ["*"],
//!         navigation_delay: "3s",
//!         session_ttl: "30m",
//!         dispatch_retention: "10m",
//!     ),
//!     chain: ChainConfig(
//!         chain_id: 31337,
//!         factory_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3",
//!         counter_address: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
//!     ),
//!     connection: ConnectionConfig(
//!         account: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
//!         send_delay: "1s",
//!         confirmation_delay: "2s",
//!         reject_calls: false,
//!     ),
//! )
//! ```
//!
//! ## Environment Variable Overrides
//!
//! Use double underscores (`__`) to override nested configuration fields:
//!
//! ```bash
//! # Override app config
//! export MULTISIGWALLET_APP__LISTEN="0.0.0.0:59060"
//! export MULTISIGWALLET_APP__NAVIGATION_DELAY="5s"
//! export MULTISIGWALLET_APP__SESSION_TTL="1h"
//!
//! # Configure CORS allowed origins
//! export MULTISIGWALLET_APP__CORS_ALLOWED_ORIGINS='["http://localhost:3000"]'
//!
//! # Point at other contracts
//! export MULTISIGWALLET_CHAIN__FACTORY_ADDRESS="0x..."
//!
//! # Make the simulated account decline every signature
//! export MULTISIGWALLET_CONNECTION__REJECT_CALLS="true"
//!
//! # Run the server
//! cargo run --bin multisig-wallet-server
//! ```
//!
//! ## CORS Configuration
//!
//! The `cors_allowed_origins` field controls cross-origin resource sharing:
//! - **Specific origins**: Only listed origins are allowed (recommended for production)
//! - **Wildcard `["*"]`**: All origins are allowed (permissive mode, default for development)
//!
//! When specific origins are configured, the server allows:
//! - Methods: GET, POST, PUT, DELETE, OPTIONS
//! - Headers: Content-Type, Authorization
//! - Credentials: Enabled
//!
//! # Logging
//!
//! Logging is controlled via the `RUST_LOG` environment variable. Defaults to `info` level.
//!
//! The server logs:
//! - **HTTP requests**: Method, path, status code, and duration for all incoming requests
//! - **Dispatches**: Every status change of a dispatched contract call
//! - **Client errors (4xx)**: Logged at `WARN` level with error details
//! - **Server errors (5xx)**: Logged at `ERROR` level with error details
//! - **Not found (404)**: Logged at `INFO` level

use core::str::FromStr;

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use multisig_wallet_domain::address::parse_address;
use multisig_wallet_engine::{
    DispatchEngine,
    connection::{SimulatedConnection, SimulatedConnectionConfig},
};
use multisig_wallet_server::{App, SessionStore, config};
use tokio::{net::TcpListener, signal, task};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Subscriber, subscriber};
use tracing_subscriber::{EnvFilter, Registry, fmt::format::FmtSpan, layer::SubscriberExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = task::spawn_blocking(config::get_configuration).await??;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    subscriber::set_global_default(make_tracing_subscriber(env_filter))?;

    let engine = {
        let connection_config = SimulatedConnectionConfig::builder()
            .account(parse_address(&config.connection.account)?)
            .chain_id(config.chain.chain_id)
            .send_delay(config.connection.send_delay)
            .confirmation_delay(config.connection.confirmation_delay)
            .reject_calls(config.connection.reject_calls)
            .build();

        Arc::new(
            DispatchEngine::new(SimulatedConnection::new(connection_config))
                .with_dispatch_retention(config.app.dispatch_retention)
                .start_connection_runtime(),
        )
    };

    let app = App::builder()
        .engine(Arc::clone(&engine))
        .sessions(SessionStore::new(config.app.session_ttl))
        .factory_address(parse_address(&config.chain.factory_address)?)
        .counter_address(parse_address(&config.chain.counter_address)?)
        .navigation_delay(config.app.navigation_delay)
        .build();

    let axum_handle = {
        let router = multisig_wallet_server::create_router(app);
        let cors = create_cors_layer(&config.app.cors_allowed_origins)?;
        let router = router.layer(TraceLayer::new_for_http()).layer(cors);

        let listener = TcpListener::bind(&config.app.listen)
            .await
            .inspect(|_| tracing::info!("server listening at {}", config.app.listen))?;

        tokio::spawn(async {
            axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
        })
    };

    axum_handle.await??;

    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            engine.stop_connection_runtime().await?;
        },
        Err(_) => tracing::warn!("dispatch engine still in use, skipping graceful stop"),
    }

    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}

fn create_cors_layer<S>(allowed_origins: &[S]) -> anyhow::Result<CorsLayer>
where
    S: AsRef<str>,
{
    if allowed_origins.iter().map(AsRef::as_ref).any(|s| s == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(AsRef::as_ref)
        .map(FromStr::from_str)
        .collect::<Result<_, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Ok(cors)
}

fn make_tracing_subscriber(env_filter: EnvFilter) -> impl Subscriber {
    Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_line_number(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
        )
        .with(env_filter)
}
