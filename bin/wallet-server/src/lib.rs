#![allow(missing_docs)]

pub mod config;

mod error;
mod payload;
mod routes;
mod session;

pub use self::session::SessionStore;

use core::time::Duration;

use std::sync::Arc;

use alloy_primitives::Address;
use axum::{Router, routing};
use bon::Builder;
use multisig_wallet_engine::{Connection, DispatchEngine, NAVIGATION_DELAY, Started};

pub fn create_router<C>(app: App<C>) -> Router
where
    C: Connection,
{
    Router::new()
        .route("/health", routing::get(routes::health))
        .route("/api/v1/route/resolve", routing::post(routes::resolve_route))
        .route("/api/v1/wallet/validate", routing::post(routes::validate_wallet))
        .route("/api/v1/session/create", routing::post(routes::create_session::<C>))
        .route("/api/v1/session/details", routing::post(routes::get_session_details::<C>))
        .route("/api/v1/session/action", routing::post(routes::apply_session_action::<C>))
        .route("/api/v1/session/owners/add", routing::post(routes::add_session_owners::<C>))
        .route("/api/v1/session/owners/remove", routing::post(routes::remove_session_owner::<C>))
        .route("/api/v1/session/form/update", routing::post(routes::update_session_form::<C>))
        .route("/api/v1/wallet/details", routing::post(routes::get_wallet_details::<C>))
        .route("/api/v1/wallet/tx/list", routing::post(routes::list_wallet_tx::<C>))
        .route("/api/v1/wallet/tx/submit", routing::post(routes::submit_wallet_tx::<C>))
        .route("/api/v1/counter/set", routing::post(routes::set_counter_number::<C>))
        .route("/api/v1/counter/get", routing::post(routes::get_counter_number::<C>))
        .route("/api/v1/dispatch/status", routing::post(routes::get_dispatch_status::<C>))
        .with_state(app)
}

#[derive(Builder)]
pub struct App<C> {
    engine: Arc<DispatchEngine<C, Started>>,

    #[builder(default)]
    sessions: SessionStore,

    factory_address: Address,
    counter_address: Address,

    #[builder(default = NAVIGATION_DELAY)]
    navigation_delay: Duration,
}

impl<C> Clone for App<C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            sessions: self.sessions.clone(),
            factory_address: self.factory_address,
            counter_address: self.counter_address,
            navigation_delay: self.navigation_delay,
        }
    }
}
