//! In-memory onboarding sessions.

use core::time::Duration;

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::Address;
use chrono::{DateTime, TimeDelta, Utc};
use multisig_wallet_domain::{Timestamps, screen::Onboarding};
use multisig_wallet_engine::DispatchHandle;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The state of one user going through onboarding.
#[derive(Debug)]
pub(crate) struct Session {
    onboarding: Onboarding,
    opened_wallet: Option<Address>,
    dispatch: Option<DispatchHandle>,
    timestamps: Timestamps,
}

impl Session {
    fn new() -> Self {
        Self {
            onboarding: Onboarding::new(),
            opened_wallet: None,
            dispatch: None,
            timestamps: Timestamps::now(),
        }
    }

    pub(crate) fn onboarding(&self) -> &Onboarding {
        &self.onboarding
    }

    pub(crate) fn onboarding_mut(&mut self) -> &mut Onboarding {
        &mut self.onboarding
    }

    /// The wallet whose dashboard the session switched to, if any.
    pub(crate) fn opened_wallet(&self) -> Option<Address> {
        self.opened_wallet
    }

    pub(crate) fn open_wallet(&mut self, wallet: Address) {
        self.opened_wallet = Some(wallet);
    }

    /// The deployment of the reviewed request, once dispatched.
    pub(crate) fn dispatch(&self) -> Option<&DispatchHandle> {
        self.dispatch.as_ref()
    }

    pub(crate) fn set_dispatch(&mut self, dispatch: DispatchHandle) {
        self.dispatch = Some(dispatch);
    }

    pub(crate) fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.timestamps.updated_at() >= ttl
    }
}

/// Default time a session survives without being updated.
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Sessions shared by every request handler.
///
/// A session that has not been updated for the store's TTL is expired: it can no longer be
/// read or updated, and it is removed the next time a session is created.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: TimeDelta,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionStore {
    /// Creates an empty store whose sessions expire `ttl` after their last update.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Returns the number of stored sessions, expired ones not yet removed included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` when no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub(crate) async fn create<T>(&self, f: impl FnOnce(Uuid, &Session) -> T) -> T {
        let id = Uuid::new_v4();
        let session = Session::new();
        let output = f(id, &session);

        let mut sessions = self.sessions.write().await;

        let stored = sessions.len();
        sessions.retain(|_, session| !session.is_expired(Utc::now(), self.ttl));
        let expired = stored - sessions.len();

        sessions.insert(id, session);

        tracing::info!(%id, expired, "session created");

        output
    }

    pub(crate) async fn read<T>(&self, id: Uuid, f: impl FnOnce(&Session) -> T) -> Option<T> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|session| !session.is_expired(Utc::now(), self.ttl))
            .map(f)
    }

    /// Runs `f` on the session and marks it as updated.
    pub(crate) async fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut sessions = self.sessions.write().await;

        if sessions.get(&id)?.is_expired(Utc::now(), self.ttl) {
            sessions.remove(&id);
            tracing::info!(%id, "session expired");
            return None;
        }

        sessions.get_mut(&id).map(|session| {
            let output = f(session);
            session.timestamps.touch();
            output
        })
    }

    /// Switches the session to the created wallet's dashboard `delay` after the deployment is
    /// confirmed.
    ///
    /// Nothing happens when the deployment fails.
    pub(crate) fn navigate_on_creation(&self, id: Uuid, mut dispatch: DispatchHandle, delay: Duration) {
        let sessions = self.clone();

        tokio::spawn(async move {
            let Some(wallet) = dispatch.wait_settled().await.navigation_target() else {
                return;
            };

            tokio::time::sleep(delay).await;

            if sessions.update(id, |session| session.open_wallet(wallet)).await.is_some() {
                tracing::info!(%id, %wallet, "session navigated to created wallet");
            }
        });
    }
}
