//! Signed-in user state supplied by the external auth provider.
//!
//! [`SessionState`] belongs to one client of the lab, never to the server: the
//! client's sign-in flow pushes sessions in with [`SessionState::set`], and the
//! components it builds hold a [`SessionSubscription`] and pull updates
//! explicitly. Dropping the subscription unsubscribes it. The server resolves a
//! fresh [`Session`] per request instead (see `auth`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    /// Bearer token issued by the auth provider.
    pub access_token: String,
    pub profile: Option<Profile>,
}

impl Session {
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.first_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or("User")
    }
}

#[derive(Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<Option<Session>>>,
    subscribers: Arc<AtomicUsize>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionState {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, session: Option<Session>) {
        match &session {
            Some(s) => info!(user_id = %s.user_id, "session updated"),
            None => info!("session cleared"),
        }
        self.tx.send_replace(session);
    }

    pub fn sign_out(&self) {
        self.set(None);
    }

    pub fn subscribe(&self) -> SessionSubscription {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.tx.subscribe();
        let session = rx.borrow_and_update().clone();
        SessionSubscription {
            rx,
            session,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }
}

pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
    session: Option<Session>,
    subscribers: Arc<AtomicUsize>,
}

impl SessionSubscription {
    /// Session as of the last refresh.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Latest published session, without marking it seen.
    pub fn latest(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Pulls the latest session. Returns true if it changed since the last pull.
    pub fn refresh(&mut self) -> bool {
        let changed = self.rx.has_changed().unwrap_or(false);
        if changed {
            self.session = self.rx.borrow_and_update().clone();
        }
        changed
    }

    /// Waits for the next update and applies it.
    pub async fn changed(&mut self) -> Option<&Session> {
        if self.rx.changed().await.is_ok() {
            self.session = self.rx.borrow_and_update().clone();
        }
        self.session.as_ref()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.subscribers.fetch_sub(1, Ordering::SeqCst);
    }
}
