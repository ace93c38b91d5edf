//! Read-only view of the authentication collaborator.
//!
//! Token storage and refresh live outside the engine. The engine only asks,
//! before every operation, whether it is authenticated and with which bearer
//! credential.

use tokio::sync::watch;

pub trait AuthProvider: Send + Sync {
    fn credential(&self) -> Option<String>;
    fn is_authenticated(&self) -> bool;
}

/// Fixed credential, for one-shot hosts such as the CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    credential: Option<String>,
}

impl StaticAuth {
    pub fn new(credential: impl Into<String>) -> Self {
        StaticAuth {
            credential: Some(credential.into()),
        }
    }

    pub fn anonymous() -> Self {
        StaticAuth::default()
    }
}

impl AuthProvider for StaticAuth {
    fn credential(&self) -> Option<String> {
        self.credential.clone()
    }

    fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub access_token: Option<String>,
    pub user_email: Option<String>,
}

/// Mutable auth state owned by the host, observable through [`AuthStore::subscribe`].
#[derive(Debug)]
pub struct AuthStore {
    tx: watch::Sender<AuthState>,
}

impl Default for AuthStore {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(AuthState::default());
        AuthStore { tx }
    }
}

impl AuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_auth(&self, token: impl Into<String>, email: impl Into<String>) {
        self.tx.send_replace(AuthState {
            is_authenticated: true,
            access_token: Some(token.into()),
            user_email: Some(email.into()),
        });
    }

    pub fn clear_auth(&self) {
        self.tx.send_replace(AuthState::default());
    }

    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}

impl AuthProvider for AuthStore {
    fn credential(&self) -> Option<String> {
        self.tx.borrow().access_token.clone()
    }

    fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated
    }
}
