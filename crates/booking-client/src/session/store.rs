//! Session store backed by secure storage
//!
//! [`SessionStore`] holds the live credential pair in memory and mirrors it to
//! a [`SecureStore`] under [`SESSION_KEY`]. It is the [`SessionBinding`] the
//! composition root installs into the gateway's [`SessionContext`].
//!
//! # Example
//!
//! ```rust,no_run
//! use booking_client::session::{SessionEvent, SessionStore, SessionTokens};
//! use std::sync::Arc;
//! use storage::{FileStore, FileStoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = FileStore::new(FileStoreConfig::new("secure-store"));
//!     let store = SessionStore::new(Arc::new(vault));
//!
//!     store.on_session_event(|event| {
//!         if event == SessionEvent::SignedOut {
//!             println!("signed out");
//!         }
//!     });
//!
//!     if store.restore().await?.is_none() {
//!         store.sign_in(SessionTokens::new("access", "refresh")).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! [`SessionContext`]: super::SessionContext

use super::{SessionBinding, SessionEvent, SessionTokens};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use storage::{MemoryStore, SecureStore};

/// Storage key the credential pair is saved under
pub const SESSION_KEY: &str = "session";

/// Callback function type for session events
pub type SessionCallback = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Credential store for the signed-in user
///
/// Writers are login ([`SessionStore::sign_in`]), silent refresh
/// ([`SessionBinding::replace`]) and logout ([`SessionStore::sign_out`]).
pub struct SessionStore {
    /// Live credential pair
    tokens: RwLock<Option<SessionTokens>>,
    /// Secure storage the pair is mirrored to
    storage: Arc<dyn SecureStore>,
    /// Session event callbacks
    callbacks: RwLock<Vec<SessionCallback>>,
}

impl SessionStore {
    /// Create a store persisting to `storage`
    pub fn new(storage: Arc<dyn SecureStore>) -> Self {
        Self {
            tokens: RwLock::new(None),
            storage,
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Create a store that keeps credentials in memory only
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Load the saved credential pair, if any
    ///
    /// A saved pair that cannot be decoded, or whose refresh credential is a
    /// JWT that has already expired, is deleted instead of restored.
    pub async fn restore(&self) -> Result<Option<SessionTokens>> {
        let Some(raw) = self.storage.get(SESSION_KEY).await? else {
            return Ok(None);
        };

        let tokens: SessionTokens = match serde_json::from_str(&raw) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable saved session");
                self.storage.remove(SESSION_KEY).await?;
                return Ok(None);
            }
        };

        let refresh_expired = tokens
            .refresh_expires_at()
            .is_some_and(|exp| exp <= Utc::now());

        if refresh_expired || !tokens.has_refresh_token() {
            tracing::info!("saved session can no longer be refreshed; discarding");
            self.storage.remove(SESSION_KEY).await?;
            return Ok(None);
        }

        *self.tokens.write() = Some(tokens.clone());
        tracing::info!("session restored");
        self.emit(SessionEvent::SignedIn);

        Ok(Some(tokens))
    }

    /// Store the pair returned by a successful login
    ///
    /// The pair only goes live once it is saved; a storage failure leaves
    /// the store signed out.
    pub async fn sign_in(&self, tokens: SessionTokens) -> Result<()> {
        self.persist(&tokens).await?;
        *self.tokens.write() = Some(tokens);

        tracing::info!("session created");
        self.emit(SessionEvent::SignedIn);
        Ok(())
    }

    /// Destroy the session in memory and in storage
    pub async fn sign_out(&self) -> Result<()> {
        let had_session = self.tokens.write().take().is_some();
        let removed = self.storage.remove(SESSION_KEY).await;

        if had_session {
            tracing::info!("session destroyed");
            self.emit(SessionEvent::SignedOut);
        }

        removed.map_err(Into::into)
    }

    /// The current credential pair
    pub fn tokens(&self) -> Option<SessionTokens> {
        self.tokens.read().clone()
    }

    /// Whether a credential pair is held
    pub fn is_authenticated(&self) -> bool {
        self.tokens.read().is_some()
    }

    /// Register a session event callback
    pub fn on_session_event<F>(&self, callback: F)
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Arc::new(callback));
    }

    async fn persist(&self, tokens: &SessionTokens) -> Result<()> {
        let json = serde_json::to_string(tokens)?;
        self.storage.set(SESSION_KEY, &json).await?;
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        let callbacks = self.callbacks.read().clone();
        for callback in callbacks {
            callback(event);
        }
    }
}

#[async_trait]
impl SessionBinding for SessionStore {
    fn current(&self) -> Option<SessionTokens> {
        self.tokens()
    }

    async fn replace(&self, tokens: SessionTokens) {
        *self.tokens.write() = Some(tokens.clone());

        if let Err(e) = self.persist(&tokens).await {
            tracing::error!(error = %e, "failed to persist refreshed session");
        }

        tracing::info!("session refreshed");
        self.emit(SessionEvent::Refreshed);
    }

    async fn logout(&self) {
        if let Err(e) = self.sign_out().await {
            tracing::error!(error = %e, "failed to clear saved session");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
