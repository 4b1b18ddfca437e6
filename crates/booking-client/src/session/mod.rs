//! Session credentials and the context the gateway reads them from
//!
//! This module implements:
//! - The session credential pair ([`SessionTokens`]) and JWT expiry helpers
//! - The hooks the gateway calls into ([`SessionBinding`], [`LoginNavigator`])
//! - [`SessionContext`], the shared handle the composition root owns and
//!   passes into the gateway
//! - [`SessionStore`], the credential store backed by secure storage
//!
//! # Example
//!
//! ```rust
//! use booking_client::session::{SessionContext, SessionStore, SessionTokens};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let context = Arc::new(SessionContext::new());
//! let store = Arc::new(SessionStore::ephemeral());
//! context.bind_session(store.clone());
//!
//! store.sign_in(SessionTokens::new("A1", "R1")).await?;
//! assert_eq!(context.access_token().as_deref(), Some("A1"));
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::{SessionCallback, SessionStore, SESSION_KEY};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Credentials
// =============================================================================

/// The session credential pair
///
/// Created on login, replaced on silent refresh, destroyed on logout.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    /// Bearer credential attached to every request
    pub access_token: String,
    /// Credential exchanged for a new pair at `/auth/refresh`
    pub refresh_token: String,
}

impl SessionTokens {
    /// Create a credential pair
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Whether a refresh exchange can be attempted
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Expiry of the access credential, if it is a JWT with an `exp` claim
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        jwt_expiration(&self.access_token)
    }

    /// Expiry of the refresh credential, if it is a JWT with an `exp` claim
    pub fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
        jwt_expiration(&self.refresh_token)
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Additional claims
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Parse JWT claims without verifying the signature
///
/// The backend is the only party that can verify its tokens; the client reads
/// claims for informational purposes only.
pub fn parse_jwt_claims(token: &str) -> Result<JwtClaims, jsonwebtoken::errors::Error> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<JwtClaims>(token)?;
    Ok(token_data.claims)
}

/// Get the expiration time from a JWT
///
/// Returns `None` for opaque tokens and tokens without an `exp` claim.
pub fn jwt_expiration(token: &str) -> Option<DateTime<Utc>> {
    let claims = parse_jwt_claims(token).ok()?;
    claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
}

/// Check if a JWT is expired
///
/// Tokens without a readable expiration are treated as expired.
pub fn is_jwt_expired(token: &str) -> bool {
    match jwt_expiration(token) {
        Some(exp_time) => exp_time <= Utc::now(),
        None => true,
    }
}

/// Check if a JWT expires within `threshold`
pub fn is_jwt_expiring_soon(token: &str, threshold: Duration) -> bool {
    match jwt_expiration(token) {
        Some(exp_time) => exp_time <= Utc::now() + threshold,
        None => true,
    }
}

// =============================================================================
// Hooks
// =============================================================================

/// Session lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential pair was stored by login or restore
    SignedIn,
    /// The pair was replaced by a silent refresh
    Refreshed,
    /// The session was destroyed
    SignedOut,
}

/// Live access to the session credential pair
///
/// Installed into a [`SessionContext`] after construction so the HTTP layer
/// and the session store do not depend on each other.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionBinding: Send + Sync {
    /// The current credential pair, if signed in
    fn current(&self) -> Option<SessionTokens>;

    /// Replace the pair after a successful refresh
    async fn replace(&self, tokens: SessionTokens);

    /// Destroy the local session
    async fn logout(&self);
}

/// Resets navigation to the login screen
pub trait LoginNavigator: Send + Sync {
    /// Present the login screen
    fn reset_to_login(&self);
}

impl<F> LoginNavigator for F
where
    F: Fn() + Send + Sync,
{
    fn reset_to_login(&self) {
        self()
    }
}

// =============================================================================
// Context
// =============================================================================

/// Shared session context handed to the gateway
///
/// Owned by the composition root. Holds the bound session, the bound
/// navigator and the tenant (campus) identifier used by super-admin sessions.
#[derive(Default)]
pub struct SessionContext {
    binding: RwLock<Option<Arc<dyn SessionBinding>>>,
    navigator: RwLock<Option<Arc<dyn LoginNavigator>>>,
    campus_id: RwLock<Option<String>>,
}

impl SessionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the credential getter, mutator and logout
    pub fn bind_session(&self, binding: Arc<dyn SessionBinding>) {
        *self.binding.write() = Some(binding);
    }

    /// Install the navigation-reset callback
    pub fn bind_navigator(&self, navigator: Arc<dyn LoginNavigator>) {
        *self.navigator.write() = Some(navigator);
    }

    /// Whether a session binding has been installed
    pub fn is_bound(&self) -> bool {
        self.binding.read().is_some()
    }

    /// Set or clear the tenant (campus) identifier
    pub fn set_campus_id(&self, campus_id: Option<String>) {
        let campus_id = campus_id.filter(|id| !id.trim().is_empty());
        *self.campus_id.write() = campus_id;
    }

    /// The tenant (campus) identifier, if set
    pub fn campus_id(&self) -> Option<String> {
        self.campus_id.read().clone()
    }

    /// The current credential pair
    pub fn tokens(&self) -> Option<SessionTokens> {
        self.binding().and_then(|binding| binding.current())
    }

    /// The current access credential, if non-empty
    pub fn access_token(&self) -> Option<String> {
        self.tokens()
            .map(|t| t.access_token)
            .filter(|t| !t.is_empty())
    }

    /// The current refresh credential, if non-empty
    pub fn refresh_token(&self) -> Option<String> {
        self.tokens()
            .map(|t| t.refresh_token)
            .filter(|t| !t.is_empty())
    }

    /// Store a refreshed pair through the bound mutator
    pub(crate) async fn store_tokens(&self, tokens: SessionTokens) {
        match self.binding() {
            Some(binding) => binding.replace(tokens).await,
            None => tracing::warn!("no session bound; refreshed credentials dropped"),
        }
    }

    /// Log out and send the user back to the login screen
    pub(crate) async fn end_session(&self) {
        if let Some(binding) = self.binding() {
            binding.logout().await;
        }

        let navigator = self.navigator.read().clone();
        match navigator {
            Some(navigator) => navigator.reset_to_login(),
            None => tracing::debug!("no navigator bound; skipping reset to login"),
        }
    }

    fn binding(&self) -> Option<Arc<dyn SessionBinding>> {
        self.binding.read().clone()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("bound", &self.is_bound())
            .field("navigator", &self.navigator.read().is_some())
            .field("campus_id", &self.campus_id())
            .finish()
    }
}
