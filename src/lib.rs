//! Roombook
//!
//! Client core of the meeting-room booking app. [`Roombook`] is the
//! composition root: it owns the [`SessionContext`], restores the saved
//! session from secure storage, binds the session store into the context and
//! builds the [`ApiGateway`] every screen talks to.
//!
//! # Example
//!
//! ```rust,no_run
//! use roombook::{FileStore, FileStoreConfig, GatewayConfig, ClientConfig, Roombook};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = Arc::new(FileStore::new(FileStoreConfig::new("secure-store")));
//!     let app = Roombook::open(GatewayConfig::new(ClientConfig::from_env()), vault).await?;
//!
//!     app.set_navigator(|| println!("back to login"));
//!
//!     if !app.is_authenticated() {
//!         app.login("alice@example.com", "hunter2").await?;
//!     }
//!
//!     for booking in app.gateway().bookings().mine().await? {
//!         println!("{} {}", booking.start_time, booking.title);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use booking_client::models::User;
pub use booking_client::{
    ApiGateway, ClientConfig, Error, GatewayConfig, LoginNavigator, RefreshStrategy, Result,
    SessionContext, SessionEvent, SessionStore, SessionTokens,
};
pub use storage::{FileStore, FileStoreConfig, MemoryStore, SecureStore};

use parking_lot::RwLock;
use std::sync::Arc;

/// Application composition root
pub struct Roombook {
    context: Arc<SessionContext>,
    session: Arc<SessionStore>,
    gateway: ApiGateway,
    user: RwLock<Option<User>>,
}

impl Roombook {
    /// Build the client stack over `store`, restoring any saved session
    ///
    /// A saved session that cannot be read from storage is cleared and the
    /// app starts signed out.
    pub async fn open(config: GatewayConfig, store: Arc<dyn SecureStore>) -> Result<Self> {
        let context = Arc::new(SessionContext::new());
        let gateway = ApiGateway::new(config, context.clone())?;
        let session = Arc::new(SessionStore::new(store));

        match session.restore().await {
            Ok(_) => {}
            Err(Error::Storage(e)) => {
                tracing::warn!(error = %e, "saved session unreadable; starting signed out");
                session.sign_out().await?;
            }
            Err(e) => return Err(e),
        }

        context.bind_session(session.clone());

        Ok(Self {
            context,
            session,
            gateway,
            user: RwLock::new(None),
        })
    }

    /// Sign in and store the returned credential pair
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let auth = self.gateway.auth().login(email, password).await?;

        self.session.sign_in(auth.tokens()).await?;
        *self.user.write() = Some(auth.user.clone());

        tracing::info!(user_id = %auth.user.id, "logged in");
        Ok(auth.user)
    }

    /// Sign out
    ///
    /// The server-side revocation is best effort; local credentials are
    /// always cleared.
    pub async fn logout(&self) -> Result<()> {
        if let Some(tokens) = self.session.tokens() {
            if let Err(e) = self.gateway.auth().logout(&tokens.refresh_token).await {
                tracing::warn!(error = %e, "server logout failed; clearing local session anyway");
            }
        }

        *self.user.write() = None;
        self.session.sign_out().await?;

        tracing::info!("logged out");
        Ok(())
    }

    /// Fetch the signed-in user from the backend
    pub async fn refresh_user(&self) -> Result<User> {
        if !self.session.is_authenticated() {
            return Err(Error::NoSession);
        }

        let user = self.gateway.auth().me().await?;
        *self.user.write() = Some(user.clone());
        Ok(user)
    }

    /// The user returned by the last login or [`Roombook::refresh_user`]
    pub fn user(&self) -> Option<User> {
        self.user.read().clone()
    }

    /// Whether a credential pair is held
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Install the reset-to-login navigation callback
    pub fn set_navigator<N>(&self, navigator: N)
    where
        N: LoginNavigator + 'static,
    {
        self.context.bind_navigator(Arc::new(navigator));
    }

    /// Select the campus super-admin requests are scoped to
    pub fn set_campus_id(&self, campus_id: Option<String>) {
        self.context.set_campus_id(campus_id);
    }

    /// The authenticated gateway
    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// The session store
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The shared session context
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }
}

impl std::fmt::Debug for Roombook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roombook")
            .field("context", &self.context)
            .field("session", &self.session)
            .finish()
    }
}
