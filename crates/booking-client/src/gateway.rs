//! Authenticated API gateway
//!
//! [`ApiGateway`] wraps the raw [`HttpClient`] and reads credentials from a
//! shared [`SessionContext`]:
//!
//! - every outgoing request gets `Authorization: Bearer <access>` when a
//!   session exists, and `X-Campus-Id` when a campus is selected
//! - a 401 triggers a refresh exchange at `/auth/refresh` followed by exactly
//!   one retry of the original request
//! - when no refresh credential exists, or the exchange fails, the session is
//!   logged out, navigation is reset to login and the original 401 is returned
//!
//! # Example
//!
//! ```rust,no_run
//! use booking_client::{ApiGateway, ClientConfig, GatewayConfig, SessionContext, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = Arc::new(SessionContext::new());
//!     let gateway = ApiGateway::new(
//!         GatewayConfig::new(ClientConfig::new("https://rooms.example.com/api")),
//!         context.clone(),
//!     )?;
//!
//!     // Late binding: the store is installed after the gateway exists
//!     context.bind_session(Arc::new(SessionStore::ephemeral()));
//!
//!     let rooms = gateway.rooms().list(&Default::default()).await?;
//!     println!("{} rooms", rooms.len());
//!     Ok(())
//! }
//! ```

use crate::api::{
    AdminApi, AuthApi, BookingsApi, CalendarApi, CampusesApi, CheckInsApi, RoomsApi, WaitlistApi,
};
use crate::http::{ApiError, ApiRequest, ApiResponse, ClientConfig, HttpClient};
use crate::session::{SessionContext, SessionTokens};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Header carrying the bearer credential
pub const AUTHORIZATION: &str = "Authorization";

/// Header carrying the tenant identifier
pub const CAMPUS_HEADER: &str = "X-Campus-Id";

/// Path of the refresh exchange
pub const REFRESH_PATH: &str = "/auth/refresh";

// =============================================================================
// Configuration
// =============================================================================

/// How concurrent 401s are recovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Every failing request runs its own refresh exchange
    #[default]
    PerRequest,
    /// One exchange at a time; requests that failed with a credential that
    /// has since been replaced retry with the replacement instead
    SingleFlight,
}

/// Configuration for [`ApiGateway`]
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Transport configuration
    pub client: ClientConfig,
    /// Refresh behavior under concurrent 401s
    pub refresh_strategy: RefreshStrategy,
}

impl GatewayConfig {
    /// Create a config for the given transport
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            refresh_strategy: RefreshStrategy::default(),
        }
    }

    /// Set the refresh strategy
    pub fn with_refresh_strategy(mut self, strategy: RefreshStrategy) -> Self {
        self.refresh_strategy = strategy;
        self
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// `{ "data": ... }` wrapper around every backend payload
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

// =============================================================================
// Gateway
// =============================================================================

/// HTTP gateway that authenticates requests and recovers from expired
/// access credentials
///
/// Cloning is cheap; clones share the transport, the context and the
/// refresh lock.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    http: HttpClient,
    context: Arc<SessionContext>,
    strategy: RefreshStrategy,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiGateway {
    /// Create a gateway reading credentials from `context`
    pub fn new(config: GatewayConfig, context: Arc<SessionContext>) -> Result<Self> {
        let http = HttpClient::new(config.client)?;

        Ok(Self {
            http,
            context,
            strategy: config.refresh_strategy,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// The shared session context
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// The underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// The configured refresh strategy
    pub fn refresh_strategy(&self) -> RefreshStrategy {
        self.strategy
    }

    /// Select the campus sent as `X-Campus-Id`; `None` stops sending it
    pub fn set_campus_id(&self, campus_id: Option<String>) {
        self.context.set_campus_id(campus_id);
    }

    /// The selected campus
    pub fn campus_id(&self) -> Option<String> {
        self.context.campus_id()
    }

    /// Attach the session's credentials to a request
    ///
    /// Only adds or overwrites headers, so decorating twice yields one
    /// `Authorization` and at most one `X-Campus-Id`.
    pub fn decorate(&self, request: &mut ApiRequest) {
        if let Some(access_token) = self.context.access_token() {
            request.set_header(AUTHORIZATION, format!("Bearer {}", access_token));
        }

        if let Some(campus_id) = self.context.campus_id() {
            request.set_header(CAMPUS_HEADER, campus_id);
        }
    }

    /// Send an authenticated request
    ///
    /// On a 401 for a request that is not itself a retry, the refresh
    /// credential is exchanged and the request is re-sent once. The retry's
    /// outcome is returned unchanged, including a second 401.
    pub async fn execute(
        &self,
        mut request: ApiRequest,
    ) -> std::result::Result<ApiResponse<Value>, ApiError> {
        self.decorate(&mut request);

        match self.http.send(&request).await {
            Err(error) if error.is_unauthorized() && !request.is_retry() => {
                self.recover(request, error).await
            }
            outcome => outcome,
        }
    }

    /// Send a request without credentials or 401 recovery
    ///
    /// Used for login, registration and the refresh exchange, where a 401
    /// means bad input rather than an expired session.
    pub async fn execute_unauthenticated(
        &self,
        request: ApiRequest,
    ) -> std::result::Result<ApiResponse<Value>, ApiError> {
        self.http.send(&request).await
    }

    /// Send an authenticated request and decode the `data` payload
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        unwrap_envelope(response.data)
    }

    /// Send an unauthenticated request and decode the `data` payload
    pub async fn fetch_unauthenticated<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T> {
        let response = self.execute_unauthenticated(request).await?;
        unwrap_envelope(response.data)
    }

    /// Send an authenticated request, discarding the body
    pub async fn send(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await?;
        Ok(())
    }

    /// Exchange a refresh credential for a new pair
    ///
    /// Posts `{ "refreshToken": ... }` to `/auth/refresh` and expects
    /// `{ "data": { "accessToken", "refreshToken" } }`.
    pub async fn exchange_refresh(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<SessionTokens, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .json_body(&RefreshRequest { refresh_token })
            .map_err(|e| ApiError::parse(format!("Failed to encode refresh request: {}", e)))?;

        let response = self.execute_unauthenticated(request).await?;

        let envelope: Envelope<SessionTokens> = serde_json::from_value(response.data)
            .map_err(|e| ApiError::parse(format!("Invalid refresh response: {}", e)))?;

        Ok(envelope.data)
    }

    async fn recover(
        &self,
        mut request: ApiRequest,
        original: ApiError,
    ) -> std::result::Result<ApiResponse<Value>, ApiError> {
        request.mark_retried();

        let tokens = match self.strategy {
            RefreshStrategy::PerRequest => self.refresh().await,
            RefreshStrategy::SingleFlight => {
                let failed_access = bearer_token(&request).map(str::to_string);
                self.refresh_single_flight(failed_access.as_deref()).await
            }
        };

        let Some(tokens) = tokens else {
            tracing::warn!(path = %request.path, "session could not be refreshed; logging out");
            self.context.end_session().await;
            return Err(original);
        };

        request.set_header(AUTHORIZATION, format!("Bearer {}", tokens.access_token));
        if let Some(campus_id) = self.context.campus_id() {
            request.set_header(CAMPUS_HEADER, campus_id);
        }

        tracing::debug!(path = %request.path, "retrying request with refreshed credentials");
        self.http.send(&request).await
    }

    async fn refresh(&self) -> Option<SessionTokens> {
        let Some(refresh_token) = self.context.refresh_token() else {
            tracing::info!("access credential rejected and no refresh credential held");
            return None;
        };

        match self.exchange_refresh(&refresh_token).await {
            Ok(tokens) => {
                tracing::info!("access credential refreshed");
                self.context.store_tokens(tokens.clone()).await;
                Some(tokens)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh exchange failed");
                None
            }
        }
    }

    async fn refresh_single_flight(&self, failed_access: Option<&str>) -> Option<SessionTokens> {
        let _guard = self.refresh_lock.lock().await;

        // Another request already replaced the credential this one failed with
        if let Some(current) = self.context.tokens() {
            if !current.access_token.is_empty()
                && Some(current.access_token.as_str()) != failed_access
            {
                tracing::debug!("reusing credentials refreshed by a concurrent request");
                return Some(current);
            }
        }

        self.refresh().await
    }

    // =========================================================================
    // Resource clients
    // =========================================================================

    /// Login, registration and the current user
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Rooms and availability
    pub fn rooms(&self) -> RoomsApi<'_> {
        RoomsApi::new(self)
    }

    /// Bookings
    pub fn bookings(&self) -> BookingsApi<'_> {
        BookingsApi::new(self)
    }

    /// Waitlist
    pub fn waitlist(&self) -> WaitlistApi<'_> {
        WaitlistApi::new(self)
    }

    /// Check-ins
    pub fn check_ins(&self) -> CheckInsApi<'_> {
        CheckInsApi::new(self)
    }

    /// Admin panels
    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    /// Campuses
    pub fn campuses(&self) -> CampusesApi<'_> {
        CampusesApi::new(self)
    }

    /// External calendar connections
    pub fn calendar(&self) -> CalendarApi<'_> {
        CalendarApi::new(self)
    }
}

fn bearer_token(request: &ApiRequest) -> Option<&str> {
    request
        .header_value(AUTHORIZATION)
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn unwrap_envelope<T: DeserializeOwned>(data: Value) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_value(data)?;
    Ok(envelope.data)
}
