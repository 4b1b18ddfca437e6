//! Authentication endpoints

use super::require;
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::User;
use crate::session::SessionTokens;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl LoginRequest {
    /// Create a login request
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        require(&self.email, "email")?;
        require(&self.password, "password")
    }
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Home campus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campus_id: Option<String>,
}

impl RegisterRequest {
    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require(&self.email, "email")?;
        require(&self.password, "password")
    }
}

/// Payload of a successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// Access credential
    pub access_token: String,
    /// Refresh credential
    pub refresh_token: String,
    /// The signed-in user
    pub user: User,
}

impl AuthSession {
    /// The credential pair to store
    pub fn tokens(&self) -> SessionTokens {
        SessionTokens::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutBody<'a> {
    refresh_token: &'a str,
}

/// `/auth` endpoints
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `POST /auth/login`
    ///
    /// Sent without credentials; a 401 here is a wrong password and never
    /// ends the current session.
    pub async fn login(self, email: &str, password: &str) -> Result<AuthSession> {
        let credentials = LoginRequest::new(email, password);
        credentials.validate()?;
        let request = ApiRequest::post("/auth/login").json_body(&credentials)?;
        self.gateway.fetch_unauthenticated(request).await
    }

    /// `POST /auth/register`
    pub async fn register(self, request: &RegisterRequest) -> Result<AuthSession> {
        request.validate()?;
        let request = ApiRequest::post("/auth/register").json_body(request)?;
        self.gateway.fetch_unauthenticated(request).await
    }

    /// `GET /auth/me`
    pub async fn me(self) -> Result<User> {
        self.gateway.fetch(ApiRequest::get("/auth/me")).await
    }

    /// `POST /auth/logout`, revoking the refresh credential server-side
    ///
    /// Carries the current bearer but bypasses the refresh cycle; a 401 here
    /// is returned as-is and never forces a logout.
    pub async fn logout(self, refresh_token: &str) -> Result<()> {
        let mut request =
            ApiRequest::post("/auth/logout").json_body(&LogoutBody { refresh_token })?;
        self.gateway.decorate(&mut request);
        self.gateway.execute_unauthenticated(request).await?;
        Ok(())
    }
}
