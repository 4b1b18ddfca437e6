//! External calendar endpoints

use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::{CalendarConnection, CalendarProvider};
use crate::Result;
use serde::{Deserialize, Serialize};

/// OAuth consent URL for linking a calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationUrl {
    /// URL to open in the system browser
    pub url: String,
}

/// `/calendar` endpoints
#[derive(Debug, Clone, Copy)]
pub struct CalendarApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> CalendarApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `GET /calendar/connections`
    pub async fn connections(self) -> Result<Vec<CalendarConnection>> {
        self.gateway.fetch(ApiRequest::get("/calendar/connections")).await
    }

    /// `GET /calendar/{provider}/auth-url`
    pub async fn authorization_url(self, provider: CalendarProvider) -> Result<AuthorizationUrl> {
        self.gateway
            .fetch(ApiRequest::get(format!("/calendar/{}/auth-url", provider.as_str())))
            .await
    }

    /// `DELETE /calendar/{provider}`
    pub async fn disconnect(self, provider: CalendarProvider) -> Result<()> {
        self.gateway
            .send(ApiRequest::delete(format!("/calendar/{}", provider.as_str())))
            .await
    }
}
