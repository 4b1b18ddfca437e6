//! Campus endpoints

use super::{path_segment, require};
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::Campus;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Campus fields for create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusInput {
    /// Display name
    pub name: String,
    /// Street address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// IANA time zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl CampusInput {
    /// Check the campus before sending it
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")
    }
}

/// `/campuses` endpoints
#[derive(Debug, Clone, Copy)]
pub struct CampusesApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> CampusesApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `GET /campuses`
    pub async fn list(self) -> Result<Vec<Campus>> {
        self.gateway.fetch(ApiRequest::get("/campuses")).await
    }

    /// `POST /campuses`
    pub async fn create(self, campus: &CampusInput) -> Result<Campus> {
        campus.validate()?;
        let request = ApiRequest::post("/campuses").json_body(campus)?;
        self.gateway.fetch(request).await
    }

    /// `PUT /campuses/{id}`
    pub async fn update(self, id: &str, campus: &CampusInput) -> Result<Campus> {
        let id = path_segment(id)?;
        campus.validate()?;
        let request = ApiRequest::put(format!("/campuses/{}", id)).json_body(campus)?;
        self.gateway.fetch(request).await
    }
}
