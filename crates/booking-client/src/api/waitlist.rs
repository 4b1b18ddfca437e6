//! Waitlist endpoints

use super::{path_segment, require};
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::WaitlistEntry;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to queue for a taken slot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitlist {
    /// Requested room
    pub room_id: String,
    /// Requested start
    pub start_time: DateTime<Utc>,
    /// Requested end
    pub end_time: DateTime<Utc>,
}

impl JoinWaitlist {
    /// Check the request before sending it
    pub fn validate(&self) -> Result<()> {
        require(&self.room_id, "roomId")?;
        if self.end_time <= self.start_time {
            return Err(Error::InvalidInput("end time must be after start time".to_string()));
        }
        Ok(())
    }
}

/// `/waitlist` endpoints
#[derive(Debug, Clone, Copy)]
pub struct WaitlistApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> WaitlistApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `GET /waitlist/my`
    pub async fn mine(self) -> Result<Vec<WaitlistEntry>> {
        self.gateway.fetch(ApiRequest::get("/waitlist/my")).await
    }

    /// `POST /waitlist`
    pub async fn join(self, request: &JoinWaitlist) -> Result<WaitlistEntry> {
        request.validate()?;
        let request = ApiRequest::post("/waitlist").json_body(request)?;
        self.gateway.fetch(request).await
    }

    /// `DELETE /waitlist/{id}`
    pub async fn leave(self, id: &str) -> Result<()> {
        let id = path_segment(id)?;
        self.gateway.send(ApiRequest::delete(format!("/waitlist/{}", id))).await
    }
}
