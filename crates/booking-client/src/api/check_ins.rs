//! Check-in endpoints

use super::{path_segment, require_id};
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::CheckIn;
use crate::Result;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckInBody<'a> {
    booking_id: &'a str,
}

/// `/check-ins` endpoints
#[derive(Debug, Clone, Copy)]
pub struct CheckInsApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> CheckInsApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `POST /check-ins`
    pub async fn check_in(self, booking_id: &str) -> Result<CheckIn> {
        require_id(booking_id)?;
        let request = ApiRequest::post("/check-ins").json_body(&CheckInBody { booking_id })?;
        self.gateway.fetch(request).await
    }

    /// `GET /check-ins/booking/{id}`; `None` when nobody has checked in
    pub async fn for_booking(self, booking_id: &str) -> Result<Option<CheckIn>> {
        let booking_id = path_segment(booking_id)?;
        self.gateway
            .fetch(ApiRequest::get(format!("/check-ins/booking/{}", booking_id)))
            .await
    }
}
