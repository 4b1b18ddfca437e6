//! Admin endpoints
//!
//! Super-admin sessions scope these calls with `X-Campus-Id`; see
//! [`ApiGateway::set_campus_id`].

use super::{path_segment, require};
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::{AnalyticsSummary, Booking, Role, Room, User};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Room fields for create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    /// Display name
    pub name: String,
    /// Owning campus
    pub campus_id: String,
    /// Seats
    pub capacity: u32,
    /// Floor label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// Equipment
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Bookings need approval
    #[serde(default)]
    pub requires_approval: bool,
}

impl RoomInput {
    /// Check the room before sending it
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require(&self.campus_id, "campusId")?;
        if self.capacity == 0 {
            return Err(Error::InvalidInput("capacity must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct RoleBody {
    role: Role,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveBody {
    is_active: bool,
}

#[derive(Serialize)]
struct ReasonBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// `/admin` endpoints
#[derive(Debug, Clone, Copy)]
pub struct AdminApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    // Users

    /// `GET /admin/users`
    pub async fn users(self) -> Result<Vec<User>> {
        self.gateway.fetch(ApiRequest::get("/admin/users")).await
    }

    /// `PATCH /admin/users/{id}/role`
    pub async fn set_role(self, user_id: &str, role: Role) -> Result<User> {
        let user_id = path_segment(user_id)?;
        if role == Role::Unknown {
            return Err(Error::InvalidInput("role is not assignable".to_string()));
        }
        let request = ApiRequest::patch(format!("/admin/users/{}/role", user_id))
            .json_body(&RoleBody { role })?;
        self.gateway.fetch(request).await
    }

    /// `PATCH /admin/users/{id}/status`
    pub async fn set_active(self, user_id: &str, is_active: bool) -> Result<User> {
        let user_id = path_segment(user_id)?;
        let request = ApiRequest::patch(format!("/admin/users/{}/status", user_id))
            .json_body(&ActiveBody { is_active })?;
        self.gateway.fetch(request).await
    }

    // Rooms

    /// `POST /admin/rooms`
    pub async fn create_room(self, room: &RoomInput) -> Result<Room> {
        room.validate()?;
        let request = ApiRequest::post("/admin/rooms").json_body(room)?;
        self.gateway.fetch(request).await
    }

    /// `PUT /admin/rooms/{id}`
    pub async fn update_room(self, room_id: &str, room: &RoomInput) -> Result<Room> {
        let room_id = path_segment(room_id)?;
        room.validate()?;
        let request = ApiRequest::put(format!("/admin/rooms/{}", room_id)).json_body(room)?;
        self.gateway.fetch(request).await
    }

    /// `DELETE /admin/rooms/{id}`
    pub async fn delete_room(self, room_id: &str) -> Result<()> {
        let room_id = path_segment(room_id)?;
        self.gateway
            .send(ApiRequest::delete(format!("/admin/rooms/{}", room_id)))
            .await
    }

    // Approvals

    /// `GET /admin/bookings/pending`
    pub async fn pending_bookings(self) -> Result<Vec<Booking>> {
        self.gateway.fetch(ApiRequest::get("/admin/bookings/pending")).await
    }

    /// `POST /admin/bookings/{id}/approve`
    pub async fn approve_booking(self, booking_id: &str) -> Result<Booking> {
        let booking_id = path_segment(booking_id)?;
        self.gateway
            .fetch(ApiRequest::post(format!("/admin/bookings/{}/approve", booking_id)))
            .await
    }

    /// `POST /admin/bookings/{id}/reject`
    pub async fn reject_booking(self, booking_id: &str, reason: Option<&str>) -> Result<Booking> {
        let booking_id = path_segment(booking_id)?;
        let request = ApiRequest::post(format!("/admin/bookings/{}/reject", booking_id))
            .json_body(&ReasonBody { reason })?;
        self.gateway.fetch(request).await
    }

    // Analytics

    /// `GET /admin/analytics?startDate=..&endDate=..`
    pub async fn analytics(self, from: NaiveDate, to: NaiveDate) -> Result<AnalyticsSummary> {
        if to < from {
            return Err(Error::InvalidInput("end date must not precede start date".to_string()));
        }

        let request = ApiRequest::get("/admin/analytics")
            .param("startDate", from.format("%Y-%m-%d").to_string())
            .param("endDate", to.format("%Y-%m-%d").to_string());
        self.gateway.fetch(request).await
    }
}
