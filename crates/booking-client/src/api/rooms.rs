//! Room endpoints

use super::path_segment;
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::{Room, RoomAvailability};
use crate::Result;
use chrono::NaiveDate;

/// Filters for the room list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomFilter {
    /// Restrict to one campus
    pub campus_id: Option<String>,
    /// Minimum seats
    pub min_capacity: Option<u32>,
    /// Required amenity
    pub amenity: Option<String>,
    /// Name search
    pub search: Option<String>,
}

impl RoomFilter {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .param_opt("campusId", self.campus_id.clone())
            .param_opt("minCapacity", self.min_capacity.map(|c| c.to_string()))
            .param_opt("amenity", self.amenity.clone())
            .param_opt("search", self.search.clone())
    }
}

/// `/rooms` endpoints
#[derive(Debug, Clone, Copy)]
pub struct RoomsApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> RoomsApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `GET /rooms`
    pub async fn list(self, filter: &RoomFilter) -> Result<Vec<Room>> {
        let request = filter.apply(ApiRequest::get("/rooms"));
        self.gateway.fetch(request).await
    }

    /// `GET /rooms/{id}`
    pub async fn get(self, id: &str) -> Result<Room> {
        let id = path_segment(id)?;
        self.gateway.fetch(ApiRequest::get(format!("/rooms/{}", id))).await
    }

    /// `GET /rooms/{id}/availability?date=YYYY-MM-DD`
    pub async fn availability(self, id: &str, date: NaiveDate) -> Result<RoomAvailability> {
        let id = path_segment(id)?;
        let request = ApiRequest::get(format!("/rooms/{}/availability", id))
            .param("date", date.format("%Y-%m-%d").to_string());
        self.gateway.fetch(request).await
    }
}
