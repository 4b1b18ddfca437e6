//! Booking endpoints

use super::{path_segment, require};
use crate::gateway::ApiGateway;
use crate::http::ApiRequest;
use crate::models::{Booking, Recurrence};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// New booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    /// Room to book
    pub room_id: String,
    /// Meeting title
    pub title: String,
    /// Meeting description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time
    pub end_time: DateTime<Utc>,
    /// Attendee emails
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    /// Repeat rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

impl CreateBooking {
    /// Create a one-off booking
    pub fn new(
        room_id: impl Into<String>,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            title: title.into(),
            description: None,
            start_time,
            end_time,
            attendees: Vec::new(),
            recurrence: None,
        }
    }

    /// Make the booking repeat
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Check the booking before sending it
    pub fn validate(&self) -> Result<()> {
        require(&self.room_id, "roomId")?;
        require(&self.title, "title")?;

        if self.end_time <= self.start_time {
            return Err(Error::InvalidInput("end time must be after start time".to_string()));
        }

        if let Some(recurrence) = &self.recurrence {
            if recurrence.interval == 0 {
                return Err(Error::InvalidInput(
                    "recurrence interval must be positive".to_string(),
                ));
            }
            if recurrence.until.is_some_and(|until| until < self.start_time) {
                return Err(Error::InvalidInput(
                    "recurrence must end after the first occurrence".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct CancelBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// `/bookings` endpoints
#[derive(Debug, Clone, Copy)]
pub struct BookingsApi<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> BookingsApi<'a> {
    pub(crate) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// `GET /bookings/my`
    pub async fn mine(self) -> Result<Vec<Booking>> {
        self.gateway.fetch(ApiRequest::get("/bookings/my")).await
    }

    /// `GET /bookings/{id}`
    pub async fn get(self, id: &str) -> Result<Booking> {
        let id = path_segment(id)?;
        self.gateway.fetch(ApiRequest::get(format!("/bookings/{}", id))).await
    }

    /// `POST /bookings`
    ///
    /// Rooms requiring approval come back as `Pending`.
    pub async fn create(self, booking: &CreateBooking) -> Result<Booking> {
        booking.validate()?;
        let request = ApiRequest::post("/bookings").json_body(booking)?;
        self.gateway.fetch(request).await
    }

    /// `POST /bookings/{id}/cancel`
    pub async fn cancel(self, id: &str, reason: Option<&str>) -> Result<Booking> {
        let id = path_segment(id)?;
        let request = ApiRequest::post(format!("/bookings/{}/cancel", id))
            .json_body(&CancelBody { reason })?;
        self.gateway.fetch(request).await
    }

    /// `GET /bookings/calendar?start=..&end=..`
    pub async fn calendar(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Booking>> {
        if to <= from {
            return Err(Error::InvalidInput("end must be after start".to_string()));
        }

        let request = ApiRequest::get("/bookings/calendar")
            .param("start", from.to_rfc3339())
            .param("end", to.to_rfc3339());
        self.gateway.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecurrenceFrequency;
    use chrono::{Duration, TimeZone};

    fn standup() -> CreateBooking {
        let start = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        CreateBooking::new("r1", "Standup", start, start + Duration::minutes(15))
    }

    #[test]
    fn test_valid_booking() {
        assert!(standup().validate().is_ok());
    }

    #[test]
    fn test_booking_requires_title() {
        let mut booking = standup();
        booking.title = " ".to_string();
        assert!(matches!(booking.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_booking_end_after_start() {
        let mut booking = standup();
        booking.end_time = booking.start_time;
        assert!(matches!(booking.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_recurrence_interval_must_be_positive() {
        let booking = standup().with_recurrence(Recurrence {
            frequency: RecurrenceFrequency::Weekly,
            interval: 0,
            until: None,
            count: Some(4),
        });
        assert!(matches!(booking.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_booking_serialization() {
        let json = serde_json::to_value(standup()).unwrap();
        assert_eq!(json["roomId"], "r1");
        assert_eq!(json["startTime"], "2026-10-19T09:00:00Z");
        assert!(json.get("recurrence").is_none());
        assert!(json.get("attendees").is_none());
    }

    #[test]
    fn test_cancel_body() {
        let with_reason = serde_json::to_string(&CancelBody { reason: Some("moved") }).unwrap();
        assert_eq!(with_reason, r#"{"reason":"moved"}"#);

        let without = serde_json::to_string(&CancelBody { reason: None }).unwrap();
        assert_eq!(without, "{}");
    }
}
