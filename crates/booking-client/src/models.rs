//! Backend projections
//!
//! Transient, read-only views of the entities the backend owns. Unknown
//! fields are ignored and unknown enum values map to an `Unknown` variant so a
//! newer backend never breaks deserialization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular employee
    User,
    /// Campus administrator
    Admin,
    /// Administrator across campuses; sends `X-Campus-Id`
    SuperAdmin,
    /// Role not known to this client
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Whether the role can open the admin panels
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Account role
    pub role: Role,
    /// Home campus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus_id: Option<String>,
    /// Whether the account may sign in
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A campus (tenant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    /// Campus id
    pub id: String,
    /// Display name
    pub name: String,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// IANA time zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// A bookable room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room id
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning campus
    pub campus_id: String,
    /// Seats
    pub capacity: u32,
    /// Floor label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// Equipment (e.g., "projector", "whiteboard")
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Bookings need admin approval
    #[serde(default)]
    pub requires_approval: bool,
    /// Whether the room accepts bookings
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A time range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Start (inclusive)
    pub start: DateTime<Utc>,
    /// End (exclusive)
    pub end: DateTime<Utc>,
    /// Whether the slot is free
    #[serde(default = "default_true")]
    pub available: bool,
}

/// A room's availability for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAvailability {
    /// Room id
    pub room_id: String,
    /// Day the slots belong to
    pub date: NaiveDate,
    /// Slots for the day
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

impl RoomAvailability {
    /// Free slots only
    pub fn free_slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().filter(|slot| slot.available)
    }
}

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Waiting for admin approval
    Pending,
    /// Confirmed
    Confirmed,
    /// Cancelled by the user or an admin
    Cancelled,
    /// Rejected by an admin
    Rejected,
    /// The organizer checked in
    CheckedIn,
    /// The meeting has ended
    Completed,
    /// Released after a missed check-in
    NoShow,
    /// Status not known to this client
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    /// Whether the booking can still be cancelled
    pub fn is_cancellable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// How a booking repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    /// Every `interval` days
    Daily,
    /// Every `interval` weeks
    Weekly,
    /// Every `interval` months
    Monthly,
}

/// Recurrence rule; the backend expands occurrences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    /// Repeat unit
    pub frequency: RecurrenceFrequency,
    /// Units between occurrences
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Last possible occurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Number of occurrences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// A room booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking id
    pub id: String,
    /// Booked room
    pub room_id: String,
    /// Organizer
    pub user_id: String,
    /// Meeting title
    pub title: String,
    /// Meeting description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time
    pub end_time: DateTime<Utc>,
    /// Lifecycle state
    pub status: BookingStatus,
    /// Recurrence rule for a series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    /// Attendee emails
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Room details, when the backend embeds them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
}

/// Waitlist entry state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    /// Queued
    Waiting,
    /// Turned into a booking
    Promoted,
    /// The slot passed
    Expired,
    /// Left by the user
    Cancelled,
    /// Status not known to this client
    #[serde(other)]
    Unknown,
}

/// A place in the queue for a taken slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    /// Entry id
    pub id: String,
    /// Requested room
    pub room_id: String,
    /// Waiting user
    pub user_id: String,
    /// Requested start
    pub start_time: DateTime<Utc>,
    /// Requested end
    pub end_time: DateTime<Utc>,
    /// 1-based queue position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Entry state
    pub status: WaitlistStatus,
}

/// A check-in against a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Check-in id
    pub id: String,
    /// Booking checked into
    pub booking_id: String,
    /// When the check-in happened
    pub checked_in_at: DateTime<Utc>,
}

/// External calendar provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProvider {
    /// Google Calendar
    Google,
    /// Microsoft Outlook
    Microsoft,
}

impl CalendarProvider {
    /// Path segment used by the calendar endpoints
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarProvider::Google => "google",
            CalendarProvider::Microsoft => "microsoft",
        }
    }
}

/// A linked external calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConnection {
    /// Provider
    pub provider: CalendarProvider,
    /// Calendar account email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the connection was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

/// Usage of a single room over an analytics window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUsage {
    /// Room id
    pub room_id: String,
    /// Room name
    pub room_name: String,
    /// Bookings in the window
    pub bookings: u64,
    /// Hours booked in the window
    #[serde(default)]
    pub hours_booked: f64,
}

/// Admin analytics for a date window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// All bookings
    pub total_bookings: u64,
    /// Cancelled bookings
    #[serde(default)]
    pub cancelled_bookings: u64,
    /// Missed check-ins
    #[serde(default)]
    pub no_shows: u64,
    /// Booked share of bookable hours, 0.0 to 1.0
    #[serde(default)]
    pub utilization_rate: f64,
    /// Busiest rooms
    #[serde(default)]
    pub top_rooms: Vec<RoomUsage>,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u32 {
    1
}
