//! Typed clients for the backend resources
//!
//! Each client borrows the [`ApiGateway`](crate::ApiGateway) and maps one
//! resource's endpoints to methods. Inputs are checked locally before any
//! request is sent; failures surface as [`Error::InvalidInput`](crate::Error::InvalidInput).

mod admin;
mod auth;
mod bookings;
mod calendar;
mod campuses;
mod check_ins;
mod rooms;
mod waitlist;

pub use admin::{AdminApi, RoomInput};
pub use auth::{AuthApi, AuthSession, LoginRequest, RegisterRequest};
pub use bookings::{BookingsApi, CreateBooking};
pub use calendar::{AuthorizationUrl, CalendarApi};
pub use campuses::{CampusInput, CampusesApi};
pub use check_ins::CheckInsApi;
pub use rooms::{RoomFilter, RoomsApi};
pub use waitlist::{JoinWaitlist, WaitlistApi};

use crate::{Error, Result};

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn require_id(id: &str) -> Result<()> {
    require(id, "id")
}

/// Percent-encode an id for use as a single path segment
fn path_segment(id: &str) -> Result<String> {
    require_id(id)?;
    if id == "." || id == ".." {
        return Err(Error::InvalidInput(format!("invalid id: {}", id)));
    }
    Ok(urlencoding::encode(id).into_owned())
}
