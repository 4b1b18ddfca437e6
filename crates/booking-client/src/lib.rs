//! Roombook API client
//!
//! This crate provides the authenticated HTTP gateway for the room-booking
//! backend, session credential management, the domain projections returned by
//! the backend, and typed clients for each resource.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod gateway;
pub mod http;
pub mod models;
pub mod session;

pub use gateway::{ApiGateway, GatewayConfig, RefreshStrategy};
pub use http::{ApiError, ApiRequest, ApiResponse, ClientConfig, HttpClient};
pub use session::{
    LoginNavigator, SessionBinding, SessionContext, SessionEvent, SessionStore, SessionTokens,
};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client could not be constructed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend (or the transport) reported a failure
    #[error("API error: {0}")]
    Api(#[from] http::ApiError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation requires a signed-in session
    #[error("No active session - please login first")]
    NoSession,
}

impl Error {
    /// The HTTP status behind this error, if it came from the backend
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status()),
            _ => None,
        }
    }
}
