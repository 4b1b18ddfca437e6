//! HTTP transport for the booking backend
//!
//! This module provides the request/response types, the error type carrying
//! the final HTTP outcome, client configuration, and the raw [`HttpClient`]
//! that the gateway wraps. Nothing here knows about credentials.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Types
// =============================================================================

/// Failure reported by the backend or the transport
///
/// `status` is the HTTP status code, or `0` when no response was received
/// (`NetworkError`) or the body could not be decoded (`ParseError`).
///
/// # Examples
/// ```
/// use booking_client::http::ApiError;
///
/// let error = ApiError::new(401, "Unauthorized", "Token expired");
/// assert!(error.is_unauthorized());
/// assert!(!error.is_network_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    status: u16,
    /// Error code (e.g., "Unauthorized", "NetworkError")
    code: String,
    /// Human-readable error message
    message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// A request that never produced a response
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, "NetworkError", message)
    }

    /// A response whose body could not be decoded
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(0, "ParseError", message)
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP 401
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// No response was received
    pub fn is_network_error(&self) -> bool {
        self.status == 0 && self.code == "NetworkError"
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {} - {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request to the backend
///
/// Header names are case-insensitive: setting a header replaces any existing
/// header with the same name regardless of case.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g., "/rooms")
    pub path: String,
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// Request headers
    headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
    /// Content type of `body`
    pub content_type: Option<String>,
    /// Set once the gateway has re-issued this request after a refresh
    retried: bool,
}

impl ApiRequest {
    /// Create a request with an empty body
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: HashMap::new(),
            body: None,
            content_type: None,
            retried: false,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a PATCH request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter when `value` is present
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(key, value);
        self
    }

    /// Set a header in place, replacing any same-named header
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove_header(&key);
        self.headers.insert(key, value.into());
    }

    /// Remove a header by name
    pub fn remove_header(&mut self, key: &str) -> Option<String> {
        let existing = self
            .headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case(key))
            .cloned()?;
        self.headers.remove(&existing)
    }

    /// Look up a header by name
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All headers on the request
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Set a raw request body
    pub fn body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.body = Some(body);
        self.content_type = Some("application/json".to_string());
        Ok(self)
    }

    /// Whether this request is already a post-refresh retry
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    /// Flag this request as a retry; it will not be refreshed again
    pub fn mark_retried(&mut self) {
        self.retried = true;
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Successful response from the backend
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self { status, headers, data }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_ascii_lowercase())
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "ROOMBOOK_API_URL";

/// Environment variable setting a request timeout in seconds
pub const ENV_API_TIMEOUT_SECS: &str = "ROOMBOOK_API_TIMEOUT_SECS";

/// Configuration for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to
    pub base_url: String,
    /// Request timeout; `None` leaves the transport default in place
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: String,
    /// Headers included in every request unless the request overrides them
    pub default_headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: None,
            user_agent: format!("Roombook/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Build a config from `ROOMBOOK_API_URL` and `ROOMBOOK_API_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.to_string();
            }
        }

        match lookup(ENV_API_TIMEOUT_SECS).map(|raw| raw.trim().parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
            Some(_) => {
                tracing::warn!("ignoring invalid {}", ENV_API_TIMEOUT_SECS);
            }
            None => {}
        }

        config
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Raw HTTP client for the booking backend
///
/// Sends [`ApiRequest`]s as-is; authentication is layered on top by
/// [`crate::gateway::ApiGateway`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self { client: builder.build()?, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Absolute URL for a request path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send a request and decode the JSON body
    ///
    /// Non-2xx responses become [`ApiError`]s carrying the status; an empty
    /// success body decodes as `null`.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse<Value>, ApiError> {
        let url = self.url(&request.path);

        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            retry = request.is_retry(),
            "sending request"
        );

        let mut req = self.client.request(request.method.to_reqwest(), &url);

        if !request.params.is_empty() {
            req = req.query(&request.params);
        }

        for (key, value) in &self.config.default_headers {
            if request.header_value(key).is_none() {
                req = req.header(key, value);
            }
        }

        for (key, value) in request.headers() {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            if let Some(content_type) = &request.content_type {
                req = req.header("Content-Type", content_type);
            }
            req = req.body(body.clone());
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Request failed: {}", e)))?;

        parse_response(response).await
    }
}

async fn parse_response(response: reqwest::Response) -> Result<ApiResponse<Value>, ApiError> {
    let status = response.status();

    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        if let Ok(value_str) = value.to_str() {
            headers.insert(key.to_string(), value_str.to_string());
        }
    }

    let body = response
        .text()
        .await
        .map_err(|e| ApiError::network(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), &body));
    }

    let data = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(format!("Failed to parse JSON: {}", e)))?
    };

    Ok(ApiResponse::new(status.as_u16(), headers, data))
}

/// Build an error from a failure body
///
/// Accepts `{ "error": "...", "message": "..." }`, `{ "error": { "message" } }`
/// and anything else as plain text.
fn error_from_body(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<Value>(body).ok();

    let code = parsed
        .as_ref()
        .and_then(|v| {
            v.get("error")
                .and_then(Value::as_str)
                .or_else(|| v.get("code").and_then(Value::as_str))
        })
        .map(str::to_string);

    let message = parsed.as_ref().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .or_else(|| v.get("error").and_then(|e| e.get("message")).and_then(Value::as_str))
            .map(str::to_string)
    });

    let code = code.unwrap_or_else(|| default_code(status).to_string());
    let message = message.unwrap_or_else(|| format!("HTTP {}: {}", status, body));

    ApiError::new(status, code, message)
}

fn default_code(status: u16) -> &'static str {
    match status {
        400 => "BadRequest",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "NotFound",
        409 => "Conflict",
        422 => "UnprocessableEntity",
        429 => "TooManyRequests",
        500..=599 => "ServerError",
        _ => "Unknown",
    }
}

// =============================================================================
// Tests
// =============================================================================
