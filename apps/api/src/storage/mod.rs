//! Supabase storage: a thin PostgREST client with application-level row ownership.
//!
//! Row ownership is NOT enforced by the database. The client validates and carries
//! a user id; every repository query that touches user data appends
//! `user_id=eq.<id>` via [`SupabaseClient::user_filter`].
//!
//! `execute` never retries: any non-2xx status is reported as a failed
//! [`QueryResult`] and the caller decides whether that is fatal.

pub mod affiliate;
pub mod blog_ideas;
pub mod trend_analyses;

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user_id cannot be None or empty")]
    EmptyUserId,

    #[error("Invalid user_id format: {0}. Must be a valid UUID.")]
    InvalidUserId(String),

    #[error("User context not set. Call set_user_context(user_id) first.")]
    MissingUserContext,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

/// Outcome of a single REST call. Mirrors the wire contract
/// `{success, data | error, status_code}`; `status_code` is 0 when no
/// HTTP response was received.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status_code: u16,
    #[serde(skip)]
    body: Option<String>,
}

impl QueryResult {
    fn ok(data: Value, status_code: u16) -> Self {
        Self {
            success: true,
            data,
            error: None,
            status_code,
            body: None,
        }
    }

    fn failed(status_code: u16, body: String) -> Self {
        Self {
            success: false,
            data: Value::Array(Vec::new()),
            error: Some(format!("HTTP {status_code}: {body}")),
            status_code,
            body: Some(body),
        }
    }

    fn transport(message: String) -> Self {
        Self {
            success: false,
            data: Value::Array(Vec::new()),
            error: Some(message),
            status_code: 0,
            body: None,
        }
    }

    /// Converts the result into rows, turning failures into a typed error.
    /// A single JSON object is treated as a one-row result.
    pub fn into_rows(self) -> Result<Vec<Value>, StorageError> {
        if !self.success {
            return Err(match (self.status_code, self.body) {
                (0, _) => StorageError::Request(self.error.unwrap_or_default()),
                (status, body) => StorageError::Http {
                    status,
                    body: body.unwrap_or_default(),
                },
            });
        }
        match self.data {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            row @ Value::Object(_) => Ok(vec![row]),
            other => Err(StorageError::Decode(format!(
                "expected JSON rows, got {other}"
            ))),
        }
    }
}

/// PostgREST client shared by all repositories.
///
/// Cloning is cheap (the inner `reqwest::Client` is reference counted), so each
/// request scopes its own copy with [`SupabaseClient::with_user`] instead of
/// mutating a shared instance.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: String,
    user_id: Option<Uuid>,
}

impl SupabaseClient {
    pub fn new(url: &str, key: &str, timeout_secs: u64) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        let key_value =
            HeaderValue::from_str(key).map_err(|e| StorageError::Config(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| StorageError::Config(e.to_string()))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            user_id: None,
        })
    }

    /// Validates and stores the user id used for row filtering.
    pub fn set_user_context(&mut self, user_id: &str) -> Result<(), StorageError> {
        let id = validate_user_id(user_id)?;
        self.user_id = Some(id);
        debug!("Set user context to: {id}");
        Ok(())
    }

    /// Returns a copy of this client scoped to `user_id`.
    pub fn with_user(&self, user_id: &str) -> Result<Self, StorageError> {
        let mut scoped = self.clone();
        scoped.set_user_context(user_id)?;
        Ok(scoped)
    }

    pub fn require_user(&self) -> Result<Uuid, StorageError> {
        self.user_id.ok_or(StorageError::MissingUserContext)
    }

    /// `user_id=eq.<id>` for the current context.
    pub fn user_filter(&self) -> Result<String, StorageError> {
        Ok(format!("user_id=eq.{}", self.require_user()?))
    }

    /// Executes one REST call against `<rest_url>/<endpoint>`.
    pub async fn execute(&self, method: Method, endpoint: &str, body: Option<&Value>) -> QueryResult {
        if !matches!(
            method,
            Method::GET | Method::POST | Method::PATCH | Method::DELETE
        ) {
            return QueryResult::transport(
                StorageError::UnsupportedMethod(method.to_string()).to_string(),
            );
        }

        let url = format!("{}/{}", self.rest_url, endpoint);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                error!("Request failed: {e}");
                return QueryResult::transport(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        if matches!(status, 200 | 201 | 204 | 206) {
            let data = if text.trim().is_empty() {
                Value::Array(Vec::new())
            } else {
                serde_json::from_str(&text).unwrap_or_else(|_| Value::Array(Vec::new()))
            };
            QueryResult::ok(data, status)
        } else {
            error!("HTTP Error {status} on {method} {endpoint}: {text}");
            QueryResult::failed(status, text)
        }
    }

    pub async fn select(&self, endpoint: &str) -> Result<Vec<Value>, StorageError> {
        self.execute(Method::GET, endpoint, None).await.into_rows()
    }

    pub async fn insert(&self, table: &str, body: &Value) -> Result<Vec<Value>, StorageError> {
        self.execute(Method::POST, table, Some(body)).await.into_rows()
    }

    pub async fn update(&self, endpoint: &str, body: &Value) -> Result<Vec<Value>, StorageError> {
        self.execute(Method::PATCH, endpoint, Some(body))
            .await
            .into_rows()
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Vec<Value>, StorageError> {
        self.execute(Method::DELETE, endpoint, None).await.into_rows()
    }

    /// Reads `trend_analyses?limit=1`. Never fails; the outcome is only logged.
    pub async fn check_connection(&self) -> bool {
        let result = self.execute(Method::GET, "trend_analyses?limit=1", None).await;
        if matches!(result.status_code, 200 | 206) {
            info!("Supabase connection test successful");
            true
        } else {
            warn!(
                "Supabase connection test returned {}: {}",
                result.status_code,
                result.error.unwrap_or_default()
            );
            false
        }
    }
}

/// Parses a user id, rejecting empty and non-UUID input.
pub fn validate_user_id(raw: &str) -> Result<Uuid, StorageError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StorageError::EmptyUserId);
    }
    Uuid::parse_str(trimmed).map_err(|_| StorageError::InvalidUserId(raw.to_string()))
}

/// Percent-encodes a value for use inside a PostgREST filter (`col=eq.<value>`).
pub fn filter_value(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Decodes a column that may hold either native JSON or a JSON document
/// serialized into a text column. Unparseable text yields `fallback`.
pub fn decode_json_column(value: Option<&Value>, fallback: Value) -> Value {
    match value {
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(fallback),
        Some(Value::Null) | None => fallback,
        Some(other) => other.clone(),
    }
}
