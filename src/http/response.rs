//! Request and response shapes for the HTTP client.

use reqwest::multipart::Form;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::{to_params, CacheParams};
use crate::error::{ApiError, Result};

// == Api Response ==
/// Successful response: parsed JSON, or the raw text for non-JSON bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
}

impl ApiResponse {
    /// Decodes `data` into the caller's type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| ApiError::Parse {
            status: self.status,
            message: e.to_string(),
        })
    }
}

// == Request Body ==
/// Body of a mutating request.
pub enum RequestBody {
    /// Serialized as JSON with the default content type
    Json(Value),
    /// File upload; the default JSON content type is dropped so the client
    /// can set a boundary-aware one
    Multipart(Form),
    Empty,
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        serde_json::to_value(data)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Request(format!("body could not be serialized: {}", e)))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        RequestBody::Multipart(form)
    }
}

// == Request Options ==
/// Per-request query parameters and extra headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: CacheParams,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        self.params = to_params(params);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Query string pairs: strings verbatim, other values as compact JSON,
    /// nulls omitted.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), rendered)
            })
            .collect()
    }
}
