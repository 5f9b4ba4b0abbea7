//! HTTP transport for the job board API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{ApiResponse, RequestBody, RequestOptions, TokenStore};

/// Called with the login URL after a 401 has cleared the token.
pub type UnauthorizedHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Thin wrapper over `reqwest` that injects auth, enforces the timeout and
/// normalizes responses and errors.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    default_headers: HeaderMap,
    tokens: Arc<dyn TokenStore>,
    login_url: String,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.request_timeout,
            default_headers: header_map(&config.default_headers),
            tokens,
            login_url: config.login_url.clone(),
            on_unauthorized: None,
        })
    }

    /// Installs the hook run after a 401 (the "redirect to login" step).
    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == Auth Token ==
    pub fn set_auth_token(&self, token: Option<&str>) {
        self.tokens.set(token.map(str::to_string));
    }

    pub fn auth_token(&self) -> Option<String> {
        self.tokens.get()
    }

    // == Verbs ==
    pub async fn get(&self, path: &str, options: &RequestOptions) -> Result<ApiResponse> {
        self.request(Method::GET, path, RequestBody::Empty, options)
            .await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::POST, path, body.into(), options).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::PUT, path, body.into(), options).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::PATCH, path, body.into(), options)
            .await
    }

    pub async fn delete(&self, path: &str, options: &RequestOptions) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, RequestBody::Empty, options)
            .await
    }

    /// Resolves `path` against the base URL unless it is already absolute.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        let full = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&full).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", full, e)))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.resolve_url(path)?;
        debug!("{} {}", method, url);

        let mut headers = self.default_headers.clone();
        headers.extend(header_map(&options.headers));
        if body.is_multipart() {
            headers.remove(CONTENT_TYPE);
        }

        let mut builder = self.client.request(method, url).headers(headers);

        let query = options.query_pairs();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = self.tokens.get() {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
            RequestBody::Empty => builder,
        };

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response.text().await.map_err(|e| self.classify(e))?;
        let parsed = if text.is_empty() {
            Ok(Value::Null)
        } else if is_json {
            serde_json::from_str::<Value>(&text)
        } else {
            Ok(Value::String(text.clone()))
        };

        if status.is_success() {
            let data = parsed.map_err(|e| ApiError::Parse {
                status: status.as_u16(),
                message: e.to_string(),
            })?;
            return Ok(ApiResponse {
                data,
                status: status.as_u16(),
                status_text,
            });
        }

        // A malformed error body must not hide the status
        let body = parsed.unwrap_or_else(|_| {
            let message = if text.is_empty() { &status_text } else { &text };
            json!({ "message": message })
        });

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }

        Err(ApiError::Http {
            status: status.as_u16(),
            status_text,
            body,
        })
    }

    fn handle_unauthorized(&self) {
        warn!("Received 401, clearing auth token");
        self.tokens.set(None);
        if let Some(hook) = &self.on_unauthorized {
            hook(&self.login_url);
        }
    }

    fn classify(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_connect() {
            ApiError::Offline(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

/// Builds a header map, skipping pairs that are not valid header syntax.
fn header_map(pairs: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("Skipping invalid header '{}'", name),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MemoryTokenStore;

    fn client(base_url: &str) -> HttpClient {
        let config = ClientConfig::default().with_base_url(base_url);
        HttpClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let client = client("http://localhost:5000/api/");

        assert_eq!(
            client.resolve_url("/jobs").unwrap().as_str(),
            "http://localhost:5000/api/jobs"
        );
        assert_eq!(
            client.resolve_url("jobs/1").unwrap().as_str(),
            "http://localhost:5000/api/jobs/1"
        );
        assert_eq!(
            client.resolve_url("https://cdn.test/logo.png").unwrap().as_str(),
            "https://cdn.test/logo.png"
        );
    }

    #[test]
    fn test_resolve_invalid_base() {
        let client = client("not a url");
        assert!(matches!(
            client.resolve_url("/jobs"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_header_map_skips_invalid() {
        let map = header_map(&[
            ("Accept".to_string(), "application/json".to_string()),
            ("Bad Header".to_string(), "x".to_string()),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn test_auth_token_roundtrip() {
        let client = client("http://localhost");
        client.set_auth_token(Some("t0ken"));
        assert_eq!(client.auth_token(), Some("t0ken".to_string()));
        client.set_auth_token(None);
        assert_eq!(client.auth_token(), None);
    }
}
