//! Resource-level configuration and per-call request options

use crate::error::RequesterResult;
use crate::method::HttpMethod;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Loosely-typed configuration or parameter mapping
pub type ConfigMap = serde_json::Map<String, Value>;

/// Window used for rate limits when none is configured
pub const DEFAULT_RATE_LIMIT_DURATION: Duration = Duration::from_secs(60);

// ============================================================================
// Auth header
// ============================================================================

/// Produces the value of the auth header for each request.
#[async_trait]
pub trait AuthHeaderProvider: Send + Sync {
    /// Resolve the header value. Called once per request, never cached.
    async fn header_value(&self) -> RequesterResult<String>;
}

struct FnAuthProvider<F>(F);

#[async_trait]
impl<F, Fut> AuthHeaderProvider for FnAuthProvider<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RequesterResult<String>> + Send + 'static,
{
    async fn header_value(&self) -> RequesterResult<String> {
        (self.0)().await
    }
}

struct StaticAuthProvider(String);

#[async_trait]
impl AuthHeaderProvider for StaticAuthProvider {
    async fn header_value(&self) -> RequesterResult<String> {
        Ok(self.0.clone())
    }
}

/// The single auth header a resource sends, with its value provider
#[derive(Clone)]
pub struct AuthHeader {
    name: String,
    provider: Arc<dyn AuthHeaderProvider>,
}

impl AuthHeader {
    /// Create an auth header backed by a provider
    pub fn new(name: impl Into<String>, provider: impl AuthHeaderProvider + 'static) -> Self {
        Self {
            name: name.into(),
            provider: Arc::new(provider),
        }
    }

    /// Create an auth header from an async closure
    ///
    /// ```ignore
    /// let auth = AuthHeader::from_fn("PRIVATE-TOKEN", || async { Ok(read_token().await) });
    /// ```
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RequesterResult<String>> + Send + 'static,
    {
        Self::new(name, FnAuthProvider(f))
    }

    /// Create an auth header with a fixed value
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, StaticAuthProvider(value.into()))
    }

    /// Header name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the provider for the current header value
    pub async fn resolve(&self) -> RequesterResult<String> {
        self.provider.header_value().await
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Rate limit configuration
// ============================================================================

/// Named rate limit: either a plain ceiling or a ceiling bound to one method
///
/// Deserializes from `10` or `{ "method": "GET", "limit": 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateLimit {
    Ceiling(u32),
    Method { method: HttpMethod, limit: u32 },
}

impl RateLimit {
    /// Maximum number of requests per window
    pub fn limit(&self) -> u32 {
        match self {
            RateLimit::Ceiling(limit) | RateLimit::Method { limit, .. } => *limit,
        }
    }

    /// Method this limit is bound to, if any
    pub fn method(&self) -> Option<HttpMethod> {
        match self {
            RateLimit::Ceiling(_) => None,
            RateLimit::Method { method, .. } => Some(*method),
        }
    }
}

// ============================================================================
// Resource options
// ============================================================================

/// Static configuration shared by every request of a resource
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// Prefix URL for all endpoints (e.g., "https://gitlab.example.com/api/v4")
    pub url: String,

    /// Headers sent with every request
    pub headers: HashMap<String, String>,

    /// Auth header resolved once per request
    pub auth_header: Option<AuthHeader>,

    /// Named rate limits
    pub rate_limits: Option<HashMap<String, RateLimit>>,

    /// Window the rate limits apply to
    pub rate_limit_duration: Option<Duration>,

    /// Shared connection pool handed to the transport
    pub agent: Option<reqwest::Client>,
}

impl ResourceOptions {
    /// Create options for the given prefix URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Add a fixed header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the auth header
    pub fn auth_header(mut self, auth_header: AuthHeader) -> Self {
        self.auth_header = Some(auth_header);
        self
    }

    /// Add a named rate limit
    pub fn rate_limit(mut self, name: impl Into<String>, limit: RateLimit) -> Self {
        self.rate_limits
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), limit);
        self
    }

    /// Set the rate limit window
    pub fn rate_limit_duration(mut self, duration: Duration) -> Self {
        self.rate_limit_duration = Some(duration);
        self
    }

    /// Set the connection pool
    pub fn agent(mut self, client: reqwest::Client) -> Self {
        self.agent = Some(client);
        self
    }

    /// Build options from a loosely-typed configuration mapping
    ///
    /// Recognized keys: `url`, `headers`, `rateLimits`, and
    /// `rateLimitDuration` (seconds). Unknown keys are ignored so the same
    /// mapping can carry settings for other layers.
    pub fn from_config(config: &ConfigMap) -> RequesterResult<Self> {
        let parsed: ResourceConfig = serde_json::from_value(Value::Object(config.clone()))?;
        Ok(Self {
            url: parsed.url,
            headers: parsed.headers,
            rate_limits: parsed.rate_limits,
            rate_limit_duration: parsed.rate_limit_duration.map(Duration::from_secs),
            ..Default::default()
        })
    }

    /// Rate limit window, falling back to [`DEFAULT_RATE_LIMIT_DURATION`]
    pub fn effective_rate_limit_duration(&self) -> Duration {
        self.rate_limit_duration
            .unwrap_or(DEFAULT_RATE_LIMIT_DURATION)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceConfig {
    url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    rate_limits: Option<HashMap<String, RateLimit>>,
    #[serde(default)]
    rate_limit_duration: Option<u64>,
}

// ============================================================================
// Per-call options
// ============================================================================

/// Impersonation target sent in the `sudo` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sudo {
    Name(String),
    Id(u64),
}

impl fmt::Display for Sudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sudo::Name(name) => f.write_str(name),
            Sudo::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for Sudo {
    fn from(name: &str) -> Self {
        Sudo::Name(name.to_string())
    }
}

impl From<String> for Sudo {
    fn from(name: String) -> Self {
        Sudo::Name(name)
    }
}

impl From<u64> for Sudo {
    fn from(id: u64) -> Self {
        Sudo::Id(id)
    }
}

/// One part of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text(String),
    File {
        content: Bytes,
        file_name: String,
        mime: Option<String>,
    },
}

/// Multipart form payload, sent as-is by the transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    parts: Vec<(String, FormPart)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        content: impl Into<Bytes>,
        file_name: impl Into<String>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                content: content.into(),
                file_name: file_name.into(),
                mime: None,
            },
        ));
        self
    }

    /// Append a file field with an explicit mime type
    pub fn file_with_mime(
        mut self,
        name: impl Into<String>,
        content: impl Into<Bytes>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                content: content.into(),
                file_name: file_name.into(),
                mime: Some(mime.into()),
            },
        ));
        self
    }

    pub fn parts(&self) -> &[(String, FormPart)] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Request body supplied by the caller
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Multipart form, forwarded untouched
    Form(Arc<FormPayload>),
    /// Key/value payload, decamelized and sent as JSON
    Structured(ConfigMap),
}

impl From<FormPayload> for RequestBody {
    fn from(form: FormPayload) -> Self {
        RequestBody::Form(Arc::new(form))
    }
}

impl From<Arc<FormPayload>> for RequestBody {
    fn from(form: Arc<FormPayload>) -> Self {
        RequestBody::Form(form)
    }
}

impl From<ConfigMap> for RequestBody {
    fn from(map: ConfigMap) -> Self {
        RequestBody::Structured(map)
    }
}

/// Options a caller passes to a single verb call
#[derive(Debug, Clone, Default)]
pub struct DefaultRequestOptions {
    pub body: Option<RequestBody>,
    pub search_params: Option<ConfigMap>,
    pub sudo: Option<Sudo>,
    pub method: Option<HttpMethod>,
    pub as_stream: bool,
    pub signal: Option<CancellationToken>,
}

impl DefaultRequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replace all search parameters
    pub fn search_params(mut self, params: ConfigMap) -> Self {
        self.search_params = Some(params);
        self
    }

    /// Add a single search parameter
    pub fn search_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.search_params
            .get_or_insert_with(ConfigMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Impersonate another user
    pub fn sudo(mut self, sudo: impl Into<Sudo>) -> Self {
        self.sudo = Some(sudo.into());
        self
    }

    /// Override the HTTP method
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Ask the transport for a streaming body
    pub fn as_stream(mut self, as_stream: bool) -> Self {
        self.as_stream = as_stream;
        self
    }

    /// Attach a cancellation signal
    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

// ============================================================================
// Transport-ready options
// ============================================================================

/// Body after encoding
#[derive(Debug, Clone)]
pub enum EncodedBody {
    /// Serialized JSON text
    Json(String),
    /// Multipart form, same allocation the caller supplied
    Form(Arc<FormPayload>),
}

/// Normalized options handed to the transport
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub method: HttpMethod,
    /// Encoded query string without the leading `?`
    pub search_params: Option<String>,
    pub prefix_url: String,
    pub body: Option<EncodedBody>,
    pub as_stream: bool,
    pub signal: Option<CancellationToken>,
    pub agent: Option<reqwest::Client>,
}

impl RequestOptions {
    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        // Case-insensitive header lookup
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequesterError;

    #[test]
    fn test_resource_options_builder() {
        let options = ResourceOptions::new("https://gitlab.example.com/api/v4")
            .header("user-agent", "gitlab-sync")
            .rate_limit("projects/*/issues", RateLimit::Ceiling(300))
            .rate_limit_duration(Duration::from_secs(30));

        assert_eq!(options.url, "https://gitlab.example.com/api/v4");
        assert_eq!(options.headers.get("user-agent").map(String::as_str), Some("gitlab-sync"));
        assert_eq!(options.rate_limits.as_ref().map(HashMap::len), Some(1));
        assert_eq!(options.effective_rate_limit_duration(), Duration::from_secs(30));
        assert!(options.auth_header.is_none());
    }

    #[test]
    fn test_default_rate_limit_duration() {
        let options = ResourceOptions::new("https://x");
        assert_eq!(options.effective_rate_limit_duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_deserialize() {
        let limits: HashMap<String, RateLimit> = serde_json::from_str(
            r#"{ "**": 3000, "projects/*/import": { "method": "POST", "limit": 6 } }"#,
        )
        .unwrap();

        assert_eq!(limits["**"], RateLimit::Ceiling(3000));
        assert_eq!(limits["**"].method(), None);
        assert_eq!(limits["projects/*/import"].limit(), 6);
        assert_eq!(limits["projects/*/import"].method(), Some(HttpMethod::Post));
    }

    #[test]
    fn test_resource_options_from_config() {
        let config = match serde_json::json!({
            "url": "https://gitlab.example.com/api/v4",
            "headers": { "user-agent": "gitlab-sync" },
            "rateLimits": { "**": 3000 },
            "rateLimitDuration": 30,
            "camelize": true,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let options = ResourceOptions::from_config(&config).unwrap();
        assert_eq!(options.url, "https://gitlab.example.com/api/v4");
        assert_eq!(options.headers["user-agent"], "gitlab-sync");
        assert_eq!(options.rate_limits.unwrap()["**"], RateLimit::Ceiling(3000));
        assert_eq!(options.rate_limit_duration, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_resource_options_from_config_requires_url() {
        let err = ResourceOptions::from_config(&ConfigMap::new()).unwrap_err();
        assert!(matches!(err, RequesterError::Serialization(_)));
    }

    #[test]
    fn test_sudo_display() {
        assert_eq!(Sudo::from(42u64).to_string(), "42");
        assert_eq!(Sudo::from("root").to_string(), "root");
    }

    #[test]
    fn test_request_options_header_lookup() {
        let mut options = RequestOptions::default();
        options
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        assert_eq!(options.header("content-type"), Some("application/json"));
        assert_eq!(options.header("accept"), None);
    }

    #[test]
    fn test_call_options_builder() {
        let options = DefaultRequestOptions::new()
            .search_param("perPage", 20)
            .search_param("labels", vec!["bug"])
            .sudo("root")
            .as_stream(true);

        let params = options.search_params.as_ref().unwrap();
        assert_eq!(params["perPage"], 20);
        assert_eq!(options.sudo, Some(Sudo::Name("root".to_string())));
        assert!(options.as_stream);
        assert!(options.method.is_none());
    }

    #[tokio::test]
    async fn test_auth_header_from_fn() {
        let auth = AuthHeader::from_fn("PRIVATE-TOKEN", || async { Ok("glpat-123".to_string()) });
        assert_eq!(auth.name(), "PRIVATE-TOKEN");
        assert_eq!(auth.resolve().await.unwrap(), "glpat-123");

        let failing = AuthHeader::from_fn("PRIVATE-TOKEN", || async {
            Err(RequesterError::Auth("token expired".to_string()))
        });
        assert!(matches!(failing.resolve().await, Err(RequesterError::Auth(_))));
    }

    #[tokio::test]
    async fn test_auth_header_fixed() {
        let auth = AuthHeader::fixed("Authorization", "Bearer abc");
        assert_eq!(auth.resolve().await.unwrap(), "Bearer abc");
        assert!(!format!("{:?}", auth).contains("abc"));
    }
}
