//! Requester error types and handling

use thiserror::Error;

/// Errors surfaced by the option builder, the handlers, and the transport
#[derive(Error, Debug)]
pub enum RequesterError {
    /// Auth header provider failed to produce a value
    #[error("Auth header error: {0}")]
    Auth(String),

    /// A caller-supplied options or request handler failed
    #[error("Handler error: {0}")]
    Handler(String),

    /// Invalid request configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Body serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("Request failed with status {status}: {description}")]
    Status { status: u16, description: String },

    /// Caller cancelled the request through its signal
    #[error("Request cancelled")]
    Cancelled,

    /// Response could not be read
    #[error("Response error: {0}")]
    ResponseError(String),

    /// Generic reqwest error
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type for requester operations
pub type RequesterResult<T> = Result<T, RequesterError>;

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credential lookup failures
    Auth,
    /// Connection-related errors (DNS, TCP, TLS)
    Connection,
    /// Timeout errors
    Timeout,
    /// Invalid request construction
    Request,
    /// Response parsing or status errors
    Response,
    /// Cancelled by the caller
    Cancelled,
    /// Unknown/other errors
    Unknown,
}

impl RequesterError {
    /// Categorize the error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            RequesterError::Auth(_) => ErrorCategory::Auth,
            RequesterError::InvalidRequest(_)
            | RequesterError::Serialization(_)
            | RequesterError::UrlParse(_) => ErrorCategory::Request,
            RequesterError::Status { .. } | RequesterError::ResponseError(_) => {
                ErrorCategory::Response
            }
            RequesterError::Cancelled => ErrorCategory::Cancelled,
            RequesterError::Handler(_) => ErrorCategory::Unknown,
            RequesterError::Reqwest(e) => {
                if e.is_connect() {
                    ErrorCategory::Connection
                } else if e.is_timeout() {
                    ErrorCategory::Timeout
                } else if e.is_request() || e.is_builder() {
                    ErrorCategory::Request
                } else if e.is_decode() || e.is_body() {
                    ErrorCategory::Response
                } else {
                    ErrorCategory::Unknown
                }
            }
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RequesterError::Status { status, .. } => Some(*status),
            RequesterError::Reqwest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Sanitize error message (remove sensitive info like credentials, internal IPs)
    pub fn sanitized_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Sanitize error messages by removing sensitive information
fn sanitize_error_message(msg: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static URL_CREDS_RE: OnceLock<Regex> = OnceLock::new();
    static INTERNAL_IP_RE: OnceLock<Regex> = OnceLock::new();
    static AUTH_HEADER_RE: OnceLock<Regex> = OnceLock::new();

    let url_creds_re = URL_CREDS_RE
        .get_or_init(|| Regex::new(r"https?://[^@:/\s]+:[^@\s]+@").expect("valid regex"));
    let internal_ip_re = INTERNAL_IP_RE.get_or_init(|| {
        Regex::new(r"\b(10\.|172\.(1[6-9]|2[0-9]|3[01])\.|192\.168\.)\d+\.\d+\b")
            .expect("valid regex")
    });
    // Private-Token and Job-Token are the usual auth header names for API tokens
    let auth_header_re = AUTH_HEADER_RE.get_or_init(|| {
        Regex::new(
            r"(?i)(authorization:\s*bearer|bearer|private[_-]?token|job[_-]?token|api[_-]?key|token)\s*[:=]?\s*\S+",
        )
        .expect("valid regex")
    });

    let sanitized = url_creds_re.replace_all(msg, "https://[REDACTED]@");
    let sanitized = internal_ip_re.replace_all(&sanitized, "[INTERNAL_IP]");
    let sanitized = auth_header_re.replace_all(&sanitized, "$1: [REDACTED]");

    sanitized.to_string()
}
