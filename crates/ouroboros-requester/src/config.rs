//! Transport configuration

use std::time::Duration;

/// Configuration for the reqwest transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout applied to requests that do not carry their own
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Enable gzip compression
    pub gzip: bool,

    /// Enable brotli compression
    pub brotli: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            follow_redirects: true,
            max_redirects: 10,
            user_agent: format!("ouroboros-requester/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
        }
    }
}

impl TransportConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set timeout from seconds
    ///
    /// Negative, NaN or out-of-range values leave the timeout unchanged.
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        if let Ok(timeout) = Duration::try_from_secs_f64(secs) {
            self.timeout = timeout;
        }
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set max idle connections per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set idle connection timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Set maximum redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable/disable gzip compression
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    /// Enable/disable brotli compression
    pub fn brotli(mut self, enabled: bool) -> Self {
        self.brotli = enabled;
        self
    }
}
