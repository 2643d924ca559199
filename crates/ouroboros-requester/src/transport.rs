//! reqwest-backed transport
//!
//! [`ReqwestTransport`] implements both [`OptionsHandler`] and
//! [`RequestHandler`], so one instance can back a whole
//! [`RequesterFactory`](crate::RequesterFactory).

use crate::config::TransportConfig;
use crate::error::{RequesterError, RequesterResult};
use crate::options::{EncodedBody, FormPart, FormPayload, RequestOptions, ResourceOptions};
use crate::requester::{OptionsHandler, RequestHandler};
use crate::response::{from_reqwest, FormattedResponse};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// HTTP transport with connection pooling
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with the given configuration
    pub fn new(config: TransportConfig) -> RequesterResult<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent);

        // Configure redirects
        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        // Configure compression
        builder = builder.gzip(config.gzip).brotli(config.brotli);

        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(TransportInner { client, config }),
        })
    }

    /// Create a transport with default configuration
    pub fn default_transport() -> RequesterResult<Self> {
        Self::new(TransportConfig::default())
    }

    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.inner.config.timeout)
            .field("user_agent", &self.inner.config.user_agent)
            .finish()
    }
}

#[async_trait]
impl OptionsHandler for ReqwestTransport {
    async fn handle(
        &self,
        _resource: &ResourceOptions,
        mut options: RequestOptions,
    ) -> RequesterResult<RequestOptions> {
        options.timeout.get_or_insert(self.inner.config.timeout);
        Ok(options)
    }
}

#[async_trait]
impl RequestHandler for ReqwestTransport {
    async fn send(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> RequesterResult<FormattedResponse> {
        let url = build_url(&options.prefix_url, endpoint, options.search_params.as_deref())?;
        let client = options.agent.as_ref().unwrap_or(&self.inner.client);

        let mut builder = client.request(options.method.into(), url);
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        match &options.body {
            Some(EncodedBody::Json(text)) => builder = builder.body(text.clone()),
            Some(EncodedBody::Form(form)) => builder = builder.multipart(build_form(form)?),
            None => {}
        }

        let pending = execute(builder, endpoint, &options);
        match &options.signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    tracing::debug!(endpoint = %endpoint, "Request cancelled by caller");
                    Err(RequesterError::Cancelled)
                }
                result = pending => result,
            },
            None => pending.await,
        }
    }
}

/// Send the request and read the whole response, body included
async fn execute(
    builder: reqwest::RequestBuilder,
    endpoint: &str,
    options: &RequestOptions,
) -> RequesterResult<FormattedResponse> {
    let start = Instant::now();
    let response = builder.send().await?;

    let status = response.status();
    tracing::debug!(
        method = %options.method,
        endpoint = %endpoint,
        status = status.as_u16(),
        latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Request completed"
    );

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let description = describe_failure(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        let err = RequesterError::Status {
            status: status.as_u16(),
            description,
        };
        tracing::warn!(
            endpoint = %endpoint,
            category = ?err.category(),
            error = %err.sanitized_message(),
            "Request failed"
        );
        return Err(err);
    }

    from_reqwest(response, options.as_stream).await
}

/// Join prefix URL and endpoint with exactly one `/`, then attach the query
pub fn build_url(
    prefix_url: &str,
    endpoint: &str,
    search_params: Option<&str>,
) -> RequesterResult<Url> {
    let base = prefix_url.trim_end_matches('/');
    let path = endpoint.trim_start_matches('/');
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    };

    let mut url = Url::parse(&joined)?;
    if let Some(query) = search_params {
        url.set_query(Some(query));
    }
    Ok(url)
}

fn build_form(payload: &FormPayload) -> RequesterResult<Form> {
    let mut form = Form::new();
    for (name, part) in payload.parts() {
        form = match part {
            FormPart::Text(value) => form.text(name.clone(), value.clone()),
            FormPart::File {
                content,
                file_name,
                mime,
            } => {
                let mut file = Part::bytes(content.to_vec()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    file = file.mime_str(mime)?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

/// Pull a human-readable description out of an error body
fn describe_failure(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => {
            let field = map.get("message").or_else(|| map.get("error"));
            match field {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
                None => Some(body.to_string()),
            }
        }
        _ => Some(body.to_string()),
    }
}
