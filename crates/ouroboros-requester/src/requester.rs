//! Requester factory
//!
//! Binds the default option builder to a pluggable transport. The transport
//! supplies two pieces: an [`OptionsHandler`] that adjusts the normalized
//! options and a [`RequestHandler`] that performs the call. The factory then
//! hands out [`Requester`]s exposing the five HTTP verbs.
//!
//! # Example
//!
//! ```ignore
//! use ouroboros_requester::{create_requester_fn, ReqwestTransport, ResourceOptions};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(ReqwestTransport::default_transport()?);
//! let requester_fn = create_requester_fn(transport.clone(), transport);
//!
//! let projects = requester_fn(ResourceOptions::new("https://gitlab.example.com/api/v4"));
//! let response = projects.get("projects", None).await?;
//! ```

use crate::defaults::default_options_handler;
use crate::error::RequesterResult;
use crate::method::HttpMethod;
use crate::options::{DefaultRequestOptions, RequestOptions, ResourceOptions};
use crate::response::FormattedResponse;
use async_trait::async_trait;
use std::sync::Arc;

/// Transport-specific post-processing of normalized options
#[async_trait]
pub trait OptionsHandler: Send + Sync {
    async fn handle(
        &self,
        resource: &ResourceOptions,
        options: RequestOptions,
    ) -> RequesterResult<RequestOptions>;
}

/// Performs the actual network call
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn send(&self, endpoint: &str, options: RequestOptions)
        -> RequesterResult<FormattedResponse>;
}

/// Options handler that returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOptionsHandler;

#[async_trait]
impl OptionsHandler for IdentityOptionsHandler {
    async fn handle(
        &self,
        _resource: &ResourceOptions,
        options: RequestOptions,
    ) -> RequesterResult<RequestOptions> {
        Ok(options)
    }
}

#[async_trait]
impl<T: OptionsHandler + ?Sized> OptionsHandler for Arc<T> {
    async fn handle(
        &self,
        resource: &ResourceOptions,
        options: RequestOptions,
    ) -> RequesterResult<RequestOptions> {
        (**self).handle(resource, options).await
    }
}

#[async_trait]
impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    async fn send(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> RequesterResult<FormattedResponse> {
        (**self).send(endpoint, options).await
    }
}

/// Creates [`Requester`]s sharing one pair of handlers
#[derive(Clone)]
pub struct RequesterFactory {
    options_handler: Arc<dyn OptionsHandler>,
    request_handler: Arc<dyn RequestHandler>,
}

impl RequesterFactory {
    pub fn new(
        options_handler: impl OptionsHandler + 'static,
        request_handler: impl RequestHandler + 'static,
    ) -> Self {
        Self {
            options_handler: Arc::new(options_handler),
            request_handler: Arc::new(request_handler),
        }
    }

    /// Create a requester bound to one resource's configuration
    pub fn create(&self, resource: ResourceOptions) -> Requester {
        Requester {
            resource: Arc::new(resource),
            options_handler: Arc::clone(&self.options_handler),
            request_handler: Arc::clone(&self.request_handler),
        }
    }
}

impl std::fmt::Debug for RequesterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequesterFactory").finish_non_exhaustive()
    }
}

/// Function form of [`RequesterFactory`]: handlers in, requester constructor out
pub fn create_requester_fn(
    options_handler: impl OptionsHandler + 'static,
    request_handler: impl RequestHandler + 'static,
) -> impl Fn(ResourceOptions) -> Requester + Send + Sync + Clone {
    let factory = RequesterFactory::new(options_handler, request_handler);
    move |resource| factory.create(resource)
}

/// Five-verb request interface for one resource
#[derive(Clone)]
pub struct Requester {
    resource: Arc<ResourceOptions>,
    options_handler: Arc<dyn OptionsHandler>,
    request_handler: Arc<dyn RequestHandler>,
}

impl Requester {
    /// Resource configuration this requester was created with
    pub fn resource(&self) -> &ResourceOptions {
        &self.resource
    }

    /// Normalize, post-process, and send one request
    ///
    /// The verb always wins over any method set in `options`. Handler errors
    /// are returned without wrapping.
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        options: Option<DefaultRequestOptions>,
    ) -> RequesterResult<FormattedResponse> {
        let options = options.unwrap_or_default().method(method);

        tracing::trace!(method = %method, endpoint = %endpoint, "Dispatching request");

        let defaults = default_options_handler(&self.resource, options).await?;
        let prepared = self.options_handler.handle(&self.resource, defaults).await?;
        self.request_handler.send(endpoint, prepared).await
    }

    /// Send a GET request
    pub async fn get(
        &self,
        endpoint: &str,
        options: Option<DefaultRequestOptions>,
    ) -> RequesterResult<FormattedResponse> {
        self.request(HttpMethod::Get, endpoint, options).await
    }

    /// Send a POST request
    pub async fn post(
        &self,
        endpoint: &str,
        options: Option<DefaultRequestOptions>,
    ) -> RequesterResult<FormattedResponse> {
        self.request(HttpMethod::Post, endpoint, options).await
    }

    /// Send a PUT request
    pub async fn put(
        &self,
        endpoint: &str,
        options: Option<DefaultRequestOptions>,
    ) -> RequesterResult<FormattedResponse> {
        self.request(HttpMethod::Put, endpoint, options).await
    }

    /// Send a PATCH request
    pub async fn patch(
        &self,
        endpoint: &str,
        options: Option<DefaultRequestOptions>,
    ) -> RequesterResult<FormattedResponse> {
        self.request(HttpMethod::Patch, endpoint, options).await
    }

    /// Send a DELETE request
    pub async fn delete(
        &self,
        endpoint: &str,
        options: Option<DefaultRequestOptions>,
    ) -> RequesterResult<FormattedResponse> {
        self.request(HttpMethod::Delete, endpoint, options).await
    }
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("url", &self.resource.url)
            .finish_non_exhaustive()
    }
}
