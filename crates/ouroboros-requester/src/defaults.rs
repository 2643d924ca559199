//! Default option builder
//!
//! Turns a resource's static configuration plus one call's options into
//! transport-ready [`RequestOptions`].

use crate::case::decamelize_map;
use crate::error::RequesterResult;
use crate::options::{
    DefaultRequestOptions, EncodedBody, RequestBody, RequestOptions, ResourceOptions,
};
use crate::query::format_query;

/// Build transport-ready options for a single call.
///
/// The resource options are only read; headers are copied before any
/// per-call header is added. When an auth header is configured its provider
/// is awaited exactly once, and a provider error is returned as-is.
pub async fn default_options_handler(
    resource: &ResourceOptions,
    options: DefaultRequestOptions,
) -> RequesterResult<RequestOptions> {
    let DefaultRequestOptions {
        body,
        search_params,
        sudo,
        method,
        as_stream,
        signal,
    } = options;

    let mut request = RequestOptions {
        headers: resource.headers.clone(),
        method: method.unwrap_or_default(),
        as_stream,
        signal,
        prefix_url: resource.url.clone(),
        agent: resource.agent.clone(),
        ..Default::default()
    };

    if let Some(sudo) = sudo {
        request.headers.insert("sudo".to_string(), sudo.to_string());
    }

    match body {
        Some(RequestBody::Form(form)) => {
            request.body = Some(EncodedBody::Form(form));
        }
        Some(RequestBody::Structured(map)) => {
            let json = serde_json::to_string(&decamelize_map(map))?;
            request.body = Some(EncodedBody::Json(json));
            request
                .headers
                .insert("content-type".to_string(), "application/json".to_string());
        }
        None => {}
    }

    if let Some(auth) = &resource.auth_header {
        let value = auth.resolve().await?;
        request.headers.insert(auth.name().to_string(), value);
    }

    if let Some(params) = search_params {
        let query = format_query(&params);
        if !query.is_empty() {
            request.search_params = Some(query);
        }
    }

    tracing::debug!(
        method = %request.method,
        prefix_url = %request.prefix_url,
        has_body = request.body.is_some(),
        has_query = request.search_params.is_some(),
        "Built request options"
    );

    Ok(request)
}
