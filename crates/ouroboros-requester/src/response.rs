//! Formatted response types

use crate::error::{RequesterError, RequesterResult};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;

/// Response body as decoded by the request handler
pub enum ResponseBody {
    /// `application/json` payload
    Json(serde_json::Value),
    /// `text/*` payload
    Text(String),
    /// Any other content type
    Blob(Bytes),
    /// Raw byte stream, produced when the caller asked for `as_stream`
    Stream(BoxStream<'static, RequesterResult<Bytes>>),
    /// No content
    Empty,
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ResponseBody::Text(t) => f.debug_tuple("Text").field(t).finish(),
            ResponseBody::Blob(b) => f.debug_tuple("Blob").field(&b.len()).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
            ResponseBody::Empty => f.write_str("Empty"),
        }
    }
}

impl ResponseBody {
    /// Borrow the JSON payload, if any
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Deserialize a JSON or text payload into a typed value
    pub fn json_as<T: serde::de::DeserializeOwned>(&self) -> RequesterResult<T> {
        match self {
            ResponseBody::Json(v) => Ok(T::deserialize(v)?),
            ResponseBody::Text(t) => Ok(serde_json::from_str(t)?),
            ResponseBody::Blob(b) => Ok(serde_json::from_slice(b)?),
            ResponseBody::Stream(_) => Err(RequesterError::ResponseError(
                "Cannot deserialize a streaming body".to_string(),
            )),
            ResponseBody::Empty => Err(RequesterError::ResponseError(
                "Response has no body".to_string(),
            )),
        }
    }

    /// Collect a streaming body into bytes; other variants are returned as-is
    pub async fn collect(self) -> RequesterResult<Self> {
        match self {
            ResponseBody::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(ResponseBody::Blob(Bytes::from(buf)))
            }
            other => Ok(other),
        }
    }
}

/// Response returned by a request handler
#[derive(Debug)]
pub struct FormattedResponse<T = ResponseBody> {
    pub body: T,
    pub headers: HashMap<String, String>,
    pub status: u16,
}

impl<T> FormattedResponse<T> {
    pub fn new(body: T, headers: HashMap<String, String>, status: u16) -> Self {
        Self {
            body,
            headers,
            status,
        }
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        // Case-insensitive header lookup
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace the body, keeping status and headers
    pub fn map_body<U>(self, f: impl FnOnce(T) -> U) -> FormattedResponse<U> {
        FormattedResponse {
            body: f(self.body),
            headers: self.headers,
            status: self.status,
        }
    }
}

impl FormattedResponse<ResponseBody> {
    /// Deserialize the body into a typed response
    pub fn typed<T: serde::de::DeserializeOwned>(self) -> RequesterResult<FormattedResponse<T>> {
        let body = self.body.json_as()?;
        Ok(FormattedResponse {
            body,
            headers: self.headers,
            status: self.status,
        })
    }
}

/// Convert a reqwest response into a [`FormattedResponse`]
///
/// The body variant follows the content type unless a stream was requested.
pub async fn from_reqwest(
    response: reqwest::Response,
    as_stream: bool,
) -> RequesterResult<FormattedResponse> {
    let status = response.status().as_u16();

    // Extract headers
    let mut headers = HashMap::new();
    for (name, value) in response.headers().iter() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.to_string(), v.to_string());
        }
    }

    let content_type = headers
        .get("content-type")
        .cloned()
        .unwrap_or_default();

    if as_stream {
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(RequesterError::from))
            .boxed();
        return Ok(FormattedResponse::new(ResponseBody::Stream(stream), headers, status));
    }

    let bytes = response.bytes().await?;
    let body = if bytes.is_empty() {
        ResponseBody::Empty
    } else if content_type.contains("application/json") {
        ResponseBody::Json(serde_json::from_slice(&bytes)?)
    } else if content_type.starts_with("text/") {
        ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        ResponseBody::Blob(bytes)
    };

    Ok(FormattedResponse::new(body, headers, status))
}
