//! Response boundary.
//!
//! Handlers answer with an [`http::Response`] carrying a [`Bytes`] body. The
//! dispatcher forwards status, headers and body as they are and never looks
//! inside the body. [`IntoResponse`] lets handlers return plain text or JSON
//! values directly.

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::StatusCode;
use serde::Serialize;

use crate::error::DispatchError;

/// The response type produced by handlers.
pub type Response = http::Response<Bytes>;

/// Builds a `text/plain` response.
#[must_use]
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    with_content_type(
        status,
        Bytes::from(body.into()),
        "text/plain; charset=utf-8",
    )
}

/// Builds an `application/json` response from an already encoded body.
#[must_use]
pub fn json_response(status: StatusCode, body: Bytes) -> Response {
    with_content_type(status, body, "application/json")
}

/// Serializes `data` into an `application/json` response.
///
/// # Errors
///
/// Returns [`DispatchError::Handler`] if serialization fails.
pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Result<Response, DispatchError> {
    let body = serde_json::to_vec(data)
        .map_err(|e| DispatchError::handler_with_source("JSON serialization failed", e))?;
    Ok(json_response(status, Bytes::from(body)))
}

/// Reads a response body as text, replacing invalid UTF-8.
#[must_use]
pub fn body_text(response: &Response) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

fn with_content_type(status: StatusCode, body: Bytes, content_type: &'static str) -> Response {
    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Conversion of handler return values into a [`Response`].
///
/// # Example
///
/// ```
/// use hermes_core::IntoResponse;
///
/// let response = "done".into_response();
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"done");
/// ```
pub trait IntoResponse {
    /// Converts `self` into a response.
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        text_response(StatusCode::OK, self)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        text_response(StatusCode::OK, self)
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, Bytes::from(self.to_string()))
    }
}

impl<T: IntoResponse> IntoResponse for (StatusCode, T) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}
