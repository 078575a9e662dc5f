//! Error types for the transport core.
//!
//! Every failure the core can produce is a variant of [`Error`]; nothing is
//! retried or swallowed internally. The two deliberate tolerances live
//! elsewhere: an empty success body decodes to no value, and pagination
//! parsing never fails a dispatch.

use thiserror::Error;

use crate::context::CancelReason;
use crate::response::PaginatedResponse;

/// Errors returned by the REST transport core.
#[derive(Debug, Error)]
pub enum Error {
    /// The base origin, version tag and relative path do not combine into a
    /// parseable URL.
    #[error("malformed URL: {0}")]
    MalformedUrl(#[from] url::ParseError),

    /// The API version tag began with a forward slash.
    #[error("api version must not be prefixed with a forward slash (/): got {0:?}")]
    InvalidApiVersion(String),

    /// A configured header value (e.g. the user agent) contains bytes that
    /// are not legal in an HTTP header.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// The request body could not be serialized to JSON.
    #[error("request body could not be encoded: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The query options could not be flattened into a query string.
    #[error("query options could not be encoded: {0}")]
    QueryEncoding(#[source] serde_urlencoded::ser::Error),

    /// An upload was built without a byte stream to read from.
    #[error("upload request is missing a file reader")]
    MissingReader,

    /// The upload stream (or a caller-supplied byte sink) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The injected HTTP transport failed below the HTTP layer.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The caller's context was canceled or its deadline expired before the
    /// exchange completed. Supersedes [`Error::Transport`] when both apply.
    #[error("{0}")]
    Canceled(CancelReason),

    /// The API answered with a status code of 300 or above.
    ///
    /// The message is the raw response body, verbatim; the remote API does
    /// not guarantee a structured error schema. The carried
    /// [`PaginatedResponse`] exposes the status code and headers.
    #[error("{}", .0.body_text())]
    Api(Box<PaginatedResponse>),

    /// A success response body was not valid JSON for the requested target.
    #[error("response body could not be decoded: {0}")]
    Decoding(#[source] serde_json::Error),
}

impl Error {
    /// Returns the API response carried by an [`Error::Api`], if any.
    ///
    /// Lets callers inspect the status code even on failure:
    ///
    /// ```rust,ignore
    /// match client.dispatch_empty(&ctx, request).await {
    ///     Err(e) => {
    ///         if let Some(response) = e.api_response() {
    ///             eprintln!("API rejected the call: {}", response.status());
    ///         }
    ///     }
    ///     Ok(_) => {}
    /// }
    /// ```
    pub fn api_response(&self) -> Option<&PaginatedResponse> {
        match self {
            Self::Api(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_raw_body() {
        let response = PaginatedResponse::from_parts(
            reqwest::StatusCode::BAD_REQUEST,
            reqwest::header::HeaderMap::new(),
            bytes::Bytes::from_static(b"Bad Request"),
        );
        let err = Error::Api(Box::new(response));
        assert_eq!(err.to_string(), "Bad Request");
        assert_eq!(
            err.api_response().map(|r| r.status().as_u16()),
            Some(400)
        );
    }

    #[test]
    fn invalid_api_version_names_the_offender() {
        let err = Error::InvalidApiVersion("/v3".to_string());
        assert!(err.to_string().contains("/v3"));
        assert!(err.api_response().is_none());
    }
}
