//! API responses and out-of-band pagination metadata.
//!
//! List-style endpoints wrap their payload in a JSON envelope that also
//! carries pagination metadata:
//!
//! ```json
//! { "maxResults": 10, "startIndex": 100,
//!   "links": { "next": "...", "prev": "...", "self": "..." } }
//! ```
//!
//! [`PaginatedResponse::from_parts`] extracts that metadata without knowing
//! the payload shape, and re-exposes the body bytes it consumed so the
//! caller's own decode can read the same content.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

/// Pagination cursors extracted from a response envelope.
///
/// A link absent from the envelope is simply `None`; absence is never an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    /// Link to the next page of results.
    pub next: Option<String>,
    /// Link to the previous page of results.
    pub prev: Option<String>,
    /// Link to the current page of results.
    pub self_link: Option<String>,
}

/// An API response with its pagination metadata pre-extracted.
///
/// The raw transport body is single-read and is consumed while this value is
/// constructed, so the bytes are re-exposed here via [`body`](Self::body).
#[derive(Debug, Clone)]
pub struct PaginatedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    max_results: u32,
    start_index: u32,
    links: PaginationLinks,
}

impl PaginatedResponse {
    /// Builds a response from the transport's status, headers and fully read
    /// body, deriving the pagination fields from the body.
    ///
    /// This never fails: a body that is not JSON, or an envelope with absent
    /// or wrongly typed fields, yields zero-valued pagination fields and
    /// absent links.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let (max_results, start_index, links) = parse_envelope(&body);
        Self {
            status,
            headers,
            body,
            max_results,
            start_index,
            links,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw response body consumed during construction.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The raw response body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The envelope's `maxResults` field, or 0 when absent.
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// The envelope's `startIndex` field, or 0 when absent.
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    /// The pagination links found in the envelope.
    pub fn links(&self) -> &PaginationLinks {
        &self.links
    }
}

/// Best-effort extraction of the pagination envelope.
///
/// Each field is probed independently; a type mismatch counts as "not
/// present" rather than a parse error.
fn parse_envelope(body: &[u8]) -> (u32, u32, PaginationLinks) {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return (0, 0, PaginationLinks::default()),
    };

    let max_results = value
        .get("maxResults")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    let start_index = value
        .get("startIndex")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    let link = |name: &str| {
        value
            .get("links")
            .and_then(|links| links.get(name))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    let links = PaginationLinks {
        next: link("next"),
        prev: link("prev"),
        self_link: link("self"),
    };

    (max_results, start_index, links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_for(body: &'static [u8]) -> PaginatedResponse {
        PaginatedResponse::from_parts(StatusCode::OK, HeaderMap::new(), Bytes::from_static(body))
    }

    #[test]
    fn pagination_values_are_extracted() {
        let response = response_for(
            br#"{"maxResults":10,"startIndex":100,"links":{"next":"123","prev":"123","self":"123"}}"#,
        );

        assert_eq!(response.max_results(), 10);
        assert_eq!(response.start_index(), 100);
        assert_eq!(response.links().next.as_deref(), Some("123"));
        assert_eq!(response.links().prev.as_deref(), Some("123"));
        assert_eq!(response.links().self_link.as_deref(), Some("123"));
    }

    #[test]
    fn mismatched_types_and_keys_yield_zero_values() {
        let response = response_for(
            br#"{"maxResults":"10","startIndex":"abc","links":{"next":1,"previus":"123"}}"#,
        );

        assert_eq!(response.max_results(), 0);
        assert_eq!(response.start_index(), 0);
        assert_eq!(response.links(), &PaginationLinks::default());
    }

    #[test]
    fn non_json_body_yields_zero_values() {
        let response = response_for(b"plain text, not an envelope");
        assert_eq!(response.max_results(), 0);
        assert_eq!(response.start_index(), 0);
        assert_eq!(response.links(), &PaginationLinks::default());
    }

    #[test]
    fn empty_body_yields_zero_values() {
        let response = response_for(b"");
        assert_eq!(response.max_results(), 0);
        assert_eq!(response.links(), &PaginationLinks::default());
    }

    #[test]
    fn consumed_body_is_re_exposed() {
        let response = response_for(br#"{"items":[1,2,3]}"#);
        assert_eq!(response.body().as_ref(), br#"{"items":[1,2,3]}"#);
        assert_eq!(response.body_text(), r#"{"items":[1,2,3]}"#);
    }
}
