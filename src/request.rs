//! The built, immutable outbound request handed to the transport.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use url::Url;

use crate::method::RestMethod;

/// A fully built API request: method, absolute URL, headers and an optional
/// frozen body.
///
/// Built once by [`Client::build_request`] or [`Client::build_upload`] and
/// handed to the transport unmodified; there are no mutators.
///
/// [`Client::build_request`]: crate::Client::build_request
/// [`Client::build_upload`]: crate::Client::build_upload
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: RestMethod,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl OutboundRequest {
    pub(crate) fn new(
        method: RestMethod,
        url: Url,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// The HTTP method.
    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// The absolute request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The headers the request will carry.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The encoded body payload, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Converts into the transport's request type without further changes.
    pub(crate) fn into_reqwest(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.to_reqwest(), self.url);
        *request.headers_mut() = self.headers;
        if let Some(body) = self.body {
            *request.body_mut() = Some(reqwest::Body::from(body));
        }
        request
    }
}
