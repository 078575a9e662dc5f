//! The chat-service API client: configuration ownership and request building.

use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use url::Url;

use crate::config::{ClientConfig, CONTENT_TYPE_JSON};
use crate::error::Error;
use crate::method::RestMethod;
use crate::request::OutboundRequest;
use crate::upload::UploadSpec;

/// Builder for configuring a [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<reqwest::Client>,
}

impl ClientBuilder {
    fn new(base_url: Url) -> Self {
        Self {
            config: ClientConfig::new(base_url),
            transport: None,
        }
    }

    /// Sets the API version segment used in request paths.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidApiVersion`] if `version` starts with `/`.
    pub fn api_version(mut self, version: &str) -> Result<Self, Error> {
        self.config.set_api_version(version)?;
        Ok(self)
    }

    /// Sets the user-agent string. An empty string disables the header.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the string is not a legal header
    /// value.
    pub fn user_agent(mut self, user_agent: &str) -> Result<Self, Error> {
        self.config.set_user_agent(user_agent)?;
        Ok(self)
    }

    /// Injects the HTTP transport all dispatches go through.
    ///
    /// Authentication is the transport's job: pass a client whose middleware
    /// or default headers attach the access token. When omitted, a plain
    /// unauthenticated transport is constructed.
    pub fn transport(mut self, transport: reqwest::Client) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the [`Client`].
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Transport`] if the default transport cannot be
    /// constructed.
    pub fn build(self) -> Result<Client, Error> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => reqwest::Client::builder()
                .build()
                .map_err(Error::Transport)?,
        };
        Ok(Client {
            config: RwLock::new(self.config),
            transport,
        })
    }
}

/// A client for the remote chat-service REST API.
///
/// The client owns the mutable [`ClientConfig`] (behind a lock, so config
/// readers during active dispatch and concurrent setters are serialized) and
/// a shared `reqwest::Client` transport. Resource-specific service wrappers
/// hold a reference to one `Client` and use its build/dispatch primitives;
/// the client itself knows nothing about rooms, users or messages.
///
/// ## Examples
///
/// ```rust,no_run
/// use chat_api::{CallContext, Client};
/// use url::Url;
///
/// #[derive(serde::Deserialize)]
/// struct Room { id: u64, name: String }
///
/// # async fn run() -> Result<(), chat_api::Error> {
/// let base_url = Url::parse("https://chat.example.com/").unwrap();
/// let client = Client::new(base_url)?;
///
/// let request = client.get("room/42")?;
/// let (response, room) = client.dispatch::<Room>(&CallContext::background(), request).await?;
/// # let _ = (response, room);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    pub(crate) config: RwLock<ClientConfig>,
    pub(crate) transport: reqwest::Client,
}

impl Client {
    /// Creates a new builder for configuring a client.
    pub fn builder(base_url: Url) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Creates a client with default settings and a default transport.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Transport`] if the default transport cannot be
    /// constructed.
    pub fn new(base_url: Url) -> Result<Self, Error> {
        Self::builder(base_url).build()
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.config.read().clone()
    }

    /// Replaces the base origin. Takes effect on the next request only.
    pub fn set_base_url(&self, base_url: Url) {
        self.config.write().set_base_url(base_url);
    }

    /// Replaces the API version segment. Takes effect on the next request
    /// only, never retroactively.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidApiVersion`] if `version` starts with `/`; the
    /// configuration is left unchanged in that case.
    pub fn set_api_version(&self, version: &str) -> Result<(), Error> {
        self.config.write().set_api_version(version)
    }

    /// Replaces the user-agent string. An empty string disables the header.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidHeader`] for an illegal header value; the
    /// configuration is left unchanged in that case.
    pub fn set_user_agent(&self, user_agent: &str) -> Result<(), Error> {
        self.config.write().set_user_agent(user_agent)
    }

    /// Resolves a relative resource path against the current origin and
    /// version: `<origin>/<version>/<relative_path>`.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::MalformedUrl`] if the pieces do not combine into a
    /// parseable URL.
    pub fn resolve(&self, relative_path: &str) -> Result<Url, Error> {
        self.config.read().resolve(relative_path)
    }

    /// Builds an API request.
    ///
    /// When `body` is present it is JSON-encoded and attached as the request
    /// payload with a JSON `Content-Type`. serde_json performs no HTML
    /// escaping, so payload characters like `&` and `<` pass through
    /// unmodified, which is what the remote API expects. Query parameters
    /// are never added here; flatten options into `relative_path` first with
    /// [`with_query`](crate::with_query).
    ///
    /// ## Errors
    ///
    /// - [`Error::Encoding`] if the body cannot be serialized (e.g. a map
    ///   keyed by a non-string, non-integer type).
    /// - [`Error::MalformedUrl`] if the path does not resolve.
    /// - [`Error::InvalidHeader`] if the configured user agent cannot be
    ///   attached.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: RestMethod,
        relative_path: &str,
        body: Option<&B>,
    ) -> Result<OutboundRequest, Error> {
        let (url, user_agent) = self.snapshot(relative_path)?;

        let mut headers = HeaderMap::new();
        let body = match body {
            Some(body) => {
                let encoded = serde_json::to_vec(body).map_err(Error::Encoding)?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
                Some(Bytes::from(encoded))
            }
            None => None,
        };
        insert_user_agent(&mut headers, &user_agent)?;

        Ok(OutboundRequest::new(method, url, headers, body))
    }

    /// Shorthand for building a GET request.
    pub fn get(&self, relative_path: &str) -> Result<OutboundRequest, Error> {
        self.build_request::<()>(RestMethod::Get, relative_path, None)
    }

    /// Shorthand for building a POST request.
    pub fn post<B: Serialize + ?Sized>(
        &self,
        relative_path: &str,
        body: Option<&B>,
    ) -> Result<OutboundRequest, Error> {
        self.build_request(RestMethod::Post, relative_path, body)
    }

    /// Shorthand for building a PUT request.
    pub fn put<B: Serialize + ?Sized>(
        &self,
        relative_path: &str,
        body: Option<&B>,
    ) -> Result<OutboundRequest, Error> {
        self.build_request(RestMethod::Put, relative_path, body)
    }

    /// Shorthand for building a DELETE request.
    pub fn delete(&self, relative_path: &str) -> Result<OutboundRequest, Error> {
        self.build_request::<()>(RestMethod::Delete, relative_path, None)
    }

    /// Builds a file-upload request. Always a POST.
    ///
    /// The body is a `multipart/related` envelope: the optional JSON
    /// metadata part (when the spec carries metadata) followed by the file
    /// part; see [`UploadSpec`]. The request's `Content-Type` carries the
    /// generated boundary — the JSON content type appears only on the
    /// metadata sub-part.
    ///
    /// ## Errors
    ///
    /// - [`Error::MissingReader`] if the spec has no byte stream.
    /// - [`Error::Io`] if the stream cannot be fully drained.
    /// - [`Error::Encoding`] if the metadata cannot be serialized.
    /// - [`Error::MalformedUrl`] if the path does not resolve.
    pub fn build_upload(
        &self,
        relative_path: &str,
        upload: UploadSpec,
    ) -> Result<OutboundRequest, Error> {
        let (url, user_agent) = self.snapshot(relative_path)?;
        let (body, content_type) = upload.encode()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&content_type)
                .map_err(|_| Error::InvalidHeader("Content-Type"))?,
        );
        insert_user_agent(&mut headers, &user_agent)?;

        Ok(OutboundRequest::new(
            RestMethod::Post,
            url,
            headers,
            Some(body),
        ))
    }

    /// Resolves the URL and snapshots the user agent under one read lock, so
    /// a concurrent config change cannot produce a half-updated request.
    fn snapshot(&self, relative_path: &str) -> Result<(Url, String), Error> {
        let config = self.config.read();
        Ok((
            config.resolve(relative_path)?,
            config.user_agent().to_string(),
        ))
    }
}

fn insert_user_agent(headers: &mut HeaderMap, user_agent: &str) -> Result<(), Error> {
    if user_agent.is_empty() {
        return Ok(());
    }
    let value =
        HeaderValue::from_str(user_agent).map_err(|_| Error::InvalidHeader("User-Agent"))?;
    headers.insert(USER_AGENT, value);
    Ok(())
}
