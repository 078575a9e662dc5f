//! REST transport core for a remote chat-service API.
//!
//! This crate is the generic layer underneath typed resource services
//! (rooms, users, messages): it builds versioned HTTP requests — JSON
//! bodies and related-multipart file uploads — dispatches them with
//! cooperative cancellation, classifies failures, and parses pagination
//! metadata out of response envelopes. Resource services stay thin: they
//! supply a method, a relative path and an optional body or decode target,
//! and get back a decoded value plus a [`PaginatedResponse`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chat_api::{CallContext, Client, ListOptions, with_query};
//! use url::Url;
//!
//! #[derive(serde::Deserialize)]
//! struct RoomList { items: Vec<serde_json::Value> }
//!
//! # async fn run() -> Result<(), chat_api::Error> {
//! let client = Client::new(Url::parse("https://chat.example.com/").unwrap())?;
//!
//! let options = ListOptions { start_index: Some(0), max_results: Some(30) };
//! let path = with_query("room", Some(&options))?;
//! let request = client.get(&path)?;
//!
//! let (response, rooms) = client
//!     .dispatch::<RoomList>(&CallContext::background(), request)
//!     .await?;
//! if let Some(next) = &response.links().next {
//!     println!("next page: {next}");
//! }
//! # let _ = rooms;
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! The crate does not handle credential acquisition. Inject a
//! `reqwest::Client` that attaches the access token (default headers or
//! middleware) via [`Client::builder`]; every dispatch then goes through it.
//! Authenticated transports should not be shared between users.
//!
//! ## Cancellation
//!
//! Every dispatch takes a [`CallContext`] carrying an optional deadline and
//! cancel handle. Use [`CallContext::background`] when no caller-side
//! deadline exists. A fired context supersedes transport errors in the
//! returned diagnosis.
//!
//! ## No retries
//!
//! A dispatch is a single attempt. Retry policies, rate-limit backoff (the
//! API answers 429 when throttled) and connection pooling are the injected
//! transport's and the caller's concern.

mod client;
mod config;
mod context;
mod dispatch;
mod error;
mod method;
mod query;
mod request;
mod response;
mod upload;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, CONTENT_TYPE_JSON, DEFAULT_API_VERSION, DEFAULT_USER_AGENT};
pub use context::{CallContext, CancelHandle, CancelReason};
pub use error::Error;
pub use method::RestMethod;
pub use query::{with_query, ListOptions};
pub use request::OutboundRequest;
pub use response::{PaginatedResponse, PaginationLinks};
pub use upload::UploadSpec;
