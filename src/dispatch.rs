//! Request dispatch: one send/receive exchange per call.
//!
//! Dispatching is a single attempt — no retries, no backoff. Transport
//! mechanics (connection pooling, TLS, redirects) belong to the injected
//! `reqwest::Client`; this module adds cancellation, failure classification
//! and the pagination-aware decode of the response body.

use std::io::Write;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{instrument, Span};

use crate::client::Client;
use crate::context::CallContext;
use crate::error::Error;
use crate::request::OutboundRequest;
use crate::response::PaginatedResponse;

impl Client {
    /// Dispatches a request and JSON-decodes the response body into `T`.
    ///
    /// Returns the parsed [`PaginatedResponse`] together with the decoded
    /// value. The value is `None` when the success body is empty (a bare 204,
    /// or an endpoint that legitimately answers 200 with no payload).
    ///
    /// Pagination metadata is extracted from the same bytes before the
    /// decode, independently of `T`'s shape. If `T` itself declares
    /// `maxResults`/`startIndex`/`links` fields it receives those values as
    /// well; the two reads never conflict.
    ///
    /// ## Errors
    ///
    /// - [`Error::Canceled`] if `ctx` fires before the exchange completes;
    ///   this supersedes a simultaneous transport failure.
    /// - [`Error::Transport`] for network-level failures.
    /// - [`Error::Api`] for status codes of 300 and above; the variant
    ///   carries the response, so the status stays inspectable.
    /// - [`Error::Decoding`] if a non-empty body is not valid JSON for `T`.
    pub async fn dispatch<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
    ) -> Result<(PaginatedResponse, Option<T>), Error> {
        let response = self.exchange(ctx, request).await?;
        let value = if response.body().is_empty() {
            None
        } else {
            Some(serde_json::from_slice(response.body()).map_err(Error::Decoding)?)
        };
        Ok((response, value))
    }

    /// Dispatches a request and copies the response body into `sink`
    /// verbatim, with no JSON assumed — for binary and passthrough
    /// consumers.
    ///
    /// ## Errors
    ///
    /// As [`dispatch`](Self::dispatch), except decoding failures cannot
    /// occur; a failing sink surfaces as [`Error::Io`].
    pub async fn dispatch_raw(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
        sink: &mut dyn Write,
    ) -> Result<PaginatedResponse, Error> {
        let response = self.exchange(ctx, request).await?;
        sink.write_all(response.body())?;
        Ok(response)
    }

    /// Dispatches a request without decoding the response body.
    ///
    /// The body is still read and re-exposed on the returned
    /// [`PaginatedResponse`].
    ///
    /// ## Errors
    ///
    /// As [`dispatch`](Self::dispatch), minus decoding failures.
    pub async fn dispatch_empty(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
    ) -> Result<PaginatedResponse, Error> {
        self.exchange(ctx, request).await
    }

    /// One complete exchange: send, await under the context, read the body
    /// under the context, classify.
    #[instrument(
        name = "api_request",
        skip(self, ctx, request),
        fields(
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn exchange(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
    ) -> Result<PaginatedResponse, Error> {
        Span::current().record("http.method", request.method().to_string().as_str());
        Span::current().record("http.url", request.url().as_str());

        let request = request.into_reqwest();
        let response = tokio::select! {
            biased;
            reason = ctx.done() => return Err(Error::Canceled(reason)),
            result = self.transport.execute(request) => match result {
                Ok(response) => response,
                // An already-fired context is the more actionable diagnosis
                // than whatever the aborted transport reports.
                Err(e) => return Err(classify_transport_failure(ctx, e)),
            },
        };

        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());
        let headers = response.headers().clone();

        // The body stream is single-read; reading it here also lets the
        // transport reclaim the connection. A context firing mid-read
        // abandons the body: dropping the response releases it.
        let body: Bytes = tokio::select! {
            biased;
            reason = ctx.done() => return Err(Error::Canceled(reason)),
            result = response.bytes() => match result {
                Ok(body) => body,
                Err(e) => return Err(classify_transport_failure(ctx, e)),
            },
        };

        let response = PaginatedResponse::from_parts(status, headers, body);
        if status.as_u16() >= 300 {
            let otel_status = if status.is_server_error() {
                "ERROR"
            } else {
                "UNSET"
            };
            Span::current().record("otel.status_code", otel_status);
            return Err(Error::Api(Box::new(response)));
        }

        Span::current().record("otel.status_code", "OK");
        Ok(response)
    }
}

fn classify_transport_failure(ctx: &CallContext, error: reqwest::Error) -> Error {
    match ctx.error() {
        Some(reason) => Error::Canceled(reason),
        None => Error::Transport(error),
    }
}
