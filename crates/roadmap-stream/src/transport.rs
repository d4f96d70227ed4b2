//! Event transports
//!
//! A transport turns one generate request into a sequence of
//! [`TransportEvent`]s on a channel: `Opened`, any number of `Message`s, then
//! exactly one of `Closed` or `Failed`. The ingestor owns the receiving end
//! and aborts the transport task to cancel.

use crate::error::TransportFailure;
use crate::sse::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// Start request for a generation session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    /// Topic query
    pub query: String,
    /// Caller's own model API key, sent as `x-user-api-key`
    #[serde(skip)]
    pub user_api_key: Option<String>,
    /// Bearer token
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl GenerateRequest {
    /// Request for `query` without credentials
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// With user API key
    #[inline]
    #[must_use]
    pub fn with_user_api_key(mut self, key: Option<String>) -> Self {
        self.user_api_key = key;
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }
}

/// What a transport reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection accepted
    Opened,
    /// One message body
    Message(String),
    /// Server ended the stream normally
    Closed,
    /// Connection or response failed
    Failed(TransportFailure),
}

/// Producer of transport events
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Run one session, sending events until the stream ends
    ///
    /// Implementations stop quietly when `events` is closed.
    async fn run(&self, request: GenerateRequest, events: mpsc::Sender<TransportEvent>);
}

/// `POST {base}/api/generate` over server-sent events
#[derive(Debug, Clone)]
pub struct HttpSseTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSseTransport {
    /// Create transport with a connect timeout
    ///
    /// # Errors
    /// Returns `TransportFailure` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, TransportFailure> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create transport around an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Generate endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    async fn stream(
        &self,
        request: &GenerateRequest,
        events: &mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportFailure> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .header(ACCEPT, "text/event-stream")
            .json(request);
        if let Some(key) = &request.user_api_key {
            builder = builder.header("x-user-api-key", key);
        }
        if let Some(token) = &request.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportFailure::http(status.as_u16(), body));
        }

        if events.send(TransportEvent::Opened).await.is_err() {
            return Ok(());
        }

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            for frame in decoder.push(&chunk?) {
                if events.send(TransportEvent::Message(frame.data)).await.is_err() {
                    return Ok(());
                }
            }
        }
        if let Some(frame) = decoder.finish() {
            let _ = events.send(TransportEvent::Message(frame.data)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl EventTransport for HttpSseTransport {
    async fn run(&self, request: GenerateRequest, events: mpsc::Sender<TransportEvent>) {
        tracing::debug!(url = %self.endpoint(), "opening event stream");
        let outcome = match self.stream(&request, &events).await {
            Ok(()) => TransportEvent::Closed,
            Err(failure) => {
                tracing::warn!(%failure, "event stream failed");
                TransportEvent::Failed(failure)
            }
        };
        let _ = events.send(outcome).await;
    }
}
