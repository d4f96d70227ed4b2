//! Saved-roadmap collaborator
//!
//! [`RoadmapStore`] is the seam between the session and the saved-roadmap
//! API. [`HttpRoadmapStore`] talks to the REST service:
//!
//! | call | request |
//! |---|---|
//! | `list` | `GET /roadmaps` |
//! | `get` | `GET /roadmaps/{id}` |
//! | `create` | `POST /roadmaps` |
//! | `update` | `PATCH /roadmaps/{id}` |
//! | `delete` | `DELETE /roadmaps/{id}` |

use crate::document::{NewRoadmap, RoadmapDocument, RoadmapSummary, RoadmapUpdate};
use crate::error::PersistenceError;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use roadmap_graph::RoadmapId;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Saved-roadmap operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    /// Saved roadmaps visible to the caller
    async fn list(&self) -> Result<Vec<RoadmapSummary>, PersistenceError>;

    /// Fetch one roadmap
    async fn get(&self, id: &RoadmapId) -> Result<RoadmapDocument, PersistenceError>;

    /// Save a new roadmap; the returned document carries the assigned id
    async fn create(&self, roadmap: NewRoadmap) -> Result<RoadmapDocument, PersistenceError>;

    /// Replace fields of an existing roadmap
    async fn update(&self, id: &RoadmapId, update: RoadmapUpdate) -> Result<RoadmapDocument, PersistenceError>;

    /// Delete a roadmap
    async fn delete(&self, id: &RoadmapId) -> Result<(), PersistenceError>;
}

/// REST client for the saved-roadmap API
#[derive(Debug, Clone)]
pub struct HttpRoadmapStore {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpRoadmapStore {
    /// Create client with a request timeout
    ///
    /// # Errors
    /// `PersistenceError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PersistenceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            access_token: None,
        })
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Absolute URL for an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and return the body of a 2xx response
    async fn send(builder: RequestBuilder) -> Result<(StatusCode, String), PersistenceError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "saved-roadmap API call failed");
            return Err(PersistenceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, PersistenceError> {
        let (_, body) = Self::send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RoadmapStore for HttpRoadmapStore {
    async fn list(&self) -> Result<Vec<RoadmapSummary>, PersistenceError> {
        Self::send_json(self.request(Method::GET, "roadmaps")).await
    }

    async fn get(&self, id: &RoadmapId) -> Result<RoadmapDocument, PersistenceError> {
        Self::send_json(self.request(Method::GET, &format!("roadmaps/{id}"))).await
    }

    async fn create(&self, roadmap: NewRoadmap) -> Result<RoadmapDocument, PersistenceError> {
        tracing::info!(title = %roadmap.title, nodes = roadmap.nodes.len(), "creating roadmap");
        Self::send_json(self.request(Method::POST, "roadmaps").json(&roadmap)).await
    }

    async fn update(&self, id: &RoadmapId, update: RoadmapUpdate) -> Result<RoadmapDocument, PersistenceError> {
        tracing::info!(roadmap = %id, "updating roadmap");
        Self::send_json(self.request(Method::PATCH, &format!("roadmaps/{id}")).json(&update)).await
    }

    async fn delete(&self, id: &RoadmapId) -> Result<(), PersistenceError> {
        // 204 No Content, or any 2xx body, is success.
        let (status, _) = Self::send(self.request(Method::DELETE, &format!("roadmaps/{id}"))).await?;
        tracing::info!(roadmap = %id, status = status.as_u16(), "roadmap deleted");
        Ok(())
    }
}
