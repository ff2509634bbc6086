use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{HeartbeatRequest, PresenceError, PresenceReport};
use crate::presence::PresenceEngine;

/// How the agent reaches the presence service.
#[async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Record that `actor` is editing `resource`.
    async fn heartbeat(
        &self,
        resource: &str,
        actor: &str,
    ) -> Result<PresenceReport, TransportError>;

    /// Read what `actor` should see as edited by others, without recording
    /// anything.
    async fn query(&self, actor: &str) -> Result<PresenceReport, TransportError>;
}

/// JSON over HTTP against the routes in [`crate::handlers`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn read_report(response: reqwest::Response) -> Result<PresenceReport, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<PresenceError>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let report: PresenceReport = response.json().await?;
        if !report.success {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message: "presence service reported failure".to_string(),
            });
        }
        Ok(report)
    }
}

#[async_trait]
impl PresenceTransport for HttpTransport {
    async fn heartbeat(
        &self,
        resource: &str,
        actor: &str,
    ) -> Result<PresenceReport, TransportError> {
        let response = self
            .client
            .post(format!("{}/presence/heartbeat", self.base_url))
            .json(&HeartbeatRequest {
                resource: resource.to_string(),
                actor: actor.to_string(),
            })
            .send()
            .await?;
        Self::read_report(response).await
    }

    async fn query(&self, actor: &str) -> Result<PresenceReport, TransportError> {
        let response = self
            .client
            .get(format!("{}/presence", self.base_url))
            .query(&[("actor", actor)])
            .send()
            .await?;
        Self::read_report(response).await
    }
}

/// Calls a [`PresenceEngine`] in the same process.
#[derive(Clone)]
pub struct LocalTransport {
    engine: PresenceEngine,
}

impl LocalTransport {
    pub fn new(engine: PresenceEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl PresenceTransport for LocalTransport {
    async fn heartbeat(
        &self,
        resource: &str,
        actor: &str,
    ) -> Result<PresenceReport, TransportError> {
        Ok(self.engine.heartbeat(resource, actor).await?)
    }

    async fn query(&self, actor: &str) -> Result<PresenceReport, TransportError> {
        Ok(self.engine.query(actor).await)
    }
}
