use async_trait::async_trait;
use common::{CollectRequest, CollectResponse, ScheduleRequest, ScheduleResponse};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::TransportError;

/// Las dos llamadas que un worker le hace al master.
#[async_trait]
pub trait Coordinator: Send + Sync {
    async fn schedule(&self, req: ScheduleRequest) -> Result<ScheduleResponse, TransportError>;

    async fn collect(&self, req: CollectRequest) -> Result<CollectResponse, TransportError>;
}

/// Cliente JSON/HTTP contra las rutas /api/v1/tasks/* del master.
#[derive(Debug, Clone)]
pub struct HttpCoordinator {
    client: Client,
    base_url: String,
}

impl HttpCoordinator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let resp = self.client.post(&url).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(TransportError::Status(resp.status()));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Coordinator for HttpCoordinator {
    async fn schedule(&self, req: ScheduleRequest) -> Result<ScheduleResponse, TransportError> {
        self.post("/api/v1/tasks/schedule", &req).await
    }

    async fn collect(&self, req: CollectRequest) -> Result<CollectResponse, TransportError> {
        self.post("/api/v1/tasks/collect", &req).await
    }
}
