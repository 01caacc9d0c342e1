//! HTTP client for the host's workflow execution API.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{ExecutionResults, TriggerResponse, WorkflowApi, WorkflowError};

pub struct HttpWorkflowApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpWorkflowApi {
    /// `base_url` should be like `https://api.example.com` (no trailing slash needed).
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Decode a response body, keeping error bodies that still carry an
    /// `errors` list so the client can report the workflow's own message.
    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, WorkflowError> {
        let status = resp.status();
        let body = resp.text().await?;
        match serde_json::from_str::<T>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(WorkflowError::Server {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowApi {
    async fn trigger(
        &self,
        workflow_name: &str,
        payload: &Value,
    ) -> Result<TriggerResponse, WorkflowError> {
        let url = format!("{}/workflows/entities/execute/v1", self.base_url);
        debug!(url = %url, workflow = workflow_name, "triggering workflow");
        let request = self
            .client
            .post(&url)
            .query(&[("name", workflow_name), ("depth", "0")])
            .json(payload);
        Self::decode(self.authorized(request).send().await?).await
    }

    async fn results(&self, execution_id: &str) -> Result<ExecutionResults, WorkflowError> {
        let url = format!("{}/workflows/entities/execution-results/v1", self.base_url);
        let request = self.client.get(&url).query(&[("ids", execution_id)]);
        Self::decode(self.authorized(request).send().await?).await
    }
}
