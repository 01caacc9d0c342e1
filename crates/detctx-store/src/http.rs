//! HTTP collection client for the host's custom-object storage API.

use async_trait::async_trait;
use detctx_core::ContextEntry;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{Collection, StoreError};

/// Collection backed by `/customobjects/v1/collections/{collection}/objects`.
pub struct HttpCollection {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<ObjectRef>,
}

#[derive(Deserialize)]
struct ObjectRef {
    object_key: String,
}

impl HttpCollection {
    /// `base_url` should be like `https://api.example.com` (no trailing slash needed).
    pub fn new(base_url: String, collection: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            token,
        }
    }

    fn objects_url(&self) -> String {
        format!(
            "{}/customobjects/v1/collections/{}/objects",
            self.base_url, self.collection
        )
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.objects_url(), key)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(resp: Response, key: Option<&str>) -> Result<Response, StoreError> {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(key) = key {
                return Err(StoreError::NotFound(key.to_string()));
            }
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Collection for HttpCollection {
    async fn search(&self, composite_id: &str) -> Result<Vec<String>, StoreError> {
        let filter = format!("compositeId:'{composite_id}'");
        debug!(url = %self.objects_url(), %filter, "searching collection");
        let request = self.client.get(self.objects_url()).query(&[("filter", &filter)]);
        let resp = Self::check(self.authorized(request).send().await?, None).await?;
        let found: SearchResponse = resp.json().await?;
        Ok(found.resources.into_iter().map(|r| r.object_key).collect())
    }

    async fn read(&self, key: &str) -> Result<ContextEntry, StoreError> {
        let request = self.client.get(self.object_url(key));
        let resp = Self::check(self.authorized(request).send().await?, Some(key)).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write(&self, key: &str, entry: &ContextEntry) -> Result<(), StoreError> {
        let request = self.client.put(self.object_url(key)).json(entry);
        Self::check(self.authorized(request).send().await?, None).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let request = self.client.delete(self.object_url(key));
        Self::check(self.authorized(request).send().await?, Some(key)).await?;
        Ok(())
    }
}
