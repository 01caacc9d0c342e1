//! HTTP client for the host's alert and case APIs.
//!
//! Comments are not attached to detections directly: the detection's cases
//! are looked up, then each case's activity ids, then the activities, of
//! which only those of type `comment` are kept.

use async_trait::async_trait;
use detctx_core::{Comment, Detection};
use futures::future::try_join_all;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{HostApi, HostError};

pub struct HttpHost {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct Resources<T> {
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
}

#[derive(Deserialize)]
struct Activity {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(flatten)]
    comment: Comment,
}

impl HttpHost {
    /// `base_url` should be like `https://api.example.com` (no trailing slash needed).
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, HostError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let resp = check(request.send().await?).await?;
        let parsed: Resources<T> = resp.json().await?;
        Ok(parsed.resources)
    }

    async fn case_activity_ids(&self, case_id: &str) -> Result<Vec<Value>, HostError> {
        let url = format!("{}/cases/queries/activities/v1", self.base_url);
        self.fetch(self.client.get(&url).query(&[("case_id", case_id)]))
            .await
    }
}

async fn check(resp: Response) -> Result<Response, HostError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(HostError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

/// Activity ids come back mixed with nulls and nested values; keep the strings.
fn string_ids(values: impl IntoIterator<Item = Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn comments_of(activities: Vec<Activity>) -> Vec<Comment> {
    activities
        .into_iter()
        .filter(|a| a.kind == "comment")
        .map(|a| a.comment)
        .collect()
}

#[async_trait]
impl HostApi for HttpHost {
    async fn get_detection_by_id(&self, detection_id: &str) -> Result<Detection, HostError> {
        let url = format!("{}/alerts/entities/alerts/v2", self.base_url);
        debug!(url = %url, detection_id, "fetching detection");
        let request = self
            .client
            .post(&url)
            .json(&json!({ "composite_ids": [detection_id] }));
        let detections: Vec<Detection> = self.fetch(request).await?;
        detections
            .into_iter()
            .next()
            .ok_or_else(|| HostError::DetectionNotFound(detection_id.to_string()))
    }

    async fn get_detection_comments(&self, detection_id: &str) -> Result<Vec<Comment>, HostError> {
        let url = format!("{}/cases/queries/cases/v1", self.base_url);
        let filter = format!("case.detections.id:'{detection_id}'");
        let case_ids: Vec<String> = self
            .fetch(self.client.get(&url).query(&[("filter", &filter)]))
            .await?;

        let activity_ids = try_join_all(case_ids.iter().map(|id| self.case_activity_ids(id))).await?;
        let ids = string_ids(activity_ids.into_iter().flatten());
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/cases/entities/activities/GET/v1", self.base_url);
        let activities: Vec<Activity> = self
            .fetch(self.client.post(&url).json(&json!({ "ids": ids })))
            .await?;
        let comments = comments_of(activities);
        info!(detection_id, cases = case_ids.len(), count = comments.len(), "fetched detection comments");
        Ok(comments)
    }
}
