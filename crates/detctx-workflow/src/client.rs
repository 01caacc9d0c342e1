//! Translation workflow client.
//!
//! One invocation walks `Triggered -> Polling -> {Completed | Failed | TimedOut}`
//! and produces exactly one of: the translated HTML, a [`WorkflowError`], or
//! the distinguished [`WorkflowError::TimedOut`].

use async_trait::async_trait;
use detctx_core::TranslationTarget;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::poll::{PollError, PollPolicy, poll_until};
use crate::{DEFAULT_WORKFLOW_NAME, WorkflowError};

/// Status the workflow reports until it reaches a terminal state.
pub const IN_PROGRESS: &str = "In progress";

/// Input to the translation workflow.
///
/// Serialises flat: `{language, htmlContent, compositeId, title, type, objectKey}`.
/// The workflow stores its result under `objectKey` itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub language: String,
    pub html_content: String,
    #[serde(flatten)]
    pub target: TranslationTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<RemoteError>,
    /// Execution ids; the first one identifies the job.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionResults {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<RemoteError>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<ExecutionResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub output_data: Option<Map<String, Value>>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Triggered,
    Polling,
    Completed,
    Failed,
    TimedOut,
}

impl ExecutionResults {
    /// State implied by one poll response.
    ///
    /// Errors win; otherwise the first result's status decides, and anything
    /// other than "In progress" (including no result at all) is terminal.
    pub fn state(&self) -> JobState {
        if !self.errors.is_empty() {
            JobState::Failed
        } else if self
            .resources
            .first()
            .is_some_and(|r| r.status == IN_PROGRESS)
        {
            JobState::Polling
        } else {
            JobState::Completed
        }
    }

    /// Output values of the first result joined with newlines, in emission order.
    pub fn output(&self) -> String {
        let Some(data) = self.resources.first().and_then(|r| r.output_data.as_ref()) else {
            return String::new();
        };
        data.values()
            .map(|value| match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Remote workflow endpoints.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    async fn trigger(
        &self,
        workflow_name: &str,
        payload: &Value,
    ) -> Result<TriggerResponse, WorkflowError>;

    async fn results(&self, execution_id: &str) -> Result<ExecutionResults, WorkflowError>;
}

/// Anything that can turn detection HTML into translated HTML.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, WorkflowError>;
}

/// Triggers the translation workflow and polls it under a [`PollPolicy`].
pub struct WorkflowClient<A> {
    api: A,
    workflow_name: String,
    policy: PollPolicy,
}

impl<A: WorkflowApi> WorkflowClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
            policy: PollPolicy::default(),
        }
    }

    pub fn with_workflow_name(mut self, workflow_name: impl Into<String>) -> Self {
        self.workflow_name = workflow_name.into();
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Submit the job and return its execution id.
    pub async fn trigger(&self, request: &TranslationRequest) -> Result<String, WorkflowError> {
        let payload = serde_json::to_value(request)?;
        let response = self.api.trigger(&self.workflow_name, &payload).await?;

        if let Some(err) = response.errors.into_iter().next() {
            warn!(
                workflow = %self.workflow_name,
                code = err.code,
                message = %err.message,
                state = ?JobState::Failed,
                "workflow trigger rejected"
            );
            return Err(WorkflowError::Trigger {
                code: err.code,
                message: err.message,
            });
        }

        let execution_id = response
            .resources
            .into_iter()
            .next()
            .ok_or(WorkflowError::MissingExecutionId)?;
        info!(
            workflow = %self.workflow_name,
            execution_id = %execution_id,
            object_key = %request.target.object_key,
            state = ?JobState::Triggered,
            "workflow triggered"
        );
        Ok(execution_id)
    }

    /// Poll `execution_id` until it leaves "In progress" or the budget runs out.
    pub async fn await_completion(&self, execution_id: &str) -> Result<String, WorkflowError> {
        let polled = poll_until(
            &self.policy,
            |attempt| {
                debug!(execution_id, attempt, state = ?JobState::Polling, "polling workflow");
                self.api.results(execution_id)
            },
            |results| results.state() != JobState::Polling,
        )
        .await;

        let results = match polled {
            Ok(results) => results,
            Err(PollError::Exhausted { attempts }) => {
                warn!(execution_id, attempts, state = ?JobState::TimedOut, "workflow still in progress");
                return Err(WorkflowError::TimedOut { attempts });
            }
            Err(PollError::Failed(e)) => return Err(e),
        };

        if let Some(err) = results.errors.first() {
            warn!(
                execution_id,
                code = err.code,
                message = %err.message,
                state = ?JobState::Failed,
                "workflow reported an error"
            );
            return Err(WorkflowError::Remote {
                code: err.code,
                message: err.message.clone(),
            });
        }

        let output = results.output();
        info!(execution_id, bytes = output.len(), state = ?JobState::Completed, "workflow completed");
        Ok(output)
    }
}

#[async_trait]
impl<A: WorkflowApi> Translator for WorkflowClient<A> {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, WorkflowError> {
        let execution_id = self.trigger(request).await?;
        self.await_completion(&execution_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays scripted poll responses; once exhausted, keeps answering "In progress".
    #[derive(Default)]
    struct ScriptedApi {
        trigger: Mutex<Option<TriggerResponse>>,
        polls: Mutex<VecDeque<ExecutionResults>>,
        payloads: Mutex<Vec<(String, Value)>>,
        poll_count: Mutex<u32>,
    }

    impl ScriptedApi {
        fn accepting(polls: Vec<ExecutionResults>) -> Self {
            let api = Self::default();
            *api.trigger.lock().unwrap() = Some(TriggerResponse {
                errors: vec![],
                resources: vec!["exec-1".into()],
            });
            *api.polls.lock().unwrap() = polls.into();
            api
        }

        fn polls(&self) -> u32 {
            *self.poll_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl WorkflowApi for ScriptedApi {
        async fn trigger(
            &self,
            workflow_name: &str,
            payload: &Value,
        ) -> Result<TriggerResponse, WorkflowError> {
            self.payloads
                .lock()
                .unwrap()
                .push((workflow_name.to_string(), payload.clone()));
            Ok(self.trigger.lock().unwrap().clone().unwrap_or_default())
        }

        async fn results(&self, execution_id: &str) -> Result<ExecutionResults, WorkflowError> {
            assert_eq!(execution_id, "exec-1");
            *self.poll_count.lock().unwrap() += 1;
            Ok(self
                .polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(in_progress))
        }
    }

    fn in_progress() -> ExecutionResults {
        serde_json::from_value(json!({ "resources": [{ "status": IN_PROGRESS }] })).unwrap()
    }

    fn completed(output: Value) -> ExecutionResults {
        serde_json::from_value(json!({
            "resources": [{ "status": "Completed", "output_data": output }]
        }))
        .unwrap()
    }

    fn request() -> TranslationRequest {
        TranslationRequest {
            language: "es".into(),
            html_content: "<p>hello</p>".into(),
            target: TranslationTarget::for_detection("test-detection-id", "es"),
        }
    }

    #[test]
    fn request_serialises_flat() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(
            json,
            json!({
                "language": "es",
                "htmlContent": "<p>hello</p>",
                "compositeId": "test-detection-id",
                "title": "Detection translation (es)",
                "type": "translation_es",
                "objectKey": "test-detection-id_translation_es",
            })
        );
    }

    #[test]
    fn output_keeps_emission_order() {
        let results = completed(json!({ "zeta": "first", "alpha": "second", "mid": 3 }));
        assert_eq!(results.output(), "first\nsecond\n3");
    }

    #[test]
    fn output_without_data_is_empty() {
        let results: ExecutionResults =
            serde_json::from_value(json!({ "resources": [{ "status": "Completed" }] })).unwrap();
        assert_eq!(results.output(), "");
        assert_eq!(ExecutionResults::default().output(), "");
    }

    #[test]
    fn state_classification() {
        assert_eq!(in_progress().state(), JobState::Polling);
        assert_eq!(completed(json!({})).state(), JobState::Completed);
        assert_eq!(ExecutionResults::default().state(), JobState::Completed);

        let failed: ExecutionResults = serde_json::from_value(json!({
            "errors": [{ "code": 500, "message": "boom" }],
            "resources": [{ "status": IN_PROGRESS }]
        }))
        .unwrap();
        assert_eq!(failed.state(), JobState::Failed);
    }

    #[test]
    fn null_lists_parse_as_empty() {
        let results: ExecutionResults =
            serde_json::from_value(json!({ "errors": null, "resources": null })).unwrap();
        assert!(results.errors.is_empty());
        assert!(results.resources.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_in_progress_polls() {
        let api = ScriptedApi::accepting(vec![
            in_progress(),
            in_progress(),
            completed(json!({ "translation": "Contenido traducido" })),
        ]);
        let client = WorkflowClient::new(api);

        let output = client.translate(&request()).await.unwrap();

        assert_eq!(output, "Contenido traducido");
        assert_eq!(client.api().polls(), 3);
        let payloads = client.api().payloads.lock().unwrap();
        assert_eq!(payloads[0].0, DEFAULT_WORKFLOW_NAME);
        assert_eq!(payloads[0].1["objectKey"], "test-detection-id_translation_es");
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_error_fails_without_polling() {
        let api = ScriptedApi::default();
        *api.trigger.lock().unwrap() = Some(TriggerResponse {
            errors: vec![RemoteError {
                code: 403,
                message: "insufficient credits".into(),
            }],
            resources: vec![],
        });
        let client = WorkflowClient::new(api);

        let err = client.translate(&request()).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Trigger { code: 403, .. }));
        assert_eq!(err.to_string(), "403 insufficient credits");
        assert_eq!(client.api().polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_without_execution_id_fails() {
        let api = ScriptedApi::default();
        let client = WorkflowClient::new(api);
        let err = client.translate(&request()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingExecutionId));
    }

    #[tokio::test(start_paused = true)]
    async fn remote_error_during_polling_fails() {
        let failed: ExecutionResults = serde_json::from_value(json!({
            "errors": [{ "code": 500, "message": "model unavailable" }]
        }))
        .unwrap();
        let api = ScriptedApi::accepting(vec![in_progress(), failed]);
        let client = WorkflowClient::new(api);

        let err = client.translate(&request()).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Remote { code: 500, .. }));
        assert!(!err.is_timeout());
        assert_eq!(client.api().polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_twelve_polls() {
        let api = ScriptedApi::accepting(vec![]);
        let client = WorkflowClient::new(api);
        let start = tokio::time::Instant::now();

        let err = client.translate(&request()).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(err, WorkflowError::TimedOut { attempts: 12 }));
        assert_eq!(client.api().polls(), 12);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn completes_on_the_last_allowed_poll() {
        let mut polls = vec![in_progress(); 11];
        polls.push(completed(json!({ "out": "done" })));
        let client = WorkflowClient::new(ScriptedApi::accepting(polls));

        assert_eq!(client.translate(&request()).await.unwrap(), "done");
        assert_eq!(client.api().polls(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy_controls_attempts() {
        let client = WorkflowClient::new(ScriptedApi::accepting(vec![]))
            .with_workflow_name("other-workflow")
            .with_poll_policy(PollPolicy {
                max_attempts: 3,
                interval: Duration::from_secs(1),
            });

        let err = client.translate(&request()).await.unwrap_err();

        assert!(matches!(err, WorkflowError::TimedOut { attempts: 3 }));
        assert_eq!(client.api().payloads.lock().unwrap()[0].0, "other-workflow");
    }
}
