//! Workflow layer: trigger the translation job, then poll it to a terminal state
//! under a bounded attempt budget.

mod client;
mod error;
pub mod poll;

pub use client::{
    ExecutionResult, ExecutionResults, JobState, RemoteError, TranslationRequest, Translator,
    TriggerResponse, WorkflowApi, WorkflowClient,
};
pub use error::WorkflowError;
pub use poll::{PollError, PollPolicy, poll_until};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpWorkflowApi;

/// Name of the backend translation workflow.
pub const DEFAULT_WORKFLOW_NAME: &str = "translate-with-charlotte-ai";
