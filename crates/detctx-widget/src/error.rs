use detctx_store::StoreError;
use detctx_workflow::WorkflowError;
use thiserror::Error;

use crate::HostError;

/// Any failure the orchestrator renders inline.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl WidgetError {
    /// Polling gave up while the workflow was still running.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Workflow(e) if e.is_timeout())
    }
}
