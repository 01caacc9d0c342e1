use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The workflow rejected the trigger request.
    #[error("{code} {message}")]
    Trigger { code: i64, message: String },

    /// A poll returned an error entry from the running workflow.
    #[error("{code} {message}")]
    Remote { code: i64, message: String },

    /// The attempt budget ran out while the workflow still reported "In progress".
    ///
    /// The job may still finish and store its result; callers re-read the
    /// store instead of reporting a failure.
    #[error("Max polling attempts for workflow completion ({attempts} attempts)")]
    TimedOut { attempts: u32 },

    #[error("workflow trigger returned no execution id")]
    MissingExecutionId,

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkflowError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
