mod display;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use detctx_core::language_from_locale;
use detctx_store::{ContextStore, DEFAULT_COLLECTION, HttpCollection};
use detctx_widget::{HttpHost, Orchestrator, Slots};
use detctx_workflow::{DEFAULT_WORKFLOW_NAME, HttpWorkflowApi, PollPolicy, WorkflowClient};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::display::TerminalSlot;

/// Show a detection's stored context and translation, optionally requesting
/// an AI translation into the viewer's language.
#[derive(Parser)]
#[command(name = "detctx", version)]
struct Cli {
    /// Composite id of the detection to show.
    detection_id: String,

    /// API gateway base URL.
    #[arg(long, env = "DETCTX_GATEWAY_URL")]
    gateway_url: String,

    /// Bearer token for the gateway.
    #[arg(long, env = "DETCTX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Collection holding context entries.
    #[arg(long, env = "DETCTX_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Translation workflow name.
    #[arg(long, env = "DETCTX_WORKFLOW", default_value = DEFAULT_WORKFLOW_NAME)]
    workflow: String,

    /// Total time to wait for the workflow, in seconds.
    #[arg(long, default_value_t = 60)]
    poll_budget_secs: u64,

    /// Wait before each poll, in seconds.
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,

    /// Viewer locale (e.g. `es-ES`); only the language part is used.
    #[arg(long, env = "LANG")]
    locale: Option<String>,

    /// Activate the translate prompt if the first render offers one.
    #[arg(long)]
    translate: bool,

    /// Detections to switch to afterwards, in order.
    #[arg(long = "then", value_name = "DETECTION_ID")]
    then: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    info!("detctx v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.poll_interval_secs > 0,
        "--poll-interval-secs must be greater than zero"
    );

    let language = language_from_locale(cli.locale.as_deref());
    let policy = PollPolicy::from_budget(
        Duration::from_secs(cli.poll_budget_secs),
        Duration::from_secs(cli.poll_interval_secs),
    );
    info!(language = %language, gateway = %cli.gateway_url, "starting");

    let collection = HttpCollection::new(cli.gateway_url.clone(), cli.collection, cli.token.clone());
    let host = HttpHost::new(cli.gateway_url.clone(), cli.token.clone());
    let workflow = WorkflowClient::new(HttpWorkflowApi::new(cli.gateway_url, cli.token))
        .with_workflow_name(cli.workflow)
        .with_poll_policy(policy);
    debug!(
        max_attempts = workflow.policy().max_attempts,
        interval_ms = workflow.policy().interval.as_millis() as u64,
        "poll policy"
    );

    let orchestrator = Orchestrator::new(
        ContextStore::new(Arc::new(collection)),
        Arc::new(host),
        Arc::new(workflow),
        Slots {
            translation: Arc::new(TerminalSlot::new("translation")),
            context: Arc::new(TerminalSlot::new("context")),
        },
    );

    let outcome = orchestrator.on_load(&cli.detection_id, &language).await;
    info!(entries = outcome.entries.len(), "initial render done");

    if cli.translate {
        match orchestrator.activate_translation().await {
            Some(result) => info!(?result, "translation finished"),
            None => warn!("no translate prompt to activate"),
        }
    }

    for detection_id in &cli.then {
        if orchestrator.on_detection_changed(Some(detection_id)).await.is_none() {
            warn!(detection_id = %detection_id, "detection change ignored");
        }
    }

    Ok(())
}
