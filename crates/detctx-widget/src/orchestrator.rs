//! The detection orchestrator.
//!
//! For the focused detection and the viewer's language it decides what the
//! translation slot shows (stored translation, "no translation needed", or a
//! translate prompt), renders every other context entry, and runs the
//! translation workflow when the prompt is activated.
//!
//! A poll timeout is not reported as an error. The workflow writes its result
//! to the shared store on its own, so it may have finished even though polling
//! never saw it complete; the view is re-derived from the store instead.

use std::sync::{Arc, Mutex, MutexGuard};

use detctx_core::render::{render_detection, render_entry, render_error, render_panel};
use detctx_core::{ContextEntry, DEFAULT_LANGUAGE, TranslationTarget};
use detctx_store::ContextStore;
use detctx_workflow::{TranslationRequest, Translator};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::events::{DetectionEvents, Subscription};
use crate::{HostApi, Slots, WidgetError};

const LOADING_MESSAGE: &str = "Loading detection context...";
const NO_TRANSLATION_NEEDED: &str =
    "Your browser language is already configured in English. No translation needed.";
const TRANSLATE_PROMPT: &str = r#"
        <div>
          <p>There is no yet translation available for this detection. Click in the button to get an AI translation of the detection details.</p>
          <p>The translation will use Charlotte AI credit</p>
          <button id="translateBtn"
            class="focusable interactive-normal type-md-medium rounded-sm my-2 py-1 px-3 transition duration-150 ease-in-out">
            Translate detection details
          </button>
        </div>"#;
const IN_PROGRESS_TITLE: &str = "Translation in progress...";
const IN_PROGRESS_MESSAGE: &str =
    "Your translation is being processed. This may take a few moments depending on content size";
const PROCESS_ERROR: &str = "Error processing detection";
const TRANSLATE_ERROR: &str = "Error translating detection";

/// The translate affordance exposed by a render: what to translate and where
/// the result will be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateAction {
    pub detection_id: String,
    pub language: String,
    pub target: TranslationTarget,
}

/// What one `process_detection` pass saw and offered.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub entries: Vec<ContextEntry>,
    pub language: String,
    pub translate: Option<TranslateAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    /// The translation (or the untranslated HTML) is in the translation slot.
    Translated,
    /// Polling timed out and the view was re-derived from the store.
    Refreshed(ProcessOutcome),
    /// The view moved to another detection before the job finished.
    Abandoned,
    /// An error panel was rendered with this message.
    Failed(String),
}

/// Whether a detection-changed notification should trigger processing.
///
/// Ignored when the new id is missing or empty, when it is the detection
/// already shown, or when nothing has loaded yet.
pub fn should_process(current: Option<&str>, new_id: Option<&str>) -> bool {
    match (current, new_id) {
        (Some(current), Some(new_id)) => {
            !current.is_empty() && !new_id.is_empty() && current != new_id
        }
        _ => false,
    }
}

struct ViewState {
    current: Option<String>,
    language: String,
    pending: Option<TranslateAction>,
}

pub struct Orchestrator {
    store: ContextStore,
    host: Arc<dyn HostApi>,
    translator: Arc<dyn Translator>,
    slots: Slots,
    state: Mutex<ViewState>,
}

impl Orchestrator {
    pub fn new(
        store: ContextStore,
        host: Arc<dyn HostApi>,
        translator: Arc<dyn Translator>,
        slots: Slots,
    ) -> Self {
        Self {
            store,
            host,
            translator,
            slots,
            state: Mutex::new(ViewState {
                current: None,
                language: DEFAULT_LANGUAGE.to_string(),
                pending: None,
            }),
        }
    }

    pub fn current_detection(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// The translate affordance of the latest render, if it offered one.
    pub fn pending_translation(&self) -> Option<TranslateAction> {
        self.lock().pending.clone()
    }

    /// First render for the detection the host opened the widget on.
    pub async fn on_load(&self, detection_id: &str, language: &str) -> ProcessOutcome {
        {
            let mut state = self.lock();
            state.current = Some(detection_id.to_string());
            state.language = language.to_string();
        }
        self.process_detection(detection_id, language).await
    }

    /// Handle a detection-changed notification from the host.
    ///
    /// Returns `None` when the notification is ignored (see [`should_process`]).
    pub async fn on_detection_changed(&self, new_id: Option<&str>) -> Option<ProcessOutcome> {
        let language = {
            let mut state = self.lock();
            if !should_process(state.current.as_deref(), new_id) {
                debug!(current = ?state.current, new_id, "ignoring detection change");
                return None;
            }
            state.current = new_id.map(str::to_string);
            state.language.clone()
        };
        let new_id = new_id?;
        info!(detection_id = new_id, "focused detection changed");
        Some(self.process_detection(new_id, &language).await)
    }

    /// Listen for detection changes until the returned subscription is dropped.
    pub fn attach(self: &Arc<Self>, events: &DetectionEvents) -> Subscription {
        let mut rx = events.subscribe();
        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(detection_id) => {
                        orchestrator.on_detection_changed(Some(&detection_id)).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "detection events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription::new(handle)
    }

    /// Re-derive both slots from the store for `detection_id`.
    ///
    /// Store failures are rendered into the translation slot and yield an
    /// empty outcome; they are never returned. Replaces any translate
    /// affordance offered by an earlier render.
    pub async fn process_detection(&self, detection_id: &str, language: &str) -> ProcessOutcome {
        self.slots.translation.set_content("");
        self.slots
            .context
            .set_content(&render_panel("", LOADING_MESSAGE));

        let entries = match self.store.list_entries(detection_id).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(detection_id, error = %e, "error processing detection");
                self.slots
                    .translation
                    .set_content(&render_error(PROCESS_ERROR, &e.to_string()));
                self.lock().pending = None;
                return ProcessOutcome {
                    entries: Vec::new(),
                    language: language.to_string(),
                    translate: None,
                };
            }
        };

        let target = TranslationTarget::for_detection(detection_id, language);
        let existing = entries.iter().find(|e| e.object_key == target.object_key);

        let mut translate = None;
        let translation_html = if let Some(entry) = existing {
            debug!(detection_id, object_key = %target.object_key, "showing stored translation");
            render_entry(entry)
        } else if language == "en" {
            render_panel(&target.title, NO_TRANSLATION_NEEDED)
        } else {
            let html = render_panel(&target.title, TRANSLATE_PROMPT);
            translate = Some(TranslateAction {
                detection_id: detection_id.to_string(),
                language: language.to_string(),
                target: target.clone(),
            });
            html
        };
        self.slots.translation.set_content(&translation_html);

        let context_html: String = entries
            .iter()
            .filter(|e| e.object_key != target.object_key)
            .map(render_entry)
            .collect();
        self.slots.context.set_content(&context_html);

        info!(
            detection_id,
            language,
            count = entries.len(),
            translated = existing.is_some(),
            "processed detection"
        );
        self.lock().pending = translate.clone();

        ProcessOutcome {
            entries,
            language: language.to_string(),
            translate,
        }
    }

    /// Activate the translate affordance of the latest render.
    ///
    /// The affordance is consumed, so a second activation while the first
    /// translation runs does nothing.
    pub async fn activate_translation(&self) -> Option<TranslationOutcome> {
        let action = self.lock().pending.take()?;
        Some(
            self.translate_detection(&action.detection_id, &action.language, &action.target)
                .await,
        )
    }

    /// Translate the detection and render the result into the translation slot.
    ///
    /// A result for a detection that is no longer shown is dropped as
    /// [`TranslationOutcome::Abandoned`]; the workflow still stores it.
    pub async fn translate_detection(
        &self,
        detection_id: &str,
        language: &str,
        target: &TranslationTarget,
    ) -> TranslationOutcome {
        self.slots
            .translation
            .set_content(&render_panel(IN_PROGRESS_TITLE, IN_PROGRESS_MESSAGE));

        let result = self.run_translation(detection_id, language, target).await;
        {
            // The current-detection check and the slot write share one lock.
            let mut state = self.lock();
            if let Some(current) = state.current.as_deref().filter(|c| *c != detection_id) {
                info!(
                    detection_id,
                    current,
                    succeeded = result.is_ok(),
                    "translation finished for a detection no longer shown"
                );
                return TranslationOutcome::Abandoned;
            }
            match &result {
                Ok(content) => {
                    state.pending = None;
                    self.slots
                        .translation
                        .set_content(&render_panel(&target.title, content));
                    return TranslationOutcome::Translated;
                }
                Err(e) if !e.is_timeout() => {
                    let message = e.to_string();
                    error!(detection_id, language, error = %message, "error translating detection");
                    state.pending = None;
                    self.slots
                        .translation
                        .set_content(&render_error(TRANSLATE_ERROR, &message));
                    return TranslationOutcome::Failed(message);
                }
                Err(_) => {}
            }
        }

        info!(detection_id, "translation not confirmed in time, re-reading store");
        TranslationOutcome::Refreshed(self.process_detection(detection_id, language).await)
    }

    async fn run_translation(
        &self,
        detection_id: &str,
        language: &str,
        target: &TranslationTarget,
    ) -> Result<String, WidgetError> {
        let detection = self.host.get_detection_by_id(detection_id).await?;
        let comments = self.host.get_detection_comments(detection_id).await?;
        let html_content = render_detection(&detection, &comments);

        let request = TranslationRequest {
            language: language.to_string(),
            html_content,
            target: target.clone(),
        };
        let translated = self.translator.translate(&request).await?;

        if translated.is_empty() {
            Ok(request.html_content)
        } else {
            Ok(translated)
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
