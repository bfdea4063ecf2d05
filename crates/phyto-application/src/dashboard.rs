//! Dashboard orchestration: image analysis and treatment chat.
//!
//! Two state machines share one history:
//!
//! ```text
//! analysis:  Idle -> Selected -> Analyzing -> Completed -> Idle
//!                                          \-> Failed -> Selected
//! chat:      no session -> open { Idle <-> AwaitingReply } -> no session
//! ```
//!
//! State lives behind a mutex that is never held across an await, so a
//! `Dashboard` can be cloned into UI tasks and driven concurrently. Every
//! analysis-state change is published on a watch channel, as is the
//! cosmetic progress percentage.

use crate::error::{FlowError, GatewayError};
use crate::gateway::DiagnosisGateway;
use crate::progress::ProgressTicker;
use phyto_core::chat::{ChatError, ChatMessage, ChatSession};
use phyto_core::classification::{ImagePayload, MAX_IMAGE_BYTES};
use phyto_core::history::{ClassificationHistory, HistoryEntry, ImagePreview};
use phyto_core::{PhytoError, Result as PhytoResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// Where the analysis flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisState {
    Idle,
    Selected,
    Analyzing,
    Completed,
    Failed,
}

/// Timing knobs for the analysis flow.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    /// Deadline for one classification request.
    pub analyze_timeout: Duration,
    pub tick_interval: Duration,
    /// Largest random increment per tick, in percent.
    pub max_step: u8,
    /// Simulated progress never passes this value.
    pub progress_ceiling: u8,
    /// How long 100% stays visible before the result is committed.
    pub completion_hold: Duration,
    pub max_image_bytes: usize,
}

impl DashboardSettings {
    pub fn validate(&self) -> PhytoResult<()> {
        if self.analyze_timeout.is_zero() {
            return Err(PhytoError::config("analyze_timeout must be positive"));
        }
        if self.tick_interval.is_zero() {
            return Err(PhytoError::config("tick_interval must be positive"));
        }
        if self.progress_ceiling >= 100 {
            return Err(PhytoError::config("progress_ceiling must be below 100"));
        }
        Ok(())
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            analyze_timeout: Duration::from_secs(30),
            tick_interval: Duration::from_millis(150),
            max_step: 8,
            progress_ceiling: 90,
            completion_hold: Duration::from_millis(500),
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug)]
struct DashboardState {
    analysis: AnalysisState,
    selected: Option<ImagePayload>,
    preview: Option<ImagePreview>,
    history: ClassificationHistory,
    chat: Option<ChatSession>,
    last_alert: Option<String>,
}

struct Inner {
    gateway: Arc<dyn DiagnosisGateway>,
    settings: DashboardSettings,
    state: Mutex<DashboardState>,
    analysis_tx: watch::Sender<AnalysisState>,
    progress_tx: watch::Sender<u8>,
}

/// Client-side controller for the diagnosis dashboard.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

impl Dashboard {
    pub fn new(gateway: Arc<dyn DiagnosisGateway>) -> Self {
        Self::build(gateway, DashboardSettings::default())
    }

    /// Builds a dashboard with custom timings, rejecting invalid ones.
    pub fn with_settings(
        gateway: Arc<dyn DiagnosisGateway>,
        settings: DashboardSettings,
    ) -> PhytoResult<Self> {
        settings.validate()?;
        Ok(Self::build(gateway, settings))
    }

    fn build(gateway: Arc<dyn DiagnosisGateway>, settings: DashboardSettings) -> Self {
        let (analysis_tx, _) = watch::channel(AnalysisState::Idle);
        let (progress_tx, _) = watch::channel(0u8);
        Self {
            inner: Arc::new(Inner {
                gateway,
                settings,
                state: Mutex::new(DashboardState {
                    analysis: AnalysisState::Idle,
                    selected: None,
                    preview: None,
                    history: ClassificationHistory::new(),
                    chat: None,
                    last_alert: None,
                }),
                analysis_tx,
                progress_tx,
            }),
        }
    }

    /// Replaces the history with the two illustrative entries.
    pub fn with_demo_history(self) -> Self {
        self.lock().history = ClassificationHistory::demo();
        self
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, state: &mut DashboardState, next: AnalysisState) {
        tracing::debug!(from = ?state.analysis, to = ?next, "Analysis state change");
        state.analysis = next;
        self.inner.analysis_tx.send_replace(next);
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.inner.settings
    }

    pub fn analysis_state(&self) -> AnalysisState {
        self.lock().analysis
    }

    pub fn subscribe_analysis(&self) -> watch::Receiver<AnalysisState> {
        self.inner.analysis_tx.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.inner.progress_tx.subscribe()
    }

    pub fn progress(&self) -> u8 {
        *self.inner.progress_tx.borrow()
    }

    pub fn selected_preview(&self) -> Option<ImagePreview> {
        self.lock().preview.clone()
    }

    pub fn history(&self) -> ClassificationHistory {
        self.lock().history.clone()
    }

    /// Text of the most recent failed analysis, if any.
    pub fn last_alert(&self) -> Option<String> {
        self.lock().last_alert.clone()
    }

    // ===== Analysis =====

    /// Selects an image for analysis, replacing any previous selection.
    pub fn select_image(&self, image: ImagePayload) -> Result<ImagePreview, FlowError> {
        if image.is_empty() {
            return Err(FlowError::InvalidImage("No image provided".to_string()));
        }
        if image.len() > self.inner.settings.max_image_bytes {
            return Err(FlowError::InvalidImage(format!(
                "Image is {} bytes; the limit is {} bytes",
                image.len(),
                self.inner.settings.max_image_bytes
            )));
        }

        let mut state = self.lock();
        if matches!(
            state.analysis,
            AnalysisState::Analyzing | AnalysisState::Completed
        ) {
            return Err(FlowError::AnalysisInProgress);
        }

        let preview = ImagePreview::from_image(&image);
        state.selected = Some(image);
        state.preview = Some(preview.clone());
        state.last_alert = None;
        self.inner.progress_tx.send_replace(0);
        self.transition(&mut state, AnalysisState::Selected);
        Ok(preview)
    }

    /// Drops the current selection without analyzing it.
    pub fn clear_selection(&self) -> Result<(), FlowError> {
        let mut state = self.lock();
        match state.analysis {
            AnalysisState::Analyzing | AnalysisState::Completed => {
                Err(FlowError::AnalysisInProgress)
            }
            AnalysisState::Selected => {
                state.selected = None;
                state.preview = None;
                self.transition(&mut state, AnalysisState::Idle);
                Ok(())
            }
            _ => Err(FlowError::NoImageSelected),
        }
    }

    /// Classifies the selected image and records the result.
    ///
    /// Accepted only from `Selected`. On success the entry is prepended to
    /// the history, the selection is cleared and the flow returns to `Idle`.
    /// On failure the history is untouched and the image stays selected.
    pub async fn analyze(&self) -> Result<HistoryEntry, FlowError> {
        let (image, preview) = {
            let mut state = self.lock();
            match state.analysis {
                AnalysisState::Selected => {}
                AnalysisState::Analyzing | AnalysisState::Completed | AnalysisState::Failed => {
                    return Err(FlowError::AnalysisInProgress);
                }
                AnalysisState::Idle => return Err(FlowError::NoImageSelected),
            }
            let Some(image) = state.selected.clone() else {
                return Err(FlowError::NoImageSelected);
            };
            let preview = state
                .preview
                .clone()
                .unwrap_or_else(|| ImagePreview::from_image(&image));
            state.last_alert = None;
            self.transition(&mut state, AnalysisState::Analyzing);
            (image, preview)
        };

        // Restores `Selected` if this future is dropped mid-flight.
        let mut guard = AnalysisGuard {
            dashboard: self,
            armed: true,
        };

        let settings = &self.inner.settings;
        self.inner.progress_tx.send_replace(0);
        let ticker = ProgressTicker::start(
            self.inner.progress_tx.clone(),
            settings.tick_interval,
            settings.max_step,
            settings.progress_ceiling,
        );

        let outcome = match tokio::time::timeout(
            settings.analyze_timeout,
            self.inner.gateway.classify(&image),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                budget: settings.analyze_timeout,
            }),
        };

        ticker.stop().await;

        match outcome {
            Ok(result) => {
                self.inner.progress_tx.send_replace(100);
                {
                    let mut state = self.lock();
                    self.transition(&mut state, AnalysisState::Completed);
                }
                tokio::time::sleep(settings.completion_hold).await;

                guard.armed = false;
                let mut state = self.lock();
                let entry = state
                    .history
                    .prepend(HistoryEntry::from_result(&result, preview))
                    .clone();
                state.selected = None;
                state.preview = None;
                self.inner.progress_tx.send_replace(0);
                self.transition(&mut state, AnalysisState::Idle);

                tracing::info!(
                    entry_id = %entry.id,
                    label = %entry.label,
                    confidence = entry.confidence,
                    "Analysis recorded"
                );
                Ok(entry)
            }
            Err(error) => {
                guard.armed = false;
                let alert = error.alert_text();
                tracing::warn!(error = %error, "Analysis failed");

                let mut state = self.lock();
                state.last_alert = Some(alert);
                self.transition(&mut state, AnalysisState::Failed);
                self.inner.progress_tx.send_replace(0);
                self.transition(&mut state, AnalysisState::Selected);
                Err(FlowError::Gateway(error))
            }
        }
    }

    /// Removes a history entry. Closes the chat if it was about that entry.
    pub fn delete_entry(&self, id: &str) -> Result<HistoryEntry, FlowError> {
        let mut state = self.lock();
        let removed = state
            .history
            .remove(id)
            .ok_or_else(|| FlowError::EntryNotFound(id.to_string()))?;
        if state.chat.as_ref().is_some_and(|chat| chat.entry_id() == id) {
            state.chat = None;
        }
        Ok(removed)
    }

    // ===== Chat =====

    /// Opens a treatment chat about a history entry, replacing any open one.
    pub fn open_chat(&self, entry_id: &str) -> Result<ChatSession, FlowError> {
        let mut state = self.lock();
        let entry = state
            .history
            .get(entry_id)
            .ok_or_else(|| FlowError::EntryNotFound(entry_id.to_string()))?;
        let session = ChatSession::open(entry);
        state.chat = Some(session.clone());
        Ok(session)
    }

    pub fn chat(&self) -> Option<ChatSession> {
        self.lock().chat.clone()
    }

    pub fn set_chat_input(&self, text: impl Into<String>) -> Result<(), FlowError> {
        let mut state = self.lock();
        let chat = state.chat.as_mut().ok_or(ChatError::NoSession)?;
        chat.set_input(text);
        Ok(())
    }

    /// Sends the chat input and appends the assistant's reply.
    ///
    /// A failed gateway call still completes the turn, with a local
    /// fallback message. If the session is closed or replaced while the
    /// reply is pending, the reply is discarded.
    pub async fn send_message(&self) -> Result<ChatMessage, FlowError> {
        let (session_id, request) = {
            let mut state = self.lock();
            let chat = state.chat.as_mut().ok_or(ChatError::NoSession)?;
            let request = chat.begin_turn()?;
            (chat.id().to_string(), request)
        };

        let reply = self.inner.gateway.chat(&request).await;

        let mut state = self.lock();
        let chat = match state.chat.as_mut() {
            Some(chat) if chat.id() == session_id => chat,
            _ => {
                tracing::debug!(session_id = %session_id, "Chat closed before reply arrived");
                return Err(ChatError::NoSession.into());
            }
        };

        let message = match reply {
            Ok(text) => chat.complete_turn(text)?,
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                chat.fail_turn()?
            }
        };
        Ok(message.clone())
    }

    /// Closes the chat, discarding its messages and input.
    pub fn close_chat(&self) {
        self.lock().chat = None;
    }
}

struct AnalysisGuard<'a> {
    dashboard: &'a Dashboard,
    armed: bool,
}

impl Drop for AnalysisGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.dashboard.lock();
        if matches!(
            state.analysis,
            AnalysisState::Analyzing | AnalysisState::Completed
        ) {
            self.dashboard.inner.progress_tx.send_replace(0);
            let next = if state.selected.is_some() {
                AnalysisState::Selected
            } else {
                AnalysisState::Idle
            };
            self.dashboard.transition(&mut state, next);
        }
    }
}
