//! ConversationController - runs the ask and add-source workflows for one
//! session.
//!
//! # State Machine
//!
//! ```text
//! Idle ──submit──▶ Submitting ──remote call resolves──▶ Settled ──▶ Idle
//! ```
//!
//! One busy flag covers both workflows. While it is set every submission is
//! rejected with [`ControllerError::Busy`], so entries land in the transcript
//! in the order workflows complete and never interleave.
//!
//! # Optimistic Entries
//!
//! The first entry of a workflow (the user's question, or the "Adding the
//! following ..." notice) is shown immediately as *pending*. Pending entries
//! are persisted together with the workflow's terminal entry. A failed ask
//! persists nothing and asks the view to reload, which drops the pending
//! question.

mod state;

pub use state::{AskOutcome, ControllerError, IngestOutcome, Phase, Workflow};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::event_bus::{ConversationEvent, EventBus};
use crate::remote::{ModelConfig, RemoteService};
use crate::session::{ChatEntry, SessionKey, SessionStore, Transcript};
use crate::sources::SourceDraft;

/// Drives the workflows of one open session.
pub struct ConversationController {
    key: SessionKey,
    store: Arc<SessionStore>,
    remote: Arc<dyn RemoteService>,
    model: ModelConfig,
    events: Arc<EventBus>,
    phase: Mutex<Phase>,
    /// Optimistic entries not yet persisted, in display order.
    pending: Mutex<Vec<ChatEntry>>,
}

impl ConversationController {
    /// Open the session for `key` and prepare to run workflows against it.
    pub fn new(
        key: SessionKey,
        store: Arc<SessionStore>,
        remote: Arc<dyn RemoteService>,
        model: ModelConfig,
        events: Arc<EventBus>,
    ) -> Self {
        let existing = store.open(&key).len();
        log::info!("Opened session {key} with {existing} entries");

        Self {
            key,
            store,
            remote,
            model,
            events,
            phase: Mutex::new(Phase::Idle),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn phase(&self) -> Phase {
        *self.phase_lock()
    }

    /// True while a workflow is submitting. Callers gate their input on it.
    pub fn is_busy(&self) -> bool {
        self.phase().is_busy()
    }

    /// Subscribe to changes of this conversation.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    /// Everything the view should show: persisted entries followed by
    /// pending ones.
    pub fn transcript(&self) -> Transcript {
        let mut transcript = self.store.current(&self.key);
        transcript.extend(self.pending_lock().iter().cloned());
        transcript
    }

    /// Ask the bot a question.
    ///
    /// The question is shown right away; the answer is appended and both are
    /// persisted once the remote call succeeds. On failure nothing is
    /// persisted, [`ConversationEvent::ReloadRequested`] is emitted once, and
    /// the caller should [`reload`](Self::reload). No retries.
    pub async fn submit_ask(&self, query: &str) -> Result<AskOutcome, ControllerError> {
        if query.trim().is_empty() {
            return Err(ControllerError::EmptyQuery);
        }
        let mut submitting = self.begin(Workflow::Ask)?;

        submitting.show(ChatEntry::human(query));

        let outcome = match self.remote.answer(query, &self.model).await {
            Ok(answer) => {
                let reply = ChatEntry::bot(answer.response);

                let mut settled = submitting.settle();
                settled.push(reply.clone());
                self.store.append(&self.key, settled);

                self.events.emit(ConversationEvent::EntryAppended {
                    entry: reply.clone(),
                    pending: false,
                });
                self.events.emit(ConversationEvent::WorkflowSettled {
                    workflow: Workflow::Ask,
                    success: true,
                });
                AskOutcome::Answered(reply)
            }
            Err(e) => {
                log::error!("Answer request for {} failed: {e}", self.key);
                // The question stays on screen until the view reloads.
                submitting.keep_pending();
                self.events.emit(ConversationEvent::WorkflowSettled {
                    workflow: Workflow::Ask,
                    success: false,
                });
                self.events.emit(ConversationEvent::ReloadRequested);
                AskOutcome::ReloadRequired(e)
            }
        };

        Ok(outcome)
    }

    /// Ask the bot to ingest a source.
    ///
    /// Appends an announcement, makes one ingest call, then appends exactly
    /// one success or failure entry and persists both. Remote failures are
    /// reported in the transcript, not returned as errors. The draft is
    /// consumed whatever the outcome.
    pub async fn submit_add_source(
        &self,
        draft: SourceDraft,
    ) -> Result<IngestOutcome, ControllerError> {
        if draft.is_blank() {
            return Err(ControllerError::EmptyLocator);
        }
        let mut submitting = self.begin(Workflow::AddSource)?;

        submitting.show(ChatEntry::bot(draft.announce_message()));

        let (terminal, outcome) = match self.remote.ingest(&draft, &self.model).await {
            Ok(()) => {
                log::info!("Added {} to {}", draft.kind, self.key);
                (
                    ChatEntry::bot(draft.kind.success_message()),
                    IngestOutcome::Added,
                )
            }
            Err(e) => {
                log::warn!("Failed to add {} to {}: {e}", draft.kind, self.key);
                (
                    ChatEntry::bot(draft.kind.failure_message()),
                    IngestOutcome::Failed(e),
                )
            }
        };

        let mut settled = submitting.settle();
        settled.push(terminal.clone());
        self.store.append(&self.key, settled);

        self.events.emit(ConversationEvent::EntryAppended {
            entry: terminal,
            pending: false,
        });
        self.events.emit(ConversationEvent::WorkflowSettled {
            workflow: Workflow::AddSource,
            success: outcome.is_success(),
        });

        Ok(outcome)
    }

    /// Drop pending entries and reload the session from durable storage.
    ///
    /// This is the response to [`ConversationEvent::ReloadRequested`].
    /// Entries whose persistence failed are lost, as they would be on a page
    /// reload.
    pub fn reload(&self) -> Transcript {
        let discarded = {
            let mut pending = self.pending_lock();
            let count = pending.len();
            pending.clear();
            count
        };

        self.store.close(&self.key);
        let transcript = self.store.open(&self.key);

        log::info!(
            "Reloaded {} ({} entries, {} pending discarded)",
            self.key,
            transcript.len(),
            discarded
        );
        self.events.emit(ConversationEvent::Reloaded {
            entries: transcript.len(),
        });
        transcript
    }

    /// Close the view. The in-memory transcript is detached; durable storage
    /// is kept.
    pub fn close(self) {
        self.store.close(&self.key);
        log::debug!("Closed session {}", self.key);
    }

    fn begin(&self, workflow: Workflow) -> Result<Submitting<'_>, ControllerError> {
        {
            let mut phase = self.phase_lock();
            if let Phase::Submitting(active) = *phase {
                log::debug!("Rejected {workflow} while {active} is submitting");
                return Err(ControllerError::Busy(active));
            }
            *phase = Phase::Submitting(workflow);
        }

        self.events.emit(ConversationEvent::BusyChanged { busy: true });
        Ok(Submitting {
            controller: self,
            unsettled: None,
        })
    }

    /// Show `entry` as pending and return its position in the pending list.
    fn push_pending(&self, entry: ChatEntry) -> usize {
        let mark = {
            let mut pending = self.pending_lock();
            pending.push(entry.clone());
            pending.len() - 1
        };

        self.events.emit(ConversationEvent::EntryAppended {
            entry,
            pending: true,
        });
        mark
    }

    /// Remove and return the pending entries from `mark` onward.
    ///
    /// Entries before `mark` belong to an earlier failed ask that is waiting
    /// for a reload; they are left alone.
    fn take_pending(&self, mark: usize) -> Vec<ChatEntry> {
        let mut pending = self.pending_lock();
        let at = mark.min(pending.len());
        pending.split_off(at)
    }

    fn phase_lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending_lock(&self) -> MutexGuard<'_, Vec<ChatEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held for the duration of a submission; returns the controller to idle
/// when dropped, including when the submitting future is dropped early.
///
/// A submission dropped before it settles also takes back the pending entries
/// it showed, so an abandoned question does not linger in the transcript.
struct Submitting<'a> {
    controller: &'a ConversationController,
    /// Start of this submission's pending entries until it settles.
    unsettled: Option<usize>,
}

impl Submitting<'_> {
    /// Show `entry` as pending for this submission.
    fn show(&mut self, entry: ChatEntry) {
        let mark = self.controller.push_pending(entry);
        self.unsettled.get_or_insert(mark);
    }

    /// Take this submission's pending entries for persisting.
    fn settle(&mut self) -> Vec<ChatEntry> {
        match self.unsettled.take() {
            Some(mark) => self.controller.take_pending(mark),
            None => Vec::new(),
        }
    }

    /// Leave this submission's pending entries in place for a later reload.
    fn keep_pending(&mut self) {
        self.unsettled = None;
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        if let Some(mark) = self.unsettled.take() {
            let discarded = self.controller.take_pending(mark).len();
            log::debug!(
                "Discarded {discarded} pending entries of an abandoned submission for {}",
                self.controller.key
            );
        }

        *self.controller.phase_lock() = Phase::Idle;
        self.controller
            .events
            .emit(ConversationEvent::BusyChanged { busy: false });
    }
}

// ============================================================================
// TESTS
// ============================================================================
