use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use recall_core::Clock;
use recall_core::model::{
    Card, CardId, CardRef, ProgressCounts, ReviewGrade, StatsHistory, StoreData,
};
use storage::{Autosave, DEFAULT_FLUSH_DELAY, Snapshot, StorageError, StoreBackend};

use crate::error::WorkflowError;
use crate::sessions::{
    DeckListing, ReviewSession, SessionBuilder, SessionCard, progress_for, resume_hint,
};
use crate::{card_service, deck_service, import_export, search, stats_service};

/// Everything the application keeps in memory and persists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub store: StoreData,
    pub stats: StatsHistory,
}

/// Orchestrates the store, the review sessions, and debounced persistence.
///
/// All mutation happens synchronously under one lock; after every
/// successful mutation the daily stats are logged and a snapshot is handed
/// to the autosave task, which coalesces bursts into a single physical
/// write. `shutdown` is the final-flush path.
pub struct StudyWorkflow {
    state: Arc<Mutex<AppState>>,
    autosave: Autosave,
    clock: Clock,
    shuffle_mode: AtomicBool,
}

impl StudyWorkflow {
    /// Loads persisted state (or defaults on first run) and starts the
    /// autosave task on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Storage` if existing documents cannot be
    /// read.
    pub async fn load(
        backend: Arc<dyn StoreBackend>,
        clock: Clock,
    ) -> Result<Self, WorkflowError> {
        let store = backend.load_store().await?;
        let stats = backend.load_stats().await?;
        debug!(decks = store.decks.len(), "loaded persisted state");

        Ok(Self {
            state: Arc::new(Mutex::new(AppState { store, stats })),
            autosave: Autosave::spawn(backend, DEFAULT_FLUSH_DELAY),
            clock,
            shuffle_mode: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn shuffle_mode(&self) -> bool {
        self.shuffle_mode.load(Ordering::SeqCst)
    }

    pub fn set_shuffle_mode(&self, on: bool) {
        self.shuffle_mode.store(on, Ordering::SeqCst);
    }

    /// Discards interrupted sessions and legacy shuffled queues, e.g.
    /// after the user turns shuffle mode off and confirms.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Poisoned` if the state lock is poisoned.
    pub fn discard_pending_sessions(&self) -> Result<(), WorkflowError> {
        let mut state = self.lock()?;
        state.store.shuffled_queues.clear();
        state.store.saved_session = None;
        self.mark_dirty(&mut state);
        Ok(())
    }

    // ─── Review sessions ───────────────────────────────────────────────────

    /// Starts (or resumes) a review for a deck or group.
    ///
    /// # Errors
    ///
    /// `SessionError::NoCards` when the selection is empty; any stale
    /// saved session is cleared and persisted even then.
    pub fn start_session(&self, deck_name: &str) -> Result<ReviewSession, WorkflowError> {
        let mut state = self.lock()?;
        let result = SessionBuilder::new()
            .with_shuffle(self.shuffle_mode())
            .build(&mut state.store, deck_name);
        self.mark_dirty(&mut state);
        let session = result?;
        // A resumed session restores the shuffle flag it was saved with.
        self.shuffle_mode.store(session.is_shuffle(), Ordering::SeqCst);
        Ok(session)
    }

    /// Starts an ad hoc review over the starred cards of a selection.
    ///
    /// # Errors
    ///
    /// `SessionError::NoCards` when nothing is starred.
    pub fn start_starred_review(&self, deck_name: &str) -> Result<ReviewSession, WorkflowError> {
        let mut state = self.lock()?;
        let starred = card_service::starred_cards(&state.store, deck_name);
        let result = SessionBuilder::new()
            .with_shuffle(self.shuffle_mode())
            .build_adhoc(&mut state.store, deck_name, starred);
        self.mark_dirty(&mut state);
        Ok(result?)
    }

    /// Starts an ad hoc review over search results.
    ///
    /// # Errors
    ///
    /// `SessionError::NoCards` when nothing matches.
    pub fn start_search_review(&self, query: &str) -> Result<ReviewSession, WorkflowError> {
        let mut state = self.lock()?;
        let matches = search::search_cards(&state.store, query);
        let result = SessionBuilder::new()
            .with_shuffle(self.shuffle_mode())
            .build_adhoc(&mut state.store, query, matches);
        self.mark_dirty(&mut state);
        Ok(result?)
    }

    /// Grades the current card and advances the session.
    ///
    /// # Errors
    ///
    /// `SessionError::NoCurrentCard` when nothing is presented.
    pub fn grade(
        &self,
        session: &mut ReviewSession,
        grade: ReviewGrade,
    ) -> Result<(), WorkflowError> {
        let mut state = self.lock()?;
        session.grade(&mut state.store, grade)?;
        self.mark_dirty(&mut state);
        Ok(())
    }

    /// Reverts the most recent grading action.
    ///
    /// # Errors
    ///
    /// `SessionError::NothingToUndo` when the undo log is empty.
    pub fn undo(&self, session: &mut ReviewSession) -> Result<(), WorkflowError> {
        let mut state = self.lock()?;
        session.undo(&mut state.store)?;
        self.mark_dirty(&mut state);
        Ok(())
    }

    /// Toggles the star on the current card, returning the new state.
    ///
    /// # Errors
    ///
    /// `SessionError::NoCurrentCard` when nothing is presented.
    pub fn toggle_star(&self, session: &mut ReviewSession) -> Result<bool, WorkflowError> {
        let mut state = self.lock()?;
        let starred = session.toggle_star(&mut state.store)?;
        self.mark_dirty(&mut state);
        Ok(starred)
    }

    /// Deletes the currently presented card and advances.
    ///
    /// # Errors
    ///
    /// `SessionError::NoCurrentCard` when nothing is presented.
    pub fn delete_current(&self, session: &mut ReviewSession) -> Result<Card, WorkflowError> {
        let mut state = self.lock()?;
        let removed = session.delete_current(&mut state.store)?;
        self.mark_dirty(&mut state);
        Ok(removed)
    }

    // ─── Read-only views ───────────────────────────────────────────────────

    /// Progress counts for a deck or group.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Poisoned` if the state lock is poisoned.
    pub fn progress(&self, name: &str) -> Result<ProgressCounts, WorkflowError> {
        Ok(progress_for(&self.lock()?.store, name))
    }

    /// Number of cards a "continue" action would resume, if any.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Poisoned` if the state lock is poisoned.
    pub fn resume_hint(&self, deck_name: &str) -> Result<Option<usize>, WorkflowError> {
        Ok(resume_hint(&self.lock()?.store, deck_name))
    }

    /// Sorted deck and group names.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Poisoned` if the state lock is poisoned.
    pub fn listing(&self) -> Result<DeckListing, WorkflowError> {
        Ok(crate::sessions::listing(&self.lock()?.store))
    }

    /// Runs a search without starting a session.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Poisoned` if the state lock is poisoned.
    pub fn search(&self, query: &str) -> Result<Vec<SessionCard>, WorkflowError> {
        Ok(search::search_cards(&self.lock()?.store, query))
    }

    // ─── Deck, group and card management ───────────────────────────────────

    /// Creates a deck from bulk card text.
    ///
    /// # Errors
    ///
    /// Propagates `DeckServiceError` for invalid input; the store is
    /// untouched and nothing is persisted in that case.
    pub fn create_deck(&self, name: &str, bulk_text: &str) -> Result<usize, WorkflowError> {
        self.mutate(|state| Ok(deck_service::create_deck(&mut state.store, name, bulk_text)?))
    }

    /// Renames a deck, rewriting all references.
    ///
    /// # Errors
    ///
    /// Propagates `DeckServiceError` for invalid input.
    pub fn rename_deck(&self, old_name: &str, new_name: &str) -> Result<(), WorkflowError> {
        self.mutate(|state| Ok(deck_service::rename_deck(&mut state.store, old_name, new_name)?))
    }

    /// Deletes a deck and scrubs references to it.
    ///
    /// # Errors
    ///
    /// Propagates `DeckServiceError::UnknownDeck`.
    pub fn delete_deck(&self, name: &str) -> Result<(), WorkflowError> {
        self.mutate(|state| Ok(deck_service::delete_deck(&mut state.store, name)?))
    }

    /// Resets study progress for a deck or group.
    ///
    /// # Errors
    ///
    /// Propagates `DeckServiceError::UnknownDeck`.
    pub fn reset_progress(&self, name: &str) -> Result<usize, WorkflowError> {
        self.mutate(|state| Ok(deck_service::reset_progress(&mut state.store, name)?))
    }

    /// Creates a deck group.
    ///
    /// # Errors
    ///
    /// Propagates `DeckServiceError` for invalid input.
    pub fn create_group(&self, name: &str, members: &[String]) -> Result<(), WorkflowError> {
        self.mutate(|state| Ok(deck_service::create_group(&mut state.store, name, members)?))
    }

    /// Deletes a deck group, leaving member decks alone.
    ///
    /// # Errors
    ///
    /// Propagates `DeckServiceError::UnknownGroup`.
    pub fn delete_group(&self, name: &str) -> Result<(), WorkflowError> {
        self.mutate(|state| Ok(deck_service::delete_group(&mut state.store, name)?))
    }

    /// Appends bulk-parsed cards to a deck.
    ///
    /// # Errors
    ///
    /// Propagates `CardServiceError` for invalid input.
    pub fn add_cards(&self, deck_name: &str, text: &str) -> Result<usize, WorkflowError> {
        self.mutate(|state| Ok(card_service::add_cards(&mut state.store, deck_name, text)?))
    }

    /// Rewrites one card from a bulk-format line.
    ///
    /// # Errors
    ///
    /// Propagates `CardServiceError` for invalid input or missing targets.
    pub fn edit_card(
        &self,
        deck_name: &str,
        card_id: &CardId,
        line: &str,
    ) -> Result<(), WorkflowError> {
        self.mutate(|state| Ok(card_service::edit_card(&mut state.store, deck_name, card_id, line)?))
    }

    /// Bulk-deletes cards by reference, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Poisoned` if the state lock is poisoned.
    pub fn delete_cards(&self, refs: &[CardRef]) -> Result<usize, WorkflowError> {
        self.mutate(|state| Ok(card_service::delete_cards(&mut state.store, refs)))
    }

    // ─── Backup ────────────────────────────────────────────────────────────

    /// Serializes the in-memory store, which is always at least as fresh
    /// as what a pending debounced write would put on disk.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Storage` if serialization fails.
    pub fn export(&self) -> Result<String, WorkflowError> {
        let state = self.lock()?;
        import_export::export_store(&state.store)
            .map_err(|e| WorkflowError::Storage(StorageError::Serialization(e)))
    }

    /// Replaces the whole store from a backup payload, atomically.
    ///
    /// # Errors
    ///
    /// Propagates `ImportError`; the existing store survives any failure.
    pub fn import(&self, json: &str) -> Result<(), WorkflowError> {
        let imported = import_export::import_store(json)?;
        let mut state = self.lock()?;
        state.store = imported;
        self.mark_dirty(&mut state);
        Ok(())
    }

    // ─── Persistence control ───────────────────────────────────────────────

    /// Writes any pending snapshot immediately.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Storage` if the write fails.
    pub async fn flush(&self) -> Result<(), WorkflowError> {
        Ok(self.autosave.flush().await?)
    }

    /// Flushes pending state and stops the autosave task.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Storage` if the final write fails.
    pub async fn shutdown(self) -> Result<(), WorkflowError> {
        Ok(self.autosave.shutdown().await?)
    }

    // ─── Internals ─────────────────────────────────────────────────────────

    fn lock(&self) -> Result<MutexGuard<'_, AppState>, WorkflowError> {
        self.state
            .lock()
            .map_err(|e| WorkflowError::Poisoned(e.to_string()))
    }

    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut AppState) -> Result<R, WorkflowError>,
    ) -> Result<R, WorkflowError> {
        let mut state = self.lock()?;
        let result = f(&mut state)?;
        self.mark_dirty(&mut state);
        Ok(result)
    }

    /// Logs today's stats and hands the latest snapshot to the flusher.
    fn mark_dirty(&self, state: &mut AppState) {
        stats_service::log_daily_stats(&state.store, &mut state.stats, self.clock.today());
        self.autosave.schedule(Snapshot {
            store: state.store.clone(),
            stats: state.stats.clone(),
        });
    }
}
