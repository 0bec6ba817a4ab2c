use std::collections::VecDeque;

use rand::seq::SliceRandom;
use tracing::debug;

use recall_core::model::{Card, CardStatus, ReviewGrade, StoreData};

use super::{SessionCard, persistence};
use crate::error::SessionError;

/// Maximum number of grading actions that can be reverted.
const UNDO_CAP: usize = 5;

/// Deep pre-mutation copy of a graded card, most-recent-first.
#[derive(Debug, Clone, PartialEq)]
struct UndoEntry {
    card_before: Card,
    deck_name: String,
}

/// In-flight review session for a deck or group.
///
/// Runs `Presenting(card) → Graded → Presenting(next) → … → Complete`:
/// cards are popped off the review queue, grading writes through to the
/// authoritative card in the store, forgotten cards replay after the
/// current pass empties, and every transition re-projects the saved
/// session so a debounced flush always snapshots a consistent state.
pub struct ReviewSession {
    deck_name: String,
    queue: VecDeque<SessionCard>,
    learning: Vec<SessionCard>,
    current: Option<SessionCard>,
    shuffle: bool,
    resumable: bool,
    undo_log: Vec<UndoEntry>,
    complete: bool,
}

impl ReviewSession {
    pub(crate) fn from_parts(
        deck_name: impl Into<String>,
        queue: VecDeque<SessionCard>,
        learning: Vec<SessionCard>,
        shuffle: bool,
        resumable: bool,
    ) -> Self {
        Self {
            deck_name: deck_name.into(),
            queue,
            learning,
            current: None,
            shuffle,
            resumable,
            undo_log: Vec::new(),
            complete: false,
        }
    }

    // Accessors

    #[must_use]
    pub fn deck_name(&self) -> &str {
        &self.deck_name
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&SessionCard> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Cards still waiting in the current pass, excluding the current card.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Forgotten cards waiting to replay after this pass.
    #[must_use]
    pub fn relearning_pending(&self) -> usize {
        self.learning.len()
    }

    #[must_use]
    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    /// Ad hoc sessions (starred, search results) are not resumable and
    /// never produce a saved session.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.resumable
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_log.is_empty()
    }

    pub(crate) fn queued(&self) -> &VecDeque<SessionCard> {
        &self.queue
    }

    pub(crate) fn relearning(&self) -> &[SessionCard] {
        &self.learning
    }

    // Transitions

    /// Presents the next card.
    ///
    /// Pops the review queue; when it runs dry the relearning queue is
    /// moved in wholesale (reshuffled in shuffle mode) and retried; when
    /// both are empty the session completes and the saved session clears.
    pub fn advance(&mut self, store: &mut StoreData) {
        loop {
            if let Some(next) = self.queue.pop_front() {
                self.current = Some(next);
                break;
            }
            if self.learning.is_empty() {
                self.current = None;
                self.complete = true;
                debug!(deck = %self.deck_name, "review session complete");
                break;
            }

            let mut replay = std::mem::take(&mut self.learning);
            if self.shuffle {
                replay.as_mut_slice().shuffle(&mut rand::rng());
            }
            debug!(deck = %self.deck_name, count = replay.len(), "replaying forgotten cards");
            self.queue.extend(replay);
        }
        self.persist_into(store);
    }

    /// Applies a grade to the current card and advances.
    ///
    /// The authoritative card is located by `(deck, id)`; when it was
    /// deleted mid-session the grade is a no-op. A deep pre-mutation copy
    /// lands on the undo log (capped, oldest dropped).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentCard` if no card is presented.
    pub fn grade(&mut self, store: &mut StoreData, grade: ReviewGrade) -> Result<(), SessionError> {
        let Some(current) = self.current.clone() else {
            return Err(SessionError::NoCurrentCard);
        };

        let card_ref = current.card_ref();
        let Some(card) = store.find_card_mut(&card_ref) else {
            debug!(card = %card_ref.id, deck = %card_ref.original_deck,
                "graded card no longer exists; ignoring");
            return Ok(());
        };

        self.undo_log.insert(
            0,
            UndoEntry {
                card_before: card.clone(),
                deck_name: card_ref.original_deck.clone(),
            },
        );
        self.undo_log.truncate(UNDO_CAP);

        match grade {
            ReviewGrade::Forgot => {
                card.status = CardStatus::Learning;
                card.correct_streak = 0;
                self.learning.push(current);
            }
            ReviewGrade::Known => {
                if matches!(card.status, CardStatus::NotStudied | CardStatus::Learning) {
                    card.status = CardStatus::Mastered;
                }
            }
        }

        self.advance(store);
        Ok(())
    }

    /// Reverts the most recent grading action.
    ///
    /// The authoritative card is overwritten with its pre-mutation
    /// snapshot, scrubbed from the relearning queue, and becomes current
    /// again; the card that was current is pushed back behind it. Entries
    /// whose deck or card has vanished are silently consumed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NothingToUndo` if the undo log is empty.
    pub fn undo(&mut self, store: &mut StoreData) -> Result<(), SessionError> {
        if self.undo_log.is_empty() {
            return Err(SessionError::NothingToUndo);
        }
        let entry = self.undo_log.remove(0);

        let Some(deck) = store.decks.get_mut(&entry.deck_name) else {
            debug!(deck = %entry.deck_name, "undo target deck no longer exists");
            return Ok(());
        };
        let Some(pos) = deck.iter().position(|c| c.id == entry.card_before.id) else {
            debug!(card = %entry.card_before.id, "undo target card no longer exists");
            return Ok(());
        };

        deck[pos] = entry.card_before;
        let restored = SessionCard::new(deck[pos].clone(), entry.deck_name.clone());

        self.learning
            .retain(|c| !(c.card.id == restored.card.id && c.original_deck == restored.original_deck));

        if let Some(previous) = self.current.take() {
            self.queue.push_front(previous);
        }
        self.queue.push_front(restored);
        self.current = self.queue.pop_front();
        self.complete = false;

        self.persist_into(store);
        Ok(())
    }

    /// Flips the star on the current card, writing through to the store.
    ///
    /// Queue order is unaffected. Returns the new starred state; a card
    /// deleted mid-session leaves everything unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentCard` if no card is presented.
    pub fn toggle_star(&mut self, store: &mut StoreData) -> Result<bool, SessionError> {
        let Some(current) = self.current.as_ref() else {
            return Err(SessionError::NoCurrentCard);
        };

        let card_ref = current.card_ref();
        let Some(card) = store.find_card_mut(&card_ref) else {
            return Ok(current.card.starred);
        };

        card.starred = !card.starred;
        let starred = card.starred;
        if let Some(current) = self.current.as_mut() {
            current.card.starred = starred;
        }

        self.persist_into(store);
        Ok(starred)
    }

    /// Deletes the current card from its deck and advances.
    ///
    /// Matching ids are purged from both queues, so the card cannot come
    /// back this session; the re-projection scrubs it from the saved
    /// session as well. Returns the card that was removed (the session
    /// copy when the deck entry was already gone).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentCard` if no card is presented.
    pub fn delete_current(&mut self, store: &mut StoreData) -> Result<Card, SessionError> {
        let Some(current) = self.current.take() else {
            return Err(SessionError::NoCurrentCard);
        };

        let mut removed = None;
        if let Some(deck) = store.decks.get_mut(&current.original_deck)
            && let Some(pos) = deck.iter().position(|c| c.id == current.card.id)
        {
            removed = Some(deck.remove(pos));
        }

        self.queue
            .retain(|c| !(c.card.id == current.card.id && c.original_deck == current.original_deck));
        self.learning
            .retain(|c| !(c.card.id == current.card.id && c.original_deck == current.original_deck));

        self.advance(store);
        Ok(removed.unwrap_or(current.card))
    }

    /// Re-reads the current card's authoritative content after an edit.
    pub fn refresh_current(&mut self, store: &StoreData) {
        if let Some(current) = self.current.as_mut()
            && let Some(card) = store.find_card(&current.card_ref())
        {
            current.card = card.clone();
        }
    }

    fn persist_into(&self, store: &mut StoreData) {
        store.saved_session = persistence::project(self);
    }
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("deck_name", &self.deck_name)
            .field("queued", &self.queue.len())
            .field("relearning", &self.learning.len())
            .field("current", &self.current.as_ref().map(|c| &c.card.id))
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
