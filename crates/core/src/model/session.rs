use serde::{Deserialize, Serialize};

use crate::model::ids::CardId;

/// Weak reference to a card: id plus the deck it was drawn from.
///
/// Refs are resolved by lookup at use time; a ref whose card has since been
/// deleted is silently filtered, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    pub id: CardId,
    pub original_deck: String,
}

impl CardRef {
    #[must_use]
    pub fn new(id: CardId, original_deck: impl Into<String>) -> Self {
        Self {
            id,
            original_deck: original_deck.into(),
        }
    }
}

/// Durable projection of an in-progress review session.
///
/// Queues are stored as ordered reference lists, by identity rather than by
/// value, so edits to the underlying cards survive an interrupt/resume
/// round trip. Exists if and only if a resumable review is in-flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub deck_name: String,
    pub session_queue_ids: Vec<CardRef>,
    pub learning_cards_queue_ids: Vec<CardRef>,
    pub current_card_id: Option<CardRef>,
    pub is_shuffle_mode: bool,
}

impl SavedSession {
    /// Number of cards waiting in the saved review queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.session_queue_ids.len()
    }

    /// Drops every reference to the given card, clearing the current
    /// pointer when it matches. Used when cards are deleted outside an
    /// active session.
    pub fn purge_card(&mut self, card_ref: &CardRef) {
        self.session_queue_ids.retain(|r| r != card_ref);
        self.learning_cards_queue_ids.retain(|r| r != card_ref);
        if self.current_card_id.as_ref() == Some(card_ref) {
            self.current_card_id = None;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
