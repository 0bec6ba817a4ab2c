mod builder;
mod engine;
mod persistence;
mod progress;

// Public API of the review-session subsystem.
pub use crate::error::SessionError;
pub use builder::SessionBuilder;
pub use engine::ReviewSession;
pub use persistence::resume_hint;
pub use progress::{DeckListing, ListingCache, listing, progress_for};

use recall_core::model::{Card, CardRef};

/// Transient copy of a card enriched with the deck it was drawn from.
///
/// Session cards live only while a review is in-flight; grading and
/// starring write through to the authoritative card, everything else on
/// the copy is discarded at session end.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCard {
    pub card: Card,
    pub original_deck: String,
}

impl SessionCard {
    #[must_use]
    pub fn new(card: Card, original_deck: impl Into<String>) -> Self {
        Self {
            card,
            original_deck: original_deck.into(),
        }
    }

    /// Identity reference used by the saved-session projection.
    #[must_use]
    pub fn card_ref(&self) -> CardRef {
        CardRef::new(self.card.id.clone(), self.original_deck.clone())
    }
}
