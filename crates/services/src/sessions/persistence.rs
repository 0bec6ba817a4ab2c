use std::collections::VecDeque;

use tracing::debug;

use recall_core::model::{CardRef, SavedSession, StoreData};

use super::{SessionCard, engine::ReviewSession};

/// Projects a session into its durable form.
///
/// Returns `Some` only while a resumable review is in-flight, i.e. the
/// review queue still holds cards; everything else (completion, the last
/// card being presented, ad hoc sessions) projects to `None` so the
/// invariant "saved session exists iff a review is in-flight" holds.
pub(crate) fn project(session: &ReviewSession) -> Option<SavedSession> {
    if !session.is_resumable() || session.queued().is_empty() {
        return None;
    }

    Some(SavedSession {
        deck_name: session.deck_name().to_owned(),
        session_queue_ids: session.queued().iter().map(SessionCard::card_ref).collect(),
        learning_cards_queue_ids: session.relearning().iter().map(SessionCard::card_ref).collect(),
        current_card_id: session.current_card().map(SessionCard::card_ref),
        is_shuffle_mode: session.is_shuffle(),
    })
}

/// Queues rebuilt from a saved session, stale references filtered out.
pub(crate) struct Rehydrated {
    pub queue: VecDeque<SessionCard>,
    pub learning: Vec<SessionCard>,
    pub current: Option<SessionCard>,
}

/// Resolves a saved session back into live session cards.
///
/// Every reference is looked up by `(id, original deck)`; cards deleted
/// since the save are skipped silently. The caller reinserts `current` at
/// the front of the queue so it is shown again first.
pub(crate) fn rehydrate(store: &StoreData, saved: &SavedSession) -> Rehydrated {
    Rehydrated {
        queue: resolve_refs(store, &saved.session_queue_ids).collect(),
        learning: resolve_refs(store, &saved.learning_cards_queue_ids).collect(),
        current: saved
            .current_card_id
            .as_ref()
            .and_then(|r| resolve_ref(store, r)),
    }
}

fn resolve_refs<'a>(
    store: &'a StoreData,
    refs: &'a [CardRef],
) -> impl Iterator<Item = SessionCard> + 'a {
    refs.iter().filter_map(|r| resolve_ref(store, r))
}

fn resolve_ref(store: &StoreData, card_ref: &CardRef) -> Option<SessionCard> {
    match store.find_card(card_ref) {
        Some(card) => Some(SessionCard::new(card.clone(), card_ref.original_deck.clone())),
        None => {
            debug!(card = %card_ref.id, deck = %card_ref.original_deck,
                "saved reference no longer resolves; skipping");
            None
        }
    }
}

/// Number of cards waiting in a saved session for the given selection,
/// e.g. for a "Continue (N cards)" button label.
#[must_use]
pub fn resume_hint(store: &StoreData, deck_name: &str) -> Option<usize> {
    store
        .saved_session
        .as_ref()
        .filter(|s| s.deck_name == deck_name && s.queued() > 0)
        .map(SavedSession::queued)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
