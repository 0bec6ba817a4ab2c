use rand::seq::SliceRandom;
use tracing::debug;

use recall_core::model::{CardStatus, StoreData};

use super::{SessionCard, engine::ReviewSession, persistence};
use crate::error::SessionError;

/// Builds the initial queues for a review session.
///
/// A matching saved session always wins over a fresh build; otherwise
/// shuffle mode collects only not-yet-studied cards and permutes them,
/// while sequential mode takes every card in deck-then-card order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBuilder {
    shuffle: bool,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shuffle mode used for fresh (non-resumed) builds.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Builds a session for a deck or group, resuming a matching saved
    /// session when one exists.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCards` if the resulting queue is empty; any
    /// saved session is cleared in that case.
    pub fn build(
        self,
        store: &mut StoreData,
        deck_name: &str,
    ) -> Result<ReviewSession, SessionError> {
        let saved = store
            .saved_session
            .clone()
            .filter(|s| s.deck_name == deck_name);

        let session = if let Some(saved) = saved {
            let rehydrated = persistence::rehydrate(store, &saved);
            let mut queue = rehydrated.queue;
            if let Some(current) = rehydrated.current {
                // Show the interrupted card again first.
                queue.push_front(current);
            }
            debug!(deck = deck_name, queued = queue.len(), "resuming saved session");
            ReviewSession::from_parts(
                deck_name,
                queue,
                rehydrated.learning,
                saved.is_shuffle_mode,
                true,
            )
        } else if self.shuffle {
            let mut pool = Vec::new();
            for deck in store.member_decks(deck_name) {
                if let Some(cards) = store.decks.get(&deck) {
                    pool.extend(
                        cards
                            .iter()
                            .filter(|c| c.status == CardStatus::NotStudied)
                            .map(|c| SessionCard::new(c.clone(), deck.clone())),
                    );
                }
            }
            pool.as_mut_slice().shuffle(&mut rand::rng());
            ReviewSession::from_parts(deck_name, pool.into(), Vec::new(), true, true)
        } else {
            let mut pool = Vec::new();
            for deck in store.member_decks(deck_name) {
                if let Some(cards) = store.decks.get(&deck) {
                    pool.extend(cards.iter().map(|c| SessionCard::new(c.clone(), deck.clone())));
                }
            }
            ReviewSession::from_parts(deck_name, pool.into(), Vec::new(), false, true)
        };

        finish(store, session)
    }

    /// Builds an ad hoc session from an explicit card list (starred-only or
    /// search results).
    ///
    /// Bypasses resume and status filtering, shuffles only when shuffle
    /// mode is on, and clears any saved session: ad hoc reviews are never
    /// resumable. Cards without an origin deck are resolved by scanning,
    /// falling back to the active selection name.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCards` if the supplied list is empty.
    pub fn build_adhoc(
        self,
        store: &mut StoreData,
        deck_name: &str,
        cards: Vec<SessionCard>,
    ) -> Result<ReviewSession, SessionError> {
        store.saved_session = None;

        let mut pool: Vec<SessionCard> = cards
            .into_iter()
            .map(|card| resolve_origin(store, card, deck_name))
            .collect();
        if self.shuffle {
            pool.as_mut_slice().shuffle(&mut rand::rng());
        }

        let session =
            ReviewSession::from_parts(deck_name, pool.into(), Vec::new(), self.shuffle, false);
        finish(store, session)
    }
}

fn finish(
    store: &mut StoreData,
    mut session: ReviewSession,
) -> Result<ReviewSession, SessionError> {
    if session.remaining() == 0 {
        store.saved_session = None;
        return Err(SessionError::NoCards);
    }
    session.advance(store);
    Ok(session)
}

fn resolve_origin(store: &StoreData, mut card: SessionCard, fallback: &str) -> SessionCard {
    if card.original_deck.is_empty() {
        card.original_deck = store
            .decks
            .iter()
            .find(|(_, cards)| cards.iter().any(|c| c.id == card.card.id))
            .map_or_else(|| fallback.to_owned(), |(name, _)| name.clone());
    }
    card
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::model::{Card, CardId, CardRef, SavedSession};
    use std::collections::BTreeSet;

    fn card(id: &str, status: CardStatus) -> Card {
        let mut card = Card::new(CardId::new(id), format!("f-{id}"), format!("b-{id}")).unwrap();
        card.status = status;
        card
    }

    fn mixed_store() -> StoreData {
        let mut store = StoreData::default();
        store.decks.insert(
            "Mixed".into(),
            vec![
                card("n1", CardStatus::NotStudied),
                card("l1", CardStatus::Learning),
                card("m1", CardStatus::Mastered),
                card("n2", CardStatus::NotStudied),
            ],
        );
        store
    }

    fn presented_ids(session: &mut ReviewSession, store: &mut StoreData) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(current) = session.current_card() {
            ids.push(current.card.id.to_string());
            session
                .grade(store, recall_core::model::ReviewGrade::Known)
                .unwrap();
        }
        ids
    }

    #[test]
    fn sequential_build_takes_every_card_in_order() {
        let mut store = mixed_store();
        let mut session = SessionBuilder::new().build(&mut store, "Mixed").unwrap();

        let ids = presented_ids(&mut session, &mut store);
        assert_eq!(ids, ["n1", "l1", "m1", "n2"]);
    }

    #[test]
    fn shuffle_build_takes_only_not_studied_cards() {
        let mut store = mixed_store();
        let mut session = SessionBuilder::new()
            .with_shuffle(true)
            .build(&mut store, "Mixed")
            .unwrap();

        let ids: BTreeSet<String> = presented_ids(&mut session, &mut store).into_iter().collect();
        assert_eq!(ids, BTreeSet::from(["n1".to_owned(), "n2".to_owned()]));
    }

    #[test]
    fn group_build_concatenates_members_and_skips_dangling() {
        let mut store = StoreData::default();
        store
            .decks
            .insert("A".into(), vec![card("a1", CardStatus::NotStudied)]);
        store
            .decks
            .insert("B".into(), vec![card("b1", CardStatus::Mastered)]);
        store.deck_groups.insert(
            "Both".into(),
            vec!["B".into(), "Ghost".into(), "A".into()],
        );

        let mut session = SessionBuilder::new().build(&mut store, "Both").unwrap();
        let ids = presented_ids(&mut session, &mut store);
        assert_eq!(ids, ["b1", "a1"]);

        // Origin decks follow each card, not the group name.
        let session = SessionBuilder::new().build(&mut store, "Both").unwrap();
        assert_eq!(session.current_card().unwrap().original_deck, "B");
    }

    #[test]
    fn resume_restores_order_and_shows_current_first() {
        let mut store = mixed_store();
        store.saved_session = Some(SavedSession {
            deck_name: "Mixed".into(),
            session_queue_ids: vec![
                CardRef::new(CardId::new("n2"), "Mixed"),
                CardRef::new(CardId::new("m1"), "Mixed"),
            ],
            learning_cards_queue_ids: vec![CardRef::new(CardId::new("l1"), "Mixed")],
            current_card_id: Some(CardRef::new(CardId::new("n1"), "Mixed")),
            is_shuffle_mode: true,
        });

        // Builder flag is off; the saved flag wins on resume.
        let session = SessionBuilder::new().build(&mut store, "Mixed").unwrap();

        assert!(session.is_shuffle());
        assert_eq!(session.current_card().unwrap().card.id, CardId::new("n1"));
        assert_eq!(session.remaining(), 2);
        assert_eq!(session.relearning_pending(), 1);
    }

    #[test]
    fn resume_skips_stale_references() {
        let mut store = mixed_store();
        store.saved_session = Some(SavedSession {
            deck_name: "Mixed".into(),
            session_queue_ids: vec![
                CardRef::new(CardId::new("ghost"), "Mixed"),
                CardRef::new(CardId::new("n1"), "Mixed"),
            ],
            learning_cards_queue_ids: Vec::new(),
            current_card_id: None,
            is_shuffle_mode: false,
        });

        let session = SessionBuilder::new().build(&mut store, "Mixed").unwrap();
        assert_eq!(session.current_card().unwrap().card.id, CardId::new("n1"));
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn fully_stale_resume_errors_and_clears_saved_session() {
        let mut store = mixed_store();
        store.saved_session = Some(SavedSession {
            deck_name: "Mixed".into(),
            session_queue_ids: vec![CardRef::new(CardId::new("ghost"), "Mixed")],
            learning_cards_queue_ids: vec![CardRef::new(CardId::new("ghost2"), "Mixed")],
            current_card_id: None,
            is_shuffle_mode: false,
        });

        let err = SessionBuilder::new().build(&mut store, "Mixed").unwrap_err();
        assert_eq!(err, SessionError::NoCards);
        assert!(store.saved_session.is_none());
    }

    #[test]
    fn empty_selection_errors_and_clears_saved_session() {
        let mut store = StoreData::default();
        store.decks.insert("Empty".into(), Vec::new());
        store.saved_session = Some(SavedSession {
            deck_name: "Other".into(),
            session_queue_ids: vec![CardRef::new(CardId::new("x"), "Other")],
            learning_cards_queue_ids: Vec::new(),
            current_card_id: None,
            is_shuffle_mode: false,
        });

        let err = SessionBuilder::new().build(&mut store, "Empty").unwrap_err();
        assert_eq!(err, SessionError::NoCards);
        assert!(store.saved_session.is_none());
    }

    #[test]
    fn adhoc_sessions_are_never_resumable() {
        let mut store = mixed_store();
        let starred = vec![SessionCard::new(card("n1", CardStatus::NotStudied), "Mixed")];

        let session = SessionBuilder::new()
            .build_adhoc(&mut store, "Mixed", starred)
            .unwrap();

        assert!(!session.is_resumable());
        assert!(store.saved_session.is_none(), "ad hoc sessions never project");
    }

    #[test]
    fn adhoc_resolves_missing_origin_by_scanning() {
        let mut store = mixed_store();
        let untagged = vec![SessionCard::new(card("m1", CardStatus::Mastered), "")];

        let session = SessionBuilder::new()
            .build_adhoc(&mut store, "Fallback", untagged)
            .unwrap();

        assert_eq!(session.current_card().unwrap().original_deck, "Mixed");
    }

    #[test]
    fn adhoc_with_no_cards_errors() {
        let mut store = mixed_store();
        let err = SessionBuilder::new()
            .build_adhoc(&mut store, "Mixed", Vec::new())
            .unwrap_err();
        assert_eq!(err, SessionError::NoCards);
    }
}
