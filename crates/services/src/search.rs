use std::collections::HashSet;

use recall_core::model::{CardStatus, StoreData};

use crate::sessions::SessionCard;

/// Case-insensitive search over every deck.
///
/// A deck whose name contains the query contributes all of its cards;
/// otherwise a card matches on front/back substring, the literal query
/// `starred`, or a literal status name. Results are deduplicated by card
/// id (first occurrence wins) and tagged with their origin deck so they
/// can feed an ad hoc review directly.
#[must_use]
pub fn search_cards(store: &StoreData, query: &str) -> Vec<SessionCard> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for (deck_name, cards) in &store.decks {
        let deck_matches = deck_name.to_lowercase().contains(&query);
        for card in cards {
            let matches = deck_matches
                || card.front.to_lowercase().contains(&query)
                || card.back.to_lowercase().contains(&query)
                || (query == "starred" && card.starred)
                || status_name(card.status) == query;
            if matches && seen.insert(card.id.clone()) {
                results.push(SessionCard::new(card.clone(), deck_name.clone()));
            }
        }
    }
    results
}

fn status_name(status: CardStatus) -> &'static str {
    match status {
        CardStatus::NotStudied => "not-studied",
        CardStatus::Learning => "learning",
        CardStatus::Mastered => "mastered",
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
