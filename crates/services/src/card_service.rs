use std::collections::BTreeSet;

use tracing::debug;

use recall_core::model::{Card, CardId, CardRef, StoreData};

use crate::error::CardServiceError;
use crate::sessions::SessionCard;

/// Recognized separators for a bulk card line, first match wins.
const SEPARATORS: [&str; 2] = ["\t", " - "];

/// Splits one `front<sep>back` line into its two sides.
///
/// Tries a tab first, then `" - "`; a separator only counts when both
/// sides are non-empty after trimming. Returns `None` for anything else.
#[must_use]
pub fn parse_card_line(line: &str) -> Option<(String, String)> {
    for sep in SEPARATORS {
        if let Some(index) = line.find(sep) {
            let front = line[..index].trim();
            let back = line[index + sep.len()..].trim();
            if !front.is_empty() && !back.is_empty() {
                return Some((front.to_owned(), back.to_owned()));
            }
        }
    }
    None
}

/// Parses newline-delimited card data into fresh cards.
///
/// Unparseable lines are skipped, matching the bulk-entry behavior where
/// stray blank or malformed lines do not poison the rest of the paste.
#[must_use]
pub fn parse_bulk(text: &str) -> Vec<Card> {
    text.lines()
        .filter_map(parse_card_line)
        .filter_map(|(front, back)| Card::new(CardId::generate(), front, back).ok())
        .collect()
}

/// Appends bulk-parsed cards to an existing deck, returning how many landed.
///
/// # Errors
///
/// Returns `CardServiceError::UnknownDeck` if the deck does not exist, or
/// `CardServiceError::NoValidCards` if nothing parsed.
pub fn add_cards(
    store: &mut StoreData,
    deck_name: &str,
    text: &str,
) -> Result<usize, CardServiceError> {
    let cards = parse_bulk(text);
    if cards.is_empty() {
        return Err(CardServiceError::NoValidCards);
    }
    let deck = store
        .decks
        .get_mut(deck_name)
        .ok_or_else(|| CardServiceError::UnknownDeck(deck_name.to_owned()))?;

    let added = cards.len();
    deck.extend(cards);
    Ok(added)
}

/// Rewrites a card's front/back from a single bulk-format line.
///
/// # Errors
///
/// Returns `CardServiceError::InvalidLine` for an unparseable line,
/// `CardServiceError::UnknownDeck`/`UnknownCard` when the target is gone.
pub fn edit_card(
    store: &mut StoreData,
    deck_name: &str,
    card_id: &CardId,
    line: &str,
) -> Result<(), CardServiceError> {
    let (front, back) = parse_card_line(line).ok_or(CardServiceError::InvalidLine)?;

    let deck = store
        .decks
        .get_mut(deck_name)
        .ok_or_else(|| CardServiceError::UnknownDeck(deck_name.to_owned()))?;
    let card = deck
        .iter_mut()
        .find(|c| &c.id == card_id)
        .ok_or_else(|| CardServiceError::UnknownCard(card_id.clone()))?;

    card.front = front;
    card.back = back;
    Ok(())
}

/// Bulk-deletes cards by reference, returning how many were removed.
///
/// Refs that no longer resolve are skipped silently. Matching references
/// are scrubbed from the saved session, and legacy shuffled-queue entries
/// for every touched deck are dropped.
pub fn delete_cards(store: &mut StoreData, refs: &[CardRef]) -> usize {
    let mut removed = 0;
    let mut touched_decks = BTreeSet::new();

    for card_ref in refs {
        let Some(deck) = store.decks.get_mut(&card_ref.original_deck) else {
            debug!(deck = %card_ref.original_deck, "delete target deck no longer exists");
            continue;
        };
        let Some(pos) = deck.iter().position(|c| c.id == card_ref.id) else {
            continue;
        };
        deck.remove(pos);
        removed += 1;
        touched_decks.insert(card_ref.original_deck.clone());

        if let Some(saved) = store.saved_session.as_mut() {
            saved.purge_card(card_ref);
        }
    }

    for deck in touched_decks {
        store.shuffled_queues.remove(&deck);
    }
    removed
}

/// Collects the starred cards of a deck or group, tagged with their origin
/// deck, ready for an ad hoc review.
#[must_use]
pub fn starred_cards(store: &StoreData, name: &str) -> Vec<SessionCard> {
    let mut out = Vec::new();
    for deck in store.member_decks(name) {
        if let Some(cards) = store.decks.get(&deck) {
            out.extend(
                cards
                    .iter()
                    .filter(|c| c.starred)
                    .map(|c| SessionCard::new(c.clone(), deck.clone())),
            );
        }
    }
    out
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::model::SavedSession;

    fn store_with_deck(name: &str, ids: &[&str]) -> StoreData {
        let mut store = StoreData::default();
        let cards = ids
            .iter()
            .map(|id| Card::new(CardId::new(*id), format!("f-{id}"), format!("b-{id}")).unwrap())
            .collect();
        store.decks.insert(name.into(), cards);
        store
    }

    #[test]
    fn parse_line_prefers_tab_then_dash() {
        assert_eq!(
            parse_card_line("hello\txin chào"),
            Some(("hello".into(), "xin chào".into()))
        );
        assert_eq!(
            parse_card_line("hello - xin chào"),
            Some(("hello".into(), "xin chào".into()))
        );
        // Tab splits first even when a dash separator also appears.
        assert_eq!(
            parse_card_line("a - b\tc"),
            Some(("a - b".into(), "c".into()))
        );
    }

    #[test]
    fn parse_line_requires_both_sides() {
        assert_eq!(parse_card_line("front -  "), None);
        assert_eq!(parse_card_line("\tback"), None);
        assert_eq!(parse_card_line("no separator here"), None);
        assert_eq!(parse_card_line("hyphen-is-not-a-separator"), None);
    }

    #[test]
    fn parse_line_falls_through_an_empty_tab_split() {
        // The tab split fails (empty front), so " - " gets its chance.
        assert_eq!(
            parse_card_line("\tx - y"),
            Some(("x".into(), "y".into()))
        );
    }

    #[test]
    fn parse_bulk_skips_bad_lines() {
        let cards = parse_bulk("a - 1\n\nnot a card\nb - 2\n");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].front, "a");
        assert_eq!(cards[1].back, "2");
        assert_ne!(cards[0].id, cards[1].id);
    }

    #[test]
    fn add_cards_appends_to_existing_deck() {
        let mut store = store_with_deck("Demo", &["x"]);
        let added = add_cards(&mut store, "Demo", "a - 1\nb - 2").unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.decks["Demo"].len(), 3);

        let err = add_cards(&mut store, "Ghost", "a - 1").unwrap_err();
        assert_eq!(err, CardServiceError::UnknownDeck("Ghost".into()));

        let err = add_cards(&mut store, "Demo", "nothing valid").unwrap_err();
        assert_eq!(err, CardServiceError::NoValidCards);
    }

    #[test]
    fn edit_card_rewrites_front_and_back() {
        let mut store = store_with_deck("Demo", &["x"]);
        edit_card(&mut store, "Demo", &CardId::new("x"), "new front - new back").unwrap();

        let card = &store.decks["Demo"][0];
        assert_eq!(card.front, "new front");
        assert_eq!(card.back, "new back");

        let err = edit_card(&mut store, "Demo", &CardId::new("x"), "garbage").unwrap_err();
        assert_eq!(err, CardServiceError::InvalidLine);
    }

    #[test]
    fn delete_cards_scrubs_saved_session_and_queues() {
        let mut store = store_with_deck("Demo", &["a", "b", "c"]);
        store
            .shuffled_queues
            .insert("Demo".into(), serde_json::json!(["a", "b"]));
        store.saved_session = Some(SavedSession {
            deck_name: "Demo".into(),
            session_queue_ids: vec![
                CardRef::new(CardId::new("a"), "Demo"),
                CardRef::new(CardId::new("b"), "Demo"),
            ],
            learning_cards_queue_ids: vec![CardRef::new(CardId::new("a"), "Demo")],
            current_card_id: Some(CardRef::new(CardId::new("a"), "Demo")),
            is_shuffle_mode: false,
        });

        let removed = delete_cards(
            &mut store,
            &[
                CardRef::new(CardId::new("a"), "Demo"),
                CardRef::new(CardId::new("ghost"), "Demo"),
                CardRef::new(CardId::new("c"), "Nowhere"),
            ],
        );

        assert_eq!(removed, 1);
        assert_eq!(store.decks["Demo"].len(), 2);
        assert!(!store.shuffled_queues.contains_key("Demo"));

        let saved = store.saved_session.as_ref().unwrap();
        assert_eq!(saved.session_queue_ids.len(), 1);
        assert!(saved.learning_cards_queue_ids.is_empty());
        assert_eq!(saved.current_card_id, None);
    }

    #[test]
    fn starred_cards_cover_group_members() {
        let mut store = store_with_deck("A", &["a1", "a2"]);
        store.decks.get_mut("A").unwrap()[0].starred = true;
        store
            .decks
            .insert("B".into(), vec![Card::new(CardId::new("b1"), "f", "b").unwrap()]);
        store.decks.get_mut("B").unwrap()[0].starred = true;
        store
            .deck_groups
            .insert("G".into(), vec!["A".into(), "B".into()]);

        let starred = starred_cards(&store, "G");
        assert_eq!(starred.len(), 2);
        assert_eq!(starred[0].original_deck, "A");
        assert_eq!(starred[1].original_deck, "B");
    }
}
