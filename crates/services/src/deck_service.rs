use tracing::{debug, info};

use recall_core::model::StoreData;

use crate::card_service::parse_bulk;
use crate::error::DeckServiceError;

/// Creates a deck from bulk card text, returning how many cards it got.
///
/// # Errors
///
/// Returns `DeckServiceError::EmptyName` for a blank name,
/// `DeckServiceError::NameTaken` when a deck or group already uses it, and
/// `DeckServiceError::NoValidCards` when nothing parses. The store is
/// untouched on any error.
pub fn create_deck(
    store: &mut StoreData,
    name: &str,
    bulk_text: &str,
) -> Result<usize, DeckServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DeckServiceError::EmptyName);
    }
    if store.name_taken(name) {
        return Err(DeckServiceError::NameTaken(name.to_owned()));
    }

    let cards = parse_bulk(bulk_text);
    if cards.is_empty() {
        return Err(DeckServiceError::NoValidCards);
    }

    info!(deck = name, cards = cards.len(), "created deck");
    store.decks.insert(name.to_owned(), cards);
    Ok(store.decks[name].len())
}

/// Renames a deck, rewriting every reference to it.
///
/// Group membership entries, a matching saved session (including its card
/// references), and the legacy shuffled-queue entry all follow the new
/// name.
///
/// # Errors
///
/// Returns `DeckServiceError::UnknownDeck` if the deck is missing,
/// `DeckServiceError::EmptyName`/`NameTaken` for an invalid target name.
pub fn rename_deck(
    store: &mut StoreData,
    old_name: &str,
    new_name: &str,
) -> Result<(), DeckServiceError> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(DeckServiceError::EmptyName);
    }
    if !store.decks.contains_key(old_name) {
        return Err(DeckServiceError::UnknownDeck(old_name.to_owned()));
    }
    if new_name == old_name {
        return Ok(());
    }
    if store.name_taken(new_name) {
        return Err(DeckServiceError::NameTaken(new_name.to_owned()));
    }

    if let Some(cards) = store.decks.remove(old_name) {
        store.decks.insert(new_name.to_owned(), cards);
    }
    store.shuffled_queues.remove(old_name);

    for members in store.deck_groups.values_mut() {
        for member in members.iter_mut() {
            if member == old_name {
                *member = new_name.to_owned();
            }
        }
    }

    if let Some(saved) = store.saved_session.as_mut() {
        if saved.deck_name == old_name {
            saved.deck_name = new_name.to_owned();
        }
        let rename_refs = |refs: &mut Vec<recall_core::model::CardRef>| {
            for r in refs.iter_mut() {
                if r.original_deck == old_name {
                    r.original_deck = new_name.to_owned();
                }
            }
        };
        rename_refs(&mut saved.session_queue_ids);
        rename_refs(&mut saved.learning_cards_queue_ids);
        if let Some(current) = saved.current_card_id.as_mut()
            && current.original_deck == old_name
        {
            current.original_deck = new_name.to_owned();
        }
    }

    debug!(from = old_name, to = new_name, "renamed deck");
    Ok(())
}

/// Deletes a deck and scrubs every reference to it.
///
/// The deck name is filtered out of all groups (the groups survive), a
/// matching saved session is cleared, and the legacy shuffled-queue entry
/// is dropped.
///
/// # Errors
///
/// Returns `DeckServiceError::UnknownDeck` if the deck does not exist.
pub fn delete_deck(store: &mut StoreData, name: &str) -> Result<(), DeckServiceError> {
    if store.decks.remove(name).is_none() {
        return Err(DeckServiceError::UnknownDeck(name.to_owned()));
    }
    store.shuffled_queues.remove(name);
    store.clear_saved_session_for(name);

    for members in store.deck_groups.values_mut() {
        members.retain(|member| member != name);
    }

    info!(deck = name, "deleted deck");
    Ok(())
}

/// Resets study progress for a deck or every member of a group.
///
/// Cards return to not-studied with their streak and reserved scheduling
/// fields cleared; stars survive. Legacy shuffled-queue entries for the
/// selection and its members are dropped and a matching saved session is
/// cleared. Returns how many cards were reset.
///
/// # Errors
///
/// Returns `DeckServiceError::UnknownDeck` for a name that is neither a
/// deck nor a group.
pub fn reset_progress(store: &mut StoreData, name: &str) -> Result<usize, DeckServiceError> {
    if !store.name_taken(name) {
        return Err(DeckServiceError::UnknownDeck(name.to_owned()));
    }

    let mut reset = 0;
    for deck_name in store.member_decks(name) {
        if let Some(cards) = store.decks.get_mut(&deck_name) {
            for card in cards.iter_mut() {
                card.reset_progress();
                reset += 1;
            }
        }
        store.shuffled_queues.remove(&deck_name);
    }
    store.shuffled_queues.remove(name);
    store.clear_saved_session_for(name);

    info!(selection = name, cards = reset, "reset study progress");
    Ok(reset)
}

/// Creates a deck group from at least two existing decks.
///
/// Member order is preserved; duplicates collapse to their first
/// occurrence.
///
/// # Errors
///
/// Returns `DeckServiceError::EmptyName`/`NameTaken` for an invalid group
/// name, `DeckServiceError::UnknownDeck` for a missing member, and
/// `DeckServiceError::GroupTooSmall` for fewer than two members.
pub fn create_group(
    store: &mut StoreData,
    name: &str,
    members: &[String],
) -> Result<(), DeckServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DeckServiceError::EmptyName);
    }
    if store.name_taken(name) {
        return Err(DeckServiceError::NameTaken(name.to_owned()));
    }

    let mut unique = Vec::new();
    for member in members {
        if !store.decks.contains_key(member) {
            return Err(DeckServiceError::UnknownDeck(member.clone()));
        }
        if !unique.contains(member) {
            unique.push(member.clone());
        }
    }
    if unique.len() < 2 {
        return Err(DeckServiceError::GroupTooSmall);
    }

    info!(group = name, members = unique.len(), "created deck group");
    store.deck_groups.insert(name.to_owned(), unique);
    Ok(())
}

/// Deletes a group; member decks are untouched.
///
/// # Errors
///
/// Returns `DeckServiceError::UnknownGroup` if the group does not exist.
pub fn delete_group(store: &mut StoreData, name: &str) -> Result<(), DeckServiceError> {
    if store.deck_groups.remove(name).is_none() {
        return Err(DeckServiceError::UnknownGroup(name.to_owned()));
    }
    store.shuffled_queues.remove(name);
    store.clear_saved_session_for(name);

    info!(group = name, "deleted deck group");
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::model::{CardId, CardRef, CardStatus, SavedSession};

    fn seeded_store() -> StoreData {
        let mut store = StoreData::default();
        create_deck(&mut store, "Animals", "dog - chó\ncat - mèo").unwrap();
        create_deck(&mut store, "Verbs", "run - chạy\neat - ăn").unwrap();
        store
    }

    fn saved_for(deck: &str, card_id: &str) -> SavedSession {
        SavedSession {
            deck_name: deck.into(),
            session_queue_ids: vec![CardRef::new(CardId::new(card_id), deck)],
            learning_cards_queue_ids: Vec::new(),
            current_card_id: Some(CardRef::new(CardId::new(card_id), deck)),
            is_shuffle_mode: false,
        }
    }

    #[test]
    fn create_deck_validates_name_and_content() {
        let mut store = seeded_store();

        assert_eq!(
            create_deck(&mut store, "  ", "a - 1"),
            Err(DeckServiceError::EmptyName)
        );
        assert_eq!(
            create_deck(&mut store, "Animals", "a - 1"),
            Err(DeckServiceError::NameTaken("Animals".into()))
        );
        assert_eq!(
            create_deck(&mut store, "Empty", "no separator"),
            Err(DeckServiceError::NoValidCards)
        );
        assert_eq!(store.decks.len(), 2, "failed creates leave the store alone");

        assert_eq!(create_deck(&mut store, " Food ", "rice - cơm").unwrap(), 1);
        assert!(store.decks.contains_key("Food"));
    }

    #[test]
    fn group_name_collisions_are_rejected_too() {
        let mut store = seeded_store();
        create_group(&mut store, "All", &["Animals".into(), "Verbs".into()]).unwrap();

        assert_eq!(
            create_deck(&mut store, "All", "a - 1"),
            Err(DeckServiceError::NameTaken("All".into()))
        );
    }

    #[test]
    fn rename_deck_rewrites_groups_and_saved_session() {
        let mut store = seeded_store();
        create_group(&mut store, "All", &["Animals".into(), "Verbs".into()]).unwrap();
        let card_id = store.decks["Animals"][0].id.clone();
        store.saved_session = Some(saved_for("Animals", card_id.as_str()));
        store
            .shuffled_queues
            .insert("Animals".into(), serde_json::json!([]));

        rename_deck(&mut store, "Animals", "Beasts").unwrap();

        assert!(!store.decks.contains_key("Animals"));
        assert_eq!(store.decks["Beasts"].len(), 2);
        assert_eq!(store.deck_groups["All"], vec!["Beasts", "Verbs"]);
        assert!(!store.shuffled_queues.contains_key("Animals"));

        let saved = store.saved_session.as_ref().unwrap();
        assert_eq!(saved.deck_name, "Beasts");
        assert_eq!(saved.session_queue_ids[0].original_deck, "Beasts");
        assert_eq!(
            saved.current_card_id.as_ref().unwrap().original_deck,
            "Beasts"
        );
    }

    #[test]
    fn rename_to_taken_name_fails() {
        let mut store = seeded_store();
        assert_eq!(
            rename_deck(&mut store, "Animals", "Verbs"),
            Err(DeckServiceError::NameTaken("Verbs".into()))
        );
        assert_eq!(
            rename_deck(&mut store, "Ghost", "New"),
            Err(DeckServiceError::UnknownDeck("Ghost".into()))
        );
        // Renaming to itself is a no-op, not a collision.
        rename_deck(&mut store, "Animals", "Animals").unwrap();
    }

    #[test]
    fn delete_deck_scrubs_groups_and_saved_session() {
        let mut store = seeded_store();
        create_group(&mut store, "All", &["Animals".into(), "Verbs".into()]).unwrap();
        let card_id = store.decks["Animals"][0].id.clone();
        store.saved_session = Some(saved_for("Animals", card_id.as_str()));

        delete_deck(&mut store, "Animals").unwrap();

        assert!(!store.decks.contains_key("Animals"));
        assert_eq!(store.deck_groups["All"], vec!["Verbs"]);
        assert!(store.saved_session.is_none());
    }

    #[test]
    fn reset_progress_covers_group_members_and_keeps_stars() {
        let mut store = seeded_store();
        create_group(&mut store, "All", &["Animals".into(), "Verbs".into()]).unwrap();
        for cards in store.decks.values_mut() {
            for card in cards.iter_mut() {
                card.status = CardStatus::Mastered;
                card.correct_streak = 3;
                card.interval = 8;
                card.starred = true;
            }
        }
        store.saved_session = Some(saved_for("All", "whatever"));

        let reset = reset_progress(&mut store, "All").unwrap();
        assert_eq!(reset, 4);
        for cards in store.decks.values() {
            for card in cards {
                assert_eq!(card.status, CardStatus::NotStudied);
                assert_eq!(card.correct_streak, 0);
                assert_eq!(card.interval, 1);
                assert!(card.starred);
            }
        }
        assert!(store.saved_session.is_none());

        assert_eq!(
            reset_progress(&mut store, "Nope"),
            Err(DeckServiceError::UnknownDeck("Nope".into()))
        );
    }

    #[test]
    fn create_group_needs_two_existing_members() {
        let mut store = seeded_store();

        assert_eq!(
            create_group(&mut store, "G", &["Animals".into()]),
            Err(DeckServiceError::GroupTooSmall)
        );
        assert_eq!(
            create_group(&mut store, "G", &["Animals".into(), "Animals".into()]),
            Err(DeckServiceError::GroupTooSmall)
        );
        assert_eq!(
            create_group(&mut store, "G", &["Animals".into(), "Ghost".into()]),
            Err(DeckServiceError::UnknownDeck("Ghost".into()))
        );

        create_group(&mut store, "G", &["Animals".into(), "Verbs".into()]).unwrap();
        assert!(store.is_group("G"));
    }

    #[test]
    fn delete_group_leaves_member_decks() {
        let mut store = seeded_store();
        create_group(&mut store, "All", &["Animals".into(), "Verbs".into()]).unwrap();
        store.saved_session = Some(saved_for("All", "x"));

        delete_group(&mut store, "All").unwrap();

        assert!(!store.is_group("All"));
        assert_eq!(store.decks.len(), 2);
        assert!(store.saved_session.is_none());

        assert_eq!(
            delete_group(&mut store, "All"),
            Err(DeckServiceError::UnknownGroup("All".into()))
        );
    }
}
