use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Card, CardRef, SavedSession};

/// The single in-memory store behind every component.
///
/// Constructed at startup from persisted bytes (or defaults), mutated in
/// place by the services, and flushed on a debounced schedule. Field names
/// follow the legacy storage document so old payloads load unchanged.
///
/// `shuffled_queues` is a legacy key kept opaque: the core never reads it,
/// but preserving it makes round-tripping old exports lossless. Services
/// only ever drop entries from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreData {
    pub decks: BTreeMap<String, Vec<Card>>,
    pub deck_groups: BTreeMap<String, Vec<String>>,
    pub shuffled_queues: BTreeMap<String, serde_json::Value>,
    pub saved_session: Option<SavedSession>,
}

impl StoreData {
    /// True if `name` refers to a deck group rather than a single deck.
    #[must_use]
    pub fn is_group(&self, name: &str) -> bool {
        self.deck_groups.contains_key(name)
    }

    /// True if `name` is taken by either a deck or a group.
    #[must_use]
    pub fn name_taken(&self, name: &str) -> bool {
        self.decks.contains_key(name) || self.deck_groups.contains_key(name)
    }

    /// Member decks a selection resolves to: a group's surviving members in
    /// stored order, or the deck itself. Dangling group references are
    /// filtered out, never an error; a deck listed twice counts once so a
    /// group is the union of its members.
    #[must_use]
    pub fn member_decks(&self, name: &str) -> Vec<String> {
        if let Some(members) = self.deck_groups.get(name) {
            let mut seen = std::collections::BTreeSet::new();
            members
                .iter()
                .filter(|member| self.decks.contains_key(*member))
                .filter(|member| seen.insert(member.as_str().to_owned()))
                .cloned()
                .collect()
        } else if self.decks.contains_key(name) {
            vec![name.to_owned()]
        } else {
            Vec::new()
        }
    }

    /// Resolves a card reference against its owning deck.
    #[must_use]
    pub fn find_card(&self, card_ref: &CardRef) -> Option<&Card> {
        self.decks
            .get(&card_ref.original_deck)?
            .iter()
            .find(|c| c.id == card_ref.id)
    }

    /// Mutable variant of [`StoreData::find_card`].
    pub fn find_card_mut(&mut self, card_ref: &CardRef) -> Option<&mut Card> {
        self.decks
            .get_mut(&card_ref.original_deck)?
            .iter_mut()
            .find(|c| c.id == card_ref.id)
    }

    /// Clears the saved session when it belongs to the given selection.
    pub fn clear_saved_session_for(&mut self, name: &str) {
        if self
            .saved_session
            .as_ref()
            .is_some_and(|s| s.deck_name == name)
        {
            self.saved_session = None;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
