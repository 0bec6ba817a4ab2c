use recall_core::model::{ProgressCounts, StoreData};

/// Derives aggregate counts for a deck or group.
///
/// Pure read over the store, recomputed on every call. A group counts the
/// union of its surviving member decks; an unknown name yields zeros.
#[must_use]
pub fn progress_for(store: &StoreData, name: &str) -> ProgressCounts {
    let mut counts = ProgressCounts::default();
    for deck in store.member_decks(name) {
        if let Some(cards) = store.decks.get(&deck) {
            for card in cards {
                counts.tally(card);
            }
        }
    }
    counts
}

/// Sorted deck and group names, for selector-style displays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeckListing {
    pub decks: Vec<String>,
    pub groups: Vec<String>,
}

/// Builds the current listing from the store.
#[must_use]
pub fn listing(store: &StoreData) -> DeckListing {
    DeckListing {
        decks: store.decks.keys().cloned().collect(),
        groups: store.deck_groups.keys().cloned().collect(),
    }
}

/// Change-detection short-circuit keyed on the deck/group name set.
///
/// `refresh` returns the new listing only when the name set actually
/// changed, so callers can skip rebuilding an unchanged display.
#[derive(Debug, Default)]
pub struct ListingCache {
    last: Option<DeckListing>,
}

impl ListingCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, store: &StoreData) -> Option<&DeckListing> {
        let next = listing(store);
        if self.last.as_ref() == Some(&next) {
            return None;
        }
        self.last = Some(next);
        self.last.as_ref()
    }

    /// Forces the next `refresh` to report a change.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
