use recall_core::model::StoreData;
use tracing::info;

use crate::error::ImportError;

/// Serializes the full store for backup.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn export_store(store: &StoreData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(store)
}

/// Parses and validates a full-store backup.
///
/// The whole payload is accepted or rejected atomically: every deck must
/// be a list of cards with a non-empty id and string front/back (the
/// latter enforced by the typed parse). Missing `deckGroups`,
/// `shuffledQueues` and `savedSession` keys are backfilled with defaults.
/// The caller swaps the returned store in on success, so a rejected
/// import leaves existing data untouched.
///
/// # Errors
///
/// Returns `ImportError::Parse` for malformed JSON or mistyped fields and
/// `ImportError::InvalidCard` for structurally valid but unusable cards.
pub fn import_store(json: &str) -> Result<StoreData, ImportError> {
    let store: StoreData = serde_json::from_str(json)?;

    for (deck, cards) in &store.decks {
        for card in cards {
            if card.id.is_empty() {
                return Err(ImportError::InvalidCard {
                    deck: deck.clone(),
                    reason: "empty card id".into(),
                });
            }
        }
    }

    info!(decks = store.decks.len(), "imported store payload");
    Ok(store)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
