use thiserror::Error;

use recall_core::model::{CardError, CardId};
use storage::StorageError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// The requested selection produced an empty review queue.
    #[error("no cards available to review")]
    NoCards,

    /// The session has no current card to act on.
    #[error("no card is currently presented")]
    NoCurrentCard,

    /// The undo log is empty.
    #[error("nothing to undo")]
    NothingToUndo,
}

//
// ─── DECK & GROUP MANAGEMENT ───────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckServiceError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("the name \"{0}\" is already taken")]
    NameTaken(String),

    #[error("deck \"{0}\" does not exist")]
    UnknownDeck(String),

    #[error("group \"{0}\" does not exist")]
    UnknownGroup(String),

    #[error("no valid card lines found")]
    NoValidCards,

    #[error("a group needs at least two member decks")]
    GroupTooSmall,
}

//
// ─── CARD MANAGEMENT ───────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardServiceError {
    #[error("card line is not in a recognized \"front - back\" format")]
    InvalidLine,

    #[error("deck \"{0}\" does not exist")]
    UnknownDeck(String),

    #[error("card \"{0}\" does not exist")]
    UnknownCard(CardId),

    #[error("no valid card lines found")]
    NoValidCards,

    #[error(transparent)]
    Card(#[from] CardError),
}

//
// ─── IMPORT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("payload is not a valid store document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("deck \"{deck}\" contains an invalid card: {reason}")]
    InvalidCard { deck: String, reason: String },
}

//
// ─── WORKFLOW ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkflowError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Deck(#[from] DeckServiceError),

    #[error(transparent)]
    Card(#[from] CardServiceError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("application state is unavailable: {0}")]
    Poisoned(String),
}
