use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CardId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("card front cannot be empty")]
    EmptyFront,

    #[error("card back cannot be empty")]
    EmptyBack,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Learning status of a card.
///
/// Cards progress `NotStudied → Learning → Mastered` through grading; a
/// forgotten card drops back to `Learning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardStatus {
    #[default]
    NotStudied,
    Learning,
    Mastered,
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// A single front/back flashcard.
///
/// Serde defaults backfill fields missing from legacy payloads, so decks
/// saved by older versions load without migration. `next_review` and
/// `interval` are reserved: they are carried and reset but never consulted
/// by any scheduling decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub status: CardStatus,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub correct_streak: u32,
    #[serde(default)]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

impl Card {
    /// Creates a not-yet-studied card, trimming both sides.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyFront`/`CardError::EmptyBack` if either side
    /// is empty after trimming.
    pub fn new(
        id: CardId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Self, CardError> {
        let front = front.into().trim().to_owned();
        if front.is_empty() {
            return Err(CardError::EmptyFront);
        }
        let back = back.into().trim().to_owned();
        if back.is_empty() {
            return Err(CardError::EmptyBack);
        }

        Ok(Self {
            id,
            front,
            back,
            status: CardStatus::NotStudied,
            starred: false,
            correct_streak: 0,
            next_review: None,
            interval: default_interval(),
        })
    }

    /// Returns all study state to its initial values, keeping content and star.
    pub fn reset_progress(&mut self) {
        self.status = CardStatus::NotStudied;
        self.correct_streak = 0;
        self.next_review = None;
        self.interval = default_interval();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
