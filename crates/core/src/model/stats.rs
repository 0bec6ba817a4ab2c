use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Global per-status card counts for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    #[serde(rename = "not-studied")]
    pub not_studied: usize,
    pub learning: usize,
    pub mastered: usize,
}

/// One dated statistics entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub stats: StatusTally,
}

/// Rolling history of daily aggregate counts.
///
/// At most one entry per calendar day; same-day logs update in place.
/// Bounded at [`StatsHistory::CAP`] entries with oldest-first eviction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsHistory {
    entries: Vec<DailyEntry>,
}

impl StatsHistory {
    pub const CAP: usize = 30;

    /// Records the tally for `date`, updating today's entry in place or
    /// appending a new one, then evicting the oldest entries beyond the cap.
    pub fn log(&mut self, date: NaiveDate, stats: StatusTally) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.date == date) {
            entry.stats = stats;
        } else {
            self.entries.push(DailyEntry { date, stats });
        }
        while self.entries.len() > Self::CAP {
            self.entries.remove(0);
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[DailyEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
