use chrono::NaiveDate;

use recall_core::model::{CardStatus, StatsHistory, StatusTally, StoreData};

/// Per-status counts across every deck in the store.
#[must_use]
pub fn global_tally(store: &StoreData) -> StatusTally {
    let mut tally = StatusTally::default();
    for cards in store.decks.values() {
        for card in cards {
            match card.status {
                CardStatus::NotStudied => tally.not_studied += 1,
                CardStatus::Learning => tally.learning += 1,
                CardStatus::Mastered => tally.mastered += 1,
            }
        }
    }
    tally
}

/// Records today's aggregate counts into the rolling history.
///
/// One entry per calendar day, updated in place on repeated logs; the
/// history itself enforces the retention cap.
pub fn log_daily_stats(store: &StoreData, history: &mut StatsHistory, today: NaiveDate) {
    history.log(today, global_tally(store));
}
