use serde::{Deserialize, Serialize};

/// Two-level grading outcome for a presented card.
///
/// `Forgot` sends the card back to learning and queues it for another pass
/// this session; `Known` promotes a not-yet-mastered card to mastered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewGrade {
    Forgot,
    Known,
}
