//! Review event types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Grade for one review (maps to fsrs rating values 1-4).
///
/// - Again (1): Complete failure to recall
/// - Hard (2): Successful but difficult recall
/// - Good (3): Normal successful recall
/// - Easy (4): Effortless recall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Grade {
    /// Complete failure to recall.
    Again = 1,
    /// Successful but difficult recall.
    Hard = 2,
    /// Normal successful recall.
    Good = 3,
    /// Effortless recall.
    Easy = 4,
}

impl Grade {
    /// All grades in rating order.
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Convert to fsrs rating value.
    pub fn to_rating(self) -> u32 {
        self as u32
    }

    /// Create from a rating code. Returns None for codes outside 1-4.
    pub fn from_rating(rating: i64) -> Option<Self> {
        match rating {
            1 => Some(Grade::Again),
            2 => Some(Grade::Hard),
            3 => Some(Grade::Good),
            4 => Some(Grade::Easy),
            _ => None,
        }
    }
}

impl From<Grade> for u32 {
    fn from(grade: Grade) -> Self {
        grade.to_rating()
    }
}

/// Lifecycle tag of a card at review time (the revlog `review_state` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    New = 0,
    Learning = 1,
    Review = 2,
    Relearning = 3,
}

impl Phase {
    /// Create from a state code. Returns None for codes outside 0-3.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Phase::New),
            1 => Some(Phase::Learning),
            2 => Some(Phase::Review),
            3 => Some(Phase::Relearning),
            _ => None,
        }
    }

    /// Numeric state code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// New and Learning reviews open a fresh learning episode.
    ///
    /// Relearning is deliberately excluded: trimming keys on the last time
    /// the card was (re)introduced, not on lapses.
    pub fn is_learning(self) -> bool {
        matches!(self, Phase::New | Phase::Learning)
    }
}

/// One parsed review from the log. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    /// Card (entity) identifier.
    pub entity_id: String,
    /// Review day after timezone and rollover adjustment.
    pub logical_day: i64,
    /// Reviewer-supplied grade.
    pub grade: Grade,
    /// Card phase at review time.
    pub phase: Phase,
}

impl ReviewEvent {
    pub fn new(entity_id: impl Into<String>, logical_day: i64, grade: Grade, phase: Phase) -> Self {
        Self {
            entity_id: entity_id.into(),
            logical_day,
            grade,
            phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_grade_from_rating() {
        assert_eq!(Grade::from_rating(1), Some(Grade::Again));
        assert_eq!(Grade::from_rating(4), Some(Grade::Easy));
        assert_eq!(Grade::from_rating(0), None);
        assert_eq!(Grade::from_rating(5), None);
        assert_eq!(Grade::from_rating(-1), None);
    }

    #[test]
    fn test_grade_rating_roundtrip() {
        for grade in Grade::ALL {
            assert_eq!(Grade::from_rating(grade.to_rating() as i64), Some(grade));
        }
    }

    #[test]
    fn test_phase_learning() {
        assert!(Phase::New.is_learning());
        assert!(Phase::Learning.is_learning());
        assert!(!Phase::Review.is_learning());
        assert!(!Phase::Relearning.is_learning());
        assert_eq!(Phase::from_code(4), None);
    }

    #[test]
    fn test_strum_names() {
        assert_eq!(Phase::Relearning.to_string(), "relearning");
        assert_eq!(Grade::from_str("good").unwrap(), Grade::Good);
    }
}
