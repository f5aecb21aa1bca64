//! Training sequences derived from trimmed timelines.

mod batch;
mod expander;

pub use batch::{BatchCollector, TrainingBatch};
pub use expander::{elapsed_days, expand_timeline};

use serde::{Deserialize, Serialize};

use crate::types::Grade;

/// One review inside a training sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewStep {
    pub grade: Grade,
    /// Days since the previous review in the same sequence.
    pub elapsed_days: u32,
}

impl ReviewStep {
    pub fn new(grade: Grade, elapsed_days: u32) -> Self {
        Self {
            grade,
            elapsed_days,
        }
    }

    pub fn to_fsrs(self) -> fsrs::FSRSReview {
        fsrs::FSRSReview {
            rating: self.grade.to_rating(),
            delta_t: self.elapsed_days,
        }
    }
}

/// A card's review history up to one review point.
///
/// Always at least two steps long, the first step has zero elapsed days,
/// and at least one later step has a positive gap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingSequence {
    steps: Vec<ReviewStep>,
}

impl TrainingSequence {
    /// Build a sequence, returning `None` when the steps would carry no
    /// temporal signal (too short, nonzero first gap, or same-day only).
    pub fn new(steps: Vec<ReviewStep>) -> Option<Self> {
        let (first, rest) = steps.split_first()?;
        if first.elapsed_days != 0 || rest.is_empty() {
            return None;
        }
        if !rest.iter().any(|s| s.elapsed_days > 0) {
            return None;
        }
        Some(Self { steps })
    }

    pub fn steps(&self) -> &[ReviewStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Never true for a constructed sequence.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Elapsed days of every step, first step included.
    pub fn deltas(&self) -> Vec<u32> {
        self.steps.iter().map(|s| s.elapsed_days).collect()
    }

    pub fn to_fsrs_item(&self) -> fsrs::FSRSItem {
        fsrs::FSRSItem {
            reviews: self.steps.iter().map(|s| s.to_fsrs()).collect(),
        }
    }
}
