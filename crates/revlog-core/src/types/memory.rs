//! Memory state types exchanged with the scheduling engine.

use serde::{Deserialize, Serialize};

use super::review::Grade;

/// FSRS memory state of one card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    /// Stability: days for retrievability to drop to 90%.
    pub stability: f32,
    /// Difficulty: 1.0-10.0 scale (higher = harder to remember).
    pub difficulty: f32,
}

impl MemoryState {
    pub fn new(stability: f32, difficulty: f32) -> Self {
        Self {
            stability,
            difficulty,
        }
    }

    /// Convert to fsrs::MemoryState for use with fsrs crate functions.
    pub fn to_fsrs(self) -> fsrs::MemoryState {
        fsrs::MemoryState {
            stability: self.stability,
            difficulty: self.difficulty,
        }
    }

    /// Create from fsrs::MemoryState.
    pub fn from_fsrs(state: fsrs::MemoryState) -> Self {
        Self {
            stability: state.stability,
            difficulty: state.difficulty,
        }
    }
}

/// Memory state and interval that would follow a review with one grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    pub memory: MemoryState,
    /// Interval in days, unrounded.
    pub interval: f32,
}

impl ItemState {
    pub fn from_fsrs(state: fsrs::ItemState) -> Self {
        Self {
            memory: MemoryState::from_fsrs(state.memory),
            interval: state.interval,
        }
    }
}

/// Candidate next states, one per grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextStates {
    pub again: ItemState,
    pub hard: ItemState,
    pub good: ItemState,
    pub easy: ItemState,
}

impl NextStates {
    pub fn from_fsrs(states: fsrs::NextStates) -> Self {
        Self {
            again: ItemState::from_fsrs(states.again),
            hard: ItemState::from_fsrs(states.hard),
            good: ItemState::from_fsrs(states.good),
            easy: ItemState::from_fsrs(states.easy),
        }
    }

    /// State that follows a review graded `grade`.
    pub fn for_grade(&self, grade: Grade) -> ItemState {
        match grade {
            Grade::Again => self.again,
            Grade::Hard => self.hard,
            Grade::Good => self.good,
            Grade::Easy => self.easy,
        }
    }
}
