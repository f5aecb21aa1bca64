//! Per-card review timelines.

mod builder;
mod trim;

pub use builder::{build_timelines, TimelineSet};
pub use trim::{last_learning_block_start, trim_to_last_learning};

use serde::{Deserialize, Serialize};

use crate::types::ReviewEvent;

/// Chronologically ordered reviews of one card.
///
/// Events are kept in non-decreasing `logical_day` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub entity_id: String,
    events: Vec<ReviewEvent>,
}

impl Timeline {
    /// Create a timeline, stable-sorting the events by logical day.
    pub fn new(entity_id: impl Into<String>, mut events: Vec<ReviewEvent>) -> Self {
        events.sort_by_key(|e| e.logical_day);
        Self {
            entity_id: entity_id.into(),
            events,
        }
    }

    pub fn events(&self) -> &[ReviewEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take ownership of the events.
    pub fn into_events(self) -> Vec<ReviewEvent> {
        self.events
    }

    /// A new timeline holding only the events from `start` onward.
    pub(crate) fn suffix_from(self, start: usize) -> Self {
        let Timeline {
            entity_id,
            mut events,
        } = self;
        let events = events.split_off(start.min(events.len()));
        Self { entity_id, events }
    }
}
