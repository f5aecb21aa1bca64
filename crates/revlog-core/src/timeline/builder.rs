//! Grouping of parsed events into per-card timelines.

use std::collections::HashMap;

use tracing::debug;

use super::Timeline;
use crate::types::ReviewEvent;

/// Timelines of every card in a log, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct TimelineSet {
    timelines: Vec<Timeline>,
    index: HashMap<String, usize>,
}

impl TimelineSet {
    /// Number of distinct cards.
    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Look up one card's timeline.
    pub fn get(&self, entity_id: &str) -> Option<&Timeline> {
        self.index.get(entity_id).map(|&i| &self.timelines[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timeline> {
        self.timelines.iter()
    }

    /// Total events across all timelines.
    pub fn event_count(&self) -> usize {
        self.timelines.iter().map(Timeline::len).sum()
    }

    pub fn into_timelines(self) -> Vec<Timeline> {
        self.timelines
    }
}

/// Group events by card and order each group by logical day.
///
/// Same-day events keep their input order: the log carries nothing finer
/// than the day once timestamps are normalized.
pub fn build_timelines(events: impl IntoIterator<Item = ReviewEvent>) -> TimelineSet {
    let mut groups: Vec<(String, Vec<ReviewEvent>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let slot = match index.get(&event.entity_id) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                index.insert(event.entity_id.clone(), slot);
                groups.push((event.entity_id.clone(), Vec::new()));
                slot
            }
        };
        groups[slot].1.push(event);
    }

    let timelines: Vec<Timeline> = groups
        .into_iter()
        .map(|(entity_id, events)| Timeline::new(entity_id, events))
        .collect();

    debug!(entities = timelines.len(), "Grouped events into timelines");

    TimelineSet { timelines, index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Grade, Phase};

    fn event(id: &str, day: i64, grade: Grade) -> ReviewEvent {
        ReviewEvent::new(id, day, grade, Phase::Review)
    }

    #[test]
    fn test_groups_interleaved_entities() {
        let set = build_timelines(vec![
            event("a", 3, Grade::Good),
            event("b", 1, Grade::Good),
            event("a", 1, Grade::Again),
            event("c", 0, Grade::Easy),
            event("b", 0, Grade::Hard),
        ]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.event_count(), 5);
        let ids: Vec<&str> = set.iter().map(|t| t.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let a = set.get("a").unwrap();
        let days: Vec<i64> = a.events().iter().map(|e| e.logical_day).collect();
        assert_eq!(days, vec![1, 3]);
        assert!(set.get("missing").is_none());
    }

    #[test]
    fn test_same_day_ties_keep_input_order() {
        let set = build_timelines(vec![
            event("a", 5, Grade::Again),
            event("a", 2, Grade::Easy),
            event("a", 5, Grade::Hard),
            event("a", 5, Grade::Good),
        ]);

        let grades: Vec<Grade> = set.get("a").unwrap().events().iter().map(|e| e.grade).collect();
        assert_eq!(grades, vec![Grade::Easy, Grade::Again, Grade::Hard, Grade::Good]);
    }

    #[test]
    fn test_empty_input() {
        let set = build_timelines(Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.event_count(), 0);
    }
}
