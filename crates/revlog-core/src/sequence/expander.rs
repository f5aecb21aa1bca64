//! Prefix expansion of a trimmed timeline.

use super::{ReviewStep, TrainingSequence};
use crate::timeline::Timeline;
use crate::types::ReviewEvent;

/// Logical-day gap between two reviews, floored at zero.
pub fn elapsed_days(previous: &ReviewEvent, current: &ReviewEvent) -> u32 {
    let gap = current.logical_day.saturating_sub(previous.logical_day);
    u32::try_from(gap.max(0)).unwrap_or(u32::MAX)
}

/// Steps for the prefix `events`, derived from its first event forward.
fn prefix_steps(events: &[ReviewEvent]) -> Vec<ReviewStep> {
    let mut steps = Vec::with_capacity(events.len());
    let mut previous: Option<&ReviewEvent> = None;
    for event in events {
        let elapsed = previous.map_or(0, |p| elapsed_days(p, event));
        steps.push(ReviewStep::new(event.grade, elapsed));
        previous = Some(event);
    }
    steps
}

/// Expand a timeline into one sequence per review point from the second
/// review onward. Prefixes whose reviews all fall on one day are dropped.
pub fn expand_timeline(timeline: &Timeline) -> Vec<TrainingSequence> {
    let events = timeline.events();
    (2..=events.len())
        .filter_map(|k| TrainingSequence::new(prefix_steps(&events[..k])))
        .collect()
}
