//! Retain-from-last-learning trimming.
//!
//! A card that lapsed and was taken through learning again is trained only
//! on the history that starts with its latest learning episode.

use super::Timeline;
use crate::types::ReviewEvent;

/// Index where the last contiguous block of New/Learning events starts.
///
/// Scans backwards from the end. Non-learning events after the block are
/// allowed; once a block has been found, the first non-learning event
/// before it ends the scan, so older learning episodes are never rejoined.
/// Returns `None` when no event is in a learning phase.
pub fn last_learning_block_start(events: &[ReviewEvent]) -> Option<usize> {
    let mut start = None;
    for (i, event) in events.iter().enumerate().rev() {
        if event.phase.is_learning() {
            start = Some(i);
        } else if start.is_some() {
            break;
        }
    }
    start
}

/// Drop everything before the last learning block.
///
/// A timeline without any learning-phase event comes back empty.
pub fn trim_to_last_learning(timeline: Timeline) -> Timeline {
    match last_learning_block_start(timeline.events()) {
        Some(0) => timeline,
        Some(start) => timeline.suffix_from(start),
        None => {
            let len = timeline.len();
            timeline.suffix_from(len)
        }
    }
}
