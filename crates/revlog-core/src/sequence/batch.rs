//! Batch collection of training sequences.

use rayon::prelude::*;
use tracing::debug;

use super::{expand_timeline, TrainingSequence};
use crate::timeline::Timeline;

/// Every training sequence of a run, stored contiguously and addressed by
/// position. The optimizer treats it as an unordered multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingBatch {
    sequences: Vec<TrainingSequence>,
    contributing_entities: usize,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrainingSequence> {
        self.sequences.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingSequence> {
        self.sequences.iter()
    }

    pub fn as_slice(&self) -> &[TrainingSequence] {
        &self.sequences
    }

    /// Number of cards that produced at least one sequence.
    pub fn contributing_entities(&self) -> usize {
        self.contributing_entities
    }

    /// Total review steps across all sequences.
    pub fn total_steps(&self) -> usize {
        self.sequences.iter().map(TrainingSequence::len).sum()
    }

    /// Copy the batch into the engine's training-set representation.
    pub fn to_fsrs_items(&self) -> Vec<fsrs::FSRSItem> {
        self.sequences.iter().map(TrainingSequence::to_fsrs_item).collect()
    }
}

impl<'a> IntoIterator for &'a TrainingBatch {
    type Item = &'a TrainingSequence;
    type IntoIter = std::slice::Iter<'a, TrainingSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

/// Expands trimmed timelines and merges their sequences into one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchCollector {
    parallel: bool,
}

impl Default for BatchCollector {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl BatchCollector {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Collect the sequences of every timeline.
    ///
    /// In parallel mode each worker fills its own partial batch; the
    /// partials are merged once at the end.
    pub fn collect(&self, timelines: &[Timeline]) -> TrainingBatch {
        let (sequences, contributing_entities) = if self.parallel {
            timelines
                .par_iter()
                .fold(
                    || (Vec::new(), 0usize),
                    |(mut acc, entities), timeline| {
                        let seqs = expand_timeline(timeline);
                        let contributed = usize::from(!seqs.is_empty());
                        acc.extend(seqs);
                        (acc, entities + contributed)
                    },
                )
                .reduce(
                    || (Vec::new(), 0usize),
                    |(mut left, a), (mut right, b)| {
                        left.append(&mut right);
                        (left, a + b)
                    },
                )
        } else {
            let mut acc = Vec::new();
            let mut entities = 0usize;
            for timeline in timelines {
                let seqs = expand_timeline(timeline);
                if !seqs.is_empty() {
                    entities += 1;
                }
                acc.extend(seqs);
            }
            (acc, entities)
        };

        debug!(
            sequences = sequences.len(),
            entities = contributing_entities,
            parallel = self.parallel,
            "Collected training batch"
        );

        TrainingBatch {
            sequences,
            contributing_entities,
        }
    }
}
