//! Next-review scheduling on top of a [`SchedulingEngine`].
//!
//! Turns the engine's candidate states into a concrete due date for a card.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::SchedulingEngine;
use crate::error::{ErrorCode, RevlogError, RevlogResult};
use crate::types::{Grade, MemoryState, NextStates};

/// Outcome of scheduling one review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledReview {
    pub grade: Grade,
    /// Memory state after the review.
    pub memory: MemoryState,
    /// Whole days until the next review, at least 1.
    pub interval_days: u32,
    pub due: DateTime<Utc>,
}

/// Whole days between two instants, floored at zero.
pub fn elapsed_days_between(last_review: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = now.signed_duration_since(last_review).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Round an engine interval to whole days, never below one day.
pub fn round_interval(interval: f32) -> u32 {
    if interval.is_finite() {
        interval.round().max(1.0).min(u32::MAX as f32) as u32
    } else {
        1
    }
}

/// Schedules reviews with a fixed desired retention.
pub struct Scheduler<'a, E: SchedulingEngine> {
    engine: &'a E,
    desired_retention: f32,
}

impl<'a, E: SchedulingEngine> Scheduler<'a, E> {
    pub fn new(engine: &'a E, desired_retention: f32) -> Self {
        Self {
            engine,
            desired_retention,
        }
    }

    pub fn desired_retention(&self) -> f32 {
        self.desired_retention
    }

    /// Candidate states for every grade after `elapsed_days`.
    pub fn preview(&self, memory: Option<MemoryState>, elapsed_days: u32) -> RevlogResult<NextStates> {
        self.engine
            .next_states(memory, self.desired_retention, elapsed_days)
    }

    /// Apply a review graded `grade` at `now`.
    ///
    /// `last_review` is `None` for a new card, which is scheduled from an
    /// empty memory state with zero elapsed days. An interval whose due date
    /// falls past the last representable date is an engine error.
    pub fn schedule(
        &self,
        memory: Option<MemoryState>,
        grade: Grade,
        last_review: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> RevlogResult<ScheduledReview> {
        let elapsed = last_review.map_or(0, |last| elapsed_days_between(last, now));
        let next = self.preview(memory, elapsed)?.for_grade(grade);
        let interval_days = round_interval(next.interval);

        debug!(
            %grade,
            elapsed,
            interval_days,
            stability = next.memory.stability,
            "Scheduled review"
        );

        let due = Duration::try_days(i64::from(interval_days))
            .and_then(|interval| now.checked_add_signed(interval))
            .ok_or_else(|| {
                RevlogError::engine_message(
                    ErrorCode::EngInferenceFailed,
                    format!("interval of {interval_days} days overflows the due date"),
                )
            })?;

        Ok(ScheduledReview {
            grade,
            memory: next.memory,
            interval_days,
            due,
        })
    }
}

/// Probability of recall after `days_elapsed`, using the FSRS-6 decay.
pub fn retrievability(memory: MemoryState, days_elapsed: f32) -> f32 {
    if days_elapsed <= 0.0 {
        return 1.0;
    }
    if memory.stability <= 0.001 {
        return 0.0;
    }
    fsrs::current_retrievability(memory.to_fsrs(), days_elapsed, fsrs::FSRS6_DEFAULT_DECAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FsrsEngine;
    use crate::sequence::TrainingBatch;
    use crate::types::ItemState;

    struct FixedEngine;

    /// Returns the same interval for every grade.
    struct ConstantEngine(f32);

    impl SchedulingEngine for ConstantEngine {
        fn compute_parameters(&mut self, _batch: &TrainingBatch) -> RevlogResult<Vec<f32>> {
            Ok(Vec::new())
        }

        fn next_states(
            &self,
            _memory: Option<MemoryState>,
            _desired_retention: f32,
            _elapsed_days: u32,
        ) -> RevlogResult<NextStates> {
            let state = ItemState {
                memory: MemoryState::new(36_500.0, 5.0),
                interval: self.0,
            };
            Ok(NextStates {
                again: state,
                hard: state,
                good: state,
                easy: state,
            })
        }
    }

    impl SchedulingEngine for FixedEngine {
        fn compute_parameters(&mut self, _batch: &TrainingBatch) -> RevlogResult<Vec<f32>> {
            Ok(Vec::new())
        }

        fn next_states(
            &self,
            _memory: Option<MemoryState>,
            _desired_retention: f32,
            elapsed_days: u32,
        ) -> RevlogResult<NextStates> {
            let state = |interval: f32| ItemState {
                memory: MemoryState::new(interval + elapsed_days as f32, 5.0),
                interval,
            };
            Ok(NextStates {
                again: state(0.2),
                hard: state(1.6),
                good: state(3.4),
                easy: state(9.5),
            })
        }
    }

    #[test]
    fn test_round_interval() {
        assert_eq!(round_interval(0.2), 1);
        assert_eq!(round_interval(1.5), 2);
        assert_eq!(round_interval(3.4), 3);
        assert_eq!(round_interval(f32::NAN), 1);
    }

    #[test]
    fn test_elapsed_days_between() {
        let now = Utc::now();
        assert_eq!(elapsed_days_between(now - Duration::hours(50), now), 2);
        assert_eq!(elapsed_days_between(now + Duration::days(3), now), 0);
    }

    #[test]
    fn test_schedule_new_card() {
        let engine = FixedEngine;
        let scheduler = Scheduler::new(&engine, 0.9);
        let now = Utc::now();

        let review = scheduler.schedule(None, Grade::Again, None, now).unwrap();
        assert_eq!(review.interval_days, 1);
        assert_eq!(review.due, now + Duration::days(1));
        assert_eq!(review.memory.stability, 0.2);
    }

    #[test]
    fn test_schedule_existing_card_uses_elapsed_days() {
        let engine = FixedEngine;
        let scheduler = Scheduler::new(&engine, 0.9);
        let now = Utc::now();

        let review = scheduler
            .schedule(
                Some(MemoryState::new(7.0, 5.0)),
                Grade::Easy,
                Some(now - Duration::days(7)),
                now,
            )
            .unwrap();
        assert_eq!(review.interval_days, 10);
        assert_eq!(review.memory.stability, 9.5 + 7.0);
    }

    #[test]
    fn test_schedule_rejects_unrepresentable_due_date() {
        let engine = ConstantEngine(f32::MAX);
        let scheduler = Scheduler::new(&engine, 0.9);

        let err = scheduler
            .schedule(Some(MemoryState::new(36_500.0, 5.0)), Grade::Easy, None, Utc::now())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EngInferenceFailed);
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_schedule_long_interval_within_range() {
        let engine = ConstantEngine(36_500.0);
        let scheduler = Scheduler::new(&engine, 0.9);
        let now = Utc::now();

        let review = scheduler.schedule(None, Grade::Good, None, now).unwrap();
        assert_eq!(review.interval_days, 36_500);
        assert_eq!(review.due, now + Duration::days(36_500));
    }

    #[test]
    fn test_schedule_with_fsrs_engine() {
        let engine = FsrsEngine::with_default_parameters().unwrap();
        let scheduler = Scheduler::new(&engine, 0.9);
        let now = Utc::now();

        let good = scheduler.schedule(None, Grade::Good, None, now).unwrap();
        let easy = scheduler.schedule(None, Grade::Easy, None, now).unwrap();
        assert!(good.interval_days >= 1);
        assert!(easy.interval_days >= good.interval_days);
        assert!(easy.due >= good.due);
    }

    #[test]
    fn test_retrievability() {
        let memory = MemoryState::new(10.0, 5.0);
        assert_eq!(retrievability(memory, 0.0), 1.0);
        assert!((retrievability(memory, 10.0) - 0.9).abs() < 0.01);
        assert!(retrievability(memory, 30.0) < retrievability(memory, 10.0));
        assert_eq!(retrievability(MemoryState::new(0.0, 5.0), 3.0), 0.0);
    }
}
