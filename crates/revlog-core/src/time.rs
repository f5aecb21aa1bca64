//! Logical review days.
//!
//! Reviews are bucketed into days under a fixed boundary policy: shift the
//! UTC instant into the learner's timezone, then pull it back by the
//! rollover cutoff so that a session running past midnight still counts
//! toward the evening it started in.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Day-boundary policy used to turn timestamps into logical days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayBoundary {
    /// Learner's offset from UTC in hours.
    /// Default: 8
    pub utc_offset_hours: i32,

    /// Hours after local midnight that still belong to the previous day.
    /// Default: 4
    pub rollover_hours: u32,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self {
            utc_offset_hours: 8,
            rollover_hours: 4,
        }
    }
}

impl DayBoundary {
    pub fn new(utc_offset_hours: i32, rollover_hours: u32) -> Self {
        Self {
            utc_offset_hours,
            rollover_hours,
        }
    }

    /// Net shift applied to a UTC instant, in seconds.
    fn shift_seconds(&self) -> i64 {
        (self.utc_offset_hours as i64 - self.rollover_hours as i64) * SECONDS_PER_HOUR
    }

    /// Logical day index (days since 1970-01-01) of an epoch-millisecond instant.
    ///
    /// Total over `i64`: sub-second precision is dropped, then the shifted
    /// second count is floored to a day.
    pub fn logical_day(&self, timestamp_ms: i64) -> i64 {
        let seconds = timestamp_ms.div_euclid(1_000);
        seconds
            .saturating_add(self.shift_seconds())
            .div_euclid(SECONDS_PER_DAY)
    }

    /// Calendar date of a logical day index, if it is representable.
    pub fn logical_date(&self, day: i64) -> Option<NaiveDate> {
        let days_from_ce = day.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
        NaiveDate::from_num_days_from_ce_opt(i32::try_from(days_from_ce).ok()?)
    }

    /// Logical day index of a calendar date.
    pub fn day_of_date(date: NaiveDate) -> i64 {
        date.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE
    }

    /// Validate the boundary values.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err("utc_offset_hours must be between -12 and 14");
        }
        if self.rollover_hours >= 24 {
            return Err("rollover_hours must be less than 24");
        }
        Ok(())
    }
}
