// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day streak tracking.

use chrono::NaiveDate;

/// Activity type tracked when none is configured.
pub const DEFAULT_STREAK_TYPE: &str = "Run";

/// Running streak over activities visited in ascending local-date order.
#[derive(Debug, Clone)]
pub struct StreakCalculator {
    activity_type: String,
    last_date: Option<NaiveDate>,
    current: u32,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_STREAK_TYPE)
    }
}

impl StreakCalculator {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            last_date: None,
            current: 0,
        }
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    /// Feed the next activity and return its streak.
    ///
    /// Activities of other types return `None` and leave the state untouched.
    pub fn observe(&mut self, activity_type: &str, date: NaiveDate) -> Option<u32> {
        if activity_type != self.activity_type {
            return None;
        }

        self.current = match self.last_date {
            None => 1,
            Some(last) if date == last => self.current,
            Some(last) if last.succ_opt() == Some(date) => self.current + 1,
            Some(last) => {
                if date < last {
                    tracing::warn!(%date, %last, "Activities out of order, resetting streak");
                }
                1
            }
        };
        self.last_date = Some(date);

        Some(self.current)
    }
}
