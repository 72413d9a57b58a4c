// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Closed interval over ordered scalars, used to build bounding boxes.

use std::fmt;
use std::ops::{Add, Sub};

/// A closed `[min, max]` interval that grows as values are added.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueRange<T = f64> {
    bounds: Option<(T, T)>,
}

impl<T> ValueRange<T>
where
    T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>,
{
    pub fn new() -> Self {
        Self { bounds: None }
    }

    pub fn empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// True when the range holds exactly one value.
    pub fn singleton(&self) -> bool {
        matches!(self.bounds, Some((min, max)) if min == max)
    }

    pub fn min(&self) -> Option<T> {
        self.bounds.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<T> {
        self.bounds.map(|(_, max)| max)
    }

    /// Extend the range to include `value`.
    pub fn add(&mut self, value: T) {
        self.bounds = match self.bounds {
            None => Some((value, value)),
            Some((min, max)) if value < min => Some((value, max)),
            Some((min, max)) if value > max => Some((min, value)),
            bounds => bounds,
        };
    }

    /// Shift both bounds. The range becomes empty if min passes max.
    pub fn adjust(&mut self, delta_min: T, delta_max: T) {
        if let Some((min, max)) = self.bounds {
            let (min, max) = (min + delta_min, max + delta_max);
            self.bounds = if min > max { None } else { Some((min, max)) };
        }
    }

    /// Test `min - slack <= value <= max + slack`. Always false when empty.
    pub fn contains(&self, value: T, slack: T) -> bool {
        match self.bounds {
            Some((min, max)) => min - slack <= value && value <= max + slack,
            None => false,
        }
    }
}

impl<T> FromIterator<T> for ValueRange<T>
where
    T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut range = Self::new();
        for value in iter {
            range.add(value);
        }
        range
    }
}

impl<T: fmt::Display + PartialEq> fmt::Display for ValueRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bounds {
            None => write!(f, "[]"),
            Some((min, max)) if min == max => write!(f, "[{}]", min),
            Some((min, max)) => write!(f, "[{}, {}]", min, max),
        }
    }
}
