//! Closed time intervals used by grants and tokens.

use chrono::{DateTime, Utc};

/// Returned when a window's end precedes its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("window end is before its start")]
pub struct InvalidWindow;

/// A closed interval `[start, end]` with `start <= end`.
///
/// Both bounds are inclusive: an instant equal to `start` or `end` is inside.
/// Only [`TimeWindow::new`] builds one, so no value with `end < start` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        if end < start {
            return Err(InvalidWindow);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `start <= instant <= end`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// True once `instant` is strictly past `end`.
    pub fn has_ended(&self, instant: DateTime<Utc>) -> bool {
        instant > self.end
    }
}
