use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Deref, Sub};

use serde::{Deserialize, Serialize};

use crate::utils::float::{total_cmp, total_eq};

/// A time point in simulation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(pub f64);

/// A duration of time in simulation
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);
}

impl Duration {
    pub const fn units(n: f64) -> Self {
        Self(n)
    }
}

// Time is used as a key in the event queue, so it needs a total order
impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        total_eq(self.0, other.0)
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        total_cmp(self.0, other.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Deref for Duration {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl From<f64> for Time {
    fn from(v: f64) -> Self {
        Time(v)
    }
}
