//! The simulated clock and its pending suspensions.
//!
//! Every suspension in the model (inter-arrival gaps, resource waits that got
//! granted, CPU slices, I/O waits) is an [`Event`] in a single min-heap keyed by
//! `(time, seq)`. `seq` is a monotonically increasing registration counter, so
//! events due at the same instant fire in the order they were registered.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use educe::Educe;
use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::process::Pid;
use crate::types::{Duration, Time};
use crate::utils::prelude::*;

pub(crate) mod arrivals;
pub(crate) mod lifecycle;
pub mod resources;

/// Who to hand control to when an event fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Wakeup {
    /// The arrival generator's gap elapsed
    #[display("Arrival")]
    Arrival,
    /// Resume the lifecycle coordinator of a process
    #[display("Resume({0})")]
    Resume(Pid),
}

/// A pending suspension, ordered by time then by registration order
#[derive(Debug, Clone, Display, Educe)]
#[educe(PartialEq, Eq, PartialOrd, Ord)]
#[display("@{time}#{seq} -> {wakeup}")]
pub struct Event {
    pub time: Time,
    pub seq: u64,
    #[educe(PartialEq(ignore))]
    #[educe(PartialOrd(ignore))]
    #[educe(Ord(ignore))]
    pub wakeup: Wakeup,
}

/// When to stop draining the clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndCondition {
    NoEvents,
    /// Stop before the first event strictly later than this time
    Time(Time),
}

/// The single authoritative simulated time, plus the pending events
#[derive(Debug, Default)]
pub struct Clock {
    now: Time,
    next_seq: u64,
    future_events: BinaryHeap<Reverse<Event>>,
    processed: usize,
}

impl Clock {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn now(&self) -> Time {
        self.now
    }

    /// Number of events handed out so far
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn is_idle(&self) -> bool {
        self.future_events.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.future_events.len()
    }

    /// Suspend `wakeup` until time advances by `delay`
    pub fn timeout(&mut self, delay: Duration, wakeup: Wakeup) -> Result<()> {
        // also rejects NaN
        if !(delay.0 >= 0.0) {
            error!(now = %self.now, delay = delay.0, %wakeup, "timer would go back in time");
            return Err(Error::InvalidDuration(delay.0));
        }
        self.post(self.now + delay, wakeup);
        Ok(())
    }

    /// Resume `wakeup` at the current instant, after everything already due now
    pub fn wake_now(&mut self, wakeup: Wakeup) {
        self.post(self.now, wakeup);
    }

    fn post(&mut self, time: Time, wakeup: Wakeup) {
        let event = Event {
            time,
            seq: self.next_seq,
            wakeup,
        };
        self.next_seq += 1;
        trace!(now = %self.now, %event, "push event");
        self.future_events.push(Reverse(event));
    }

    /// Pop the next due event and advance time to it, unless the end condition holds
    pub fn next_event(&mut self, until: &EndCondition) -> Option<Event> {
        let next = self.future_events.peek().map(|Reverse(e)| e.time)?;
        if let EndCondition::Time(budget) = until {
            if next > *budget {
                return None;
            }
        }

        let Reverse(event) = self.future_events.pop()?;
        debug_assert!(event.time >= self.now, "time never goes backwards");
        self.now = event.time;
        self.processed += 1;
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut Clock, until: EndCondition) -> Vec<(f64, Wakeup)> {
        let mut fired = vec![];
        while let Some(e) = clock.next_event(&until) {
            fired.push((e.time.0, e.wakeup));
        }
        fired
    }

    #[test]
    fn fires_in_time_order() {
        let mut clock = Clock::new();
        clock.timeout(Duration(3.0), Wakeup::Resume(1)).unwrap();
        clock.timeout(Duration(1.0), Wakeup::Resume(2)).unwrap();
        clock.timeout(Duration(2.0), Wakeup::Arrival).unwrap();

        let fired = drain(&mut clock, EndCondition::NoEvents);
        assert_eq!(
            fired,
            vec![(1.0, Wakeup::Resume(2)), (2.0, Wakeup::Arrival), (3.0, Wakeup::Resume(1))]
        );
        assert_eq!(clock.now(), Time(3.0));
        assert_eq!(clock.processed(), 3);
        assert!(clock.is_idle());
    }

    #[test]
    fn same_instant_ties_are_fifo() {
        let mut clock = Clock::new();
        for pid in &[5, 3, 9, 1] {
            clock.timeout(Duration(2.0), Wakeup::Resume(*pid)).unwrap();
        }
        clock.wake_now(Wakeup::Arrival);

        let fired = drain(&mut clock, EndCondition::NoEvents);
        let order: Vec<_> = fired.into_iter().map(|(_, w)| w).collect();
        assert_eq!(
            order,
            vec![
                Wakeup::Arrival,
                Wakeup::Resume(5),
                Wakeup::Resume(3),
                Wakeup::Resume(9),
                Wakeup::Resume(1)
            ]
        );
    }

    #[test]
    fn wake_now_goes_after_events_already_due() {
        let mut clock = Clock::new();
        clock.timeout(Duration(1.0), Wakeup::Resume(1)).unwrap();
        clock.timeout(Duration(1.0), Wakeup::Resume(2)).unwrap();

        let first = clock.next_event(&EndCondition::NoEvents).unwrap();
        assert_eq!(first.wakeup, Wakeup::Resume(1));
        // registered at t=1 while Resume(2) is already due at t=1
        clock.wake_now(Wakeup::Resume(3));

        let rest = drain(&mut clock, EndCondition::NoEvents);
        assert_eq!(rest, vec![(1.0, Wakeup::Resume(2)), (1.0, Wakeup::Resume(3))]);
    }

    #[test]
    fn negative_timer_fails_fast() {
        let mut clock = Clock::new();
        assert!(matches!(
            clock.timeout(Duration(-0.5), Wakeup::Arrival),
            Err(Error::InvalidDuration(_))
        ));
        assert!(matches!(
            clock.timeout(Duration(f64::NAN), Wakeup::Arrival),
            Err(Error::InvalidDuration(_))
        ));
        assert!(clock.is_idle());
        // zero is a valid, immediate timer
        clock.timeout(Duration(0.0), Wakeup::Arrival).unwrap();
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn budget_stops_before_later_events() {
        let mut clock = Clock::new();
        clock.timeout(Duration(5.0), Wakeup::Resume(1)).unwrap();
        clock.timeout(Duration(10.0), Wakeup::Resume(2)).unwrap();
        clock.timeout(Duration(10.5), Wakeup::Resume(3)).unwrap();

        let fired = drain(&mut clock, EndCondition::Time(Time(10.0)));
        assert_eq!(fired, vec![(5.0, Wakeup::Resume(1)), (10.0, Wakeup::Resume(2))]);
        // the late event stays pending, time does not move past the budget
        assert_eq!(clock.pending(), 1);
        assert_eq!(clock.now(), Time(10.0));
    }
}
