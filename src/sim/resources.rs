//! The three shared resources a process contends for.
//!
//! Pools never resume anyone themselves: a release returns the waiters that
//! were just granted, in FIFO order, and the caller wakes them on the clock.

use std::collections::VecDeque;

use crate::process::Pid;
use crate::utils::prelude::*;

/// Result of an acquire attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Grant {
    /// Acquired on the spot, the caller keeps going
    Now,
    /// Enqueued, the caller suspends until a release hands the resource over
    Queued,
}

/// Counting memory container, `level` is the amount still free
#[derive(Debug)]
pub struct MemoryPool {
    capacity: u32,
    level: u32,
    waiting: VecDeque<(Pid, u32)>,
}

impl MemoryPool {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            level: capacity,
            waiting: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn in_use(&self) -> u32 {
        self.capacity - self.level
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    /// Take `amount` units, or wait behind everyone already waiting
    pub fn acquire(&mut self, pid: Pid, amount: u32) -> Grant {
        assert!(amount > 0, "memory demand must be positive");
        if amount > self.capacity {
            warn!(pid, amount, capacity = self.capacity, "memory demand can never be satisfied");
        }
        if self.waiting.is_empty() && amount <= self.level {
            self.level -= amount;
            Grant::Now
        } else {
            self.waiting.push_back((pid, amount));
            Grant::Queued
        }
    }

    /// Give back `amount` units and grant waiters from the head while they fit
    pub fn release(&mut self, amount: u32) -> Vec<Pid> {
        assert!(
            amount <= self.in_use(),
            "releasing {} units with only {} in use",
            amount,
            self.in_use()
        );
        self.level += amount;

        let mut granted = vec![];
        while let Some(&(pid, demand)) = self.waiting.front() {
            if demand > self.level {
                break;
            }
            self.level -= demand;
            self.waiting.pop_front();
            granted.push(pid);
        }
        granted
    }
}

/// CPU units, handed out one at a time in request order
#[derive(Debug)]
pub struct CpuPool {
    capacity: usize,
    in_use: usize,
    waiting: VecDeque<Pid>,
}

impl CpuPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: 0,
            waiting: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn acquire(&mut self, pid: Pid) -> Grant {
        if self.in_use < self.capacity {
            self.in_use += 1;
            Grant::Now
        } else {
            self.waiting.push_back(pid);
            Grant::Queued
        }
    }

    /// Release one unit; if someone is waiting the unit goes straight to them
    pub fn release(&mut self) -> Option<Pid> {
        assert!(self.in_use > 0, "releasing an idle cpu");
        match self.waiting.pop_front() {
            Some(next) => Some(next),
            None => {
                self.in_use -= 1;
                None
            }
        }
    }
}

/// I/O device queue, unbounded so entering never blocks
#[derive(Debug, Default)]
pub struct IoQueue {
    in_service: VecDeque<Pid>,
    served: usize,
}

impl IoQueue {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn enter(&mut self, pid: Pid) {
        self.in_service.push_back(pid);
        self.served += 1;
    }

    pub fn leave(&mut self, pid: Pid) {
        match self.in_service.iter().position(|p| *p == pid) {
            Some(idx) => {
                self.in_service.remove(idx);
            }
            None => warn!(pid, "leaving the io queue without entering it"),
        }
    }

    pub fn len(&self) -> usize {
        self.in_service.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_service.is_empty()
    }

    /// Total number of I/O requests accepted so far
    pub fn served(&self) -> usize {
        self.served
    }
}
