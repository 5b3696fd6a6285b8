use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Exp;

use crate::types::Duration;
use crate::utils::prelude::*;

pub const MEMORY_DEMAND: (u32, u32) = (1, 10);
pub const INSTRUCTIONS: (u32, u32) = (1, 10);
pub const IO_TIME: (f64, f64) = (1.0, 3.0);

/// What a process does after a slice that did not finish it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSlice {
    Io,
    Requeue,
}

/// The random variables of one run, all sampled from the run's own generator
#[derive(Debug, Clone)]
pub struct Workload {
    gap: Exp<f64>,
    memory: Uniform<u32>,
    instructions: Uniform<u32>,
    io: Uniform<f64>,
}

impl Workload {
    /// `arrival_interval` is the mean gap between two arrivals
    pub fn new(arrival_interval: f64) -> Result<Self> {
        Ok(Self {
            gap: Exp::new(1.0 / arrival_interval)?,
            memory: Uniform::new_inclusive(MEMORY_DEMAND.0, MEMORY_DEMAND.1),
            instructions: Uniform::new_inclusive(INSTRUCTIONS.0, INSTRUCTIONS.1),
            io: Uniform::new_inclusive(IO_TIME.0, IO_TIME.1),
        })
    }

    pub fn inter_arrival(&self, rng: &mut impl Rng) -> Duration {
        Duration(self.gap.sample(rng))
    }

    pub fn memory_demand(&self, rng: &mut impl Rng) -> u32 {
        self.memory.sample(rng)
    }

    pub fn instructions(&self, rng: &mut impl Rng) -> u32 {
        self.instructions.sample(rng)
    }

    pub fn io_time(&self, rng: &mut impl Rng) -> Duration {
        Duration(self.io.sample(rng))
    }

    /// A fair coin: 1 goes to I/O, 2 goes straight back to the ready queue
    pub fn after_slice(&self, rng: &mut impl Rng) -> AfterSlice {
        match rng.gen_range(1..=2) {
            1 => AfterSlice::Io,
            _ => AfterSlice::Requeue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_seeder::{Seeder, SipRng};

    fn rng() -> SipRng {
        Seeder::from("workload").make_rng()
    }

    #[test]
    fn draws_stay_in_range() {
        let w = Workload::new(5.0).unwrap();
        let mut rng = rng();
        for _ in 0..1000 {
            let m = w.memory_demand(&mut rng);
            assert!((1..=10).contains(&m));
            let i = w.instructions(&mut rng);
            assert!((1..=10).contains(&i));
            let io = *w.io_time(&mut rng);
            assert!((1.0..=3.0).contains(&io));
            assert!(*w.inter_arrival(&mut rng) >= 0.0);
        }
    }

    #[test]
    fn inter_arrival_mean_follows_interval() {
        let w = Workload::new(4.0).unwrap();
        let mut rng = rng();
        let n = 20_000;
        let mean = (0..n).map(|_| *w.inter_arrival(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 4.0).abs() < 0.2, "mean gap {}", mean);
    }

    #[test]
    fn branch_is_roughly_fair() {
        let w = Workload::new(1.0).unwrap();
        let mut rng = rng();
        let n = 10_000;
        let io = (0..n)
            .filter(|_| w.after_slice(&mut rng) == AfterSlice::Io)
            .count();
        let share = io as f64 / n as f64;
        assert!((share - 0.5).abs() < 0.03, "io share {}", share);
    }

    #[test]
    fn same_seed_same_draws() {
        let w = Workload::new(10.0).unwrap();
        let (mut a, mut b) = (rng(), rng());
        let xs: Vec<_> = (0..50).map(|_| w.memory_demand(&mut a)).collect();
        let ys: Vec<_> = (0..50).map(|_| w.memory_demand(&mut b)).collect();
        assert_eq!(xs, ys);
    }
}
