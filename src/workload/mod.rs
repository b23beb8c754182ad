//! The six allocation patterns, `a` through `f`.
//!
//! Every workload is described by a [`WorkloadId`] and three unsigned
//! parameters whose meaning depends on the workload. [`Workload`] is the typed
//! form the generators actually run.

use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{alloc::Allocator, inventory::InventoryError, sequence::SequenceError};

mod basic;
mod budget;
mod fragment;
mod strings;

pub use self::{
    basic::{interval_batch, simple_alloc_free},
    budget::randomized_budget,
    fragment::fragmentation,
    strings::{growable_strings, Phases},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "benchmark", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum WorkloadId {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl WorkloadId {
    pub const ALL: [WorkloadId; 6] = [
        WorkloadId::A,
        WorkloadId::B,
        WorkloadId::C,
        WorkloadId::D,
        WorkloadId::E,
        WorkloadId::F,
    ];

    pub fn letter(self) -> char {
        match self {
            WorkloadId::A => 'a',
            WorkloadId::B => 'b',
            WorkloadId::C => 'c',
            WorkloadId::D => 'd',
            WorkloadId::E => 'e',
            WorkloadId::F => 'f',
        }
    }

    /// Parameters of the reference harness.
    pub fn default_params(self) -> Params {
        match self {
            WorkloadId::A => Params::new(150, 1, 0),
            WorkloadId::B => Params::new(150, 1, 50),
            WorkloadId::C => Params::new(50, 1, 1),
            WorkloadId::D => Params::new(50, 1, 64),
            WorkloadId::E => Params::new(29, 59, 0),
            WorkloadId::F => Params::new(8, 32, 5),
        }
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.letter(), f)
    }
}

#[derive(Debug, Error)]
#[error("unknown workload `{0}`, expected one of a, b, c, d, e, f")]
pub struct UnknownWorkload(String);

impl FromStr for WorkloadId {
    type Err = UnknownWorkload;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadId::ALL
            .into_iter()
            .find(|id| s.len() == 1 && s.eq_ignore_ascii_case(&id.letter().to_string()))
            .ok_or_else(|| UnknownWorkload(s.to_owned()))
    }
}

/// The three raw parameters of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display(fmt = "({first}, {second}, {third})")]
pub struct Params {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

impl Params {
    pub const fn new(first: u32, second: u32, third: u32) -> Self {
        Params {
            first,
            second,
            third,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// `a`: allocate `size` bytes and release them right away, `iterations`
    /// times.
    SimpleAllocFree { iterations: usize, size: usize },
    /// `b`: `allocations` blocks of `size` bytes, released in batches of
    /// `interval`.
    IntervalBatch {
        allocations: usize,
        size: usize,
        interval: usize,
    },
    /// `c` and `d`: coin flips between allocating and releasing until
    /// `budget` allocations were made, then release everything.
    RandomizedBudget {
        budget: usize,
        min_size: usize,
        max_size: usize,
    },
    /// `e`: allocate `slots` random sized blocks, release a random subset,
    /// refill the holes, release everything.
    Fragmentation { slots: usize, min_size: usize },
    /// `f`: random strings pushed into, erased from and pushed again into a
    /// growable sequence.
    GrowableStrings {
        min_len: usize,
        max_len: usize,
        initial: usize,
    },
}

impl Workload {
    pub fn new(id: WorkloadId, params: Params) -> Self {
        let [first, second, third] = [params.first, params.second, params.third].map(|p| p as usize);
        match id {
            WorkloadId::A => Workload::SimpleAllocFree {
                iterations: first,
                size: second,
            },
            WorkloadId::B => Workload::IntervalBatch {
                allocations: first,
                size: second,
                interval: third,
            },
            WorkloadId::C | WorkloadId::D => Workload::RandomizedBudget {
                budget: first,
                min_size: second,
                max_size: third,
            },
            WorkloadId::E => Workload::Fragmentation {
                min_size: first,
                slots: second,
            },
            WorkloadId::F => Workload::GrowableStrings {
                min_len: first,
                max_len: second,
                initial: third,
            },
        }
    }

    pub fn run<A, R>(&self, allocator: &A, rng: &mut R) -> Result<Tally, WorkloadError>
    where
        A: Allocator,
        R: Rng + ?Sized,
    {
        match *self {
            Workload::SimpleAllocFree { iterations, size } => {
                Ok(simple_alloc_free(allocator, iterations, size))
            }
            Workload::IntervalBatch {
                allocations,
                size,
                interval,
            } => interval_batch(allocator, allocations, size, interval),
            Workload::RandomizedBudget {
                budget,
                min_size,
                max_size,
            } => randomized_budget(allocator, rng, budget, min_size, max_size),
            Workload::Fragmentation { slots, min_size } => {
                fragmentation(allocator, rng, slots, min_size)
            }
            Workload::GrowableStrings {
                min_len,
                max_len,
                initial,
            } => growable_strings(allocator, rng, min_len, max_len, initial).map(|(t, _)| t),
        }
    }
}

/// What a workload did to the allocator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[display(fmt = "allocated {allocated}, released {released}, failed {failed}")]
pub struct Tally {
    pub allocated: usize,
    pub released: usize,
    pub failed: usize,
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Tally) {
        self.allocated += other.allocated;
        self.released += other.released;
        self.failed += other.failed;
    }
}

impl Tally {
    /// Records the outcome of one allocation attempt and passes it through.
    pub(crate) fn allocation<T>(&mut self, result: Option<T>) -> Option<T> {
        match result {
            Some(_) => self.allocated += 1,
            None => self.failed += 1,
        }
        result
    }

    pub(crate) fn count_release(&mut self, released: bool) {
        if released {
            self.released += 1;
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),
}
