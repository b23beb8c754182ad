use std::cell::Cell;

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[display(fmt = r#"Currently allocated (B): {current}
Maximum allocated (B): {peak}
Total amount of claimed memory (B): {total_size}
Total number of allocations (N): {total_num}
Total number of releases (N): {releases}
Failed allocations (N): {failures}
Outstanding blocks (N): {outstanding}
"#)]
pub struct MemoryStats {
    pub current: usize,
    pub peak: usize,
    pub total_size: usize,
    pub total_num: usize,
    pub releases: usize,
    pub failures: usize,
    pub outstanding: usize,
}

/// Hooks counting everything that goes through a
/// [`TracingAllocator`](super::allocator::TracingAllocator).
///
/// The harness is single threaded, so plain cells are enough.
#[derive(Debug, Default)]
pub struct CountingHooks {
    stats: Cell<Counters>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    current: usize,
    peak: usize,
    total_size: usize,
    total_num: usize,
    releases: usize,
    failures: usize,
}

impl CountingHooks {
    pub const fn new() -> Self {
        CountingHooks {
            stats: Cell::new(Counters {
                current: 0,
                peak: 0,
                total_size: 0,
                total_num: 0,
                releases: 0,
                failures: 0,
            }),
        }
    }

    pub fn stats(&self) -> MemoryStats {
        let c = self.stats.get();
        MemoryStats {
            current: c.current,
            peak: c.peak,
            total_size: c.total_size,
            total_num: c.total_num,
            releases: c.releases,
            failures: c.failures,
            outstanding: c.total_num.saturating_sub(c.releases),
        }
    }

    /// Returns the counters gathered so far and starts from zero again.
    pub fn take(&self) -> MemoryStats {
        let stats = self.stats();
        self.stats.set(Counters::default());
        stats
    }

    fn update(&self, f: impl FnOnce(&mut Counters)) {
        let mut c = self.stats.get();
        f(&mut c);
        self.stats.set(c);
    }
}

impl super::allocator::AllocHooks for CountingHooks {
    fn on_alloc(&self, _pointer: *mut u8, size: usize, _align: usize) {
        self.update(|c| {
            c.current += size;
            c.total_size += size;
            c.total_num += 1;
            if c.current > c.peak {
                c.peak = c.current;
            }
        });
    }

    fn on_alloc_failed(&self, _size: usize, _align: usize) {
        self.update(|c| c.failures += 1);
    }

    fn on_dealloc(&self, _pointer: *mut u8, size: usize, _align: usize) {
        self.update(|c| {
            c.current = c.current.saturating_sub(size);
            c.releases += 1;
        });
    }
}

/// Allocators that can report what a workload did to them.
pub trait MemoryProbe {
    /// Returns the statistics gathered since the previous call, if this
    /// allocator gathers any.
    fn take_stats(&self) -> Option<MemoryStats>;
}

impl<A: std::alloc::GlobalAlloc> MemoryProbe for super::SystemAllocator<A> {
    fn take_stats(&self) -> Option<MemoryStats> {
        None
    }
}

impl<A: super::Allocator> MemoryProbe for super::allocator::TracingAllocator<CountingHooks, A> {
    fn take_stats(&self) -> Option<MemoryStats> {
        Some(self.hooks().take())
    }
}
