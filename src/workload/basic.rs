use super::{Tally, WorkloadError};
use crate::{alloc::Allocator, inventory::Inventory};

/// Workload `a`: `iterations` times, allocate `size` bytes and release them
/// immediately. Failed allocations are skipped.
pub fn simple_alloc_free<A: Allocator>(allocator: &A, iterations: usize, size: usize) -> Tally {
    let mut tally = Tally::default();
    for _ in 0..iterations {
        if let Some(handle) = tally.allocation(allocator.allocate_bytes(size)) {
            allocator.release(handle);
            tally.count_release(true);
        }
    }
    tally
}

/// Workload `b`: make `allocations` allocations of `size` bytes, each into its
/// own slot, and release every `interval` freshly filled slots as a batch.
///
/// A failed allocation still counts towards the total and leaves its slot
/// empty. A trailing partial batch is released at the end.
pub fn interval_batch<A: Allocator>(
    allocator: &A,
    allocations: usize,
    size: usize,
    interval: usize,
) -> Result<Tally, WorkloadError> {
    if interval == 0 {
        return Err(WorkloadError::InvalidParams("batch interval must be non-zero"));
    }
    let mut slots = Inventory::new(allocator, allocations)?;
    let mut tally = Tally::default();

    for start in (0..allocations).step_by(interval) {
        let end = (start + interval).min(allocations);
        for i in start..end {
            if let Some(handle) = tally.allocation(allocator.allocate_bytes(size)) {
                slots.occupy(i, handle);
            }
        }
        for i in (start..end).rev() {
            tally.count_release(slots.release(i));
        }
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{
        allocator::{AllocHooks, TracingAllocator},
        testing::{self, FailingAllocator},
        SystemAllocator,
    };
    use std::cell::RefCell;

    #[test]
    fn simple_150_single_bytes() {
        let a = testing::counting();
        let tally = simple_alloc_free(&a, 150, 1);
        assert_eq!(
            tally,
            Tally {
                allocated: 150,
                released: 150,
                failed: 0
            }
        );
        let stats = a.hooks().stats();
        assert_eq!(stats.total_num, 150);
        assert_eq!(stats.releases, 150);
        assert_eq!(stats.outstanding, 0);
        assert_eq!(stats.peak, 1);
    }

    #[test]
    fn simple_skips_failures() {
        let a = FailingAllocator::new(|call| call % 3 == 0);
        let tally = simple_alloc_free(&a, 30, 4);
        assert_eq!(a.calls(), 30);
        assert_eq!(tally.failed, 10);
        assert_eq!(tally.released, 20);
        assert_eq!(a.inner.hooks().stats().outstanding, 0);
    }

    /// Records the live block count before every release.
    #[derive(Default)]
    struct LiveAtRelease {
        live: RefCell<isize>,
        seen: RefCell<Vec<isize>>,
    }

    impl AllocHooks for LiveAtRelease {
        fn on_alloc(&self, _: *mut u8, _: usize, _: usize) {
            *self.live.borrow_mut() += 1;
        }
        fn on_alloc_failed(&self, _: usize, _: usize) {}
        fn on_dealloc(&self, _: *mut u8, _: usize, _: usize) {
            self.seen.borrow_mut().push(*self.live.borrow());
            *self.live.borrow_mut() -= 1;
        }
    }

    #[test]
    fn batches_of_interval() {
        let a = TracingAllocator::new(LiveAtRelease::default(), SystemAllocator::system());
        let tally = interval_batch(&a, 150, 1, 50).unwrap();
        assert_eq!(tally.allocated, 150);
        assert_eq!(tally.released, 150);

        // the slot array plus one full batch is live when a batch starts
        // draining, and the slot array goes last
        let seen = a.hooks().seen.borrow();
        assert_eq!(seen.len(), 151);
        for batch in seen[..150].chunks(50) {
            assert_eq!(batch.first(), Some(&51));
            assert_eq!(batch.last(), Some(&2));
        }
        assert_eq!(seen[150], 1);
        assert_eq!(*a.hooks().live.borrow(), 0);
    }

    #[test]
    fn partial_batch_and_failures() {
        let a = FailingAllocator::new(|call| call == 5);
        let tally = interval_batch(&a, 12, 8, 5).unwrap();
        // call 0 is the slot array
        assert_eq!(a.calls(), 13);
        assert_eq!(tally.allocated, 11);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.released, 11);
        assert_eq!(a.inner.hooks().stats().outstanding, 0);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let a = testing::counting();
        assert!(matches!(
            interval_batch(&a, 10, 1, 0),
            Err(WorkloadError::InvalidParams(_))
        ));
        assert_eq!(a.hooks().stats().total_num, 0);
    }

    #[test]
    fn slot_array_failure_aborts() {
        let a = FailingAllocator::new(|call| call == 0);
        assert!(matches!(
            interval_batch(&a, 10, 1, 5),
            Err(WorkloadError::Inventory(_))
        ));
        assert_eq!(a.calls(), 1);
    }
}
