use rand::Rng;

use super::{Tally, WorkloadError};
use crate::{alloc::Allocator, inventory::Inventory, random};

/// Workload `e`: fragment the heap and ask it to fill the holes.
///
/// Fills `slots` slots with blocks of `1..=slots` bytes, releases a random
/// half of them, refills every empty slot with `min_size..=slots` bytes and
/// finally releases everything.
pub fn fragmentation<A, R>(
    allocator: &A,
    rng: &mut R,
    slots: usize,
    min_size: usize,
) -> Result<Tally, WorkloadError>
where
    A: Allocator,
    R: Rng + ?Sized,
{
    let mut inventory = Inventory::new(allocator, slots)?;
    let mut tally = Tally::default();

    for i in 0..slots {
        let size = random::uniform_inclusive(rng, 1, slots);
        if let Some(handle) = tally.allocation(allocator.allocate_bytes(size)) {
            inventory.occupy(i, handle);
        }
    }

    for i in 0..slots {
        if random::uniform_bool(rng) {
            tally.count_release(inventory.release(i));
        }
    }

    for i in 0..slots {
        if !inventory.is_occupied(i) {
            let size = random::uniform_inclusive(rng, min_size, slots);
            if let Some(handle) = tally.allocation(allocator.allocate_bytes(size)) {
                inventory.occupy(i, handle);
            }
        }
    }

    tally.released += inventory.release_all();
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        alloc::{
            allocator::{AllocHooks, TracingAllocator},
            testing::{self, FailingAllocator},
            SystemAllocator,
        },
        random::seeded,
    };

    #[test]
    fn every_slot_filled_once_or_twice() {
        let a = testing::counting();
        for seed in 0..20 {
            let tally = fragmentation(&a, &mut seeded(seed), 59, 29).unwrap();
            assert!((59..=2 * 59).contains(&tally.allocated));
            assert_eq!(tally.failed, 0);
            assert_eq!(tally.allocated, tally.released);

            let stats = a.hooks().take();
            assert_eq!(stats.outstanding, 0);
            // payload blocks plus the slot array
            assert_eq!(stats.total_num, tally.allocated + 1);
        }
    }

    #[derive(Default)]
    struct Sizes(RefCell<Vec<usize>>);

    impl AllocHooks for Sizes {
        fn on_alloc(&self, _: *mut u8, size: usize, _: usize) {
            self.0.borrow_mut().push(size);
        }
        fn on_alloc_failed(&self, _: usize, _: usize) {}
        fn on_dealloc(&self, _: *mut u8, _: usize, _: usize) {}
    }

    #[test]
    fn refill_sizes_respect_the_minimum() {
        let a = TracingAllocator::new(Sizes::default(), SystemAllocator::system());
        let tally = fragmentation(&a, &mut seeded(3), 8, 8).unwrap();
        let sizes = a.hooks().0.borrow();
        // slot array, first pass, refills
        assert_eq!(sizes.len(), 1 + tally.allocated);
        assert!(sizes[1..9].iter().all(|s| (1..=8).contains(s)));
        assert!(sizes[9..].iter().all(|&s| s == 8));
    }

    #[test]
    fn failed_first_pass_is_refilled() {
        // call 0 is the slot array, calls 1..=4 the first pass
        let a = FailingAllocator::new(|call| (1..=4).contains(&call));
        let tally = fragmentation(&a, &mut seeded(4), 4, 1).unwrap();
        assert_eq!(tally.failed, 4);
        assert_eq!(tally.allocated, 4);
        assert_eq!(tally.released, 4);
        assert_eq!(a.inner.hooks().stats().outstanding, 0);
    }
}
