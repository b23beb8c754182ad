use rand::Rng;

use super::{Tally, WorkloadError};
use crate::{alloc::Allocator, inventory::Inventory, random};

/// Workloads `c` and `d`.
///
/// Until `budget` allocations have been made, every step flips a coin: heads
/// releases the most recently filled slot (if it still holds a block), tails
/// allocates `min_size..=max_size` bytes into the next slot. Once the budget
/// is spent, slots are released from index `budget - 1` down to `0`, one per
/// step, skipping the ones that are already empty.
///
/// A failed allocation is skipped without touching the budget, so exactly
/// `budget` blocks are allocated once the allocator stops failing.
pub fn randomized_budget<A, R>(
    allocator: &A,
    rng: &mut R,
    budget: usize,
    min_size: usize,
    max_size: usize,
) -> Result<Tally, WorkloadError>
where
    A: Allocator,
    R: Rng + ?Sized,
{
    let mut slots = Inventory::new(allocator, budget)?;
    let mut tally = Tally::default();
    let mut made = 0;
    let mut to_free = budget;

    while to_free > 0 {
        if made == budget {
            tally.count_release(slots.release(to_free - 1));
            to_free -= 1;
        } else if random::uniform_bool(rng) {
            if made > 0 {
                tally.count_release(slots.release(made - 1));
            }
        } else {
            let size = if min_size == max_size {
                min_size
            } else {
                random::uniform_inclusive(rng, min_size, max_size)
            };
            if let Some(handle) = tally.allocation(allocator.allocate_bytes(size)) {
                slots.occupy(made, handle);
                made += 1;
            }
        }
    }
    Ok(tally)
}
