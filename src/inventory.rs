//! Fixed capacity, index addressed record of the blocks a workload still owns.
//!
//! The slot array lives in memory obtained from the allocator under test, the
//! same way a C harness would `malloc` its pointer array.

use std::{alloc::Layout, mem};

use thiserror::Error;

use crate::alloc::{Allocator, Handle};

#[derive(Debug, Default)]
pub enum Slot {
    #[default]
    Empty,
    Occupied(Handle),
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(_))
    }
}

#[derive(Debug, Error)]
#[error("cannot allocate backing storage for {capacity} slots")]
pub struct InventoryError {
    pub capacity: usize,
}

pub struct Inventory<'a, A: Allocator> {
    allocator: &'a A,
    block: Option<Handle>,
    capacity: usize,
    occupied: usize,
}

impl<'a, A: Allocator> Inventory<'a, A> {
    pub fn new(allocator: &'a A, capacity: usize) -> Result<Self, InventoryError> {
        let block = if capacity == 0 {
            None
        } else {
            let layout =
                Layout::array::<Slot>(capacity).map_err(|_| InventoryError { capacity })?;
            let block = allocator
                .allocate(layout)
                .ok_or(InventoryError { capacity })?;
            let base = block.as_ptr().cast::<Slot>();
            for i in 0..capacity {
                // SAFETY: the block is sized and aligned for `capacity` slots.
                unsafe { base.add(i).write(Slot::Empty) };
            }
            Some(block)
        };
        Ok(Inventory {
            allocator,
            block,
            capacity,
            occupied: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    fn slots_mut(&mut self) -> &mut [Slot] {
        match &self.block {
            // SAFETY: every slot was initialised in `new` and the block is
            // exclusively owned by this inventory.
            Some(block) => unsafe {
                std::slice::from_raw_parts_mut(block.as_ptr().cast::<Slot>(), self.capacity)
            },
            None => &mut [],
        }
    }

    fn slots(&self) -> &[Slot] {
        match &self.block {
            // SAFETY: see `slots_mut`.
            Some(block) => unsafe {
                std::slice::from_raw_parts(block.as_ptr().cast::<Slot>(), self.capacity)
            },
            None => &[],
        }
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.slots().get(index).is_some_and(Slot::is_occupied)
    }

    /// Stores `handle` in the empty slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds or the slot is already occupied.
    pub fn occupy(&mut self, index: usize, handle: Handle) {
        let slot = &mut self.slots_mut()[index];
        assert!(!slot.is_occupied(), "slot {index} is already occupied");
        *slot = Slot::Occupied(handle);
        self.occupied += 1;
    }

    /// Releases the block held at `index`. Empty or out of range slots are
    /// left alone and `false` is returned.
    pub fn release(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots_mut().get_mut(index) else {
            return false;
        };
        match mem::take(slot) {
            Slot::Occupied(handle) => {
                self.allocator.release(handle);
                self.occupied -= 1;
                true
            }
            Slot::Empty => false,
        }
    }

    /// Releases every occupied slot, returning how many were released.
    pub fn release_all(&mut self) -> usize {
        (0..self.capacity).filter(|&i| self.release(i)).count()
    }
}

impl<A: Allocator> Drop for Inventory<'_, A> {
    fn drop(&mut self) {
        self.release_all();
        if let Some(block) = self.block.take() {
            self.allocator.release(block);
        }
    }
}
