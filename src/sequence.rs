//! A growable sequence whose backing buffer comes from the allocator under
//! test. Growth doubles the capacity: allocate the new buffer, move the
//! elements over, release the old one.

use std::{alloc::Layout, ptr};

use thiserror::Error;

use crate::alloc::{Allocator, Handle};

#[derive(Debug, Error)]
#[error("cannot allocate a sequence buffer for {capacity} elements")]
pub struct SequenceError {
    pub capacity: usize,
}

pub struct GrowableSeq<'a, A: Allocator> {
    allocator: &'a A,
    buffer: Option<Handle>,
    capacity: usize,
    len: usize,
}

impl<'a, A: Allocator> GrowableSeq<'a, A> {
    pub fn with_capacity(allocator: &'a A, capacity: usize) -> Result<Self, SequenceError> {
        let buffer = Self::alloc_buffer(allocator, capacity)?;
        Ok(GrowableSeq {
            allocator,
            buffer,
            capacity,
            len: 0,
        })
    }

    fn alloc_buffer(allocator: &A, capacity: usize) -> Result<Option<Handle>, SequenceError> {
        if capacity == 0 {
            return Ok(None);
        }
        Layout::array::<Handle>(capacity)
            .ok()
            .and_then(|layout| allocator.allocate(layout))
            .map(Some)
            .ok_or(SequenceError { capacity })
    }

    fn base(&self) -> *mut Handle {
        self.buffer
            .as_ref()
            .map_or(ptr::null_mut(), |b| b.as_ptr().cast())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Handle> {
        // SAFETY: elements `0..len` are initialised.
        (index < self.len).then(|| unsafe { &*self.base().add(index) })
    }

    /// Appends `element`, growing the buffer when it is full. If the larger
    /// buffer cannot be allocated the element is handed back.
    pub fn push_back(&mut self, element: Handle) -> Result<(), Handle> {
        if self.len == self.capacity && self.grow().is_err() {
            return Err(element);
        }
        // SAFETY: `len < capacity` after a successful grow.
        unsafe { self.base().add(self.len).write(element) };
        self.len += 1;
        Ok(())
    }

    fn grow(&mut self) -> Result<(), SequenceError> {
        let capacity = (self.capacity * 2).max(1);
        let buffer = Self::alloc_buffer(self.allocator, capacity)?;
        if let (Some(new), true) = (&buffer, self.len > 0) {
            // SAFETY: the new buffer holds `capacity > len` elements and does
            // not overlap the old one. Elements are moved, not duplicated: the
            // old buffer is released without dropping anything.
            unsafe {
                ptr::copy_nonoverlapping(self.base(), new.as_ptr().cast::<Handle>(), self.len)
            };
        }
        if let Some(old) = std::mem::replace(&mut self.buffer, buffer) {
            self.allocator.release(old);
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Removes the element at `index`, shifting the tail down by one.
    ///
    /// Returns the removed element together with the index of the element
    /// that followed it, which is `index` itself after the shift.
    pub fn erase_at(&mut self, index: usize) -> Option<(Handle, usize)> {
        if index >= self.len {
            return None;
        }
        // SAFETY: `index < len`; the tail is moved down over the read slot.
        let element = unsafe {
            let at = self.base().add(index);
            let element = at.read();
            ptr::copy(at.add(1), at, self.len - index - 1);
            element
        };
        self.len -= 1;
        Some((element, index))
    }

    pub fn pop_back(&mut self) -> Option<Handle> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the element at the old `len - 1` is initialised and is no
        // longer reachable through the sequence.
        Some(unsafe { self.base().add(self.len).read() })
    }
}

impl<A: Allocator> Drop for GrowableSeq<'_, A> {
    fn drop(&mut self) {
        while let Some(element) = self.pop_back() {
            self.allocator.release(element);
        }
        if let Some(buffer) = self.buffer.take() {
            self.allocator.release(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::testing::{self, FailingAllocator};

    fn tagged<A: Allocator>(a: &A, tag: u8) -> Handle {
        let mut h = a.allocate_bytes(1).unwrap();
        h.bytes_mut()[0] = tag;
        h
    }

    fn tags<A: Allocator>(seq: &GrowableSeq<'_, A>) -> Vec<u8> {
        (0..seq.len()).map(|i| seq.get(i).unwrap().bytes()[0]).collect()
    }

    #[test]
    fn grows_by_doubling() {
        let a = testing::counting();
        let mut seq = GrowableSeq::with_capacity(&a, 2).unwrap();
        for tag in 0..5 {
            seq.push_back(tagged(&a, tag)).unwrap();
        }
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.capacity(), 8);
        assert_eq!(tags(&seq), [0, 1, 2, 3, 4]);

        // 2 -> 4 -> 8: two growths, each releasing the previous buffer
        let stats = a.hooks().stats();
        assert_eq!(stats.total_num, 3 + 5);
        assert_eq!(stats.outstanding, 1 + 5);

        drop(seq);
        assert_eq!(a.hooks().stats().outstanding, 0);
    }

    #[test]
    fn erase_shifts_the_tail() {
        let a = testing::counting();
        let mut seq = GrowableSeq::with_capacity(&a, 0).unwrap();
        for tag in 0..4 {
            seq.push_back(tagged(&a, tag)).unwrap();
        }
        let (removed, next) = seq.erase_at(1).unwrap();
        assert_eq!(removed.bytes()[0], 1);
        assert_eq!(next, 1);
        assert_eq!(seq.get(next).unwrap().bytes()[0], 2);
        a.release(removed);
        assert_eq!(tags(&seq), [0, 2, 3]);

        let (last, next) = seq.erase_at(2).unwrap();
        a.release(last);
        assert_eq!(next, seq.len());
        assert!(seq.erase_at(2).is_none());

        let tail = seq.pop_back().unwrap();
        assert_eq!(tail.bytes()[0], 2);
        a.release(tail);
        assert_eq!(tags(&seq), [0]);
    }

    #[test]
    fn failed_growth_hands_the_element_back() {
        // call 0: buffer, calls 1 and 2: elements, call 3: growth
        let a = FailingAllocator::new(|call| call == 3);
        let mut seq = GrowableSeq::with_capacity(&a, 1).unwrap();
        seq.push_back(a.allocate_bytes(1).unwrap()).unwrap();
        let extra = a.allocate_bytes(1).unwrap();
        let extra = seq.push_back(extra).unwrap_err();
        a.release(extra);
        assert_eq!(a.calls(), 4);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.capacity(), 1);
        drop(seq);
        assert_eq!(a.inner.hooks().stats().outstanding, 0);
    }

    #[test]
    fn buffer_failure_is_reported() {
        let a = FailingAllocator::new(|_| true);
        assert_eq!(GrowableSeq::with_capacity(&a, 5).err().unwrap().capacity, 5);
    }
}
