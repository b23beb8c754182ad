use std::{
    alloc::{GlobalAlloc, Layout, System},
    fmt,
    ptr::NonNull,
    slice,
};

use self::{allocator::TracingAllocator, measure::CountingHooks};

pub mod allocator;
pub mod measure;

/// An owned block obtained from an [`Allocator`].
///
/// A handle is neither `Clone` nor `Copy`: giving it back to
/// [`Allocator::release`] consumes it, so a block cannot be released twice.
pub struct Handle {
    pointer: NonNull<u8>,
    layout: Layout,
}

impl Handle {
    pub fn into_raw_parts(self) -> (NonNull<u8>, Layout) {
        (self.pointer, self.layout)
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.pointer.as_ptr()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn bytes(&self) -> &[u8] {
        // SAFETY: the handle uniquely owns `size` bytes starting at `pointer`.
        // Callers only read bytes they have written through `bytes_mut`.
        unsafe { slice::from_raw_parts(self.pointer.as_ptr(), self.size()) }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: see `bytes`; `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.pointer.as_ptr(), self.size()) }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pointer", &self.pointer)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

/// The allocator under test.
///
/// A failed allocation is reported as `None` and is never fatal.
pub trait Allocator {
    fn allocate(&self, layout: Layout) -> Option<Handle>;

    fn release(&self, handle: Handle);

    fn allocate_bytes(&self, size: usize) -> Option<Handle> {
        Layout::from_size_align(size, 1)
            .ok()
            .and_then(|layout| self.allocate(layout))
    }
}

impl<T: Allocator + ?Sized> Allocator for &T {
    fn allocate(&self, layout: Layout) -> Option<Handle> {
        (**self).allocate(layout)
    }

    fn release(&self, handle: Handle) {
        (**self).release(handle)
    }
}

/// Adapts any [`GlobalAlloc`] to [`Allocator`]; the platform allocator by
/// default.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator<A = System>(pub A)
where
    A: GlobalAlloc;

impl<A: GlobalAlloc> SystemAllocator<A> {
    pub const fn new(allocator: A) -> Self {
        SystemAllocator(allocator)
    }
}

impl SystemAllocator {
    /// The platform allocator.
    pub const fn system() -> Self {
        SystemAllocator(System)
    }
}

impl<A: GlobalAlloc> Allocator for SystemAllocator<A> {
    fn allocate(&self, layout: Layout) -> Option<Handle> {
        // zero-sized layouts are undefined behaviour for `GlobalAlloc::alloc`
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size.
        let pointer = unsafe { self.0.alloc(layout) };
        NonNull::new(pointer).map(|pointer| Handle { pointer, layout })
    }

    fn release(&self, handle: Handle) {
        let (pointer, layout) = handle.into_raw_parts();
        // SAFETY: handles are only created by `allocate` above with the same
        // layout, and releasing consumes the handle.
        unsafe { self.0.dealloc(pointer.as_ptr(), layout) }
    }
}

pub const fn default_tracing_allocator() -> TracingAllocator<CountingHooks, SystemAllocator> {
    TracingAllocator::new(CountingHooks::new(), SystemAllocator::system())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_round_trip() {
        let a = SystemAllocator::system();
        let mut h = a.allocate_bytes(16).unwrap();
        assert_eq!(h.size(), 16);
        h.bytes_mut().copy_from_slice(&[7; 16]);
        assert!(h.bytes().iter().all(|&b| b == 7));
        a.release(h);
    }

    #[test]
    fn zero_size_is_a_failure() {
        let a = SystemAllocator::system();
        assert!(a.allocate_bytes(0).is_none());
    }
}
