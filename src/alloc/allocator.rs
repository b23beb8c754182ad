use std::alloc::Layout;

use super::{Allocator, Handle};

/// Forwards every request to `A` and reports it to the hooks `H`.
#[derive(Debug, Default)]
pub struct TracingAllocator<H, A>(A, H)
where
    A: Allocator;

impl<H, A> TracingAllocator<H, A>
where
    A: Allocator,
{
    pub const fn new(hooks: H, allocator: A) -> Self {
        TracingAllocator(allocator, hooks)
    }

    pub fn hooks(&self) -> &H {
        &self.1
    }
}

impl<H, A> Allocator for TracingAllocator<H, A>
where
    A: Allocator,
    H: AllocHooks,
{
    fn allocate(&self, layout: Layout) -> Option<Handle> {
        let size = layout.size();
        let align = layout.align();
        match self.0.allocate(layout) {
            Some(handle) => {
                self.1.on_alloc(handle.as_ptr(), size, align);
                Some(handle)
            }
            None => {
                self.1.on_alloc_failed(size, align);
                None
            }
        }
    }

    fn release(&self, handle: Handle) {
        let pointer = handle.as_ptr();
        let size = handle.size();
        let align = handle.layout().align();
        self.0.release(handle);
        self.1.on_dealloc(pointer, size, align);
    }
}

pub trait AllocHooks {
    fn on_alloc(&self, pointer: *mut u8, size: usize, align: usize);
    fn on_alloc_failed(&self, size: usize, align: usize);
    fn on_dealloc(&self, pointer: *mut u8, size: usize, align: usize);
}
