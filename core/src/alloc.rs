//! Allocation accounting through a counting global allocator.
//!
//! The library only defines the allocator; binaries opt in with
//! `#[global_allocator] static A: CountingAllocator = CountingAllocator;`.
//! Without it every snapshot reads zero and allocation columns stay empty.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Wraps the system allocator and counts every byte handed out.
pub struct CountingAllocator;

struct AllocCounters {
    allocated: AtomicU64,
    live: AtomicUsize,
}

static COUNTERS: AllocCounters = AllocCounters {
    allocated: AtomicU64::new(0),
    live: AtomicUsize::new(0),
};

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, old_layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, old_layout, new_size) };
        if !new_ptr.is_null() {
            adjust_realloc(old_layout.size(), new_size);
        }
        new_ptr
    }
}

fn record_alloc(size: usize) {
    COUNTERS.allocated.fetch_add(size as u64, Ordering::Relaxed);
    COUNTERS.live.fetch_add(size, Ordering::Relaxed);
}

fn record_dealloc(size: usize) {
    COUNTERS.live.fetch_sub(size, Ordering::Relaxed);
}

// Growth counts as fresh allocation; shrinking only lowers the live total.
fn adjust_realloc(old: usize, new: usize) {
    if new > old {
        record_alloc(new - old);
    } else if old > new {
        record_dealloc(old - new);
    }
}

/// Point-in-time reading of the allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocSnapshot {
    /// Cumulative bytes allocated since process start. Never decreases.
    pub allocated: u64,
    /// Bytes currently outstanding.
    pub live: usize,
}

impl AllocSnapshot {
    pub fn take() -> Self {
        Self {
            allocated: COUNTERS.allocated.load(Ordering::SeqCst),
            live: COUNTERS.live.load(Ordering::SeqCst),
        }
    }

    /// Bytes allocated between `earlier` and `self`, independent of frees.
    pub fn allocated_since(&self, earlier: &AllocSnapshot) -> u64 {
        self.allocated.saturating_sub(earlier.allocated)
    }
}

/// Whether [`CountingAllocator`] is installed as the global allocator.
pub fn is_tracking() -> bool {
    COUNTERS.allocated.load(Ordering::Relaxed) > 0
}
