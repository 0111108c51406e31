//! Fixed-capacity bump arena with tail-only eviction.
//!
//! The traversal engine allocates `Node`/`Arc`/`State`/`Context` values out of
//! a single [`Pool`] so that their addresses are stable for the lifetime of
//! the run and, critically, so that allocation order is address order: a
//! value allocated before another always lives at a lower address. The
//! ancestor-sharing state graph depends on that invariant (see
//! `runtime::state`). Deallocation is therefore restricted to the tail of the
//! arena, mirroring a call stack: you can only pop what you most recently
//! pushed.
//!
//! Backing storage is either a plain heap buffer or a memory-mapped file,
//! selected at construction time.

use crate::errors::PoolError;
use std::alloc::Layout;
use std::cell::Cell;
use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;
use std::ptr::NonNull;

enum Backing {
    Heap(Box<[u8]>),
    MappedFile {
        mmap: memmap2::MmapMut,
        // keeps the file alive for the duration of the mapping
        _file: File,
    },
}

impl Backing {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        match self {
            Backing::Heap(b) => b.as_mut_ptr(),
            Backing::MappedFile { mmap, .. } => mmap.as_mut_ptr(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Backing::Heap(b) => b.len(),
            Backing::MappedFile { mmap, .. } => mmap.len(),
        }
    }
}

/// A handle to a value allocated in a [`Pool`]. Carries enough information
/// for [`Pool::evict`] to verify it is evicting the true tail allocation.
pub struct PoolRef<T> {
    ptr: NonNull<T>,
    offset: usize,
    size: usize,
    _marker: PhantomData<T>,
}

impl<T> PoolRef<T> {
    /// Raw address of the allocation, used by ancestor-ordering comparisons
    /// elsewhere in the engine (`runtime::state::StateRef`'s `Ord` impl).
    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// # Safety
    /// The pool that produced this ref must still be alive and must not have
    /// evicted this allocation.
    pub unsafe fn get(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }

    /// # Safety
    /// The pool that produced this ref must still be alive and must not have
    /// evicted this allocation, and no other live `&mut`/`&` borrow may
    /// coexist with this one.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut T {
        unsafe { &mut *self.ptr.as_ptr() }
    }
}

impl<T> Clone for PoolRef<T> {
    fn clone(&self) -> Self {
        PoolRef { ptr: self.ptr, offset: self.offset, size: self.size, _marker: PhantomData }
    }
}
impl<T> Copy for PoolRef<T> {}

/// Fixed-capacity bump arena. See module docs for the eviction discipline.
pub struct Pool {
    backing: Backing,
    // bump offset is a Cell so Pool can be shared behind a `&Pool` while
    // still allocating — the arena's own bookkeeping is the only mutable
    // state, never the values it hands out (those come back as raw pointers).
    tail: Cell<usize>,
    peak: Cell<usize>,
    evicted_total: Cell<usize>,
}

impl Pool {
    /// Create a heap-backed pool with the given fixed capacity, in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Pool {
            backing: Backing::Heap(vec![0u8; capacity].into_boxed_slice()),
            tail: Cell::new(0),
            peak: Cell::new(0),
            evicted_total: Cell::new(0),
        }
    }

    /// Create a pool backed by a memory-mapped file of the given capacity.
    /// The file is created/truncated to `capacity` bytes if needed.
    pub fn with_mapped_file(path: &Path, capacity: usize) -> Result<Self, PoolError> {
        let file = File::options().read(true).write(true).create(true).open(path)?;
        file.set_len(capacity as u64)?;
        let mmap = unsafe { memmap2::MmapMut::map_mut(&file)? };
        Ok(Pool {
            backing: Backing::MappedFile { mmap, _file: file },
            tail: Cell::new(0),
            peak: Cell::new(0),
            evicted_total: Cell::new(0),
        })
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.backing.len()
    }

    /// Bytes currently in use (from the start of the arena to the tail).
    pub fn usage(&self) -> usize {
        self.tail.get()
    }

    /// High-water mark of `usage()` over the pool's lifetime.
    pub fn peak_usage(&self) -> usize {
        self.peak.get()
    }

    /// Cumulative bytes reclaimed via `evict`.
    pub fn evicted_size(&self) -> usize {
        self.evicted_total.get()
    }

    /// Allocate and initialize a `T` at the current tail, bumping the tail
    /// past it. Fails with [`PoolError::OutOfMemory`] if the arena has no
    /// room, in which case `value` is dropped normally.
    pub fn allocate<T>(&self, value: T) -> Result<PoolRef<T>, PoolError> {
        let layout = Layout::new::<T>();
        let base = self.backing_base();
        let tail = self.tail.get();
        let aligned = align_up(base as usize + tail, layout.align()) - base as usize;
        let end = aligned
            .checked_add(layout.size())
            .ok_or(PoolError::OutOfMemory { requested: layout.size(), available: 0 })?;
        if end > self.backing.len() {
            return Err(PoolError::OutOfMemory {
                requested: end - tail,
                available: self.backing.len().saturating_sub(tail),
            });
        }
        // SAFETY: `aligned..end` is within the backing buffer, properly
        // aligned for T, and not aliased by any other live allocation
        // (the bump discipline never reuses bytes below `end` until evicted).
        let ptr = unsafe {
            let p = base.add(aligned) as *mut T;
            p.write(value);
            NonNull::new_unchecked(p)
        };
        self.tail.set(end);
        if end > self.peak.get() {
            self.peak.set(end);
        }
        Ok(PoolRef { ptr, offset: aligned, size: end - aligned, _marker: PhantomData })
    }

    /// Reclaim `r` if and only if it is the current tail allocation. Drops
    /// the contained value in place and rewinds the bump pointer.
    pub fn evict<T>(&self, r: PoolRef<T>) -> Result<(), PoolError> {
        let end = r.offset + r.size;
        if end != self.tail.get() {
            return Err(PoolError::NotTail);
        }
        // SAFETY: r.ptr points at a live T at the current tail; we are the
        // sole owner since no lower allocation can alias it and the caller
        // is giving up the ref by value.
        unsafe {
            std::ptr::drop_in_place(r.ptr.as_ptr());
        }
        self.tail.set(r.offset);
        self.evicted_total.set(self.evicted_total.get() + r.size);
        Ok(())
    }

    /// Reset the arena to empty, dropping nothing (callers must have already
    /// evicted or otherwise be done with every live allocation — this is a
    /// hard reset used between runs, not a safe bulk-drop).
    pub fn clear(&self) {
        self.evicted_total.set(self.evicted_total.get() + self.tail.get());
        self.tail.set(0);
    }

    fn backing_base(&self) -> *mut u8 {
        // casting away the outer immutability is sound here because `tail`
        // is the only thing callers observe as "already allocated"; bytes
        // past it are uninitialized and exclusively ours to write into.
        #[allow(clippy::cast_ref_to_mut)]
        let backing = unsafe { &mut *(&self.backing as *const Backing as *mut Backing) };
        backing.as_mut_ptr()
    }
}

fn align_up(addr: usize, align: usize) -> usize {
    (addr + align - 1) & !(align - 1)
}
