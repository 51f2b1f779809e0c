use std::cell::{Cell, OnceCell};
use std::mem::align_of;
use std::ops::Deref;
use std::ptr::NonNull;

use addrspace::{CommitStrategy, Reservation};

use super::{PoolError, StackPoolBuilder};

/// Address space reserved for every stack. 64 GB? Why not, it is only address space.
pub const DEFAULT_LARGE_STACK: usize = 1 << 36;
/// Maximum number of stacks a pool materializes.
pub const DEFAULT_MAX_STACKS: usize = 1 << 10;

/// One huge reservation plus a bump pointer (`sp`) marking how much of it is handed out.
///
/// A stack lives as long as its pool. `sp` only moves forward when a container carves space from
/// it and only moves back when that container goes away again, in reverse order.
#[derive(Debug)]
pub struct Stack {
    region: Reservation,
    sp: Cell<*mut u8>,
    index: usize,
}

impl Stack {
    fn new(index: usize, size: usize, commit: CommitStrategy) -> Result<Self, PoolError> {
        let region = Reservation::new(size, commit)?;
        let sp = Cell::new(region.base());
        Ok(Self { region, sp, index })
    }

    /// Returns a pointer to the start of the stack's memory.
    pub fn memory(&self) -> *mut u8 {
        self.region.base()
    }

    /// Returns the current allocation frontier.
    pub fn sp(&self) -> *mut u8 {
        self.sp.get()
    }

    /// Returns a pointer one past the last usable byte.
    pub fn end(&self) -> *mut u8 {
        self.region.end()
    }

    /// Reserved size in bytes.
    pub fn size(&self) -> usize {
        self.region.len()
    }

    /// Bytes between the frontier and the end of the stack.
    pub fn remaining(&self) -> usize {
        self.end() as usize - self.sp() as usize
    }

    /// Slot of this stack inside its pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The frontier, aligned up for `T`.
    pub(crate) fn aligned_sp<T>(&self) -> NonNull<T> {
        let sp = self.sp.get();
        let aligned = sp.wrapping_add(sp.align_offset(align_of::<T>()));
        // The reservation is never at address zero.
        unsafe { NonNull::new_unchecked(aligned as *mut T) }
    }

    /// Hands out `bytes` bytes from the frontier, aligned to `align`, and moves the frontier past
    /// them.
    pub(crate) fn carve(&self, bytes: usize, align: usize) -> Result<Carve, PoolError> {
        let sp = self.sp.get();
        let start = sp.wrapping_add(sp.align_offset(align));
        let available = (self.end() as usize).saturating_sub(start as usize);
        if bytes > available {
            tracing::warn!(stack = self.index, requested = bytes, available, "stack is full");
            return Err(PoolError::StackFull {
                requested: bytes,
                available,
            });
        }
        let end = start.wrapping_add(bytes);
        self.sp.set(end);
        Ok(Carve {
            start,
            end,
            rewind_to: sp,
        })
    }

    /// Gives the region of `carve` back.
    ///
    /// # Panics
    ///
    /// Panics if something carved after `carve` is still holding on to its region.
    pub(crate) fn rewind(&self, carve: &Carve) {
        assert_eq!(
            self.sp.get(),
            carve.end,
            "region on stack {} given back out of order",
            self.index
        );
        self.sp.set(carve.rewind_to);
    }
}

/// A region handed out by [`Stack::carve`].
#[derive(Debug)]
pub(crate) struct Carve {
    pub(crate) start: *mut u8,
    pub(crate) end: *mut u8,
    rewind_to: *mut u8,
}

/// A fixed table of [`Stack`]s that are locked and unlocked in LIFO order.
///
/// Stacks are only materialized (their address space reserved) the first time more of them are
/// locked at once than ever before. They are kept until the pool itself is dropped.
///
/// The pool is meant for a single execution context. Give every thread its own pool.
pub struct StackPool {
    stacks: Box<[OnceCell<Stack>]>,
    allocated: Cell<usize>,
    locked: Cell<usize>,
    stack_size: usize,
    commit: CommitStrategy,
}

// Nothing in the pool refers to the thread that created it and it can't be moved while a lease
// or container borrows it.
unsafe impl Send for StackPool {}

impl StackPool {
    /// Creates a pool with the default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a pool.
    pub fn builder() -> StackPoolBuilder {
        StackPoolBuilder::new()
    }

    pub(crate) fn with_config(stack_size: usize, max_stacks: usize, commit: CommitStrategy) -> Self {
        Self {
            stacks: (0..max_stacks).map(|_| OnceCell::new()).collect(),
            allocated: Cell::new(0),
            locked: Cell::new(0),
            stack_size,
            commit,
        }
    }

    /// Locks the next stack, materializing it first if it never was.
    ///
    /// Leases must be given back in exactly the reverse order they were taken out.
    pub fn acquire(&self) -> Result<StackLease<'_>, PoolError> {
        let slot = self.locked.get();
        let cell = match self.stacks.get(slot) {
            Some(cell) => cell,
            None => {
                tracing::warn!(max = self.stacks.len(), "stack pool exhausted");
                return Err(PoolError::Exhausted {
                    max: self.stacks.len(),
                });
            }
        };

        let stack = match cell.get() {
            Some(stack) => stack,
            None => {
                let stack = Stack::new(slot, self.stack_size, self.commit)?;
                self.allocated.set(slot + 1);
                tracing::debug!(slot, size = stack.size(), "materialized stack");
                cell.get_or_init(|| stack)
            }
        };

        self.locked.set(slot + 1);
        tracing::trace!(slot, "acquired stack");
        Ok(StackLease { pool: self, stack })
    }

    fn release(&self, slot: usize) {
        let locked = self.locked.get();
        assert_eq!(
            locked,
            slot + 1,
            "stack {} released out of order, {} stacks are locked",
            slot,
            locked
        );
        self.locked.set(slot);
        tracing::trace!(slot, "released stack");
    }

    /// Number of stacks that were ever materialized.
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    /// Number of stacks currently locked.
    pub fn locked(&self) -> usize {
        self.locked.get()
    }

    pub fn max_stacks(&self) -> usize {
        self.stacks.len()
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    /// Returns the stack in `slot` if it was materialized.
    pub fn stack(&self, slot: usize) -> Option<&Stack> {
        self.stacks.get(slot).and_then(OnceCell::get)
    }
}

impl Default for StackPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StackPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackPool")
            .field("allocated", &self.allocated.get())
            .field("locked", &self.locked.get())
            .field("max_stacks", &self.stacks.len())
            .field("stack_size", &self.stack_size)
            .field("commit", &self.commit)
            .finish()
    }
}

/// Exclusive hold on one stack of a [`StackPool`]. Dropping it releases the stack.
#[derive(Debug)]
pub struct StackLease<'p> {
    pool: &'p StackPool,
    stack: &'p Stack,
}

impl<'p> StackLease<'p> {
    /// Slot of the leased stack.
    pub fn slot(&self) -> usize {
        self.stack.index
    }

    /// The leased stack, borrowed for as long as the pool lives.
    pub fn stack(&self) -> &'p Stack {
        self.stack
    }

    /// Gives the stack back. Same as dropping the lease.
    ///
    /// # Panics
    ///
    /// Panics if a stack locked after this one is still locked.
    pub fn release(self) {}
}

impl Deref for StackLease<'_> {
    type Target = Stack;

    fn deref(&self) -> &Stack {
        self.stack
    }
}

impl Drop for StackLease<'_> {
    fn drop(&mut self) {
        self.pool.release(self.stack.index);
    }
}
