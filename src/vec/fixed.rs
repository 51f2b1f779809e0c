use std::fmt;
use std::mem::{align_of, size_of_val};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use super::BasicVec;
use crate::pool::Carve;
use crate::{PoolError, Stack, StackLease, StackPool};

/// A copy of a slice, fixed in length at creation. Useful for strings and such.
///
/// Like [`SharedVec`](crate::SharedVec) it does not hold on to its stack and moves the stack's
/// frontier back when dropped, so it has to be dropped before anything carved after it.
pub struct FixedVec<'p, T> {
    items: BasicVec<T>,
    stack: &'p Stack,
    carve: Carve,
}

impl<'p, T: Copy> FixedVec<'p, T> {
    /// Copies `src` to the frontier of the stack locked by `lease`.
    pub fn from_slice_on(lease: &StackLease<'p>, src: &[T]) -> Result<Self, PoolError> {
        let carve = lease.carve(size_of_val(src), align_of::<T>())?;
        let begin = unsafe { NonNull::new_unchecked(carve.start as *mut T) };
        let mut items = unsafe { BasicVec::new(begin) };
        unsafe { items.extend_from_slice(src) };
        Ok(Self {
            items,
            stack: lease.stack(),
            carve,
        })
    }

    /// Copies `src` to the next free stack of `pool`, locking it only while copying.
    pub fn from_slice_in(pool: &'p StackPool, src: &[T]) -> Result<Self, PoolError> {
        let lease = pool.acquire()?;
        Self::from_slice_on(&lease, src)
    }

    /// The stack this vector lives on.
    pub fn stack(&self) -> &'p Stack {
        self.stack
    }
}

impl<T> Drop for FixedVec<'_, T> {
    fn drop(&mut self) {
        self.stack.rewind(&self.carve);
    }
}

impl<T> Deref for FixedVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.items.as_slice()
    }
}

impl<T> DerefMut for FixedVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.items.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for FixedVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
