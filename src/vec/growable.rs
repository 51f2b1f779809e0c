use std::fmt;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use super::BasicVec;
use crate::{PoolError, StackLease, StackPool};

/// A vector that locks a whole stack for its lifetime and grows into it by bumping a pointer.
///
/// Use this one when the maximum size is not known up front, or varies a lot. Elements never
/// move, so pointers to them stay valid until the vector is dropped.
///
/// The stack's frontier is left alone: the vector's elements live above it and the next owner
/// of the stack simply overwrites them.
pub struct GrowableVec<'p, T> {
    items: BasicVec<T>,
    lease: StackLease<'p>,
}

impl<'p, T: Copy> GrowableVec<'p, T> {
    /// Creates an empty vector on the next free stack of `pool`.
    ///
    /// # Panics
    ///
    /// Panics if the pool can't hand out a stack. Use [`GrowableVec::try_new_in`] to handle that.
    pub fn new_in(pool: &'p StackPool) -> Self {
        match Self::try_new_in(pool) {
            Ok(vec) => vec,
            Err(err) => panic!("unable to create vector: {}", err),
        }
    }

    /// Creates an empty vector on the next free stack of `pool`.
    pub fn try_new_in(pool: &'p StackPool) -> Result<Self, PoolError> {
        let lease = pool.acquire()?;
        let items = unsafe { BasicVec::new(lease.aligned_sp::<T>()) };
        Ok(Self { items, lease })
    }

    /// Appends `value`.
    ///
    /// # Panics
    ///
    /// Panics if the stack's whole address space is used up.
    #[inline]
    pub fn push(&mut self, value: T) {
        assert!(self.remaining_capacity() > 0, "stack {} is full", self.lease.slot());
        unsafe { self.items.push(value) }
    }

    /// Appends `value` without making sure it still fits on the stack.
    ///
    /// # Safety
    ///
    /// [`GrowableVec::remaining_capacity`] must be at least one.
    #[inline]
    pub unsafe fn push_unchecked(&mut self, value: T) {
        debug_assert!(self.remaining_capacity() > 0);
        self.items.push(value)
    }

    /// Appends every element of `values`.
    ///
    /// # Panics
    ///
    /// Panics if they don't fit on the stack anymore.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        assert!(
            values.len() <= self.remaining_capacity(),
            "stack {} is full",
            self.lease.slot()
        );
        unsafe { self.items.extend_from_slice(values) }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len)
    }

    pub fn clear(&mut self) {
        self.items.clear()
    }

    /// How many more elements fit on the stack.
    pub fn remaining_capacity(&self) -> usize {
        let end = self.lease.end() as usize;
        end.saturating_sub(self.items.end().as_ptr() as usize) / size_of::<T>()
    }

    /// Slot of the stack this vector has locked.
    pub fn stack_slot(&self) -> usize {
        self.lease.slot()
    }

    /// Where the next element goes.
    pub(crate) fn end_ptr(&self) -> NonNull<T> {
        self.items.end()
    }

    pub(crate) fn begin_ptr(&self) -> NonNull<T> {
        self.items.begin()
    }
}

impl<T> Deref for GrowableVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.items.as_slice()
    }
}

impl<T> DerefMut for GrowableVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.items.as_mut_slice()
    }
}

impl<T: Copy> Extend<T> for GrowableVec<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
