use std::fmt;
use std::mem::{align_of, size_of};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use super::BasicVec;
use crate::pool::Carve;
use crate::{CapacityError, PoolError, Stack, StackPool};

/// A vector with a capacity fixed at creation that does NOT hold on to a stack, so it can share
/// a stack with others.
///
/// It locks a stack just long enough to carve `capacity` elements off its frontier. When it is
/// dropped the frontier moves back to where it was, which means vectors sharing a stack must be
/// dropped in reverse order of creation. Dropping out of order panics.
pub struct SharedVec<'p, T> {
    items: BasicVec<T>,
    capacity: usize,
    stack: &'p Stack,
    carve: Carve,
}

impl<'p, T: Copy> SharedVec<'p, T> {
    /// Creates an empty vector with room for exactly `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if the pool can't provide the space. Use [`SharedVec::try_with_capacity_in`] to
    /// handle that.
    pub fn with_capacity_in(pool: &'p StackPool, capacity: usize) -> Self {
        match Self::try_with_capacity_in(pool, capacity) {
            Ok(vec) => vec,
            Err(err) => panic!("unable to create vector: {}", err),
        }
    }

    /// Creates an empty vector with room for exactly `capacity` elements.
    pub fn try_with_capacity_in(pool: &'p StackPool, capacity: usize) -> Result<Self, PoolError> {
        let lease = pool.acquire()?;
        let bytes = capacity
            .checked_mul(size_of::<T>())
            .ok_or(PoolError::StackFull {
                requested: usize::MAX,
                available: lease.remaining(),
            })?;
        let carve = lease.carve(bytes, align_of::<T>())?;
        let stack = lease.stack();
        lease.release();

        let begin = unsafe { NonNull::new_unchecked(carve.start as *mut T) };
        Ok(Self {
            items: unsafe { BasicVec::new(begin) },
            capacity,
            stack,
            carve,
        })
    }

    /// Appends `value`.
    ///
    /// # Panics
    ///
    /// Panics if the vector is already at its capacity.
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.try_push(value).is_err() {
            panic!("capacity of {} elements exceeded", self.capacity);
        }
    }

    /// Appends `value`, or hands it back if the vector is full.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), CapacityError<T>> {
        if self.items.len() == self.capacity {
            return Err(CapacityError(value));
        }
        unsafe { self.items.push(value) };
        Ok(())
    }

    /// Appends every element of `values`.
    ///
    /// # Panics
    ///
    /// Panics if they don't all fit.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        assert!(
            values.len() <= self.capacity - self.items.len(),
            "capacity of {} elements exceeded",
            self.capacity
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// The stack this vector carved its memory from.
    pub fn stack(&self) -> &'p Stack {
        self.stack
    }
}

impl<T> Drop for SharedVec<'_, T> {
    fn drop(&mut self) {
        self.stack.rewind(&self.carve);
    }
}

impl<T> Deref for SharedVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.items.as_slice()
    }
}

impl<T> DerefMut for SharedVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.items.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
