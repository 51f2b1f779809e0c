//! Vectors living on the stacks of a [`StackPool`](crate::StackPool).
//!
//! All of them share [`BasicVec`] for the actual pushing and popping and differ in how they get
//! hold of their memory and what they do with it once they are dropped.

mod fixed;
mod growable;
mod pooled;
mod shared;

pub use fixed::FixedVec;
pub use growable::GrowableVec;
pub use pooled::{PoolVec, Slot};
pub use shared::SharedVec;

use std::fmt;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

/// A `(begin, end)` pair over memory somebody else owns.
///
/// Pushing just writes at `end` and bumps it; there is no allocation and no capacity check.
/// It is up to the owner of the memory to make sure every push has room.
pub struct BasicVec<T> {
    begin: NonNull<T>,
    end: NonNull<T>,
}

impl<T: Copy> BasicVec<T> {
    /// Creates an empty vector whose elements start at `begin`.
    ///
    /// # Safety
    ///
    /// `begin` must be aligned for `T` and the memory after it must be valid for reads and writes
    /// of every element that is pushed, and not be used by anything else while this vector is
    /// alive.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub unsafe fn new(begin: NonNull<T>) -> Self {
        assert_ne!(size_of::<T>(), 0, "zero-sized types are not supported");
        Self { begin, end: begin }
    }

    /// Appends `value` without checking for room.
    ///
    /// # Safety
    ///
    /// The memory of the next element must be valid for writes.
    #[inline]
    pub unsafe fn push(&mut self, value: T) {
        self.end.as_ptr().write(value);
        self.end = NonNull::new_unchecked(self.end.as_ptr().add(1));
    }

    /// Appends all of `values` without checking for room.
    ///
    /// # Safety
    ///
    /// The memory of the next `values.len()` elements must be valid for writes.
    pub unsafe fn extend_from_slice(&mut self, values: &[T]) {
        ptr::copy_nonoverlapping(values.as_ptr(), self.end.as_ptr(), values.len());
        self.end = NonNull::new_unchecked(self.end.as_ptr().add(values.len()));
    }

    /// Removes the last element and returns it.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        unsafe {
            self.end = NonNull::new_unchecked(self.end.as_ptr().sub(1));
            Some(self.end.as_ptr().read())
        }
    }

    /// Returns the last element.
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Shortens the vector to `len` elements. Does nothing if it is already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.end = unsafe { NonNull::new_unchecked(self.begin.as_ptr().add(len)) };
        }
    }

    pub fn clear(&mut self) {
        self.end = self.begin;
    }
}

impl<T> BasicVec<T> {
    /// Number of elements, derived from the distance between `begin` and `end`.
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { self.end.as_ptr().offset_from(self.begin.as_ptr()) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.begin.as_ptr(), self.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.begin.as_ptr(), self.len()) }
    }

    /// Pointer to the first element.
    pub fn begin(&self) -> NonNull<T> {
        self.begin
    }

    /// Pointer one past the last element, where the next push goes.
    pub fn end(&self) -> NonNull<T> {
        self.end
    }
}

impl<T> Deref for BasicVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for BasicVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for BasicVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
