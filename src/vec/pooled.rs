use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::NonNull;

use super::GrowableVec;
use crate::{PoolError, StackPool};

/// Since elements of these vectors never move we can do more things with them, like handing out
/// elements and reusing them once they are no longer needed.
///
/// Freed elements are tracked in a second [`GrowableVec`], so a `PoolVec` locks two stacks for
/// its lifetime.
pub struct PoolVec<'p, T> {
    // Dropped before `items`, it locked its stack after `items` did.
    free_list: GrowableVec<'p, Slot<T>>,
    items: GrowableVec<'p, T>,
}

impl<'p, T: Copy> PoolVec<'p, T> {
    /// # Panics
    ///
    /// Panics if the pool can't hand out two stacks. Use [`PoolVec::try_new_in`] to handle that.
    pub fn new_in(pool: &'p StackPool) -> Self {
        match Self::try_new_in(pool) {
            Ok(vec) => vec,
            Err(err) => panic!("unable to create pool vector: {}", err),
        }
    }

    pub fn try_new_in(pool: &'p StackPool) -> Result<Self, PoolError> {
        let items = GrowableVec::try_new_in(pool)?;
        let free_list = GrowableVec::try_new_in(pool)?;
        Ok(Self { free_list, items })
    }

    /// Stores `value` in a reusable element if there is one, otherwise in a new one at the end.
    pub fn alloc(&mut self, value: T) -> Slot<T> {
        match self.free_list.pop() {
            Some(slot) => {
                unsafe { slot.0.as_ptr().write(value) };
                slot
            }
            None => self.push(value),
        }
    }

    /// Appends `value` as a new element, never reusing one. Cheaper than [`PoolVec::alloc`] when
    /// you know there is nothing to reuse, such as right at the start.
    pub fn push(&mut self, value: T) -> Slot<T> {
        let slot = Slot(self.items.end_ptr());
        self.items.push(value);
        slot
    }

    /// Signs `slot` up for reuse by a later [`PoolVec::alloc`].
    ///
    /// Different name from "free" to indicate what it really does: the element stays a readable,
    /// initialized value until an `alloc` overwrites it.
    ///
    /// # Panics
    ///
    /// Panics if `slot` does not belong to this vector.
    pub fn reuseable(&mut self, slot: Slot<T>) {
        assert!(self.owns(slot), "slot does not belong to this pool vector");
        self.free_list.push(slot);
    }

    /// # Panics
    ///
    /// Panics if `slot` does not belong to this vector.
    pub fn get(&self, slot: Slot<T>) -> &T {
        assert!(self.owns(slot), "slot does not belong to this pool vector");
        unsafe { &*slot.0.as_ptr() }
    }

    /// # Panics
    ///
    /// Panics if `slot` does not belong to this vector.
    pub fn get_mut(&mut self, slot: Slot<T>) -> &mut T {
        assert!(self.owns(slot), "slot does not belong to this pool vector");
        unsafe { &mut *slot.0.as_ptr() }
    }

    /// Returns true if `slot` points at one of this vector's elements.
    pub fn owns(&self, slot: Slot<T>) -> bool {
        let addr = slot.0.as_ptr();
        self.items.begin_ptr().as_ptr() <= addr && addr < self.items.end_ptr().as_ptr()
    }

    /// Number of elements waiting to be reused.
    pub fn free_len(&self) -> usize {
        self.free_list.len()
    }
}

impl<T: Copy> Index<Slot<T>> for PoolVec<'_, T> {
    type Output = T;

    fn index(&self, slot: Slot<T>) -> &T {
        self.get(slot)
    }
}

impl<T: Copy> IndexMut<Slot<T>> for PoolVec<'_, T> {
    fn index_mut(&mut self, slot: Slot<T>) -> &mut T {
        self.get_mut(slot)
    }
}

/// Every element ever stored, reusable ones included.
impl<T> Deref for PoolVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for PoolVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for PoolVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolVec")
            .field("items", &self.items)
            .field("free", &self.free_list.len())
            .finish()
    }
}

/// Stable reference to an element of a [`PoolVec`].
///
/// The element's address never changes, so two slots are equal exactly when they refer to the
/// same element.
pub struct Slot<T>(NonNull<T>);

impl<T> Slot<T> {
    /// Address of the element.
    pub fn as_ptr(self) -> *mut T {
        self.0.as_ptr()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slot<T> {}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Slot<T> {}

impl<T> Hash for Slot<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.0).finish()
    }
}
