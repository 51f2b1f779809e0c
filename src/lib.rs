//! Stackalloc implements functionality similar to what you'd normally get from `Vec`, except that:
//! 1. Memory never moves, so pointers to elements stay valid (interior pointers).
//! 2. Creating a vector is super cheap (a pointer bump).
//! 3. Growing it is super cheap too (a pointer bump, no reallocation, no copy).
//!
//! This works by giving every vector a huge slice of address space up front. A
//! [`StackPool`] owns a table of [stacks](Stack), each one a 64 GB reservation that only gets
//! backed by physical memory where it is actually touched (see [`addrspace`]). Stacks are locked
//! and released in strict LIFO order.
//!
//! The vectors differ in how they use a stack:
//! * [`GrowableVec`] locks a stack for its lifetime and may grow to fill it. Most users want to
//!   be using this one by default.
//! * [`SharedVec`] has a fixed capacity and only borrows that much from a stack's frontier, so
//!   it can share the stack with others.
//! * [`FixedVec`] is a fixed length copy of a slice, also borrowing.
//! * [`PoolVec`] is a growable vector whose elements can be signed up for reuse.
//!
//! Only `Copy` elements are supported.
//!
//! ## Example
//! ```
//! use stackalloc::*;
//!
//! fn main() {
//!     let pool = StackPool::new();
//!
//!     // Uses the first stack, but does not lock it.
//!     let mut vm = SharedVec::with_capacity_in(&pool, 5);
//!     vm.extend_from_slice(&[1, 2, 3, 4, 5]);
//!
//!     // Uses the first stack also, right after `vm`, and locks it for its lifetime.
//!     let mut v1 = GrowableVec::new_in(&pool);
//!     v1.extend(0..500);
//!     {
//!         // Uses a second stack since the first one is locked.
//!         let mut v2 = GrowableVec::new_in(&pool);
//!         v2.push(1);
//!         assert_eq!(v2.stack_slot(), 1);
//!     }
//!     // Reuses the second stack, it is unlocked by now.
//!     let v3: GrowableVec<u8> = GrowableVec::new_in(&pool);
//!     assert_eq!(v3.stack_slot(), 1);
//!     assert_eq!(pool.allocated(), 2);
//!
//!     assert_eq!(vm.iter().sum::<i32>(), 15);
//!     assert_eq!(v1[499], 499);
//! }
//! ```

mod builder;
mod error;
pub mod pool;
pub mod vec;

pub use addrspace::{self, CommitStrategy, TrapMode};
pub use builder::StackPoolBuilder;
pub use error::{CapacityError, PoolError};
pub use pool::{Stack, StackLease, StackPool, DEFAULT_LARGE_STACK, DEFAULT_MAX_STACKS};
pub use vec::{BasicVec, FixedVec, GrowableVec, PoolVec, SharedVec, Slot};
