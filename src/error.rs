use std::fmt;

use addrspace::ReserveError;
use thiserror::Error;

/// Resource errors from the stack pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// More stacks are locked at once than the pool may ever materialize. This almost always
    /// means acquires and releases are not nested.
    #[error("all {max} stacks of the pool are locked")]
    Exhausted { max: usize },
    /// The OS refused to reserve address space for a new stack.
    #[error(transparent)]
    Reserve(#[from] ReserveError),
    /// Carving a fixed region would run past the end of the stack.
    #[error("stack has {available} bytes left, {requested} were requested")]
    StackFull { requested: usize, available: usize },
}

/// Returned by [`SharedVec::try_push`](crate::SharedVec::try_push) when the vector is at its
/// declared capacity. Carries back the rejected element.
///
/// This is a contract violation by the caller, not a shortage of memory.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("vector is at its declared capacity")]
pub struct CapacityError<T>(pub T);

impl<T> fmt::Debug for CapacityError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapacityError").finish()
    }
}
