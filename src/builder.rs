use addrspace::CommitStrategy;

use crate::pool::{DEFAULT_LARGE_STACK, DEFAULT_MAX_STACKS};
use crate::StackPool;

/// Builder for creating an instance of [`StackPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`StackPool::new()`] reserves 64 GB of address space per
/// stack and allows up to 1024 stacks.
///
/// # Examples
///
/// ```
/// use stackalloc::{CommitStrategy, StackPool};
///
/// let pool = StackPool::builder()
///     .stack_size(1 << 30)
///     .max_stacks(16)
///     .commit(CommitStrategy::on_fault())
///     .build();
/// assert_eq!(pool.max_stacks(), 16);
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct StackPoolBuilder {
    stack_size: usize,
    max_stacks: usize,
    commit: CommitStrategy,
}

impl StackPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            stack_size: DEFAULT_LARGE_STACK,
            max_stacks: DEFAULT_MAX_STACKS,
            commit: CommitStrategy::default(),
        }
    }

    /// Sets how many bytes of address space every stack reserves. Rounded up to whole pages.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Sets how many stacks may be locked at the same time.
    pub fn max_stacks(mut self, max: usize) -> Self {
        self.max_stacks = max;
        self
    }

    /// Sets how the stacks' address space gets backed by physical memory.
    pub fn commit(mut self, strategy: CommitStrategy) -> Self {
        self.commit = strategy;
        self
    }

    /// Builds the pool. No address space is reserved until the first stack is acquired.
    pub fn build(self) -> StackPool {
        StackPool::with_config(self.stack_size, self.max_stacks, self.commit)
    }
}
