use stackalloc::addrspace::ReserveError;
use stackalloc::*;

fn small_pool(max_stacks: usize) -> StackPool {
    StackPool::builder()
        .stack_size(16 * 1024 * 1024)
        .max_stacks(max_stacks)
        .build()
}

#[test]
fn default_pool_reserves_64gb_stacks() -> Result<(), PoolError> {
    let pool = StackPool::new();
    assert_eq!(pool.max_stacks(), DEFAULT_MAX_STACKS);
    assert_eq!(pool.allocated(), 0);
    let lease = pool.acquire()?;
    assert_eq!(lease.size(), DEFAULT_LARGE_STACK);
    assert_eq!(lease.sp(), lease.memory());
    Ok(())
}

#[test]
fn acquire_release_is_balanced_and_lifo() -> Result<(), PoolError> {
    let pool = small_pool(8);
    let before = pool.locked();

    let first_round = {
        let a = pool.acquire()?;
        let b = pool.acquire()?;
        let c = pool.acquire()?;
        let memory = vec![a.memory(), b.memory(), c.memory()];
        assert_eq!((a.slot(), b.slot(), c.slot()), (0, 1, 2));
        assert_eq!(pool.locked(), 3);
        c.release();
        b.release();
        a.release();
        memory
    };
    assert_eq!(pool.locked(), before);
    assert_eq!(pool.allocated(), 3);

    let a = pool.acquire()?;
    let b = pool.acquire()?;
    let c = pool.acquire()?;
    assert_eq!(vec![a.memory(), b.memory(), c.memory()], first_round);
    // Nothing new had to be reserved.
    assert_eq!(pool.allocated(), 3);
    Ok(())
}

#[test]
fn one_more_than_max_is_exhaustion() -> Result<(), PoolError> {
    let pool = small_pool(3);
    let _a = pool.acquire()?;
    let _b = pool.acquire()?;
    let _c = pool.acquire()?;
    for _ in 0..3 {
        // Same answer every time, and nothing got locked on the way.
        assert!(matches!(pool.acquire(), Err(PoolError::Exhausted { max: 3 })));
        assert_eq!(pool.locked(), 3);
    }
    Ok(())
}

#[test]
fn empty_pool_is_always_exhausted() {
    let pool = small_pool(0);
    assert!(matches!(pool.acquire(), Err(PoolError::Exhausted { max: 0 })));
}

#[test]
fn failed_reservation_is_reported() {
    let pool = StackPool::builder().stack_size(0).max_stacks(1).build();
    assert!(matches!(
        pool.acquire(),
        Err(PoolError::Reserve(ReserveError::ZeroSize))
    ));
    assert_eq!(pool.allocated(), 0);
    assert_eq!(pool.locked(), 0);
}

#[test]
#[should_panic(expected = "released out of order")]
fn out_of_order_release_panics() {
    let pool = small_pool(2);
    let a = pool.acquire().unwrap();
    let _b = pool.acquire().unwrap();
    a.release();
}

#[test]
fn independent_pools_do_not_share_stacks() -> Result<(), PoolError> {
    let first = small_pool(1);
    let second = small_pool(1);
    let a = first.acquire()?;
    let b = second.acquire()?;
    assert_eq!((a.slot(), b.slot()), (0, 0));
    assert_ne!(a.memory(), b.memory());
    Ok(())
}

#[test]
fn pool_with_fault_committed_stacks() -> Result<(), PoolError> {
    let pool = StackPool::builder()
        .stack_size(1 << 32)
        .max_stacks(2)
        .commit(CommitStrategy::OnFault {
            trap: TrapMode::AnyAccess,
            batch_pages: 8,
        })
        .build();
    let mut v = GrowableVec::try_new_in(&pool)?;
    // Spans many commit batches; every one of them is committed by the fault handler.
    v.extend(0..1_000_000u32);
    assert_eq!(v.len(), 1_000_000);
    assert_eq!(v[999_999], 999_999);

    let lease = pool.acquire()?;
    unsafe {
        // Far away from anything touched so far.
        *lease.memory().add((1 << 32) - 1) = 3;
        assert_eq!(*lease.memory().add((1 << 32) - 1), 3);
    }
    Ok(())
}
