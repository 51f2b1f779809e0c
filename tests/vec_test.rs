use stackalloc::*;

fn small_pool() -> StackPool {
    StackPool::builder()
        .stack_size(16 * 1024 * 1024)
        .max_stacks(8)
        .build()
}

fn push_access_pop<V>(v: &mut V, push: impl Fn(&mut V, i32), pop: impl Fn(&mut V) -> Option<i32>)
where
    V: std::ops::Deref<Target = [i32]>,
{
    for i in 0..500 {
        push(v, i);
    }
    assert_eq!(v.len(), 500);
    for i in 0..500 {
        assert_eq!(v[i as usize], i);
    }
    for i in (250..500).rev() {
        assert_eq!(pop(v), Some(i));
    }
    assert_eq!(v.len(), 250);
}

#[test]
fn growable_round_trips_values() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut v = GrowableVec::try_new_in(&pool)?;
    push_access_pop(&mut v, |v, i| v.push(i), |v| v.pop());
    assert_eq!(v.back(), Some(&249));
    v.clear();
    assert!(v.is_empty());
    assert_eq!(v.pop(), None);
    Ok(())
}

#[test]
fn shared_round_trips_values() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut v = SharedVec::try_with_capacity_in(&pool, 500)?;
    push_access_pop(&mut v, |v, i| v.push(i), |v| v.pop());
    assert_eq!(v.capacity(), 500);
    Ok(())
}

#[test]
fn interior_pointers_survive_growth() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut v = GrowableVec::try_new_in(&pool)?;
    v.push(1u64);
    let first: *const u64 = &v[0];
    v.extend(0..100_000u64);
    assert_eq!(&v[0] as *const u64, first);
    assert_eq!(unsafe { *first }, 1);
    Ok(())
}

#[test]
fn growable_reuses_the_same_slot() -> Result<(), PoolError> {
    let pool = small_pool();
    for _ in 0..100 {
        let mut v = GrowableVec::try_new_in(&pool)?;
        v.push(1u8);
        assert_eq!(v.stack_slot(), 0);
        assert_eq!(pool.locked(), 1);
    }
    assert_eq!(pool.locked(), 0);
    assert_eq!(pool.allocated(), 1);
    Ok(())
}

#[test]
fn nested_growables_use_consecutive_stacks() -> Result<(), PoolError> {
    let pool = small_pool();
    let outer: GrowableVec<u32> = GrowableVec::try_new_in(&pool)?;
    {
        let inner: GrowableVec<u32> = GrowableVec::try_new_in(&pool)?;
        assert_eq!((outer.stack_slot(), inner.stack_slot()), (0, 1));
    }
    let again: GrowableVec<u32> = GrowableVec::try_new_in(&pool)?;
    assert_eq!(again.stack_slot(), 1);
    assert_eq!(pool.allocated(), 2);
    Ok(())
}

#[test]
fn shared_vectors_on_one_stack_are_adjacent() -> Result<(), PoolError> {
    let pool = small_pool();
    let first: SharedVec<u64> = SharedVec::try_with_capacity_in(&pool, 10)?;
    let second: SharedVec<u64> = SharedVec::try_with_capacity_in(&pool, 3)?;
    assert!(std::ptr::eq(first.stack(), second.stack()));
    assert_eq!(first.as_ptr().wrapping_add(10), second.as_ptr());
    assert_eq!(second.stack().sp(), second.as_ptr().wrapping_add(3) as *mut u8);
    // The stack is not held by either of them.
    assert_eq!(pool.locked(), 0);
    Ok(())
}

#[test]
fn dropping_shared_vectors_rewinds_the_frontier() -> Result<(), PoolError> {
    let pool = small_pool();
    let start = pool.acquire()?.sp();
    {
        let _first: SharedVec<u16> = SharedVec::try_with_capacity_in(&pool, 7)?;
        let _second: SharedVec<u64> = SharedVec::try_with_capacity_in(&pool, 7)?;
    }
    assert_eq!(pool.stack(0).unwrap().sp(), start);
    Ok(())
}

#[test]
#[should_panic(expected = "out of order")]
fn dropping_shared_vectors_out_of_order_panics() {
    let pool = small_pool();
    let first: SharedVec<u8> = SharedVec::with_capacity_in(&pool, 4);
    let second: SharedVec<u8> = SharedVec::with_capacity_in(&pool, 4);
    drop(first);
    drop(second);
}

#[test]
fn shared_capacity_is_enforced() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut v = SharedVec::try_with_capacity_in(&pool, 2)?;
    assert_eq!(v.try_push('a'), Ok(()));
    assert_eq!(v.try_push('b'), Ok(()));
    assert!(v.is_full());
    assert_eq!(v.try_push('c'), Err(CapacityError('c')));
    assert_eq!(&v[..], &['a', 'b']);
    Ok(())
}

#[test]
#[should_panic(expected = "capacity of 1 elements exceeded")]
fn shared_push_past_capacity_panics() {
    let pool = small_pool();
    let mut v = SharedVec::with_capacity_in(&pool, 1);
    v.push(1);
    v.push(2);
}

#[test]
fn shared_larger_than_the_stack_is_a_resource_error() {
    let pool = small_pool();
    let result = SharedVec::<u64>::try_with_capacity_in(&pool, 16 * 1024 * 1024);
    assert!(matches!(result, Err(PoolError::StackFull { .. })));
    assert_eq!(pool.locked(), 0);
}

#[test]
fn growable_after_shared_starts_past_it() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut vm = SharedVec::try_with_capacity_in(&pool, 50)?;
    vm.extend_from_slice(&[7u32; 50]);
    let mut v1 = GrowableVec::try_new_in(&pool)?;
    v1.extend(0..1000u32);
    assert_eq!(v1.stack_slot(), 0);
    assert_eq!(v1.as_ptr(), vm.as_ptr().wrapping_add(50));
    assert!(vm.iter().all(|&x| x == 7));
    Ok(())
}

#[test]
fn fixed_copies_its_source() -> Result<(), PoolError> {
    let pool = small_pool();
    let source = b"hello, interior pointers";
    let text = FixedVec::from_slice_in(&pool, &source[..])?;
    assert_eq!(&text[..], &source[..]);
    assert_ne!(text.as_ptr(), source.as_ptr());
    assert_eq!(text.stack().sp(), text.as_ptr().wrapping_add(source.len()) as *mut u8);
    Ok(())
}

#[test]
fn fixed_on_a_caller_supplied_stack() -> Result<(), PoolError> {
    let pool = small_pool();
    let lease = pool.acquire()?;
    let before = lease.sp();
    {
        let mut a = FixedVec::from_slice_on(&lease, &[1i64, 2, 3][..])?;
        let b = FixedVec::from_slice_on(&lease, &[4i64, 5][..])?;
        a[0] = 10;
        assert_eq!(&a[..], &[10, 2, 3]);
        assert_eq!(b.as_ptr(), a.as_ptr().wrapping_add(3));
    }
    assert_eq!(lease.sp(), before);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MyObject {
    a: i32,
}

#[test]
fn pool_vec_reuses_freed_elements() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut objects = PoolVec::try_new_in(&pool)?;
    assert_eq!(pool.locked(), 2);

    let o1 = objects.alloc(MyObject { a: 1 });
    let o2 = objects.alloc(MyObject { a: 2 });
    let o3 = objects.alloc(MyObject { a: 3 });
    // Let's free one in the middle.
    objects.reuseable(o2);
    // Still legal to access, we've only signed it up for overwriting.
    assert_eq!(objects[o2].a, 2);
    assert_eq!(objects.free_len(), 1);

    let o4 = objects.alloc(MyObject { a: 4 });
    // Overwritten now.
    assert_eq!(o4, o2);
    assert_eq!(o4.as_ptr(), o2.as_ptr());
    assert_eq!(objects[o2].a, 4);
    assert_eq!(objects.free_len(), 0);
    assert_eq!(objects.len(), 3);

    assert_eq!(objects[o1].a, 1);
    objects[o3].a = 30;
    assert_eq!(objects.get(o3), &MyObject { a: 30 });
    Ok(())
}

#[test]
fn pool_vec_appends_when_nothing_is_free() -> Result<(), PoolError> {
    let pool = small_pool();
    let mut values = PoolVec::try_new_in(&pool)?;
    let a = values.alloc(1u32);
    let b = values.push(2u32);
    values.reuseable(a);
    values.reuseable(b);
    // Most recently freed comes back first.
    assert_eq!(values.alloc(3), b);
    assert_eq!(values.alloc(4), a);
    let c = values.alloc(5);
    assert_ne!(c, a);
    assert_ne!(c, b);
    assert_eq!(values.to_vec(), vec![4, 3, 5]);
    Ok(())
}

#[test]
#[should_panic(expected = "does not belong")]
fn pool_vec_rejects_foreign_slots() {
    let pool = small_pool();
    let mut first = PoolVec::new_in(&pool);
    let mut second = PoolVec::new_in(&pool);
    let slot = first.alloc(1u8);
    second.alloc(2u8);
    second.reuseable(slot);
}

#[test]
fn pool_vec_releases_both_stacks() -> Result<(), PoolError> {
    let pool = small_pool();
    {
        let mut values = PoolVec::try_new_in(&pool)?;
        values.alloc(1u8);
    }
    assert_eq!(pool.locked(), 0);
    Ok(())
}
