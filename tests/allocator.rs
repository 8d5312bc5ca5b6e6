use std::{ptr::NonNull, slice};

use proptest::prelude::*;
use rmalloc::{AllocError, Allocator, ArenaGrower, HEADER_SIZE};

const ARENA: usize = 1 << 20;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  ZeroAllocate(usize, usize),
  Reallocate(usize, usize),
  Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (1usize..512).prop_map(Op::Allocate),
    1 => (1usize..32, 1usize..16).prop_map(|(count, size)| Op::ZeroAllocate(count, size)),
    2 => (any::<usize>(), 1usize..768).prop_map(|(index, size)| Op::Reallocate(index, size)),
    3 => any::<usize>().prop_map(Op::Release),
  ]
}

struct Live {
  address: NonNull<u8>,
  len: usize,
  fill: u8,
}

unsafe fn bytes<'a>(live: &Live) -> &'a [u8] {
  unsafe { slice::from_raw_parts(live.address.as_ptr(), live.len) }
}

unsafe fn fill(live: &Live) {
  unsafe { live.address.as_ptr().write_bytes(live.fill, live.len) };
}

proptest! {
  #[test]
  fn allocations_never_overlap(ops in prop::collection::vec(op(), 1..64)) {
    let mut allocator = Allocator::with_grower(ArenaGrower::new(ARENA).unwrap());
    let mut live: Vec<Live> = Vec::new();
    let mut next_fill: u8 = 1;

    for op in ops {
      match op {
        Op::Allocate(size) => {
          let address = allocator.allocate(size).unwrap();
          let entry = Live { address, len: size, fill: next_fill };
          unsafe { fill(&entry) };
          live.push(entry);
        }
        Op::ZeroAllocate(count, size) => {
          let address = allocator.zero_allocate(count, size).unwrap();
          let entry = Live { address, len: count * size, fill: next_fill };
          let zeroed = unsafe { bytes(&entry) }.iter().all(|&byte| byte == 0);
          prop_assert!(zeroed);
          unsafe { fill(&entry) };
          live.push(entry);
        }
        Op::Reallocate(index, size) if !live.is_empty() => {
          let index = index % live.len();
          let old = &live[index];
          let kept = old.len.min(size);
          let address = unsafe { allocator.reallocate(old.address.as_ptr(), size) }
            .unwrap()
            .unwrap();
          let entry = Live { address, len: size, fill: old.fill };
          let prefix_kept = unsafe { bytes(&entry) }[..kept].iter().all(|&byte| byte == entry.fill);
          prop_assert!(prefix_kept);
          unsafe { fill(&entry) };
          live[index] = entry;
        }
        Op::Release(index) if !live.is_empty() => {
          let entry = live.swap_remove(index % live.len());
          unsafe { allocator.release(entry.address.as_ptr()) };
        }
        Op::Reallocate(..) | Op::Release(_) => {}
      }

      next_fill = next_fill.wrapping_add(1).max(1);

      for entry in &live {
        let intact = unsafe { bytes(entry) }.iter().all(|&byte| byte == entry.fill);
        prop_assert!(intact);
      }
      prop_assert!(allocator.heap().is_consistent());
    }

    for entry in live.drain(..) {
      unsafe { allocator.release(entry.address.as_ptr()) };
    }

    let stats = allocator.stats();
    prop_assert!(stats.blocks <= 1);
    prop_assert_eq!(stats.free_blocks, stats.blocks);
    prop_assert_eq!(stats.total_bytes + stats.overhead_bytes(), allocator.grower().used());
  }

  #[test]
  fn freed_space_is_reused_first_fit(size in 1usize..256, smaller in 1usize..256) {
    let mut allocator = Allocator::with_grower(ArenaGrower::new(ARENA).unwrap());
    let smaller = smaller.min(size);

    let first = allocator.allocate(size).unwrap();
    let _guard = allocator.allocate(8).unwrap();

    unsafe { allocator.release(first.as_ptr()) };

    prop_assert_eq!(allocator.allocate(smaller).unwrap(), first);
  }
}

#[test]
fn test_coalescing_after_out_of_order_release() {
  let mut allocator = Allocator::with_grower(ArenaGrower::new(ARENA).unwrap());

  let a = allocator.allocate(40).unwrap();
  let b = allocator.allocate(40).unwrap();
  let c = allocator.allocate(40).unwrap();

  unsafe {
    allocator.release(b.as_ptr());
    allocator.release(c.as_ptr());
    allocator.release(a.as_ptr());
  }

  let blocks: Vec<_> = allocator.blocks().collect();
  assert_eq!(blocks.len(), 1);
  assert!(blocks[0].is_free);
  assert_eq!(blocks[0].addr, a.as_ptr() as *const u8);
  assert_eq!(blocks[0].size, 3 * 40 + 2 * HEADER_SIZE);
}

#[test]
fn test_merged_block_serves_larger_request_without_growth() {
  let mut allocator = Allocator::with_grower(ArenaGrower::new(ARENA).unwrap());

  let a = allocator.allocate(64).unwrap();
  let b = allocator.allocate(64).unwrap();
  let _c = allocator.allocate(64).unwrap();

  unsafe {
    allocator.release(a.as_ptr());
    allocator.release(b.as_ptr());
  }

  let used = allocator.grower().used();
  let big = allocator.allocate(128).unwrap();

  assert_eq!(big, a);
  assert_eq!(allocator.grower().used(), used);
}

#[test]
fn test_reallocate_integer_slots() {
  let mut allocator = Allocator::with_grower(ArenaGrower::new(ARENA).unwrap());

  unsafe {
    let slots = allocator.allocate(2 * size_of::<i32>()).unwrap().as_ptr() as *mut i32;
    slots.write(1);
    slots.add(1).write(2);

    let grown = allocator
      .reallocate(slots as *mut u8, 4 * size_of::<i32>())
      .unwrap()
      .unwrap()
      .as_ptr() as *mut i32;

    assert_eq!(grown.read(), 1);
    assert_eq!(grown.add(1).read(), 2);
  }
}

#[test]
fn test_failed_growth_reports_out_of_memory() {
  let mut allocator = Allocator::with_grower(ArenaGrower::new(256).unwrap());

  let kept = allocator.allocate(16).unwrap();
  unsafe { kept.as_ptr().write_bytes(0x5A, 16) };

  assert_eq!(allocator.allocate(4096), Err(AllocError::OutOfMemory));
  assert_eq!(
    unsafe { allocator.reallocate(kept.as_ptr(), 4096) },
    Err(AllocError::OutOfMemory)
  );
  assert_eq!(allocator.zero_allocate(512, 8), Err(AllocError::OutOfMemory));

  let bytes = unsafe { slice::from_raw_parts(kept.as_ptr(), 16) };
  assert!(bytes.iter().all(|&byte| byte == 0x5A));
  assert_eq!(allocator.stats().blocks, 1);
}

#[test]
fn test_error_messages() {
  assert_eq!(AllocError::InvalidSize.to_string(), "Invalid allocation size");
  assert_eq!(AllocError::OutOfMemory.to_string(), "Out of memory");
  assert_eq!(AllocError::Overflow.to_string(), "Allocation size overflow");
}
