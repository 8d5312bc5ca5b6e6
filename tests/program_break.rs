//! The program break is shared by the whole process, so everything that
//! moves it lives in this single test and runs in its own test binary.

use rmalloc::{Allocator, BrkGrower, Grower, align::WORD_SIZE};

#[test]
fn test_program_break_heap() {
  let mut brk = BrkGrower::new();

  let region = brk.grow(3).unwrap().as_ptr();
  assert_eq!(region as usize % WORD_SIZE, 0);
  assert!(brk.program_break() >= unsafe { region.add(3) });

  let mut allocator = Allocator::new();

  unsafe {
    let first_addr = allocator.allocate(8).unwrap().as_ptr() as *mut u64;
    assert_eq!(first_addr as usize % WORD_SIZE, 0);
    *first_addr = 3u64;

    let second_addr = allocator.allocate(12).unwrap().as_ptr() as *mut u16;
    for i in 0..6 {
      *(second_addr.add(i)) = (i + 1) as u16;
    }

    assert_eq!(*first_addr, 3);

    allocator.release(first_addr as *mut u8);

    let third_addr = allocator.allocate(4).unwrap().as_ptr() as *mut u32;
    assert_eq!(first_addr as *mut u32, third_addr);

    for i in 0..6 {
      assert_eq!((i + 1) as u16, *(second_addr.add(i)));
    }

    allocator.release(third_addr as *mut u8);
    allocator.release(second_addr as *mut u8);
  }

  assert!(allocator.heap().is_consistent());
  assert_eq!(allocator.stats().used_bytes, 0);
}
