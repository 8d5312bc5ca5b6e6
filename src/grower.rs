//! Sources of fresh heap memory.
//!
//! The heap never returns memory, so a grower only has to hand out
//! consecutive ranges from the end of whatever it manages.

use std::ptr::{self, NonNull};

use libc::{c_void, intptr_t, sbrk};

use crate::{
  align::{WORD_SIZE, try_align},
  error::AllocError,
};

/// Extends the managed heap region.
///
/// # Safety
///
/// A range returned by [`Grower::grow`] must be word aligned, valid for reads
/// and writes of `size` bytes and never handed out again for as long as the
/// grower is alive.
pub unsafe trait Grower {
  /// Requests `size` more bytes. `None` means the request was refused.
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>>;
}

/// Grows the process data segment through `sbrk(2)`.
///
/// The program break is shared by the whole process, so only one heap should
/// be built on it and it must not be used from more than one thread.
#[derive(Debug, Default)]
pub struct BrkGrower {
  _private: (),
}

impl BrkGrower {
  pub const fn new() -> Self {
    Self { _private: () }
  }

  /// Current program break.
  pub fn program_break(&self) -> *mut u8 {
    unsafe { sbrk(0) as *mut u8 }
  }
}

unsafe impl Grower for BrkGrower {
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let current = self.program_break() as usize;
    let padding = current.wrapping_neg() & (WORD_SIZE - 1);
    let increment = intptr_t::try_from(size.checked_add(padding)?).ok()?;

    let address = unsafe { sbrk(increment) };

    if address == usize::MAX as *mut c_void {
      return None;
    }

    tracing::trace!(size, padding, ?address, "program break extended");

    NonNull::new(unsafe { (address as *mut u8).add(padding) })
  }
}

/// A fixed-capacity private heap reserved with an anonymous `mmap(2)`.
///
/// It keeps its own break inside the reservation and refuses requests past
/// the capacity. Dropping the grower unmaps the whole reservation, so the
/// heap built on it must go first.
#[derive(Debug)]
pub struct ArenaGrower {
  base: NonNull<u8>,
  capacity: usize,
  brk: usize,
}

impl ArenaGrower {
  pub fn new(capacity: usize) -> Result<Self, AllocError> {
    let address = unsafe {
      libc::mmap(
        ptr::null_mut(),
        capacity,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == libc::MAP_FAILED {
      return Err(AllocError::OutOfMemory);
    }

    let base = NonNull::new(address as *mut u8).ok_or(AllocError::OutOfMemory)?;

    Ok(Self {
      base,
      capacity,
      brk: 0,
    })
  }

  pub fn base(&self) -> *mut u8 {
    self.base.as_ptr()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.brk
  }
}

unsafe impl Grower for ArenaGrower {
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let size = try_align(size)?;

    if size > self.capacity - self.brk {
      return None;
    }

    let address = unsafe { self.base.add(self.brk) };
    self.brk += size;

    tracing::trace!(size, used = self.brk, capacity = self.capacity, "arena extended");

    Some(address)
  }
}

impl Drop for ArenaGrower {
  fn drop(&mut self) {
    unsafe { libc::munmap(self.base.as_ptr() as *mut c_void, self.capacity) };
  }
}
