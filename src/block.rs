use std::{mem, ptr};

use crate::align::is_aligned;

/// Header stored immediately before every chunk of heap memory.
///
/// ```text
///   ┌───────────────────────┬────────────────────────────────┐
///   │    Block Header       │         Data Region            │
///   │  size | is_free | next│        `size` bytes            │
///   └───────────────────────┴────────────────────────────────┘
///   ▲                       ▲
///   block                   Block::data(block)
/// ```
#[repr(C)]
#[derive(Debug)]
pub struct Block {
  /// Usable bytes of the data region, header excluded.
  pub size: usize,
  pub is_free: bool,
  pub next: *mut Block,
}

/// Bytes occupied by a [`Block`] header.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(is_aligned(HEADER_SIZE));

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: *mut Block,
  ) -> Self {
    Self { size, is_free, next }
  }

  /// Writes `header` at `at` and returns it as a block pointer.
  ///
  /// # Safety
  ///
  /// `at` must be word aligned and valid for writes of [`HEADER_SIZE`] bytes.
  pub unsafe fn write(
    at: *mut u8,
    header: Block,
  ) -> *mut Block {
    let block = at as *mut Block;
    unsafe { ptr::write(block, header) };
    block
  }

  /// Start of the data region handed out to callers.
  ///
  /// # Safety
  ///
  /// `block` must point to a live header.
  pub unsafe fn data(block: *mut Block) -> *mut u8 {
    unsafe { (block as *mut u8).add(HEADER_SIZE) }
  }

  /// Recovers the header from a data pointer by the fixed header offset.
  ///
  /// # Safety
  ///
  /// `data` must have been produced by [`Block::data`].
  pub unsafe fn from_data(data: *mut u8) -> *mut Block {
    unsafe { data.sub(HEADER_SIZE) as *mut Block }
  }

  /// First byte past the block's data region.
  ///
  /// # Safety
  ///
  /// `block` must point to a live header.
  pub unsafe fn end(block: *mut Block) -> *mut u8 {
    unsafe { Block::data(block).add((*block).size) }
  }
}
