use std::ptr::{self, NonNull};

use crate::{
  align::try_align,
  block::Block,
  error::AllocError,
  grower::{BrkGrower, Grower},
  heap::{Blocks, Heap},
  stats::HeapStats,
};

/// First-fit allocator over a single [`Heap`].
///
/// Every pointer it hands out points just past a [`Block`] header. Freed
/// blocks are marked free in place and merged with free neighbours, and later
/// requests reuse the first free block that is large enough.
pub struct Allocator<G: Grower = BrkGrower> {
  heap: Heap<G>,
}

impl Allocator<BrkGrower> {
  /// An allocator growing the process data segment.
  pub const fn new() -> Self {
    Self::with_grower(BrkGrower::new())
  }
}

impl Default for Allocator<BrkGrower> {
  fn default() -> Self {
    Self::new()
  }
}

impl<G: Grower> Allocator<G> {
  pub const fn with_grower(grower: G) -> Self {
    Self {
      heap: Heap::new(grower),
    }
  }

  pub fn heap(&self) -> &Heap<G> {
    &self.heap
  }

  pub fn grower(&self) -> &G {
    self.heap.grower()
  }

  /// Returns at least `size` usable bytes, word aligned.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidSize);
    }

    let size = try_align(size).ok_or(AllocError::OutOfMemory)?;

    let block = if self.heap.head().is_null() {
      self.heap.grow(size)
    } else {
      let free_block = self.heap.search(size);

      if free_block.is_null() {
        self.heap.grow(size)
      } else {
        unsafe {
          (*free_block).is_free = false;
          self.heap.split(free_block, size);
        }
        free_block
      }
    };

    if block.is_null() {
      return Err(AllocError::OutOfMemory);
    }

    let address = NonNull::new(unsafe { Block::data(block) }).ok_or(AllocError::OutOfMemory)?;

    tracing::debug!(size, ?address, "allocated");

    Ok(address)
  }

  /// Marks the block behind `address` free and merges it with free
  /// neighbours. A null `address` is ignored.
  ///
  /// # Safety
  ///
  /// `address` must be null or a live pointer returned by this allocator.
  pub unsafe fn release(
    &mut self,
    address: *mut u8,
  ) {
    if address.is_null() {
      return;
    }

    unsafe {
      let block = Block::from_data(address);
      (*block).is_free = true;

      tracing::debug!(?address, size = (*block).size, "released");

      self.heap.merge_forward(block);
      self.heap.merge_backward(block);
    }
  }

  /// Resizes the allocation behind `address`.
  ///
  /// - a null `address` behaves like [`allocate`](Self::allocate);
  /// - `new_size == 0` releases `address` and returns `Ok(None)`;
  /// - if the block already holds `new_size` bytes, `address` comes back
  ///   unchanged. Shrinking never gives capacity back.
  ///
  /// Otherwise the contents move to a new block and the old one is released.
  /// When that new block cannot be obtained the error is returned and
  /// `address` stays valid and untouched.
  ///
  /// # Safety
  ///
  /// `address` must be null or a live pointer returned by this allocator.
  pub unsafe fn reallocate(
    &mut self,
    address: *mut u8,
    new_size: usize,
  ) -> Result<Option<NonNull<u8>>, AllocError> {
    if address.is_null() {
      return self.allocate(new_size).map(Some);
    }

    if new_size == 0 {
      unsafe { self.release(address) };
      return Ok(None);
    }

    unsafe {
      let old_size = (*Block::from_data(address)).size;

      if old_size >= new_size {
        return Ok(NonNull::new(address));
      }

      let new_address = self.allocate(new_size)?;

      ptr::copy_nonoverlapping(address, new_address.as_ptr(), old_size);
      self.release(address);

      Ok(Some(new_address))
    }
  }

  /// Allocates room for `count` elements of `elem_size` bytes, all zero.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    elem_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = count.checked_mul(elem_size).ok_or(AllocError::Overflow)?;

    let address = self.allocate(total)?;

    unsafe {
      let usable = self.usable_size(address.as_ptr());
      ptr::write_bytes(address.as_ptr(), 0, usable);
    }

    Ok(address)
  }

  /// Usable bytes of the allocation behind `address`, at least what was asked
  /// for.
  ///
  /// # Safety
  ///
  /// `address` must be a live pointer returned by this allocator.
  pub unsafe fn usable_size(
    &self,
    address: *mut u8,
  ) -> usize {
    unsafe { (*Block::from_data(address)).size }
  }

  pub fn blocks(&self) -> Blocks<'_> {
    self.heap.blocks()
  }

  pub fn stats(&self) -> HeapStats {
    HeapStats::collect(self.heap.blocks())
  }
}
