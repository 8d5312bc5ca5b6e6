use std::{marker::PhantomData, ptr};

use crate::{
  align::try_align,
  block::{Block, HEADER_SIZE},
  grower::Grower,
};

/// The chain of block headers covering everything a [`Grower`] handed out.
///
/// ```text
///   head
///    │
///    ▼
///   ┌──────┬────────┐   ┌──────┬──────┐   ┌──────┬────────────┐
///   │ used │ data   │──►│ free │ data │──►│ used │ data       │──► null
///   └──────┴────────┘   └──────┴──────┘   └──────┴────────────┘
///   low address                                     high address
/// ```
///
/// Blocks are kept in ascending address order: growth appends at the end and
/// a split inserts the remainder right after its source. `merge_backward`
/// relies on that order.
pub struct Heap<G: Grower> {
  head: *mut Block,
  grower: G,
}

impl<G: Grower> Heap<G> {
  pub const fn new(grower: G) -> Self {
    Self {
      head: ptr::null_mut(),
      grower,
    }
  }

  /// First block of the chain, null until the first growth.
  pub fn head(&self) -> *mut Block {
    self.head
  }

  pub fn grower(&self) -> &G {
    &self.grower
  }

  /// Asks the grower for a new occupied block with `size` usable bytes and
  /// appends it as the tail of the chain. Returns null if the grower refuses.
  ///
  /// `size` is rounded up to a whole number of words.
  pub fn grow(
    &mut self,
    size: usize,
  ) -> *mut Block {
    let Some(size) = try_align(size) else {
      return ptr::null_mut();
    };
    let Some(total) = size.checked_add(HEADER_SIZE) else {
      return ptr::null_mut();
    };

    let Some(address) = self.grower.grow(total) else {
      return ptr::null_mut();
    };

    unsafe {
      let block = Block::write(address.as_ptr(), Block::new(size, false, ptr::null_mut()));

      if self.head.is_null() {
        self.head = block;
      } else {
        let mut tail = self.head;
        while !(*tail).next.is_null() {
          tail = (*tail).next;
        }
        (*tail).next = block;
      }

      tracing::trace!(size, ?block, "heap grown");

      block
    }
  }

  /// First-fit: the first free block in chain order with at least `size`
  /// usable bytes, or null.
  pub fn search(
    &self,
    size: usize,
  ) -> *mut Block {
    unsafe {
      let mut current: *mut Block = self.head;

      while !current.is_null() {
        if (*current).is_free && (*current).size >= size {
          return current;
        }
        current = (*current).next;
      }

      ptr::null_mut()
    }
  }

  /// Shrinks `block` to `size` bytes and turns the rest of its data region
  /// into a free block inserted right after it.
  ///
  /// Nothing happens unless the remainder can hold a header plus at least
  /// one usable word.
  ///
  /// # Safety
  ///
  /// `block` must be a live block of this heap and `size` word aligned.
  pub unsafe fn split(
    &mut self,
    block: *mut Block,
    size: usize,
  ) {
    unsafe {
      if (*block).size <= size + HEADER_SIZE {
        return;
      }

      let remainder = (*block).size - size - HEADER_SIZE;
      let rest = Block::write(
        Block::data(block).add(size),
        Block::new(remainder, true, (*block).next),
      );

      (*block).size = size;
      (*block).next = rest;

      tracing::trace!(?block, size, remainder, "block split");
    }
  }

  /// Absorbs every free successor of `block` until an occupied block or the
  /// end of the chain.
  ///
  /// # Safety
  ///
  /// `block` must be a live block of this heap.
  pub unsafe fn merge_forward(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      while !(*block).next.is_null() && (*(*block).next).is_free && adjacent(block, (*block).next) {
        absorb_next(block);
      }
    }
  }

  /// Folds the free `block` into its predecessor if that one is free too.
  ///
  /// One step is enough when `merge_forward` already ran on `block`: a free
  /// predecessor cannot itself have a free predecessor, since releases keep
  /// every run of free blocks merged.
  ///
  /// # Safety
  ///
  /// `block` must be a live block of this heap.
  pub unsafe fn merge_backward(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      if !(*block).is_free {
        return;
      }

      let mut current = self.head;
      while !current.is_null() {
        if (*current).next == block {
          if (*current).is_free && adjacent(current, block) {
            absorb_next(current);
          }
          return;
        }
        current = (*current).next;
      }
    }
  }

  /// Read-only walk over the chain in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      current: self.head,
      _heap: PhantomData,
    }
  }

  /// Checks the structural invariants of the chain: ascending, word aligned,
  /// non-overlapping blocks and no two physically adjacent free blocks.
  pub fn is_consistent(&self) -> bool {
    let mut previous: Option<BlockInfo> = None;

    for info in self.blocks() {
      if !crate::align::is_aligned(info.addr as usize) || !crate::align::is_aligned(info.size) {
        return false;
      }

      if let Some(prev) = previous {
        let prev_end = prev.addr as usize + prev.size;
        let header = info.addr as usize - HEADER_SIZE;

        if header < prev_end {
          return false;
        }
        if header == prev_end && prev.is_free && info.is_free {
          return false;
        }
      }

      previous = Some(info);
    }

    true
  }
}

/// Whether `next` starts exactly where `block`'s data region ends.
///
/// Always true for growers that own their memory. The program break may be
/// moved by someone else between two growths, and such a gap is not ours.
unsafe fn adjacent(
  block: *mut Block,
  next: *mut Block,
) -> bool {
  unsafe { Block::end(block) == next as *mut u8 }
}

unsafe fn absorb_next(block: *mut Block) {
  unsafe {
    let next = (*block).next;
    (*block).size += HEADER_SIZE + (*next).size;
    (*block).next = (*next).next;

    tracing::trace!(?block, absorbed = ?next, size = (*block).size, "blocks merged");
  }
}

/// Snapshot of a single block as seen by [`Heap::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Start of the data region.
  pub addr: *const u8,
  pub size: usize,
  pub is_free: bool,
}

pub struct Blocks<'a> {
  current: *mut Block,
  _heap: PhantomData<&'a ()>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    unsafe {
      let block = self.current;
      self.current = (*block).next;

      Some(BlockInfo {
        addr: Block::data(block),
        size: (*block).size,
        is_free: (*block).is_free,
      })
    }
  }
}
