//! # rmalloc - A First-Fit Memory Allocator Library
//!
//! This crate provides a **first-fit free-list allocator** that manages a heap
//! grown on demand, either from the process data segment through `sbrk` or
//! from a private `mmap` reservation.
//!
//! ## Overview
//!
//! Every chunk of the heap starts with a header, and the headers form a
//! singly linked chain in address order:
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌───┬─────┬───┬─────────┬───┬─────┬───┬───────────┐                │
//!   │   │ H │ A1  │ H │  free   │ H │ A3  │ H │   free    │                │
//!   │   └───┴─────┴───┴─────────┴───┴─────┴───┴───────────┘                │
//!   │     │        ▲ │           ▲ │       ▲                    ▲          │
//!   │     └────────┘ └───────────┘ └───────┘                    │          │
//!   │       next        next         next                    Program      │
//!   │                                                         Break        │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **allocate** scans the chain for the first free block that is large
//!   enough, splits off whatever it does not need, and grows the heap when no
//!   block fits.
//! - **release** marks a block free and merges it with free neighbours on
//!   both sides.
//! - **reallocate** keeps the block when it is already large enough and moves
//!   the contents otherwise.
//! - **zero_allocate** is `allocate` for `count * size` bytes, zero filled.
//!
//! ## Crate Structure
//!
//! ```text
//!   rmalloc
//!   ├── align      - Word alignment (align!, try_align)
//!   ├── block      - Block header and header/data conversion
//!   ├── grower     - Heap growth: BrkGrower (sbrk), ArenaGrower (mmap)
//!   ├── heap       - Block chain: grow, search, split, merge
//!   ├── allocator  - Allocator: allocate, release, reallocate, zero_allocate
//!   ├── stats      - HeapStats usage report
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rmalloc::{Allocator, ArenaGrower};
//!
//! let mut allocator = Allocator::with_grower(ArenaGrower::new(64 * 1024).unwrap());
//!
//! let ptr = allocator.allocate(8).unwrap().as_ptr() as *mut u64;
//!
//! unsafe {
//!     *ptr = 42;
//!     assert_eq!(*ptr, 42);
//!
//!     allocator.release(ptr as *mut u8);
//! }
//!
//! assert_eq!(allocator.stats().free_blocks, 1);
//! ```
//!
//! Each allocation is a block with a header in front of the returned pointer:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ is_free: false  │  │  │                          │  │
//!   │  │ next: null/ptr  │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   │  HEADER_SIZE bytes    │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Never shrinks the heap**: Freed memory is reused, not returned to the OS
//! - **Word alignment only**: Pointers are aligned to `usize`, nothing more
//! - **Unix-only**: Requires `libc` for `sbrk` and `mmap`
//!
//! ## Safety
//!
//! Pointers passed to `release` and `reallocate` must come from the same
//! allocator; anything else is undefined behaviour and is not detected.

pub mod align;
mod allocator;
mod block;
mod error;
mod grower;
mod heap;
mod stats;

pub use allocator::Allocator;
pub use block::{Block, HEADER_SIZE};
pub use error::AllocError;
pub use grower::{ArenaGrower, BrkGrower, Grower};
pub use heap::{BlockInfo, Blocks, Heap};
pub use stats::HeapStats;
