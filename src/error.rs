/// Reasons an allocation request produced no memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// A zero-byte request.
  InvalidSize,
  /// The grower refused to extend the heap.
  OutOfMemory,
  /// `count * elem_size` does not fit in `usize`.
  Overflow,
}

impl core::fmt::Display for AllocError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::InvalidSize => write!(f, "Invalid allocation size"),
      Self::OutOfMemory => write!(f, "Out of memory"),
      Self::Overflow => write!(f, "Allocation size overflow"),
    }
  }
}

impl std::error::Error for AllocError {}
