/// Rounds `$value` up to the next multiple of the machine word size.
///
/// # Examples
///
/// ```rust
/// use rmalloc::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
///
/// The addition can overflow for values close to `usize::MAX`; use
/// [`try_align`](crate::align::try_align) when the input comes from a caller.
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + ::core::mem::size_of::<usize>() - 1) & !(::core::mem::size_of::<usize>() - 1)
  };
}

/// Word size every payload and header is rounded to.
pub const WORD_SIZE: usize = core::mem::size_of::<usize>();

/// Checked version of [`align!`], `None` when rounding up would overflow.
pub const fn try_align(value: usize) -> Option<usize> {
  match value.checked_add(WORD_SIZE - 1) {
    Some(padded) => Some(padded & !(WORD_SIZE - 1)),
    None => None,
  }
}

/// Returns `true` if `value` is a multiple of the word size.
pub const fn is_aligned(value: usize) -> bool {
  value & (WORD_SIZE - 1) == 0
}
