use std::fmt;

use crate::{block::HEADER_SIZE, heap::BlockInfo};

/// Aggregate usage of a heap, counted over data regions only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub total_bytes: usize,
  pub used_bytes: usize,
  pub free_bytes: usize,
  pub blocks: usize,
  pub free_blocks: usize,
}

impl HeapStats {
  pub fn collect(blocks: impl IntoIterator<Item = BlockInfo>) -> Self {
    blocks.into_iter().fold(Self::default(), |mut stats, block| {
      stats.blocks += 1;
      stats.total_bytes += block.size;

      if block.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
      } else {
        stats.used_bytes += block.size;
      }

      stats
    })
  }

  /// Bytes spent on headers.
  pub fn overhead_bytes(&self) -> usize {
    self.blocks * HEADER_SIZE
  }
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "+---------------------------------------+")?;
    writeln!(f, "Memory Allocator Statistics:")?;
    writeln!(f, "Total Memory: {} bytes", self.total_bytes)?;
    writeln!(f, "Used Memory: {} bytes", self.used_bytes)?;
    writeln!(f, "Free Memory: {} bytes", self.free_bytes)?;
    writeln!(f, "Total Blocks: {}", self.blocks)?;
    write!(f, "Free Blocks: {}", self.free_blocks)
  }
}

#[cfg(test)]
mod tests {
  use std::ptr;

  use super::*;

  fn info(
    size: usize,
    is_free: bool,
  ) -> BlockInfo {
    BlockInfo {
      addr: ptr::null(),
      size,
      is_free,
    }
  }

  #[test]
  fn test_collect() {
    let stats = HeapStats::collect([info(16, false), info(64, true), info(8, true)]);

    assert_eq!(
      stats,
      HeapStats {
        total_bytes: 88,
        used_bytes: 16,
        free_bytes: 72,
        blocks: 3,
        free_blocks: 2,
      }
    );
    assert_eq!(stats.overhead_bytes(), 3 * HEADER_SIZE);
  }

  #[test]
  fn test_empty() {
    assert_eq!(HeapStats::collect(std::iter::empty()), HeapStats::default());
  }

  #[test]
  fn test_display() {
    let rendered = HeapStats::collect([info(16, false), info(32, true)]).to_string();

    assert!(rendered.contains("Total Memory: 48 bytes"));
    assert!(rendered.contains("Used Memory: 16 bytes"));
    assert!(rendered.contains("Free Memory: 32 bytes"));
    assert!(rendered.contains("Total Blocks: 2"));
    assert!(rendered.contains("Free Blocks: 1"));
  }
}
