use std::{io::Read, ptr};

use rmalloc::{Allocator, BrkGrower};
use tracing_subscriber::EnvFilter;

/// Settings read from the environment.
struct Config {
  /// Pause for ENTER between steps (`RMALLOC_INTERACTIVE=0` disables).
  interactive: bool,
}

impl Config {
  fn from_env() -> Self {
    let interactive = std::env::var("RMALLOC_INTERACTIVE")
      .map(|value| value != "0")
      .unwrap_or(true);

    Self { interactive }
  }
}

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`
/// or `gdb` while the program break moves.
fn block_until_enter_pressed(config: &Config) {
  if !config.interactive {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_program_break(
  allocator: &Allocator<BrkGrower>,
  label: &str,
) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    allocator.grower().program_break(),
  );
}

fn print_alloc(
  allocator: &Allocator<BrkGrower>,
  requested: usize,
  address: *mut u8,
) {
  println!(
    "Allocated {} bytes ({} usable), address = {:?}, program break = {:?}",
    requested,
    unsafe { allocator.usable_size(address) },
    address,
    allocator.grower().program_break(),
  );
}

fn print_stats(allocator: &Allocator<BrkGrower>) {
  println!("{}", allocator.stats());
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let config = Config::from_env();
  let mut allocator = Allocator::new();

  print_program_break(&allocator, "start");
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 1) Allocate an i32 and store a value in it.
  // --------------------------------------------------------------------
  let Ok(first) = allocator.allocate(size_of::<i32>()) else {
    eprintln!("allocate(i32) failed");
    return;
  };
  let first_ptr = first.as_ptr() as *mut i32;
  unsafe { first_ptr.write(201) };
  println!("\n[1] Allocate i32");
  print_alloc(&allocator, size_of::<i32>(), first.as_ptr());
  println!("[1] Stored value = {}", unsafe { first_ptr.read() });
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 2) Allocate a bool.
  // --------------------------------------------------------------------
  let Ok(second) = allocator.allocate(size_of::<bool>()) else {
    eprintln!("allocate(bool) failed");
    return;
  };
  let second_ptr = second.as_ptr() as *mut bool;
  unsafe { second_ptr.write(true) };
  println!("\n[2] Allocate bool");
  print_alloc(&allocator, size_of::<bool>(), second.as_ptr());
  println!("[2] Stored value = {}", unsafe { second_ptr.read() });
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 3) Zero-allocate an array of 8 u32 and show it reads back as zero.
  // --------------------------------------------------------------------
  let Ok(third) = allocator.zero_allocate(8, size_of::<u32>()) else {
    eprintln!("zero_allocate(8, u32) failed");
    return;
  };
  let third_ptr = third.as_ptr() as *mut u32;
  let zeroed: Vec<u32> = (0..8).map(|i| unsafe { third_ptr.add(i).read() }).collect();
  println!("\n[3] Zero-allocate [u32; 8]");
  print_alloc(&allocator, 8 * size_of::<u32>(), third.as_ptr());
  println!("[3] Contents = {:?}", zeroed);
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 4) Grow the i32 into an [i32; 16]. The value moves with it.
  // --------------------------------------------------------------------
  let grown = match unsafe { allocator.reallocate(first.as_ptr(), 16 * size_of::<i32>()) } {
    Ok(Some(grown)) => grown,
    Ok(None) | Err(_) => {
      eprintln!("reallocate to [i32; 16] failed");
      return;
    }
  };
  let grown_ptr = grown.as_ptr() as *mut i32;
  println!("\n[4] Reallocate i32 -> [i32; 16]");
  print_alloc(&allocator, 16 * size_of::<i32>(), grown.as_ptr());
  println!(
    "[4] Moved from {:?} to {:?}, value = {}",
    first.as_ptr(),
    grown.as_ptr(),
    unsafe { grown_ptr.read() }
  );
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 5) Release the bool. It merges with the block freed by step 4
  //    when the two are adjacent.
  // --------------------------------------------------------------------
  unsafe { allocator.release(second.as_ptr()) };
  println!("\n[5] Released bool at {:?}", second.as_ptr());
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 6) Allocate 2 bytes to see the freed space reused.
  // --------------------------------------------------------------------
  let Ok(small) = allocator.allocate(2) else {
    eprintln!("allocate(2) failed");
    return;
  };
  unsafe { ptr::write_bytes(small.as_ptr(), 0xAB, 2) };
  println!("\n[6] Allocate [u8; 2] (check reuse of freed block)");
  print_alloc(&allocator, 2, small.as_ptr());
  println!(
    "[6] small == first? {}",
    if small == first {
      "Yes, it reused the freed block"
    } else {
      "No, it allocated somewhere else"
    }
  );
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 7) Allocate a large block to observe heap growth.
  // --------------------------------------------------------------------
  print_program_break(&allocator, "before large alloc");

  let Ok(big) = allocator.allocate(64 * 1024) else {
    eprintln!("allocate(64 KiB) failed");
    return;
  };
  println!("\n[7] Allocate large 64 KiB block");
  print_alloc(&allocator, 64 * 1024, big.as_ptr());

  print_program_break(&allocator, "after large alloc");
  print_stats(&allocator);
  block_until_enter_pressed(&config);

  // --------------------------------------------------------------------
  // 8) Release everything. Freed blocks stay in the chain for reuse;
  //    the program break does not move back.
  // --------------------------------------------------------------------
  unsafe {
    allocator.release(big.as_ptr());
    allocator.release(small.as_ptr());
    allocator.release(third.as_ptr());
    allocator.release(grown.as_ptr());
  }
  println!("\n[8] Released everything");
  print_stats(&allocator);
  print_program_break(&allocator, "end");
}
