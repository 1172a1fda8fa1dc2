//! Native (off-heap) memory for strata buffers.
//!
//! This crate owns everything that touches the system allocator directly:
//! the platform page size, raw zero-filled allocations, the direct memory
//! accountant that every allocation must reserve headroom from, and the
//! deallocation hook that returns an allocation exactly once.

pub mod budget;
pub mod config;
pub mod counter;
pub mod direct_memory;
pub mod native_memory;
pub mod raw;

#[cfg_attr(target_os = "linux", path = "sys_linux.rs")]
#[cfg_attr(windows, path = "sys_win.rs")]
#[cfg_attr(not(any(target_os = "linux", windows)), path = "sys_fallback.rs")]
pub mod sys;

pub use config::DirectMemoryConfig;
pub use direct_memory::{DirectMemory, Reservation};
pub use native_memory::{Cleaner, Deallocator, NativeMemory};
