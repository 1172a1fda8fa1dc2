//! Accounting and allocation of direct (native) memory.

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicU64, Ordering},
};

use strata_common::{Result, error::Error};

use crate::{
    budget::{Allocation, Budget},
    config::DirectMemoryConfig,
    native_memory::{Deallocator, NativeMemory},
    raw, sys,
};

static GLOBAL: OnceLock<DirectMemory> = OnceLock::new();

/// Accountant for native memory: every allocation reserves its byte count here
/// before asking the system allocator, and returns it when released.
///
/// `DirectMemory` is a cheap handle; clones share the same accounting state.
#[derive(Clone)]
pub struct DirectMemory(Arc<DirectMemoryInner>);

struct DirectMemoryInner {
    config: DirectMemoryConfig,
    budget: Budget,
    /// Number of live reservations.
    count: AtomicU64,
    /// Sum of the capacities of live reservations.
    total_capacity: AtomicU64,
}

impl DirectMemory {
    pub fn new(config: DirectMemoryConfig) -> DirectMemory {
        let budget = Budget::new(config.max_direct_memory);
        DirectMemory(Arc::new(DirectMemoryInner {
            config,
            budget,
            count: AtomicU64::new(0),
            total_capacity: AtomicU64::new(0),
        }))
    }

    /// Returns the process-wide accountant.
    ///
    /// Unless [`configure_global`](Self::configure_global) was called first, it is
    /// configured from the environment (see [`DirectMemoryConfig::from_env`]).
    pub fn global() -> &'static DirectMemory {
        GLOBAL.get_or_init(|| {
            let config = DirectMemoryConfig::from_env().unwrap_or_else(|e| {
                log::warn!("ignoring direct memory environment settings: {e}");
                DirectMemoryConfig::default()
            });
            DirectMemory::new(config)
        })
    }

    /// Installs the configuration of the process-wide accountant.
    ///
    /// Fails with `InvalidOperation` once the global accountant is in use.
    pub fn configure_global(config: DirectMemoryConfig) -> Result<()> {
        GLOBAL
            .set(DirectMemory::new(config))
            .map_err(|_| Error::invalid_operation("configure_global: already initialized"))
    }

    pub fn config(&self) -> &DirectMemoryConfig {
        &self.0.config
    }

    /// Whether multi-byte values may be accessed at arbitrary addresses with a
    /// single wide load/store.
    pub fn unaligned_access(&self) -> bool {
        self.0.config.is_unaligned_access_supported()
    }

    /// Number of live reservations.
    pub fn count(&self) -> u64 {
        self.0.count.load(Ordering::Relaxed)
    }

    /// Sum of the capacities of live reservations.
    pub fn total_capacity(&self) -> u64 {
        self.0.total_capacity.load(Ordering::Relaxed)
    }

    /// Bytes currently reserved (including page-alignment headroom).
    pub fn reserved_memory(&self) -> u64 {
        self.0.budget.limit() - self.0.budget.remaining()
    }

    /// The configured upper bound on reserved bytes.
    pub fn max_memory(&self) -> u64 {
        self.0.budget.limit()
    }

    /// Reserves `size` bytes of headroom for an allocation with the given `capacity`.
    ///
    /// `capacity` may not exceed `size`. Fails with `OutOfMemory`, leaving the
    /// accounting unchanged, if the headroom is not available. The reservation is released when the returned value is
    /// dropped.
    pub fn reserve(&self, size: u64, capacity: u64) -> Result<Reservation> {
        strata_common::verify_arg!(capacity, capacity <= size);
        let allocation = self.0.budget.allocate(size).map_err(|_| {
            let available = self.0.budget.remaining();
            log::debug!("direct memory reservation of {size} bytes refused ({available} available)");
            Error::out_of_memory(size, available)
        })?;
        self.0.count.fetch_add(1, Ordering::Relaxed);
        self.0.total_capacity.fetch_add(capacity, Ordering::Relaxed);
        Ok(Reservation {
            allocation,
            capacity,
            owner: self.0.clone(),
        })
    }

    /// Allocates a zero-filled native region of `capacity` bytes.
    ///
    /// When page alignment is configured, one extra page is reserved and the
    /// usable base address is rounded up to the next page boundary. If the system
    /// allocator fails, the reservation is rolled back before the error is
    /// returned.
    pub fn allocate(&self, capacity: usize) -> Result<NativeMemory> {
        let page_aligned = self.0.config.page_aligned;
        let page_size = sys::get_page_size();
        let size = (capacity as u64)
            .saturating_add(if page_aligned { page_size as u64 } else { 0 })
            .max(1);

        let reservation = self.reserve(size, capacity as u64)?;
        let Ok(size) = usize::try_from(size) else {
            return Err(Error::out_of_memory(size, self.0.budget.remaining()));
        };

        let base = match raw::allocate_zeroed(size) {
            Ok(base) => base,
            Err(e) => {
                drop(reservation);
                log::debug!("system allocator failed for {size} bytes: {e}");
                return Err(Error::out_of_memory(size as u64, self.0.budget.remaining()));
            }
        };

        let address = if page_aligned && !(base.as_ptr() as usize).is_multiple_of(page_size) {
            let offset = raw::align_up(base.as_ptr() as usize, page_size) - base.as_ptr() as usize;
            // The extra page reserved above keeps the rounded base in bounds.
            unsafe { base.add(offset) }
        } else {
            base
        };

        log::trace!(
            "allocated direct memory at {:#x}: size {size}, capacity {capacity}",
            address.as_ptr() as usize
        );
        let deallocator = Deallocator::new(base, size, capacity, reservation);
        Ok(NativeMemory::allocated(address, capacity, deallocator))
    }
}

impl std::fmt::Debug for DirectMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectMemory")
            .field("count", &self.count())
            .field("total_capacity", &self.total_capacity())
            .field("reserved_memory", &self.reserved_memory())
            .field("max_memory", &self.max_memory())
            .finish()
    }
}

/// Accounting headroom held by one native allocation.
pub struct Reservation {
    allocation: Allocation,
    capacity: u64,
    owner: Arc<DirectMemoryInner>,
}

impl Reservation {
    /// Reserved bytes.
    pub fn size(&self) -> u64 {
        self.allocation.amount()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.owner.count.fetch_sub(1, Ordering::Relaxed);
        self.owner
            .total_capacity
            .fetch_sub(self.capacity, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("size", &self.size())
            .field("capacity", &self.capacity)
            .finish()
    }
}
