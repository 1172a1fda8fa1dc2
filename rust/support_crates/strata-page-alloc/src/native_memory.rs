//! The owner of a native memory region and the hook that releases it.
//!
//! A [`NativeMemory`] is the root of every ownership chain that addresses
//! off-heap memory: buffers and views over the region hold a shared handle to
//! it, and the region is released when the last handle is dropped.

use std::fs::File;
use std::ptr::NonNull;

use crate::{direct_memory::Reservation, raw};

/// Releases a raw block obtained from the system allocator together with the
/// accounting headroom reserved for it.
///
/// `run` frees the block at most once. After the first call the recorded
/// address is cleared, so subsequent calls are no-ops.
pub struct Deallocator {
    /// Raw base address as returned by the allocator, `0` once released.
    address: usize,
    /// Number of bytes requested from the allocator (may exceed `capacity`).
    size: usize,
    /// Usable capacity promised to the owner.
    capacity: usize,
    reservation: Option<Reservation>,
}

impl Deallocator {
    pub(crate) fn new(
        base: NonNull<u8>,
        size: usize,
        capacity: usize,
        reservation: Reservation,
    ) -> Deallocator {
        Deallocator {
            address: base.as_ptr() as usize,
            size,
            capacity,
            reservation: Some(reservation),
        }
    }

    /// Returns the block to the system allocator and releases the reservation.
    pub fn run(&mut self) {
        let Some(base) = NonNull::new(self.address as *mut u8) else {
            return;
        };
        unsafe { raw::free(base, self.size) };
        self.address = 0;
        log::trace!(
            "freed direct memory at {:#x}: size {}, capacity {}",
            base.as_ptr() as usize,
            self.size,
            self.capacity
        );
        drop(self.reservation.take());
    }

    /// Returns `true` once the block has been released.
    pub fn is_released(&self) -> bool {
        self.address == 0
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for Deallocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deallocator")
            .field("address", &format_args!("{:#x}", self.address))
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .finish()
    }
}

enum Cleanup {
    Deallocate(Deallocator),
    Unmap(Box<dyn FnOnce()>),
}

/// A run-once cleanup action attached to a native memory owner.
pub struct Cleaner {
    action: Option<Cleanup>,
}

impl Cleaner {
    pub fn deallocate(deallocator: Deallocator) -> Cleaner {
        Cleaner {
            action: Some(Cleanup::Deallocate(deallocator)),
        }
    }

    /// A cleaner running a custom release action, e.g. unmapping a file view.
    pub fn unmap(unmapper: impl FnOnce() + 'static) -> Cleaner {
        Cleaner {
            action: Some(Cleanup::Unmap(Box::new(unmapper))),
        }
    }

    /// Runs the cleanup action if it has not run yet.
    pub fn clean(&mut self) {
        match self.action.take() {
            Some(Cleanup::Deallocate(mut deallocator)) => deallocator.run(),
            Some(Cleanup::Unmap(unmapper)) => unmapper(),
            None => (),
        }
    }
}

impl std::fmt::Debug for Cleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.action {
            Some(Cleanup::Deallocate(_)) => "deallocate",
            Some(Cleanup::Unmap(_)) => "unmap",
            None => "done",
        };
        f.debug_tuple("Cleaner").field(&state).finish()
    }
}

/// A native memory region with a single owner.
///
/// The region stays valid until the `NativeMemory` is dropped, at which point
/// its cleaner runs exactly once.
pub struct NativeMemory {
    /// Effective base address (page aligned when requested).
    address: NonNull<u8>,
    capacity: usize,
    resource: Option<File>,
    cleaner: Cleaner,
}

impl NativeMemory {
    pub(crate) fn allocated(
        address: NonNull<u8>,
        capacity: usize,
        deallocator: Deallocator,
    ) -> NativeMemory {
        NativeMemory {
            address,
            capacity,
            resource: None,
            cleaner: Cleaner::deallocate(deallocator),
        }
    }

    /// Takes ownership of an externally mapped region (for example a file view).
    ///
    /// `unmapper` runs once, when the returned owner is dropped.
    ///
    /// # Safety
    ///
    /// - `address..address + capacity` must be valid for reads and writes until
    ///   `unmapper` runs.
    /// - Nothing else may release the region.
    pub unsafe fn mapped(
        address: NonNull<u8>,
        capacity: usize,
        resource: Option<File>,
        unmapper: impl FnOnce() + 'static,
    ) -> NativeMemory {
        NativeMemory {
            address,
            capacity,
            resource,
            cleaner: Cleaner::unmap(unmapper),
        }
    }

    /// Returns the base address of the usable region.
    #[inline]
    pub fn address(&self) -> NonNull<u8> {
        self.address
    }

    /// Returns the number of usable bytes starting at [`address`](Self::address).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The external resource backing a mapped region, if any.
    pub fn resource(&self) -> Option<&File> {
        self.resource.as_ref()
    }

    /// Returns `true` if the region is an external mapping rather than an allocation.
    pub fn is_mapped(&self) -> bool {
        matches!(self.cleaner.action, Some(Cleanup::Unmap(_)))
    }
}

impl Drop for NativeMemory {
    fn drop(&mut self) {
        self.cleaner.clean();
    }
}

impl std::fmt::Debug for NativeMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeMemory")
            .field("address", &self.address)
            .field("capacity", &self.capacity)
            .field("cleaner", &self.cleaner)
            .finish()
    }
}
