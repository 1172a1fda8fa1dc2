//! Buffers over native memory.
//!
//! A native-backed buffer holds its region through an [`Attachment`]. Every
//! slice, duplicate and typed view clones the attachment, so the region is
//! released only after the last view over it is dropped, and every raw access
//! happens while the accessing view (and with it the region) is borrowed.

use std::{any::Any, fs::File, ptr::NonNull, rc::Rc};

use strata_common::Result;
use strata_page_alloc::{DirectMemory, NativeMemory};

use crate::{
    ByteBuffer,
    buffer::{Storage, TypedBuffer},
    codec::{Access, ByteOrder},
    cursor::Cursor,
    element::Element,
};

/// What keeps the memory under a native buffer alive.
#[derive(Clone, Default)]
pub enum Attachment {
    /// The memory is owned elsewhere and outlives the buffer by contract.
    #[default]
    Unowned,
    /// A native region released when its last handle is dropped.
    Native(Rc<NativeMemory>),
    /// An arbitrary owner kept alive alongside the buffer.
    Object(Rc<dyn Any>),
}

impl Attachment {
    /// The native region, for buffers that own one.
    pub fn native_memory(&self) -> Option<&Rc<NativeMemory>> {
        match self {
            Attachment::Native(memory) => Some(memory),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Unowned => f.write_str("Unowned"),
            Attachment::Native(memory) => f.debug_tuple("Native").field(memory).finish(),
            Attachment::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Settings captured from the [`DirectMemory`] a native buffer came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NativeSettings {
    pub(crate) copy_threshold: usize,
    pub(crate) unaligned_access: bool,
}

impl NativeSettings {
    pub(crate) fn of(memory: &DirectMemory) -> NativeSettings {
        NativeSettings {
            copy_threshold: memory.config().copy_threshold,
            unaligned_access: memory.unaligned_access(),
        }
    }
}

impl<T: Element> TypedBuffer<T> {
    /// Returns `true` if the elements live in native memory.
    #[inline]
    pub fn is_direct(&self) -> bool {
        matches!(self.storage, Storage::Native { .. })
    }

    /// Address of element 0 of a native-backed buffer.
    pub fn address(&self) -> Option<NonNull<u8>> {
        match &self.storage {
            Storage::Native { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// The owner of the native memory under this buffer.
    pub fn attachment(&self) -> Option<&Attachment> {
        match &self.storage {
            Storage::Native { attachment, .. } => Some(attachment),
            _ => None,
        }
    }
}

impl ByteBuffer {
    fn native(
        address: NonNull<u8>,
        capacity: usize,
        attachment: Attachment,
        settings: NativeSettings,
    ) -> ByteBuffer {
        TypedBuffer::from_parts(
            Cursor::new(capacity),
            Storage::Native {
                address,
                access: Access::Native,
                attachment,
                settings,
            },
            false,
            ByteOrder::BigEndian,
        )
    }

    /// Allocates a zero-filled native buffer from the process-wide
    /// [`DirectMemory`].
    pub fn allocate_direct(capacity: usize) -> Result<ByteBuffer> {
        DirectMemory::global().allocate_direct(capacity)
    }

    /// Wraps memory owned elsewhere.
    ///
    /// # Safety
    ///
    /// `address..address + capacity` must stay valid for reads and writes for
    /// as long as this buffer or any view derived from it exists (which
    /// `attachment` may guarantee), and must not be accessed through other
    /// Rust references meanwhile.
    pub unsafe fn from_raw_parts(
        address: NonNull<u8>,
        capacity: usize,
        attachment: Attachment,
    ) -> ByteBuffer {
        log::trace!(
            "wrapping foreign memory at {:#x}: capacity {capacity}",
            address.as_ptr() as usize
        );
        Self::native(
            address,
            capacity,
            attachment,
            NativeSettings::of(DirectMemory::global()),
        )
    }

    /// Wraps an externally mapped region, typically a file view.
    ///
    /// `unmapper` runs once, after the last view over the region is dropped.
    /// `resource` (the mapped file, if any) is kept open until then.
    ///
    /// # Safety
    ///
    /// `address..address + capacity` must be valid for reads and writes until
    /// `unmapper` runs, and nothing else may release it.
    pub unsafe fn from_mapped(
        address: NonNull<u8>,
        capacity: usize,
        resource: Option<File>,
        unmapper: impl FnOnce() + 'static,
    ) -> ByteBuffer {
        let memory = unsafe { NativeMemory::mapped(address, capacity, resource, unmapper) };
        log::trace!(
            "wrapping mapped memory at {:#x}: capacity {capacity}",
            address.as_ptr() as usize
        );
        Self::native(
            address,
            capacity,
            Attachment::Native(Rc::new(memory)),
            NativeSettings::of(DirectMemory::global()),
        )
    }
}

/// Allocation of native byte buffers from a [`DirectMemory`] accountant.
pub trait AllocateDirect {
    /// Allocates a zero-filled native buffer of `capacity` bytes.
    ///
    /// Fails with `OutOfMemory` if the accountant refuses the reservation or
    /// the system allocator fails; nothing stays reserved in that case.
    fn allocate_direct(&self, capacity: usize) -> Result<ByteBuffer>;
}

impl AllocateDirect for DirectMemory {
    fn allocate_direct(&self, capacity: usize) -> Result<ByteBuffer> {
        let memory = self.allocate(capacity)?;
        let address = memory.address();
        Ok(ByteBuffer::native(
            address,
            capacity,
            Attachment::Native(Rc::new(memory)),
            NativeSettings::of(self),
        ))
    }
}
