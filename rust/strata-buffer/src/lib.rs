//! Typed, position/limit-addressed buffers over managed arrays and native
//! memory.
//!
//! A [`TypedBuffer`] is a cursor (mark, position, limit, capacity) over a run
//! of fixed-width elements. Buffers can be sliced, duplicated, made read-only
//! and, for bytes, reinterpreted as buffers of wider elements in either byte
//! order. All views over one storage see each other's writes.
//!
//! Native buffers reserve their memory from a
//! [`DirectMemory`](strata_page_alloc::DirectMemory) accountant and release it
//! when the last view over the region is dropped.
//!
//! ```
//! use strata_buffer::{ByteBuffer, ByteOrder};
//!
//! let mut bytes = ByteBuffer::allocate_direct(16)?;
//! bytes.put_i32_at(0, 0x11223344)?;
//! assert_eq!(bytes.duplicate().as_i32_buffer().get_at(0)?, 0x11223344);
//!
//! bytes.put_i32(-1)?;
//! assert_eq!(bytes.position(), 4);
//! assert_eq!(bytes.slice().as_i32_buffer().get_at(0)?, 0);
//!
//! bytes.set_order(ByteOrder::LittleEndian).put_u16(0xABCD)?;
//! assert_eq!(bytes.get_at(4)?, 0xCD);
//! # Ok::<(), strata_common::error::Error>(())
//! ```

pub mod array;
pub mod bounds;
pub mod buffer;
pub mod bytes;
pub mod codec;
pub mod cursor;
pub mod direct;
pub mod element;

pub use array::SharedArray;
pub use buffer::TypedBuffer;
pub use codec::ByteOrder;
pub use cursor::Cursor;
pub use direct::{AllocateDirect, Attachment};
pub use element::Element;

pub type ByteBuffer = TypedBuffer<u8>;
/// Buffer of 16-bit code units.
pub type CharBuffer = TypedBuffer<u16>;
pub type ShortBuffer = TypedBuffer<i16>;
pub type IntBuffer = TypedBuffer<i32>;
pub type LongBuffer = TypedBuffer<i64>;
pub type FloatBuffer = TypedBuffer<f32>;
pub type DoubleBuffer = TypedBuffer<f64>;
