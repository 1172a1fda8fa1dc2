//! Multi-byte access and typed views over byte buffers.

use strata_common::Result;

use crate::{
    ByteBuffer, CharBuffer, DoubleBuffer, FloatBuffer, IntBuffer, LongBuffer, ShortBuffer,
    buffer::{Storage, TypedBuffer},
    codec::{Access, Bits, ByteOrder},
    cursor::Cursor,
    element::Element,
};

macro_rules! scalar_accessors {
    ($ty:ty, $get:ident, $get_at:ident, $put:ident, $put_at:ident) => {
        #[doc = concat!("Reads a `", stringify!($ty), "` at the position and advances past it.")]
        pub fn $get(&mut self) -> Result<$ty> {
            self.get_scalar()
        }

        #[doc = concat!("Reads a `", stringify!($ty), "` at absolute byte `index`.")]
        pub fn $get_at(&self, index: usize) -> Result<$ty> {
            self.get_scalar_at(index)
        }

        #[doc = concat!("Writes a `", stringify!($ty), "` at the position and advances past it.")]
        pub fn $put(&mut self, value: $ty) -> Result<&mut Self> {
            self.put_scalar(value)
        }

        #[doc = concat!("Writes a `", stringify!($ty), "` at absolute byte `index`.")]
        pub fn $put_at(&mut self, index: usize, value: $ty) -> Result<&mut Self> {
            self.put_scalar_at(index, value)
        }
    };
}

impl ByteBuffer {
    /// Sets the byte order used by multi-byte accessors and by typed views
    /// created afterwards.
    pub fn set_order(&mut self, order: ByteOrder) -> &mut Self {
        self.order = order;
        self
    }

    /// Decodes the `B::WIDTH` bytes at absolute byte `index`.
    fn read_bits<B: Bits>(&self, index: usize) -> B {
        match &self.storage {
            Storage::Native {
                address, settings, ..
            } => {
                let at = unsafe { address.as_ptr().add(index) };
                let access = Access::select(
                    at as usize,
                    B::WIDTH,
                    self.order,
                    settings.unaligned_access,
                );
                unsafe { access.load(at) }
            }
            _ => {
                let mut image = [0u8; 8];
                for (i, byte) in image[..B::WIDTH].iter_mut().enumerate() {
                    *byte = self.load(index + i);
                }
                B::read_from(&image[..B::WIDTH], self.order)
            }
        }
    }

    fn write_bits<B: Bits>(&self, index: usize, bits: B) {
        match &self.storage {
            Storage::Native {
                address, settings, ..
            } => {
                let at = unsafe { address.as_ptr().add(index) };
                let access = Access::select(
                    at as usize,
                    B::WIDTH,
                    self.order,
                    settings.unaligned_access,
                );
                unsafe { access.store(at, bits) }
            }
            _ => {
                let mut image = [0u8; 8];
                bits.write_to(&mut image[..B::WIDTH], self.order);
                for (i, &byte) in image[..B::WIDTH].iter().enumerate() {
                    self.store(index + i, byte);
                }
            }
        }
    }

    fn get_scalar<E: Element>(&mut self) -> Result<E> {
        let index = self.cursor.next_get_index(E::WIDTH)?;
        Ok(E::from_bits(self.read_bits(index)))
    }

    fn get_scalar_at<E: Element>(&self, index: usize) -> Result<E> {
        self.cursor.check_index(index, E::WIDTH)?;
        Ok(E::from_bits(self.read_bits(index)))
    }

    fn put_scalar<E: Element>(&mut self, value: E) -> Result<&mut Self> {
        self.check_writable()?;
        let index = self.cursor.next_put_index(E::WIDTH)?;
        self.write_bits(index, value.to_bits());
        Ok(self)
    }

    fn put_scalar_at<E: Element>(&mut self, index: usize, value: E) -> Result<&mut Self> {
        self.check_writable()?;
        self.cursor.check_index(index, E::WIDTH)?;
        self.write_bits(index, value.to_bits());
        Ok(self)
    }

    scalar_accessors!(u16, get_u16, get_u16_at, put_u16, put_u16_at);
    scalar_accessors!(i16, get_i16, get_i16_at, put_i16, put_i16_at);
    scalar_accessors!(i32, get_i32, get_i32_at, put_i32, put_i32_at);
    scalar_accessors!(i64, get_i64, get_i64_at, put_i64, put_i64_at);
    scalar_accessors!(f32, get_f32, get_f32_at, put_f32, put_f32_at);
    scalar_accessors!(f64, get_f64, get_f64_at, put_f64, put_f64_at);

    /// A view of the remaining bytes as `U` elements in this buffer's byte
    /// order.
    ///
    /// The view starts at the position, holds `remaining() / U::WIDTH`
    /// elements (trailing bytes are not covered) and inherits read-only-ness.
    /// Writes through either side are visible through the other.
    pub fn as_typed_buffer<U: Element>(&self) -> TypedBuffer<U> {
        let position = self.position();
        let storage = match &self.storage {
            Storage::Heap { array, offset } => Storage::HeapBytes {
                bytes: array.clone(),
                offset: offset + position,
            },
            Storage::HeapBytes { bytes, offset } => Storage::HeapBytes {
                bytes: bytes.clone(),
                offset: offset + position,
            },
            Storage::Native {
                address,
                attachment,
                settings,
                ..
            } => {
                let address = unsafe { address.add(position) };
                Storage::Native {
                    address,
                    access: Access::select(
                        address.as_ptr() as usize,
                        U::WIDTH,
                        self.order,
                        settings.unaligned_access,
                    ),
                    attachment: attachment.clone(),
                    settings: *settings,
                }
            }
        };
        TypedBuffer::from_parts(
            Cursor::new(self.remaining() / U::WIDTH),
            storage,
            self.read_only,
            self.order,
        )
    }

    pub fn as_u16_buffer(&self) -> CharBuffer {
        self.as_typed_buffer()
    }

    pub fn as_i16_buffer(&self) -> ShortBuffer {
        self.as_typed_buffer()
    }

    pub fn as_i32_buffer(&self) -> IntBuffer {
        self.as_typed_buffer()
    }

    pub fn as_i64_buffer(&self) -> LongBuffer {
        self.as_typed_buffer()
    }

    pub fn as_f32_buffer(&self) -> FloatBuffer {
        self.as_typed_buffer()
    }

    pub fn as_f64_buffer(&self) -> DoubleBuffer {
        self.as_typed_buffer()
    }
}
