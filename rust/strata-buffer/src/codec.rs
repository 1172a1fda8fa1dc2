//! Byte-order-aware load and store of scalar bit patterns.
//!
//! Every multi-byte access goes through one of two paths: a single
//! unaligned-capable wide load/store with an optional byte swap, or byte-wise
//! assembly for platforms (or addresses) where wide access is not allowed.
//! Floating point values travel as their raw bit patterns.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Byte order of multi-byte values in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// The byte order of the running platform.
    #[inline]
    pub const fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }

    #[inline]
    pub fn reverse(self) -> ByteOrder {
        match self {
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
        }
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrder::BigEndian => f.write_str("BIG_ENDIAN"),
            ByteOrder::LittleEndian => f.write_str("LITTLE_ENDIAN"),
        }
    }
}

/// An unsigned bit pattern of 1, 2, 4 or 8 bytes.
pub trait Bits: bytemuck::Pod + PartialEq + std::fmt::Debug {
    const WIDTH: usize;

    fn swap_bytes(self) -> Self;

    /// Decodes `bytes[..WIDTH]` in the given order.
    fn read_from(bytes: &[u8], order: ByteOrder) -> Self;

    /// Encodes into `bytes[..WIDTH]` in the given order.
    fn write_to(self, bytes: &mut [u8], order: ByteOrder);
}

impl Bits for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn swap_bytes(self) -> Self {
        self
    }

    #[inline]
    fn read_from(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0]
    }

    #[inline]
    fn write_to(self, bytes: &mut [u8], _order: ByteOrder) {
        bytes[0] = self;
    }
}

macro_rules! impl_bits {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Bits for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn swap_bytes(self) -> Self {
                <$ty>::swap_bytes(self)
            }

            #[inline]
            fn read_from(bytes: &[u8], order: ByteOrder) -> Self {
                match order {
                    ByteOrder::BigEndian => BigEndian::$read(bytes),
                    ByteOrder::LittleEndian => LittleEndian::$read(bytes),
                }
            }

            #[inline]
            fn write_to(self, bytes: &mut [u8], order: ByteOrder) {
                match order {
                    ByteOrder::BigEndian => BigEndian::$write(bytes, self),
                    ByteOrder::LittleEndian => LittleEndian::$write(bytes, self),
                }
            }
        }
    };
}

impl_bits!(u16, read_u16, write_u16);
impl_bits!(u32, read_u32, write_u32);
impl_bits!(u64, read_u64, write_u64);

/// Loads a value with a single (possibly unaligned) wide read, swapping the
/// bytes when `order` is not the native order.
///
/// # Safety
///
/// `address..address + B::WIDTH` must be valid for reads.
#[inline]
pub unsafe fn get<B: Bits>(address: *const u8, order: ByteOrder) -> B {
    let bits = unsafe { std::ptr::read_unaligned(address as *const B) };
    if order.is_native() {
        bits
    } else {
        bits.swap_bytes()
    }
}

/// Stores a value with a single (possibly unaligned) wide write.
///
/// # Safety
///
/// `address..address + B::WIDTH` must be valid for writes.
#[inline]
pub unsafe fn put<B: Bits>(address: *mut u8, bits: B, order: ByteOrder) {
    let bits = if order.is_native() {
        bits
    } else {
        bits.swap_bytes()
    };
    unsafe { std::ptr::write_unaligned(address as *mut B, bits) };
}

/// Assembles a value from individual byte reads.
///
/// # Safety
///
/// `address..address + B::WIDTH` must be valid for reads.
#[inline]
pub unsafe fn get_bytewise<B: Bits>(address: *const u8, order: ByteOrder) -> B {
    let mut bytes = [0u8; 8];
    for (i, byte) in bytes[..B::WIDTH].iter_mut().enumerate() {
        *byte = unsafe { address.add(i).read() };
    }
    B::read_from(&bytes[..B::WIDTH], order)
}

/// Stores a value with individual byte writes.
///
/// # Safety
///
/// `address..address + B::WIDTH` must be valid for writes.
#[inline]
pub unsafe fn put_bytewise<B: Bits>(address: *mut u8, bits: B, order: ByteOrder) {
    let mut bytes = [0u8; 8];
    bits.write_to(&mut bytes[..B::WIDTH], order);
    for (i, &byte) in bytes[..B::WIDTH].iter().enumerate() {
        unsafe { address.add(i).write(byte) };
    }
}

/// How a typed view over native memory reads and writes its elements.
///
/// Chosen once when the view is created and inherited by its slices and
/// duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Wide access in native order.
    Native,
    /// Wide access with a byte swap.
    Swapped,
    /// Byte-wise assembly in the given order.
    Bytewise(ByteOrder),
}

impl Access {
    /// Wide access is used unless the platform forbids unaligned access and
    /// `address` is not a multiple of `width`.
    pub fn select(address: usize, width: usize, order: ByteOrder, unaligned_supported: bool) -> Access {
        if !unaligned_supported && !address.is_multiple_of(width) {
            Access::Bytewise(order)
        } else if order.is_native() {
            Access::Native
        } else {
            Access::Swapped
        }
    }

    /// The byte order this access strategy decodes.
    pub fn order(self) -> ByteOrder {
        match self {
            Access::Native => ByteOrder::native(),
            Access::Swapped => ByteOrder::native().reverse(),
            Access::Bytewise(order) => order,
        }
    }

    /// # Safety
    ///
    /// `address..address + B::WIDTH` must be valid for reads.
    #[inline]
    pub unsafe fn load<B: Bits>(self, address: *const u8) -> B {
        match self {
            Access::Native | Access::Swapped => unsafe { get(address, self.order()) },
            Access::Bytewise(order) => unsafe { get_bytewise(address, order) },
        }
    }

    /// # Safety
    ///
    /// `address..address + B::WIDTH` must be valid for writes.
    #[inline]
    pub unsafe fn store<B: Bits>(self, address: *mut u8, bits: B) {
        match self {
            Access::Native | Access::Swapped => unsafe { put(address, bits, self.order()) },
            Access::Bytewise(order) => unsafe { put_bytewise(address, bits, order) },
        }
    }
}
