//! Element types a typed buffer can hold.

use std::cmp::Ordering;

use crate::codec::Bits;

/// A fixed-width scalar stored in a [`TypedBuffer`](crate::TypedBuffer).
///
/// The element's memory image is exactly its bit pattern
/// ([`Bits`](Self::Bits)), so values can be moved between managed arrays and
/// native memory with plain byte copies.
pub trait Element: bytemuck::Pod + PartialEq + std::fmt::Debug + 'static {
    type Bits: Bits;

    /// Size of the element in bytes.
    const WIDTH: usize = std::mem::size_of::<Self>();

    const NAME: &'static str;

    #[inline]
    fn to_bits(self) -> Self::Bits {
        bytemuck::cast(self)
    }

    #[inline]
    fn from_bits(bits: Self::Bits) -> Self {
        bytemuck::cast(bits)
    }

    /// Natural ordering used by buffer comparison.
    fn compare(a: Self, b: Self) -> Ordering;

    /// Element equality used by buffer equality and mismatch.
    ///
    /// Agrees with [`compare`](Self::compare) returning `Equal`.
    fn same(a: Self, b: Self) -> bool {
        Self::compare(a, b) == Ordering::Equal
    }

    /// Contribution of the element to a buffer hash code.
    fn hash_value(self) -> i32;
}

macro_rules! impl_integer_element {
    ($ty:ty, $bits:ty) => {
        impl Element for $ty {
            type Bits = $bits;
            const NAME: &'static str = stringify!($ty);

            #[inline]
            fn compare(a: Self, b: Self) -> Ordering {
                a.cmp(&b)
            }

            #[inline]
            fn same(a: Self, b: Self) -> bool {
                a == b
            }

            #[inline]
            fn hash_value(self) -> i32 {
                self as i32
            }
        }
    };
}

impl_integer_element!(u8, u8);
impl_integer_element!(u16, u16);
impl_integer_element!(i16, u16);
impl_integer_element!(i32, u32);
impl_integer_element!(i64, u64);

// NaNs compare equal to each other and above every other value; zeros of
// either sign compare equal.
macro_rules! impl_float_element {
    ($ty:ty, $bits:ty) => {
        impl Element for $ty {
            type Bits = $bits;
            const NAME: &'static str = stringify!($ty);

            #[inline]
            fn compare(a: Self, b: Self) -> Ordering {
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                }
            }

            #[inline]
            fn hash_value(self) -> i32 {
                self as i32
            }
        }
    };
}

impl_float_element!(f32, u32);
impl_float_element!(f64, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(<u8 as Element>::WIDTH, 1);
        assert_eq!(<u16 as Element>::WIDTH, 2);
        assert_eq!(<i16 as Element>::WIDTH, 2);
        assert_eq!(<i32 as Element>::WIDTH, 4);
        assert_eq!(<i64 as Element>::WIDTH, 8);
        assert_eq!(<f32 as Element>::WIDTH, 4);
        assert_eq!(<f64 as Element>::WIDTH, 8);
    }

    #[test]
    fn test_bits_round_trip() {
        assert_eq!(Element::to_bits(-2i16), 0xFFFE);
        assert_eq!(<i16 as Element>::from_bits(0xFFFE), -2);
        assert_eq!(Element::to_bits(1.0f32), 0x3F80_0000);
        assert_eq!(<f64 as Element>::from_bits(0x4000_0000_0000_0000), 2.0);
    }

    #[test]
    fn test_float_ordering() {
        assert_eq!(f32::compare(f32::NAN, -f32::NAN), Ordering::Equal);
        assert!(f32::same(f32::NAN, f32::NAN));
        assert_eq!(f32::compare(f32::NAN, f32::INFINITY), Ordering::Greater);
        assert_eq!(f64::compare(-1.0, f64::NAN), Ordering::Less);
        assert!(f64::same(0.0, -0.0));
        assert_eq!(f64::compare(1.0, 2.0), Ordering::Less);
    }

    #[test]
    fn test_hash_values() {
        assert_eq!(0xFFFFu16.hash_value(), 65535);
        assert_eq!((-3i16).hash_value(), -3);
        assert_eq!(2.9f32.hash_value(), 2);
        assert_eq!(f64::NAN.hash_value(), 0);
        assert_eq!(0x1_0000_0005i64.hash_value(), 5);
    }
}
