//! Mapping between Rust scalar types and built-in type tags.

use num_complex::Complex;

use crate::TypeNum;

/// A Rust type stored as a built-in dtype.
///
/// `read`/`write` work on native-order, possibly unaligned bytes of length
/// `size_of::<Self>()`.
pub trait NativeType: Copy + Send + Sync + 'static {
    const TYPE_NUM: TypeNum;

    fn read(bytes: &[u8]) -> Self;

    fn write(self, bytes: &mut [u8]);
}

macro_rules! impl_native_pod {
    ($($t:ty => $tag:expr),* $(,)?) => {
        $(
            impl NativeType for $t {
                const TYPE_NUM: TypeNum = $tag;

                #[inline]
                fn read(bytes: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(bytes)
                }

                #[inline]
                fn write(self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(bytemuck::bytes_of(&self));
                }
            }
        )*
    };
}

impl_native_pod!(
    i8 => TypeNum::BYTE,
    u8 => TypeNum::UBYTE,
    i16 => TypeNum::SHORT,
    u16 => TypeNum::USHORT,
    i32 => TypeNum::INT,
    u32 => TypeNum::UINT,
    i64 => TypeNum::LONG,
    u64 => TypeNum::ULONG,
    f32 => TypeNum::FLOAT,
    f64 => TypeNum::DOUBLE,
    Complex<f32> => TypeNum::CFLOAT,
    Complex<f64> => TypeNum::CDOUBLE,
);

impl NativeType for bool {
    const TYPE_NUM: TypeNum = TypeNum::BOOL;

    #[inline]
    fn read(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn write(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

/// Reverse each `unit`-sized group of `item` in place.
#[inline]
pub fn swap_item(item: &mut [u8], unit: usize) {
    if unit <= 1 {
        return;
    }
    for group in item.chunks_exact_mut(unit) {
        group.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_unaligned() {
        let mut buf = [0u8; 9];
        1.5f64.write(&mut buf[1..]);
        assert_eq!(f64::read(&buf[1..]), 1.5);
        true.write(&mut buf[..1]);
        assert!(bool::read(&buf[..1]));
    }

    #[test]
    fn test_swap_item_complex_halves() {
        let mut buf = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_item(&mut buf, 4);
        assert_eq!(buf, [4, 3, 2, 1, 8, 7, 6, 5]);
        swap_item(&mut buf, 1);
        assert_eq!(buf, [4, 3, 2, 1, 8, 7, 6, 5]);
    }
}
