//! Single element values decoded from raw bytes.
//!
//! Used by value-aware casting of 0-d operands and by element conversion
//! between dtypes.

use num_complex::Complex;

use crate::element::{swap_item, NativeType};
use crate::{Descr, TypeNum};

/// A decoded numeric element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(Complex<f64>),
}

impl ScalarValue {
    /// Decode one element stored with `descr`'s layout and byte order.
    ///
    /// Datetime-family values decode as their raw 64-bit count. Returns
    /// `None` for string, object and user-defined types.
    pub fn read(item: &[u8], descr: &Descr) -> Option<Self> {
        let mut buf = [0u8; 16];
        let n = descr.elsize();
        if n > buf.len() || item.len() < n {
            return None;
        }
        buf[..n].copy_from_slice(&item[..n]);
        if !descr.is_native() {
            if let Some(unit) = descr.swap_unit() {
                swap_item(&mut buf[..n], unit);
            }
        }
        let b = &buf[..n];
        let v = match descr.type_num() {
            TypeNum::BOOL => ScalarValue::Bool(bool::read(b)),
            TypeNum::BYTE => ScalarValue::Int(i8::read(b) as i128),
            TypeNum::UBYTE => ScalarValue::Int(u8::read(b) as i128),
            TypeNum::SHORT => ScalarValue::Int(i16::read(b) as i128),
            TypeNum::USHORT => ScalarValue::Int(u16::read(b) as i128),
            TypeNum::INT => ScalarValue::Int(i32::read(b) as i128),
            TypeNum::UINT => ScalarValue::Int(u32::read(b) as i128),
            TypeNum::LONG | TypeNum::LONGLONG | TypeNum::DATETIME | TypeNum::TIMEDELTA => {
                ScalarValue::Int(i64::read(b) as i128)
            }
            TypeNum::ULONG | TypeNum::ULONGLONG => ScalarValue::Int(u64::read(b) as i128),
            TypeNum::FLOAT => ScalarValue::Float(f32::read(b) as f64),
            TypeNum::DOUBLE => ScalarValue::Float(f64::read(b)),
            TypeNum::CFLOAT => {
                let c = Complex::<f32>::read(b);
                ScalarValue::Complex(Complex::new(c.re as f64, c.im as f64))
            }
            TypeNum::CDOUBLE => ScalarValue::Complex(Complex::<f64>::read(b)),
            _ => return None,
        };
        Some(v)
    }

    /// Encode into one element of `descr`, applying C-style conversion
    /// (truncation toward zero, integer wrap-around, real part of complex).
    ///
    /// Returns `false` when `descr` is not a numeric or datetime-family type.
    pub fn write(self, item: &mut [u8], descr: &Descr) -> bool {
        let n = descr.elsize();
        let b = &mut item[..n];
        match descr.type_num() {
            TypeNum::BOOL => self.is_nonzero().write(b),
            TypeNum::BYTE => (self.as_i128() as i8).write(b),
            TypeNum::UBYTE => (self.as_i128() as u8).write(b),
            TypeNum::SHORT => (self.as_i128() as i16).write(b),
            TypeNum::USHORT => (self.as_i128() as u16).write(b),
            TypeNum::INT => (self.as_i128() as i32).write(b),
            TypeNum::UINT => (self.as_i128() as u32).write(b),
            TypeNum::LONG | TypeNum::LONGLONG | TypeNum::DATETIME | TypeNum::TIMEDELTA => {
                (self.as_i128() as i64).write(b)
            }
            TypeNum::ULONG | TypeNum::ULONGLONG => (self.as_i128() as u64).write(b),
            TypeNum::FLOAT => (self.as_f64() as f32).write(b),
            TypeNum::DOUBLE => self.as_f64().write(b),
            TypeNum::CFLOAT => {
                let c = self.as_complex();
                Complex::new(c.re as f32, c.im as f32).write(b)
            }
            TypeNum::CDOUBLE => self.as_complex().write(b),
            _ => return false,
        }
        if !descr.is_native() {
            if let Some(unit) = descr.swap_unit() {
                swap_item(b, unit);
            }
        }
        true
    }

    pub fn is_nonzero(&self) -> bool {
        match *self {
            ScalarValue::Bool(b) => b,
            ScalarValue::Int(i) => i != 0,
            ScalarValue::Float(f) => f != 0.0,
            ScalarValue::Complex(c) => c.re != 0.0 || c.im != 0.0,
        }
    }

    pub fn as_i128(&self) -> i128 {
        match *self {
            ScalarValue::Bool(b) => b as i128,
            ScalarValue::Int(i) => i,
            ScalarValue::Float(f) => f as i128,
            ScalarValue::Complex(c) => c.re as i128,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::Bool(b) => b as u8 as f64,
            ScalarValue::Int(i) => i as f64,
            ScalarValue::Float(f) => f,
            ScalarValue::Complex(c) => c.re,
        }
    }

    pub fn as_complex(&self) -> Complex<f64> {
        match *self {
            ScalarValue::Complex(c) => c,
            other => Complex::new(other.as_f64(), 0.0),
        }
    }

    /// Smallest built-in type that holds this value.
    ///
    /// Non-negative integers prefer unsigned types; floats and complex
    /// values fall to single precision when their magnitude fits.
    pub fn min_scalar_type(&self) -> TypeNum {
        match *self {
            ScalarValue::Bool(_) => TypeNum::BOOL,
            ScalarValue::Int(i) if i >= 0 => {
                if i <= u8::MAX as i128 {
                    TypeNum::UBYTE
                } else if i <= u16::MAX as i128 {
                    TypeNum::USHORT
                } else if i <= u32::MAX as i128 {
                    TypeNum::UINT
                } else if i <= u64::MAX as i128 {
                    TypeNum::ULONG
                } else {
                    TypeNum::DOUBLE
                }
            }
            ScalarValue::Int(i) => min_signed_int(i),
            ScalarValue::Float(f) => {
                if fits_f32(f) {
                    TypeNum::FLOAT
                } else {
                    TypeNum::DOUBLE
                }
            }
            ScalarValue::Complex(c) => {
                if fits_f32(c.re) && fits_f32(c.im) {
                    TypeNum::CFLOAT
                } else {
                    TypeNum::CDOUBLE
                }
            }
        }
    }

    /// Like [`min_scalar_type`](Self::min_scalar_type) but never unsigned.
    pub fn min_signed_scalar_type(&self) -> TypeNum {
        match *self {
            ScalarValue::Int(i) => min_signed_int(i),
            _ => self.min_scalar_type(),
        }
    }
}

fn min_signed_int(i: i128) -> TypeNum {
    if i >= i8::MIN as i128 && i <= i8::MAX as i128 {
        TypeNum::BYTE
    } else if i >= i16::MIN as i128 && i <= i16::MAX as i128 {
        TypeNum::SHORT
    } else if i >= i32::MIN as i128 && i <= i32::MAX as i128 {
        TypeNum::INT
    } else if i >= i64::MIN as i128 && i <= i64::MAX as i128 {
        TypeNum::LONG
    } else {
        TypeNum::DOUBLE
    }
}

fn fits_f32(f: f64) -> bool {
    !f.is_finite() || f.abs() <= f32::MAX as f64
}
