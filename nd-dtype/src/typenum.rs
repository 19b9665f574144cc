//! Numeric type tags.
//!
//! Tags below [`TypeNum::NTYPES`] are built-in and carry a fixed type
//! character, kind and element size. Tags at or above [`TypeNum::USERDEF`]
//! are handed out by the registry for user-defined types.

use std::fmt;

/// A numeric type tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeNum(pub u16);

impl TypeNum {
    pub const BOOL: TypeNum = TypeNum(0);
    pub const BYTE: TypeNum = TypeNum(1);
    pub const UBYTE: TypeNum = TypeNum(2);
    pub const SHORT: TypeNum = TypeNum(3);
    pub const USHORT: TypeNum = TypeNum(4);
    pub const INT: TypeNum = TypeNum(5);
    pub const UINT: TypeNum = TypeNum(6);
    pub const LONG: TypeNum = TypeNum(7);
    pub const ULONG: TypeNum = TypeNum(8);
    pub const LONGLONG: TypeNum = TypeNum(9);
    pub const ULONGLONG: TypeNum = TypeNum(10);
    pub const FLOAT: TypeNum = TypeNum(11);
    pub const DOUBLE: TypeNum = TypeNum(12);
    pub const CFLOAT: TypeNum = TypeNum(13);
    pub const CDOUBLE: TypeNum = TypeNum(14);
    pub const OBJECT: TypeNum = TypeNum(15);
    pub const STRING: TypeNum = TypeNum(16);
    pub const DATETIME: TypeNum = TypeNum(17);
    pub const TIMEDELTA: TypeNum = TypeNum(18);

    /// Number of built-in type tags.
    pub const NTYPES: u16 = 19;

    /// First tag handed out to user-defined types.
    pub const USERDEF: u16 = 256;

    /// Pointer-sized signed integer used for index arrays.
    pub const INTP: TypeNum = TypeNum::LONG;

    /// Every built-in tag, in tag order.
    pub const BUILTINS: [TypeNum; 19] = [
        TypeNum::BOOL,
        TypeNum::BYTE,
        TypeNum::UBYTE,
        TypeNum::SHORT,
        TypeNum::USHORT,
        TypeNum::INT,
        TypeNum::UINT,
        TypeNum::LONG,
        TypeNum::ULONG,
        TypeNum::LONGLONG,
        TypeNum::ULONGLONG,
        TypeNum::FLOAT,
        TypeNum::DOUBLE,
        TypeNum::CFLOAT,
        TypeNum::CDOUBLE,
        TypeNum::OBJECT,
        TypeNum::STRING,
        TypeNum::DATETIME,
        TypeNum::TIMEDELTA,
    ];

    #[inline]
    pub fn is_builtin(self) -> bool {
        self.0 < Self::NTYPES
    }

    #[inline]
    pub fn is_user_defined(self) -> bool {
        self.0 >= Self::USERDEF
    }

    pub fn is_bool(self) -> bool {
        self == TypeNum::BOOL
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            TypeNum::BYTE | TypeNum::SHORT | TypeNum::INT | TypeNum::LONG | TypeNum::LONGLONG
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            TypeNum::UBYTE | TypeNum::USHORT | TypeNum::UINT | TypeNum::ULONG | TypeNum::ULONGLONG
        )
    }

    /// Signed or unsigned integer (bool excluded).
    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(self) -> bool {
        matches!(self, TypeNum::FLOAT | TypeNum::DOUBLE)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, TypeNum::CFLOAT | TypeNum::CDOUBLE)
    }

    pub fn is_object(self) -> bool {
        self == TypeNum::OBJECT
    }

    /// Datetime or timedelta.
    pub fn is_datetime(self) -> bool {
        matches!(self, TypeNum::DATETIME | TypeNum::TIMEDELTA)
    }

    /// Kind character of a built-in tag (`None` for user-defined tags).
    pub fn kind(self) -> Option<char> {
        let kind = match self {
            TypeNum::BOOL => 'b',
            t if t.is_signed() => 'i',
            t if t.is_unsigned() => 'u',
            t if t.is_float() => 'f',
            t if t.is_complex() => 'c',
            TypeNum::OBJECT => 'O',
            TypeNum::STRING => 'S',
            TypeNum::DATETIME => 'M',
            TypeNum::TIMEDELTA => 'm',
            _ => return None,
        };
        Some(kind)
    }

    /// Type character of a built-in tag.
    pub fn type_char(self) -> Option<char> {
        TYPE_CHARS.get(self.0 as usize).copied()
    }

    /// Built-in tag for a type character.
    pub fn from_type_char(c: char) -> Option<TypeNum> {
        TYPE_CHARS
            .iter()
            .position(|&tc| tc == c)
            .map(|i| TypeNum(i as u16))
    }

    /// Fixed element size of a built-in tag; `None` for flexible and user types.
    pub fn builtin_elsize(self) -> Option<usize> {
        let size = match self {
            TypeNum::BOOL | TypeNum::BYTE | TypeNum::UBYTE => 1,
            TypeNum::SHORT | TypeNum::USHORT => 2,
            TypeNum::INT | TypeNum::UINT | TypeNum::FLOAT => 4,
            TypeNum::LONG
            | TypeNum::ULONG
            | TypeNum::LONGLONG
            | TypeNum::ULONGLONG
            | TypeNum::DOUBLE
            | TypeNum::CFLOAT
            | TypeNum::OBJECT
            | TypeNum::DATETIME
            | TypeNum::TIMEDELTA => 8,
            TypeNum::CDOUBLE => 16,
            _ => return None,
        };
        Some(size)
    }
}

const TYPE_CHARS: [char; 19] = [
    '?', 'b', 'B', 'h', 'H', 'i', 'I', 'l', 'L', 'q', 'Q', 'f', 'd', 'F', 'D', 'O', 'S', 'M', 'm',
];

impl fmt::Display for TypeNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_char() {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "#{}", self.0),
        }
    }
}
