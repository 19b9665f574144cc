//! Data-type descriptors.

use std::fmt;
use std::sync::Arc;

use crate::builtin::builtin_funcs;
use crate::datetime::DatetimeMeta;
use crate::funcs::{ArrFuncs, ItemRefHooks};
use crate::{DtypeError, Result, TypeNum};

/// Byte order of the stored elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Native,
    Swapped,
    /// Single-byte and opaque types, where order has no meaning.
    NotApplicable,
}

impl ByteOrder {
    /// The `<`, `>` or `|` character used in dtype strings.
    pub fn as_char(self) -> char {
        let little = cfg!(target_endian = "little");
        match self {
            ByteOrder::Native if little => '<',
            ByteOrder::Native => '>',
            ByteOrder::Swapped if little => '>',
            ByteOrder::Swapped => '<',
            ByteOrder::NotApplicable => '|',
        }
    }
}

/// A data-type descriptor: tag, layout, optional unit metadata and the
/// capability record used by the selection routines.
#[derive(Clone)]
pub struct Descr {
    type_num: TypeNum,
    kind: char,
    type_char: char,
    byteorder: ByteOrder,
    elsize: usize,
    alignment: usize,
    meta: Option<DatetimeMeta>,
    name: Arc<str>,
    funcs: Arc<ArrFuncs>,
}

fn builtin_name(t: TypeNum) -> &'static str {
    match t {
        TypeNum::BOOL => "bool",
        TypeNum::BYTE => "int8",
        TypeNum::UBYTE => "uint8",
        TypeNum::SHORT => "int16",
        TypeNum::USHORT => "uint16",
        TypeNum::INT => "int32",
        TypeNum::UINT => "uint32",
        TypeNum::LONG | TypeNum::LONGLONG => "int64",
        TypeNum::ULONG | TypeNum::ULONGLONG => "uint64",
        TypeNum::FLOAT => "float32",
        TypeNum::DOUBLE => "float64",
        TypeNum::CFLOAT => "complex64",
        TypeNum::CDOUBLE => "complex128",
        TypeNum::OBJECT => "object",
        TypeNum::STRING => "bytes",
        TypeNum::DATETIME => "datetime64",
        TypeNum::TIMEDELTA => "timedelta64",
        _ => "unknown",
    }
}

impl Descr {
    /// Descriptor of a built-in type in native byte order.
    ///
    /// `STRING` yields a zero-width string type; datetime-family types carry
    /// generic unit metadata.
    pub fn from_type(type_num: TypeNum) -> Result<Self> {
        if !type_num.is_builtin() {
            return Err(DtypeError::UnknownType(type_num));
        }
        let (kind, type_char) = match (type_num.kind(), type_num.type_char()) {
            (Some(k), Some(c)) => (k, c),
            _ => return Err(DtypeError::UnknownType(type_num)),
        };
        let elsize = type_num.builtin_elsize().unwrap_or(0);
        let alignment = match type_num {
            TypeNum::CFLOAT => 4,
            TypeNum::CDOUBLE => 8,
            TypeNum::STRING => 1,
            _ => elsize.max(1),
        };
        let byteorder = if elsize <= 1
            || matches!(type_num, TypeNum::STRING | TypeNum::OBJECT)
        {
            ByteOrder::NotApplicable
        } else {
            ByteOrder::Native
        };
        let meta = type_num.is_datetime().then_some(DatetimeMeta::GENERIC);
        Ok(Self {
            type_num,
            kind,
            type_char,
            byteorder,
            elsize,
            alignment,
            meta,
            name: Arc::from(builtin_name(type_num)),
            funcs: builtin_funcs(type_num),
        })
    }

    /// Descriptor for a built-in type character (`'d'`, `'q'`, `'?'`, ...).
    pub fn from_typecode(c: char) -> Result<Self> {
        let t = TypeNum::from_type_char(c).ok_or(DtypeError::UnknownTypecode(c))?;
        Self::from_type(t)
    }

    /// Fixed-width byte string of `len` bytes.
    pub fn string(len: usize) -> Self {
        let mut d = Self::string_base();
        d.elsize = len;
        d
    }

    fn string_base() -> Self {
        Self {
            type_num: TypeNum::STRING,
            kind: 'S',
            type_char: 'S',
            byteorder: ByteOrder::NotApplicable,
            elsize: 0,
            alignment: 1,
            meta: None,
            name: Arc::from("bytes"),
            funcs: builtin_funcs(TypeNum::STRING),
        }
    }

    /// `datetime64` with the given unit.
    pub fn datetime(meta: DatetimeMeta) -> Self {
        Self::datetime_family(TypeNum::DATETIME, meta)
    }

    /// `timedelta64` with the given unit.
    pub fn timedelta(meta: DatetimeMeta) -> Self {
        Self::datetime_family(TypeNum::TIMEDELTA, meta)
    }

    fn datetime_family(type_num: TypeNum, meta: DatetimeMeta) -> Self {
        let (kind, type_char) = if type_num == TypeNum::DATETIME {
            ('M', 'M')
        } else {
            ('m', 'm')
        };
        Self {
            type_num,
            kind,
            type_char,
            byteorder: ByteOrder::Native,
            elsize: 8,
            alignment: 8,
            meta: Some(meta),
            name: Arc::from(builtin_name(type_num)),
            funcs: builtin_funcs(type_num),
        }
    }

    /// Descriptor for a user-defined type.
    ///
    /// The registry assigns the final tag; see
    /// [`TypeRegistry::register_user_type`](crate::TypeRegistry::register_user_type).
    pub fn user(name: &str, type_char: char, elsize: usize, alignment: usize, funcs: ArrFuncs) -> Self {
        Self {
            type_num: TypeNum(TypeNum::USERDEF),
            kind: 'V',
            type_char,
            byteorder: ByteOrder::NotApplicable,
            elsize,
            alignment: alignment.max(1),
            meta: None,
            name: Arc::from(name),
            funcs: Arc::new(funcs),
        }
    }

    pub(crate) fn with_type_num(mut self, type_num: TypeNum) -> Self {
        self.type_num = type_num;
        self
    }

    /// Same type with a different capability record.
    pub fn with_funcs(mut self, funcs: ArrFuncs) -> Self {
        self.funcs = Arc::new(funcs);
        self
    }

    /// Same type with element reference hooks installed.
    pub fn with_item_refs(mut self, hooks: ItemRefHooks) -> Self {
        let mut funcs = (*self.funcs).clone();
        funcs.item_ref = Some(hooks);
        self.funcs = Arc::new(funcs);
        self
    }

    /// Same type with the requested byte order. Types where byte order has
    /// no meaning are returned unchanged.
    pub fn with_byteorder(&self, order: ByteOrder) -> Self {
        let mut d = self.clone();
        if d.byteorder != ByteOrder::NotApplicable && order != ByteOrder::NotApplicable {
            d.byteorder = order;
        }
        d
    }

    /// Native-byte-order version of this descriptor.
    pub fn ensure_native(&self) -> Self {
        if self.byteorder == ByteOrder::Swapped {
            self.with_byteorder(ByteOrder::Native)
        } else {
            self.clone()
        }
    }

    /// New `timedelta64` carrying a copy of this descriptor's unit metadata.
    pub fn timedelta_with_copied_meta(&self) -> Result<Self> {
        let meta = self.meta.ok_or(DtypeError::MissingDatetimeMeta)?;
        Ok(Self::timedelta(meta))
    }

    #[inline]
    pub fn type_num(&self) -> TypeNum {
        self.type_num
    }

    #[inline]
    pub fn kind(&self) -> char {
        self.kind
    }

    #[inline]
    pub fn type_char(&self) -> char {
        self.type_char
    }

    #[inline]
    pub fn byteorder(&self) -> ByteOrder {
        self.byteorder
    }

    #[inline]
    pub fn elsize(&self) -> usize {
        self.elsize
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn meta(&self) -> Option<&DatetimeMeta> {
        self.meta.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn funcs(&self) -> &ArrFuncs {
        &self.funcs
    }

    /// Elements are stored in native byte order.
    #[inline]
    pub fn is_native(&self) -> bool {
        self.byteorder != ByteOrder::Swapped
    }

    /// Elements hold references that need increment/decrement hooks.
    #[inline]
    pub fn has_refs(&self) -> bool {
        self.funcs.item_ref.is_some()
    }

    /// Width of the byte-swap unit: the whole element, or each half of a
    /// complex number. `None` when swapping never applies.
    pub fn swap_unit(&self) -> Option<usize> {
        if self.byteorder == ByteOrder::NotApplicable || self.elsize <= 1 {
            return None;
        }
        if self.kind == 'c' {
            Some(self.elsize / 2)
        } else {
            Some(self.elsize)
        }
    }

    /// Same type ignoring byte order.
    pub fn equivalent(&self, other: &Descr) -> bool {
        self.type_num == other.type_num && self.elsize == other.elsize && self.meta == other.meta
    }

    pub fn incref_item(&self, item: &[u8]) {
        if let Some(hooks) = &self.funcs.item_ref {
            (hooks.incref)(item);
        }
    }

    pub fn decref_item(&self, item: &[u8]) {
        if let Some(hooks) = &self.funcs.item_ref {
            (hooks.decref)(item);
        }
    }

    /// Short dtype string such as `<f8`, `|b1`, `<M8[s]`.
    pub fn str_code(&self) -> String {
        let meta = self.meta.map(|m| m.to_string()).unwrap_or_default();
        if matches!(self.kind, 'M' | 'm') {
            format!("{}{}8{}", self.byteorder.as_char(), self.kind, meta)
        } else {
            format!("{}{}{}", self.byteorder.as_char(), self.kind, self.elsize)
        }
    }
}

impl PartialEq for Descr {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other) && self.byteorder == other.byteorder
    }
}

impl fmt::Debug for Descr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descr")
            .field("type_num", &self.type_num)
            .field("type_char", &self.type_char)
            .field("byteorder", &self.byteorder)
            .field("elsize", &self.elsize)
            .field("meta", &self.meta)
            .finish()
    }
}

impl fmt::Display for Descr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            'M' | 'm' => write!(f, "dtype('{}')", self.str_code()),
            'S' => write!(f, "dtype('S{}')", self.elsize),
            _ if self.byteorder == ByteOrder::Swapped => write!(f, "dtype('{}')", self.str_code()),
            _ => write!(f, "dtype('{}')", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::DatetimeUnit;

    #[test]
    fn test_display_matches_dtype_repr() {
        assert_eq!(Descr::from_type(TypeNum::DOUBLE).unwrap().to_string(), "dtype('float64')");
        assert_eq!(Descr::from_typecode('?').unwrap().to_string(), "dtype('bool')");
        assert_eq!(Descr::string(4).to_string(), "dtype('S4')");
        let td = Descr::timedelta(DatetimeMeta::unit(DatetimeUnit::Second));
        let expected = if cfg!(target_endian = "little") {
            "dtype('<m8[s]')"
        } else {
            "dtype('>m8[s]')"
        };
        assert_eq!(td.to_string(), expected);
    }

    #[test]
    fn test_swapped_descr_is_not_native() {
        let d = Descr::from_type(TypeNum::DOUBLE).unwrap();
        let s = d.with_byteorder(ByteOrder::Swapped);
        assert!(!s.is_native());
        assert_ne!(d, s);
        assert!(d.equivalent(&s));
        assert_eq!(s.ensure_native(), d);
        let expected = if cfg!(target_endian = "little") { "dtype('>f8')" } else { "dtype('<f8')" };
        assert_eq!(s.to_string(), expected);
    }

    #[test]
    fn test_single_byte_types_ignore_byteorder() {
        let b = Descr::from_type(TypeNum::BYTE).unwrap();
        assert_eq!(b.with_byteorder(ByteOrder::Swapped).byteorder(), ByteOrder::NotApplicable);
        assert_eq!(b.swap_unit(), None);
    }

    #[test]
    fn test_complex_swaps_by_halves() {
        let c = Descr::from_type(TypeNum::CDOUBLE).unwrap();
        assert_eq!(c.swap_unit(), Some(8));
    }

    #[test]
    fn test_timedelta_with_copied_meta() {
        let meta = DatetimeMeta::new(DatetimeUnit::Millisecond, 5);
        let dt = Descr::datetime(meta);
        let td = dt.timedelta_with_copied_meta().unwrap();
        assert_eq!(td.type_num(), TypeNum::TIMEDELTA);
        assert_eq!(td.meta(), Some(&meta));
        let f = Descr::from_type(TypeNum::FLOAT).unwrap();
        assert_eq!(f.timedelta_with_copied_meta(), Err(DtypeError::MissingDatetimeMeta));
    }

    #[test]
    fn test_unknown_type() {
        assert!(Descr::from_type(TypeNum(300)).is_err());
        assert_eq!(Descr::from_typecode('x').unwrap_err(), DtypeError::UnknownTypecode('x'));
    }
}
