//! Casting rules and the casting oracle.
//!
//! [`CastOracle`] is the seam the ufunc resolvers and selection routines
//! query; [`TypeRegistry`](crate::TypeRegistry) is the default
//! implementation. The free functions here encode the rules for built-in
//! types.

use std::fmt;

use crate::datetime::{gcd_meta, DatetimeMeta};
use crate::scalar::ScalarValue;
use crate::{Descr, DtypeError, Result, TypeNum};

/// How permissive a cast may be. Ordered from strictest to loosest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CastingRule {
    /// Identical types only.
    No,
    /// Identical up to byte order.
    Equiv,
    /// Value-preserving casts.
    #[default]
    Safe,
    /// Safe casts, or casts within a kind (e.g. `float64` to `float32`).
    SameKind,
    /// Any cast.
    Unsafe,
}

impl CastingRule {
    pub fn as_str(self) -> &'static str {
        match self {
            CastingRule::No => "no",
            CastingRule::Equiv => "equiv",
            CastingRule::Safe => "safe",
            CastingRule::SameKind => "same_kind",
            CastingRule::Unsafe => "unsafe",
        }
    }
}

/// Formats as the quoted rule name, e.g. `'same_kind'`.
impl fmt::Display for CastingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.as_str())
    }
}

/// Anything a cast can be asked about: a dtype plus, for 0-d operands,
/// the element value.
pub trait CastOperand {
    fn descr(&self) -> &Descr;

    fn ndim(&self) -> usize;

    /// The single element of a 0-d numeric operand.
    fn scalar_value(&self) -> Option<ScalarValue>;
}

/// A bare dtype behaves like an array operand without a value.
impl CastOperand for Descr {
    fn descr(&self) -> &Descr {
        self
    }

    fn ndim(&self) -> usize {
        1
    }

    fn scalar_value(&self) -> Option<ScalarValue> {
        None
    }
}

/// Casting-safety and promotion queries.
pub trait CastOracle {
    /// Canonical descriptor for a type tag (built-in or registered).
    fn descr_from_type(&self, type_num: TypeNum) -> Result<Descr>;

    /// Type-only cast check.
    fn can_cast_type_to(&self, from: &Descr, to: &Descr, rule: CastingRule) -> bool;

    /// Smallest type both operands cast to safely.
    fn promote_types(&self, a: &Descr, b: &Descr) -> Result<Descr>;

    /// Value-aware cast check.
    ///
    /// For a 0-d numeric operand under a rule looser than `Equiv`, the
    /// smallest type holding its value is tested instead of its own type.
    /// A signed source whose value fits an unsigned type is retried with
    /// the smallest signed type.
    fn can_cast_array_to(&self, op: &dyn CastOperand, to: &Descr, rule: CastingRule) -> bool {
        let from = op.descr();
        if op.ndim() == 0 && rule >= CastingRule::Safe && is_numeric_kind(from.kind()) {
            if let Some(value) = op.scalar_value() {
                let min = value.min_scalar_type();
                if let Ok(d) = self.descr_from_type(min) {
                    if self.can_cast_type_to(&d, to, rule) {
                        return true;
                    }
                }
                if from.type_num().is_signed() && min.is_unsigned() {
                    if let Ok(d) = self.descr_from_type(value.min_signed_scalar_type()) {
                        return self.can_cast_type_to(&d, to, rule);
                    }
                }
                return false;
            }
        }
        self.can_cast_type_to(from, to, rule)
    }

    /// Common type of all operands, with 0-d operands reduced to their
    /// smallest holding type when [`should_use_min_scalar`] says so.
    fn result_type(&self, ops: &[&dyn CastOperand]) -> Result<Descr> {
        let use_min = should_use_min_scalar(ops);
        let any_signed_array = ops
            .iter()
            .any(|op| op.ndim() > 0 && op.descr().kind() == 'i');
        let mut acc: Option<Descr> = None;
        for op in ops {
            let mut d = op.descr().ensure_native();
            if use_min && op.ndim() == 0 && is_numeric_kind(d.kind()) {
                if let Some(value) = op.scalar_value() {
                    let min = if any_signed_array {
                        value.min_signed_scalar_type()
                    } else {
                        value.min_scalar_type()
                    };
                    d = self.descr_from_type(min)?;
                }
            }
            acc = Some(match acc {
                None => d,
                Some(prev) => self.promote_types(&prev, &d)?,
            });
        }
        acc.ok_or(DtypeError::NoOperands)
    }
}

fn is_numeric_kind(kind: char) -> bool {
    matches!(kind, 'b' | 'u' | 'i' | 'f' | 'c')
}

/// Kind ordering used by the scalar-versus-array heuristic:
/// bool 0, integer 1, float and complex 2, everything else 3.
fn simplified_kind_order(kind: char) -> u8 {
    match kind {
        'b' => 0,
        'u' | 'i' => 1,
        'f' | 'c' => 2,
        _ => 3,
    }
}

/// Whether 0-d operands should be cast by value rather than by type.
///
/// Only applies with more than one operand, at least one of which is not
/// 0-d, and when the highest array kind is at least the highest scalar kind.
pub fn should_use_min_scalar(ops: &[&dyn CastOperand]) -> bool {
    if ops.len() <= 1 {
        return false;
    }
    let mut all_scalars = true;
    let mut max_scalar_kind = 0;
    let mut max_array_kind = 0;
    for op in ops {
        let kind = simplified_kind_order(op.descr().kind());
        if op.ndim() == 0 {
            max_scalar_kind = max_scalar_kind.max(kind);
        } else {
            all_scalars = false;
            max_array_kind = max_array_kind.max(kind);
        }
    }
    !all_scalars && max_array_kind >= max_scalar_kind
}

fn canonical(t: TypeNum) -> TypeNum {
    match t {
        TypeNum::LONGLONG => TypeNum::LONG,
        TypeNum::ULONGLONG => TypeNum::ULONG,
        t => t,
    }
}

fn int_size(t: TypeNum) -> usize {
    t.builtin_elsize().unwrap_or(0)
}

/// Safe casts between built-in numeric tags.
fn safe_numeric(from: TypeNum, to: TypeNum) -> bool {
    let (f, t) = (canonical(from), canonical(to));
    if f == t {
        return true;
    }
    if f.is_bool() {
        return t.is_integer() || t.is_float() || t.is_complex() || t == TypeNum::TIMEDELTA;
    }
    if f.is_integer() {
        let fs = int_size(f);
        return match t {
            t if t.is_signed() => {
                let ts = int_size(t);
                if f.is_signed() {
                    ts >= fs
                } else {
                    ts > fs
                }
            }
            t if t.is_unsigned() => f.is_unsigned() && int_size(t) >= fs,
            TypeNum::FLOAT | TypeNum::CFLOAT => fs <= 2,
            TypeNum::DOUBLE | TypeNum::CDOUBLE => true,
            TypeNum::TIMEDELTA => f.is_signed() || fs < 8,
            _ => false,
        };
    }
    matches!(
        (f, t),
        (TypeNum::FLOAT, TypeNum::DOUBLE)
            | (TypeNum::FLOAT, TypeNum::CFLOAT)
            | (TypeNum::FLOAT, TypeNum::CDOUBLE)
            | (TypeNum::DOUBLE, TypeNum::CDOUBLE)
            | (TypeNum::CFLOAT, TypeNum::CDOUBLE)
    )
}

fn safe_cast(from: &Descr, to: &Descr) -> bool {
    let (f, t) = (from.type_num(), to.type_num());
    if !f.is_builtin() || !t.is_builtin() {
        return from.equivalent(to);
    }
    if t == TypeNum::OBJECT {
        return true;
    }
    match (f, t) {
        (TypeNum::STRING, TypeNum::STRING) => to.elsize() >= from.elsize(),
        (TypeNum::DATETIME, TypeNum::DATETIME) | (TypeNum::TIMEDELTA, TypeNum::TIMEDELTA) => {
            let fm = from.meta().copied().unwrap_or(DatetimeMeta::GENERIC);
            let tm = to.meta().copied().unwrap_or(DatetimeMeta::GENERIC);
            fm.divides_into(&tm)
        }
        _ => safe_numeric(f, t),
    }
}

/// Kind rank for same-kind casts: b < u < i < f < c.
fn numeric_kind_rank(kind: char) -> Option<u8> {
    match kind {
        'b' => Some(0),
        'u' => Some(1),
        'i' => Some(2),
        'f' => Some(3),
        'c' => Some(4),
        _ => None,
    }
}

fn same_kind(from: &Descr, to: &Descr) -> bool {
    if !from.type_num().is_builtin() || !to.type_num().is_builtin() {
        return from.equivalent(to);
    }
    match (numeric_kind_rank(from.kind()), numeric_kind_rank(to.kind())) {
        (Some(a), Some(b)) => a <= b,
        _ => from.kind() == to.kind() || to.type_num() == TypeNum::OBJECT,
    }
}

/// Cast check between built-in descriptors under `rule`.
pub fn builtin_can_cast(from: &Descr, to: &Descr, rule: CastingRule) -> bool {
    match rule {
        CastingRule::No => from == to,
        CastingRule::Equiv => from.equivalent(to),
        CastingRule::Safe => from.equivalent(to) || safe_cast(from, to),
        CastingRule::SameKind => {
            from.equivalent(to) || safe_cast(from, to) || same_kind(from, to)
        }
        CastingRule::Unsafe => true,
    }
}

const PROMOTION_LADDER: [TypeNum; 13] = [
    TypeNum::BOOL,
    TypeNum::BYTE,
    TypeNum::UBYTE,
    TypeNum::SHORT,
    TypeNum::USHORT,
    TypeNum::INT,
    TypeNum::UINT,
    TypeNum::LONG,
    TypeNum::ULONG,
    TypeNum::FLOAT,
    TypeNum::DOUBLE,
    TypeNum::CFLOAT,
    TypeNum::CDOUBLE,
];

fn datetime_meta(d: &Descr) -> DatetimeMeta {
    d.meta().copied().unwrap_or(DatetimeMeta::GENERIC)
}

/// Promotion between built-in descriptors. The result is native-order.
pub fn builtin_promote(a: &Descr, b: &Descr) -> Result<Descr> {
    let (a, b) = (a.ensure_native(), b.ensure_native());
    let (ta, tb) = (a.type_num(), b.type_num());
    if ta == tb {
        return match ta {
            TypeNum::STRING => Ok(if a.elsize() >= b.elsize() { a } else { b }),
            TypeNum::DATETIME => Ok(Descr::datetime(gcd_meta(&datetime_meta(&a), &datetime_meta(&b))?)),
            TypeNum::TIMEDELTA => Ok(Descr::timedelta(gcd_meta(&datetime_meta(&a), &datetime_meta(&b))?)),
            _ => Ok(a),
        };
    }
    if ta.is_datetime() && tb.is_datetime() {
        // datetime and timedelta combine to a datetime
        return Ok(Descr::datetime(gcd_meta(&datetime_meta(&a), &datetime_meta(&b))?));
    }
    if safe_cast(&b, &a) {
        return Ok(a);
    }
    if safe_cast(&a, &b) {
        return Ok(b);
    }
    for cand in PROMOTION_LADDER {
        let c = Descr::from_type(cand)?;
        if safe_cast(&a, &c) && safe_cast(&b, &c) {
            return Ok(c);
        }
    }
    Err(DtypeError::InvalidPromotion(a.to_string(), b.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::DatetimeUnit;
    use crate::ByteOrder;

    fn d(t: TypeNum) -> Descr {
        Descr::from_type(t).unwrap()
    }

    #[test]
    fn test_rule_ordering_and_display() {
        assert!(CastingRule::No < CastingRule::Equiv);
        assert!(CastingRule::SameKind < CastingRule::Unsafe);
        assert_eq!(CastingRule::SameKind.to_string(), "'same_kind'");
        assert_eq!(CastingRule::default(), CastingRule::Safe);
    }

    #[test]
    fn test_safe_integer_casts() {
        let rule = CastingRule::Safe;
        assert!(builtin_can_cast(&d(TypeNum::BYTE), &d(TypeNum::LONG), rule));
        assert!(builtin_can_cast(&d(TypeNum::UBYTE), &d(TypeNum::SHORT), rule));
        assert!(!builtin_can_cast(&d(TypeNum::BYTE), &d(TypeNum::UBYTE), rule));
        assert!(!builtin_can_cast(&d(TypeNum::LONG), &d(TypeNum::INT), rule));
        assert!(builtin_can_cast(&d(TypeNum::SHORT), &d(TypeNum::FLOAT), rule));
        assert!(!builtin_can_cast(&d(TypeNum::INT), &d(TypeNum::FLOAT), rule));
        assert!(builtin_can_cast(&d(TypeNum::LONG), &d(TypeNum::DOUBLE), rule));
    }

    #[test]
    fn test_same_kind_allows_downcast_within_kind() {
        let f64_ = d(TypeNum::DOUBLE);
        let f32_ = d(TypeNum::FLOAT);
        assert!(!builtin_can_cast(&f64_, &f32_, CastingRule::Safe));
        assert!(builtin_can_cast(&f64_, &f32_, CastingRule::SameKind));
        assert!(!builtin_can_cast(&f64_, &d(TypeNum::LONG), CastingRule::SameKind));
        assert!(builtin_can_cast(&f64_, &d(TypeNum::LONG), CastingRule::Unsafe));
    }

    #[test]
    fn test_equiv_ignores_byteorder_but_no_does_not() {
        let a = d(TypeNum::DOUBLE);
        let s = a.with_byteorder(ByteOrder::Swapped);
        assert!(!builtin_can_cast(&a, &s, CastingRule::No));
        assert!(builtin_can_cast(&a, &s, CastingRule::Equiv));
    }

    #[test]
    fn test_rules_are_monotone() {
        let rules = [
            CastingRule::No,
            CastingRule::Equiv,
            CastingRule::Safe,
            CastingRule::SameKind,
            CastingRule::Unsafe,
        ];
        for &from in &TypeNum::BUILTINS {
            for &to in &TypeNum::BUILTINS {
                let (a, b) = (d(from), d(to));
                let mut seen = false;
                for rule in rules {
                    let ok = builtin_can_cast(&a, &b, rule);
                    assert!(!seen || ok, "{a} -> {b} lost under {rule}");
                    seen |= ok;
                }
            }
        }
    }

    #[test]
    fn test_promote_types() {
        let p = |a, b| builtin_promote(&d(a), &d(b)).unwrap().type_num();
        assert_eq!(p(TypeNum::BYTE, TypeNum::UBYTE), TypeNum::SHORT);
        assert_eq!(p(TypeNum::LONG, TypeNum::ULONG), TypeNum::DOUBLE);
        assert_eq!(p(TypeNum::INT, TypeNum::FLOAT), TypeNum::DOUBLE);
        assert_eq!(p(TypeNum::CFLOAT, TypeNum::DOUBLE), TypeNum::CDOUBLE);
        assert_eq!(p(TypeNum::BOOL, TypeNum::BOOL), TypeNum::BOOL);
        assert!(builtin_promote(&d(TypeNum::DATETIME), &d(TypeNum::DOUBLE)).is_err());
    }

    #[test]
    fn test_promote_datetime_units() {
        let s = Descr::timedelta(DatetimeMeta::unit(DatetimeUnit::Second));
        let ms = Descr::timedelta(DatetimeMeta::unit(DatetimeUnit::Millisecond));
        let p = builtin_promote(&s, &ms).unwrap();
        assert_eq!(p.meta(), Some(&DatetimeMeta::unit(DatetimeUnit::Millisecond)));
        let dt = Descr::datetime(DatetimeMeta::unit(DatetimeUnit::Day));
        let p = builtin_promote(&s, &dt).unwrap();
        assert_eq!(p.type_num(), TypeNum::DATETIME);
        assert_eq!(p.meta(), Some(&DatetimeMeta::unit(DatetimeUnit::Second)));
        assert!(builtin_can_cast(&s, &ms, CastingRule::Safe));
        assert!(!builtin_can_cast(&ms, &s, CastingRule::Safe));
        assert!(builtin_can_cast(&ms, &s, CastingRule::SameKind));
    }

    #[test]
    fn test_should_use_min_scalar() {
        struct Op(Descr, usize);
        impl CastOperand for Op {
            fn descr(&self) -> &Descr {
                &self.0
            }
            fn ndim(&self) -> usize {
                self.1
            }
            fn scalar_value(&self) -> Option<ScalarValue> {
                None
            }
        }
        let int_arr = Op(d(TypeNum::INT), 1);
        let int_scalar = Op(d(TypeNum::LONG), 0);
        let float_scalar = Op(d(TypeNum::DOUBLE), 0);
        assert!(should_use_min_scalar(&[&int_arr, &int_scalar]));
        assert!(!should_use_min_scalar(&[&int_arr, &float_scalar]));
        assert!(!should_use_min_scalar(&[&int_scalar, &float_scalar]));
        assert!(!should_use_min_scalar(&[&int_arr]));
    }
}
