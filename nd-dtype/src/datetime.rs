//! Datetime and timedelta unit metadata.
//!
//! The resolvers never compute unit arithmetic themselves; they ask
//! [`gcd_meta`] for the common unit and copy the resulting metadata.

use std::fmt;

use crate::{DtypeError, Result};

/// Base time unit of a datetime-family dtype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatetimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    Picosecond,
    Femtosecond,
    Attosecond,
    /// Unit-less; adopts the unit of whatever it is combined with.
    Generic,
}

impl DatetimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DatetimeUnit::Year => "Y",
            DatetimeUnit::Month => "M",
            DatetimeUnit::Week => "W",
            DatetimeUnit::Day => "D",
            DatetimeUnit::Hour => "h",
            DatetimeUnit::Minute => "m",
            DatetimeUnit::Second => "s",
            DatetimeUnit::Millisecond => "ms",
            DatetimeUnit::Microsecond => "us",
            DatetimeUnit::Nanosecond => "ns",
            DatetimeUnit::Picosecond => "ps",
            DatetimeUnit::Femtosecond => "fs",
            DatetimeUnit::Attosecond => "as",
            DatetimeUnit::Generic => "generic",
        }
    }

    pub fn is_nonlinear(self) -> bool {
        matches!(self, DatetimeUnit::Year | DatetimeUnit::Month)
    }

    /// Length of one unit in attoseconds, for the linear units.
    fn attoseconds(self) -> Option<u128> {
        const SEC: u128 = 1_000_000_000_000_000_000;
        let v = match self {
            DatetimeUnit::Week => 7 * 86_400 * SEC,
            DatetimeUnit::Day => 86_400 * SEC,
            DatetimeUnit::Hour => 3_600 * SEC,
            DatetimeUnit::Minute => 60 * SEC,
            DatetimeUnit::Second => SEC,
            DatetimeUnit::Millisecond => SEC / 1_000,
            DatetimeUnit::Microsecond => SEC / 1_000_000,
            DatetimeUnit::Nanosecond => SEC / 1_000_000_000,
            DatetimeUnit::Picosecond => SEC / 1_000_000_000_000,
            DatetimeUnit::Femtosecond => SEC / 1_000_000_000_000_000,
            DatetimeUnit::Attosecond => 1,
            _ => return None,
        };
        Some(v)
    }
}

/// Unit metadata: `num` multiples of `base` (e.g. `[10ms]`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DatetimeMeta {
    pub base: DatetimeUnit,
    pub num: u32,
}

impl DatetimeMeta {
    pub const GENERIC: DatetimeMeta = DatetimeMeta {
        base: DatetimeUnit::Generic,
        num: 1,
    };

    pub fn new(base: DatetimeUnit, num: u32) -> Self {
        Self {
            base,
            num: num.max(1),
        }
    }

    pub fn unit(base: DatetimeUnit) -> Self {
        Self::new(base, 1)
    }

    pub fn is_generic(&self) -> bool {
        self.base == DatetimeUnit::Generic
    }

    fn months(&self) -> Option<u128> {
        match self.base {
            DatetimeUnit::Year => Some(12 * self.num as u128),
            DatetimeUnit::Month => Some(self.num as u128),
            _ => None,
        }
    }

    fn span_attoseconds(&self) -> Option<u128> {
        self.base.attoseconds().map(|a| a * self.num as u128)
    }

    /// Exact ratio `(num, den)` such that a value in `self` equals
    /// `value * num / den` in `to`. `None` when one unit is nonlinear and
    /// the other linear.
    pub fn conversion_ratio(&self, to: &DatetimeMeta) -> Option<(u128, u128)> {
        if self.is_generic() || to.is_generic() || self == to {
            return Some((1, 1));
        }
        let (a, b) = match (self.months(), to.months()) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => (self.span_attoseconds()?, to.span_attoseconds()?),
            _ => return None,
        };
        let g = gcd(a, b);
        Some((a / g, b / g))
    }

    /// Whether every value of `self` is exactly representable in `to`.
    pub fn divides_into(&self, to: &DatetimeMeta) -> bool {
        matches!(self.conversion_ratio(to), Some((_, 1)))
    }
}

impl fmt::Display for DatetimeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_generic() {
            return Ok(());
        }
        if self.num == 1 {
            write!(f, "[{}]", self.base.as_str())
        } else {
            write!(f, "[{}{}]", self.num, self.base.as_str())
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Greatest common divisor of two unit metadata values.
///
/// Both linear: the finer base with the gcd of the two spans. Both
/// nonlinear: months (or years if both are years). Mixing a nonlinear and
/// a linear unit is an error.
pub fn gcd_meta(a: &DatetimeMeta, b: &DatetimeMeta) -> Result<DatetimeMeta> {
    if a.is_generic() {
        return Ok(*b);
    }
    if b.is_generic() {
        return Ok(*a);
    }
    if a.base.is_nonlinear() != b.base.is_nonlinear() {
        return Err(DtypeError::IncompatibleDatetimeUnits(*a, *b));
    }
    if a.base.is_nonlinear() {
        if a.base == DatetimeUnit::Year && b.base == DatetimeUnit::Year {
            return Ok(DatetimeMeta::new(
                DatetimeUnit::Year,
                gcd(a.num as u128, b.num as u128) as u32,
            ));
        }
        let (ma, mb) = match (a.months(), b.months()) {
            (Some(ma), Some(mb)) => (ma, mb),
            _ => return Err(DtypeError::IncompatibleDatetimeUnits(*a, *b)),
        };
        return Ok(DatetimeMeta::new(DatetimeUnit::Month, gcd(ma, mb) as u32));
    }

    let fine = a.base.max(b.base);
    let (sa, sb, unit) = match (a.span_attoseconds(), b.span_attoseconds(), fine.attoseconds()) {
        (Some(sa), Some(sb), Some(unit)) => (sa, sb, unit),
        _ => return Err(DtypeError::IncompatibleDatetimeUnits(*a, *b)),
    };
    let num = gcd(sa, sb) / unit;
    Ok(DatetimeMeta::new(fine, num as u32))
}
