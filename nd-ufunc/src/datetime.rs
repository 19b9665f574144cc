//! Resolvers for arithmetic involving datetime (`M8`) and timedelta (`m8`)
//! operands.
//!
//! The output dtype carries unit metadata computed from the inputs, so the
//! dtypes are built here and the loop is looked up by the (possibly
//! rewritten) input tags afterwards. Integer operands of a timedelta are
//! treated as counts of the timedelta's unit.

use nd_dtype::{CastOperand, CastOracle, CastingRule, Descr, TypeNum};

use crate::resolve::{default_type_resolution, find_row, inputs, validate_casting};
use crate::ufunc::{Resolved, TypeTup, Ufunc};
use crate::{Result, UfuncError};

const M: TypeNum = TypeNum::DATETIME;
const TD: TypeNum = TypeNum::TIMEDELTA;

fn int_or_bool(t: TypeNum) -> bool {
    t.is_integer() || t.is_bool()
}

/// Dtypes for the three operands and the input tags to look the loop up by.
struct Plan {
    dtypes: [Descr; 3],
    lookup: [TypeNum; 2],
}

impl Plan {
    fn same(d: Descr, lookup: [TypeNum; 2]) -> Self {
        Self {
            dtypes: [d.clone(), d.clone(), d],
            lookup,
        }
    }
}

type Planner = fn(&Descr, &Descr, &dyn CastOracle) -> Result<Option<Plan>>;

/// Shared driver: fall back to the default resolver when neither input is
/// datetime-like, plan the dtypes, validate, then find the row.
fn resolve_with(
    planner: Planner,
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    let ins = inputs(ufunc, operands)?;
    if ins.len() != 2 {
        return Err(UfuncError::WrongArity {
            name: ufunc.name().to_string(),
            kind: "binary operation",
        });
    }
    let (a, b) = (ins[0].descr(), ins[1].descr());
    if !a.type_num().is_datetime() && !b.type_num().is_datetime() {
        return default_type_resolution(ufunc, casting, operands, type_tup, oracle);
    }
    let plan = planner(a, b, oracle)?.ok_or_else(|| UfuncError::DatetimeOperands {
        name: ufunc.name().to_string(),
        a: a.to_string(),
        b: b.to_string(),
    })?;
    let dtypes = plan.dtypes.to_vec();
    validate_casting(ufunc, casting, operands, &dtypes, oracle)?;
    let inner_loop = find_row(ufunc, &plan.lookup).ok_or_else(|| UfuncError::DatetimeLoopMissing {
        name: ufunc.name().to_string(),
    })?;
    log::debug!(
        "ufunc {}: datetime loop {:?} with dtypes {} {} {}",
        ufunc.name(),
        plan.lookup,
        dtypes[0],
        dtypes[1],
        dtypes[2]
    );
    Ok(Resolved { dtypes, inner_loop })
}

fn plan_add(a: &Descr, b: &Descr, oracle: &dyn CastOracle) -> Result<Option<Plan>> {
    let (t1, t2) = (a.type_num(), b.type_num());
    let plan = match (t1, t2) {
        // m8[A] + m8[B] => m8[gcd(A, B)]
        (TD, TD) => Plan::same(oracle.promote_types(a, b)?, [TD, TD]),
        // m8[A] + M8[B] => M8[gcd(A, B)]
        (TD, M) => {
            let p = oracle.promote_types(a, b)?;
            Plan {
                dtypes: [p.timedelta_with_copied_meta()?, p.clone(), p],
                lookup: [TD, M],
            }
        }
        (TD, t) if int_or_bool(t) => Plan::same(a.ensure_native(), [TD, TD]),
        (M, TD) => {
            let p = oracle.promote_types(a, b)?;
            Plan {
                dtypes: [p.clone(), p.timedelta_with_copied_meta()?, p],
                lookup: [M, TD],
            }
        }
        (M, t) if int_or_bool(t) => {
            let n = a.ensure_native();
            Plan {
                dtypes: [n.clone(), a.timedelta_with_copied_meta()?, n],
                lookup: [M, TD],
            }
        }
        (t, TD) if int_or_bool(t) => Plan::same(b.ensure_native(), [TD, TD]),
        (t, M) if int_or_bool(t) => {
            let n = b.ensure_native();
            Plan {
                dtypes: [b.timedelta_with_copied_meta()?, n.clone(), n],
                lookup: [TD, M],
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(plan))
}

fn plan_subtract(a: &Descr, b: &Descr, oracle: &dyn CastOracle) -> Result<Option<Plan>> {
    let (t1, t2) = (a.type_num(), b.type_num());
    let plan = match (t1, t2) {
        (TD, TD) => Plan::same(oracle.promote_types(a, b)?, [TD, TD]),
        (TD, t) if int_or_bool(t) => Plan::same(a.ensure_native(), [TD, TD]),
        (M, TD) => {
            let p = oracle.promote_types(a, b)?;
            Plan {
                dtypes: [p.clone(), p.timedelta_with_copied_meta()?, p],
                lookup: [M, TD],
            }
        }
        (M, t) if int_or_bool(t) => {
            let n = a.ensure_native();
            Plan {
                dtypes: [n.clone(), a.timedelta_with_copied_meta()?, n],
                lookup: [M, TD],
            }
        }
        // M8[A] - M8[B] => m8[gcd(A, B)]
        (M, M) => {
            let p = oracle.promote_types(a, b)?;
            Plan {
                dtypes: [p.clone(), p.clone(), p.timedelta_with_copied_meta()?],
                lookup: [M, M],
            }
        }
        (t, TD) if int_or_bool(t) => Plan::same(b.ensure_native(), [TD, TD]),
        _ => return Ok(None),
    };
    Ok(Some(plan))
}

fn plan_multiply(a: &Descr, b: &Descr, oracle: &dyn CastOracle) -> Result<Option<Plan>> {
    let (t1, t2) = (a.type_num(), b.type_num());
    let q = oracle.descr_from_type(TypeNum::LONGLONG)?;
    let d = oracle.descr_from_type(TypeNum::DOUBLE)?;
    let plan = match (t1, t2) {
        (TD, t) if int_or_bool(t) => {
            let n = a.ensure_native();
            Plan {
                dtypes: [n.clone(), q, n],
                lookup: [TD, TypeNum::LONGLONG],
            }
        }
        (TD, t) if t.is_float() => {
            let n = a.ensure_native();
            Plan {
                dtypes: [n.clone(), d, n],
                lookup: [TD, TypeNum::DOUBLE],
            }
        }
        (t, TD) if int_or_bool(t) => {
            let n = b.ensure_native();
            Plan {
                dtypes: [q, n.clone(), n],
                lookup: [TypeNum::LONGLONG, TD],
            }
        }
        (t, TD) if t.is_float() => {
            let n = b.ensure_native();
            Plan {
                dtypes: [d, n.clone(), n],
                lookup: [TypeNum::DOUBLE, TD],
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(plan))
}

fn plan_divide(a: &Descr, b: &Descr, oracle: &dyn CastOracle) -> Result<Option<Plan>> {
    let (t1, t2) = (a.type_num(), b.type_num());
    let plan = match (t1, t2) {
        // m8[A] / m8[B] => float64
        (TD, TD) => {
            let p = oracle.promote_types(a, b)?;
            Plan {
                dtypes: [p.clone(), p, oracle.descr_from_type(TypeNum::DOUBLE)?],
                lookup: [TD, TD],
            }
        }
        (TD, t) if t.is_integer() => {
            let n = a.ensure_native();
            Plan {
                dtypes: [n.clone(), oracle.descr_from_type(TypeNum::LONGLONG)?, n],
                lookup: [TD, TypeNum::LONGLONG],
            }
        }
        (TD, t) if t.is_float() => {
            let n = a.ensure_native();
            Plan {
                dtypes: [n.clone(), oracle.descr_from_type(TypeNum::DOUBLE)?, n],
                lookup: [TD, TypeNum::DOUBLE],
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(plan))
}

/// `add` with datetime/timedelta operands.
pub fn addition_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    resolve_with(plan_add, ufunc, casting, operands, type_tup, oracle)
}

/// `subtract` with datetime/timedelta operands. Two datetimes give a
/// timedelta.
pub fn subtraction_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    resolve_with(plan_subtract, ufunc, casting, operands, type_tup, oracle)
}

/// `multiply` of a timedelta by an integer (as `int64`) or a float (as
/// `float64`), in either order.
pub fn multiplication_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    resolve_with(plan_multiply, ufunc, casting, operands, type_tup, oracle)
}

/// `divide` of a timedelta by a timedelta (giving `float64`), an integer or
/// a float.
pub fn division_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    resolve_with(plan_divide, ufunc, casting, operands, type_tup, oracle)
}
