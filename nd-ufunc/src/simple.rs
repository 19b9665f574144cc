//! Resolvers for ufuncs whose loops all share one type across operands.
//!
//! These promote the inputs first and then look the row up by that type,
//! instead of searching every row. User-defined and object inputs go
//! through [`default_type_resolution`] instead.

use nd_dtype::{CastOperand, CastOracle, CastingRule, Descr, TypeNum};

use crate::resolve::{default_type_resolution, inputs, validate_casting};
use crate::ufunc::{Resolved, TypeSpec, TypeTup, Ufunc};
use crate::{Result, UfuncError};

fn needs_default(ins: &[&dyn CastOperand]) -> bool {
    ins.iter().any(|op| {
        let t = op.descr().type_num();
        t.is_user_defined() || t.is_object()
    })
}

/// Outcome of reading an optional `(dtype,)` type tuple.
enum Requested {
    Promote,
    Dtype(Descr),
    Fallback,
}

fn requested_dtype(type_tup: Option<&TypeTup>) -> Result<Requested> {
    match type_tup {
        None => Ok(Requested::Promote),
        Some(TypeTup::Tuple(items)) if items.len() == 1 => match &items[0] {
            TypeSpec::Descr(d) => Ok(Requested::Dtype(d.ensure_native())),
            TypeSpec::Code(_) => Err(UfuncError::RequireDtype),
        },
        Some(_) => Ok(Requested::Fallback),
    }
}

/// Loop of the first row whose leading tag is `type_num`.
fn lookup_first(ufunc: &Ufunc, type_num: TypeNum) -> Result<Resolved> {
    if type_num.is_user_defined() {
        return Err(UfuncError::UserTypeFromPromotion);
    }
    (0..ufunc.ntypes())
        .find(|&i| ufunc.row(i)[0] == type_num)
        .map(|i| Resolved {
            dtypes: Vec::new(),
            inner_loop: ufunc.inner_loop(i).clone(),
        })
        .ok_or_else(|| UfuncError::NotSupported {
            name: ufunc.name().to_string(),
        })
}

fn check_arity(ufunc: &Ufunc, nin: usize, kind: &'static str) -> Result<()> {
    if ufunc.nin() != nin || ufunc.nout() != 1 {
        return Err(UfuncError::WrongArity {
            name: ufunc.name().to_string(),
            kind,
        });
    }
    Ok(())
}

/// Two inputs promoted to a common type, boolean output.
pub fn simple_binary_comparison_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    check_arity(ufunc, 2, "binary comparison")?;
    let ins = inputs(ufunc, operands)?;
    if needs_default(&ins) {
        log::debug!("ufunc {}: comparison falls back to default resolution", ufunc.name());
        return default_type_resolution(ufunc, casting, operands, type_tup, oracle);
    }
    let common = match requested_dtype(type_tup)? {
        Requested::Promote => oracle.result_type(&ins)?.ensure_native(),
        Requested::Dtype(d) => d,
        Requested::Fallback => {
            return default_type_resolution(ufunc, casting, operands, type_tup, oracle)
        }
    };
    let dtypes = vec![common.clone(), common, oracle.descr_from_type(TypeNum::BOOL)?];
    validate_casting(ufunc, casting, operands, &dtypes, oracle)?;
    let mut found = lookup_first(ufunc, dtypes[0].type_num())?;
    found.dtypes = dtypes;
    Ok(found)
}

/// One input, output of the same type (metadata included).
pub fn simple_unary_operation_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    check_arity(ufunc, 1, "unary operation")?;
    let ins = inputs(ufunc, operands)?;
    if needs_default(&ins) {
        log::debug!("ufunc {}: unary falls back to default resolution", ufunc.name());
        return default_type_resolution(ufunc, casting, operands, type_tup, oracle);
    }
    let dtype = match requested_dtype(type_tup)? {
        Requested::Promote => ins[0].descr().ensure_native(),
        Requested::Dtype(d) => d,
        Requested::Fallback => {
            return default_type_resolution(ufunc, casting, operands, type_tup, oracle)
        }
    };
    let dtypes = vec![dtype.clone(), dtype];
    validate_casting(ufunc, casting, operands, &dtypes, oracle)?;
    let mut found = lookup_first(ufunc, dtypes[0].type_num())?;
    found.dtypes = dtypes;
    Ok(found)
}

/// Two inputs and the output all of the promoted input type.
pub fn simple_binary_operation_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    check_arity(ufunc, 2, "binary operation")?;
    let ins = inputs(ufunc, operands)?;
    if needs_default(&ins) {
        log::debug!("ufunc {}: binary falls back to default resolution", ufunc.name());
        return default_type_resolution(ufunc, casting, operands, type_tup, oracle);
    }
    let common = match requested_dtype(type_tup)? {
        Requested::Promote => oracle.result_type(&ins)?.ensure_native(),
        Requested::Dtype(d) => d,
        Requested::Fallback => {
            return default_type_resolution(ufunc, casting, operands, type_tup, oracle)
        }
    };
    let dtypes = vec![common.clone(), common.clone(), common];
    validate_casting(ufunc, casting, operands, &dtypes, oracle)?;
    let mut found = lookup_first(ufunc, dtypes[0].type_num())?;
    found.dtypes = dtypes;
    Ok(found)
}

/// Complex inputs map to a real output, so they use the row search;
/// everything else resolves like a unary operation.
pub fn absolute_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    let ins = inputs(ufunc, operands)?;
    if ins[0].descr().type_num().is_complex() {
        default_type_resolution(ufunc, casting, operands, type_tup, oracle)
    } else {
        simple_unary_operation_type_resolution(ufunc, casting, operands, type_tup, oracle)
    }
}

/// Unary resolution where any input cast is allowed: only the input's type
/// matters, not its values.
pub fn ones_like_type_resolution(
    ufunc: &Ufunc,
    _casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    simple_unary_operation_type_resolution(ufunc, CastingRule::Unsafe, operands, type_tup, oracle)
}
