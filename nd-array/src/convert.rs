//! Element conversion between dtypes.

use nd_dtype::{
    CastOperand, CastOracle, CastingRule, DatetimeMeta, Descr, ScalarValue, TypeNum, TypeRegistry,
};

use crate::iter::for_each_segment;
use crate::strided::copy_into;
use crate::{Array, ArrayError, Result};

fn cast_error(from: &Descr, to: &Descr, rule: CastingRule) -> ArrayError {
    ArrayError::Cast {
        from: from.to_string(),
        to: to.to_string(),
        rule,
    }
}

/// Convert `a` to `to` with the built-in casting rules.
pub fn cast_array(a: &Array, to: &Descr, rule: CastingRule) -> Result<Array> {
    cast_array_with(a, to, rule, &TypeRegistry::new())
}

/// Convert `a` to `to`, checking the cast with `oracle` (value-aware for
/// 0-d arrays). Returns `a` itself (sharing storage) when the dtypes are
/// identical; the result is C-contiguous otherwise.
pub fn cast_array_with(
    a: &Array,
    to: &Descr,
    rule: CastingRule,
    oracle: &dyn CastOracle,
) -> Result<Array> {
    if a.descr() == to {
        return Ok(a.clone());
    }
    if !oracle.can_cast_array_to(a, to, rule) {
        return Err(cast_error(a.descr(), to, rule));
    }
    log::trace!("cast {} -> {} over {:?}", a.descr(), to, a.dims());
    let mut out = Array::zeros(to.clone(), a.dims());
    if a.descr().equivalent(to) {
        copy_into(&mut out, a)?;
        return Ok(out);
    }
    convert_elements(&mut out, a).map_err(|_| cast_error(a.descr(), to, rule))?;
    Ok(out)
}

/// Rescale factor between two datetime-family descriptors.
fn datetime_ratio(from: &Descr, to: &Descr) -> Option<(i128, i128)> {
    if !from.type_num().is_datetime() || !to.type_num().is_datetime() {
        return None;
    }
    let fm = from.meta().copied().unwrap_or(DatetimeMeta::GENERIC);
    let tm = to.meta().copied().unwrap_or(DatetimeMeta::GENERIC);
    fm.conversion_ratio(&tm).map(|(n, d)| (n as i128, d as i128))
}

struct Unsupported;

fn convert_elements(out: &mut Array, src: &Array) -> std::result::Result<(), Unsupported> {
    let from = src.descr().clone();
    let to = out.descr().clone();
    let ratio = datetime_ratio(&from, &to);
    let strings = from.type_num() == TypeNum::STRING && to.type_num() == TypeNum::STRING;
    let (src_el, dst_el) = (from.elsize(), to.elsize());
    let dims = out.dims().to_vec();
    let dst_strides = out.strides().to_vec();
    let src_bytes = src.bytes();
    let dst = out.data_mut().map_err(|_| Unsupported)?;

    for_each_segment(
        &dims,
        &[&dst_strides, src.strides()],
        &[0, src.offset()],
        |offsets, len, inner| {
            for k in 0..len as isize {
                let d = (offsets[0] + k * inner[0]) as usize;
                let s = (offsets[1] + k * inner[1]) as usize;
                let item = &src_bytes[s..s + src_el];
                let target = &mut dst[d..d + dst_el];
                if strings {
                    let n = src_el.min(dst_el);
                    target[..n].copy_from_slice(&item[..n]);
                    target[n..].fill(0);
                    continue;
                }
                let mut value = ScalarValue::read(item, &from).ok_or(Unsupported)?;
                if let Some((num, den)) = ratio {
                    value = ScalarValue::Int(value.as_i128() * num / den);
                }
                if !value.write(target, &to) {
                    return Err(Unsupported);
                }
            }
            Ok(())
        },
    )
}

/// Index array: `a` converted to native `intp` under the safe rule.
pub fn as_intp(a: &Array) -> Result<Array> {
    let intp = Descr::from_type(TypeNum::INTP)?;
    let out = cast_array(a, &intp, CastingRule::Safe)?;
    Ok(out.ascontiguous())
}

/// Common dtype of several arrays (scalar-aware), native byte order.
pub fn common_type(arrays: &[&Array]) -> Result<Descr> {
    let ops: Vec<&dyn CastOperand> = arrays.iter().map(|a| *a as &dyn CastOperand).collect();
    Ok(TypeRegistry::new().result_type(&ops)?)
}
