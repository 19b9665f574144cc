//! Element repetition along an axis.

use nd_array::{as_intp, Array};

use crate::axis::{axis_view, incref_all, intp_values, outer_inner};
use crate::{Result, SelectError};

/// Repeat each element of `a` along `axis`.
///
/// `repeats` is either a single count applied to every element or a 1-D
/// array with one count per position of the axis. `axis = None` works on
/// the flattened array.
pub fn repeat(a: &Array, repeats: &Array, axis: Option<isize>) -> Result<Array> {
    if repeats.ndim() > 1 {
        return Err(SelectError::TooDeep);
    }
    let counts = intp_values(&as_intp(repeats)?)?;
    let (src, axis) = axis_view(a, axis)?;
    let src = src.ascontiguous();
    let dims = src.dims();
    let n = dims[axis];

    let scalar = repeats.ndim() == 0;
    if !scalar && counts.len() != n {
        return Err(SelectError::RepeatsLength);
    }
    if counts.iter().any(|&c| c < 0) {
        return Err(SelectError::NegativeCount);
    }
    let total = if scalar {
        counts[0] as usize * n
    } else {
        counts.iter().map(|&c| c as usize).sum()
    };

    let (n_outer, nelem) = outer_inner(dims, axis);
    let chunk = nelem * src.elsize();
    let mut shape = dims.to_vec();
    shape[axis] = total;

    let src_bytes = src.contiguous_bytes().unwrap_or_default();
    let mut dest = Vec::with_capacity(n_outer * total * chunk);
    for i in 0..n_outer {
        for j in 0..n {
            let times = if scalar { counts[0] } else { counts[j] };
            let s = (i * n + j) * chunk;
            for _ in 0..times {
                dest.extend_from_slice(&src_bytes[s..s + chunk]);
            }
        }
    }
    log::trace!("repeat: {n} -> {total} along axis {axis}");
    incref_all(src.descr(), &dest);
    Ok(Array::from_bytes(src.descr().clone(), dest, &shape)?)
}
