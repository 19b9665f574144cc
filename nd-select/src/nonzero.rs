//! Truth-value queries: counting, locating and compressing.

use std::sync::Arc;

use nd_array::{for_each_segment, for_each_segment_indexed, Array};
use nd_dtype::{ClipMode, Descr, NonzeroFn};

use crate::axis::intp_descr;
use crate::take::take;
use crate::{Result, SelectError};

fn nonzero_fn(descr: &Descr) -> Result<NonzeroFn> {
    descr.funcs().nonzero.ok_or(SelectError::NonzeroUnsupported)
}

/// Number of elements of `a` whose truth value is set.
pub fn count_nonzero(a: &Array) -> Result<usize> {
    let truth = nonzero_fn(a.descr())?;
    if a.is_empty() {
        return Ok(0);
    }
    let descr = a.descr();
    let elsize = descr.elsize();
    if elsize == 0 {
        return Ok(0);
    }
    if let Some(bytes) = a.contiguous_bytes() {
        log::trace!("count_nonzero: single run of {}", a.len());
        return Ok(bytes.chunks_exact(elsize).filter(|&it| truth(it, descr)).count());
    }
    let bytes = a.bytes();
    let mut count = 0;
    for_each_segment::<SelectError, _>(a.dims(), &[a.strides()], &[a.offset()], |o, n, s| {
        for k in 0..n as isize {
            let at = (o[0] + k * s[0]) as usize;
            if truth(&bytes[at..at + elsize], descr) {
                count += 1;
            }
        }
        Ok(())
    })?;
    Ok(count)
}

/// Indices of the elements of `a` whose truth value is set, one `intp`
/// array per dimension (a 0-d array counts as shape `(1,)`).
///
/// For two or more dimensions the arrays are strided views into one shared
/// `(count, ndim)` matrix of coordinates in C order.
pub fn nonzero(a: &Array) -> Result<Vec<Array>> {
    let truth = nonzero_fn(a.descr())?;
    let count = count_nonzero(a)?;
    let ndim = a.ndim().max(1);
    let descr = a.descr();
    let elsize = descr.elsize();
    let bytes = a.bytes();
    let mut coords: Vec<i64> = Vec::with_capacity(count * ndim);

    if a.ndim() <= 1 {
        let (stride, len) = match a.ndim() {
            0 => (0, 1),
            _ => (a.strides()[0], a.dims()[0]),
        };
        for j in 0..len {
            let at = (a.offset() + j as isize * stride) as usize;
            if elsize > 0 && truth(&bytes[at..at + elsize], descr) {
                coords.push(j as i64);
            }
        }
    } else {
        for_each_segment_indexed::<SelectError, _>(
            a.dims(),
            &[a.strides()],
            &[a.offset()],
            |o, n, s, idx| {
                for k in 0..n {
                    let at = (o[0] + k as isize * s[0]) as usize;
                    if elsize > 0 && truth(&bytes[at..at + elsize], descr) {
                        coords.extend(idx[..ndim - 1].iter().map(|&i| i as i64));
                        coords.push((idx[ndim - 1] + k) as i64);
                    }
                }
                Ok(())
            },
        )?;
    }

    let mut raw = vec![0u8; coords.len() * 8];
    for (chunk, c) in raw.chunks_exact_mut(8).zip(&coords) {
        chunk.copy_from_slice(&c.to_ne_bytes());
    }
    let intp = intp_descr()?;
    if ndim == 1 {
        return Ok(vec![Array::from_bytes(intp, raw, &[count])?]);
    }
    let storage = Arc::new(raw);
    (0..ndim)
        .map(|i| {
            Array::from_parts(
                intp.clone(),
                storage.clone(),
                &[count],
                &[(ndim * 8) as isize],
                (i * 8) as isize,
            )
            .map_err(SelectError::from)
        })
        .collect()
}

/// Select the slices of `a` along `axis` where `condition` is true.
///
/// `condition` must be 1-D; entries past its end count as false, while a
/// true entry past the end of the axis is an index error.
pub fn compress(
    a: &Array,
    condition: &Array,
    axis: Option<isize>,
    out: Option<&mut Array>,
) -> Result<Array> {
    if condition.ndim() != 1 {
        return Err(SelectError::ConditionRank);
    }
    let picked = nonzero(condition)?;
    take(a, &picked[0], axis, out, ClipMode::Raise)
}
