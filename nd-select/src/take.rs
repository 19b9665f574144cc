//! Gather by index (`take`) and scatter by index or mask (`put`, `putmask`).

use nd_array::{as_intp, cast_array, cast_array_with, copy_into, Array};
use nd_dtype::{CastOracle, CastingRule, ClipMode, Descr, TypeNum, TypeRegistry};

use crate::axis::{axis_view, incref_all, intp_values, outer_inner};
use crate::{Result, SelectError};

/// Select elements of `a` along `axis` by `indices`.
///
/// The result has shape `a.shape[:axis] + indices.shape + a.shape[axis+1:]`
/// and `a`'s dtype. `axis = None` works on the flattened array. Indices are
/// normalized with `mode`; under [`ClipMode::Raise`] an out-of-range index
/// fails the whole call.
///
/// When `out` is given it must have the result shape; the result is cast
/// into it (only after the selection succeeded) and a view of `out` is
/// returned. `out`'s dtype must cast safely to `a`'s under the built-in
/// rules; use [`take_with`] when user-defined dtypes are involved.
pub fn take(
    a: &Array,
    indices: &Array,
    axis: Option<isize>,
    out: Option<&mut Array>,
    mode: ClipMode,
) -> Result<Array> {
    take_with(a, indices, axis, out, mode, &TypeRegistry::new())
}

/// [`take`] with the `out` dtype checks answered by `oracle`.
pub fn take_with(
    a: &Array,
    indices: &Array,
    axis: Option<isize>,
    out: Option<&mut Array>,
    mode: ClipMode,
    oracle: &dyn CastOracle,
) -> Result<Array> {
    let (src, axis) = axis_view(a, axis)?;
    let src = src.ascontiguous();
    let idx = intp_values(&as_intp(indices)?)?;

    let dims = src.dims();
    let (n, nelem) = outer_inner(dims, axis);
    let max_item = dims[axis];
    let m = idx.len();

    let mut shape = dims[..axis].to_vec();
    shape.extend_from_slice(indices.dims());
    shape.extend_from_slice(&dims[axis + 1..]);

    if let Some(out) = out.as_deref() {
        if out.dims() != shape.as_slice() {
            return Err(SelectError::OutputShape);
        }
        if !oracle.can_cast_type_to(out.descr(), src.descr(), CastingRule::Safe) {
            return Err(SelectError::OutputCast);
        }
    }

    let descr = src.descr().clone();
    let elsize = descr.elsize();
    let chunk = nelem * elsize;
    if max_item == 0 && n * m * nelem != 0 {
        return Err(SelectError::EmptyAxisTake);
    }

    let mut dest = vec![0u8; n * m * chunk];
    let src_bytes = src.contiguous_bytes().unwrap_or_default();
    match descr.funcs().fasttake {
        Some(fast) if !descr.has_refs() => {
            log::trace!("take: typed fast path, {n}x{m} chunks of {nelem}");
            fast(&mut dest, src_bytes, &idx, max_item, n, m, nelem, mode)?;
        }
        _ => {
            log::trace!("take: byte loop, {n}x{m} chunks of {chunk} bytes");
            let mut d = 0;
            for i in 0..n {
                let base = i * max_item * chunk;
                for &j in &idx {
                    let k = mode.apply(j, max_item)?;
                    let s = base + k * chunk;
                    dest[d..d + chunk].copy_from_slice(&src_bytes[s..s + chunk]);
                    d += chunk;
                }
            }
        }
    }
    incref_all(&descr, &dest);
    let result = Array::from_bytes(descr, dest, &shape)?;

    match out {
        Some(out) => {
            let converted = cast_array_with(&result, out.descr(), CastingRule::Unsafe, oracle)?;
            copy_into(out, &converted)?;
            Ok(out.clone())
        }
        None => Ok(result),
    }
}

/// Store `values` into the flat positions `indices` of `a`.
///
/// Values are cast to `a`'s dtype and reused cyclically; empty `values`
/// leave `a` unchanged. Under [`ClipMode::Raise`] a bad index leaves `a`
/// untouched.
///
/// Only `a` itself sees the writes. Storage shared with other arrays (the
/// base of a view, clones) is detached first and keeps its old contents.
pub fn put(a: &mut Array, values: &Array, indices: &Array, mode: ClipMode) -> Result<()> {
    if !a.is_writeable() {
        return Err(SelectError::PutReadOnly);
    }
    let idx = intp_values(&as_intp(indices)?)?;
    let values = cast_array(values, a.descr(), CastingRule::Unsafe)?;
    let nv = values.len();
    if nv == 0 {
        return Ok(());
    }
    let vbytes = values.to_bytes();
    let descr = a.descr().clone();
    let elsize = descr.elsize();
    let refs = descr.has_refs();

    let mut work = a.ascontiguous();
    let max_item = work.len();
    let base = work.offset() as usize;
    let dest = work.data_mut()?;
    for (i, &j) in idx.iter().enumerate() {
        let k = mode.apply(j, max_item)?;
        let s = (i % nv) * elsize;
        let d = base + k * elsize;
        let item = &vbytes[s..s + elsize];
        if refs {
            descr.incref_item(item);
            descr.decref_item(&dest[d..d + elsize]);
        }
        dest[d..d + elsize].copy_from_slice(item);
    }
    commit(a, work)
}

/// Store `values` (cycled) where `mask` is true.
///
/// `mask` is converted to booleans and must have as many elements as `a`.
/// Like [`put`], writes reach `a` only, never arrays sharing its storage.
pub fn putmask(a: &mut Array, values: &Array, mask: &Array) -> Result<()> {
    if !a.is_writeable() {
        return Err(SelectError::PutmaskReadOnly);
    }
    let mask = cast_array(mask, &Descr::from_type(TypeNum::BOOL)?, CastingRule::Unsafe)?;
    let mask = mask.to_vec::<bool>()?;
    if mask.len() != a.len() {
        return Err(SelectError::MaskSize);
    }
    let values = cast_array(values, a.descr(), CastingRule::Unsafe)?;
    let nv = values.len();
    if nv == 0 {
        return Ok(());
    }
    let vbytes = values.to_bytes();
    let descr = a.descr().clone();
    let elsize = descr.elsize();

    let mut work = a.ascontiguous();
    let base = work.offset() as usize;
    let n = work.len();
    let dest = &mut work.data_mut()?[base..base + n * elsize];
    match descr.funcs().fastputmask {
        Some(fast) if !descr.has_refs() => fast(dest, &mask, &vbytes),
        _ => {
            for (i, &m) in mask.iter().enumerate() {
                if !m {
                    continue;
                }
                let s = (i % nv) * elsize;
                let d = i * elsize;
                let item = &vbytes[s..s + elsize];
                descr.incref_item(item);
                descr.decref_item(&dest[d..d + elsize]);
                dest[d..d + elsize].copy_from_slice(item);
            }
        }
    }
    commit(a, work)
}

/// Make the contiguous working copy the contents of `a`.
fn commit(a: &mut Array, work: Array) -> Result<()> {
    if a.is_c_contiguous() {
        *a = work;
        return Ok(());
    }
    copy_into(a, &work)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arr(v: &[i64]) -> Array {
        Array::from_slice(v).unwrap()
    }

    #[test]
    fn test_take_flat() {
        let a = arr(&[10, 20, 30]);
        let r = take(&a, &arr(&[2, 0, 1]), Some(0), None, ClipMode::Raise).unwrap();
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![30, 10, 20]);
    }

    #[test]
    fn test_take_modes() {
        let a = arr(&[10, 20, 30]);
        let err = take(&a, &arr(&[5]), Some(0), None, ClipMode::Raise).unwrap_err();
        assert_eq!(err.to_string(), "index out of range for array");
        for (i, mode, want) in [
            (5, ClipMode::Wrap, 30),
            (5, ClipMode::Clip, 30),
            (-1, ClipMode::Wrap, 30),
            (-1, ClipMode::Clip, 10),
            (-1, ClipMode::Raise, 30),
        ] {
            let r = take(&a, &arr(&[i]), Some(0), None, mode).unwrap();
            assert_eq!(r.to_vec::<i64>().unwrap(), vec![want], "{i} {mode:?}");
        }
    }

    #[test]
    fn test_take_along_axis_shapes() {
        let a = Array::from_vec((0..12i32).collect(), &[3, 4]).unwrap();
        let idx = Array::from_vec(vec![3i64, 0, 1, 1], &[2, 2]).unwrap();
        let r = take(&a, &idx, Some(1), None, ClipMode::Raise).unwrap();
        assert_eq!(r.dims(), &[3, 2, 2]);
        assert_eq!(
            r.to_vec::<i32>().unwrap(),
            vec![3, 0, 1, 1, 7, 4, 5, 5, 11, 8, 9, 9]
        );
        let r = take(&a, &arr(&[11, 0]), None, None, ClipMode::Raise).unwrap();
        assert_eq!(r.to_vec::<i32>().unwrap(), vec![11, 0]);
    }

    #[test]
    fn test_take_from_empty_axis() {
        let a = Array::from_vec(Vec::<f64>::new(), &[0]).unwrap();
        let err = take(&a, &arr(&[0]), Some(0), None, ClipMode::Wrap).unwrap_err();
        assert_eq!(err.to_string(), "cannot do a non-empty take from an empty axes.");
        let r = take(&a, &arr(&[]), Some(0), None, ClipMode::Raise).unwrap();
        assert_eq!(r.dims(), &[0]);
    }

    #[test]
    fn test_take_into_out() {
        let a = Array::from_slice(&[1.5f64, 2.5, 3.5]).unwrap();
        let mut out = Array::zeros(Descr::from_type(TypeNum::FLOAT).unwrap(), &[2]);
        let r = take(&a, &arr(&[2, 2]), Some(0), Some(&mut out), ClipMode::Raise).unwrap();
        let v = out.to_vec::<f32>().unwrap();
        assert_relative_eq!(v[0], 3.5);
        assert_relative_eq!(v[1], 3.5);
        assert_eq!(r.to_vec::<f32>().unwrap(), v);

        let mut bad = Array::zeros(Descr::from_type(TypeNum::FLOAT).unwrap(), &[3]);
        let err = take(&a, &arr(&[0, 1]), Some(0), Some(&mut bad), ClipMode::Raise).unwrap_err();
        assert_eq!(err, SelectError::OutputShape);

        // out's dtype must convert safely to the source dtype
        let mut narrow = Array::zeros(Descr::from_type(TypeNum::DOUBLE).unwrap(), &[1]);
        let ints = arr(&[4, 5]);
        let err = take(&ints, &arr(&[0]), Some(0), Some(&mut narrow), ClipMode::Raise).unwrap_err();
        assert_eq!(err, SelectError::OutputCast);
    }

    /// Accepts only casts between equivalent dtypes.
    struct SameTypeOnly;

    impl CastOracle for SameTypeOnly {
        fn descr_from_type(&self, type_num: TypeNum) -> nd_dtype::Result<Descr> {
            Descr::from_type(type_num)
        }

        fn can_cast_type_to(&self, from: &Descr, to: &Descr, _rule: CastingRule) -> bool {
            from.equivalent(to)
        }

        fn promote_types(&self, a: &Descr, _b: &Descr) -> nd_dtype::Result<Descr> {
            Ok(a.clone())
        }
    }

    #[test]
    fn test_take_with_consults_the_oracle() {
        let a = Array::from_slice(&[1.5f64, 2.5]).unwrap();
        let idx = arr(&[1]);
        // float32 -> float64 passes the built-in rule but not this oracle
        let mut narrow = Array::zeros(Descr::from_type(TypeNum::FLOAT).unwrap(), &[1]);
        take(&a, &idx, Some(0), Some(&mut narrow), ClipMode::Raise).unwrap();
        let err = take_with(&a, &idx, Some(0), Some(&mut narrow), ClipMode::Raise, &SameTypeOnly)
            .unwrap_err();
        assert_eq!(err, SelectError::OutputCast);

        let mut same = Array::zeros(Descr::from_type(TypeNum::DOUBLE).unwrap(), &[1]);
        take_with(&a, &idx, Some(0), Some(&mut same), ClipMode::Raise, &SameTypeOnly).unwrap();
        assert_relative_eq!(same.to_vec::<f64>().unwrap()[0], 2.5);
    }

    #[test]
    fn test_take_raise_leaves_out_untouched() {
        let a = arr(&[1, 2, 3]);
        let mut out = arr(&[7, 7]);
        assert!(take(&a, &arr(&[0, 9]), Some(0), Some(&mut out), ClipMode::Raise).is_err());
        assert_eq!(out.to_vec::<i64>().unwrap(), vec![7, 7]);
    }

    #[test]
    fn test_take_keeps_byte_order() {
        let a = arr(&[1, 256]);
        let swapped = a.descr().with_byteorder(nd_dtype::ByteOrder::Swapped);
        let mut s = Array::zeros(swapped, &[2]);
        copy_into(&mut s, &a).unwrap();
        let r = take(&s, &arr(&[1, 0]), Some(0), None, ClipMode::Raise).unwrap();
        assert!(!r.descr().is_native());
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![256, 1]);
    }

    #[test]
    fn test_put_cycles_values() {
        let mut a = arr(&[0, 0, 0, 0, 0]);
        put(&mut a, &arr(&[7, 8]), &arr(&[0, 2, 4]), ClipMode::Raise).unwrap();
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![7, 0, 8, 0, 7]);
        put(&mut a, &arr(&[]), &arr(&[1]), ClipMode::Raise).unwrap();
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![7, 0, 8, 0, 7]);
        put(&mut a, &arr(&[1]), &arr(&[-1, 6]), ClipMode::Clip).unwrap();
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![1, 0, 8, 0, 1]);
    }

    #[test]
    fn test_put_errors() {
        let mut a = arr(&[0, 0]);
        let err = put(&mut a, &arr(&[1, 2]), &arr(&[0, 5]), ClipMode::Raise).unwrap_err();
        assert_eq!(err.to_string(), "index out of range for array");
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![0, 0]);
        let mut r = arr(&[0]).readonly();
        assert_eq!(
            put(&mut r, &arr(&[1]), &arr(&[0]), ClipMode::Raise),
            Err(SelectError::PutReadOnly)
        );
    }

    #[test]
    fn test_put_into_transposed_view() {
        let a = Array::from_vec((0..6i32).collect(), &[2, 3]).unwrap();
        let mut t = a.permute(&[1, 0]).unwrap();
        put(&mut t, &Array::from_slice(&[-1i32]).unwrap(), &arr(&[1]), ClipMode::Raise).unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![0, -1, 1, 4, 2, 5]);
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_putmask() {
        let mut a = Array::from_slice(&[1.0f64, 2.0, 3.0, 4.0]).unwrap();
        let mask = Array::from_slice(&[true, false, true, true]).unwrap();
        putmask(&mut a, &Array::from_slice(&[9.0f64, 8.0]).unwrap(), &mask).unwrap();
        let v = a.to_vec::<f64>().unwrap();
        for (g, w) in v.iter().zip([9.0, 2.0, 9.0, 8.0]) {
            assert_relative_eq!(*g, w);
        }
        let short = Array::from_slice(&[true]).unwrap();
        assert_eq!(
            putmask(&mut a, &Array::from_slice(&[0.0f64]).unwrap(), &short),
            Err(SelectError::MaskSize)
        );
    }

    #[test]
    fn test_putmask_read_only() {
        let mut r = arr(&[1, 2]).readonly();
        let mask = Array::from_slice(&[true, true]).unwrap();
        assert_eq!(
            putmask(&mut r, &arr(&[0]), &mask),
            Err(SelectError::PutmaskReadOnly)
        );
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_putmask_integer_mask() {
        let mut a = arr(&[1, 2, 3]);
        putmask(&mut a, &arr(&[0]), &Array::from_slice(&[0u8, 3, 0]).unwrap()).unwrap();
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![1, 0, 3]);
    }
}
