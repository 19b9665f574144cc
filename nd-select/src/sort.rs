//! In-place sort, indirect sort and lexicographic indirect sort.
//!
//! All three walk the 1-D lanes along the sort axis. A lane is handed to
//! the dtype's sort routine directly when it is contiguous, aligned and in
//! native byte order; otherwise lanes go through a packed staging buffer.
//! Types without a dedicated routine but with a `compare` entry fall back
//! to a comparison sort over a native copy.

use nd_array::Array;
use nd_dtype::{CompareFn, Descr, SortKind};

use crate::axis::{check_axis, intp_array, intp_descr, restore_axis, write_through, Lanes};
use crate::threading::{for_each_lane, wants_threads};
use crate::{Result, SelectError};

/// Whether lanes of `view` (sort axis last) must be staged.
fn needs_staging(view: &Array, lanes: &Lanes) -> bool {
    !view.is_aligned() || lanes.stride != view.elsize() as isize || !view.descr().is_native()
}

/// Reorder the `elsize`-byte items of `row` with `compare`, unstably.
fn sort_row_by(row: &mut [u8], elsize: usize, compare: CompareFn, descr: &Descr) {
    let n = row.len() / elsize;
    let mut perm: Vec<usize> = (0..n).collect();
    perm.sort_unstable_by(|&i, &j| compare(item(row, i, elsize), item(row, j, elsize), descr));
    let sorted: Vec<u8> = perm
        .iter()
        .flat_map(|&i| item(row, i, elsize).iter().copied())
        .collect();
    row.copy_from_slice(&sorted);
}

#[inline]
fn item(row: &[u8], i: usize, elsize: usize) -> &[u8] {
    &row[i * elsize..(i + 1) * elsize]
}

/// Sort `a` in place along `axis`.
///
/// The sorted values land in `a`'s own storage. When that storage is shared
/// (`a` is a view or a clone) it is detached first, so the other arrays keep
/// their order.
pub fn sort(a: &mut Array, axis: isize, kind: SortKind) -> Result<()> {
    let n = a.ndim();
    if n == 0 || a.len() <= 1 {
        return Ok(());
    }
    let axis = check_axis(axis, n)?;
    if !a.is_writeable() {
        return Err(SelectError::SortReadOnly);
    }
    let descr = a.descr().clone();
    let funcs = descr.funcs();
    let view = a.move_axis_to_end(axis)?;

    let Some(sortfn) = funcs.sort_fn(kind) else {
        let compare = match (kind, funcs.compare) {
            (SortKind::Quicksort, Some(c)) => c,
            _ => return Err(SelectError::SortUnsupported),
        };
        log::trace!("sort: comparison fallback for {descr}");
        let mut work = view.to_native();
        let native = work.descr().clone();
        let elsize = native.elsize();
        let lane_bytes = view.dims()[n - 1] * elsize;
        let (start, len) = (work.offset() as usize, work.len() * elsize);
        let data = &mut work.data_mut()?[start..start + len];
        for_each_lane(data, lane_bytes, false, |_, row| {
            sort_row_by(row, elsize, compare, &native)
        });
        return write_through(a, &view, &work);
    };

    let lanes = Lanes::of(&view)?;
    let elsize = descr.elsize();
    let native = descr.ensure_native();
    let lane_bytes = lanes.len * elsize;
    let threaded = wants_threads(lanes.total(), descr.has_refs());
    let staged = needs_staging(&view, &lanes) || threaded;
    drop(view);
    let data = a.data_mut()?;

    if !staged {
        log::trace!("sort: {} lanes in place", lanes.starts.len());
        for &start in &lanes.starts {
            let s = start as usize;
            sortfn(&mut data[s..s + lane_bytes], &native);
        }
        return Ok(());
    }

    log::trace!("sort: staging {} lanes of {}", lanes.starts.len(), lanes.len);
    let swap = if descr.is_native() { None } else { descr.swap_unit() };
    let mut buf = lanes.gather(data, elsize, swap);
    for_each_lane(&mut buf, lane_bytes, threaded, |_, lane| sortfn(lane, &native));
    lanes.scatter(&mut buf, data, elsize, swap);
    Ok(())
}

/// Indices that sort `a` along `axis`, as an `intp` array of `a`'s shape.
pub fn argsort(a: &Array, axis: isize, kind: SortKind) -> Result<Array> {
    let n = a.ndim();
    if n == 0 || a.len() <= 1 {
        return Ok(Array::zeros(intp_descr()?, a.dims()));
    }
    let axis = check_axis(axis, n)?;
    let descr = a.descr();
    let funcs = descr.funcs();
    let view = a.move_axis_to_end(axis)?;
    let lanes = Lanes::of(&view)?;
    let len = lanes.len;
    let mut perm: Vec<isize> = (0..lanes.starts.len())
        .flat_map(|_| 0..len as isize)
        .collect();

    if let Some(argfn) = funcs.argsort_fn(kind) {
        let elsize = descr.elsize();
        let native = descr.ensure_native();
        let threaded = wants_threads(lanes.total(), descr.has_refs());
        if needs_staging(&view, &lanes) || threaded {
            log::trace!("argsort: staging {} lanes of {}", lanes.starts.len(), len);
            let swap = if descr.is_native() { None } else { descr.swap_unit() };
            let vals = lanes.gather(a.bytes(), elsize, swap);
            let lane_bytes = len * elsize;
            for_each_lane(&mut perm, len, threaded, |i, p| {
                argfn(&vals[i * lane_bytes..(i + 1) * lane_bytes], p, &native)
            });
        } else {
            let bytes = a.bytes();
            for_each_lane(&mut perm, len, false, |i, p| {
                let s = lanes.starts[i] as usize;
                argfn(&bytes[s..s + len * elsize], p, &native)
            });
        }
    } else {
        let compare = match (kind, funcs.compare) {
            (SortKind::Quicksort, Some(c)) => c,
            _ => return Err(SelectError::ArgsortUnsupported),
        };
        log::trace!("argsort: comparison fallback for {descr}");
        let work = view.to_native();
        let native = work.descr().clone();
        let elsize = native.elsize();
        let rows = work.contiguous_bytes().unwrap_or_default();
        for_each_lane(&mut perm, len, false, |i, p| {
            let row = &rows[i * len * elsize..(i + 1) * len * elsize];
            p.sort_unstable_by(|&x, &y| {
                compare(item(row, x as usize, elsize), item(row, y as usize, elsize), &native)
            });
        });
    }

    let result = intp_array(&perm, view.dims())?;
    Ok(restore_axis(&result, axis)?.ascontiguous())
}

/// Indirect stable sort on several keys.
///
/// Within every lane along `axis` the indices are ordered by the last key,
/// ties broken by the key before it, and so on. Every key must have the
/// same shape and a merge-sort `argsort` routine.
pub fn lexsort(keys: &[Array], axis: isize) -> Result<Array> {
    let first = keys.first().ok_or(SelectError::NoKeys)?;
    for (i, k) in keys.iter().enumerate() {
        if i > 0 && k.dims() != first.dims() {
            return Err(SelectError::KeyShape);
        }
        if k.descr().funcs().argsort_fn(SortKind::Mergesort).is_none() {
            return Err(SelectError::MergesortUnavailable(i));
        }
    }
    let n = first.ndim();
    if n == 0 || first.len() == 1 {
        return Ok(Array::zeros(intp_descr()?, first.dims()));
    }
    let axis = check_axis(axis, n)?;

    let views = keys
        .iter()
        .map(|k| k.move_axis_to_end(axis))
        .collect::<nd_array::Result<Vec<_>>>()?;
    let key_lanes = views.iter().map(Lanes::of).collect::<Result<Vec<Lanes>>>()?;
    let len = key_lanes[0].len;
    let nlanes = key_lanes[0].starts.len();
    let mut perm: Vec<isize> = (0..nlanes).flat_map(|_| 0..len as isize).collect();

    let mut staged: Vec<Vec<u8>> = Vec::with_capacity(keys.len());
    for (k, lanes) in keys.iter().zip(&key_lanes) {
        let d = k.descr();
        let swap = if d.is_native() { None } else { d.swap_unit() };
        staged.push(lanes.gather(k.bytes(), d.elsize(), swap));
    }
    let natives: Vec<Descr> = keys.iter().map(|k| k.descr().ensure_native()).collect();
    let argfns: Vec<_> = keys
        .iter()
        .filter_map(|k| k.descr().funcs().argsort_fn(SortKind::Mergesort))
        .collect();
    let threaded = wants_threads(nlanes * len, keys.iter().any(|k| k.descr().has_refs()));
    log::trace!("lexsort: {} keys over {} lanes of {}", keys.len(), nlanes, len);

    for_each_lane(&mut perm, len, threaded, |i, p| {
        for ((vals, native), argfn) in staged.iter().zip(&natives).zip(&argfns) {
            let lane_bytes = len * native.elsize();
            argfn(&vals[i * lane_bytes..(i + 1) * lane_bytes], p, native);
        }
    });

    let result = intp_array(&perm, views[0].dims())?;
    Ok(restore_axis(&result, axis)?.ascontiguous())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cmp::Ordering;
    use nd_dtype::{ArrFuncs, ByteOrder, NativeType, TypeNum};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn arr(v: &[i64]) -> Array {
        Array::from_slice(v).unwrap()
    }

    #[test]
    fn test_sort_every_kind() {
        for kind in SortKind::ALL {
            let mut a = Array::from_slice(&[3.0f64, -1.0, 2.5, f64::NAN, 0.0]).unwrap();
            sort(&mut a, -1, kind).unwrap();
            let v = a.to_vec::<f64>().unwrap();
            for (g, w) in v.iter().zip([-1.0, 0.0, 2.5, 3.0]) {
                assert_relative_eq!(*g, w);
            }
            assert!(v[4].is_nan());
        }
    }

    #[test]
    fn test_sort_along_leading_axis() {
        let mut a = Array::from_vec(vec![3i32, 1, 2, 0, 5, 4], &[2, 3]).unwrap();
        sort(&mut a, 0, SortKind::Mergesort).unwrap();
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![0, 1, 2, 3, 5, 4]);
        sort(&mut a, 1, SortKind::Heapsort).unwrap();
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sort_byte_swapped() {
        let native = arr(&[300, -2, 7]);
        let mut a = Array::zeros(native.descr().with_byteorder(ByteOrder::Swapped), &[3]);
        nd_array::copy_into(&mut a, &native).unwrap();
        sort(&mut a, 0, SortKind::Quicksort).unwrap();
        assert!(!a.descr().is_native());
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![-2, 7, 300]);
    }

    #[test]
    fn test_sort_checks() {
        let mut r = arr(&[2, 1]).readonly();
        assert_eq!(
            sort(&mut r, 0, SortKind::Quicksort),
            Err(SelectError::SortReadOnly)
        );
        let mut one = arr(&[1]).readonly();
        sort(&mut one, 0, SortKind::Quicksort).unwrap();
        let mut a = arr(&[2, 1]);
        assert_eq!(
            sort(&mut a, 1, SortKind::Quicksort),
            Err(SelectError::AxisOutOfBounds(1))
        );
    }

    #[test]
    fn test_compare_only_types() {
        let d = Descr::string(2);
        let mut a = Array::from_bytes(d, b"zzaamm".to_vec(), &[3]).unwrap();
        assert_eq!(
            sort(&mut a, 0, SortKind::Mergesort),
            Err(SelectError::SortUnsupported)
        );
        let idx = argsort(&a, 0, SortKind::Quicksort).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![1, 2, 0]);
        assert_eq!(
            argsort(&a, 0, SortKind::Heapsort).unwrap_err().to_string(),
            "requested sort not available for type"
        );
        sort(&mut a, 0, SortKind::Quicksort).unwrap();
        assert_eq!(a.to_bytes(), b"aammzz".to_vec());
        let cmp = a.descr().funcs().compare.unwrap();
        assert_eq!(cmp(b"aa", b"mm", a.descr()), Ordering::Less);
    }

    #[test]
    fn test_no_capability() {
        let d = Descr::user("opaque", 'V', 4, 4, ArrFuncs::default());
        let mut a = Array::from_bytes(d, vec![0u8; 8], &[2]).unwrap();
        assert_eq!(
            sort(&mut a, 0, SortKind::Quicksort).unwrap_err().to_string(),
            "desired sort not supported for this type"
        );
        assert_eq!(
            argsort(&a, 0, SortKind::Quicksort).unwrap_err(),
            SelectError::ArgsortUnsupported
        );
    }

    #[test]
    fn test_argsort_agrees_with_sort() {
        let mut rng = StdRng::seed_from_u64(42);
        let values: Vec<i32> = (0..4 * 37).map(|_| rng.gen_range(-100..100)).collect();
        let a = Array::from_vec(values, &[4, 37]).unwrap();
        for axis in [0isize, 1] {
            for kind in SortKind::ALL {
                let idx = argsort(&a, axis, kind).unwrap();
                assert_eq!(idx.dims(), a.dims());
                let mut sorted = a.clone();
                sort(&mut sorted, axis, kind).unwrap();
                let taken: Vec<i32> = (0..4)
                    .flat_map(|i| (0..37).map(move |j| (i, j)))
                    .map(|(i, j)| {
                        let k = idx.get::<i64>(&[i, j]).unwrap() as usize;
                        if axis == 0 {
                            a.get::<i32>(&[k, j]).unwrap()
                        } else {
                            a.get::<i32>(&[i, k]).unwrap()
                        }
                    })
                    .collect();
                assert_eq!(taken, sorted.to_vec::<i32>().unwrap());
            }
        }
    }

    #[test]
    fn test_argsort_is_permutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let values: Vec<f32> = (0..200).map(|_| rng.gen::<f32>()).collect();
        let a = Array::from_slice(&values).unwrap();
        let mut idx = argsort(&a, 0, SortKind::Heapsort)
            .unwrap()
            .to_vec::<i64>()
            .unwrap();
        idx.sort_unstable();
        assert_eq!(idx, (0..200).collect::<Vec<i64>>());
    }

    #[test]
    fn test_argsort_strided_and_swapped() {
        let base = arr(&[5, 0, 3, 0, 1, 0]);
        let every_other = Array::from_parts(
            base.descr().clone(),
            base.storage().clone(),
            &[3],
            &[16],
            0,
        )
        .unwrap();
        let idx = argsort(&every_other, 0, SortKind::Mergesort).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![2, 1, 0]);

        let mut swapped = Array::zeros(base.descr().with_byteorder(ByteOrder::Swapped), &[6]);
        nd_array::copy_into(&mut swapped, &base).unwrap();
        let idx = argsort(&swapped, 0, SortKind::Mergesort).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![1, 3, 5, 4, 2, 0]);
    }

    #[test]
    fn test_argsort_degenerate() {
        let s = Array::scalar(3.0f64).unwrap();
        let idx = argsort(&s, 0, SortKind::Quicksort).unwrap();
        assert_eq!(idx.dims(), &[] as &[usize]);
        assert_eq!(idx.descr().type_num(), TypeNum::INTP);
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![0]);
    }

    #[test]
    fn test_lexsort_last_key_primary() {
        let surnames = Array::from_slice(&[3i32, 1, 3, 2]).unwrap();
        let first = Array::from_slice(&[0i32, 9, 1, 4]).unwrap();
        // primary key is the last one
        let idx = lexsort(&[first.clone(), surnames.clone()], 0).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![1, 3, 0, 2]);
        let idx = lexsort(&[surnames, first], -1).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_lexsort_along_axis_zero() {
        let k = Array::from_vec(vec![2i64, 0, 1, 1, 0, 2], &[3, 2]).unwrap();
        let idx = lexsort(&[k], 0).unwrap();
        assert_eq!(idx.dims(), &[3, 2]);
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![2, 0, 1, 1, 0, 2]);
    }

    #[test]
    fn test_lexsort_errors() {
        assert_eq!(lexsort(&[], 0).unwrap_err(), SelectError::NoKeys);
        let a = arr(&[1, 2]);
        let b = arr(&[1, 2, 3]);
        assert_eq!(
            lexsort(&[a.clone(), b], 0).unwrap_err().to_string(),
            "all keys need to be the same shape"
        );
        let s = Array::from_bytes(Descr::string(1), b"ab".to_vec(), &[2]).unwrap();
        assert_eq!(
            lexsort(&[a, s], 0).unwrap_err().to_string(),
            "merge sort not available for item 1"
        );
        let one = Array::scalar(1i64).unwrap();
        assert_eq!(lexsort(&[one], 5).unwrap().to_vec::<i64>().unwrap(), vec![0]);
    }

    #[test]
    fn test_native_helpers() {
        let d = Descr::from_type(TypeNum::LONG).unwrap();
        let mut row = vec![0u8; 24];
        for (c, v) in row.chunks_exact_mut(8).zip([3i64, 1, 2]) {
            v.write(c);
        }
        sort_row_by(&mut row, 8, d.funcs().compare.unwrap(), &d);
        let v: Vec<i64> = row.chunks_exact(8).map(i64::read).collect();
        assert_eq!(v, vec![1, 2, 3]);
    }
}
