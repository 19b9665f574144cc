use std::cmp::Ordering;

use nd_array::{cast_array, common_type, Array};
use nd_dtype::CastingRule;

use crate::axis::intp_array;
use crate::{Result, SelectError};

/// Which end of a run of equal elements [`searchsorted`] reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SearchSide {
    /// First index `i` with `key <= a[i]`.
    #[default]
    Left,
    /// First index `i` with `key < a[i]`.
    Right,
}

/// Insertion points of the keys `v` into the sorted 1-D array `a`.
///
/// Both are converted to their common dtype first. The result is an `intp`
/// array of `v`'s shape; a key beyond every element maps to `a.len()`.
pub fn searchsorted(a: &Array, v: &Array, side: SearchSide) -> Result<Array> {
    let descr = common_type(&[a, v])?;
    match a.ndim() {
        0 => return Err(SelectError::TooShallow),
        1 => {}
        _ => return Err(SelectError::TooDeep),
    }
    let compare = descr.funcs().compare.ok_or(SelectError::CompareUnsupported)?;
    let sorted = cast_array(a, &descr, CastingRule::Safe)?.to_native();
    let keys = cast_array(v, &descr, CastingRule::Safe)?.to_native();
    let native = sorted.descr().clone();
    let elsize = native.elsize();

    let arr = sorted.contiguous_bytes().unwrap_or_default();
    let nelts = sorted.len();
    let at = |i: usize| &arr[i * elsize..(i + 1) * elsize];
    // Right moves past equal elements, Left stops at them
    let go_right = |ord: Ordering| match side {
        SearchSide::Left => ord == Ordering::Less,
        SearchSide::Right => ord != Ordering::Greater,
    };

    let key_bytes = keys.contiguous_bytes().unwrap_or_default();
    let mut out = Vec::with_capacity(keys.len());
    for k in 0..keys.len() {
        let key = &key_bytes[k * elsize..(k + 1) * elsize];
        let (mut lo, mut hi) = (0usize, nelts);
        while lo < hi {
            let mid = lo + ((hi - lo) >> 1);
            if go_right(compare(at(mid), key, &native)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        out.push(lo as isize);
    }
    log::trace!("searchsorted: {} keys into {} elements", keys.len(), nelts);
    intp_array(&out, v.dims())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_dtype::Descr;

    fn arr(v: &[i64]) -> Array {
        Array::from_slice(v).unwrap()
    }

    fn search(keys: &[i64], side: SearchSide) -> Vec<i64> {
        searchsorted(&arr(&[1, 3, 3, 5]), &arr(keys), side)
            .unwrap()
            .to_vec::<i64>()
            .unwrap()
    }

    #[test]
    fn test_left_and_right() {
        assert_eq!(search(&[3], SearchSide::Left), vec![1]);
        assert_eq!(search(&[3], SearchSide::Right), vec![3]);
        assert_eq!(search(&[0, 6], SearchSide::Left), vec![0, 4]);
        assert_eq!(search(&[0, 6], SearchSide::Right), vec![0, 4]);
        assert_eq!(search(&[2, 4], SearchSide::Right), vec![1, 3]);
    }

    #[test]
    fn test_keys_keep_their_shape_and_promote() {
        let a = Array::from_slice(&[0.5f64, 1.5, 2.5]).unwrap();
        let v = Array::from_vec(vec![1i32, 2, 3, 0], &[2, 2]).unwrap();
        let r = searchsorted(&a, &v, SearchSide::Left).unwrap();
        assert_eq!(r.dims(), &[2, 2]);
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![1, 2, 3, 0]);
        let s = searchsorted(&a, &Array::scalar(1.5f64).unwrap(), SearchSide::Right).unwrap();
        assert_eq!(s.dims(), &[] as &[usize]);
        assert_eq!(s.to_vec::<i64>().unwrap(), vec![2]);
    }

    #[test]
    fn test_strings_and_errors() {
        let a = Array::from_bytes(Descr::string(1), b"acx".to_vec(), &[3]).unwrap();
        let v = Array::from_bytes(Descr::string(1), b"b".to_vec(), &[1]).unwrap();
        let r = searchsorted(&a, &v, SearchSide::Left).unwrap();
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![1]);

        let flat = arr(&[1, 2]);
        let deep = Array::from_vec(vec![1i64; 4], &[2, 2]).unwrap();
        assert_eq!(
            searchsorted(&deep, &flat, SearchSide::Left).unwrap_err(),
            SelectError::TooDeep
        );
        let zero_d = Array::scalar(1i64).unwrap();
        assert_eq!(
            searchsorted(&zero_d, &flat, SearchSide::Left).unwrap_err(),
            SelectError::TooShallow
        );
    }
}
