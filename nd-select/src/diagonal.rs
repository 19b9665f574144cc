//! Diagonals of stacked matrices.

use nd_array::Array;
use nd_dtype::ClipMode;

use crate::axis::intp_array;
use crate::take::take;
use crate::{Result, SelectError};

/// Number of elements on the `offset` diagonal of an `n1 x n2` matrix.
fn diag_len(n1: usize, n2: usize, offset: isize) -> usize {
    let (n1, n2) = (n1 as isize, n2 as isize);
    let len = if offset < 0 {
        n1.saturating_add(offset).min(n2)
    } else {
        n1.min(n2.saturating_sub(offset))
    };
    len.max(0) as usize
}

/// Diagonal of the matrices spanned by `axis1` and `axis2`.
///
/// Those two axes are removed and a new last axis holding the diagonal is
/// appended. A positive `offset` selects a diagonal above the main one, a
/// negative one below. The result is a copy.
pub fn diagonal(a: &Array, offset: isize, axis1: isize, axis2: isize) -> Result<Array> {
    let n = a.ndim();
    if n < 2 {
        return Err(SelectError::DiagonalRank);
    }
    let nd = n as isize;
    let ax1 = if axis1 < 0 { axis1 + nd } else { axis1 };
    let ax2 = if axis2 < 0 { axis2 + nd } else { axis2 };
    if ax1 == ax2 || !(0..nd).contains(&ax1) || !(0..nd).contains(&ax2) {
        return Err(SelectError::DiagonalAxes {
            axis1: ax1,
            axis2: ax2,
            ndim: n,
        });
    }
    let (ax1, ax2) = (ax1 as usize, ax2 as usize);
    let mut perm: Vec<usize> = (0..n).filter(|&i| i != ax1 && i != ax2).collect();
    perm.extend([ax1, ax2]);
    let view = a.permute(&perm)?;

    if n == 2 {
        let (n1, n2) = (view.dims()[0], view.dims()[1]);
        let count = diag_len(n1, n2, offset);
        let step = n2 as isize + 1;
        // a non-empty diagonal bounds |offset| by the matrix sides
        let start = match (count, offset < 0) {
            (0, _) => 0,
            (_, true) => -(n2 as isize) * offset,
            (_, false) => offset,
        };
        let flat: Vec<isize> = (0..count as isize).map(|k| start + k * step).collect();
        let indices = intp_array(&flat, &[count])?;
        return take(&view.ravel(), &indices, Some(0), None, ClipMode::Raise);
    }

    let rows = view.dims()[0];
    let mut parts = Vec::with_capacity(rows);
    for i in 0..rows {
        let sub = view.index_axis(0, i)?;
        parts.push(diagonal(&sub, offset, nd - 3, nd - 2)?);
    }
    let mut shape = vec![rows];
    shape.extend_from_slice(&view.dims()[1..n - 2]);
    shape.push(diag_len(view.dims()[n - 2], view.dims()[n - 1], offset));
    let bytes: Vec<u8> = parts.iter().flat_map(|p| p.to_bytes()).collect();
    Ok(Array::from_bytes(a.descr().clone(), bytes, &shape)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Array {
        Array::from_vec((0..9i64).collect(), &[3, 3]).unwrap()
    }

    #[test]
    fn test_main_and_offset_diagonals() {
        let a = square();
        let d = |off| diagonal(&a, off, 0, 1).unwrap().to_vec::<i64>().unwrap();
        assert_eq!(d(0), vec![0, 4, 8]);
        assert_eq!(d(1), vec![1, 5]);
        assert_eq!(d(-1), vec![3, 7]);
        assert_eq!(d(-2), vec![6]);
        assert_eq!(d(3), Vec::<i64>::new());
        assert_eq!(d(isize::MIN), Vec::<i64>::new());
        assert_eq!(d(isize::MAX), Vec::<i64>::new());
    }

    #[test]
    fn test_rectangular_and_swapped_axes() {
        let a = Array::from_vec((0..6i32).collect(), &[2, 3]).unwrap();
        assert_eq!(
            diagonal(&a, 1, 0, 1).unwrap().to_vec::<i32>().unwrap(),
            vec![1, 5]
        );
        // axes swapped reads the transpose
        assert_eq!(
            diagonal(&a, 1, 1, 0).unwrap().to_vec::<i32>().unwrap(),
            vec![3]
        );
    }

    #[test]
    fn test_stacked_diagonals() {
        let a = Array::from_vec((0..8i64).collect(), &[2, 2, 2]).unwrap();
        let d = diagonal(&a, 0, 1, 2).unwrap();
        assert_eq!(d.dims(), &[2, 2]);
        assert_eq!(d.to_vec::<i64>().unwrap(), vec![0, 3, 4, 7]);
        let d = diagonal(&a, 0, 0, 2).unwrap();
        assert_eq!(d.to_vec::<i64>().unwrap(), vec![0, 5, 2, 7]);
    }

    #[test]
    fn test_diagonal_errors() {
        let v = Array::from_slice(&[1i64]).unwrap();
        assert_eq!(diagonal(&v, 0, 0, 1).unwrap_err(), SelectError::DiagonalRank);
        assert_eq!(
            diagonal(&square(), 0, 1, -1).unwrap_err().to_string(),
            "axis1(=1) and axis2(=1) must be different and within range (nd=2)"
        );
        assert!(diagonal(&square(), 0, 0, 2).is_err());
    }
}
