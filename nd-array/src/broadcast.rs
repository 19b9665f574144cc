//! Shape broadcasting.
//!
//! Shapes are aligned at their trailing axes; per axis the sizes must be
//! equal or one of them must be 1, and the result takes the non-1 size.

use crate::{Array, ArrayError, Result};

/// Common broadcast shape of several shapes.
pub fn broadcast_shape(dims_list: &[&[usize]]) -> Result<Vec<usize>> {
    let rank = dims_list.iter().map(|d| d.len()).max().unwrap_or(0);
    let mut out = vec![1usize; rank];
    for dims in dims_list {
        let pad = rank - dims.len();
        for (d, &n) in dims.iter().enumerate() {
            let target = &mut out[pad + d];
            if n == 1 {
                continue;
            }
            if *target == 1 {
                *target = n;
            } else if *target != n {
                return Err(ArrayError::Broadcast);
            }
        }
    }
    Ok(out)
}

/// Strides of `src` viewed with the (larger or equal rank) `target_dims`:
/// new leading axes and stretched axes get stride 0.
pub(crate) fn promote_strides(
    target_dims: &[usize],
    src_dims: &[usize],
    src_strides: &[isize],
) -> Result<Vec<isize>> {
    if src_strides.len() != src_dims.len() {
        return Err(ArrayError::StrideLengthMismatch);
    }
    if src_dims.len() > target_dims.len() {
        return Err(ArrayError::RankMismatch(src_dims.len(), target_dims.len()));
    }
    let pad = target_dims.len() - src_dims.len();
    let mut out = vec![0isize; target_dims.len()];
    for (d, (&n, &s)) in src_dims.iter().zip(src_strides.iter()).enumerate() {
        let t = target_dims[pad + d];
        if n == t {
            out[pad + d] = s;
        } else if n == 1 {
            out[pad + d] = 0;
        } else {
            return Err(ArrayError::Broadcast);
        }
    }
    Ok(out)
}

/// Broadcast every array to the common shape.
pub fn broadcast_arrays(arrays: &[&Array]) -> Result<Vec<Array>> {
    let dims: Vec<&[usize]> = arrays.iter().map(|a| a.dims()).collect();
    let shape = broadcast_shape(&dims)?;
    arrays.iter().map(|a| a.broadcast_to(&shape)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shape_aligns_trailing_axes() {
        assert_eq!(broadcast_shape(&[&[4, 1], &[3]]).unwrap(), vec![4, 3]);
        assert_eq!(broadcast_shape(&[&[], &[2, 2]]).unwrap(), vec![2, 2]);
        assert_eq!(broadcast_shape(&[&[2], &[3]]), Err(ArrayError::Broadcast));
        assert_eq!(broadcast_shape(&[]).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn test_promote_strides() {
        assert_eq!(promote_strides(&[4, 3], &[3], &[8]).unwrap(), vec![0, 8]);
        assert_eq!(promote_strides(&[4, 3], &[4, 1], &[8, 8]).unwrap(), vec![8, 0]);
        assert!(promote_strides(&[3], &[4, 3], &[24, 8]).is_err());
    }

    #[test]
    fn test_broadcast_arrays() {
        let a = Array::from_slice(&[1i64, 2, 3]).unwrap();
        let b = Array::from_vec(vec![10i64, 20], &[2, 1]).unwrap();
        let out = broadcast_arrays(&[&a, &b]).unwrap();
        assert_eq!(out[0].to_vec::<i64>().unwrap(), vec![1, 2, 3, 1, 2, 3]);
        assert_eq!(out[1].to_vec::<i64>().unwrap(), vec![10, 10, 10, 20, 20, 20]);
    }
}
