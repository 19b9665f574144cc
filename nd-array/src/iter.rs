//! C-order segment iteration over one or more strided operands.
//!
//! The walk hands out maximal runs along the innermost axis: the byte
//! offset of the run start for every operand, the run length and the
//! per-operand inner stride. Outer axes advance with a carry-style
//! increment, so no recursion happens in the hot path.

use smallvec::{smallvec, SmallVec};

type SVec<T> = SmallVec<[T; 4]>;

/// Merge adjacent axes that are contiguous (in C order) for every operand,
/// then drop axes of length one.
fn fuse_c_order(dims: &[usize], strides: &[&[isize]]) -> (Vec<usize>, Vec<SVec<isize>>) {
    let n = dims.len();
    let mut fused = dims.to_vec();
    // s[i] == dims[i+1] * s[i+1] lets axis i fold into axis i+1
    for i in (0..n.saturating_sub(1)).rev() {
        let can_merge = strides
            .iter()
            .all(|s| s[i] == fused[i + 1] as isize * s[i + 1]);
        if can_merge {
            fused[i + 1] *= fused[i];
            fused[i] = 1;
        }
    }
    let kept: Vec<usize> = (0..n).filter(|&i| fused[i] != 1).collect();
    if kept.is_empty() {
        return (vec![], vec![SVec::new(); strides.len()]);
    }
    let new_dims = kept.iter().map(|&i| fused[i]).collect();
    let new_strides = strides
        .iter()
        .map(|s| kept.iter().map(|&i| s[i]).collect())
        .collect();
    (new_dims, new_strides)
}

fn walk<E, F>(
    dims: &[usize],
    strides: &[SVec<isize>],
    initial_offsets: &[isize],
    f: &mut F,
) -> Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize], &[usize]) -> Result<(), E>,
{
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let rank = dims.len();
    if rank == 0 {
        let zeros: SVec<isize> = smallvec![0; strides.len()];
        return f(initial_offsets, 1, &zeros, &[]);
    }

    let last = rank - 1;
    let inner: SVec<isize> = strides.iter().map(|s| s[last]).collect();
    let n = dims[last];
    let mut offsets: SVec<isize> = initial_offsets.iter().copied().collect();
    let mut idx = vec![0usize; rank];

    loop {
        f(&offsets, n, &inner, &idx)?;

        // Carry-style increment for outer levels.
        let mut level = last;
        loop {
            if level == 0 {
                return Ok(());
            }
            level -= 1;
            for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                *offset += s[level];
            }
            idx[level] += 1;
            if idx[level] < dims[level] {
                break;
            }
            idx[level] = 0;
            for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                *offset -= dims[level] as isize * s[level];
            }
        }
    }
}

/// Visit every element of a common shape in C order, one innermost run at
/// a time.
///
/// `strides[k]` and `initial_offsets[k]` describe operand `k` in bytes. The
/// callback receives `(offsets, count, inner_strides)`. Contiguous axes are
/// fused first, so runs can span several rows. Empty shapes call nothing; a
/// 0-d shape calls once with `count == 1`.
pub fn for_each_segment<E, F>(
    dims: &[usize],
    strides: &[&[isize]],
    initial_offsets: &[isize],
    mut f: F,
) -> Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<(), E>,
{
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let (fused_dims, fused_strides) = fuse_c_order(dims, strides);
    walk(&fused_dims, &fused_strides, initial_offsets, &mut |o, n, s, _| {
        f(o, n, s)
    })
}

/// Like [`for_each_segment`], without axis fusion, also passing the
/// multi-index of each run's first element.
pub fn for_each_segment_indexed<E, F>(
    dims: &[usize],
    strides: &[&[isize]],
    initial_offsets: &[isize],
    mut f: F,
) -> Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize], &[usize]) -> Result<(), E>,
{
    let strides: Vec<SVec<isize>> = strides.iter().map(|s| s.iter().copied().collect()).collect();
    walk(dims, &strides, initial_offsets, &mut f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_2d_is_one_segment() {
        let mut calls = Vec::new();
        for_each_segment::<(), _>(&[2, 3], &[&[12, 4]], &[0], |o, n, s| {
            calls.push((o[0], n, s[0]));
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, vec![(0, 6, 4)]);
    }

    #[test]
    fn test_transposed_visits_c_order() {
        // 3x2 view of a 2x3 row-major buffer of 4-byte elements
        let mut offsets = Vec::new();
        for_each_segment::<(), _>(&[3, 2], &[&[4, 12]], &[0], |o, n, s| {
            for k in 0..n as isize {
                offsets.push(o[0] + k * s[0]);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(offsets, vec![0, 12, 4, 16, 8, 20]);
    }

    #[test]
    fn test_indexed_reports_run_starts() {
        let mut starts = Vec::new();
        for_each_segment_indexed::<(), _>(&[2, 2, 3], &[&[48, 24, 8]], &[0], |o, n, _, idx| {
            starts.push((idx.to_vec(), o[0], n));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            starts,
            vec![
                (vec![0, 0, 0], 0, 3),
                (vec![0, 1, 0], 24, 3),
                (vec![1, 0, 0], 48, 3),
                (vec![1, 1, 0], 72, 3),
            ]
        );
    }

    #[test]
    fn test_zero_dim_and_empty() {
        let mut count = 0;
        for_each_segment::<(), _>(&[], &[&[], &[]], &[5, 7], |o, n, s| {
            assert_eq!((o, n, s), (&[5isize, 7][..], 1, &[0isize, 0][..]));
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);
        for_each_segment::<(), _>(&[3, 0], &[&[0, 8]], &[0], |_, _, _| {
            panic!("empty shape visited")
        })
        .unwrap();
    }

    #[test]
    fn test_callback_error_stops_walk() {
        let mut seen = 0;
        let r = for_each_segment_indexed(&[4, 2], &[&[16, 8]], &[0], |_, _, _, idx| {
            seen += 1;
            if idx[0] == 1 {
                Err("stop")
            } else {
                Ok(())
            }
        });
        assert_eq!(r, Err("stop"));
        assert_eq!(seen, 2);
    }
}
