//! Axis normalization and lane geometry shared by the routines.

use nd_array::{for_each_segment, strided::copy_strided, strided::swap_strided, Array};
use nd_dtype::{Descr, NativeType, TypeNum};

use crate::{Result, SelectError};

/// Normalize a possibly negative axis against `ndim`.
pub(crate) fn check_axis(axis: isize, ndim: usize) -> Result<usize> {
    let n = ndim as isize;
    let a = if axis < 0 { axis + n } else { axis };
    if a < 0 || a >= n {
        return Err(SelectError::AxisOutOfBounds(axis));
    }
    Ok(a as usize)
}

/// The array the routine works on and the normalized axis.
///
/// `None` flattens in C order and uses axis 0; a 0-d array is viewed as
/// shape `(1,)`.
pub(crate) fn axis_view(a: &Array, axis: Option<isize>) -> Result<(Array, usize)> {
    match axis {
        None => Ok((a.ravel(), 0)),
        Some(axis) if a.ndim() == 0 => Ok((a.ravel(), check_axis(axis, 1)?)),
        Some(axis) => {
            let axis = check_axis(axis, a.ndim())?;
            Ok((a.clone(), axis))
        }
    }
}

/// Products of the dims before and after `axis`.
pub(crate) fn outer_inner(dims: &[usize], axis: usize) -> (usize, usize) {
    let outer = dims[..axis].iter().product();
    let inner = dims[axis + 1..].iter().product();
    (outer, inner)
}

pub(crate) fn intp_descr() -> Result<Descr> {
    Ok(Descr::from_type(TypeNum::INTP)?)
}

/// Native `intp` values in C order.
pub(crate) fn intp_values(a: &Array) -> Result<Vec<isize>> {
    let v = a.to_vec::<i64>()?;
    Ok(v.into_iter().map(|x| x as isize).collect())
}

/// Contiguous `intp` array over `values`.
pub(crate) fn intp_array(values: &[isize], dims: &[usize]) -> Result<Array> {
    let mut bytes = vec![0u8; values.len() * 8];
    for (chunk, &v) in bytes.chunks_exact_mut(8).zip(values) {
        (v as i64).write(chunk);
    }
    Ok(Array::from_bytes(intp_descr()?, bytes, dims)?)
}

/// Increment every element of a freshly built result that holds references.
pub(crate) fn incref_all(descr: &Descr, bytes: &[u8]) {
    let elsize = descr.elsize();
    if !descr.has_refs() || elsize == 0 {
        return;
    }
    for item in bytes.chunks_exact(elsize) {
        descr.incref_item(item);
    }
}

/// Starts of the 1-D lanes along the last axis of `view`, in C order of the
/// remaining axes, with the lane length and byte stride.
pub(crate) struct Lanes {
    pub starts: Vec<isize>,
    pub len: usize,
    pub stride: isize,
}

impl Lanes {
    pub(crate) fn of(view: &Array) -> Result<Lanes> {
        let n = view.ndim();
        let (outer_dims, len, stride) = match n {
            0 => (&[][..], 1, 0),
            _ => (&view.dims()[..n - 1], view.dims()[n - 1], view.strides()[n - 1]),
        };
        let outer_strides = &view.strides()[..n.saturating_sub(1)];
        let mut starts = Vec::with_capacity(outer_dims.iter().product());
        for_each_segment::<SelectError, _>(outer_dims, &[outer_strides], &[view.offset()], |o, cnt, s| {
            for k in 0..cnt as isize {
                starts.push(o[0] + k * s[0]);
            }
            Ok(())
        })?;
        Ok(Lanes { starts, len, stride })
    }

    /// Total number of elements.
    pub(crate) fn total(&self) -> usize {
        self.starts.len() * self.len
    }

    /// Copy every lane into one packed buffer, swapping to native order
    /// when `swap` is set.
    pub(crate) fn gather(&self, bytes: &[u8], elsize: usize, swap: Option<usize>) -> Vec<u8> {
        let lane_bytes = self.len * elsize;
        let mut buf = vec![0u8; self.starts.len() * lane_bytes];
        for (i, &start) in self.starts.iter().enumerate() {
            let off = (i * lane_bytes) as isize;
            copy_strided(&mut buf, off, elsize as isize, bytes, start, self.stride, self.len, elsize);
            if let Some(unit) = swap {
                swap_strided(&mut buf, off, elsize as isize, self.len, elsize, unit);
            }
        }
        buf
    }

    /// Inverse of [`Lanes::gather`].
    pub(crate) fn scatter(&self, buf: &mut [u8], dest: &mut [u8], elsize: usize, swap: Option<usize>) {
        let lane_bytes = self.len * elsize;
        for (i, &start) in self.starts.iter().enumerate() {
            let off = (i * lane_bytes) as isize;
            if let Some(unit) = swap {
                swap_strided(buf, off, elsize as isize, self.len, elsize, unit);
            }
            copy_strided(dest, start, self.stride, buf, off, elsize as isize, self.len, elsize);
        }
    }
}

/// Permute an array whose last axis was moved there from `axis` back into
/// the original axis order.
pub(crate) fn restore_axis(a: &Array, axis: usize) -> Result<Array> {
    let n = a.ndim();
    let mut perm: Vec<usize> = (0..n).filter(|&i| i != axis).collect();
    perm.push(axis);
    let mut inverse = vec![0; n];
    for (j, &p) in perm.iter().enumerate() {
        inverse[p] = j;
    }
    Ok(a.permute(&inverse)?)
}

/// Write the C-order contents of `src` into `dest` through the geometry of
/// `view`, a view over `dest`'s storage. Byte order is converted when
/// `dest` is not native and `src` is.
pub(crate) fn write_through(dest: &mut Array, view: &Array, src: &Array) -> Result<()> {
    let elsize = dest.elsize();
    let swap = match (dest.descr().is_native(), src.descr().is_native()) {
        (false, true) | (true, false) => dest.descr().swap_unit(),
        _ => None,
    };
    let dims = view.dims().to_vec();
    let strides = view.strides().to_vec();
    let src_bytes = src.bytes();
    let data = dest.data_mut()?;
    for_each_segment::<SelectError, _>(
        &dims,
        &[&strides, src.strides()],
        &[view.offset(), src.offset()],
        |o, n, s| {
            copy_strided(data, o[0], s[0], src_bytes, o[1], s[1], n, elsize);
            if let Some(unit) = swap {
                swap_strided(data, o[0], s[0], n, elsize, unit);
            }
            Ok(())
        },
    )
}
