//! Byte-level copy and swap helpers over strided buffers.

use nd_dtype::swap_item;

use crate::iter::for_each_segment;
use crate::{Array, ArrayError, Result};

/// Copy `count` items of `elsize` bytes between strided positions.
///
/// Offsets and strides are in bytes.
#[allow(clippy::too_many_arguments)]
pub fn copy_strided(
    dst: &mut [u8],
    dst_offset: isize,
    dst_stride: isize,
    src: &[u8],
    src_offset: isize,
    src_stride: isize,
    count: usize,
    elsize: usize,
) {
    if count == 0 || elsize == 0 {
        return;
    }
    let e = elsize as isize;
    if dst_stride == e && src_stride == e {
        let (d, s) = (dst_offset as usize, src_offset as usize);
        let n = count * elsize;
        dst[d..d + n].copy_from_slice(&src[s..s + n]);
        return;
    }
    let (mut d, mut s) = (dst_offset, src_offset);
    for _ in 0..count {
        let (du, su) = (d as usize, s as usize);
        dst[du..du + elsize].copy_from_slice(&src[su..su + elsize]);
        d += dst_stride;
        s += src_stride;
    }
}

/// Reverse each `unit`-byte group of `count` strided items in place.
pub fn swap_strided(
    data: &mut [u8],
    offset: isize,
    stride: isize,
    count: usize,
    elsize: usize,
    unit: usize,
) {
    let mut o = offset;
    for _ in 0..count {
        let start = o as usize;
        swap_item(&mut data[start..start + elsize], unit);
        o += stride;
    }
}

/// Packed C-order copy of the element bytes of `src`.
pub(crate) fn gather_c_order(src: &Array) -> Vec<u8> {
    let elsize = src.elsize();
    let mut out = Vec::with_capacity(src.len() * elsize);
    let bytes = src.bytes();
    let descr = src.descr();
    let refs = descr.has_refs();
    let _ = for_each_segment::<(), _>(src.dims(), &[src.strides()], &[src.offset()], |o, n, s| {
        let mut off = o[0];
        for _ in 0..n {
            let start = off as usize;
            let item = &bytes[start..start + elsize];
            if refs {
                descr.incref_item(item);
            }
            out.extend_from_slice(item);
            off += s[0];
        }
        Ok(())
    });
    out
}

/// Copy `src` into `dest` element by element. Shapes must match and the
/// dtypes must be equivalent; a byte-order difference is swapped on the way.
pub fn copy_into(dest: &mut Array, src: &Array) -> Result<()> {
    if dest.ndim() != src.ndim() {
        return Err(ArrayError::RankMismatch(dest.ndim(), src.ndim()));
    }
    if dest.dims() != src.dims() {
        return Err(ArrayError::ShapeMismatch(
            dest.dims().to_vec(),
            src.dims().to_vec(),
        ));
    }
    if !dest.descr().equivalent(src.descr()) {
        return Err(ArrayError::TypeMismatch {
            requested: src.descr().type_num(),
            actual: dest.descr().type_num(),
        });
    }
    let descr = dest.descr().clone();
    let swap = if descr.is_native() != src.descr().is_native() {
        descr.swap_unit()
    } else {
        None
    };
    let elsize = descr.elsize();
    let dims = dest.dims().to_vec();
    let dst_strides = dest.strides().to_vec();
    let dst_offset = dest.offset();
    let src_bytes = src.bytes();
    let dst = dest.data_mut()?;

    for_each_segment(
        &dims,
        &[&dst_strides, src.strides()],
        &[dst_offset, src.offset()],
        |offsets, len, inner| {
            if descr.has_refs() {
                for k in 0..len as isize {
                    let d = (offsets[0] + k * inner[0]) as usize;
                    let s = (offsets[1] + k * inner[1]) as usize;
                    descr.incref_item(&src_bytes[s..s + elsize]);
                    descr.decref_item(&dst[d..d + elsize]);
                }
            }
            copy_strided(dst, offsets[0], inner[0], src_bytes, offsets[1], inner[1], len, elsize);
            if let Some(unit) = swap {
                swap_strided(dst, offsets[0], inner[0], len, elsize, unit);
            }
            Ok(())
        },
    )
}
