//! The strided byte array type.

use std::fmt;
use std::sync::Arc;

use nd_dtype::{swap_item, CastOperand, Descr, NativeType, ScalarValue, TypeNum};

use crate::broadcast::promote_strides;
use crate::strided::gather_c_order;
use crate::{ArrayError, Result};

/// Validate that every element addressed by `(dims, strides, offset)` lies
/// inside a buffer of `len` bytes.
fn validate_bounds(
    len: usize,
    elsize: usize,
    dims: &[usize],
    strides: &[isize],
    offset: isize,
) -> Result<()> {
    if dims.len() != strides.len() {
        return Err(ArrayError::StrideLengthMismatch);
    }
    // Empty array - no access needed
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(ArrayError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(ArrayError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(ArrayError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 {
        return Err(ArrayError::OffsetOverflow);
    }
    if max_offset as usize + elsize > len {
        return Err(ArrayError::OffsetOverflow);
    }
    Ok(())
}

/// Row-major (C order) byte strides for `dims` and element size `elsize`.
pub fn row_major_strides(dims: &[usize], elsize: usize) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![elsize as isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1].max(1) as isize;
    }
    strides
}

/// Tag that decides the Rust storage type of an element.
fn storage_tag(t: TypeNum) -> TypeNum {
    match t {
        TypeNum::LONGLONG | TypeNum::DATETIME | TypeNum::TIMEDELTA => TypeNum::LONG,
        TypeNum::ULONGLONG => TypeNum::ULONG,
        t => t,
    }
}

/// A dtype descriptor over shared byte storage with byte strides.
///
/// Cloning and view operations share the storage. [`Array::data_mut`]
/// detaches shared storage before handing out a mutable slice, so a
/// mutation is never observed through another array.
#[derive(Clone)]
pub struct Array {
    descr: Descr,
    data: Arc<Vec<u8>>,
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
    writeable: bool,
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("descr", &self.descr)
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("writeable", &self.writeable)
            .finish()
    }
}

impl Array {
    /// Build an array over existing storage with explicit byte strides.
    pub fn from_parts(
        descr: Descr,
        data: Arc<Vec<u8>>,
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), descr.elsize(), dims, strides, offset)?;
        Ok(Self {
            descr,
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
            writeable: true,
        })
    }

    /// C-contiguous array over `bytes` (elements already in `descr`'s layout).
    pub fn from_bytes(descr: Descr, bytes: Vec<u8>, dims: &[usize]) -> Result<Self> {
        let n: usize = dims.iter().product();
        if n * descr.elsize() != bytes.len() {
            return Err(ArrayError::BufferSize {
                len: bytes.len(),
                dims: dims.to_vec(),
            });
        }
        let strides = row_major_strides(dims, descr.elsize());
        Self::from_parts(descr, Arc::new(bytes), dims, &strides, 0)
    }

    /// Zero-filled C-contiguous array.
    pub fn zeros(descr: Descr, dims: &[usize]) -> Self {
        let n: usize = dims.iter().product();
        let strides = row_major_strides(dims, descr.elsize());
        Self {
            data: Arc::new(vec![0u8; n * descr.elsize()]),
            descr,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: 0,
            writeable: true,
        }
    }

    /// C-contiguous array of native values with shape `dims`.
    pub fn from_vec<T: NativeType>(values: Vec<T>, dims: &[usize]) -> Result<Self> {
        let descr = Descr::from_type(T::TYPE_NUM)?;
        let n: usize = dims.iter().product();
        if n != values.len() {
            return Err(ArrayError::BufferSize {
                len: values.len(),
                dims: dims.to_vec(),
            });
        }
        let width = descr.elsize();
        let mut bytes = vec![0u8; n * width];
        for (chunk, v) in bytes.chunks_exact_mut(width).zip(values) {
            v.write(chunk);
        }
        Self::from_bytes(descr, bytes, dims)
    }

    /// One-dimensional array copied from `values`.
    pub fn from_slice<T: NativeType>(values: &[T]) -> Result<Self> {
        Self::from_vec(values.to_vec(), &[values.len()])
    }

    /// Zero-dimensional array holding `value`.
    pub fn scalar<T: NativeType>(value: T) -> Result<Self> {
        Self::from_vec(vec![value], &[])
    }

    #[inline]
    pub fn descr(&self) -> &Descr {
        &self.descr
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Byte strides.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Byte offset of the first element.
    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    #[inline]
    pub fn elsize(&self) -> usize {
        self.descr.elsize()
    }

    #[inline]
    pub fn is_writeable(&self) -> bool {
        self.writeable
    }

    pub fn set_writeable(&mut self, writeable: bool) {
        self.writeable = writeable;
    }

    /// Same array, marked read-only.
    pub fn readonly(mut self) -> Self {
        self.writeable = false;
        self
    }

    /// Shared storage handle.
    #[inline]
    pub fn storage(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// The whole underlying buffer; element offsets index into it.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the whole underlying buffer.
    ///
    /// Fails on read-only arrays. Shared storage is copied first.
    pub fn data_mut(&mut self) -> Result<&mut [u8]> {
        if !self.writeable {
            return Err(ArrayError::ReadOnly);
        }
        Ok(Arc::make_mut(&mut self.data).as_mut_slice())
    }

    /// Bytes of the element at byte offset `offset`.
    #[inline]
    pub fn item_at(&self, offset: isize) -> &[u8] {
        let start = offset as usize;
        &self.data[start..start + self.descr.elsize()]
    }

    /// Byte offset of the element at a multi-index.
    pub fn item_offset(&self, index: &[usize]) -> Result<isize> {
        if index.len() != self.ndim() {
            return Err(ArrayError::RankMismatch(index.len(), self.ndim()));
        }
        let mut off = self.offset;
        for (axis, ((&i, &d), &s)) in index.iter().zip(self.dims.iter()).zip(self.strides.iter()).enumerate() {
            if i >= d {
                return Err(ArrayError::InvalidAxis { axis, rank: self.ndim() });
            }
            off += i as isize * s;
        }
        Ok(off)
    }

    /// Bytes of the element at a multi-index.
    pub fn item(&self, index: &[usize]) -> Result<&[u8]> {
        let off = self.item_offset(index)?;
        Ok(self.item_at(off))
    }

    fn check_type<T: NativeType>(&self) -> Result<()> {
        if storage_tag(self.descr.type_num()) != storage_tag(T::TYPE_NUM) {
            return Err(ArrayError::TypeMismatch {
                requested: T::TYPE_NUM,
                actual: self.descr.type_num(),
            });
        }
        Ok(())
    }

    /// Typed element at a multi-index, converted to native byte order.
    pub fn get<T: NativeType>(&self, index: &[usize]) -> Result<T> {
        self.check_type::<T>()?;
        let mut buf = self.item(index)?.to_vec();
        if let (false, Some(unit)) = (self.descr.is_native(), self.descr.swap_unit()) {
            swap_item(&mut buf, unit);
        }
        Ok(T::read(&buf))
    }

    /// All elements in C order as native values.
    pub fn to_vec<T: NativeType>(&self) -> Result<Vec<T>> {
        self.check_type::<T>()?;
        let a = self.to_native();
        let bytes = a.to_bytes();
        Ok(bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(T::read)
            .collect())
    }

    /// All element bytes in C order, as stored.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.contiguous_bytes() {
            Some(b) => b.to_vec(),
            None => gather_c_order(self),
        }
    }

    /// The element bytes when the array is C-contiguous.
    pub fn contiguous_bytes(&self) -> Option<&[u8]> {
        if !self.is_c_contiguous() {
            return None;
        }
        if self.is_empty() {
            return Some(&[]);
        }
        let start = self.offset as usize;
        Some(&self.data[start..start + self.len() * self.elsize()])
    }

    /// Decoded value of the element at byte offset `offset`.
    pub fn scalar_value_at(&self, offset: isize) -> Option<ScalarValue> {
        ScalarValue::read(self.item_at(offset), &self.descr)
    }

    /// Strides describe C order (axes of length one are ignored).
    pub fn is_c_contiguous(&self) -> bool {
        let mut expected = self.elsize() as isize;
        for (&dim, &stride) in self.dims.iter().rev().zip(self.strides.iter().rev()) {
            if dim <= 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected = expected.saturating_mul(dim as isize);
        }
        true
    }

    /// Base address and every stride are multiples of the dtype alignment.
    pub fn is_aligned(&self) -> bool {
        let align = self.descr.alignment().max(1);
        let base = self.data.as_ptr() as usize + self.offset as usize;
        if base % align != 0 {
            return false;
        }
        self.dims
            .iter()
            .zip(self.strides.iter())
            .all(|(&d, &s)| d <= 1 || s.unsigned_abs() % align == 0)
    }

    fn view(&self, dims: Vec<usize>, strides: Vec<isize>, offset: isize) -> Array {
        Array {
            descr: self.descr.clone(),
            data: self.data.clone(),
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
            writeable: self.writeable,
        }
    }

    /// Permute dimensions.
    pub fn permute(&self, perm: &[usize]) -> Result<Array> {
        let rank = self.ndim();
        if perm.len() != rank {
            return Err(ArrayError::RankMismatch(perm.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(ArrayError::InvalidAxis { axis: p, rank });
            }
            seen[p] = true;
        }
        let dims = perm.iter().map(|&p| self.dims[p]).collect();
        let strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(self.view(dims, strides, self.offset))
    }

    pub fn swap_axes(&self, a: usize, b: usize) -> Result<Array> {
        let rank = self.ndim();
        for axis in [a, b] {
            if axis >= rank {
                return Err(ArrayError::InvalidAxis { axis, rank });
            }
        }
        let mut perm: Vec<usize> = (0..rank).collect();
        perm.swap(a, b);
        self.permute(&perm)
    }

    /// Move `axis` to the last position, keeping the others in order.
    pub fn move_axis_to_end(&self, axis: usize) -> Result<Array> {
        let rank = self.ndim();
        if axis >= rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        let mut perm: Vec<usize> = (0..rank).filter(|&i| i != axis).collect();
        perm.push(axis);
        self.permute(&perm)
    }

    /// Fix `axis` at `index`, dropping that axis.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Array> {
        let rank = self.ndim();
        if axis >= rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        if index >= self.dims[axis] {
            return Err(ArrayError::OffsetOverflow);
        }
        let offset = self.offset + index as isize * self.strides[axis];
        let mut dims = self.dims.to_vec();
        let mut strides = self.strides.to_vec();
        dims.remove(axis);
        strides.remove(axis);
        Ok(self.view(dims, strides, offset))
    }

    /// Read-only view broadcast to `dims` (zero strides on stretched axes).
    pub fn broadcast_to(&self, dims: &[usize]) -> Result<Array> {
        let strides = promote_strides(dims, &self.dims, &self.strides)?;
        let mut v = self.view(dims.to_vec(), strides, self.offset);
        v.writeable = false;
        Ok(v)
    }

    /// Same elements with a new shape; copies when not C-contiguous.
    pub fn reshape(&self, dims: &[usize]) -> Result<Array> {
        let n: usize = dims.iter().product();
        if n != self.len() {
            return Err(ArrayError::BufferSize {
                len: self.len(),
                dims: dims.to_vec(),
            });
        }
        if !self.is_c_contiguous() {
            return self.ascontiguous().reshape(dims);
        }
        Ok(self.view(dims.to_vec(), row_major_strides(dims, self.elsize()), self.offset))
    }

    /// One-dimensional C-order view (or copy).
    pub fn ravel(&self) -> Array {
        let n = self.len();
        if self.is_c_contiguous() {
            return self.view(vec![n], vec![self.elsize() as isize], self.offset);
        }
        let c = self.ascontiguous();
        c.view(vec![n], vec![c.elsize() as isize], c.offset)
    }

    /// C-contiguous copy, or a clone when already contiguous.
    pub fn ascontiguous(&self) -> Array {
        if self.is_c_contiguous() {
            return self.clone();
        }
        let strides = row_major_strides(&self.dims, self.elsize());
        Array {
            descr: self.descr.clone(),
            data: Arc::new(gather_c_order(self)),
            dims: self.dims.clone(),
            strides: Arc::from(strides),
            offset: 0,
            writeable: self.writeable,
        }
    }

    /// Native-byte-order, C-contiguous version of this array.
    pub fn to_native(&self) -> Array {
        if self.descr.is_native() {
            return self.ascontiguous();
        }
        let mut out = Array::zeros(self.descr.ensure_native(), &self.dims);
        let bytes = self.to_bytes();
        let unit = self.descr.swap_unit().unwrap_or(1);
        let elsize = self.elsize().max(1);
        let buf = Arc::make_mut(&mut out.data);
        for (dst, src) in buf.chunks_exact_mut(elsize).zip(bytes.chunks_exact(elsize)) {
            dst.copy_from_slice(src);
            swap_item(dst, unit);
        }
        out
    }
}

impl CastOperand for Array {
    fn descr(&self) -> &Descr {
        &self.descr
    }

    fn ndim(&self) -> usize {
        self.dims.len()
    }

    fn scalar_value(&self) -> Option<ScalarValue> {
        if !self.dims.is_empty() {
            return None;
        }
        self.scalar_value_at(self.offset)
    }
}
