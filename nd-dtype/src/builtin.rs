//! Capability records for the built-in types.

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

use num_complex::Complex;
use num_traits::Zero;

use crate::element::{swap_item, NativeType};
use crate::funcs::{ArrFuncs, ClipMode};
use crate::{Descr, IndexOutOfRange, TypeNum};

/// Element types with a total order (NaNs last) and a truth value.
pub(crate) trait Sortable: NativeType {
    fn order(&self, other: &Self) -> Ordering;
    fn is_nonzero(&self) -> bool;
}

macro_rules! impl_sortable_int {
    ($($t:ty),*) => {
        $(
            impl Sortable for $t {
                #[inline]
                fn order(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }

                #[inline]
                fn is_nonzero(&self) -> bool {
                    !self.is_zero()
                }
            }
        )*
    };
}

impl_sortable_int!(i8, u8, i16, u16, i32, u32, i64, u64);

impl Sortable for bool {
    fn order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn is_nonzero(&self) -> bool {
        *self
    }
}

#[inline]
fn nan_last<T: PartialOrd>(a: &T, b: &T, a_nan: bool, b_nan: bool) -> Ordering {
    match (a_nan, b_nan) {
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

macro_rules! impl_sortable_float {
    ($($t:ty),*) => {
        $(
            impl Sortable for $t {
                #[inline]
                fn order(&self, other: &Self) -> Ordering {
                    nan_last(self, other, self.is_nan(), other.is_nan())
                }

                #[inline]
                fn is_nonzero(&self) -> bool {
                    !self.is_zero()
                }
            }

            impl Sortable for Complex<$t> {
                fn order(&self, other: &Self) -> Ordering {
                    nan_last(&self.re, &other.re, self.re.is_nan(), other.re.is_nan())
                        .then_with(|| nan_last(&self.im, &other.im, self.im.is_nan(), other.im.is_nan()))
                }

                fn is_nonzero(&self) -> bool {
                    !self.is_zero()
                }
            }
        )*
    };
}

impl_sortable_float!(f32, f64);

fn decode<T: NativeType>(data: &[u8]) -> Vec<T> {
    data.chunks_exact(std::mem::size_of::<T>()).map(T::read).collect()
}

fn encode<T: NativeType>(values: &[T], data: &mut [u8]) {
    for (chunk, v) in data.chunks_exact_mut(std::mem::size_of::<T>()).zip(values) {
        v.write(chunk);
    }
}

fn compare_impl<T: Sortable>(a: &[u8], b: &[u8], _descr: &Descr) -> Ordering {
    T::read(a).order(&T::read(b))
}

fn nonzero_impl<T: Sortable>(item: &[u8], descr: &Descr) -> bool {
    match descr.swap_unit() {
        Some(unit) if !descr.is_native() => {
            let mut buf = item.to_vec();
            swap_item(&mut buf, unit);
            T::read(&buf).is_nonzero()
        }
        _ => T::read(item).is_nonzero(),
    }
}

fn quicksort_impl<T: Sortable>(data: &mut [u8], _descr: &Descr) {
    let mut v = decode::<T>(data);
    v.sort_unstable_by(T::order);
    encode(&v, data);
}

fn heapsort_impl<T: Sortable>(data: &mut [u8], _descr: &Descr) {
    let mut v = decode::<T>(data);
    heapsort_by(&mut v, T::order);
    encode(&v, data);
}

fn mergesort_impl<T: Sortable>(data: &mut [u8], _descr: &Descr) {
    let mut v = decode::<T>(data);
    v.sort_by(T::order);
    encode(&v, data);
}

fn argquicksort_impl<T: Sortable>(data: &[u8], perm: &mut [isize], _descr: &Descr) {
    let v = decode::<T>(data);
    perm.sort_unstable_by(|&a, &b| v[a as usize].order(&v[b as usize]));
}

fn argheapsort_impl<T: Sortable>(data: &[u8], perm: &mut [isize], _descr: &Descr) {
    let v = decode::<T>(data);
    heapsort_by(perm, |&a, &b| v[a as usize].order(&v[b as usize]));
}

fn argmergesort_impl<T: Sortable>(data: &[u8], perm: &mut [isize], _descr: &Descr) {
    let v = decode::<T>(data);
    perm.sort_by(|&a, &b| v[a as usize].order(&v[b as usize]));
}

fn fasttake_impl<T: NativeType>(
    dest: &mut [u8],
    src: &[u8],
    indices: &[isize],
    max_item: usize,
    n_outer: usize,
    m: usize,
    nelem: usize,
    mode: ClipMode,
) -> Result<(), IndexOutOfRange> {
    let width = std::mem::size_of::<T>();
    let chunk = nelem * width;
    let mut d = 0usize;
    for i in 0..n_outer {
        let base = i * max_item * chunk;
        for &idx in &indices[..m] {
            let k = mode.apply(idx, max_item)?;
            let s = base + k * chunk;
            if nelem == 1 {
                T::read(&src[s..s + width]).write(&mut dest[d..d + width]);
            } else {
                dest[d..d + chunk].copy_from_slice(&src[s..s + chunk]);
            }
            d += chunk;
        }
    }
    Ok(())
}

fn fastputmask_impl<T: NativeType>(data: &mut [u8], mask: &[bool], values: &[u8]) {
    let width = std::mem::size_of::<T>();
    let values = decode::<T>(values);
    if values.is_empty() {
        return;
    }
    for (i, (chunk, &m)) in data.chunks_exact_mut(width).zip(mask).enumerate() {
        if m {
            values[i % values.len()].write(chunk);
        }
    }
}

/// Sift-down heapsort; not stable.
pub fn heapsort_by<T, F>(v: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let n = v.len();
    if n < 2 {
        return;
    }
    let mut sift = |v: &mut [T], mut root: usize, end: usize| loop {
        let mut child = 2 * root + 1;
        if child >= end {
            break;
        }
        if child + 1 < end && cmp(&v[child], &v[child + 1]) == Ordering::Less {
            child += 1;
        }
        if cmp(&v[root], &v[child]) != Ordering::Less {
            break;
        }
        v.swap(root, child);
        root = child;
    };
    for start in (0..n / 2).rev() {
        sift(v, start, n);
    }
    for end in (1..n).rev() {
        v.swap(0, end);
        sift(v, 0, end);
    }
}

fn numeric_funcs<T: Sortable>() -> ArrFuncs {
    ArrFuncs {
        compare: Some(compare_impl::<T>),
        sort: [
            Some(quicksort_impl::<T>),
            Some(heapsort_impl::<T>),
            Some(mergesort_impl::<T>),
        ],
        argsort: [
            Some(argquicksort_impl::<T>),
            Some(argheapsort_impl::<T>),
            Some(argmergesort_impl::<T>),
        ],
        nonzero: Some(nonzero_impl::<T>),
        fasttake: Some(fasttake_impl::<T>),
        fastputmask: Some(fastputmask_impl::<T>),
        item_ref: None,
    }
}

fn bytes_compare(a: &[u8], b: &[u8], _descr: &Descr) -> Ordering {
    a.cmp(b)
}

fn bytes_nonzero(item: &[u8], _descr: &Descr) -> bool {
    item.iter().any(|&b| b != 0)
}

fn make_funcs(t: TypeNum) -> ArrFuncs {
    match t {
        TypeNum::BOOL => numeric_funcs::<bool>(),
        TypeNum::BYTE => numeric_funcs::<i8>(),
        TypeNum::UBYTE => numeric_funcs::<u8>(),
        TypeNum::SHORT => numeric_funcs::<i16>(),
        TypeNum::USHORT => numeric_funcs::<u16>(),
        TypeNum::INT => numeric_funcs::<i32>(),
        TypeNum::UINT => numeric_funcs::<u32>(),
        TypeNum::LONG | TypeNum::LONGLONG | TypeNum::DATETIME | TypeNum::TIMEDELTA => {
            numeric_funcs::<i64>()
        }
        TypeNum::ULONG | TypeNum::ULONGLONG => numeric_funcs::<u64>(),
        TypeNum::FLOAT => numeric_funcs::<f32>(),
        TypeNum::DOUBLE => numeric_funcs::<f64>(),
        TypeNum::CFLOAT => numeric_funcs::<Complex<f32>>(),
        TypeNum::CDOUBLE => numeric_funcs::<Complex<f64>>(),
        TypeNum::STRING => ArrFuncs {
            compare: Some(bytes_compare),
            nonzero: Some(bytes_nonzero),
            ..ArrFuncs::default()
        },
        TypeNum::OBJECT => ArrFuncs {
            nonzero: Some(bytes_nonzero),
            ..ArrFuncs::default()
        },
        _ => ArrFuncs::default(),
    }
}

/// Shared capability record of a built-in type.
pub(crate) fn builtin_funcs(t: TypeNum) -> Arc<ArrFuncs> {
    static TABLE: OnceLock<Vec<Arc<ArrFuncs>>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        TypeNum::BUILTINS
            .iter()
            .map(|&t| Arc::new(make_funcs(t)))
            .collect()
    });
    table
        .get(t.0 as usize)
        .cloned()
        .unwrap_or_else(|| Arc::new(ArrFuncs::default()))
}
