//! Per-dtype capability record.
//!
//! Every entry is optional. A missing entry means the operation is not
//! supported for that type, which callers report as an ordinary error.

use std::cmp::Ordering;
use std::fmt;

use crate::{Descr, IndexOutOfRange};

/// Sorting algorithm requested by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortKind {
    #[default]
    Quicksort,
    Heapsort,
    /// Stable.
    Mergesort,
}

impl SortKind {
    pub const ALL: [SortKind; 3] = [SortKind::Quicksort, SortKind::Heapsort, SortKind::Mergesort];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            SortKind::Quicksort => 0,
            SortKind::Heapsort => 1,
            SortKind::Mergesort => 2,
        }
    }
}

/// Handling of out-of-range indices in take, put and choose.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ClipMode {
    /// Out-of-range is an error; negative indices count from the end first.
    #[default]
    Raise,
    /// Wrap modulo the bound.
    Wrap,
    /// Saturate to `[0, bound - 1]`.
    Clip,
}

impl ClipMode {
    /// Normalize `index` into `0..bound`.
    ///
    /// Fails under [`ClipMode::Raise`] when the index is out of range, and
    /// under every mode when `bound` is zero.
    #[inline]
    pub fn apply(self, index: isize, bound: usize) -> Result<usize, IndexOutOfRange> {
        let bound = bound as isize;
        if bound == 0 {
            return Err(IndexOutOfRange);
        }
        let i = match self {
            ClipMode::Raise => {
                let i = if index < 0 { index + bound } else { index };
                if i < 0 || i >= bound {
                    return Err(IndexOutOfRange);
                }
                i
            }
            ClipMode::Wrap => index.rem_euclid(bound),
            ClipMode::Clip => index.clamp(0, bound - 1),
        };
        Ok(i as usize)
    }
}

/// Three-way comparison of two native-order elements.
pub type CompareFn = fn(a: &[u8], b: &[u8], descr: &Descr) -> Ordering;

/// In-place sort of contiguous native-order elements.
pub type SortFn = fn(data: &mut [u8], descr: &Descr);

/// Reorders `perm` (indices into `data`) so that `data[perm[i]]` ascends.
/// The merge variant is stable with respect to the incoming order of `perm`.
pub type ArgSortFn = fn(data: &[u8], perm: &mut [isize], descr: &Descr);

/// Truth value of one element as stored (byte order taken from `descr`).
pub type NonzeroFn = fn(item: &[u8], descr: &Descr) -> bool;

/// Typed take over contiguous buffers:
/// `dest[(i*m + j)*nelem ..] = src[(i*max_item + idx[j])*nelem ..]`.
pub type FastTakeFn = fn(
    dest: &mut [u8],
    src: &[u8],
    indices: &[isize],
    max_item: usize,
    n_outer: usize,
    m: usize,
    nelem: usize,
    mode: ClipMode,
) -> Result<(), IndexOutOfRange>;

/// Typed masked assignment over a contiguous buffer; values cycle.
pub type FastPutmaskFn = fn(data: &mut [u8], mask: &[bool], values: &[u8]);

/// Reference hooks for element types that own external resources.
///
/// Writers call `incref` on the incoming item before `decref` on the item
/// it replaces, so self-assignment stays balanced.
#[derive(Copy, Clone)]
pub struct ItemRefHooks {
    pub incref: fn(&[u8]),
    pub decref: fn(&[u8]),
}

impl fmt::Debug for ItemRefHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ItemRefHooks")
    }
}

/// Capability record attached to a [`Descr`].
#[derive(Clone, Default)]
pub struct ArrFuncs {
    pub compare: Option<CompareFn>,
    pub sort: [Option<SortFn>; 3],
    pub argsort: [Option<ArgSortFn>; 3],
    pub nonzero: Option<NonzeroFn>,
    pub fasttake: Option<FastTakeFn>,
    pub fastputmask: Option<FastPutmaskFn>,
    pub item_ref: Option<ItemRefHooks>,
}

impl ArrFuncs {
    #[inline]
    pub fn sort_fn(&self, kind: SortKind) -> Option<SortFn> {
        self.sort[kind.index()]
    }

    #[inline]
    pub fn argsort_fn(&self, kind: SortKind) -> Option<ArgSortFn> {
        self.argsort[kind.index()]
    }
}

impl fmt::Debug for ArrFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrFuncs")
            .field("compare", &self.compare.is_some())
            .field("sort", &self.sort.map(|s| s.is_some()))
            .field("argsort", &self.argsort.map(|s| s.is_some()))
            .field("nonzero", &self.nonzero.is_some())
            .field("fasttake", &self.fasttake.is_some())
            .field("fastputmask", &self.fastputmask.is_some())
            .field("item_ref", &self.item_ref.is_some())
            .finish()
    }
}
