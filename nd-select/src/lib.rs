//! Selection and reordering routines for ndcore arrays.
//!
//! Every routine works on the dtype-erased [`nd_array::Array`] and relies on
//! the capability record of the element type ([`nd_dtype::ArrFuncs`]) for
//! anything that needs to look inside an element: ordering, truth value and
//! the typed fast paths.
//!
//! # Routines
//!
//! - [`take`], [`put`], [`putmask`]: gather and scatter by index or mask
//! - [`repeat`], [`choose`]: replicate along an axis, select among choices
//! - [`sort`], [`argsort`], [`lexsort`]: in-place and indirect sorting
//! - [`searchsorted`]: bisection into a sorted 1-D array
//! - [`diagonal`], [`compress`], [`nonzero`], [`count_nonzero`]
//!
//! # Parallelism
//!
//! With the `parallel` feature, sort lanes of large arrays are processed on
//! the rayon pool (see [`PARALLEL_LANE_THRESHOLD`]).

mod axis;
mod choose;
mod diagonal;
mod nonzero;
mod repeat;
mod search;
mod sort;
mod take;
mod threading;

pub use choose::choose;
pub use diagonal::diagonal;
pub use nonzero::{compress, count_nonzero, nonzero};
pub use repeat::repeat;
pub use search::{searchsorted, SearchSide};
pub use sort::{argsort, lexsort, sort};
pub use take::{put, putmask, take, take_with};
pub use threading::PARALLEL_LANE_THRESHOLD;

pub use nd_dtype::{ClipMode, SortKind};

use nd_array::ArrayError;
use nd_dtype::{DtypeError, IndexOutOfRange};

/// Errors raised by the selection routines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectError {
    #[error("axis(={0}) out of bounds")]
    AxisOutOfBounds(isize),

    #[error("object too deep for desired array")]
    TooDeep,

    #[error("object of too small depth for desired array")]
    TooShallow,

    #[error("bad shape in output array")]
    OutputShape,

    #[error("array cannot be safely cast to required type")]
    OutputCast,

    #[error("cannot do a non-empty take from an empty axes.")]
    EmptyAxisTake,

    #[error("put: output array is read-only")]
    PutReadOnly,

    #[error("putmask: output array is read-only")]
    PutmaskReadOnly,

    #[error("putmask: mask and data must be the same size")]
    MaskSize,

    #[error("a.shape[axis] != len(repeats)")]
    RepeatsLength,

    #[error("count < 0")]
    NegativeCount,

    #[error("0-length sequence.")]
    NoChoices,

    #[error("invalid entry in choice array")]
    InvalidChoice,

    #[error("choose: invalid shape for output array.")]
    ChooseOutputShape,

    #[error("attempted sort on unwriteable array.")]
    SortReadOnly,

    #[error("desired sort not supported for this type")]
    SortUnsupported,

    #[error("requested sort not available for type")]
    ArgsortUnsupported,

    #[error("need sequence of keys with len > 0 in lexsort")]
    NoKeys,

    #[error("all keys need to be the same shape")]
    KeyShape,

    #[error("merge sort not available for item {0}")]
    MergesortUnavailable(usize),

    #[error("compare not supported for type")]
    CompareUnsupported,

    /// The element type has no truth value.
    #[error("nonzero not supported for type")]
    NonzeroUnsupported,

    #[error("array.ndim must be >= 2")]
    DiagonalRank,

    #[error("axis1(={axis1}) and axis2(={axis2}) must be different and within range (nd={ndim})")]
    DiagonalAxes {
        axis1: isize,
        axis2: isize,
        ndim: usize,
    },

    #[error("condition must be 1-d array")]
    ConditionRank,

    #[error(transparent)]
    IndexOutOfRange(#[from] IndexOutOfRange),

    #[error(transparent)]
    Array(#[from] ArrayError),

    #[error(transparent)]
    Dtype(#[from] DtypeError),
}

/// Result type for selection routines.
pub type Result<T> = std::result::Result<T, SelectError>;
