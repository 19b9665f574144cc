//! Strided byte arrays for ndcore.
//!
//! An [`Array`] is a dtype descriptor over shared byte storage with
//! arbitrary byte strides (negative and zero strides included). Views share
//! storage; mutation goes through [`Array::data_mut`], which detaches the
//! storage first when it is shared.
//!
//! # Modules
//!
//! - [`iter`]: C-order segment iteration over one or more operands
//! - [`strided`]: byte-level copy and swap helpers over strides
//! - [`broadcast`]: shape broadcasting
//! - [`convert`]: element conversion between dtypes under a casting rule

mod array;
pub mod broadcast;
pub mod convert;
pub mod iter;
pub mod strided;

pub use array::{row_major_strides, Array};
pub use broadcast::{broadcast_arrays, broadcast_shape};
pub use convert::{as_intp, cast_array, cast_array_with, common_type};
pub use iter::{for_each_segment, for_each_segment_indexed};
pub use strided::copy_into;

use nd_dtype::{CastingRule, DtypeError, TypeNum};

/// Errors that can occur while building or viewing arrays.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrayError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Array shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Integer overflow or out-of-buffer access while computing an offset.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// Element count does not match the requested shape.
    #[error("cannot reshape {len} elements into shape {dims:?}")]
    BufferSize { len: usize, dims: Vec<usize> },

    #[error("shape mismatch: objects cannot be broadcast to a single shape")]
    Broadcast,

    #[error("array is read-only")]
    ReadOnly,

    #[error("Cannot cast array data from {from} to {to} according to the rule {rule}")]
    Cast {
        from: String,
        to: String,
        rule: CastingRule,
    },

    /// Typed access with a Rust type that does not match the dtype.
    #[error("element type {requested} does not match array dtype {actual}")]
    TypeMismatch { requested: TypeNum, actual: TypeNum },

    #[error(transparent)]
    Dtype(#[from] DtypeError),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
