//! Ufunc type resolution and array selection primitives over strided byte
//! arrays.
//!
//! This crate re-exports the workspace members:
//!
//! - [`dtype`] (`nd-dtype`): type tags, descriptors, capability records,
//!   datetime units and the casting rules
//! - [`array`] (`nd-array`): the dtype-erased strided [`Array`], segment
//!   iteration, broadcasting and dtype conversion
//! - [`ufunc`] (`nd-ufunc`): ufunc descriptors, the inner-loop registry and
//!   the type resolvers
//! - [`select`] (`nd-select`): take, put, putmask, repeat, choose, sort,
//!   argsort, lexsort, searchsorted, diagonal, compress, nonzero,
//!   count_nonzero
//!
//! # Example
//!
//! ```rust
//! use ndcore::{argsort, take, Array, ClipMode, SortKind};
//!
//! let a = Array::from_slice(&[30i64, 10, 20]).unwrap();
//! let order = argsort(&a, 0, SortKind::Mergesort).unwrap();
//! let sorted = take(&a, &order, Some(0), None, ClipMode::Raise).unwrap();
//! assert_eq!(sorted.to_vec::<i64>().unwrap(), vec![10, 20, 30]);
//! ```
//!
//! # Features
//!
//! - `parallel`: sort lanes of large arrays on the rayon pool

pub use nd_array as array;
pub use nd_dtype as dtype;
pub use nd_select as select;
pub use nd_ufunc as ufunc;

pub use nd_array::{Array, ArrayError};
pub use nd_dtype::{
    CastOracle, CastingRule, ClipMode, DatetimeMeta, DatetimeUnit, Descr, DtypeError, SortKind,
    TypeNum, TypeRegistry,
};
pub use nd_select::{
    argsort, choose, compress, count_nonzero, diagonal, lexsort, nonzero, put, putmask, repeat,
    searchsorted, sort, take, take_with, SearchSide, SelectError,
};
pub use nd_ufunc::{InnerLoop, Resolved, TypeTup, Ufunc, UfuncError};
