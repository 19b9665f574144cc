//! Data types for ndcore.
//!
//! # Core Types
//!
//! - [`TypeNum`]: numeric type tag (built-in or user-defined)
//! - [`Descr`]: data-type descriptor with byte order, element size and unit metadata
//! - [`ArrFuncs`]: per-dtype capability record (compare, sort, argsort, nonzero, fast paths)
//! - [`DatetimeMeta`]: datetime/timedelta unit metadata and unit promotion
//!
//! # Casting
//!
//! - [`CastingRule`]: `no < equiv < safe < same_kind < unsafe`
//! - [`CastOracle`]: type-only and value-aware cast checks, promotion, result type
//! - [`TypeRegistry`]: default oracle with user-type registration
//! - [`should_use_min_scalar`]: scalar-versus-array promotion heuristic

mod builtin;
pub mod casting;
pub mod datetime;
mod descr;
mod element;
mod error;
pub mod funcs;
mod registry;
mod scalar;
mod typenum;

pub use builtin::heapsort_by;
pub use casting::{
    builtin_can_cast, builtin_promote, should_use_min_scalar, CastOperand, CastOracle,
    CastingRule,
};
pub use datetime::{gcd_meta, DatetimeMeta, DatetimeUnit};
pub use descr::{ByteOrder, Descr};
pub use element::{swap_item, NativeType};
pub use error::{DtypeError, IndexOutOfRange, Result};
pub use funcs::{
    ArgSortFn, ArrFuncs, ClipMode, CompareFn, FastPutmaskFn, FastTakeFn, ItemRefHooks,
    NonzeroFn, SortFn, SortKind,
};
pub use registry::TypeRegistry;
pub use scalar::ScalarValue;
pub use typenum::TypeNum;
